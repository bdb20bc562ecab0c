/// Column rescaling: min-max to [0, 1] and z-score standardization.

use super::canonical_name;
use crate::column::Column;
use crate::error::{Result, TableError};
use crate::stats;
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum NormalizeMethod {
    #[serde(rename = "minmax")]
    MinMax,
    #[serde(rename = "zscore")]
    ZScore,
}

impl FromStr for NormalizeMethod {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self> {
        match canonical_name(s).as_str() {
            "minmax" | "min_max" => Ok(NormalizeMethod::MinMax),
            "zscore" | "z_score" | "standard" => Ok(NormalizeMethod::ZScore),
            _ => Err(TableError::unsupported("normalization", s)),
        }
    }
}

impl TryFrom<String> for NormalizeMethod {
    type Error = TableError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// Rescale the selected numeric columns (all numeric columns when the
/// selection is empty). Missing cells stay missing. A column with no spread
/// maps every present value to 0.
pub fn normalize_data<S: AsRef<str>>(
    table: &Table,
    method: NormalizeMethod,
    columns: &[S],
) -> Result<Table> {
    let indices = table.resolve_numeric(columns)?;
    let mut out = table.clone();

    for idx in indices {
        let source = table.columns()[idx].as_numeric()?;
        let present = source.present();
        let scale = match method {
            NormalizeMethod::MinMax => min_max_scale(&present),
            NormalizeMethod::ZScore => zscore_scale(&present),
        };
        let scaled = Column::float64(source.name(), source.values().map(|v| v.map(|x| scale(x))));
        out.upsert_column(scaled)?;
    }
    Ok(out)
}

fn min_max_scale(present: &[f64]) -> Box<dyn Fn(f64) -> f64> {
    let min = present.iter().copied().fold(f64::INFINITY, f64::min);
    let max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    Box::new(move |x| if range > 0.0 { (x - min) / range } else { 0.0 })
}

fn zscore_scale(present: &[f64]) -> Box<dyn Fn(f64) -> f64> {
    let mean = stats::mean(present).unwrap_or(0.0);
    let std = stats::std_dev(present).filter(|s| *s > 0.0);
    Box::new(move |x| std.map_or(0.0, |s| (x - mean) / s))
}
