/// Discretization of numeric columns into labelled bins.
///
/// Each source column `c` gains a derived column next to the existing ones:
/// `c_EFD` for equal-frequency binning, `c_EWD` for equal-width binning.
/// Running the same binning again replaces the derived column.
///
/// # Bin membership
///
/// With edges `e0 < e1 < ... < en`, bin `k` (1-based) is `(e[k-1], e[k]]`;
/// the first bin also includes `e0`. Missing values get no bin.
///
/// # Labels
///
/// By default bins are named (`cat k` for equal-frequency, `Bin k` for
/// equal-width) and the derived column is a `Category`. With
/// `BinLabels::Average` every value is replaced by its bin's midpoint and the
/// derived column is Float64.

use super::canonical_name;
use crate::column::{Column, ColumnType, ColumnValue};
use crate::error::{Result, TableError};
use crate::stats;
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Largest accepted number of bins.
pub const MAX_BINS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum BinningMethod {
    #[serde(rename = "equal_frequency")]
    EqualFrequency,
    #[serde(rename = "equal_width")]
    EqualWidth,
}

impl BinningMethod {
    /// Suffix appended to the source column name.
    pub fn suffix(&self) -> &'static str {
        match self {
            BinningMethod::EqualFrequency => "EFD",
            BinningMethod::EqualWidth => "EWD",
        }
    }

    fn label(&self, bin: usize) -> String {
        match self {
            BinningMethod::EqualFrequency => format!("cat {}", bin),
            BinningMethod::EqualWidth => format!("Bin {}", bin),
        }
    }
}

impl FromStr for BinningMethod {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self> {
        match canonical_name(s).as_str() {
            "equal_frequency" | "efd" | "quantile" => Ok(BinningMethod::EqualFrequency),
            "equal_width" | "ewd" => Ok(BinningMethod::EqualWidth),
            _ => Err(TableError::unsupported("discretization", s)),
        }
    }
}

impl TryFrom<String> for BinningMethod {
    type Error = TableError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinLabels {
    #[default]
    Ordinal,
    Average,
}

/// Derived column name for `column` under `method`.
pub fn binned_column_name(column: &str, method: BinningMethod) -> String {
    format!("{}_{}", column, method.suffix())
}

/// Bin edges for one column: `num_bins + 1` strictly increasing values.
///
/// Equal-frequency edges are the quantiles at `k / num_bins`; if any two
/// coincide (too many repeated values) the binning is rejected. Equal-width
/// edges split `[min, max]` evenly and need `min < max`.
pub fn bin_edges(table: &Table, column: &str, num_bins: usize, method: BinningMethod) -> Result<Vec<f64>> {
    if num_bins == 0 {
        return Err(TableError::InvalidParameter(
            "number of bins must be at least 1".to_string(),
        ));
    }
    if num_bins > MAX_BINS {
        return Err(TableError::InvalidParameter(format!(
            "number of bins must be at most {}, got {}",
            MAX_BINS, num_bins
        )));
    }

    let ordered = stats::sorted(&table.numeric(column)?.present());
    let (min, max) = match (ordered.first(), ordered.last()) {
        (Some(min), Some(max)) => (*min, *max),
        _ => {
            return Err(TableError::InvalidParameter(format!(
                "column '{}' has no values to bin",
                column
            )))
        }
    };

    let edges: Vec<f64> = match method {
        BinningMethod::EqualFrequency => (0..=num_bins)
            .filter_map(|k| stats::quantile(&ordered, k as f64 / num_bins as f64))
            .collect(),
        BinningMethod::EqualWidth => {
            if min == max {
                return Err(TableError::InvalidParameter(format!(
                    "column '{}' is constant ({}), equal-width bins need a range",
                    column, min
                )));
            }
            let step = (max - min) / num_bins as f64;
            (0..=num_bins)
                .map(|k| if k == num_bins { max } else { min + k as f64 * step })
                .collect()
        }
    };

    if edges.windows(2).any(|w| w[0] >= w[1]) {
        return Err(TableError::InvalidParameter(format!(
            "bin edges for column '{}' are not unique; use fewer bins",
            column
        )));
    }
    Ok(edges)
}

/// 0-based bin index of `x`, or `None` outside the edges.
fn bin_of(edges: &[f64], x: f64) -> Option<usize> {
    let above = edges.partition_point(|e| *e < x);
    match above {
        0 if x == edges[0] => Some(0),
        0 => None,
        n if n < edges.len() => Some(n - 1),
        _ => None,
    }
}

/// Bin every selected numeric column and add the derived columns.
pub fn discretization<S: AsRef<str>>(
    table: &Table,
    columns: &[S],
    num_bins: usize,
    method: BinningMethod,
    labels: BinLabels,
) -> Result<Table> {
    let indices = table.resolve_numeric(columns)?;
    let mut out = table.clone();

    for idx in indices {
        let name = table.columns()[idx].name();
        let edges = bin_edges(table, name, num_bins, method)?;
        let bins = table.numeric(name)?.values().map(|v| v.and_then(|x| bin_of(&edges, x)));
        let derived = binned_column_name(name, method);

        let column = match labels {
            BinLabels::Ordinal => {
                let values = bins
                    .map(|b| b.map_or(ColumnValue::Null, |b| ColumnValue::String(method.label(b + 1))))
                    .collect();
                Column::from_values(derived, ColumnType::Category, values)?
            }
            BinLabels::Average => Column::float64(
                derived,
                bins.map(|b| b.map(|b| (edges[b] + edges[b + 1]) / 2.0))
                    .collect::<Vec<_>>(),
            ),
        };
        log::debug!("discretized '{}' into {} bins ({:?})", name, num_bins, method);
        out.upsert_column(column)?;
    }
    Ok(out)
}
