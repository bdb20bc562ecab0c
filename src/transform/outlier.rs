/// Outlier handling: row filters (z-score, IQR) and value rewrites
/// (percentile clipping, log1p).
///
/// Row filters run column by column; each column's statistics are computed on
/// the table already filtered by the previous columns. A row whose value is
/// missing in the column being filtered is dropped, since it cannot be shown
/// to lie inside the bounds.

use super::canonical_name;
use crate::column::Column;
use crate::error::{Result, TableError};
use crate::stats;
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Rows with |z| at or above this are removed by `OutlierMethod::ZScore`.
pub const ZSCORE_THRESHOLD: f64 = 3.0;
/// Percentile bounds used by `OutlierMethod::Clipping`.
pub const CLIP_QUANTILES: (f64, f64) = (0.05, 0.95);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum OutlierMethod {
    #[serde(rename = "zscore")]
    ZScore,
    #[serde(rename = "IQR")]
    Iqr,
    #[serde(rename = "Clipping")]
    Clipping,
    #[serde(rename = "log")]
    Log,
}

impl FromStr for OutlierMethod {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self> {
        match canonical_name(s).as_str() {
            "zscore" | "z_score" => Ok(OutlierMethod::ZScore),
            "iqr" => Ok(OutlierMethod::Iqr),
            "clipping" | "clip" => Ok(OutlierMethod::Clipping),
            "log" | "log1p" => Ok(OutlierMethod::Log),
            _ => Err(TableError::unsupported("outlier", s)),
        }
    }
}

impl TryFrom<String> for OutlierMethod {
    type Error = TableError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// Apply an outlier method to the selected numeric columns, in order.
/// An empty selection means every numeric column.
///
/// Rewriting methods store their output as Float64. `Log` rejects values
/// at or below -1, where ln(1 + x) has no real result.
pub fn outlier<S: AsRef<str>>(table: &Table, method: OutlierMethod, columns: &[S]) -> Result<Table> {
    let names: Vec<String> = table
        .resolve_numeric(columns)?
        .into_iter()
        .map(|i| table.columns()[i].name().to_string())
        .collect();

    let mut out = table.clone();
    for name in &names {
        out = match method {
            OutlierMethod::ZScore => filter_rows(&out, name, zscore_bounds)?,
            OutlierMethod::Iqr => filter_rows(&out, name, iqr_bounds)?,
            OutlierMethod::Clipping => clip_column(out, name)?,
            OutlierMethod::Log => log_column(out, name)?,
        };
        log::trace!("outlier {:?} on '{}': {} rows remain", method, name, out.len());
    }
    Ok(out)
}

/// Acceptance test built from the present values of a column.
type Bounds = Box<dyn Fn(f64) -> bool>;

fn zscore_bounds(present: &[f64]) -> Bounds {
    match (stats::mean(present), stats::std_dev(present)) {
        (Some(mean), Some(std)) if std > 0.0 => {
            Box::new(move |x| ((x - mean) / std).abs() < ZSCORE_THRESHOLD)
        }
        // No spread means no outliers.
        _ => Box::new(|_| true),
    }
}

fn iqr_bounds(present: &[f64]) -> Bounds {
    match stats::fences(&stats::sorted(present)) {
        Some(f) => Box::new(move |x| x >= f.lower && x <= f.upper),
        None => Box::new(|_| true),
    }
}

fn filter_rows(table: &Table, column: &str, bounds: fn(&[f64]) -> Bounds) -> Result<Table> {
    let handle = table.numeric(column)?;
    let accept = bounds(&handle.present());
    let keep: Vec<usize> = handle
        .values()
        .enumerate()
        .filter(|(_, v)| v.is_some_and(|x| accept(x)))
        .map(|(row, _)| row)
        .collect();
    Ok(table.take_rows(&keep))
}

fn clip_column(mut table: Table, column: &str) -> Result<Table> {
    let handle = table.numeric(column)?;
    let ordered = stats::sorted(&handle.present());
    let bounds = stats::quantile(&ordered, CLIP_QUANTILES.0)
        .zip(stats::quantile(&ordered, CLIP_QUANTILES.1));

    let clipped = Column::float64(
        column,
        handle
            .values()
            .map(|v| v.map(|x| bounds.map_or(x, |(lo, hi)| x.clamp(lo, hi))))
            .collect::<Vec<_>>(),
    );
    table.upsert_column(clipped)?;
    Ok(table)
}

fn log_column(mut table: Table, column: &str) -> Result<Table> {
    let handle = table.numeric(column)?;
    if let Some(bad) = handle.present().into_iter().find(|x| *x <= -1.0) {
        return Err(TableError::InvalidParameter(format!(
            "log transform is undefined for {} in column '{}' (values must be > -1)",
            bad, column
        )));
    }

    let logged = Column::float64(
        column,
        handle.values().map(|v| v.map(f64::ln_1p)).collect::<Vec<_>>(),
    );
    table.upsert_column(logged)?;
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::LoadOptions;
    use crate::{ColumnType, ErrorKind};

    fn load(csv: &str) -> Table {
        Table::from_csv("t", csv, &LoadOptions::default()).unwrap()
    }

    fn column_f64(table: &Table, name: &str) -> Vec<Option<f64>> {
        table.numeric(name).unwrap().values().collect()
    }

    #[test]
    fn test_method_names() {
        assert_eq!("zscore".parse::<OutlierMethod>().unwrap(), OutlierMethod::ZScore);
        assert_eq!("IQR".parse::<OutlierMethod>().unwrap(), OutlierMethod::Iqr);
        assert_eq!("Clipping".parse::<OutlierMethod>().unwrap(), OutlierMethod::Clipping);
        assert_eq!("log".parse::<OutlierMethod>().unwrap(), OutlierMethod::Log);

        let err = "winsorize".parse::<OutlierMethod>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);
        assert!(err.to_string().contains("unsupported"));
    }

    #[test]
    fn test_iqr_filter() {
        let table = load("x,tag\n1,a\n2,b\n3,c\n4,d\n100,e\n");
        let out = outlier(&table, OutlierMethod::Iqr, &["x"]).unwrap();
        assert_eq!(out.len(), 4);
        assert_eq!(column_f64(&out, "x"), vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]);
        // input untouched
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn test_zscore_filter() {
        let mut csv = String::from("x\n");
        for _ in 0..20 {
            csv.push_str("10\n");
        }
        csv.push_str("11\n1000\n");
        let table = load(&csv);

        let out = outlier(&table, OutlierMethod::ZScore, &["x"]).unwrap();
        assert_eq!(out.len(), 21);
        assert!(column_f64(&out, "x").iter().all(|v| v.unwrap() < 1000.0));
    }

    #[test]
    fn test_zscore_constant_column_keeps_rows() {
        let table = load("x,y\n5,1\n5,2\n5,3\n");
        let out = outlier(&table, OutlierMethod::ZScore, &["x"]).unwrap();
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_sequential_composition() {
        // Row 4 is an outlier in `a`; once it is gone, row 3 becomes an
        // outlier in `b`'s remaining values.
        let table = load("a,b\n1,1\n2,2\n3,3\n2,50\n100,1000\n");
        let out = outlier(&table, OutlierMethod::Iqr, &["a", "b"]).unwrap();
        assert_eq!(column_f64(&out, "b"), vec![Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_filter_drops_missing() {
        let table = load("x,y\n1,a\n,b\n2,c\n");
        let out = outlier(&table, OutlierMethod::Iqr, &["x"]).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_clipping() {
        let csv: String = std::iter::once("x".to_string())
            .chain((0..=100).map(|i| i.to_string()))
            .collect::<Vec<_>>()
            .join("\n");
        let table = load(&csv);

        let out = outlier(&table, OutlierMethod::Clipping, &["x"]).unwrap();
        assert_eq!(out.len(), 101);
        assert_eq!(out.column("x").unwrap().column_type(), ColumnType::Float64);
        let values = column_f64(&out, "x");
        assert_eq!(values[0], Some(5.0));
        assert_eq!(values[50], Some(50.0));
        assert_eq!(values[100], Some(95.0));
    }

    #[test]
    fn test_clipping_keeps_untouched_decimals() {
        let table = load("x\n36.1\n36.2\n36.3\n36.4\n36.5\n");
        let out = outlier(&table, OutlierMethod::Clipping, &["x"]).unwrap();
        assert_eq!(out.get_value(1, "x").unwrap().to_string(), "36.2");
        assert_eq!(out.get_value(2, "x").unwrap().to_string(), "36.3");
    }

    #[test]
    fn test_log1p() {
        let table = load("x\n0\n1\n");
        let out = outlier(&table, OutlierMethod::Log, &["x"]).unwrap();
        let values = column_f64(&out, "x");
        assert_eq!(values[0], Some(0.0));
        assert!((values[1].unwrap() - std::f64::consts::LN_2).abs() < 1e-12);
    }

    #[test]
    fn test_log_rejects_values_at_or_below_minus_one() {
        let table = load("x\n-1\n3\n");
        let err = outlier(&table, OutlierMethod::Log, &["x"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);
    }

    #[test]
    fn test_selection_validated() {
        let table = load("x,name\n1,a\n");
        assert_eq!(
            outlier(&table, OutlierMethod::Iqr, &["nope"]).unwrap_err().kind(),
            ErrorKind::Key
        );
        assert_eq!(
            outlier(&table, OutlierMethod::Iqr, &["name"]).unwrap_err().kind(),
            ErrorKind::Type
        );
    }
}
