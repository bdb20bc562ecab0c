/// Descriptive statistics over table columns.
///
/// Missing values are skipped everywhere. Standard deviation and variance are
/// the sample versions (denominator `n - 1`). Quantiles interpolate linearly
/// between order statistics: for probability `p` over `n` sorted values the
/// position is `h = (n - 1) * p`.

use crate::column::{ColumnType, ColumnValue};
use crate::error::{Result, TableError};
use crate::table::Table;
use serde::Serialize;
use std::collections::HashMap;

/// Multiplier applied to the IQR to place the outlier fences.
pub const FENCE_FACTOR: f64 = 1.5;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample variance; `None` for fewer than two values.
pub fn variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some(ss / (values.len() - 1) as f64)
}

pub fn std_dev(values: &[f64]) -> Option<f64> {
    variance(values).map(f64::sqrt)
}

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

/// Linear-interpolated quantile of already sorted values.
///
/// ```
/// use minetable::stats::quantile;
///
/// let v = [1.0, 2.0, 3.0, 4.0];
/// assert_eq!(quantile(&v, 0.5), Some(2.5));
/// assert_eq!(quantile(&v, 1.0), Some(4.0));
/// ```
pub fn quantile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    let frac = h - lo as f64;
    Some(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile(&sorted(values), 0.5)
}

/// All most-frequent non-missing values, ascending.
pub(crate) fn modal_values<'a>(values: impl Iterator<Item = &'a ColumnValue>) -> Vec<ColumnValue> {
    let mut counts: HashMap<_, (usize, &ColumnValue)> = HashMap::new();
    for value in values.filter(|v| !v.is_null()) {
        counts.entry(value.key()).or_insert((0, value)).0 += 1;
    }

    let best = counts.values().map(|(n, _)| *n).max().unwrap_or(0);
    let mut modes: Vec<ColumnValue> = counts
        .into_values()
        .filter(|(n, _)| *n == best)
        .map(|(_, v)| v.clone())
        .collect();
    modes.sort_by(|a, b| a.total_cmp(b));
    modes
}

/// Q1, Q3 and the fences derived from them.
pub(crate) struct Fences {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

pub(crate) fn fences(sorted: &[f64]) -> Option<Fences> {
    let q1 = quantile(sorted, 0.25)?;
    let q3 = quantile(sorted, 0.75)?;
    let iqr = q3 - q1;
    Some(Fences {
        q1,
        q3,
        lower: q1 - FENCE_FACTOR * iqr,
        upper: q3 + FENCE_FACTOR * iqr,
    })
}

fn no_values(column: &str) -> TableError {
    TableError::InvalidParameter(format!("column '{}' has no values", column))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CentralTendency {
    pub mean: f64,
    pub median: f64,
    /// Every modal value, ascending
    pub mode: Vec<f64>,
    /// True only for a single mode equal to both mean and median
    pub is_symmetric: bool,
}

/// Mean, median and mode(s) of a numeric column.
///
/// ```
/// use minetable::{stats, LoadOptions, Table};
///
/// let table = Table::from_csv("t", "x\n1\n2\n2\n3\n", &LoadOptions::default()).unwrap();
/// let ct = stats::central_tendency(&table, "x").unwrap();
/// assert_eq!(ct.mean, 2.0);
/// assert_eq!(ct.mode, vec![2.0]);
/// assert!(ct.is_symmetric);
/// ```
pub fn central_tendency(table: &Table, column: &str) -> Result<CentralTendency> {
    let col = table.column(column)?;
    let values = col.as_numeric()?.present();

    let mean = mean(&values).ok_or_else(|| no_values(column))?;
    let median = median(&values).ok_or_else(|| no_values(column))?;
    let mode: Vec<f64> = modal_values(col.iter())
        .iter()
        .filter_map(ColumnValue::to_f64)
        .collect();

    // A multi-modal column is never reported symmetric.
    let is_symmetric = mode.len() == 1 && mean == median && median == mode[0];

    Ok(CentralTendency {
        mean,
        median,
        mode,
        is_symmetric,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FiveNumberSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuantileReport {
    pub summary: FiveNumberSummary,
    pub iqr: f64,
    pub lower_fence: f64,
    pub upper_fence: f64,
    /// Indices (in the input table) of rows outside the fences
    pub outlier_rows: Vec<usize>,
    #[serde(skip)]
    pub outliers: Table,
}

/// Five-number summary, IQR fences and the rows lying strictly outside them.
pub fn quantiles(table: &Table, column: &str) -> Result<QuantileReport> {
    let handle = table.numeric(column)?;
    let ordered = sorted(&handle.present());
    if ordered.is_empty() {
        return Err(no_values(column));
    }

    let f = fences(&ordered).ok_or_else(|| no_values(column))?;
    let summary = FiveNumberSummary {
        min: ordered[0],
        q1: f.q1,
        median: quantile(&ordered, 0.5).ok_or_else(|| no_values(column))?,
        q3: f.q3,
        max: ordered[ordered.len() - 1],
    };

    let outlier_rows: Vec<usize> = handle
        .values()
        .enumerate()
        .filter_map(|(row, v)| v.filter(|x| *x < f.lower || *x > f.upper).map(|_| row))
        .collect();

    Ok(QuantileReport {
        summary,
        iqr: f.q3 - f.q1,
        lower_fence: f.lower,
        upper_fence: f.upper,
        outliers: table.take_rows(&outlier_rows),
        outlier_rows,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingUnique {
    pub missing: usize,
    /// Distinct values in first-appearance order, `Null` included when present
    pub unique: Vec<ColumnValue>,
}

pub fn missing_and_unique(table: &Table, column: &str) -> Result<MissingUnique> {
    let col = table.column(column)?;

    let mut seen = std::collections::HashSet::new();
    let unique = col
        .iter()
        .filter(|v| seen.insert(v.key()))
        .cloned()
        .collect();

    Ok(MissingUnique {
        missing: col.null_count(),
        unique,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub variance: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

/// Summary statistics for every numeric column.
pub fn describe(table: &Table) -> Vec<ColumnSummary> {
    table
        .columns()
        .iter()
        .filter_map(|c| c.as_numeric().ok())
        .map(|handle| {
            let values = handle.present();
            let ordered = sorted(&values);
            ColumnSummary {
                column: handle.name().to_string(),
                count: values.len(),
                mean: mean(&values),
                std: std_dev(&values),
                variance: variance(&values),
                min: ordered.first().copied(),
                q25: quantile(&ordered, 0.25),
                median: quantile(&ordered, 0.5),
                q75: quantile(&ordered, 0.75),
                max: ordered.last().copied(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnProfile {
    pub column: String,
    pub column_type: ColumnType,
    pub missing: usize,
    /// Distinct non-missing values
    pub unique: usize,
}

/// Type, missing count and distinct count for every column.
pub fn profile(table: &Table) -> Vec<ColumnProfile> {
    table
        .columns()
        .iter()
        .map(|c| {
            let distinct: std::collections::HashSet<_> =
                c.iter().filter(|v| !v.is_null()).map(ColumnValue::key).collect();
            ColumnProfile {
                column: c.name().to_string(),
                column_type: c.column_type(),
                missing: c.null_count(),
                unique: distinct.len(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major Pearson coefficients; `None` where undefined
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values[i][j]
    }
}

fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx) * (x - mx);
        syy += (y - my) * (y - my);
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some(sxy / (sxx * syy).sqrt())
}

/// Pairwise Pearson correlation over rows where both values are present.
/// An empty selection correlates every numeric column.
pub fn correlation<S: AsRef<str>>(table: &Table, columns: &[S]) -> Result<CorrelationMatrix> {
    let indices = table.resolve_numeric(columns)?;
    let series: Vec<Vec<Option<f64>>> = indices
        .iter()
        .map(|&i| table.columns()[i].iter().map(ColumnValue::to_f64).collect())
        .collect();

    let values = series
        .iter()
        .map(|a| series.iter().map(|b| pearson(a, b)).collect())
        .collect();

    Ok(CorrelationMatrix {
        columns: indices
            .iter()
            .map(|&i| table.columns()[i].name().to_string())
            .collect(),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::LoadOptions;
    use crate::ErrorKind;

    fn load(csv: &str) -> Table {
        Table::from_csv("t", csv, &LoadOptions::default()).unwrap()
    }

    #[test]
    fn test_quantile_interpolation() {
        let v = [1.0, 2.0, 3.0, 4.0, 100.0];
        assert_eq!(quantile(&v, 0.0), Some(1.0));
        assert_eq!(quantile(&v, 0.25), Some(2.0));
        assert_eq!(quantile(&v, 0.5), Some(3.0));
        assert_eq!(quantile(&v, 0.75), Some(4.0));
        assert_eq!(quantile(&[10.0, 20.0], 0.25), Some(12.5));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn test_sample_variance() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((variance(&v).unwrap() - 32.0 / 7.0).abs() < 1e-12);
        assert_eq!(variance(&[1.0]), None);
    }

    #[test]
    fn test_quantiles_report() {
        let table = load("x,id\n1,a\n2,b\n3,c\n4,d\n100,e\n");
        let report = quantiles(&table, "x").unwrap();

        assert_eq!(
            report.summary,
            FiveNumberSummary {
                min: 1.0,
                q1: 2.0,
                median: 3.0,
                q3: 4.0,
                max: 100.0,
            }
        );
        assert_eq!(report.iqr, 2.0);
        assert_eq!(report.lower_fence, -1.0);
        assert_eq!(report.upper_fence, 7.0);
        assert_eq!(report.outlier_rows, vec![4]);
        assert_eq!(report.outliers.len(), 1);
        assert_eq!(report.outliers.get_value(0, "id").unwrap().as_string(), Some("e"));
    }

    #[test]
    fn test_fences_bracket_quartiles() {
        let table = load("x\n5\n5\n5\n6\n-40\n12\n3\n");
        let report = quantiles(&table, "x").unwrap();
        assert!(report.lower_fence <= report.summary.q1);
        assert!(report.upper_fence >= report.summary.q3);
    }

    #[test]
    fn test_quantiles_errors() {
        let table = load("x,name\n,a\n,b\n");
        assert_eq!(quantiles(&table, "x").unwrap_err().kind(), ErrorKind::Value);
        assert_eq!(quantiles(&table, "name").unwrap_err().kind(), ErrorKind::Type);
        assert_eq!(quantiles(&table, "nope").unwrap_err().kind(), ErrorKind::Key);
    }

    #[test]
    fn test_central_tendency_multimodal_not_symmetric() {
        let table = load("x\n1\n1\n3\n3\n");
        let ct = central_tendency(&table, "x").unwrap();
        assert_eq!(ct.mean, 2.0);
        assert_eq!(ct.median, 2.0);
        assert_eq!(ct.mode, vec![1.0, 3.0]);
        assert!(!ct.is_symmetric);
    }

    #[test]
    fn test_central_tendency_skewed() {
        let table = load("x\n1\n1\n2\n10\n");
        let ct = central_tendency(&table, "x").unwrap();
        assert_eq!(ct.mean, 3.5);
        assert_eq!(ct.median, 1.5);
        assert_eq!(ct.mode, vec![1.0]);
        assert!(!ct.is_symmetric);
    }

    #[test]
    fn test_central_tendency_requires_numeric() {
        let table = load("name\nx\ny\n");
        let err = central_tendency(&table, "name").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn test_missing_and_unique() {
        let table = load("c,n\na,1\n,2\nb,3\na,4\n,5\n");
        let mu = missing_and_unique(&table, "c").unwrap();
        assert_eq!(mu.missing, 2);
        assert_eq!(
            mu.unique,
            vec![
                ColumnValue::String("a".to_string()),
                ColumnValue::Null,
                ColumnValue::String("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_describe_and_profile() {
        let table = load("x,label\n1,a\n2,a\n3,\n4,b\n");
        let summary = describe(&table);
        assert_eq!(summary.len(), 1);
        let x = &summary[0];
        assert_eq!(x.count, 4);
        assert_eq!(x.mean, Some(2.5));
        assert_eq!(x.median, Some(2.5));
        assert_eq!(x.q25, Some(1.75));
        assert_eq!(x.max, Some(4.0));

        let profiles = profile(&table);
        assert_eq!(profiles[1].column, "label");
        assert_eq!(profiles[1].missing, 1);
        assert_eq!(profiles[1].unique, 2);
    }

    #[test]
    fn test_correlation() {
        let table = load("a,b,c,k\n1,2,3,7\n2,4,2,7\n3,6,1,7\n");
        let m = correlation::<&str>(&table, &[]).unwrap();
        assert_eq!(m.columns, vec!["a", "b", "c", "k"]);
        assert!((m.get("a", "b").unwrap() - 1.0).abs() < 1e-12);
        assert!((m.get("a", "c").unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(m.get("a", "k"), None);
    }
}
