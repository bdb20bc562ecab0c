/// Missing-value strategies: fill with a constant or a column statistic, or
/// drop the affected rows or columns.

use crate::column::ColumnValue;
use crate::error::{Result, TableError};
use crate::stats;
use crate::table::Table;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", content = "value", rename_all = "snake_case")]
pub enum MissingStrategy {
    /// Text parsed into each column's type.
    Constant(String),
    Mean,
    Median,
    /// Smallest of the most frequent values.
    Mode,
    DropRows,
    DropColumns,
}

/// Apply `strategy` to the selected columns. An empty selection means every
/// column, or every numeric column for `Mean` and `Median`.
pub fn handle_missing<S: AsRef<str>>(
    table: &Table,
    strategy: &MissingStrategy,
    columns: &[S],
) -> Result<Table> {
    let indices = match strategy {
        MissingStrategy::Mean | MissingStrategy::Median => table.resolve_numeric(columns)?,
        _ if columns.is_empty() => (0..table.column_count()).collect(),
        _ => table.resolve_columns(columns)?,
    };

    let out = match strategy {
        MissingStrategy::DropRows => {
            let keep: Vec<usize> = (0..table.len())
                .filter(|&row| indices.iter().all(|&c| !table.columns()[c].is_null_at(row)))
                .collect();
            table.take_rows(&keep)
        }
        MissingStrategy::DropColumns => {
            let keep: Vec<usize> = (0..table.column_count())
                .filter(|c| !indices.contains(c) || table.columns()[*c].null_count() == 0)
                .collect();
            table.select_columns(&keep)
        }
        _ => {
            let mut out = table.clone();
            let mut filled = 0;
            for idx in indices {
                filled += fill_column(&mut out, idx, strategy)?;
            }
            log::debug!("filled {} missing cells ({:?})", filled, strategy);
            out
        }
    };
    Ok(out)
}

fn fill_column(table: &mut Table, idx: usize, strategy: &MissingStrategy) -> Result<usize> {
    let source = &table.columns()[idx];
    if source.null_count() == 0 {
        return Ok(0);
    }

    let (mut column, fill) = match strategy {
        MissingStrategy::Constant(text) => {
            if text.trim().is_empty() {
                return Err(TableError::InvalidParameter(
                    "fill value must not be empty".to_string(),
                ));
            }
            (source.clone(), source.parse_value(text)?)
        }
        MissingStrategy::Mean | MissingStrategy::Median => {
            let numeric = source.as_numeric()?;
            let present = numeric.present();
            let stat = match strategy {
                MissingStrategy::Mean => stats::mean(&present),
                _ => stats::median(&present),
            };
            let Some(stat) = stat else {
                // Nothing to compute the statistic from.
                return Ok(0);
            };
            let widened = crate::column::Column::float64(numeric.name(), numeric.values());
            (widened, ColumnValue::Float64(stat))
        }
        MissingStrategy::Mode => {
            let fill = stats::modal_values(source.iter())
                .into_iter()
                .next()
                .ok_or_else(|| {
                    TableError::InvalidParameter(format!(
                        "column '{}' has no values to take a mode from",
                        source.name()
                    ))
                })?;
            (source.clone(), fill)
        }
        MissingStrategy::DropRows | MissingStrategy::DropColumns => return Ok(0),
    };

    let filled = column.fill_missing(&fill)?;
    table.upsert_column(column)?;
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnType;
    use crate::table::LoadOptions;
    use crate::ErrorKind;

    fn load(csv: &str) -> Table {
        Table::from_csv("t", csv, &LoadOptions::default()).unwrap()
    }

    const NO_COLUMNS: [&str; 0] = [];

    #[test]
    fn test_constant() {
        let table = load("n,s\n1,a\n,\n3,c\n");
        let out = handle_missing(&table, &MissingStrategy::Constant("0".to_string()), &NO_COLUMNS)
            .unwrap();
        assert_eq!(out.to_csv().unwrap(), "n,s\n1,a\n0,0\n3,c\n");

        let err = handle_missing(&table, &MissingStrategy::Constant("x".to_string()), &["n"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn test_mean_and_median() {
        let table = load("n,s\n1,a\n,b\n2,c\n6,d\n");

        let out = handle_missing(&table, &MissingStrategy::Mean, &NO_COLUMNS).unwrap();
        assert_eq!(out.column("n").unwrap().column_type(), ColumnType::Float64);
        assert_eq!(out.get_value(1, "n").unwrap().as_f64(), Some(3.0));
        assert_eq!(out.get_value(0, "n").unwrap().as_f64(), Some(1.0));

        let out = handle_missing(&table, &MissingStrategy::Median, &["n"]).unwrap();
        assert_eq!(out.get_value(1, "n").unwrap().as_f64(), Some(2.0));

        let err = handle_missing(&table, &MissingStrategy::Mean, &["s"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn test_mode() {
        let table = load("n,s\n1,b\n,\n2,a\n2,b\n1,a\n");
        let out = handle_missing(&table, &MissingStrategy::Mode, &NO_COLUMNS).unwrap();
        // ties resolve to the smallest value
        assert_eq!(out.get_value(1, "n").unwrap(), ColumnValue::Int32(1));
        assert_eq!(out.get_value(1, "s").unwrap(), ColumnValue::String("a".to_string()));
    }

    #[test]
    fn test_mode_without_values() {
        let table = load("n,e\n1,\n2,\n");
        let err = handle_missing(&table, &MissingStrategy::Mode, &["e"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);
    }

    #[test]
    fn test_drop_rows() {
        let table = load("a,b\n1,x\n,y\n3,\n4,z\n");
        let out = handle_missing(&table, &MissingStrategy::DropRows, &["a"]).unwrap();
        assert_eq!(out.len(), 3);

        let out = handle_missing(&table, &MissingStrategy::DropRows, &NO_COLUMNS).unwrap();
        assert_eq!(out.to_csv().unwrap(), "a,b\n1,x\n4,z\n");
    }

    #[test]
    fn test_drop_columns() {
        let table = load("a,b,c\n1,x,\n2,,q\n3,z,r\n");
        let out = handle_missing(&table, &MissingStrategy::DropColumns, &["b", "a"]).unwrap();
        assert_eq!(out.column_names(), vec!["a", "c"]);

        let out = handle_missing(&table, &MissingStrategy::DropColumns, &NO_COLUMNS).unwrap();
        assert_eq!(out.column_names(), vec!["a"]);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_mean_fill_exports_loaded_text() {
        let table = load("x,y\n36.1,a\n,b\n");
        let out = handle_missing(&table, &MissingStrategy::Mean, &["x"]).unwrap();
        assert_eq!(out.to_csv().unwrap(), "x,y\n36.1,a\n36.1,b\n");
    }

    #[test]
    fn test_strategy_wire_format() {
        let decoded: MissingStrategy = serde_json::from_str(r#"{"strategy": "drop_rows"}"#).unwrap();
        assert_eq!(decoded, MissingStrategy::DropRows);
        let decoded: MissingStrategy =
            serde_json::from_str(r#"{"strategy": "constant", "value": "n/a"}"#).unwrap();
        assert_eq!(decoded, MissingStrategy::Constant("n/a".to_string()));
        assert!(serde_json::from_str::<MissingStrategy>(r#"{"strategy": "interpolate"}"#).is_err());
    }
}
