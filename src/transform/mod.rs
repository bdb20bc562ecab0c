/// Table transforms.
///
/// Every transform is a pure function from `&Table` to a new `Table`; the
/// input is never modified. `Action` bundles a transform (or a cell/row
/// edit) with its parameters so a session can record and replay it, and so
/// front ends can send it as JSON:
///
/// ```
/// use minetable::{Action, LoadOptions, Table};
///
/// let action: Action =
///     serde_json::from_str(r#"{"op": "normalize", "method": "minmax", "columns": ["x"]}"#).unwrap();
///
/// let table = Table::from_csv("t", "x\n0\n5\n10\n", &LoadOptions::default()).unwrap();
/// let out = action.apply(&table).unwrap();
/// assert_eq!(out.get_value(1, "x").unwrap().as_f64(), Some(0.5));
/// ```

pub mod discretize;
pub mod missing;
pub mod normalize;
pub mod outlier;
pub mod redundancy;
pub mod season;

pub use discretize::{
    bin_edges, binned_column_name, discretization, BinLabels, BinningMethod, MAX_BINS,
};
pub use missing::{handle_missing, MissingStrategy};
pub use normalize::{normalize_data, NormalizeMethod};
pub use outlier::{outlier, OutlierMethod};
pub use redundancy::{eliminate_redundancies, RedundancyAxis};
pub use season::{aggregate_by_season, Season, SeasonalAggregation};

use crate::column::ColumnValue;
use crate::error::{Result, TableError};
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lowercase a method name and fold `-` and spaces to `_`.
pub(crate) fn canonical_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// One user-level operation on the current table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Action {
    Outlier {
        method: OutlierMethod,
        #[serde(default)]
        columns: Vec<String>,
    },
    Normalize {
        method: NormalizeMethod,
        #[serde(default)]
        columns: Vec<String>,
    },
    Discretize {
        method: BinningMethod,
        num_bins: usize,
        #[serde(default)]
        columns: Vec<String>,
        #[serde(default)]
        label_by_average: bool,
    },
    EliminateRedundancies {
        method: RedundancyAxis,
    },
    AggregateBySeason {
        #[serde(default)]
        layout: SeasonalAggregation,
    },
    HandleMissing {
        strategy: MissingStrategy,
        #[serde(default)]
        columns: Vec<String>,
    },
    /// Replace one cell; the text is parsed to the column's type and empty
    /// text clears the cell.
    SetCell {
        row: usize,
        column: String,
        value: String,
    },
    /// Append a row from text cells; columns left out are missing.
    AppendRow {
        values: HashMap<String, String>,
    },
    DeleteRow {
        row: usize,
    },
    DropColumn {
        column: String,
    },
}

impl Action {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Action::Outlier { .. } => "outlier",
            Action::Normalize { .. } => "normalize",
            Action::Discretize { .. } => "discretize",
            Action::EliminateRedundancies { .. } => "eliminate_redundancies",
            Action::AggregateBySeason { .. } => "aggregate_by_season",
            Action::HandleMissing { .. } => "handle_missing",
            Action::SetCell { .. } => "set_cell",
            Action::AppendRow { .. } => "append_row",
            Action::DeleteRow { .. } => "delete_row",
            Action::DropColumn { .. } => "drop_column",
        }
    }

    /// Run the action against `table`, producing the next table.
    pub fn apply(&self, table: &Table) -> Result<Table> {
        match self {
            Action::Outlier { method, columns } => outlier(table, *method, columns),
            Action::Normalize { method, columns } => normalize_data(table, *method, columns),
            Action::Discretize {
                method,
                num_bins,
                columns,
                label_by_average,
            } => {
                let labels = if *label_by_average {
                    BinLabels::Average
                } else {
                    BinLabels::Ordinal
                };
                discretization(table, columns, *num_bins, *method, labels)
            }
            Action::EliminateRedundancies { method } => Ok(eliminate_redundancies(table, *method)),
            Action::AggregateBySeason { layout } => layout.apply(table),
            Action::HandleMissing { strategy, columns } => handle_missing(table, strategy, columns),
            Action::SetCell { row, column, value } => {
                let mut out = table.clone();
                let parsed = out.column(column)?.parse_value(value)?;
                out.set_value(*row, column, parsed)?;
                Ok(out)
            }
            Action::AppendRow { values } => {
                if let Some(unknown) = values.keys().find(|k| table.column_index(k).is_none()) {
                    return Err(TableError::ColumnNotFound(unknown.clone()));
                }
                let mut row = HashMap::with_capacity(table.column_count());
                for column in table.columns() {
                    let value = match values.get(column.name()) {
                        Some(text) => column.parse_value(text)?,
                        None => ColumnValue::Null,
                    };
                    row.insert(column.name().to_string(), value);
                }
                let mut out = table.clone();
                out.append_row(row)?;
                Ok(out)
            }
            Action::DeleteRow { row } => {
                let mut out = table.clone();
                out.delete_row(*row)?;
                Ok(out)
            }
            Action::DropColumn { column } => {
                let mut out = table.clone();
                out.drop_column(column)?;
                Ok(out)
            }
        }
    }
}
