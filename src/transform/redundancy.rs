/// Duplicate elimination along either axis.
///
/// `Horizontal` drops rows identical to an earlier row; `Vertical` drops
/// columns whose values are identical, row for row, to an earlier column.
/// Numbers compare by value regardless of storage width, and two missing
/// cells are equal. The first occurrence always survives.

use super::canonical_name;
use crate::column::ValueKey;
use crate::error::{Result, TableError};
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum RedundancyAxis {
    #[serde(rename = "horizontal")]
    Horizontal,
    #[serde(rename = "vertical")]
    Vertical,
}

impl FromStr for RedundancyAxis {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self> {
        match canonical_name(s).as_str() {
            "horizontal" | "rows" => Ok(RedundancyAxis::Horizontal),
            "vertical" | "columns" => Ok(RedundancyAxis::Vertical),
            _ => Err(TableError::unsupported("redundancy elimination", s)),
        }
    }
}

impl TryFrom<String> for RedundancyAxis {
    type Error = TableError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

pub fn eliminate_redundancies(table: &Table, axis: RedundancyAxis) -> Table {
    let out = match axis {
        RedundancyAxis::Horizontal => {
            let mut seen: HashSet<Vec<ValueKey>> = HashSet::with_capacity(table.len());
            let keep: Vec<usize> = (0..table.len())
                .filter(|&row| {
                    let key = table
                        .columns()
                        .iter()
                        .map(|c| c.values()[row].key())
                        .collect();
                    seen.insert(key)
                })
                .collect();
            table.take_rows(&keep)
        }
        RedundancyAxis::Vertical => {
            let mut seen: HashSet<Vec<ValueKey>> = HashSet::with_capacity(table.column_count());
            let keep: Vec<usize> = table
                .columns()
                .iter()
                .enumerate()
                .filter(|(_, c)| seen.insert(c.iter().map(|v| v.key()).collect()))
                .map(|(idx, _)| idx)
                .collect();
            table.select_columns(&keep)
        }
    };

    log::debug!(
        "{:?} redundancy elimination: {} x {} -> {} x {}",
        axis,
        table.len(),
        table.column_count(),
        out.len(),
        out.column_count()
    );
    out
}
