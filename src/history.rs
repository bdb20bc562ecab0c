/// Snapshot history backing undo.
///
/// The history is a linear stack of whole-table snapshots, oldest first; the
/// last snapshot is the current table. Undo discards the current snapshot and
/// exposes the previous one. There is no redo: pushing after an undo simply
/// extends the shortened history.
///
/// # Capacity
///
/// With a capacity of `n`, pushing snapshot `n + 1` evicts the oldest one, so
/// memory stays bounded at the cost of no longer reaching the original load
/// through undo.
///
/// ```
/// use minetable::{LoadOptions, SnapshotHistory, Table, UndoFloor};
///
/// let base = Table::from_csv("t", "x\n1\n", &LoadOptions::default()).unwrap();
/// let mut history = SnapshotHistory::new(Some(2), UndoFloor::KeepOriginal);
/// history.push(base.clone());
/// history.push(base.head(0));
/// let evicted = history.push(base.head(0));
///
/// assert_eq!(evicted, Some(base));
/// assert_eq!(history.len(), 2);
/// assert_eq!(history.evicted(), 1);
/// ```

use crate::error::{Result, TableError};
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::str::FromStr;

/// Default number of snapshots kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// How far undo may go back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndoFloor {
    /// Undo stops at the oldest snapshot; the session always has a table.
    #[default]
    KeepOriginal,
    /// Undo may pop the last snapshot, leaving the session empty.
    AllowEmpty,
}

impl FromStr for UndoFloor {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "keep_original" => Ok(UndoFloor::KeepOriginal),
            "allow_empty" => Ok(UndoFloor::AllowEmpty),
            other => Err(TableError::InvalidParameter(format!(
                "unknown undo floor '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotHistory {
    snapshots: VecDeque<Table>,
    capacity: Option<usize>,
    floor: UndoFloor,
    evicted: usize,
}

impl Default for SnapshotHistory {
    fn default() -> Self {
        SnapshotHistory::new(Some(DEFAULT_HISTORY_CAPACITY), UndoFloor::default())
    }
}

impl SnapshotHistory {
    /// `None` keeps every snapshot. A capacity of 0 is treated as 1: the
    /// current table is always kept.
    pub fn new(capacity: Option<usize>, floor: UndoFloor) -> Self {
        let capacity = capacity.map(|n| n.max(1));
        SnapshotHistory {
            snapshots: VecDeque::with_capacity(
                capacity.map_or(DEFAULT_HISTORY_CAPACITY, |n| n.min(DEFAULT_HISTORY_CAPACITY)),
            ),
            capacity,
            floor,
            evicted: 0,
        }
    }

    /// Push a new current snapshot, returning the evicted oldest snapshot
    /// if the capacity was exceeded.
    pub fn push(&mut self, table: Table) -> Option<Table> {
        self.snapshots.push_back(table);
        match self.capacity {
            Some(max) if self.snapshots.len() > max => {
                self.evicted += 1;
                let oldest = self.snapshots.pop_front();
                log::warn!(
                    "history capacity {} reached, dropped oldest snapshot ({} evicted so far)",
                    max,
                    self.evicted
                );
                oldest
            }
            _ => None,
        }
    }

    /// Remove and return the current snapshot.
    ///
    /// Refused (state unchanged) when the history is empty, or when only one
    /// snapshot remains under `UndoFloor::KeepOriginal`.
    pub fn undo(&mut self) -> Result<Table> {
        if !self.can_undo() {
            let reason = if self.snapshots.is_empty() {
                "history is empty"
            } else {
                "already at the oldest snapshot"
            };
            log::warn!("undo refused: {}", reason);
            return Err(TableError::NothingToUndo(reason.to_string()));
        }
        self.snapshots.pop_back().ok_or(TableError::NoData)
    }

    pub fn current(&self) -> Result<&Table> {
        self.snapshots.back().ok_or(TableError::NoData)
    }

    /// Discard everything and start over from `base`, which becomes the
    /// current snapshot.
    pub fn reset(&mut self, base: Table) -> &Table {
        self.snapshots.clear();
        self.evicted = 0;
        self.snapshots.push_back(base);
        &self.snapshots[0]
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        match self.floor {
            UndoFloor::KeepOriginal => self.snapshots.len() > 1,
            UndoFloor::AllowEmpty => !self.snapshots.is_empty(),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn floor(&self) -> UndoFloor {
        self.floor
    }

    /// Number of snapshots evicted since the last reset.
    pub fn evicted(&self) -> usize {
        self.evicted
    }
}
