/// MineTable - Columnar Tables for Exploratory Data Mining
///
/// Typed columnar tables loaded from CSV, descriptive statistics, a library of
/// preprocessing transforms (outliers, normalization, discretization,
/// redundancy elimination, seasonal aggregation, missing values) and
/// sessions with bounded snapshot undo. Every transform takes a table by
/// reference and returns a new one.

pub mod column;
pub mod config;
pub mod error;
pub mod history;
pub mod session;
pub mod stats;
pub mod table;
pub mod transform;

pub use column::{Column, ColumnType, ColumnValue, NumericColumn};
pub use config::SessionConfig;
pub use error::{ErrorKind, Result, TableError};
pub use history::{SnapshotHistory, UndoFloor};
pub use session::Session;
pub use table::{LoadOptions, Schema, Table};
pub use transform::{
    Action, BinLabels, BinningMethod, MissingStrategy, NormalizeMethod, OutlierMethod,
    RedundancyAxis, Season, SeasonalAggregation,
};

// WebSocket server modules - only when server feature is enabled
#[cfg(feature = "server")]
pub mod messages;
#[cfg(feature = "server")]
pub mod websocket;
#[cfg(feature = "server")]
pub mod server;
