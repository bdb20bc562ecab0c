/// WebSocket message types for client-server communication
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::column::ColumnType;
use crate::error::{ErrorKind, TableError};
use crate::session::Session;
use crate::stats::{
    CentralTendency, ColumnProfile, ColumnSummary, CorrelationMatrix, MissingUnique,
    QuantileReport,
};
use crate::transform::Action;

/// Rows sent in a table preview when the client gives no limit.
pub const DEFAULT_PREVIEW_ROWS: usize = 100;

/// Messages sent from client to server
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Load CSV text as the connection's dataset
    Load { name: String, csv: String },

    /// Apply a transform or edit to the current table
    Apply { action: Action },

    /// Return to the previous table
    Undo,

    /// Request a preview of the current table
    Query {
        #[serde(default)]
        limit: Option<usize>,
    },

    /// Summary statistics and column profile
    Describe,

    CentralTendency { column: String },

    Quantiles { column: String },

    MissingUnique { column: String },

    Correlation {
        #[serde(default)]
        columns: Vec<String>,
    },

    /// Request the current table as CSV
    Export,
}

/// Messages sent from server to client
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Preview of the current table
    TableData {
        table_name: String,
        columns: Vec<String>,
        column_types: Vec<ColumnType>,
        rows: Vec<JsonValue>,
        total_rows: usize,
        history_len: usize,
        can_undo: bool,
    },

    Description {
        summary: Vec<ColumnSummary>,
        profile: Vec<ColumnProfile>,
    },

    CentralTendency {
        column: String,
        report: CentralTendency,
    },

    Quantiles {
        column: String,
        report: QuantileReport,
    },

    MissingUnique {
        column: String,
        report: MissingUnique,
    },

    Correlation { matrix: CorrelationMatrix },

    /// CSV export with its suggested file name
    Csv { file_name: String, data: String },

    /// Error occurred; the session is unchanged
    Error { kind: ErrorKind, message: String },
}

impl ServerMessage {
    /// Preview of the session's current table, or an error if it has none.
    pub fn table_data(session: &Session, limit: Option<usize>) -> ServerMessage {
        let table = match session.current() {
            Ok(table) => table,
            Err(e) => return ServerMessage::from(e),
        };
        let shown = limit.unwrap_or(DEFAULT_PREVIEW_ROWS).min(table.len());

        ServerMessage::TableData {
            table_name: table.name().to_string(),
            columns: table.column_names().iter().map(|s| s.to_string()).collect(),
            column_types: table.columns().iter().map(|c| c.column_type()).collect(),
            rows: (0..shown).map(|row| table.row_json(row)).collect(),
            total_rows: table.len(),
            history_len: session.history_len(),
            can_undo: session.can_undo(),
        }
    }

    /// Error reply for a message that could not be decoded.
    pub fn invalid_format(err: &serde_json::Error) -> ServerMessage {
        ServerMessage::Error {
            kind: ErrorKind::Value,
            message: format!("Invalid message format: {}", err),
        }
    }

    /// Encode for the wire.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            log::error!("failed to encode server message: {}", e);
            r#"{"type":"Error","kind":"value","message":"failed to encode response"}"#.to_string()
        })
    }
}

impl From<TableError> for ServerMessage {
    fn from(err: TableError) -> Self {
        ServerMessage::Error {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
