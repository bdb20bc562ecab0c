/// A preprocessing session: one dataset, its snapshot history, and the
/// operations a user performs on it.
///
/// Every successful `apply` pushes the resulting table as the new current
/// snapshot. A failed action changes nothing.
///
/// ```
/// use minetable::{Action, NormalizeMethod, Session, SessionConfig};
///
/// let mut session = Session::new(SessionConfig::default());
/// session.load_csv("readings", "x\n1\n2\n3\n").unwrap();
///
/// session
///     .apply(&Action::Normalize { method: NormalizeMethod::MinMax, columns: vec![] })
///     .unwrap();
/// assert_eq!(session.history_len(), 2);
///
/// session.undo().unwrap();
/// assert_eq!(session.current().unwrap().get_value(2, "x").unwrap().to_f64(), Some(3.0));
/// assert_eq!(session.export_file_name().unwrap(), "readings_preprocessed.csv");
/// ```

use crate::config::SessionConfig;
use crate::error::Result;
use crate::history::SnapshotHistory;
use crate::stats::{
    self, CentralTendency, ColumnProfile, ColumnSummary, CorrelationMatrix, MissingUnique,
    QuantileReport,
};
use crate::table::Table;
use crate::transform::Action;
use std::path::Path;

/// Suffix of exported file names.
pub const EXPORT_SUFFIX: &str = "_preprocessed.csv";

#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    history: SnapshotHistory,
}

impl Default for Session {
    fn default() -> Self {
        Session::new(SessionConfig::default())
    }
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        let history = SnapshotHistory::new(config.history_capacity, config.undo_floor);
        Session { config, history }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Parse CSV text and make it the session's dataset. Any previous history
    /// is discarded.
    pub fn load_csv(&mut self, name: &str, csv: &str) -> Result<&Table> {
        let table = Table::from_csv(name, csv, &self.config.load_options())?;
        Ok(self.start(table))
    }

    pub fn load_csv_path(&mut self, path: impl AsRef<Path>) -> Result<&Table> {
        let table = Table::from_csv_path(path, &self.config.load_options())?;
        Ok(self.start(table))
    }

    /// Replace the dataset with an already built table.
    pub fn load_table(&mut self, table: Table) -> &Table {
        self.start(table)
    }

    fn start(&mut self, table: Table) -> &Table {
        log::info!(
            "loaded dataset '{}': {} rows x {} columns",
            table.name(),
            table.len(),
            table.column_count()
        );
        self.history.reset(table)
    }

    /// Run `action` on the current table and record the result.
    pub fn apply(&mut self, action: &Action) -> Result<&Table> {
        let next = match action.apply(self.current()?) {
            Ok(next) => next,
            Err(e) => {
                log::debug!("{} rejected: {}", action.name(), e);
                return Err(e);
            }
        };
        log::debug!(
            "{} applied: {} rows x {} columns",
            action.name(),
            next.len(),
            next.column_count()
        );
        self.history.push(next);
        self.current()
    }

    /// Discard the current table and return to the previous one.
    pub fn undo(&mut self) -> Result<Option<&Table>> {
        self.history.undo()?;
        Ok(self.history.current().ok())
    }

    pub fn current(&self) -> Result<&Table> {
        self.history.current()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn history(&self) -> &SnapshotHistory {
        &self.history
    }

    pub fn central_tendency(&self, column: &str) -> Result<CentralTendency> {
        stats::central_tendency(self.current()?, column)
    }

    pub fn quantiles(&self, column: &str) -> Result<QuantileReport> {
        stats::quantiles(self.current()?, column)
    }

    pub fn missing_and_unique(&self, column: &str) -> Result<MissingUnique> {
        stats::missing_and_unique(self.current()?, column)
    }

    pub fn describe(&self) -> Result<Vec<ColumnSummary>> {
        Ok(stats::describe(self.current()?))
    }

    pub fn profile(&self) -> Result<Vec<ColumnProfile>> {
        Ok(stats::profile(self.current()?))
    }

    pub fn correlation<S: AsRef<str>>(&self, columns: &[S]) -> Result<CorrelationMatrix> {
        stats::correlation(self.current()?, columns)
    }

    /// The current table as CSV text.
    pub fn export_csv(&self) -> Result<String> {
        self.current()?.to_csv()
    }

    /// `<dataset>_preprocessed.csv`
    pub fn export_file_name(&self) -> Result<String> {
        Ok(format!("{}{}", self.current()?.name(), EXPORT_SUFFIX))
    }

    /// Write the export into `dir` and return the file path.
    pub fn export_to_dir(&self, dir: impl AsRef<Path>) -> Result<std::path::PathBuf> {
        let path = dir.as_ref().join(self.export_file_name()?);
        self.current()?.write_csv(&path)?;
        log::info!("exported {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::UndoFloor;
    use crate::transform::{BinningMethod, OutlierMethod};
    use crate::ErrorKind;

    const CSV: &str = "id,score\n1,1\n2,2\n3,3\n4,4\n5,100\n";

    fn loaded() -> Session {
        let mut session = Session::default();
        session.load_csv("scores", CSV).unwrap();
        session
    }

    fn iqr() -> Action {
        Action::Outlier {
            method: OutlierMethod::Iqr,
            columns: vec!["score".to_string()],
        }
    }

    #[test]
    fn test_empty_session() {
        let mut session = Session::default();
        assert_eq!(session.current().unwrap_err().kind(), ErrorKind::State);
        assert_eq!(session.apply(&iqr()).unwrap_err().kind(), ErrorKind::State);
        assert_eq!(session.export_csv().unwrap_err().kind(), ErrorKind::State);
        assert_eq!(session.undo().unwrap_err().kind(), ErrorKind::State);
    }

    #[test]
    fn test_apply_and_undo() {
        let mut session = loaded();
        assert_eq!(session.apply(&iqr()).unwrap().len(), 4);
        assert_eq!(session.history_len(), 2);

        let back = session.undo().unwrap().unwrap();
        assert_eq!(back.len(), 5);
        assert_eq!(session.undo().unwrap_err().kind(), ErrorKind::State);
    }

    #[test]
    fn test_failed_action_leaves_history_alone() {
        let mut session = loaded();
        let bad = Action::Discretize {
            method: BinningMethod::EqualWidth,
            num_bins: 0,
            columns: vec!["score".to_string()],
            label_by_average: false,
        };
        assert_eq!(session.apply(&bad).unwrap_err().kind(), ErrorKind::Value);
        assert_eq!(session.history_len(), 1);

        let huge = Action::Discretize {
            method: BinningMethod::EqualWidth,
            num_bins: usize::MAX,
            columns: vec!["score".to_string()],
            label_by_average: false,
        };
        assert_eq!(session.apply(&huge).unwrap_err().kind(), ErrorKind::Value);
        assert_eq!(session.history_len(), 1);
        assert_eq!(session.current().unwrap().to_csv().unwrap(), CSV);
    }

    #[test]
    fn test_load_resets_history() {
        let mut session = loaded();
        session.apply(&iqr()).unwrap();
        session.load_csv("other", "a\n1\n").unwrap();
        assert_eq!(session.history_len(), 1);
        assert!(!session.can_undo());
        assert_eq!(session.export_file_name().unwrap(), "other_preprocessed.csv");
    }

    #[test]
    fn test_capacity_from_config() {
        let mut session = Session::new(SessionConfig {
            history_capacity: Some(2),
            ..SessionConfig::default()
        });
        session.load_csv("scores", CSV).unwrap();
        for row in 0..3 {
            session
                .apply(&Action::SetCell {
                    row,
                    column: "score".to_string(),
                    value: "0".to_string(),
                })
                .unwrap();
        }
        assert_eq!(session.history_len(), 2);
        assert_eq!(session.history().evicted(), 2);
    }

    #[test]
    fn test_allow_empty_undo() {
        let mut session = Session::new(SessionConfig {
            undo_floor: UndoFloor::AllowEmpty,
            ..SessionConfig::default()
        });
        session.load_csv("scores", CSV).unwrap();
        assert!(session.undo().unwrap().is_none());
        assert_eq!(session.describe().unwrap_err().kind(), ErrorKind::State);
    }

    #[test]
    fn test_statistics_on_current_table() {
        let session = loaded();
        let report = session.quantiles("score").unwrap();
        assert_eq!(report.outlier_rows, vec![4]);
        assert_eq!(session.describe().unwrap().len(), 2);
        assert_eq!(session.missing_and_unique("id").unwrap().missing, 0);
    }

    #[test]
    fn test_export_to_dir() {
        let dir = tempfile::tempdir().unwrap();
        let session = loaded();
        let path = session.export_to_dir(dir.path()).unwrap();
        assert!(path.ends_with("scores_preprocessed.csv"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), CSV);
    }
}
