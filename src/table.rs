/// MineTable Table Implementation
///
/// A Table is an ordered collection of uniquely named, equally long columns.
/// Provides row-level editing (insert, delete, update), typed column lookup
/// and CSV/JSON serialization.
///
/// Tables own their storage outright: `clone()` is a deep copy, and every
/// transform in this crate returns a fresh table instead of editing its input.
///
/// # Examples
///
/// ```
/// use minetable::{Table, Schema, ColumnType, ColumnValue};
/// use std::collections::HashMap;
///
/// let schema = Schema::new(vec![
///     ("id".to_string(), ColumnType::Int32),
///     ("name".to_string(), ColumnType::String),
/// ]);
/// let mut table = Table::new("users".to_string(), schema);
///
/// let mut row = HashMap::new();
/// row.insert("id".to_string(), ColumnValue::Int32(1));
/// row.insert("name".to_string(), ColumnValue::String("Alice".to_string()));
/// table.append_row(row).unwrap();
///
/// assert_eq!(table.len(), 1);
/// assert_eq!(table.get_value(0, "name").unwrap().as_string(), Some("Alice"));
/// ```

use crate::column::{Column, ColumnType, ColumnValue, NumericColumn};
use crate::error::{Result, TableError};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Text cells treated as missing when loading CSV.
const MISSING_MARKERS: [&str; 11] = [
    "NA", "N/A", "n/a", "NaN", "nan", "null", "NULL", "None", "<NA>", "#N/A", "-nan",
];

/// Schema definition with column names and types.
///
/// ```
/// use minetable::{Schema, ColumnType};
///
/// let schema = Schema::new(vec![
///     ("time".to_string(), ColumnType::DateTime),
///     ("Tair".to_string(), ColumnType::Float32),
/// ]);
///
/// assert_eq!(schema.len(), 2);
/// assert_eq!(schema.get_column_index("Tair"), Some(1));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    columns: Vec<(String, ColumnType)>,
}

impl Schema {
    pub fn new(columns: Vec<(String, ColumnType)>) -> Self {
        Schema { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get_column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|(n, _)| n == name)
    }

    pub fn get_column_info(&self, index: usize) -> Option<(&str, ColumnType)> {
        self.columns.get(index).map(|(name, ty)| (name.as_str(), *ty))
    }

    pub fn get_column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, ty)| *ty)
    }
}

/// Options applied while loading CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Store inferred 64-bit integers and floats as 32-bit to save memory.
    /// Integer columns whose values overflow i32 stay Int64.
    pub downcast: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions { downcast: true }
    }
}

/// Root table owning its data.
#[derive(Clone, PartialEq)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Create an empty table with the given schema.
    pub fn new(name: String, schema: Schema) -> Self {
        let columns = schema
            .columns
            .into_iter()
            .map(|(col_name, col_type)| Column::new(col_name, col_type))
            .collect();

        Table {
            name,
            columns,
            row_count: 0,
        }
    }

    /// Assemble a table from prebuilt columns.
    ///
    /// Fails if two columns share a name or the columns differ in length.
    pub fn from_columns(name: impl Into<String>, columns: Vec<Column>) -> Result<Self> {
        let mut seen = HashSet::new();
        for col in &columns {
            if !seen.insert(col.name()) {
                return Err(TableError::InvalidParameter(format!(
                    "duplicate column name '{}'",
                    col.name()
                )));
            }
        }

        let row_count = columns.first().map_or(0, Column::len);
        if let Some(bad) = columns.iter().find(|c| c.len() != row_count) {
            return Err(TableError::InvalidParameter(format!(
                "column '{}' has {} rows, expected {}",
                bad.name(),
                bad.len(),
                row_count
            )));
        }

        Ok(Table {
            name: name.into(),
            columns,
            row_count,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> Schema {
        Schema::new(
            self.columns
                .iter()
                .map(|c| (c.name().to_string(), c.column_type()))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    fn require_index(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| TableError::ColumnNotFound(name.to_string()))
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        let idx = self.require_index(name)?;
        Ok(&self.columns[idx])
    }

    /// Typed lookup of a numeric column.
    ///
    /// Fails with a Key error if the column is absent and a Type error if it
    /// does not hold numbers.
    pub fn numeric(&self, name: &str) -> Result<NumericColumn<'_>> {
        self.column(name)?.as_numeric()
    }

    /// Resolve a column selection to indices, rejecting unknown names.
    /// Repeated names are kept once, in first-mention order.
    pub fn resolve_columns<S: AsRef<str>>(&self, selection: &[S]) -> Result<Vec<usize>> {
        let mut indices = Vec::with_capacity(selection.len());
        for name in selection {
            let idx = self.require_index(name.as_ref())?;
            if !indices.contains(&idx) {
                indices.push(idx);
            }
        }
        Ok(indices)
    }

    /// Resolve a selection that must be numeric. An empty selection means
    /// every numeric column of the table.
    pub fn resolve_numeric<S: AsRef<str>>(&self, selection: &[S]) -> Result<Vec<usize>> {
        if selection.is_empty() {
            return Ok(self
                .columns
                .iter()
                .enumerate()
                .filter(|(_, c)| c.column_type().is_numeric())
                .map(|(i, _)| i)
                .collect());
        }

        let indices = self.resolve_columns(selection)?;
        for &idx in &indices {
            self.columns[idx].as_numeric()?;
        }
        Ok(indices)
    }

    pub fn get_value(&self, row: usize, column: &str) -> Result<ColumnValue> {
        let col_idx = self.require_index(column)?;
        self.columns[col_idx].get(row)
    }

    pub fn set_value(&mut self, row: usize, column: &str, value: ColumnValue) -> Result<()> {
        let col_idx = self.require_index(column)?;
        self.columns[col_idx].set(row, value)
    }

    pub fn get_row(&self, row: usize) -> Result<HashMap<String, ColumnValue>> {
        if row >= self.row_count {
            return Err(TableError::RowOutOfRange {
                row,
                len: self.row_count,
            });
        }

        let mut result = HashMap::with_capacity(self.columns.len());
        for col in &self.columns {
            result.insert(col.name().to_string(), col.get(row)?);
        }
        Ok(result)
    }

    fn check_row_complete(&self, row: &HashMap<String, ColumnValue>) -> Result<()> {
        for col in &self.columns {
            if !row.contains_key(col.name()) {
                return Err(TableError::InvalidParameter(format!(
                    "missing value for column '{}'",
                    col.name()
                )));
            }
        }
        Ok(())
    }

    pub fn append_row(&mut self, row: HashMap<String, ColumnValue>) -> Result<()> {
        self.insert_row(self.row_count, row)
    }

    /// Insert a row at `index`. Every column must be present in `row` and
    /// every value must match its column type; on error nothing changes.
    pub fn insert_row(&mut self, index: usize, mut row: HashMap<String, ColumnValue>) -> Result<()> {
        if index > self.row_count {
            return Err(TableError::RowOutOfRange {
                row: index,
                len: self.row_count,
            });
        }
        self.check_row_complete(&row)?;

        let mut staged = self.columns.clone();
        for col in staged.iter_mut() {
            let value = row.remove(col.name()).unwrap_or(ColumnValue::Null);
            col.insert(index, value)?;
        }

        self.columns = staged;
        self.row_count += 1;
        Ok(())
    }

    pub fn delete_row(&mut self, index: usize) -> Result<HashMap<String, ColumnValue>> {
        if index >= self.row_count {
            return Err(TableError::RowOutOfRange {
                row: index,
                len: self.row_count,
            });
        }

        let mut result = HashMap::with_capacity(self.columns.len());
        for col in self.columns.iter_mut() {
            result.insert(col.name().to_string(), col.delete(index)?);
        }

        self.row_count -= 1;
        Ok(result)
    }

    /// Remove a column by name and return it.
    pub fn drop_column(&mut self, name: &str) -> Result<Column> {
        let idx = self.require_index(name)?;
        let column = self.columns.remove(idx);
        if self.columns.is_empty() {
            self.row_count = 0;
        }
        Ok(column)
    }

    /// Replace the column with the same name, or append it as a new column.
    pub(crate) fn upsert_column(&mut self, column: Column) -> Result<()> {
        if !self.columns.is_empty() && column.len() != self.row_count {
            return Err(TableError::InvalidParameter(format!(
                "column '{}' has {} rows, expected {}",
                column.name(),
                column.len(),
                self.row_count
            )));
        }

        match self.column_index(column.name()) {
            Some(idx) => self.columns[idx] = column,
            None => {
                if self.columns.is_empty() {
                    self.row_count = column.len();
                }
                self.columns.push(column);
            }
        }
        Ok(())
    }

    /// New table with only the rows at `indices`, in that order.
    pub fn take_rows(&self, indices: &[usize]) -> Table {
        Table {
            name: self.name.clone(),
            columns: self.columns.iter().map(|c| c.take(indices)).collect(),
            row_count: indices.len(),
        }
    }

    /// New table with only the columns at `indices`, in that order.
    pub(crate) fn select_columns(&self, indices: &[usize]) -> Table {
        let columns: Vec<Column> = indices.iter().map(|&i| self.columns[i].clone()).collect();
        let row_count = if columns.is_empty() { 0 } else { self.row_count };
        Table {
            name: self.name.clone(),
            columns,
            row_count,
        }
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Table {
        let indices: Vec<usize> = (0..n.min(self.row_count)).collect();
        self.take_rows(&indices)
    }

    pub fn iter_rows(&self) -> TableRowIterator<'_> {
        TableRowIterator {
            table: self,
            index: 0,
        }
    }

    // ========================================================================
    // Serialization Methods
    // ========================================================================

    /// Create a table from CSV text.
    ///
    /// The first record is the header. Each column's type is inferred from
    /// all of its non-missing cells; see `LoadOptions` for 32-bit downcasting.
    /// Duplicate header names get `.1`, `.2`, ... suffixes.
    ///
    /// ```
    /// use minetable::{ColumnType, LoadOptions, Table};
    ///
    /// let csv = "id,name,score\n1,Alice,95.5\n2,Bob,\n";
    /// let table = Table::from_csv("students", csv, &LoadOptions::default()).unwrap();
    /// assert_eq!(table.len(), 2);
    /// assert_eq!(table.column("score").unwrap().column_type(), ColumnType::Float32);
    /// assert!(table.get_value(1, "score").unwrap().is_null());
    /// ```
    pub fn from_csv(name: &str, csv: &str, options: &LoadOptions) -> Result<Table> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(csv.as_bytes());

        let headers = dedupe_headers(reader.headers()?.iter());
        if headers.is_empty() || headers.iter().all(String::is_empty) {
            return Err(TableError::MalformedCsv("CSV header is empty".to_string()));
        }

        let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for record in reader.records() {
            let record = record?;
            for (i, field) in record.iter().enumerate() {
                cells[i].push(normalize_missing(field).to_string());
            }
        }

        let mut columns = Vec::with_capacity(headers.len());
        for (header, raw) in headers.into_iter().zip(cells) {
            let col_type = infer_column_type(&raw, options);
            let mut column = Column::new(header, col_type);
            for text in &raw {
                let value = column.parse_value(text)?;
                column.append(value)?;
            }
            columns.push(column);
        }

        let table = Table::from_columns(name, columns)?;
        log::debug!(
            "parsed CSV '{}': {} rows x {} columns",
            name,
            table.len(),
            table.column_count()
        );
        Ok(table)
    }

    /// Load a CSV file; the table is named after the file stem.
    pub fn from_csv_path(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Table> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("dataset");
        Table::from_csv(name, &text, options)
    }

    /// Export table to CSV: header row, no index column, missing values as
    /// empty fields.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(self.column_names())?;

        for row in 0..self.row_count {
            writer.write_record(self.columns.iter().map(|c| {
                c.get_ref(row).map(ToString::to_string).unwrap_or_default()
            }))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| TableError::Io(e.into_error()))?;
        String::from_utf8(bytes).map_err(|e| TableError::MalformedCsv(e.to_string()))
    }

    /// Write the CSV export to a file.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_csv()?)?;
        Ok(())
    }

    /// Export rows as a JSON array of objects.
    pub fn to_json(&self) -> Result<String> {
        let rows: Vec<serde_json::Value> = (0..self.row_count).map(|row| self.row_json(row)).collect();
        serde_json::to_string_pretty(&rows)
            .map_err(|e| TableError::InvalidParameter(format!("JSON encode error: {}", e)))
    }

    /// One row as a JSON object.
    pub fn row_json(&self, row: usize) -> serde_json::Value {
        let obj: serde_json::Map<String, serde_json::Value> = self
            .columns
            .iter()
            .map(|c| {
                let value = c
                    .get_ref(row)
                    .and_then(|v| serde_json::to_value(v).ok())
                    .unwrap_or(serde_json::Value::Null);
                (c.name().to_string(), value)
            })
            .collect();
        serde_json::Value::Object(obj)
    }
}

fn normalize_missing(field: &str) -> &str {
    if MISSING_MARKERS.contains(&field) {
        ""
    } else {
        field
    }
}

fn dedupe_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut headers = Vec::new();
    for name in raw {
        let count = seen.entry(name.to_string()).or_insert(0);
        if *count == 0 {
            headers.push(name.to_string());
        } else {
            headers.push(format!("{}.{}", name, count));
        }
        *count += 1;
    }
    headers
}

/// Infer the narrowest type every non-missing cell fits.
fn infer_column_type(cells: &[String], options: &LoadOptions) -> ColumnType {
    let float_type = if options.downcast {
        ColumnType::Float32
    } else {
        ColumnType::Float64
    };

    let mut present = cells.iter().filter(|c| !c.is_empty()).peekable();
    if present.peek().is_none() {
        return float_type;
    }

    let (mut ints, mut fits_i32, mut floats, mut bools, mut dates) = (true, true, true, true, true);
    for cell in present {
        match cell.parse::<i64>() {
            Ok(n) => fits_i32 &= i32::try_from(n).is_ok(),
            Err(_) => ints = false,
        }
        floats &= cell.parse::<f64>().is_ok();
        bools &= cell.eq_ignore_ascii_case("true") || cell.eq_ignore_ascii_case("false");
        dates &= crate::column::parse_datetime(cell).is_some();
    }

    if ints {
        if options.downcast && fits_i32 {
            ColumnType::Int32
        } else {
            ColumnType::Int64
        }
    } else if floats {
        float_type
    } else if bools {
        ColumnType::Bool
    } else if dates {
        ColumnType::DateTime
    } else {
        ColumnType::String
    }
}

pub struct TableRowIterator<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> Iterator for TableRowIterator<'a> {
    type Item = HashMap<String, ColumnValue>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.table.row_count {
            None
        } else {
            let result = self.table.get_row(self.index).ok();
            self.index += 1;
            result
        }
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Table {{ name: '{}', columns: {}, rows: {} }}",
            self.name,
            self.columns.len(),
            self.row_count
        )
    }
}
