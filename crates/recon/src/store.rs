//! The tabular data store seam.
//!
//! The engine never touches files directly. It reads and writes the four
//! tables through [`TableStore`], which keeps the core testable against
//! [`MemoryStore`] and lets the io crate back it with CSV files.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::StoreError;

/// One stored row, cells as text.
pub type Row = Vec<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableId {
    Intake,
    Activities,
    Roster,
    Ledger,
}

impl TableId {
    pub const ALL: [TableId; 4] = [Self::Intake, Self::Activities, Self::Roster, Self::Ledger];
}

impl std::fmt::Display for TableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Intake => write!(f, "intake"),
            Self::Activities => write!(f, "activities"),
            Self::Roster => write!(f, "roster"),
            Self::Ledger => write!(f, "ledger"),
        }
    }
}

/// A single cell write. `row` and `col` are 0-based indexes into the
/// rows returned by [`TableStore::read_all_rows`], header included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellUpdate {
    pub row: usize,
    pub col: usize,
    pub value: String,
}

pub trait TableStore {
    /// Every stored row in order, header first.
    fn read_all_rows(&self, table: TableId) -> Result<Vec<Row>, StoreError>;

    /// Append rows after the last stored row.
    fn append_rows(&mut self, table: TableId, rows: &[Row]) -> Result<(), StoreError>;

    fn set_cell(&mut self, table: TableId, row: usize, col: usize, value: &str) -> Result<(), StoreError>;

    /// Number of stored rows, header included. 0 for an empty table.
    fn last_row_index(&self, table: TableId) -> Result<usize, StoreError> {
        Ok(self.read_all_rows(table)?.len())
    }

    /// Apply a group of cell writes. Stores that rewrite whole files
    /// override this to write once.
    fn set_cells(&mut self, table: TableId, updates: &[CellUpdate]) -> Result<(), StoreError> {
        for update in updates {
            self.set_cell(table, update.row, update.col, &update.value)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Tables held in memory. Used by tests and for dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: HashMap<TableId, Vec<Row>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style table setup from string literals.
    pub fn with_table<R, C>(mut self, table: TableId, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        self.insert_table(table, rows.into_iter().map(|r| r.into_iter().map(Into::into).collect()).collect());
        self
    }

    pub fn insert_table(&mut self, table: TableId, rows: Vec<Row>) {
        self.tables.insert(table, rows);
    }

    /// Copy every table out of another store.
    pub fn snapshot(source: &dyn TableStore) -> Result<Self, StoreError> {
        let mut store = Self::new();
        for table in TableId::ALL {
            store.insert_table(table, source.read_all_rows(table)?);
        }
        Ok(store)
    }

    pub fn table(&self, table: TableId) -> &[Row] {
        self.tables.get(&table).map(|rows| rows.as_slice()).unwrap_or(&[])
    }
}

impl TableStore for MemoryStore {
    fn read_all_rows(&self, table: TableId) -> Result<Vec<Row>, StoreError> {
        Ok(self.table(table).to_vec())
    }

    fn append_rows(&mut self, table: TableId, rows: &[Row]) -> Result<(), StoreError> {
        self.tables.entry(table).or_default().extend(rows.iter().cloned());
        Ok(())
    }

    fn set_cell(&mut self, table: TableId, row: usize, col: usize, value: &str) -> Result<(), StoreError> {
        let rows = self.tables.entry(table).or_default();
        let len = rows.len();
        let target = rows
            .get_mut(row)
            .ok_or_else(|| StoreError::new(table, format!("row index {row} out of range ({len} rows)")))?;
        if target.len() <= col {
            target.resize(col + 1, String::new());
        }
        target[col] = value.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_cell_pads_short_rows() {
        let mut store = MemoryStore::new().with_table(TableId::Intake, [vec!["a", "b"]]);
        store.set_cell(TableId::Intake, 0, 4, "Posted").unwrap();
        assert_eq!(store.table(TableId::Intake)[0], vec!["a", "b", "", "", "Posted"]);
    }

    #[test]
    fn set_cell_out_of_range_is_an_error() {
        let mut store = MemoryStore::new().with_table(TableId::Intake, [vec!["header"]]);
        let err = store.set_cell(TableId::Intake, 3, 0, "x").unwrap_err();
        assert_eq!(err.table, TableId::Intake);
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn last_row_index_counts_header() {
        let store = MemoryStore::new().with_table(TableId::Ledger, [vec!["EventId"], vec!["CAMP1"]]);
        assert_eq!(store.last_row_index(TableId::Ledger).unwrap(), 2);
        assert_eq!(store.last_row_index(TableId::Roster).unwrap(), 0);
    }

    #[test]
    fn append_creates_missing_table() {
        let mut store = MemoryStore::new();
        store.append_rows(TableId::Ledger, &[vec!["x".to_string()]]).unwrap();
        assert_eq!(store.table(TableId::Ledger).len(), 1);
    }
}
