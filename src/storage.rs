/// storage.rs — The single persistence interface
///
/// The source project juggled Sheets, Postgres and SQLite behind ad-hoc
/// try/except chains; here there is exactly one table-level interface with
/// swappable backends, chosen once at startup. Rows travel as JSON objects
/// whose keys are the logical column names.
///
/// `write_table` is a full replace and every implementation must make each
/// call atomic, so a concurrent reader never observes a half-written table.
use std::sync::Mutex;

use ahash::AHashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Signals,
    Entries,
    Exits,
    Coins,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Signals => "signals",
            Table::Entries => "entries",
            Table::Exits => "exits",
            Table::Coins => "coins",
        }
    }
}

pub trait TableStore: Send + Sync {
    fn read_table(&self, table: Table) -> Result<Vec<Value>, StorageError>;
    fn write_table(&self, table: Table, rows: &[Value]) -> Result<(), StorageError>;
    fn append_rows(&self, table: Table, rows: &[Value]) -> Result<(), StorageError>;
}

/// Serialize typed records into storage rows.
pub fn to_rows<T: Serialize>(records: &[T]) -> Result<Vec<Value>, StorageError> {
    records
        .iter()
        .map(|r| serde_json::to_value(r).map_err(StorageError::from))
        .collect()
}

/// Deserialize storage rows back into typed records.
pub fn from_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, StorageError> {
    rows.into_iter()
        .map(|r| serde_json::from_value(r).map_err(StorageError::from))
        .collect()
}

/// In-memory backend, used by the test suite. The worker binary always runs
/// on a durable store and aborts startup when it is unavailable.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<AHashMap<&'static str, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TableStore for MemoryStore {
    fn read_table(&self, table: Table) -> Result<Vec<Value>, StorageError> {
        let tables = self
            .tables
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store poisoned".into()))?;
        Ok(tables.get(table.name()).cloned().unwrap_or_default())
    }

    fn write_table(&self, table: Table, rows: &[Value]) -> Result<(), StorageError> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store poisoned".into()))?;
        tables.insert(table.name(), rows.to_vec());
        Ok(())
    }

    fn append_rows(&self, table: Table, rows: &[Value]) -> Result<(), StorageError> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store poisoned".into()))?;
        tables
            .entry(table.name())
            .or_default()
            .extend(rows.iter().cloned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn append_then_read() {
        let store = MemoryStore::new();
        store
            .append_rows(Table::Coins, &[json!({"symbol": "BTCUSDT", "active": true, "note": ""})])
            .unwrap();
        store
            .append_rows(Table::Coins, &[json!({"symbol": "ETHUSDT", "active": false, "note": ""})])
            .unwrap();
        let rows = store.read_table(Table::Coins).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["symbol"], "BTCUSDT");
    }

    #[test]
    fn write_table_replaces() {
        let store = MemoryStore::new();
        store
            .append_rows(Table::Entries, &[json!({"symbol": "A"}), json!({"symbol": "B"})])
            .unwrap();
        store
            .write_table(Table::Entries, &[json!({"symbol": "C"})])
            .unwrap();
        let rows = store.read_table(Table::Entries).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["symbol"], "C");
    }

    #[test]
    fn unknown_table_reads_empty() {
        let store = MemoryStore::new();
        assert!(store.read_table(Table::Signals).unwrap().is_empty());
    }

    #[test]
    fn typed_round_trip() {
        use crate::models::CoinRecord;
        let store = MemoryStore::new();
        let coins = vec![CoinRecord {
            symbol: "BTCUSDT".into(),
            active: true,
            note: "core".into(),
        }];
        store.write_table(Table::Coins, &to_rows(&coins).unwrap()).unwrap();
        let back: Vec<CoinRecord> = from_rows(store.read_table(Table::Coins).unwrap()).unwrap();
        assert_eq!(back, coins);
    }
}
