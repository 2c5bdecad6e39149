/// ledger.rs — Dedup ledger and position ledger over the table store
///
/// The dedup ledger guarantees at-most-one persisted signal per
/// (symbol, mode, side, bar) tuple no matter how many ticks observe the same
/// bar. The position ledger owns the `entries` table and its `exits`
/// monitoring mirror.
use std::sync::Arc;

use ahash::AHashSet;

use crate::error::StorageError;
use crate::models::{EntryRecord, ExitRecord, Signal, SignalRecord};
use crate::storage::{from_rows, to_rows, Table, TableStore};

pub struct DedupLedger {
    store: Arc<dyn TableStore>,
    seen: AHashSet<String>,
}

impl DedupLedger {
    /// Warm the in-memory id set from the signals table. One read at
    /// startup; `try_register` keeps set and table in sync afterwards.
    pub fn load(store: Arc<dyn TableStore>) -> Result<Self, StorageError> {
        let rows = store.read_table(Table::Signals)?;
        let seen = rows
            .iter()
            .filter_map(|r| r.get("signal_id").and_then(|v| v.as_str()))
            .map(str::to_owned)
            .collect();
        Ok(Self { store, seen })
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn contains(&self, signal_id: &str) -> bool {
        self.seen.contains(signal_id)
    }

    /// Returns `Ok(false)` when the signal was already issued (expected,
    /// silent). On a fresh id the signal row is appended first; the cache is
    /// only updated after a successful append, so a persistence outage does
    /// not suppress the retry on the next tick.
    pub fn try_register(&mut self, signal: &Signal) -> Result<bool, StorageError> {
        if self.seen.contains(&signal.signal_id) {
            return Ok(false);
        }
        let rec = SignalRecord::from(signal);
        self.store
            .append_rows(Table::Signals, &to_rows(&[rec])?)?;
        self.seen.insert(signal.signal_id.clone());
        Ok(true)
    }
}

pub struct PositionLedger {
    store: Arc<dyn TableStore>,
}

impl PositionLedger {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    /// Record a freshly issued signal as a tracked position
    /// (status NEW, current price = entry price, PnL zero).
    pub fn append_entry(&self, signal: &Signal) -> Result<(), StorageError> {
        let rec = EntryRecord::from_signal(signal);
        self.store.append_rows(Table::Entries, &to_rows(&[rec])?)
    }

    /// Record the matching exit-monitoring row (status OPEN).
    pub fn append_exit_mirror(&self, signal: &Signal) -> Result<(), StorageError> {
        let rec = ExitRecord::from_signal(signal);
        self.store.append_rows(Table::Exits, &to_rows(&[rec])?)
    }

    /// Read path for the monitor/UI collaborator.
    pub fn list_all(&self) -> Result<Vec<EntryRecord>, StorageError> {
        from_rows(self.store.read_table(Table::Entries)?)
    }

    pub fn list_exits(&self) -> Result<Vec<ExitRecord>, StorageError> {
        from_rows(self.store.read_table(Table::Exits)?)
    }

    /// Set `current_price`/`pnl_pct` on every entry and exit row of one
    /// symbol. Each table is rewritten in a single atomic replace.
    pub fn update_by_symbol(
        &self,
        symbol: &str,
        current_price: f64,
        pnl_pct: f64,
    ) -> Result<(), StorageError> {
        let mut entries = self.list_all()?;
        let mut touched = false;
        for rec in entries.iter_mut().filter(|r| r.symbol == symbol) {
            rec.current_price = current_price;
            rec.pnl_pct = pnl_pct;
            touched = true;
        }
        if touched {
            self.store.write_table(Table::Entries, &to_rows(&entries)?)?;
        }

        let mut exits = self.list_exits()?;
        let mut touched = false;
        for rec in exits.iter_mut().filter(|r| r.symbol == symbol) {
            rec.current_price = current_price;
            rec.pnl_pct = pnl_pct;
            touched = true;
        }
        if touched {
            self.store.write_table(Table::Exits, &to_rows(&exits)?)?;
        }
        Ok(())
    }
}
