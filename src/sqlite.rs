/// sqlite.rs — SQLite backend for the table store
///
/// Schema is bootstrapped on open. `write_table` runs delete + insert inside
/// one transaction, so readers on other connections only ever see the table
/// before or after the replace. The `signals` table carries the dedup
/// primary key, making at-most-once registration hold even if two processes
/// share the database file.
use std::path::Path;
use std::sync::Mutex;

use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde_json::{Map, Value};

use crate::error::StorageError;
use crate::storage::{Table, TableStore};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS signals (
    signal_id TEXT PRIMARY KEY,
    symbol    TEXT NOT NULL,
    mode      TEXT NOT NULL,
    side      TEXT NOT NULL,
    bar_time  TEXT NOT NULL,
    price     REAL,
    atr       REAL,
    upper     REAL,
    lower     REAL,
    timestamp TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS entries (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    symbol        TEXT NOT NULL,
    side          TEXT NOT NULL,
    mode          TEXT NOT NULL,
    entry         REAL NOT NULL,
    target        REAL,
    current_price REAL,
    pnl_pct       REAL DEFAULT 0.0,
    status        TEXT,
    date          TEXT,
    time          TEXT
);
CREATE TABLE IF NOT EXISTS exits (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    symbol        TEXT NOT NULL,
    side          TEXT NOT NULL,
    mode          TEXT NOT NULL,
    entry         REAL NOT NULL,
    current_price REAL,
    target        REAL,
    pnl_pct       REAL DEFAULT 0.0,
    status        TEXT,
    date          TEXT,
    time          TEXT
);
CREATE TABLE IF NOT EXISTS coins (
    symbol TEXT PRIMARY KEY,
    active INTEGER NOT NULL DEFAULT 1,
    note   TEXT DEFAULT ''
);
";

fn columns(table: Table) -> &'static [&'static str] {
    match table {
        Table::Signals => &[
            "signal_id", "symbol", "mode", "side", "bar_time", "price", "atr", "upper", "lower",
            "timestamp",
        ],
        Table::Entries => &[
            "symbol", "side", "mode", "entry", "target", "current_price", "pnl_pct", "status",
            "date", "time",
        ],
        Table::Exits => &[
            "symbol", "side", "mode", "entry", "current_price", "target", "pnl_pct", "status",
            "date", "time",
        ],
        Table::Coins => &["symbol", "active", "note"],
    }
}

fn json_to_sql(value: Option<&Value>) -> rusqlite::types::Value {
    use rusqlite::types::Value as Sql;
    match value {
        None | Some(Value::Null) => Sql::Null,
        Some(Value::Bool(b)) => Sql::Integer(*b as i64),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                Sql::Integer(i)
            } else {
                Sql::Real(n.as_f64().unwrap_or(0.0))
            }
        }
        Some(Value::String(s)) => Sql::Text(s.clone()),
        // Nested structures are not part of any table schema
        Some(other) => Sql::Text(other.to_string()),
    }
}

fn sql_to_json(column: &str, value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        // `active` is the only boolean column across the four tables
        ValueRef::Integer(i) if column == "active" => Value::Bool(i != 0),
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Value::from(f),
        ValueRef::Text(t) => Value::from(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(_) => Value::Null,
    }
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Unavailable("sqlite connection poisoned".into()))
    }

    fn insert_rows(
        conn: &Connection,
        table: Table,
        rows: &[Value],
    ) -> Result<(), StorageError> {
        let cols = columns(table);
        let placeholders = (1..=cols.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        // The dedup tables carry their natural primary key; re-inserting an
        // existing signal_id/symbol must stay a no-op.
        let verb = match table {
            Table::Signals | Table::Coins => "INSERT OR IGNORE",
            Table::Entries | Table::Exits => "INSERT",
        };
        let sql = format!(
            "{verb} INTO {} ({}) VALUES ({placeholders})",
            table.name(),
            cols.join(", ")
        );
        let mut stmt = conn.prepare(&sql)?;
        for row in rows {
            let obj = row.as_object().cloned().unwrap_or_else(Map::new);
            let params: Vec<rusqlite::types::Value> =
                cols.iter().map(|c| json_to_sql(obj.get(*c))).collect();
            stmt.execute(rusqlite::params_from_iter(params))?;
        }
        Ok(())
    }
}

impl TableStore for SqliteStore {
    fn read_table(&self, table: Table) -> Result<Vec<Value>, StorageError> {
        let conn = self.lock()?;
        let cols = columns(table);
        let sql = format!("SELECT {} FROM {}", cols.join(", "), table.name());
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut obj = Map::new();
            for (i, col) in cols.iter().enumerate() {
                obj.insert((*col).to_owned(), sql_to_json(col, row.get_ref(i)?));
            }
            out.push(Value::Object(obj));
        }
        Ok(out)
    }

    fn write_table(&self, table: Table, rows: &[Value]) -> Result<(), StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(&format!("DELETE FROM {}", table.name()), [])?;
        Self::insert_rows(&tx, table, rows)?;
        tx.commit()?;
        Ok(())
    }

    fn append_rows(&self, table: Table, rows: &[Value]) -> Result<(), StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        Self::insert_rows(&tx, table, rows)?;
        tx.commit()?;
        Ok(())
    }
}
