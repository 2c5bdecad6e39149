/// universe.rs — Management of the active trading universe
///
/// The coins table is shared with the interactive monitor: the worker reads
/// it every tick, operators add, pause and resume symbols through these
/// helpers. All writes go through the same table interface as everything
/// else; each mutation is one atomic full-table replace.
use crate::error::StorageError;
use crate::models::CoinRecord;
use crate::storage::{from_rows, to_rows, Table, TableStore};

pub fn list_all(store: &dyn TableStore) -> Result<Vec<CoinRecord>, StorageError> {
    from_rows(store.read_table(Table::Coins)?)
}

/// Symbols currently enabled for scanning.
pub fn list_active(store: &dyn TableStore) -> Result<Vec<String>, StorageError> {
    Ok(list_all(store)?
        .into_iter()
        .filter(|c| c.active)
        .map(|c| c.symbol)
        .collect())
}

/// Insert a coin or update its note, keeping its position in the table.
/// A freshly inserted coin starts active.
pub fn upsert(store: &dyn TableStore, symbol: &str, note: &str) -> Result<(), StorageError> {
    let mut coins = list_all(store)?;
    match coins.iter_mut().find(|c| c.symbol == symbol) {
        Some(coin) => coin.note = note.to_owned(),
        None => coins.push(CoinRecord {
            symbol: symbol.to_owned(),
            active: true,
            note: note.to_owned(),
        }),
    }
    store.write_table(Table::Coins, &to_rows(&coins)?)
}

/// Activate or pause a symbol. Returns `false` when the symbol is unknown.
pub fn set_active(
    store: &dyn TableStore,
    symbol: &str,
    active: bool,
) -> Result<bool, StorageError> {
    let mut coins = list_all(store)?;
    let Some(coin) = coins.iter_mut().find(|c| c.symbol == symbol) else {
        return Ok(false);
    };
    coin.active = active;
    store.write_table(Table::Coins, &to_rows(&coins)?)?;
    Ok(true)
}

/// Drop a symbol from the universe entirely. Existing positions are not
/// touched; they simply stop being rescanned.
pub fn remove(store: &dyn TableStore, symbol: &str) -> Result<bool, StorageError> {
    let mut coins = list_all(store)?;
    let before = coins.len();
    coins.retain(|c| c.symbol != symbol);
    if coins.len() == before {
        return Ok(false);
    }
    store.write_table(Table::Coins, &to_rows(&coins)?)?;
    Ok(true)
}
