pub mod config;
pub mod detector;
pub mod error;
pub mod feed;
pub mod indicators;
pub mod ledger;
pub mod models;
pub mod notify;
pub mod sqlite;
pub mod storage;
pub mod universe;
pub mod updater;
pub mod worker;

pub use models::*;
