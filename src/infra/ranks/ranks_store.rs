// Implementations for the ranking system.
#![allow(unused_imports)]

#[cfg(test)]
pub mod in_memory;
pub mod json_settings_store;
pub mod last_spoke_file;
pub mod ledger_backend;
pub mod mysql_store;
pub mod sqlite_store;

// Re-export for convenience
#[cfg(test)]
pub use in_memory::InMemoryXpStore;
pub use json_settings_store::JsonSettingsStore;
pub use last_spoke_file::LastSpokeFile;
pub use ledger_backend::LedgerBackend;
pub use mysql_store::MySqlXpStore;
pub use sqlite_store::SqliteXpStore;
