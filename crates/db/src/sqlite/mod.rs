//! SQLite-Backend-Implementierungen fuer alle Repository-Traits

pub mod konten;
pub mod pool;
pub mod urteile;
pub mod verzeichnis;

pub use pool::SqliteDb;
