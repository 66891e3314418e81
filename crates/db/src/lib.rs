//! stammtisch-db – Datenbank-Abstraktion
//!
//! Dieses Crate stellt das Repository-Pattern fuer Konten, das
//! Urteilsregister und Verzeichnisabfragen bereit. Die SQLite-Implementierung
//! speichert Zeitpunkte als Unix-Sekunden, damit Bann-Arithmetik atomar in
//! der Datenbank erfolgen kann.

pub mod error;
pub mod models;
pub mod repository;
pub mod sqlite;

pub use error::DbError;
pub use repository::{
    BestaetigungsUpdate, DatabaseConfig, DbResult, KontoRepository, UrteilRepository,
    VerzeichnisRepository,
};
pub use sqlite::SqliteDb;
