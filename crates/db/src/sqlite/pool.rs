//! SQLite-Pool fuer Konten, Urteilsregister und Verzeichnisinhalte
//!
//! Die Migrationen unter `migrations/` legen `accounts`, `records_sentences`
//! und die Inhaltstabellen an. Zeitpunkte liegen dort als Unix-Sekunden.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::error::DbError;
use crate::repository::DatabaseConfig;

/// Wartezeit auf eine gesperrte Datenbank, bevor SQLite `BUSY` meldet.
/// Bann-Transaktion und Bereinigung schreiben parallel zu Anfragen.
const SPERR_WARTEZEIT: Duration = Duration::from_secs(5);

/// Gemeinsamer Speicher aller Repository-Implementierungen
#[derive(Debug, Clone)]
pub struct SqliteDb {
    pub(crate) pool: SqlitePool,
}

impl SqliteDb {
    /// Oeffnet (oder erzeugt) die Stammtisch-Datenbank und bringt das Schema
    /// auf den aktuellen Stand
    pub async fn oeffnen(config: &DatabaseConfig) -> Result<Self, DbError> {
        let journal = if config.sqlite_wal {
            SqliteJournalMode::Wal
        } else {
            SqliteJournalMode::Delete
        };
        let opts = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .journal_mode(journal)
            .busy_timeout(SPERR_WARTEZEIT)
            // Praesentationen haengen per ON DELETE CASCADE an accounts
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_verbindungen)
            .connect_with(opts)
            .await?;

        info!(
            url = %config.url,
            wal = config.sqlite_wal,
            max_verbindungen = config.max_verbindungen,
            "Stammtisch-Datenbank geoeffnet"
        );

        let db = Self { pool };
        db.migrationen_ausfuehren().await?;
        Ok(db)
    }

    /// Wendet ausstehende Schema-Migrationen an
    pub async fn migrationen_ausfuehren(&self) -> Result<(), DbError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        debug!("Schema fuer Konten und Urteilsregister aktuell");
        Ok(())
    }

    /// Direkter Pool-Zugriff fuer Tests, die Zeilen gezielt praeparieren
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Fluechtige Datenbank fuer Repository- und Service-Tests
    ///
    /// Eine einzige, dauerhaft offene Verbindung, sonst verliert jede neue
    /// Verbindung das Schema.
    pub async fn in_memory() -> Result<Self, DbError> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .connect_with(opts)
            .await?;

        let db = Self { pool };
        db.migrationen_ausfuehren().await?;
        Ok(db)
    }
}
