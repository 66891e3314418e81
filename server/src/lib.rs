//! stammtisch-server – Bibliotheks-Root
//!
//! Wartungsdienst: oeffnet die Datenbank (inkl. Migrationen) und bereinigt
//! periodisch unbestaetigte Neukonten.

pub mod config;
pub mod logging;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use config::ServerConfig;
use stammtisch_core::SystemUhr;
use stammtisch_db::{DatabaseConfig, SqliteDb};
use stammtisch_konto::KontoService;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Oeffnet die Datenbank und bereitet den Konto-Service vor
    pub async fn konto_service(&self) -> Result<Arc<KontoService<SqliteDb>>> {
        let db_config = DatabaseConfig::from(&self.config.datenbank);
        let db = SqliteDb::oeffnen(&db_config).await?;

        Ok(Arc::new(KontoService::neu(
            Arc::new(db),
            Arc::new(SystemUhr),
            self.config.konto.clone(),
        )))
    }

    /// Startet alle Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Datenbankverbindung herstellen, Migrationen ausfuehren
    /// 2. Einmalige Bereinigung unbestaetigter Konten
    /// 3. Periodische Bereinigung starten
    /// 4. Auf Ctrl-C warten
    pub async fn starten(self) -> Result<()> {
        tracing::info!(
            url = %self.config.datenbank.url,
            wal = self.config.datenbank.sqlite_wal,
            "Datenbankverbindung wird hergestellt"
        );
        let konten = self.konto_service().await?;

        let anzahl = konten.unbestaetigte_bereinigen().await?;
        tracing::info!(anzahl, "Erste Bereinigung abgeschlossen");

        let intervall = Duration::from_secs(self.config.konto.bereinigung_intervall_sekunden);
        KontoService::bereinigung_starten(konten, intervall);
        tracing::info!(intervall_sekunden = intervall.as_secs(), "Bereinigung aktiv");

        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown-Signal empfangen, Server wird beendet");

        Ok(())
    }
}
