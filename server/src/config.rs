//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Dienst ohne Konfigurationsdatei
//! lauffaehig ist.

use serde::{Deserialize, Serialize};
use stammtisch_db::DatabaseConfig;
use stammtisch_konto::KontoKonfig;

use crate::logging::{log_format_gueltig, log_level_gueltig};

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub datenbank: DatenbankEinstellungen,
    pub logging: LoggingEinstellungen,
    /// Konten, Passwort-Richtlinie und Bereinigung
    pub konto: KontoKonfig,
}

/// Datenbank-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatenbankEinstellungen {
    /// Verbindungs-URL
    pub url: String,
    /// Maximale Verbindungspool-Groesse
    pub max_verbindungen: u32,
    /// WAL-Modus aktivieren
    pub sqlite_wal: bool,
}

impl Default for DatenbankEinstellungen {
    fn default() -> Self {
        let standard = DatabaseConfig::default();
        Self {
            url: standard.url,
            max_verbindungen: standard.max_verbindungen,
            sqlite_wal: standard.sqlite_wal,
        }
    }
}

impl From<&DatenbankEinstellungen> for DatabaseConfig {
    fn from(e: &DatenbankEinstellungen) -> Self {
        Self {
            url: e.url.clone(),
            max_verbindungen: e.max_verbindungen,
            sqlite_wal: e.sqlite_wal,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Herkunft einer geladenen Konfiguration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigQuelle {
    Datei,
    /// Datei fehlt, es gelten die Standardwerte
    Standard,
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert;
    /// das Logging ist zu diesem Zeitpunkt noch nicht aktiv, daher meldet der
    /// Aufrufer die Quelle.
    pub fn laden(pfad: &str) -> anyhow::Result<(Self, ConfigQuelle)> {
        let (config, quelle) = match std::fs::read_to_string(pfad) {
            Ok(inhalt) => (
                toml::from_str::<Self>(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?,
                ConfigQuelle::Datei,
            ),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                (Self::default(), ConfigQuelle::Standard)
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
                ))
            }
        };
        config.pruefen()?;
        Ok((config, quelle))
    }

    /// Prueft Wertebereiche, die serde nicht abdeckt
    pub fn pruefen(&self) -> anyhow::Result<()> {
        if !log_level_gueltig(&self.logging.level) {
            anyhow::bail!("Ungueltiges Log-Level: {}", self.logging.level);
        }
        if !log_format_gueltig(&self.logging.format) {
            anyhow::bail!("Ungueltiges Log-Format: {}", self.logging.format);
        }
        if self.datenbank.max_verbindungen == 0 {
            anyhow::bail!("datenbank.max_verbindungen muss groesser als 0 sein");
        }
        if self.konto.bereinigung_intervall_sekunden == 0 {
            anyhow::bail!("konto.bereinigung_intervall_sekunden muss groesser als 0 sein");
        }
        Ok(())
    }
}
