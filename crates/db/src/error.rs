//! Fehlertypen fuer das Datenbank-Crate

use thiserror::Error;

/// Datenbank-Fehlertypen
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Datensatz nicht gefunden: {0}")]
    NichtGefunden(String),

    #[error("Eindeutigkeitsverletzung: {0}")]
    Eindeutigkeit(String),

    #[error("Ungueltige Daten: {0}")]
    UngueltigeDaten(String),

    #[error("SQLx-Fehler: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration-Fehler: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Interner DB-Fehler: {0}")]
    Intern(String),
}

impl DbError {
    pub fn nicht_gefunden(msg: impl Into<String>) -> Self {
        Self::NichtGefunden(msg.into())
    }

    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    /// Gibt true zurueck wenn es sich um einen Eindeutigkeitsfehler handelt
    pub fn ist_eindeutigkeit(&self) -> bool {
        matches!(self, Self::Eindeutigkeit(_))
            || matches!(self, Self::Sqlx(e) if ist_unique_verletzung(e))
    }

    /// Bildet einen Schreibfehler auf `Eindeutigkeit` ab, falls das Backend
    /// eine UNIQUE- oder PRIMARY-KEY-Verletzung meldet
    pub(crate) fn beim_schreiben(e: sqlx::Error, kontext: impl FnOnce() -> String) -> Self {
        if ist_unique_verletzung(&e) {
            Self::Eindeutigkeit(kontext())
        } else {
            Self::Sqlx(e)
        }
    }
}

fn ist_unique_verletzung(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => db.is_unique_violation(),
        _ => {
            let msg = e.to_string();
            msg.contains("UNIQUE") || msg.contains("unique")
        }
    }
}
