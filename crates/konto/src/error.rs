//! Fehlertypen fuer den Konto-Service

use stammtisch_db::DbError;
use thiserror::Error;

/// Alle moeglichen Fehler im Konto-Service
#[derive(Debug, Error)]
pub enum KontoError {
    /// Abfrage lieferte keinen passenden Datensatz
    #[error("Nicht gefunden: {0}")]
    NichtGefunden(String),

    /// Eindeutigkeit (Pseudonym, E-Mail, Praesentation) verletzt
    #[error("Bereits vergeben: {0}")]
    Duplikat(String),

    /// Fehler des Speicher-Backends, Diagnosetext unveraendert
    #[error("Speicherfehler: {0}")]
    Speicher(String),

    /// Operation passt nicht zum aktuellen Zustand des Kontos
    #[error("Ungueltiger Zustand: {0}")]
    UngueltigerZustand(String),

    #[error("Passwort-Hashing fehlgeschlagen: {0}")]
    PasswortHashing(String),
}

impl KontoError {
    pub fn ungueltiger_zustand(msg: impl Into<String>) -> Self {
        Self::UngueltigerZustand(msg.into())
    }

    pub fn nicht_gefunden(msg: impl Into<String>) -> Self {
        Self::NichtGefunden(msg.into())
    }
}

impl From<DbError> for KontoError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NichtGefunden(msg) => Self::NichtGefunden(msg),
            DbError::Eindeutigkeit(msg) => Self::Duplikat(msg),
            andere if andere.ist_eindeutigkeit() => Self::Duplikat(andere.to_string()),
            andere => Self::Speicher(andere.to_string()),
        }
    }
}

/// Result-Alias fuer den Konto-Service
pub type KontoResult<T> = Result<T, KontoError>;
