//! stammtisch-konto – Konto-Lebenszyklus und Moderation
//!
//! Dieses Crate implementiert:
//! - Passwort-Hashing mit Argon2id (Pseudonym + Secret + Klartext)
//! - KontoService (Erstellung, Bestaetigung, E-Mail-Wechsel, Reset-Limiter,
//!   Praeferenzen, Bereinigung unbestaetigter Konten)
//! - ModerationService (gestapelte Banns mit Urteilsregister)
//! - VerzeichnisService (Eindeutigkeit, Suche, Praesenz, Listen)

pub mod bestaetigung;
pub mod error;
pub mod konfig;
pub mod moderation;
pub mod passwort;
pub mod praeferenzen;
pub mod reset_limiter;
pub mod service;
pub mod verzeichnis;

// Bequeme Re-Exporte
pub use error::{KontoError, KontoResult};
pub use konfig::{KontoKonfig, PasswortRichtlinie};
pub use moderation::ModerationService;
pub use passwort::{passwort_hashen, passwort_verifizieren};
pub use service::KontoService;
pub use verzeichnis::VerzeichnisService;
