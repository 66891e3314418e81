//! Laufzeit-Konfiguration des Konto-Service

use serde::{Deserialize, Serialize};

/// Argon2id-Parameter fuer das Passwort-Hashing
///
/// Standardwerte gemaess OWASP-Empfehlungen: 64 MiB, 3 Iterationen, 1 Thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswortRichtlinie {
    pub speicher_kib: u32,
    pub iterationen: u32,
    pub parallelitaet: u32,
}

impl Default for PasswortRichtlinie {
    fn default() -> Self {
        Self {
            speicher_kib: 64 * 1024,
            iterationen: 3,
            parallelitaet: 1,
        }
    }
}

/// Konfiguration fuer Konten, Reset-Limiter, Praesenz und Bereinigung
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KontoKonfig {
    pub passwort: PasswortRichtlinie,
    /// Gleitendes Fenster fuer Passwort-Reset-Versuche
    pub reset_fenster_sekunden: i64,
    /// Wer innerhalb dieses Fensters aktiv war, gilt als online
    pub online_fenster_sekunden: i64,
    /// Unbestaetigte Neukonten werden nach dieser Zeit geloescht
    pub unbestaetigt_ttl_sekunden: i64,
    pub such_limit: i64,
    pub bereinigung_intervall_sekunden: u64,
}

impl Default for KontoKonfig {
    fn default() -> Self {
        Self {
            passwort: PasswortRichtlinie::default(),
            reset_fenster_sekunden: 24 * 60 * 60,
            online_fenster_sekunden: 180,
            unbestaetigt_ttl_sekunden: 24 * 60 * 60,
            such_limit: 5,
            bereinigung_intervall_sekunden: 60 * 60,
        }
    }
}
