//! Zeitquelle fuer Stammtisch
//!
//! Alle zeitabhaengigen Operationen lesen die aktuelle Serverzeit ueber den
//! `Uhr`-Trait, damit Ablauf- und Fensterlogik deterministisch testbar bleibt.
//! In der Datenbank werden Zeitpunkte als Unix-Sekunden abgelegt.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

/// Quelle der aktuellen Serverzeit
pub trait Uhr: Send + Sync + 'static {
    /// Aktueller Zeitpunkt
    fn jetzt(&self) -> DateTime<Utc>;

    /// Aktueller Zeitpunkt als Unix-Zeitstempel (Sekunden)
    fn zeitstempel(&self) -> i64 {
        self.jetzt().timestamp()
    }
}

/// Systemuhr – liefert die echte Serverzeit
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemUhr;

impl Uhr for SystemUhr {
    fn jetzt(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manuell gestellte Uhr mit Sekundenaufloesung
///
/// Fuer Tests und Werkzeuge, die Zeitfenster gezielt ueberschreiten muessen.
#[derive(Debug)]
pub struct ManuelleUhr {
    sekunden: AtomicI64,
}

impl ManuelleUhr {
    /// Erstellt eine Uhr, die auf dem gegebenen Zeitpunkt steht
    pub fn neu(start: DateTime<Utc>) -> Self {
        Self {
            sekunden: AtomicI64::new(start.timestamp()),
        }
    }

    /// Stellt die Uhr auf einen festen Zeitpunkt
    pub fn stellen(&self, zeitpunkt: DateTime<Utc>) {
        self.sekunden.store(zeitpunkt.timestamp(), Ordering::SeqCst);
    }

    /// Laesst die Uhr um `sekunden` vorlaufen
    pub fn vorstellen(&self, sekunden: i64) {
        self.sekunden.fetch_add(sekunden, Ordering::SeqCst);
    }
}

impl Uhr for ManuelleUhr {
    /// Saettigt am Rand des darstellbaren Bereichs
    fn jetzt(&self) -> DateTime<Utc> {
        let sekunden = self.sekunden.load(Ordering::SeqCst);
        aus_zeitstempel(sekunden).unwrap_or(if sekunden < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        })
    }
}

/// Konvertiert einen Zeitpunkt in Unix-Sekunden
pub fn zu_zeitstempel(zeitpunkt: &DateTime<Utc>) -> i64 {
    zeitpunkt.timestamp()
}

/// Konvertiert Unix-Sekunden in einen Zeitpunkt
///
/// `None` fuer Werte ausserhalb des von chrono darstellbaren Bereichs.
pub fn aus_zeitstempel(sekunden: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(sekunden, 0)
}

/// Groesster Zeitstempel, der sich noch als `DateTime<Utc>` lesen laesst
pub fn max_zeitstempel() -> i64 {
    DateTime::<Utc>::MAX_UTC.timestamp()
}
