//! stammtisch-core – Gemeinsame Typen und Zeitquelle
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen Stammtisch-Crates gemeinsam genutzt werden.

pub mod types;
pub mod zeit;

// Re-Exporte fuer bequemen Zugriff
pub use types::Richter;
pub use zeit::{aus_zeitstempel, max_zeitstempel, zu_zeitstempel, ManuelleUhr, SystemUhr, Uhr};
