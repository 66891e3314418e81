//! Gemeinsame Identifikationstypen fuer Stammtisch
//!
//! Newtype-Pattern, damit die handelnde Identitaet einer Moderationsaktion
//! nicht mit einem beliebigen Pseudonym verwechselt werden kann.

use serde::{Deserialize, Serialize};

/// Handelnde Identitaet einer Moderationsaktion (Funktions-Pseudonym)
///
/// Wird vom Aufrufer aus dem authentifizierten Kontext uebergeben und
/// niemals aus globalem Zustand gelesen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Richter(pub String);

impl Richter {
    /// Erstellt einen Richter aus einem Funktions-Pseudonym
    pub fn neu(funktions_pseudo: impl Into<String>) -> Self {
        Self(funktions_pseudo.into())
    }

    /// Gibt das Funktions-Pseudonym zurueck
    pub fn als_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Richter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "richter:{}", self.0)
    }
}
