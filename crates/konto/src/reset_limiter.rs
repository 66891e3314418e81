//! Gleitendes 24-Stunden-Fenster fuer Passwort-Reset-Versuche
//!
//! Eine Obergrenze fuer Versuche setzt der Aufrufer durch; hier wird nur der
//! Zaehler gefuehrt.

use chrono::Duration;

use stammtisch_db::{models::KontoRecord, KontoRepository};

use crate::{error::KontoResult, service::KontoService};

impl<R: KontoRepository + 'static> KontoService<R> {
    /// Liegt der letzte Reset-Versuch innerhalb des Fensters?
    pub fn reset_kuerzlich_versucht(&self, konto: &KontoRecord) -> bool {
        self.uhr.jetzt() - konto.reset_letzter_versuch
            < Duration::seconds(self.konfig.reset_fenster_sekunden)
    }

    /// Erfasst einen Reset-Versuch und gibt den neuen Zaehlerstand zurueck
    ///
    /// Das Fenster wird in der Datenbank geprueft, parallele Versuche gehen
    /// nicht verloren.
    pub async fn reset_versuch_erfassen(&self, konto: &mut KontoRecord) -> KontoResult<i64> {
        let jetzt = self.uhr.jetzt();
        let versuche = self
            .repo
            .record_reset_attempt(&konto.pseudo, jetzt, self.konfig.reset_fenster_sekunden)
            .await?;

        konto.reset_versuche = versuche;
        konto.reset_letzter_versuch = jetzt;
        tracing::debug!(pseudo = %konto.pseudo, versuche, "Passwort-Reset-Versuch erfasst");
        Ok(versuche)
    }
}
