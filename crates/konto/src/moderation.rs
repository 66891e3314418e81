//! Moderations-Service fuer Stammtisch
//!
//! Verwaltung zeitlich begrenzter Banns und des Urteilsregisters. Banns
//! stapeln sich: jedes neue Urteil verlaengert den Bann ab dem spaeteren von
//! jetzt und dem bisherigen Ablauf. Bann und Registereintrag entstehen in
//! einer Transaktion und sind nur gemeinsam verfuegbar.

use std::sync::Arc;
use std::time::Duration;

use stammtisch_core::{max_zeitstempel, Richter, Uhr};
use stammtisch_db::{
    models::{KontoRecord, NeuesUrteil, UrteilRecord},
    DbError, UrteilRepository,
};

use crate::error::{KontoError, KontoResult};

/// Moderations-Service – Banns und Urteilsregister
pub struct ModerationService<R: UrteilRepository> {
    repo: Arc<R>,
    uhr: Arc<dyn Uhr>,
}

impl<R: UrteilRepository> ModerationService<R> {
    /// Erstellt einen neuen ModerationService
    pub fn neu(repo: Arc<R>, uhr: Arc<dyn Uhr>) -> Self {
        Self { repo, uhr }
    }

    /// Verbannt ein Konto und traegt das Urteil ins Register ein
    ///
    /// `bann_ablauf = max(jetzt, bann_ablauf) + dauer`; der Registereintrag
    /// erhaelt exakt diesen Ablauf. Ein Ablauf jenseits des darstellbaren
    /// Zeitbereichs wird mit `UngueltigerZustand` abgelehnt, ohne zu schreiben.
    pub async fn verbannen(
        &self,
        konto: &mut KontoRecord,
        dauer: Duration,
        details: &str,
        richter: &Richter,
    ) -> KontoResult<UrteilRecord> {
        let zu_gross =
            || KontoError::ungueltiger_zustand(format!("Bann-Dauer zu gross: {}s", dauer.as_secs()));
        let dauer_sekunden = i64::try_from(dauer.as_secs()).map_err(|_| zu_gross())?;

        let jetzt = self.uhr.jetzt();
        let basis = jetzt.max(konto.bann_ablauf).timestamp();
        match basis.checked_add(dauer_sekunden) {
            Some(ablauf) if ablauf <= max_zeitstempel() => {}
            _ => return Err(zu_gross()),
        }

        // Die Datenbank prueft gegen den gespeicherten Ablauf erneut
        let urteil = self
            .repo
            .verhaengen(NeuesUrteil {
                pseudo: &konto.pseudo,
                richter: richter.als_str(),
                dauer_sekunden,
                details,
                jetzt,
            })
            .await
            .map_err(|e| match e {
                DbError::UngueltigeDaten(msg) => KontoError::UngueltigerZustand(msg),
                andere => andere.into(),
            })?;

        konto.bann_ablauf = urteil.laeuft_ab_am;

        tracing::info!(
            pseudo = %konto.pseudo,
            richter = %richter,
            dauer_sekunden,
            laeuft_ab_am = %urteil.laeuft_ab_am,
            urteil_id = %urteil.id,
            "Konto verbannt"
        );

        Ok(urteil)
    }

    /// Hebt den Bann auf, ohne das Register zu veraendern
    pub async fn bann_aufheben(&self, konto: &mut KontoRecord) -> KontoResult<()> {
        let jetzt = self.uhr.jetzt();
        self.repo.bann_aufheben(&konto.pseudo, jetzt).await?;
        konto.bann_ablauf = jetzt;

        tracing::info!(pseudo = %konto.pseudo, "Bann aufgehoben");
        Ok(())
    }

    /// Markiert alle noch laufenden Urteile als gelockert
    pub async fn urteile_lockern(&self, konto: &KontoRecord) -> KontoResult<u64> {
        let anzahl = self.repo.lockern(&konto.pseudo, self.uhr.jetzt()).await?;
        tracing::info!(pseudo = %konto.pseudo, anzahl, "Urteile gelockert");
        Ok(anzahl)
    }

    /// Bann aufheben und laufende Urteile lockern in einem Schritt
    pub async fn begnadigen(&self, konto: &mut KontoRecord) -> KontoResult<u64> {
        let jetzt = self.uhr.jetzt();
        let anzahl = self.repo.begnadigen(&konto.pseudo, jetzt).await?;
        konto.bann_ablauf = jetzt;

        tracing::info!(pseudo = %konto.pseudo, anzahl, "Konto begnadigt");
        Ok(anzahl)
    }

    /// Urteile eines Kontos, aelteste zuerst
    ///
    /// Mit `nur_aktive` nur ungelockerte Urteile, die noch nicht abgelaufen sind.
    pub async fn urteile_listen(
        &self,
        konto: &KontoRecord,
        nur_aktive: bool,
    ) -> KontoResult<Vec<UrteilRecord>> {
        Ok(self
            .repo
            .list(&konto.pseudo, nur_aktive, self.uhr.jetzt())
            .await?)
    }

    /// Prueft ob ein Konto aktuell gebannt ist
    pub fn ist_gebannt(&self, konto: &KontoRecord) -> bool {
        konto.bann_ablauf > self.uhr.jetzt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stammtisch_core::ManuelleUhr;
    use stammtisch_db::SqliteDb;

    use crate::service::tests::{test_service, zeit, T0};

    async fn test_moderation() -> (ModerationService<SqliteDb>, KontoRecord, Arc<ManuelleUhr>) {
        let (service, db, uhr) = test_service().await;
        let mut konto = service.erstellen("troll", "t@x.com", "pw").await.unwrap();
        service.bestaetigen(&mut konto).await.unwrap();
        (ModerationService::neu(db, uhr.clone()), konto, uhr)
    }

    fn root() -> Richter {
        Richter::neu("root")
    }

    #[tokio::test]
    async fn verbannen_und_register() {
        let (moderation, mut konto, _uhr) = test_moderation().await;

        let urteil = moderation
            .verbannen(&mut konto, Duration::from_secs(3_600), "spam", &root())
            .await
            .unwrap();
        assert_eq!(konto.bann_ablauf, zeit(T0 + 3_600));
        assert_eq!(urteil.laeuft_ab_am, zeit(T0 + 3_600));
        assert_eq!(urteil.richter, "root");
        assert_eq!(urteil.details, "spam");
        assert!(!urteil.gelockert);
        assert!(moderation.ist_gebannt(&konto));

        let urteile = moderation.urteile_listen(&konto, false).await.unwrap();
        assert_eq!(urteile.len(), 1);
        assert_eq!(urteile[0].id, urteil.id);
    }

    #[tokio::test]
    async fn banns_stapeln_sich() {
        let (moderation, mut konto, uhr) = test_moderation().await;

        moderation
            .verbannen(&mut konto, Duration::from_secs(600), "erste", &root())
            .await
            .unwrap();
        uhr.vorstellen(100);
        let zweites = moderation
            .verbannen(&mut konto, Duration::from_secs(300), "zweite", &root())
            .await
            .unwrap();

        assert_eq!(konto.bann_ablauf, zeit(T0 + 900));
        assert_eq!(zweites.laeuft_ab_am, konto.bann_ablauf);
    }

    #[tokio::test]
    async fn veralteter_speicherstand_verliert_nichts() {
        let (moderation, konto, _uhr) = test_moderation().await;

        // Zwei Moderatoren mit je eigener Kopie desselben Kontos
        let mut kopie_a = konto.clone();
        let mut kopie_b = konto;
        moderation
            .verbannen(&mut kopie_a, Duration::from_secs(100), "a", &Richter::neu("mod_a"))
            .await
            .unwrap();
        let b = moderation
            .verbannen(&mut kopie_b, Duration::from_secs(50), "b", &Richter::neu("mod_b"))
            .await
            .unwrap();

        assert_eq!(b.laeuft_ab_am, zeit(T0 + 150));
        assert_eq!(kopie_b.bann_ablauf, zeit(T0 + 150));
    }

    #[tokio::test]
    async fn verbannen_unbekanntes_konto() {
        let (moderation, mut konto, _uhr) = test_moderation().await;
        konto.pseudo = "geist".into();

        let err = moderation
            .verbannen(&mut konto, Duration::from_secs(10), "x", &root())
            .await
            .unwrap_err();
        assert!(matches!(err, KontoError::NichtGefunden(_)));
        assert_eq!(konto.bann_ablauf, chrono::DateTime::<chrono::Utc>::UNIX_EPOCH);
    }

    #[tokio::test]
    async fn bann_jenseits_des_zeitbereichs_abgelehnt() {
        let (service, db, uhr) = test_service().await;
        let mut konto = service.erstellen("troll", "t@x.com", "pw").await.unwrap();
        service.bestaetigen(&mut konto).await.unwrap();
        let moderation = ModerationService::neu(db, uhr);

        let err = moderation
            .verbannen(&mut konto, Duration::from_secs(10_000_000_000_000), "ewig", &root())
            .await
            .unwrap_err();
        assert!(matches!(err, KontoError::UngueltigerZustand(_)));
        assert_eq!(konto.bann_ablauf, chrono::DateTime::<chrono::Utc>::UNIX_EPOCH);
        assert!(moderation.urteile_listen(&konto, false).await.unwrap().is_empty());

        let geladen = service.laden("troll").await.unwrap();
        assert_eq!(geladen.bann_ablauf, chrono::DateTime::<chrono::Utc>::UNIX_EPOCH);
    }

    #[tokio::test]
    async fn bann_bis_zum_rand_des_zeitbereichs() {
        let (moderation, mut konto, _uhr) = test_moderation().await;
        let dauer = (max_zeitstempel() - T0) as u64;

        let urteil = moderation
            .verbannen(&mut konto, Duration::from_secs(dauer), "lang", &root())
            .await
            .unwrap();
        assert_eq!(urteil.laeuft_ab_am.timestamp(), max_zeitstempel());
        assert!(moderation.ist_gebannt(&konto));

        // Jede weitere Sekunde laege ausserhalb
        let err = moderation
            .verbannen(&mut konto, Duration::from_secs(1), "mehr", &root())
            .await
            .unwrap_err();
        assert!(matches!(err, KontoError::UngueltigerZustand(_)));
        assert_eq!(moderation.urteile_listen(&konto, false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn veraltete_kopie_kann_den_zeitbereich_nicht_sprengen() {
        let (moderation, konto, _uhr) = test_moderation().await;
        let mut aktuell = konto.clone();
        let mut veraltet = konto;
        let dauer = (max_zeitstempel() - T0 - 10) as u64;
        moderation
            .verbannen(&mut aktuell, Duration::from_secs(dauer), "lang", &root())
            .await
            .unwrap();

        // Die Kopie kennt den langen Bann nicht, die Datenbank schon
        let err = moderation
            .verbannen(&mut veraltet, Duration::from_secs(3_600), "mehr", &root())
            .await
            .unwrap_err();
        assert!(matches!(err, KontoError::UngueltigerZustand(_)));
        assert_eq!(moderation.urteile_listen(&aktuell, false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn aufheben_und_lockern() {
        let (moderation, mut konto, uhr) = test_moderation().await;
        moderation
            .verbannen(&mut konto, Duration::from_secs(3_600), "spam", &root())
            .await
            .unwrap();

        uhr.vorstellen(60);
        moderation.bann_aufheben(&mut konto).await.unwrap();
        assert_eq!(konto.bann_ablauf, zeit(T0 + 60));
        assert!(!moderation.ist_gebannt(&konto));
        // Register unveraendert
        assert_eq!(moderation.urteile_listen(&konto, true).await.unwrap().len(), 1);

        assert_eq!(moderation.urteile_lockern(&konto).await.unwrap(), 1);
        let urteile = moderation.urteile_listen(&konto, false).await.unwrap();
        assert!(urteile[0].gelockert);
        assert!(moderation.urteile_listen(&konto, true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn begnadigen_in_einem_schritt() {
        let (moderation, mut konto, uhr) = test_moderation().await;
        moderation
            .verbannen(&mut konto, Duration::from_secs(10), "kurz", &root())
            .await
            .unwrap();
        moderation
            .verbannen(&mut konto, Duration::from_secs(3_600), "lang", &root())
            .await
            .unwrap();

        uhr.vorstellen(20);
        // Das erste Urteil ist bereits abgelaufen und bleibt ungelockert
        assert_eq!(moderation.begnadigen(&mut konto).await.unwrap(), 1);
        assert!(!moderation.ist_gebannt(&konto));
        assert_eq!(konto.bann_ablauf, zeit(T0 + 20));

        let urteile = moderation.urteile_listen(&konto, false).await.unwrap();
        assert_eq!(urteile.len(), 2);
        assert!(!urteile[0].gelockert);
        assert!(urteile[1].gelockert);
    }

    #[tokio::test]
    async fn aktive_urteile_ohne_abgelaufene() {
        let (moderation, mut konto, uhr) = test_moderation().await;
        moderation
            .verbannen(&mut konto, Duration::from_secs(10), "kurz", &root())
            .await
            .unwrap();

        uhr.vorstellen(10);
        assert!(!moderation.ist_gebannt(&konto));
        assert!(moderation.urteile_listen(&konto, true).await.unwrap().is_empty());

        moderation
            .verbannen(&mut konto, Duration::from_secs(100), "neu", &root())
            .await
            .unwrap();
        let aktive = moderation.urteile_listen(&konto, true).await.unwrap();
        assert_eq!(aktive.len(), 1);
        assert_eq!(aktive[0].details, "neu");
        assert_eq!(aktive[0].laeuft_ab_am, zeit(T0 + 110));
    }
}
