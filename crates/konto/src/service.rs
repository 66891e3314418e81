//! Konto-Service fuer Stammtisch
//!
//! Zentraler Service fuer Kontoerstellung, Passwortwechsel und die kleineren
//! Kontooperationen. Jede Operation ist ein abgeschlossener Lese-/Schreibzugriff
//! auf das Repository; der uebergebene `KontoRecord` wird erst nach einem
//! erfolgreichen Schreibvorgang angepasst.

use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;

use stammtisch_core::Uhr;
use stammtisch_db::{
    models::{KontoRecord, KontoStatus, NeuesKonto, EMAIL_TRENNER},
    KontoRepository,
};

use crate::{
    error::{KontoError, KontoResult},
    konfig::KontoKonfig,
    passwort::{passwort_hashen, secret_erzeugen, zufallszeichen, AKTIVIERUNGS_TOKEN_LAENGE},
};

/// Das Trennzeichen ist fuer `alt|neu` reserviert
pub(crate) fn adresse_pruefen(email: &str) -> KontoResult<()> {
    if email.contains(EMAIL_TRENNER) {
        return Err(KontoError::ungueltiger_zustand(format!(
            "E-Mail '{email}' enthaelt das reservierte Zeichen '{EMAIL_TRENNER}'"
        )));
    }
    Ok(())
}

/// Konto-Service – Einstiegspunkt fuer den Lebenszyklus eines Kontos
pub struct KontoService<R: KontoRepository> {
    pub(crate) repo: Arc<R>,
    pub(crate) uhr: Arc<dyn Uhr>,
    pub(crate) konfig: KontoKonfig,
}

impl<R: KontoRepository + 'static> KontoService<R> {
    /// Erstellt einen neuen KontoService
    pub fn neu(repo: Arc<R>, uhr: Arc<dyn Uhr>, konfig: KontoKonfig) -> Self {
        Self { repo, uhr, konfig }
    }

    pub fn konfig(&self) -> &KontoKonfig {
        &self.konfig
    }

    /// Legt ein neues, noch unbestaetigtes Konto an
    ///
    /// Erzeugt Secret und 15-stelliges Aktivierungs-Token. Schlaegt mit
    /// `Duplikat` fehl, wenn Pseudonym oder E-Mail vergeben sind (auch als
    /// Haelfte eines ausstehenden Wechsels) oder das Pseudonym einem
    /// Funktions-Pseudonym entspricht; `UngueltigerZustand` bei `|` in der Adresse.
    pub async fn erstellen(
        &self,
        pseudo: &str,
        email: &str,
        klartext: &str,
    ) -> KontoResult<KontoRecord> {
        adresse_pruefen(email)?;
        let secret = secret_erzeugen();
        let token = zufallszeichen(AKTIVIERUNGS_TOKEN_LAENGE);
        let password_hash = passwort_hashen(&self.konfig.passwort, pseudo, &secret, klartext)?;

        let konto = self
            .repo
            .create(NeuesKonto {
                pseudo,
                email,
                secret: &secret,
                password_hash: &password_hash,
                bestaetigungs_token: &token,
                jetzt: self.uhr.jetzt(),
            })
            .await?;

        tracing::info!(pseudo = %konto.pseudo, "Konto erstellt");
        Ok(konto)
    }

    /// Laedt ein Konto anhand seines Pseudonyms
    pub async fn laden(&self, pseudo: &str) -> KontoResult<KontoRecord> {
        self.repo
            .get_by_pseudo(pseudo)
            .await?
            .ok_or_else(|| KontoError::nicht_gefunden(format!("Konto {pseudo}")))
    }

    /// Setzt ein neues Passwort; das Secret bleibt unveraendert
    pub async fn passwort_setzen(&self, konto: &mut KontoRecord, klartext: &str) -> KontoResult<()> {
        let hash = passwort_hashen(&self.konfig.passwort, &konto.pseudo, &konto.secret, klartext)?;
        self.repo.update_password_hash(&konto.pseudo, &hash).await?;
        konto.password_hash = hash;

        tracing::info!(pseudo = %konto.pseudo, "Passwort geaendert");
        Ok(())
    }

    /// Schaltet die erweiterten Funktionen um und gibt den neuen Wert zurueck
    pub async fn erweiterte_funktionen_umschalten(
        &self,
        konto: &mut KontoRecord,
    ) -> KontoResult<bool> {
        if konto.status != KontoStatus::Bestaetigt {
            return Err(KontoError::ungueltiger_zustand(format!(
                "Konto {} ist nicht bestaetigt",
                konto.pseudo
            )));
        }

        let neu = !konto.erweiterte_funktionen;
        self.repo
            .update_erweiterte_funktionen(&konto.pseudo, neu)
            .await?;
        konto.erweiterte_funktionen = neu;

        tracing::debug!(pseudo = %konto.pseudo, aktiv = neu, "Erweiterte Funktionen umgeschaltet");
        Ok(neu)
    }

    /// Setzt den Zeitpunkt der letzten Verbindung auf jetzt
    pub async fn verbindung_aktualisieren(&self, konto: &mut KontoRecord) -> KontoResult<()> {
        let jetzt = self.uhr.jetzt();
        self.repo
            .update_letzte_verbindung(&konto.pseudo, jetzt)
            .await?;
        konto.letzte_verbindung = jetzt;
        Ok(())
    }

    /// Speichert den Vorstellungstext der Registrierung (einmalig)
    pub async fn praesentation_registrieren(&self, pseudo: &str, text: &str) -> KontoResult<()> {
        self.repo.create_praesentation(pseudo, text).await?;
        tracing::debug!(pseudo = %pseudo, "Praesentation gespeichert");
        Ok(())
    }

    /// Vorstellungstext oder leerer String
    pub async fn praesentation_laden(&self, pseudo: &str) -> KontoResult<String> {
        Ok(self.repo.get_praesentation(pseudo).await?.unwrap_or_default())
    }

    /// Einladendes Mitglied fuer die aktuelle Adresse des Kontos oder leerer String
    pub async fn sponsor_laden(&self, konto: &KontoRecord) -> KontoResult<String> {
        Ok(self
            .repo
            .get_sponsor(konto.aktuelle_email())
            .await?
            .unwrap_or_default())
    }

    /// Loescht unbestaetigte Neukonten, deren Registrierung zu lange zurueckliegt
    pub async fn unbestaetigte_bereinigen(&self) -> KontoResult<u64> {
        let grenze = self.uhr.jetzt() - ChronoDuration::seconds(self.konfig.unbestaetigt_ttl_sekunden);
        let anzahl = self.repo.delete_unbestaetigte(grenze).await?;
        if anzahl > 0 {
            tracing::info!(anzahl, "Unbestaetigte Konten bereinigt");
        }
        Ok(anzahl)
    }

    /// Startet die periodische Bereinigung unbestaetigter Konten.
    ///
    /// Laeuft auf einem eigenen Thread, da die Repository-Futures nicht `Send` sind.
    pub fn bereinigung_starten(service: Arc<Self>, intervall: Duration) {
        let handle = tokio::runtime::Handle::current();
        std::thread::spawn(move || {
            handle.block_on(async move {
                loop {
                    tokio::time::sleep(intervall).await;
                    if let Err(e) = service.unbestaetigte_bereinigen().await {
                        tracing::error!("Fehler bei der Konto-Bereinigung: {}", e);
                    }
                }
            });
        });
    }
}
