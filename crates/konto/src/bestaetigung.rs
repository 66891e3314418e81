//! Bestaetigungs-Zustandsautomat
//!
//! ```text
//! AktivierungAusstehend --bestaetigen--> Bestaetigt
//! Bestaetigt --email_aendern--> EmailWechselAusstehend (email = alt|neu)
//! EmailWechselAusstehend --email_bestaetigen / email_wechsel_abbrechen--> Bestaetigt
//! ```
//!
//! Der Vergleich eines vom Benutzer eingereichten Codes mit dem gespeicherten
//! Token ist Sache des Aufrufers.

use stammtisch_db::{
    models::{KontoRecord, KontoStatus, EMAIL_TRENNER, TOKEN_ERLEDIGT},
    BestaetigungsUpdate, KontoRepository,
};

use crate::{
    error::{KontoError, KontoResult},
    passwort::{zufallszeichen, EMAIL_TOKEN_LAENGE},
    service::{adresse_pruefen, KontoService},
};

impl<R: KontoRepository + 'static> KontoService<R> {
    /// Aktiviert ein neues Konto; ohne Schreibzugriff, wenn bereits bestaetigt
    pub async fn bestaetigen(&self, konto: &mut KontoRecord) -> KontoResult<()> {
        match konto.status {
            KontoStatus::Bestaetigt => {
                tracing::debug!(pseudo = %konto.pseudo, "Konto bereits bestaetigt");
                Ok(())
            }
            KontoStatus::EmailWechselAusstehend => Err(KontoError::ungueltiger_zustand(format!(
                "Konto {} wartet auf E-Mail-Bestaetigung",
                konto.pseudo
            ))),
            KontoStatus::AktivierungAusstehend => {
                self.repo
                    .update_bestaetigung(
                        &konto.pseudo,
                        BestaetigungsUpdate {
                            email: &konto.email,
                            status: KontoStatus::Bestaetigt,
                            token: TOKEN_ERLEDIGT,
                            letzte_verbindung: None,
                        },
                    )
                    .await?;

                konto.status = KontoStatus::Bestaetigt;
                konto.bestaetigungs_token = TOKEN_ERLEDIGT.to_string();
                tracing::info!(pseudo = %konto.pseudo, "Konto bestaetigt");
                Ok(())
            }
        }
    }

    /// Fordert einen E-Mail-Wechsel an
    ///
    /// Die Adresse wird als `alt|neu` gespeichert, das neue Token ist 10 Zeichen
    /// lang. Aktualisiert zugleich die letzte Verbindung. `Duplikat`, wenn die
    /// neue Adresse bei einem anderen Konto steht.
    pub async fn email_aendern(&self, konto: &mut KontoRecord, neue_email: &str) -> KontoResult<()> {
        adresse_pruefen(neue_email)?;
        if konto.status != KontoStatus::Bestaetigt {
            return Err(KontoError::ungueltiger_zustand(format!(
                "E-Mail-Wechsel fuer Konto {} nicht moeglich",
                konto.pseudo
            )));
        }

        let email = format!("{}{EMAIL_TRENNER}{neue_email}", konto.email);
        let token = zufallszeichen(EMAIL_TOKEN_LAENGE);
        let jetzt = self.uhr.jetzt();

        self.repo
            .update_bestaetigung(
                &konto.pseudo,
                BestaetigungsUpdate {
                    email: &email,
                    status: KontoStatus::EmailWechselAusstehend,
                    token: &token,
                    letzte_verbindung: Some(jetzt),
                },
            )
            .await?;

        konto.email = email;
        konto.status = KontoStatus::EmailWechselAusstehend;
        konto.bestaetigungs_token = token;
        konto.letzte_verbindung = jetzt;
        tracing::info!(pseudo = %konto.pseudo, "E-Mail-Wechsel angefordert");
        Ok(())
    }

    /// Uebernimmt die neue Adresse
    pub async fn email_bestaetigen(&self, konto: &mut KontoRecord) -> KontoResult<()> {
        let (_, neu) = wechsel_adressen(konto)?;
        self.wechsel_abschliessen(konto, neu).await?;
        tracing::info!(pseudo = %konto.pseudo, "E-Mail-Wechsel bestaetigt");
        Ok(())
    }

    /// Verwirft den Wechsel und behaelt die alte Adresse
    pub async fn email_wechsel_abbrechen(&self, konto: &mut KontoRecord) -> KontoResult<()> {
        let (alt, _) = wechsel_adressen(konto)?;
        self.wechsel_abschliessen(konto, alt).await?;
        tracing::info!(pseudo = %konto.pseudo, "E-Mail-Wechsel abgebrochen");
        Ok(())
    }

    async fn wechsel_abschliessen(&self, konto: &mut KontoRecord, email: String) -> KontoResult<()> {
        self.repo
            .update_bestaetigung(
                &konto.pseudo,
                BestaetigungsUpdate {
                    email: &email,
                    status: KontoStatus::Bestaetigt,
                    token: TOKEN_ERLEDIGT,
                    letzte_verbindung: None,
                },
            )
            .await?;

        konto.email = email;
        konto.status = KontoStatus::Bestaetigt;
        konto.bestaetigungs_token = TOKEN_ERLEDIGT.to_string();
        Ok(())
    }
}

/// Alte und neue Adresse eines laufenden Wechsels
fn wechsel_adressen(konto: &KontoRecord) -> KontoResult<(String, String)> {
    match (konto.status, konto.email.split_once(EMAIL_TRENNER)) {
        (KontoStatus::EmailWechselAusstehend, Some((alt, neu))) => {
            Ok((alt.to_string(), neu.to_string()))
        }
        _ => Err(KontoError::ungueltiger_zustand(format!(
            "Kein ausstehender E-Mail-Wechsel fuer Konto {}",
            konto.pseudo
        ))),
    }
}
