//! Praeferenzprofil eines Kontos

use stammtisch_db::{
    models::{KontoRecord, Praeferenzen},
    KontoRepository,
};

use crate::{error::KontoResult, service::KontoService};

impl<R: KontoRepository + 'static> KontoService<R> {
    /// Ueberschreibt alle Praeferenzen in einem Schreibvorgang
    ///
    /// Wertebereiche (Seitengroesse usw.) prueft der Aufrufer.
    pub async fn praeferenzen_aktualisieren(
        &self,
        konto: &mut KontoRecord,
        werte: Praeferenzen,
    ) -> KontoResult<()> {
        self.repo.update_praeferenzen(&konto.pseudo, &werte).await?;
        konto.praeferenzen = werte;
        tracing::debug!(pseudo = %konto.pseudo, "Praeferenzen aktualisiert");
        Ok(())
    }
}
