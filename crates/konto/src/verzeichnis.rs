//! Verzeichnisabfragen: Eindeutigkeit, Suche, Praesenz und Listen

use std::sync::Arc;

use chrono::Duration;

use stammtisch_core::Uhr;
use stammtisch_db::{
    models::{ArtikelRecord, BeitragRecord, KontoRecord, Seite, ThemaRecord, ZeitFilter},
    VerzeichnisRepository,
};

use crate::{
    error::{KontoError, KontoResult},
    konfig::KontoKonfig,
};

pub struct VerzeichnisService<R: VerzeichnisRepository> {
    repo: Arc<R>,
    uhr: Arc<dyn Uhr>,
    konfig: KontoKonfig,
}

impl<R: VerzeichnisRepository> VerzeichnisService<R> {
    pub fn neu(repo: Arc<R>, uhr: Arc<dyn Uhr>, konfig: KontoKonfig) -> Self {
        Self { repo, uhr, konfig }
    }

    /// Pseudonym als Konto- oder Funktions-Pseudonym vergeben?
    pub async fn pseudo_vergeben(&self, pseudo: &str) -> KontoResult<bool> {
        Ok(self.repo.pseudo_vergeben(pseudo).await?)
    }

    pub async fn benutzer_existiert(&self, pseudo: &str) -> KontoResult<bool> {
        Ok(self.repo.benutzer_existiert(pseudo).await?)
    }

    /// Exakter Adressvergleich, auch gegen beide Haelften eines laufenden Wechsels
    pub async fn email_vergeben(&self, email: &str) -> KontoResult<bool> {
        Ok(self.repo.email_vergeben(email).await?)
    }

    /// Bis zu `such_limit` bestaetigte Pseudonyme, die `nadel` enthalten
    pub async fn benutzer_suchen(&self, nadel: &str) -> KontoResult<Vec<String>> {
        Ok(self
            .repo
            .benutzer_suchen(nadel, self.konfig.such_limit)
            .await?)
    }

    /// Wer von `benutzer` und `admins` war im Praesenzfenster aktiv?
    ///
    /// Liefert die Pseudonyme; wurde nach Admins gefragt, folgt auf ein
    /// Pseudonym auch sein Funktions-Pseudonym.
    pub async fn online_status_pruefen(
        &self,
        benutzer: &[String],
        admins: &[String],
    ) -> KontoResult<Vec<String>> {
        if benutzer.is_empty() && admins.is_empty() {
            return Ok(Vec::new());
        }

        let seit = self.uhr.jetzt() - Duration::seconds(self.konfig.online_fenster_sekunden);
        let treffer = self.repo.online_seit(benutzer, admins, seit).await?;

        let mut online = Vec::with_capacity(treffer.len());
        for (pseudo, funktions_pseudo) in treffer {
            online.push(pseudo);
            if let Some(f) = funktions_pseudo.filter(|_| !admins.is_empty()) {
                online.push(f);
            }
        }
        Ok(online)
    }

    /// Anzahl bestaetigter Konten (inkl. laufender E-Mail-Wechsel)
    pub async fn benutzer_zaehlen(&self) -> KontoResult<i64> {
        Ok(self.repo.benutzer_zaehlen().await?)
    }

    /// Seite bestaetigter Konten, Pseudonym absteigend
    pub async fn benutzer_listen(&self, offset: i64, limit: i64) -> KontoResult<Vec<KontoRecord>> {
        Ok(self.repo.benutzer_listen(Seite::neu(offset, limit)).await?)
    }

    pub async fn artikel_zaehlen(&self, pseudo: &str, filter: ZeitFilter) -> KontoResult<i64> {
        Ok(self.repo.artikel_zaehlen(pseudo, filter).await?)
    }

    /// Veroeffentlichte Artikel, neueste zuerst; ohne Seite alle
    pub async fn artikel_listen(
        &self,
        pseudo: &str,
        seite: Option<Seite>,
    ) -> KontoResult<Vec<ArtikelRecord>> {
        let artikel = self.repo.artikel_listen(pseudo, seite).await?;
        if artikel.is_empty() {
            return Err(KontoError::nicht_gefunden(format!("Keine Artikel von {pseudo}")));
        }
        Ok(artikel)
    }

    pub async fn beitraege_zaehlen(&self, pseudo: &str, filter: ZeitFilter) -> KontoResult<i64> {
        Ok(self.repo.beitraege_zaehlen(pseudo, filter).await?)
    }

    /// Beitraege eines Autors; `absteigend` zeigt die neuesten zuerst
    pub async fn beitraege_listen(
        &self,
        pseudo: &str,
        seite: Seite,
        absteigend: bool,
    ) -> KontoResult<Vec<BeitragRecord>> {
        let beitraege = self.repo.beitraege_listen(pseudo, seite, absteigend).await?;
        if beitraege.is_empty() {
            return Err(KontoError::nicht_gefunden(format!("Keine Beitraege von {pseudo}")));
        }
        Ok(beitraege)
    }

    pub async fn favoriten_zaehlen(&self, pseudo: &str) -> KontoResult<i64> {
        Ok(self.repo.favoriten_zaehlen(pseudo).await?)
    }

    pub async fn favoriten_listen(&self, pseudo: &str, seite: Seite) -> KontoResult<Vec<ThemaRecord>> {
        Ok(self.repo.favoriten_listen(pseudo, seite).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stammtisch_core::ManuelleUhr;
    use stammtisch_db::SqliteDb;

    use crate::service::tests::{test_konfig, test_service};
    use crate::KontoService;

    struct Umgebung {
        konten: KontoService<SqliteDb>,
        verzeichnis: VerzeichnisService<SqliteDb>,
        db: Arc<SqliteDb>,
        uhr: Arc<ManuelleUhr>,
    }

    async fn umgebung() -> Umgebung {
        let (konten, db, uhr) = test_service().await;
        let verzeichnis = VerzeichnisService::neu(db.clone(), uhr.clone(), test_konfig());
        Umgebung {
            konten,
            verzeichnis,
            db,
            uhr,
        }
    }

    async fn bestaetigtes_konto(u: &Umgebung, pseudo: &str) -> KontoRecord {
        let email = format!("{}@x.com", pseudo.to_lowercase());
        let mut konto = u.konten.erstellen(pseudo, &email, "pw").await.unwrap();
        u.konten.bestaetigen(&mut konto).await.unwrap();
        konto
    }

    #[tokio::test]
    async fn eindeutigkeit_pruefen() {
        let u = umgebung().await;
        bestaetigtes_konto(&u, "alice").await;

        assert!(u.verzeichnis.pseudo_vergeben("alice").await.unwrap());
        assert!(!u.verzeichnis.pseudo_vergeben("bob").await.unwrap());
        assert!(u.verzeichnis.benutzer_existiert("alice").await.unwrap());
        assert!(u.verzeichnis.email_vergeben("alice@x.com").await.unwrap());
        assert!(!u.verzeichnis.email_vergeben("bob@x.com").await.unwrap());
    }

    #[tokio::test]
    async fn suche_begrenzt_und_sortiert() {
        let u = umgebung().await;
        for p in ["Zora", "zoe", "Zoltan", "azo", "Bozo", "Ozzy", "ZORRO"] {
            bestaetigtes_konto(&u, p).await;
        }
        u.konten.erstellen("zombie", "zombie@x.com", "pw").await.unwrap();

        let treffer = u.verzeichnis.benutzer_suchen("zo").await.unwrap();
        assert_eq!(treffer, vec!["azo", "Bozo", "zoe", "Zoltan", "Zora"]);
    }

    #[tokio::test]
    async fn suche_mit_akzenten() {
        let u = umgebung().await;
        bestaetigtes_konto(&u, "Élodie").await;
        bestaetigtes_konto(&u, "Hélène").await;

        assert_eq!(u.verzeichnis.benutzer_suchen("élo").await.unwrap(), vec!["Élodie"]);
        assert_eq!(u.verzeichnis.benutzer_suchen("ÉLO").await.unwrap(), vec!["Élodie"]);
        assert_eq!(u.verzeichnis.benutzer_suchen("HÉLÈ").await.unwrap(), vec!["Hélène"]);
    }

    #[tokio::test]
    async fn email_waehrend_wechsel_vergeben() {
        let u = umgebung().await;
        let mut alice = bestaetigtes_konto(&u, "alice").await;
        u.konten.email_aendern(&mut alice, "neu@x.com").await.unwrap();

        assert!(u.verzeichnis.email_vergeben("alice@x.com").await.unwrap());
        assert!(u.verzeichnis.email_vergeben("neu@x.com").await.unwrap());
    }

    #[tokio::test]
    async fn online_status() {
        let u = umgebung().await;
        bestaetigtes_konto(&u, "alice").await;
        bestaetigtes_konto(&u, "bob").await;
        sqlx::query("UPDATE accounts SET function_pseudo = 'Wirt' WHERE pseudo = 'bob'")
            .execute(u.db.pool())
            .await
            .unwrap();

        let alle = vec!["alice".to_string(), "bob".to_string()];
        assert!(u.verzeichnis.online_status_pruefen(&[], &[]).await.unwrap().is_empty());

        let online = u.verzeichnis.online_status_pruefen(&alle, &[]).await.unwrap();
        assert_eq!(online, vec!["alice", "bob"]);

        let online = u
            .verzeichnis
            .online_status_pruefen(&[], &["Wirt".to_string()])
            .await
            .unwrap();
        assert_eq!(online, vec!["bob", "Wirt"]);

        // Nach 180 s ohne Aktivitaet offline
        u.uhr.vorstellen(180);
        let mut alice = u.konten.laden("alice").await.unwrap();
        u.konten.verbindung_aktualisieren(&mut alice).await.unwrap();
        let online = u.verzeichnis.online_status_pruefen(&alle, &[]).await.unwrap();
        assert_eq!(online, vec!["alice"]);
    }

    #[tokio::test]
    async fn leere_listen() {
        let u = umgebung().await;
        bestaetigtes_konto(&u, "alice").await;

        let err = u.verzeichnis.artikel_listen("alice", None).await.unwrap_err();
        assert!(matches!(err, KontoError::NichtGefunden(_)));
        let err = u
            .verzeichnis
            .beitraege_listen("alice", Seite::neu(0, 10), true)
            .await
            .unwrap_err();
        assert!(matches!(err, KontoError::NichtGefunden(_)));

        assert!(u
            .verzeichnis
            .favoriten_listen("alice", Seite::neu(0, 10))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(u.verzeichnis.favoriten_zaehlen("alice").await.unwrap(), 0);
        assert_eq!(
            u.verzeichnis
                .artikel_zaehlen("alice", ZeitFilter::Alle)
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn benutzer_listen_ohne_unbestaetigte() {
        let u = umgebung().await;
        bestaetigtes_konto(&u, "alice").await;
        let mut bob = bestaetigtes_konto(&u, "bob").await;
        u.konten.email_aendern(&mut bob, "bob@y.com").await.unwrap();
        u.konten.erstellen("carl", "carl@x.com", "pw").await.unwrap();

        assert_eq!(u.verzeichnis.benutzer_zaehlen().await.unwrap(), 2);
        let liste = u.verzeichnis.benutzer_listen(0, 10).await.unwrap();
        let namen: Vec<_> = liste.iter().map(|k| k.pseudo.as_str()).collect();
        assert_eq!(namen, vec!["bob", "alice"]);
    }

    #[tokio::test]
    async fn artikel_und_beitraege() {
        let u = umgebung().await;
        sqlx::query(
            "INSERT INTO articles (pseudo, title, date_publication) VALUES ('alice', 'Bock', 10)",
        )
        .execute(u.db.pool())
        .await
        .unwrap();
        sqlx::query("INSERT INTO topics (id_topic, title, last_post) VALUES (1, 'Bier', 20)")
            .execute(u.db.pool())
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO posts (id_topic, author, date, content) VALUES (1, 'alice', 20, 'Prost')",
        )
        .execute(u.db.pool())
        .await
        .unwrap();

        let artikel = u.verzeichnis.artikel_listen("alice", None).await.unwrap();
        assert_eq!(artikel[0].titel, "Bock");
        let beitraege = u
            .verzeichnis
            .beitraege_listen("alice", Seite::neu(0, 5), false)
            .await
            .unwrap();
        assert_eq!(beitraege[0].inhalt, "Prost");
        assert_eq!(
            u.verzeichnis
                .beitraege_zaehlen("alice", ZeitFilter::Alle)
                .await
                .unwrap(),
            1
        );
    }
}
