//! SQLite-Implementierung des VerzeichnisRepository

use chrono::{DateTime, Utc};
use sqlx::Row;

use stammtisch_core::zu_zeitstempel;

use crate::models::{
    ArtikelRecord, BeitragRecord, KontoRecord, KontoStatus, Seite, ThemaRecord, ZeitFilter,
};
use crate::repository::{DbResult, VerzeichnisRepository};
use crate::sqlite::konten::{row_to_konto, zeit_spalte, zeitpunkt, ADRESSE_BELEGT, KONTO_SPALTEN};
use crate::sqlite::pool::SqliteDb;

impl VerzeichnisRepository for SqliteDb {
    async fn pseudo_vergeben(&self, pseudo: &str) -> DbResult<bool> {
        let anzahl: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM accounts WHERE pseudo = ? OR function_pseudo = ?",
        )
        .bind(pseudo)
        .bind(pseudo)
        .fetch_one(&self.pool)
        .await?;
        Ok(anzahl > 0)
    }

    async fn benutzer_existiert(&self, pseudo: &str) -> DbResult<bool> {
        let anzahl: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE pseudo = ?")
            .bind(pseudo)
            .fetch_one(&self.pool)
            .await?;
        Ok(anzahl > 0)
    }

    async fn email_vergeben(&self, email: &str) -> DbResult<bool> {
        let sql = format!("SELECT COUNT(*) FROM accounts WHERE {ADRESSE_BELEGT}");
        let anzahl: i64 = sqlx::query_scalar(&sql)
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(anzahl > 0)
    }

    async fn benutzer_suchen(&self, nadel: &str, limit: i64) -> DbResult<Vec<String>> {
        // instr statt LIKE, damit % und _ in der Nadel keine Platzhalter sind;
        // pseudo_lower ist mit Rusts Unicode-Kleinschreibung gefuellt
        let treffer: Vec<String> = sqlx::query_scalar(
            "SELECT pseudo FROM accounts
             WHERE instr(pseudo_lower, ?) > 0 AND status != ?
             ORDER BY pseudo_lower, pseudo
             LIMIT ?",
        )
        .bind(nadel.to_lowercase())
        .bind(KontoStatus::AktivierungAusstehend.als_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(treffer)
    }

    async fn online_seit(
        &self,
        benutzer: &[String],
        admins: &[String],
        seit: DateTime<Utc>,
    ) -> DbResult<Vec<(String, Option<String>)>> {
        if benutzer.is_empty() && admins.is_empty() {
            return Ok(Vec::new());
        }

        let mut bedingungen: Vec<String> = Vec::new();
        if !benutzer.is_empty() {
            bedingungen.push(format!("pseudo IN ({})", platzhalter(benutzer.len())));
        }
        if !admins.is_empty() {
            bedingungen.push(format!("function_pseudo IN ({})", platzhalter(admins.len())));
        }

        let sql = format!(
            "SELECT pseudo, function_pseudo FROM accounts
             WHERE ({}) AND last_connection > ?
             ORDER BY pseudo",
            bedingungen.join(" OR ")
        );

        let mut q = sqlx::query(&sql);
        for p in benutzer.iter().chain(admins.iter()) {
            q = q.bind(p);
        }
        q = q.bind(zu_zeitstempel(&seit));

        let rows = q.fetch_all(&self.pool).await?;
        rows.iter()
            .map(|r| -> DbResult<(String, Option<String>)> {
                Ok((r.try_get("pseudo")?, r.try_get("function_pseudo")?))
            })
            .collect()
    }

    async fn benutzer_zaehlen(&self) -> DbResult<i64> {
        let anzahl: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE status != ?")
            .bind(KontoStatus::AktivierungAusstehend.als_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(anzahl)
    }

    async fn benutzer_listen(&self, seite: Seite) -> DbResult<Vec<KontoRecord>> {
        let sql = format!(
            "SELECT {KONTO_SPALTEN} FROM accounts
             WHERE status != ?
             ORDER BY pseudo DESC
             LIMIT ? OFFSET ?"
        );
        let rows = sqlx::query(&sql)
            .bind(KontoStatus::AktivierungAusstehend.als_str())
            .bind(seite.limit)
            .bind(seite.offset)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_konto).collect()
    }

    async fn artikel_zaehlen(&self, pseudo: &str, filter: ZeitFilter) -> DbResult<i64> {
        let basis = "SELECT COUNT(*) FROM articles WHERE pseudo = ? AND date_publication IS NOT NULL";
        let (sql, grenze) = mit_zeitfilter(basis, "date_publication", filter);

        let mut q = sqlx::query_scalar::<_, i64>(&sql).bind(pseudo);
        if let Some(g) = grenze {
            q = q.bind(g);
        }
        let anzahl: i64 = q.fetch_one(&self.pool).await?;
        Ok(anzahl)
    }

    async fn artikel_listen(
        &self,
        pseudo: &str,
        seite: Option<Seite>,
    ) -> DbResult<Vec<ArtikelRecord>> {
        let mut sql = String::from(
            "SELECT id, pseudo, title, date_publication FROM articles
             WHERE pseudo = ? AND date_publication IS NOT NULL
             ORDER BY date_publication DESC, id DESC",
        );
        if seite.is_some() {
            sql.push_str(" LIMIT ? OFFSET ?");
        }

        let mut q = sqlx::query(&sql).bind(pseudo);
        if let Some(s) = seite {
            q = q.bind(s.limit).bind(s.offset);
        }
        let rows = q.fetch_all(&self.pool).await?;

        rows.iter()
            .map(|r| -> DbResult<ArtikelRecord> {
                let datum: Option<i64> = r.try_get("date_publication")?;
                Ok(ArtikelRecord {
                    id: r.try_get("id")?,
                    pseudo: r.try_get("pseudo")?,
                    titel: r.try_get("title")?,
                    veroeffentlicht_am: datum
                        .map(|d| zeitpunkt(d, "date_publication"))
                        .transpose()?,
                })
            })
            .collect()
    }

    async fn beitraege_zaehlen(&self, pseudo: &str, filter: ZeitFilter) -> DbResult<i64> {
        let basis = "SELECT COUNT(*) FROM posts WHERE author = ?";
        let (sql, grenze) = mit_zeitfilter(basis, "date", filter);

        let mut q = sqlx::query_scalar::<_, i64>(&sql).bind(pseudo);
        if let Some(g) = grenze {
            q = q.bind(g);
        }
        let anzahl: i64 = q.fetch_one(&self.pool).await?;
        Ok(anzahl)
    }

    async fn beitraege_listen(
        &self,
        pseudo: &str,
        seite: Seite,
        absteigend: bool,
    ) -> DbResult<Vec<BeitragRecord>> {
        let reihenfolge = if absteigend { "date DESC, id DESC" } else { "date, id" };
        let sql = format!(
            "SELECT id, id_topic, author, date, content FROM posts
             WHERE author = ?
             ORDER BY {reihenfolge}
             LIMIT ? OFFSET ?"
        );

        let rows = sqlx::query(&sql)
            .bind(pseudo)
            .bind(seite.limit)
            .bind(seite.offset)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|r| -> DbResult<BeitragRecord> {
                Ok(BeitragRecord {
                    id: r.try_get("id")?,
                    thema_id: r.try_get("id_topic")?,
                    autor: r.try_get("author")?,
                    datum: zeit_spalte(r, "date")?,
                    inhalt: r.try_get("content")?,
                })
            })
            .collect()
    }

    async fn favoriten_zaehlen(&self, pseudo: &str) -> DbResult<i64> {
        let anzahl: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM map_topics_users WHERE favorite = 1 AND pseudo = ?",
        )
        .bind(pseudo)
        .fetch_one(&self.pool)
        .await?;
        Ok(anzahl)
    }

    async fn favoriten_listen(&self, pseudo: &str, seite: Seite) -> DbResult<Vec<ThemaRecord>> {
        let rows = sqlx::query(
            "SELECT t.id_topic, t.title, t.last_post,
                    (SELECT COUNT(*) FROM posts p WHERE p.id_topic = t.id_topic) AS nb
             FROM topics t
             JOIN map_topics_users m ON m.id_topic = t.id_topic
             WHERE m.favorite = 1 AND m.pseudo = ?
             ORDER BY t.last_post DESC
             LIMIT ? OFFSET ?",
        )
        .bind(pseudo)
        .bind(seite.limit)
        .bind(seite.offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| -> DbResult<ThemaRecord> {
                Ok(ThemaRecord {
                    id: r.try_get("id_topic")?,
                    titel: r.try_get("title")?,
                    letzter_beitrag: zeit_spalte(r, "last_post")?,
                    anzahl_beitraege: r.try_get("nb")?,
                })
            })
            .collect()
    }
}

fn platzhalter(anzahl: usize) -> String {
    vec!["?"; anzahl].join(", ")
}

/// Haengt die Zeitbedingung an und liefert den zu bindenden Grenzwert
fn mit_zeitfilter(basis: &str, spalte: &str, filter: ZeitFilter) -> (String, Option<i64>) {
    match filter {
        ZeitFilter::Alle => (basis.to_string(), None),
        ZeitFilter::Vor(t) => (format!("{basis} AND {spalte} < ?"), Some(zu_zeitstempel(&t))),
        ZeitFilter::Nach(t) => (format!("{basis} AND {spalte} > ?"), Some(zu_zeitstempel(&t))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stammtisch_core::aus_zeitstempel;

    #[test]
    fn platzhalter_liste() {
        assert_eq!(platzhalter(1), "?");
        assert_eq!(platzhalter(3), "?, ?, ?");
    }

    #[test]
    fn zeitfilter_sql() {
        let (sql, g) = mit_zeitfilter("SELECT 1 WHERE a = ?", "date", ZeitFilter::Alle);
        assert_eq!(sql, "SELECT 1 WHERE a = ?");
        assert!(g.is_none());

        let (sql, g) =
            mit_zeitfilter("SELECT 1 WHERE a = ?", "date", ZeitFilter::Nach(aus_zeitstempel(5).unwrap()));
        assert!(sql.ends_with("AND date > ?"));
        assert_eq!(g, Some(5));
    }
}
