//! SQLite-Implementierung des UrteilRepository

use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use stammtisch_core::{max_zeitstempel, zu_zeitstempel};

use crate::error::DbError;
use crate::models::{NeuesUrteil, UrteilRecord};
use crate::repository::{DbResult, UrteilRepository};
use crate::sqlite::konten::{bool_spalte, zeit_spalte, zeitpunkt};
use crate::sqlite::pool::SqliteDb;

impl UrteilRepository for SqliteDb {
    async fn verhaengen(&self, data: NeuesUrteil<'_>) -> DbResult<UrteilRecord> {
        let id = Uuid::new_v4();
        let jetzt = zu_zeitstempel(&data.jetzt);

        // Bann-Verlaengerung und Registereintrag in einer Transaktion
        let mut tx = self.pool.begin().await?;

        // Der neue Ablauf muss als Zeitpunkt lesbar bleiben
        let row = sqlx::query(
            "UPDATE accounts
             SET ban_expiration = MAX(ban_expiration, ?) + ?
             WHERE pseudo = ? AND MAX(ban_expiration, ?) <= ? - ?
             RETURNING ban_expiration",
        )
        .bind(jetzt)
        .bind(data.dauer_sekunden)
        .bind(data.pseudo)
        .bind(jetzt)
        .bind(max_zeitstempel())
        .bind(data.dauer_sekunden)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            let vorhanden: Option<i64> =
                sqlx::query_scalar("SELECT ban_expiration FROM accounts WHERE pseudo = ?")
                    .bind(data.pseudo)
                    .fetch_optional(&mut *tx)
                    .await?;
            tx.rollback().await?;
            return Err(match vorhanden {
                Some(ablauf) => DbError::UngueltigeDaten(format!(
                    "Bann fuer {} ab {ablauf} um {} s verlaengert liegt ausserhalb des darstellbaren Bereichs",
                    data.pseudo, data.dauer_sekunden
                )),
                None => DbError::nicht_gefunden(format!("Konto {}", data.pseudo)),
            });
        };
        let ablauf: i64 = row.try_get("ban_expiration")?;

        sqlx::query(
            "INSERT INTO records_sentences
               (id, pseudo, judge, issued_at, duration, expiration, relaxed, details)
             VALUES (?, ?, ?, ?, ?, ?, 0, ?)",
        )
        .bind(id.to_string())
        .bind(data.pseudo)
        .bind(data.richter)
        .bind(jetzt)
        .bind(data.dauer_sekunden)
        .bind(ablauf)
        .bind(data.details)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(UrteilRecord {
            id,
            pseudo: data.pseudo.to_string(),
            richter: data.richter.to_string(),
            verhaengt_am: zeitpunkt(jetzt, "issued_at")?,
            dauer_sekunden: data.dauer_sekunden,
            laeuft_ab_am: zeitpunkt(ablauf, "expiration")?,
            gelockert: false,
            details: data.details.to_string(),
        })
    }

    async fn bann_aufheben(&self, pseudo: &str, jetzt: DateTime<Utc>) -> DbResult<()> {
        let affected = sqlx::query("UPDATE accounts SET ban_expiration = ? WHERE pseudo = ?")
            .bind(zu_zeitstempel(&jetzt))
            .bind(pseudo)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if affected == 0 {
            return Err(DbError::nicht_gefunden(format!("Konto {pseudo}")));
        }
        Ok(())
    }

    async fn lockern(&self, pseudo: &str, jetzt: DateTime<Utc>) -> DbResult<u64> {
        let affected = sqlx::query(
            "UPDATE records_sentences SET relaxed = 1 WHERE pseudo = ? AND expiration > ?",
        )
        .bind(pseudo)
        .bind(zu_zeitstempel(&jetzt))
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(affected)
    }

    async fn begnadigen(&self, pseudo: &str, jetzt: DateTime<Utc>) -> DbResult<u64> {
        let jetzt = zu_zeitstempel(&jetzt);
        let mut tx = self.pool.begin().await?;

        let affected = sqlx::query("UPDATE accounts SET ban_expiration = ? WHERE pseudo = ?")
            .bind(jetzt)
            .bind(pseudo)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if affected == 0 {
            tx.rollback().await?;
            return Err(DbError::nicht_gefunden(format!("Konto {pseudo}")));
        }

        let gelockert = sqlx::query(
            "UPDATE records_sentences SET relaxed = 1 WHERE pseudo = ? AND expiration > ?",
        )
        .bind(pseudo)
        .bind(jetzt)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;
        Ok(gelockert)
    }

    async fn list(
        &self,
        pseudo: &str,
        nur_aktive: bool,
        jetzt: DateTime<Utc>,
    ) -> DbResult<Vec<UrteilRecord>> {
        let rows = if nur_aktive {
            sqlx::query(
                "SELECT id, pseudo, judge, issued_at, duration, expiration, relaxed, details
                 FROM records_sentences
                 WHERE pseudo = ? AND expiration > ? AND relaxed = 0
                 ORDER BY issued_at, rowid",
            )
            .bind(pseudo)
            .bind(zu_zeitstempel(&jetzt))
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query(
                "SELECT id, pseudo, judge, issued_at, duration, expiration, relaxed, details
                 FROM records_sentences
                 WHERE pseudo = ?
                 ORDER BY issued_at, rowid",
            )
            .bind(pseudo)
            .fetch_all(&self.pool)
            .await?
        };

        rows.iter().map(row_to_urteil).collect()
    }
}

fn row_to_urteil(row: &sqlx::sqlite::SqliteRow) -> DbResult<UrteilRecord> {
    let id_str: String = row.try_get("id")?;
    let id = Uuid::parse_str(&id_str)
        .map_err(|e| DbError::intern(format!("Ungueltige Urteil-UUID '{id_str}': {e}")))?;

    Ok(UrteilRecord {
        id,
        pseudo: row.try_get("pseudo")?,
        richter: row.try_get("judge")?,
        verhaengt_am: zeit_spalte(row, "issued_at")?,
        dauer_sekunden: row.try_get("duration")?,
        laeuft_ab_am: zeit_spalte(row, "expiration")?,
        gelockert: bool_spalte(row, "relaxed")?,
        details: row.try_get("details")?,
    })
}
