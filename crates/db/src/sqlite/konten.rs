//! SQLite-Implementierung des KontoRepository

use chrono::{DateTime, Utc};
use sqlx::Row;

use stammtisch_core::{aus_zeitstempel, zu_zeitstempel};

use crate::error::DbError;
use crate::models::{KontoRecord, KontoStatus, NeuesKonto, Praeferenzen, EMAIL_TRENNER};
use crate::repository::{BestaetigungsUpdate, DbResult, KontoRepository};
use crate::sqlite::pool::SqliteDb;

pub(crate) const KONTO_SPALTEN: &str = "pseudo, email, secret, password_hash, status, confirmation_token,
    function_pseudo, registered_at, last_connection, advanced_features, pwd_reset_attempts,
    pwd_reset_last_attempt, ban_expiration, using_preferences, pref_message_size,
    pref_posts_per_page, pref_video_default_display, pref_video_thumbnail_style,
    pref_default_nav_mode, pref_auto_preview, pref_auto_refresh";

/// Trifft eine Zeile, deren `email` die Adresse enthaelt, auch als Haelfte
/// eines ausstehenden Wechsels `alt|neu`
pub(crate) const ADRESSE_BELEGT: &str = "instr('|' || email || '|', '|' || ? || '|') > 0";

impl KontoRepository for SqliteDb {
    async fn create(&self, data: NeuesKonto<'_>) -> DbResult<KontoRecord> {
        let jetzt = zu_zeitstempel(&data.jetzt);
        let status = KontoStatus::AktivierungAusstehend;

        // Pseudonym darf auch keinem Funktions-Pseudonym entsprechen,
        // die Adresse keiner Haelfte eines ausstehenden Wechsels
        let sql = format!(
            "INSERT INTO accounts
               (pseudo, pseudo_lower, email, secret, password_hash, status,
                confirmation_token, registered_at, last_connection)
             SELECT ?, ?, ?, ?, ?, ?, ?, ?, ?
             WHERE NOT EXISTS (SELECT 1 FROM accounts WHERE function_pseudo = ?)
               AND NOT EXISTS (SELECT 1 FROM accounts WHERE {ADRESSE_BELEGT})"
        );
        let affected = sqlx::query(&sql)
            .bind(data.pseudo)
            .bind(data.pseudo.to_lowercase())
            .bind(data.email)
            .bind(data.secret)
            .bind(data.password_hash)
            .bind(status.als_str())
            .bind(data.bestaetigungs_token)
            .bind(jetzt)
            .bind(jetzt)
            .bind(data.pseudo)
            .bind(data.email)
            .execute(&self.pool)
        .await
        .map_err(|e| {
            DbError::beim_schreiben(e, || {
                format!("Pseudonym '{}' oder E-Mail bereits vergeben", data.pseudo)
            })
        })?
        .rows_affected();

        if affected == 0 {
            return Err(DbError::Eindeutigkeit(format!(
                "Pseudonym '{}' als Funktions-Pseudonym oder E-Mail '{}' bereits vergeben",
                data.pseudo, data.email
            )));
        }

        // Sekundenaufloesung wie in der Datenbank
        let registriert = zeitpunkt(jetzt, "registered_at")?;
        Ok(KontoRecord {
            pseudo: data.pseudo.to_string(),
            email: data.email.to_string(),
            secret: data.secret.to_string(),
            password_hash: data.password_hash.to_string(),
            status,
            bestaetigungs_token: data.bestaetigungs_token.to_string(),
            funktions_pseudo: None,
            registriert_am: registriert,
            letzte_verbindung: registriert,
            erweiterte_funktionen: false,
            reset_versuche: 0,
            reset_letzter_versuch: DateTime::<Utc>::UNIX_EPOCH,
            bann_ablauf: DateTime::<Utc>::UNIX_EPOCH,
            praeferenzen: Praeferenzen::default(),
        })
    }

    async fn get_by_pseudo(&self, pseudo: &str) -> DbResult<Option<KontoRecord>> {
        let sql = format!("SELECT {KONTO_SPALTEN} FROM accounts WHERE pseudo = ?");
        let row = sqlx::query(&sql)
            .bind(pseudo)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_konto(&r)).transpose()
    }

    async fn update_password_hash(&self, pseudo: &str, password_hash: &str) -> DbResult<()> {
        let affected = sqlx::query("UPDATE accounts SET password_hash = ? WHERE pseudo = ?")
            .bind(password_hash)
            .bind(pseudo)
            .execute(&self.pool)
            .await?
            .rows_affected();
        pruefe_betroffen(affected, pseudo)
    }

    async fn update_bestaetigung(
        &self,
        pseudo: &str,
        data: BestaetigungsUpdate<'_>,
    ) -> DbResult<()> {
        let letzte_verbindung = data.letzte_verbindung.as_ref().map(zu_zeitstempel);
        let (erste, zweite) = data
            .email
            .split_once(EMAIL_TRENNER)
            .unwrap_or((data.email, data.email));
        let belegt = || format!("E-Mail '{}' bereits vergeben", data.email);

        // Keine Adresse darf bei einem anderen Konto stehen, weder ganz noch
        // als Haelfte eines ausstehenden Wechsels
        let sql = format!(
            "UPDATE accounts
             SET email = ?, status = ?, confirmation_token = ?,
                 last_connection = COALESCE(?, last_connection)
             WHERE pseudo = ?
               AND NOT EXISTS (
                 SELECT 1 FROM accounts AS andere
                 WHERE andere.pseudo != ?
                   AND ({ADRESSE_BELEGT} OR {ADRESSE_BELEGT}))"
        );
        let affected = sqlx::query(&sql)
            .bind(data.email)
            .bind(data.status.als_str())
            .bind(data.token)
            .bind(letzte_verbindung)
            .bind(pseudo)
            .bind(pseudo)
            .bind(erste)
            .bind(zweite)
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::beim_schreiben(e, belegt))?
            .rows_affected();

        if affected == 0 && self.get_by_pseudo(pseudo).await?.is_some() {
            return Err(DbError::Eindeutigkeit(belegt()));
        }
        pruefe_betroffen(affected, pseudo)
    }

    async fn update_erweiterte_funktionen(&self, pseudo: &str, aktiv: bool) -> DbResult<()> {
        let affected = sqlx::query("UPDATE accounts SET advanced_features = ? WHERE pseudo = ?")
            .bind(aktiv as i64)
            .bind(pseudo)
            .execute(&self.pool)
            .await?
            .rows_affected();
        pruefe_betroffen(affected, pseudo)
    }

    async fn update_letzte_verbindung(&self, pseudo: &str, jetzt: DateTime<Utc>) -> DbResult<()> {
        let affected = sqlx::query("UPDATE accounts SET last_connection = ? WHERE pseudo = ?")
            .bind(zu_zeitstempel(&jetzt))
            .bind(pseudo)
            .execute(&self.pool)
            .await?
            .rows_affected();
        pruefe_betroffen(affected, pseudo)
    }

    async fn record_reset_attempt(
        &self,
        pseudo: &str,
        jetzt: DateTime<Utc>,
        fenster_sekunden: i64,
    ) -> DbResult<i64> {
        let jetzt = zu_zeitstempel(&jetzt);

        // Rechte Seiten sehen die alten Spaltenwerte
        let row = sqlx::query(
            "UPDATE accounts
             SET pwd_reset_attempts = CASE
                     WHEN ? - pwd_reset_last_attempt < ? THEN pwd_reset_attempts + 1
                     ELSE 1
                 END,
                 pwd_reset_last_attempt = ?
             WHERE pseudo = ?
             RETURNING pwd_reset_attempts",
        )
        .bind(jetzt)
        .bind(fenster_sekunden)
        .bind(jetzt)
        .bind(pseudo)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::nicht_gefunden(format!("Konto {pseudo}")))?;

        Ok(row.try_get("pwd_reset_attempts")?)
    }

    async fn update_praeferenzen(&self, pseudo: &str, werte: &Praeferenzen) -> DbResult<()> {
        let affected = sqlx::query(
            "UPDATE accounts
             SET using_preferences = ?,
                 pref_message_size = ?,
                 pref_posts_per_page = ?,
                 pref_video_default_display = ?,
                 pref_video_thumbnail_style = ?,
                 pref_default_nav_mode = ?,
                 pref_auto_preview = ?,
                 pref_auto_refresh = ?
             WHERE pseudo = ?",
        )
        .bind(werte.benutzt_praeferenzen as i64)
        .bind(werte.nachrichten_groesse.als_str())
        .bind(werte.beitraege_pro_seite)
        .bind(werte.video_anzeige.als_str())
        .bind(werte.vorschau_stil.als_str())
        .bind(werte.navigations_modus.als_str())
        .bind(werte.auto_vorschau as i64)
        .bind(werte.auto_aktualisierung as i64)
        .bind(pseudo)
        .execute(&self.pool)
        .await?
        .rows_affected();
        pruefe_betroffen(affected, pseudo)
    }

    async fn create_praesentation(&self, pseudo: &str, text: &str) -> DbResult<()> {
        sqlx::query("INSERT INTO users_presentations (pseudo, presentation) VALUES (?, ?)")
            .bind(pseudo)
            .bind(text)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DbError::beim_schreiben(e, || format!("Praesentation fuer '{pseudo}' existiert bereits"))
            })?;
        Ok(())
    }

    async fn get_praesentation(&self, pseudo: &str) -> DbResult<Option<String>> {
        let row = sqlx::query("SELECT presentation FROM users_presentations WHERE pseudo = ?")
            .bind(pseudo)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.try_get::<String, _>("presentation").map_err(DbError::from))
            .transpose()
    }

    async fn get_sponsor(&self, email: &str) -> DbResult<Option<String>> {
        let row = sqlx::query("SELECT sponsor FROM invitations WHERE guest_email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.try_get::<String, _>("sponsor").map_err(DbError::from))
            .transpose()
    }

    async fn delete_unbestaetigte(&self, grenze: DateTime<Utc>) -> DbResult<u64> {
        let affected = sqlx::query("DELETE FROM accounts WHERE status = ? AND registered_at < ?")
            .bind(KontoStatus::AktivierungAusstehend.als_str())
            .bind(zu_zeitstempel(&grenze))
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected)
    }
}

fn pruefe_betroffen(affected: u64, pseudo: &str) -> DbResult<()> {
    if affected == 0 {
        return Err(DbError::nicht_gefunden(format!("Konto {pseudo}")));
    }
    Ok(())
}

fn parse_spalte<T>(row: &sqlx::sqlite::SqliteRow, col: &str) -> DbResult<T>
where
    T: std::str::FromStr<Err = String>,
{
    let s: String = row.try_get(col)?;
    s.parse::<T>()
        .map_err(|e| DbError::UngueltigeDaten(format!("Spalte '{col}': {e}")))
}

/// Unix-Sekunden als Zeitpunkt; Werte ausserhalb des Bereichs sind ungueltige Daten
pub(crate) fn zeitpunkt(sekunden: i64, col: &str) -> DbResult<DateTime<Utc>> {
    aus_zeitstempel(sekunden).ok_or_else(|| {
        DbError::UngueltigeDaten(format!(
            "Spalte '{col}': Zeitstempel {sekunden} ausserhalb des darstellbaren Bereichs"
        ))
    })
}

pub(crate) fn zeit_spalte(row: &sqlx::sqlite::SqliteRow, col: &str) -> DbResult<DateTime<Utc>> {
    let sekunden: i64 = row.try_get(col)?;
    zeitpunkt(sekunden, col)
}

pub(crate) fn bool_spalte(row: &sqlx::sqlite::SqliteRow, col: &str) -> DbResult<bool> {
    let wert: i64 = row.try_get(col)?;
    Ok(wert != 0)
}

pub(crate) fn row_to_konto(row: &sqlx::sqlite::SqliteRow) -> DbResult<KontoRecord> {
    let praeferenzen = Praeferenzen {
        benutzt_praeferenzen: bool_spalte(row, "using_preferences")?,
        nachrichten_groesse: parse_spalte(row, "pref_message_size")?,
        beitraege_pro_seite: row.try_get("pref_posts_per_page")?,
        video_anzeige: parse_spalte(row, "pref_video_default_display")?,
        vorschau_stil: parse_spalte(row, "pref_video_thumbnail_style")?,
        navigations_modus: parse_spalte(row, "pref_default_nav_mode")?,
        auto_vorschau: bool_spalte(row, "pref_auto_preview")?,
        auto_aktualisierung: bool_spalte(row, "pref_auto_refresh")?,
    };

    Ok(KontoRecord {
        pseudo: row.try_get("pseudo")?,
        email: row.try_get("email")?,
        secret: row.try_get("secret")?,
        password_hash: row.try_get("password_hash")?,
        status: parse_spalte(row, "status")?,
        bestaetigungs_token: row.try_get("confirmation_token")?,
        funktions_pseudo: row.try_get("function_pseudo")?,
        registriert_am: zeit_spalte(row, "registered_at")?,
        letzte_verbindung: zeit_spalte(row, "last_connection")?,
        erweiterte_funktionen: bool_spalte(row, "advanced_features")?,
        reset_versuche: row.try_get("pwd_reset_attempts")?,
        reset_letzter_versuch: zeit_spalte(row, "pwd_reset_last_attempt")?,
        bann_ablauf: zeit_spalte(row, "ban_expiration")?,
        praeferenzen,
    })
}
