//! Repository-Trait-Definitionen
//!
//! Das Repository-Pattern entkoppelt die Kontologik von der konkreten
//! Datenbank-Implementierung. Jede Operation ist ein in sich abgeschlossener
//! Lese- oder Schreibzugriff, adressiert ueber den Primaerschluessel.

use chrono::{DateTime, Utc};

use crate::error::DbError;
use crate::models::{
    ArtikelRecord, BeitragRecord, KontoRecord, KontoStatus, NeuesKonto, NeuesUrteil,
    Praeferenzen, Seite, ThemaRecord, UrteilRecord, ZeitFilter,
};

/// Result-Alias fuer Datenbankoperationen
pub type DbResult<T> = Result<T, DbError>;

/// Konfiguration fuer die Datenbankverbindung
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Verbindungs-URL (z.B. "sqlite://stammtisch.db")
    pub url: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen im Pool
    pub max_verbindungen: u32,
    /// Ob WAL-Modus bei SQLite aktiviert werden soll
    pub sqlite_wal: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://stammtisch.db".into(),
            max_verbindungen: 5,
            sqlite_wal: true,
        }
    }
}

/// Neuer Bestaetigungszustand eines Kontos
#[derive(Debug, Clone)]
pub struct BestaetigungsUpdate<'a> {
    pub email: &'a str,
    pub status: KontoStatus,
    pub token: &'a str,
    /// Optional gleichzeitig `letzte_verbindung` setzen
    pub letzte_verbindung: Option<DateTime<Utc>>,
}

/// Repository fuer Konto-Datenzugriffe
#[allow(async_fn_in_trait)]
pub trait KontoRepository: Send + Sync {
    /// Legt ein neues Konto mit Standardwerten an
    ///
    /// Schlaegt mit `Eindeutigkeit` fehl, wenn Pseudonym oder E-Mail bereits
    /// vergeben sind (auch als Haelfte von `alt|neu`) oder das Pseudonym einem
    /// Funktions-Pseudonym entspricht.
    async fn create(&self, data: NeuesKonto<'_>) -> DbResult<KontoRecord>;

    /// Laedt ein Konto anhand seines Pseudonyms
    async fn get_by_pseudo(&self, pseudo: &str) -> DbResult<Option<KontoRecord>>;

    async fn update_password_hash(&self, pseudo: &str, password_hash: &str) -> DbResult<()>;

    /// Schreibt E-Mail, Status und Token
    ///
    /// `Eindeutigkeit`, wenn eine der Adressen (bei `alt|neu` beide) schon bei
    /// einem anderen Konto steht, ganz oder als Haelfte.
    async fn update_bestaetigung(
        &self,
        pseudo: &str,
        data: BestaetigungsUpdate<'_>,
    ) -> DbResult<()>;

    async fn update_erweiterte_funktionen(&self, pseudo: &str, aktiv: bool) -> DbResult<()>;

    async fn update_letzte_verbindung(&self, pseudo: &str, jetzt: DateTime<Utc>) -> DbResult<()>;

    /// Erfasst einen Passwort-Reset-Versuch atomar
    ///
    /// Liegt der letzte Versuch weniger als `fenster_sekunden` zurueck, wird
    /// der Zaehler erhoeht, sonst auf 1 gesetzt. Gibt den neuen Zaehlerstand zurueck.
    async fn record_reset_attempt(
        &self,
        pseudo: &str,
        jetzt: DateTime<Utc>,
        fenster_sekunden: i64,
    ) -> DbResult<i64>;

    /// Ueberschreibt alle acht Praeferenzfelder in einer Anweisung
    async fn update_praeferenzen(&self, pseudo: &str, werte: &Praeferenzen) -> DbResult<()>;

    async fn create_praesentation(&self, pseudo: &str, text: &str) -> DbResult<()>;

    async fn get_praesentation(&self, pseudo: &str) -> DbResult<Option<String>>;

    /// Sucht das einladende Mitglied fuer eine Gast-Adresse
    async fn get_sponsor(&self, email: &str) -> DbResult<Option<String>>;

    /// Loescht unbestaetigte Neukonten, die vor `grenze` registriert wurden
    async fn delete_unbestaetigte(&self, grenze: DateTime<Utc>) -> DbResult<u64>;
}

/// Repository fuer das Urteilsregister und den Bann-Ablauf
#[allow(async_fn_in_trait)]
pub trait UrteilRepository: Send + Sync {
    /// Verlaengert den Bann und legt den Registereintrag in einer Transaktion an
    ///
    /// `bann_ablauf = MAX(bann_ablauf, jetzt) + dauer`; der Eintrag erhaelt
    /// exakt diesen Ablaufzeitpunkt. `UngueltigeDaten`, wenn er sich nicht mehr
    /// als Zeitpunkt lesen liesse; dann wird nichts geschrieben.
    async fn verhaengen(&self, data: NeuesUrteil<'_>) -> DbResult<UrteilRecord>;

    /// Setzt den Bann-Ablauf auf `jetzt`
    async fn bann_aufheben(&self, pseudo: &str, jetzt: DateTime<Utc>) -> DbResult<()>;

    /// Markiert alle noch laufenden Urteile als gelockert
    async fn lockern(&self, pseudo: &str, jetzt: DateTime<Utc>) -> DbResult<u64>;

    /// `bann_aufheben` und `lockern` in einer Transaktion
    async fn begnadigen(&self, pseudo: &str, jetzt: DateTime<Utc>) -> DbResult<u64>;

    /// Urteile eines Kontos, aufsteigend nach Verhaengungszeitpunkt
    async fn list(
        &self,
        pseudo: &str,
        nur_aktive: bool,
        jetzt: DateTime<Utc>,
    ) -> DbResult<Vec<UrteilRecord>>;
}

/// Repository fuer Verzeichnis- und Listenabfragen
#[allow(async_fn_in_trait)]
pub trait VerzeichnisRepository: Send + Sync {
    /// Pseudonym als Konto- oder Funktions-Pseudonym vergeben?
    async fn pseudo_vergeben(&self, pseudo: &str) -> DbResult<bool>;

    async fn benutzer_existiert(&self, pseudo: &str) -> DbResult<bool>;

    async fn email_vergeben(&self, email: &str) -> DbResult<bool>;

    /// Bestaetigte Pseudonyme, die `nadel` ohne Beachtung der Gross-/Kleinschreibung enthalten
    async fn benutzer_suchen(&self, nadel: &str, limit: i64) -> DbResult<Vec<String>>;

    /// Pseudonyme (und Funktions-Pseudonyme) mit Aktivitaet nach `seit`
    async fn online_seit(
        &self,
        benutzer: &[String],
        admins: &[String],
        seit: DateTime<Utc>,
    ) -> DbResult<Vec<(String, Option<String>)>>;

    async fn benutzer_zaehlen(&self) -> DbResult<i64>;

    async fn benutzer_listen(&self, seite: Seite) -> DbResult<Vec<KontoRecord>>;

    async fn artikel_zaehlen(&self, pseudo: &str, filter: ZeitFilter) -> DbResult<i64>;

    async fn artikel_listen(&self, pseudo: &str, seite: Option<Seite>)
        -> DbResult<Vec<ArtikelRecord>>;

    async fn beitraege_zaehlen(&self, pseudo: &str, filter: ZeitFilter) -> DbResult<i64>;

    async fn beitraege_listen(
        &self,
        pseudo: &str,
        seite: Seite,
        absteigend: bool,
    ) -> DbResult<Vec<BeitragRecord>>;

    async fn favoriten_zaehlen(&self, pseudo: &str) -> DbResult<i64>;

    async fn favoriten_listen(&self, pseudo: &str, seite: Seite) -> DbResult<Vec<ThemaRecord>>;
}
