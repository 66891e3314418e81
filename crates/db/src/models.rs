//! Datenbankmodelle fuer Stammtisch
//!
//! Diese Typen repraesentieren Datensaetze aus der Datenbank.
//! Zeilen werden an der Persistenzgrenze in diese Structs ueberfuehrt und
//! niemals als lose Maps weitergereicht.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Trennzeichen zwischen alter und neuer Adresse waehrend eines E-Mail-Wechsels
pub const EMAIL_TRENNER: char = '|';

/// Token-Wert eines bestaetigten Kontos
pub const TOKEN_ERLEDIGT: &str = "DONE";

// ---------------------------------------------------------------------------
// Konten
// ---------------------------------------------------------------------------

/// Lebenszyklus-Zustand eines Kontos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KontoStatus {
    /// Neues Konto, Aktivierung per E-Mail steht aus
    AktivierungAusstehend,
    /// E-Mail-Wechsel angefordert, Bestaetigung der neuen Adresse steht aus
    EmailWechselAusstehend,
    /// Stabiler, bestaetigter Zustand
    Bestaetigt,
}

impl KontoStatus {
    pub fn als_str(&self) -> &'static str {
        match self {
            Self::AktivierungAusstehend => "aktivierung_ausstehend",
            Self::EmailWechselAusstehend => "email_wechsel_ausstehend",
            Self::Bestaetigt => "bestaetigt",
        }
    }
}

impl std::str::FromStr for KontoStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aktivierung_ausstehend" => Ok(Self::AktivierungAusstehend),
            "email_wechsel_ausstehend" => Ok(Self::EmailWechselAusstehend),
            "bestaetigt" => Ok(Self::Bestaetigt),
            other => Err(format!("Unbekannter Konto-Status: {other}")),
        }
    }
}

/// Konto-Datensatz aus der Datenbank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KontoRecord {
    pub pseudo: String,
    /// Einzelne Adresse oder `alt|neu` waehrend eines E-Mail-Wechsels
    pub email: String,
    /// Konto-Salt, bei der Erstellung erzeugt und danach unveraenderlich
    pub secret: String,
    pub password_hash: String,
    pub status: KontoStatus,
    pub bestaetigungs_token: String,
    pub funktions_pseudo: Option<String>,
    pub registriert_am: DateTime<Utc>,
    pub letzte_verbindung: DateTime<Utc>,
    pub erweiterte_funktionen: bool,
    pub reset_versuche: i64,
    pub reset_letzter_versuch: DateTime<Utc>,
    pub bann_ablauf: DateTime<Utc>,
    pub praeferenzen: Praeferenzen,
}

impl KontoRecord {
    /// Aktuell gueltige Adresse (bei laufendem Wechsel die alte)
    pub fn aktuelle_email(&self) -> &str {
        self.email
            .split_once(EMAIL_TRENNER)
            .map_or(self.email.as_str(), |(alt, _)| alt)
    }

    /// Angeforderte neue Adresse, falls ein Wechsel aussteht
    pub fn ausstehende_email(&self) -> Option<&str> {
        self.email.split_once(EMAIL_TRENNER).map(|(_, neu)| neu)
    }
}

/// Daten zum Erstellen eines neuen Kontos
#[derive(Debug, Clone)]
pub struct NeuesKonto<'a> {
    pub pseudo: &'a str,
    pub email: &'a str,
    pub secret: &'a str,
    pub password_hash: &'a str,
    pub bestaetigungs_token: &'a str,
    pub jetzt: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Praeferenzen
// ---------------------------------------------------------------------------

/// Nachrichtengroesse in Themenansichten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NachrichtenGroesse {
    Standard,
    Mittel,
}

impl NachrichtenGroesse {
    pub fn als_str(&self) -> &'static str {
        match self {
            Self::Standard => "default",
            Self::Mittel => "medium",
        }
    }
}

impl std::str::FromStr for NachrichtenGroesse {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Self::Standard),
            "medium" => Ok(Self::Mittel),
            other => Err(format!("Unbekannte Nachrichtengroesse: {other}")),
        }
    }
}

/// Standard-Darstellung eingebetteter Videos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoAnzeige {
    Eingebettet,
    Vorschaubild,
}

impl VideoAnzeige {
    pub fn als_str(&self) -> &'static str {
        match self {
            Self::Eingebettet => "embedded",
            Self::Vorschaubild => "thumbnail",
        }
    }
}

impl std::str::FromStr for VideoAnzeige {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "embedded" => Ok(Self::Eingebettet),
            "thumbnail" => Ok(Self::Vorschaubild),
            other => Err(format!("Unbekannte Video-Anzeige: {other}")),
        }
    }
}

/// Stil der Video-Vorschaubilder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VorschauStil {
    Hq,
    Klein,
}

impl VorschauStil {
    pub fn als_str(&self) -> &'static str {
        match self {
            Self::Hq => "hq",
            Self::Klein => "small",
        }
    }
}

impl std::str::FromStr for VorschauStil {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hq" => Ok(Self::Hq),
            "small" => Ok(Self::Klein),
            other => Err(format!("Unbekannter Vorschau-Stil: {other}")),
        }
    }
}

/// Standard-Navigationsmodus in Themen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationsModus {
    Klassisch,
    Dynamisch,
    Fluss,
}

impl NavigationsModus {
    pub fn als_str(&self) -> &'static str {
        match self {
            Self::Klassisch => "classic",
            Self::Dynamisch => "dynamic",
            Self::Fluss => "flow",
        }
    }
}

impl std::str::FromStr for NavigationsModus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "classic" => Ok(Self::Klassisch),
            "dynamic" => Ok(Self::Dynamisch),
            "flow" => Ok(Self::Fluss),
            other => Err(format!("Unbekannter Navigationsmodus: {other}")),
        }
    }
}

/// Anzeige- und Verhaltenseinstellungen eines Kontos (acht Felder)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Praeferenzen {
    pub benutzt_praeferenzen: bool,
    pub nachrichten_groesse: NachrichtenGroesse,
    pub beitraege_pro_seite: i64,
    pub video_anzeige: VideoAnzeige,
    pub vorschau_stil: VorschauStil,
    pub navigations_modus: NavigationsModus,
    pub auto_vorschau: bool,
    pub auto_aktualisierung: bool,
}

impl Default for Praeferenzen {
    fn default() -> Self {
        Self {
            benutzt_praeferenzen: false,
            nachrichten_groesse: NachrichtenGroesse::Standard,
            beitraege_pro_seite: 20,
            video_anzeige: VideoAnzeige::Vorschaubild,
            vorschau_stil: VorschauStil::Hq,
            navigations_modus: NavigationsModus::Klassisch,
            auto_vorschau: false,
            auto_aktualisierung: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Urteile (Bann-Register)
// ---------------------------------------------------------------------------

/// Eintrag im Urteilsregister
///
/// Nur `gelockert` ist nach dem Anlegen noch veraenderlich.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrteilRecord {
    pub id: Uuid,
    pub pseudo: String,
    pub richter: String,
    pub verhaengt_am: DateTime<Utc>,
    pub dauer_sekunden: i64,
    pub laeuft_ab_am: DateTime<Utc>,
    pub gelockert: bool,
    pub details: String,
}

/// Daten zum Verhaengen eines Urteils (Bann + Registereintrag)
#[derive(Debug, Clone)]
pub struct NeuesUrteil<'a> {
    pub pseudo: &'a str,
    pub richter: &'a str,
    pub dauer_sekunden: i64,
    pub details: &'a str,
    pub jetzt: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Verzeichnis und Inhalte
// ---------------------------------------------------------------------------

/// Ausschnitt einer Liste (Offset/Limit)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seite {
    pub offset: i64,
    pub limit: i64,
}

impl Seite {
    pub fn neu(offset: i64, limit: i64) -> Self {
        Self { offset, limit }
    }
}

/// Zeitfilter fuer Zaehlabfragen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeitFilter {
    #[default]
    Alle,
    /// Strikt vor dem Zeitpunkt
    Vor(DateTime<Utc>),
    /// Strikt nach dem Zeitpunkt
    Nach(DateTime<Utc>),
}

/// Veroeffentlichter Artikel eines Kontos
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtikelRecord {
    pub id: i64,
    pub pseudo: String,
    pub titel: String,
    pub veroeffentlicht_am: Option<DateTime<Utc>>,
}

/// Forenbeitrag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeitragRecord {
    pub id: i64,
    pub thema_id: i64,
    pub autor: String,
    pub datum: DateTime<Utc>,
    pub inhalt: String,
}

/// Thema mit Anzahl seiner Beitraege
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemaRecord {
    pub id: i64,
    pub titel: String,
    pub letzter_beitrag: DateTime<Utc>,
    pub anzahl_beitraege: i64,
}
