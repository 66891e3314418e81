//! Passwort-Hashing mit Argon2id
//!
//! Der Digest kombiniert Pseudonym, Konto-Secret und Klartext. Als Salt dient
//! das Secret selbst, der Hash ist fuer gleiche Eingaben also reproduzierbar
//! und unterscheidet sich zwischen Konten auch bei identischem Passwort.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params, Version,
};
use rand::{distributions::Alphanumeric, Rng};

use crate::error::{KontoError, KontoResult};
use crate::konfig::PasswortRichtlinie;

/// Laenge des Konto-Secrets
pub const SECRET_LAENGE: usize = 15;

/// Laenge des Tokens fuer die Aktivierung eines Neukontos
pub const AKTIVIERUNGS_TOKEN_LAENGE: usize = 15;

/// Laenge des Tokens fuer einen E-Mail-Wechsel
pub const EMAIL_TOKEN_LAENGE: usize = 10;

fn argon2_instanz(richtlinie: &PasswortRichtlinie) -> KontoResult<Argon2<'static>> {
    let params = Params::new(
        richtlinie.speicher_kib,
        richtlinie.iterationen,
        richtlinie.parallelitaet,
        None,
    )
    .map_err(|e| KontoError::PasswortHashing(format!("Argon2-Parameter ungueltig: {e}")))?;

    Ok(Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params))
}

/// Hasht `pseudo + secret + klartext` mit Argon2id
///
/// Gibt den PHC-String zurueck (inkl. Algorithmus, Parameter und Salt).
pub fn passwort_hashen(
    richtlinie: &PasswortRichtlinie,
    pseudo: &str,
    secret: &str,
    klartext: &str,
) -> KontoResult<String> {
    let salt = SaltString::encode_b64(secret.as_bytes())
        .map_err(|e| KontoError::PasswortHashing(format!("Secret als Salt unbrauchbar: {e}")))?;
    let eingabe = format!("{pseudo}{secret}{klartext}");

    argon2_instanz(richtlinie)?
        .hash_password(eingabe.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| KontoError::PasswortHashing(e.to_string()))
}

/// Verifiziert einen Klartext gegen den gespeicherten PHC-Hash eines Kontos
///
/// Die Parameter werden dem Hash entnommen, nicht der aktuellen Richtlinie.
pub fn passwort_verifizieren(
    pseudo: &str,
    secret: &str,
    klartext: &str,
    hash: &str,
) -> KontoResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| KontoError::PasswortHashing(format!("Ungueltiges Hash-Format: {e}")))?;
    let eingabe = format!("{pseudo}{secret}{klartext}");

    match Argon2::default().verify_password(eingabe.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(KontoError::PasswortHashing(e.to_string())),
    }
}

/// Erzeugt eine zufaellige alphanumerische Zeichenkette
pub fn zufallszeichen(laenge: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(laenge)
        .map(char::from)
        .collect()
}

/// Neues Konto-Secret (wird nie rotiert)
pub fn secret_erzeugen() -> String {
    zufallszeichen(SECRET_LAENGE)
}
