//! Integration-Tests fuer UrteilRepository (In-Memory SQLite)

use chrono::{DateTime, Utc};
use stammtisch_db::{
    models::{NeuesKonto, NeuesUrteil},
    DbError, KontoRepository, SqliteDb, UrteilRepository,
};

async fn db() -> SqliteDb {
    SqliteDb::in_memory()
        .await
        .expect("In-Memory DB konnte nicht erstellt werden")
}

fn t(sekunden: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(sekunden, 0).unwrap()
}

async fn mit_konto(pseudo: &str) -> SqliteDb {
    let db = db().await;
    let email = format!("{pseudo}@x.org");
    KontoRepository::create(
        &db,
        NeuesKonto {
            pseudo,
            email: &email,
            secret: "abcdefghijklmno",
            password_hash: "hash",
            bestaetigungs_token: "DONE",
            jetzt: t(0),
        },
    )
    .await
    .unwrap();
    db
}

fn urteil<'a>(pseudo: &'a str, dauer: i64, jetzt: i64) -> NeuesUrteil<'a> {
    NeuesUrteil {
        pseudo,
        richter: "richter:mod",
        dauer_sekunden: dauer,
        details: "Spam",
        jetzt: t(jetzt),
    }
}

#[tokio::test]
async fn bann_verhaengen_ab_jetzt() {
    let db = mit_konto("troll").await;

    let u = UrteilRepository::verhaengen(&db, urteil("troll", 3_600, 10_000))
        .await
        .unwrap();
    assert_eq!(u.laeuft_ab_am, t(13_600));
    assert_eq!(u.verhaengt_am, t(10_000));
    assert!(!u.gelockert);

    let konto = KontoRepository::get_by_pseudo(&db, "troll")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(konto.bann_ablauf, t(13_600));
}

#[tokio::test]
async fn bann_stapelt_sich() {
    let db = mit_konto("troll").await;

    UrteilRepository::verhaengen(&db, urteil("troll", 100, 1_000))
        .await
        .unwrap();
    let zweites = UrteilRepository::verhaengen(&db, urteil("troll", 50, 1_010))
        .await
        .unwrap();
    assert_eq!(zweites.laeuft_ab_am, t(1_150));

    let konto = KontoRepository::get_by_pseudo(&db, "troll")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(konto.bann_ablauf, t(1_150));
}

#[tokio::test]
async fn abgelaufener_bann_zaehlt_ab_jetzt() {
    let db = mit_konto("troll").await;

    UrteilRepository::verhaengen(&db, urteil("troll", 10, 1_000))
        .await
        .unwrap();
    let u = UrteilRepository::verhaengen(&db, urteil("troll", 10, 5_000))
        .await
        .unwrap();
    assert_eq!(u.laeuft_ab_am, t(5_010));
}

#[tokio::test]
async fn verhaengen_ohne_konto() {
    let db = db().await;
    let err = UrteilRepository::verhaengen(&db, urteil("geist", 10, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NichtGefunden(_)));

    let urteile = UrteilRepository::list(&db, "geist", false, t(0)).await.unwrap();
    assert!(urteile.is_empty());
}

#[tokio::test]
async fn aktive_urteile_filtern() {
    let db = mit_konto("troll").await;

    UrteilRepository::verhaengen(&db, urteil("troll", 10, 1_000))
        .await
        .unwrap();
    UrteilRepository::verhaengen(&db, urteil("troll", 1_000, 2_000))
        .await
        .unwrap();

    let alle = UrteilRepository::list(&db, "troll", false, t(2_500)).await.unwrap();
    assert_eq!(alle.len(), 2);
    assert!(alle[0].verhaengt_am < alle[1].verhaengt_am);

    let aktive = UrteilRepository::list(&db, "troll", true, t(2_500)).await.unwrap();
    assert_eq!(aktive.len(), 1);
    assert_eq!(aktive[0].laeuft_ab_am, t(3_000));
}

#[tokio::test]
async fn lockern_betrifft_nur_laufende() {
    let db = mit_konto("troll").await;

    UrteilRepository::verhaengen(&db, urteil("troll", 10, 1_000))
        .await
        .unwrap();
    UrteilRepository::verhaengen(&db, urteil("troll", 1_000, 2_000))
        .await
        .unwrap();

    let n = UrteilRepository::lockern(&db, "troll", t(2_500)).await.unwrap();
    assert_eq!(n, 1);

    let alle = UrteilRepository::list(&db, "troll", false, t(2_500)).await.unwrap();
    assert!(!alle[0].gelockert);
    assert!(alle[1].gelockert);
    assert!(UrteilRepository::list(&db, "troll", true, t(2_500))
        .await
        .unwrap()
        .is_empty());

    // Lockern laesst den Bann selbst bestehen
    let konto = KontoRepository::get_by_pseudo(&db, "troll")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(konto.bann_ablauf, t(3_000));
}

#[tokio::test]
async fn begnadigen_hebt_bann_auf_und_lockert() {
    let db = mit_konto("troll").await;

    UrteilRepository::verhaengen(&db, urteil("troll", 1_000, 2_000))
        .await
        .unwrap();
    let n = UrteilRepository::begnadigen(&db, "troll", t(2_100)).await.unwrap();
    assert_eq!(n, 1);

    let konto = KontoRepository::get_by_pseudo(&db, "troll")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(konto.bann_ablauf, t(2_100));

    let urteile = UrteilRepository::list(&db, "troll", false, t(2_100)).await.unwrap();
    assert!(urteile[0].gelockert);
    // Historie bleibt erhalten
    assert_eq!(urteile[0].laeuft_ab_am, t(3_000));

    let err = UrteilRepository::begnadigen(&db, "geist", t(0)).await.unwrap_err();
    assert!(matches!(err, DbError::NichtGefunden(_)));
}

#[tokio::test]
async fn bann_aufheben_setzt_ablauf() {
    let db = mit_konto("troll").await;
    UrteilRepository::verhaengen(&db, urteil("troll", 1_000, 0))
        .await
        .unwrap();

    UrteilRepository::bann_aufheben(&db, "troll", t(500)).await.unwrap();
    let konto = KontoRepository::get_by_pseudo(&db, "troll")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(konto.bann_ablauf, t(500));

    // Urteil bleibt ungelockert
    let aktive = UrteilRepository::list(&db, "troll", true, t(500)).await.unwrap();
    assert_eq!(aktive.len(), 1);
}

#[tokio::test]
async fn bann_ausserhalb_des_zeitbereichs_schreibt_nichts() {
    let db = mit_konto("troll").await;

    let err = UrteilRepository::verhaengen(&db, urteil("troll", 10_000_000_000_000, 1_000))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::UngueltigeDaten(_)));

    let konto = KontoRepository::get_by_pseudo(&db, "troll")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(konto.bann_ablauf, t(0));
    let urteile = UrteilRepository::list(&db, "troll", false, t(1_000))
        .await
        .unwrap();
    assert!(urteile.is_empty());
}

#[tokio::test]
async fn bann_bis_zum_rand_lesbar() {
    let db = mit_konto("troll").await;
    let max = stammtisch_core::max_zeitstempel();

    let u = UrteilRepository::verhaengen(&db, urteil("troll", max - 1_000, 1_000))
        .await
        .unwrap();
    assert_eq!(u.laeuft_ab_am.timestamp(), max);

    let konto = KontoRepository::get_by_pseudo(&db, "troll")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(konto.bann_ablauf, u.laeuft_ab_am);
}

#[tokio::test]
async fn unlesbarer_zeitstempel_ist_ungueltig() {
    let db = mit_konto("troll").await;
    sqlx::query("UPDATE accounts SET ban_expiration = ? WHERE pseudo = 'troll'")
        .bind(10_000_000_000_000_i64)
        .execute(db.pool())
        .await
        .unwrap();

    let err = KontoRepository::get_by_pseudo(&db, "troll").await.unwrap_err();
    match err {
        DbError::UngueltigeDaten(msg) => assert!(msg.contains("ban_expiration")),
        andere => panic!("erwartet UngueltigeDaten, bekam {andere:?}"),
    }
}
