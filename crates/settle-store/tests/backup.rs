use settle_core::domain::UserId;
use settle_store::error::StoreError;
use settle_store::repo::{BookingNew, BookingQuery};
use settle_store::Store;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn backup_creates_readable_snapshot() {
    let temp = TempDir::new().expect("temp dir");
    let db_path = temp.path().join("settle.sqlite3");
    let backup_path = temp.path().join("snapshots").join("backup.sqlite3");

    let store = Store::open(&db_path).expect("open store");
    store.migrate().expect("migrate");
    let booking = store
        .bookings()
        .create(
            1_700_000_000,
            BookingNew {
                customer_id: UserId::new("c1").expect("user"),
                base_price_cents: 12_000,
                addons: Vec::new(),
                manual_quote: None,
            },
        )
        .expect("create booking");

    let summary = store.backup_to(&backup_path).expect("backup");
    assert!(backup_path.exists());
    assert_eq!(summary.bookings, 1);
    assert_eq!(summary.activities, 0);
    assert_eq!(summary.schema_version, store.schema_version().expect("version"));
    assert!(summary.size_bytes > 0);

    let backup = Store::open(&backup_path).expect("open backup");
    let bookings = backup
        .bookings()
        .list(&BookingQuery::default())
        .expect("list bookings");
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].id, booking.id);
    assert_eq!(bookings[0].pricing.total_cents, 12_000);
}

#[test]
fn backup_rejects_live_database_files() {
    let temp = TempDir::new().expect("temp dir");
    let db_path = temp.path().join("settle.sqlite3");
    let store = Store::open(&db_path).expect("open store");
    store.migrate().expect("migrate");

    let err = store.backup_to(&db_path).expect_err("backup should fail");
    assert!(matches!(err, StoreError::InvalidBackupPath(_)));

    let wal_path = PathBuf::from(format!("{}-wal", db_path.display()));
    let err = store.backup_to(&wal_path).expect_err("backup should fail");
    assert!(matches!(err, StoreError::InvalidBackupPath(_)));
}
