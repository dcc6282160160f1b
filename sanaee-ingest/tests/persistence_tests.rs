//! Persistence store integration tests
//!
//! Round trip, read-or-default recovery, and save failure reporting
//! against both byte store backends.

mod helpers;

use helpers::{KEY, MIB};
use sanaee_common::models::default_roster;
use sanaee_common::{NewWorker, Specialty, WorkerRecord};
use sanaee_ingest::db::{self, ByteStore, MemoryByteStore, SqliteByteStore};
use sanaee_ingest::services::WorkerStore;
use std::sync::Arc;
use tempfile::TempDir;

const QUOTA: u64 = (5 * MIB) as u64;

fn worker_store(backend: &MemoryByteStore) -> WorkerStore {
    WorkerStore::new(Arc::new(backend.clone()), KEY)
}

fn sample(name: &str) -> WorkerRecord {
    WorkerRecord::create(NewWorker {
        name: name.to_string(),
        specialty: Specialty::Mechanic,
        area: "Zagazig".to_string(),
        phone: "01155554444".to_string(),
        rating: 3,
        image: None,
    })
}

#[tokio::test]
async fn test_save_then_load_round_trip() {
    let backend = MemoryByteStore::new(QUOTA);
    let store = worker_store(&backend);

    let mut records = vec![sample("Karim Adel"), sample("Samir Fawzy")];
    records[1].image = Some("data:image/jpeg;base64,AAAA".to_string());
    records[1].specialty = Specialty::Other("حداد".to_string());

    assert!(store.save(&records).await);
    assert_eq!(store.load().await, records);
    // load of a valid blob never writes
    assert_eq!(backend.write_count(), 1);
}

#[tokio::test]
async fn test_absent_blob_seeds_defaults_once() {
    let backend = MemoryByteStore::new(QUOTA);
    let store = worker_store(&backend);

    let loaded = store.load().await;
    assert_eq!(loaded, default_roster());
    assert_eq!(backend.write_count(), 1);

    let stored: Vec<WorkerRecord> =
        serde_json::from_slice(&backend.raw(KEY).await.unwrap()).unwrap();
    assert_eq!(stored, default_roster());

    // Second load reads the seeded blob
    assert_eq!(store.load().await, default_roster());
    assert_eq!(backend.write_count(), 1);
}

#[tokio::test]
async fn test_corrupt_blob_replaced_by_defaults() {
    for blob in [
        &b"{not json"[..],
        b"{\"id\":\"w1\"}",
        b"42",
        b"[{\"id\":\"w1\"}]",
        b"[1,2,3]",
    ] {
        let backend = MemoryByteStore::with_entry(QUOTA, KEY, blob);
        let store = worker_store(&backend);

        let loaded = store.load().await;
        assert_eq!(loaded, default_roster(), "blob {:?}", String::from_utf8_lossy(blob));
        assert_eq!(backend.write_count(), 1);

        let stored: Vec<WorkerRecord> =
            serde_json::from_slice(&backend.raw(KEY).await.unwrap()).unwrap();
        assert_eq!(stored.len(), 6);
    }
}

#[tokio::test]
async fn test_empty_array_is_valid() {
    let backend = MemoryByteStore::with_entry(QUOTA, KEY, b"[]");
    let store = worker_store(&backend);

    assert!(store.load().await.is_empty());
    assert_eq!(backend.write_count(), 0);
}

#[tokio::test]
async fn test_loaded_defaults_are_independent() {
    let backend = MemoryByteStore::new(QUOTA);
    let store = worker_store(&backend);

    let mut first = store.load().await;
    first[0].name = "Changed".to_string();
    first.clear();

    assert_eq!(default_roster()[0].name, "محمد السيد");
    assert_eq!(store.load().await.len(), 6);
}

#[tokio::test]
async fn test_out_of_range_rating_clamped_on_load() {
    let blob = r#"[{"id":"w9","name":"Hany","specialty":"سباك","area":"Tanta","phone":"0100","rating":9.6,"image":null},
                    {"id":"w10","name":"Omar","specialty":"نجار","area":"Tanta","phone":"0100","rating":-2}]"#.as_bytes();
    let backend = MemoryByteStore::with_entry(QUOTA, KEY, blob);

    let loaded = worker_store(&backend).load().await;
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].rating, 5);
    assert_eq!(loaded[1].rating, 0);
    assert_eq!(loaded[1].image, None);
}

#[tokio::test]
async fn test_save_over_quota_returns_false_and_keeps_blob() {
    let backend = MemoryByteStore::new(QUOTA);
    let store = worker_store(&backend);
    let original = vec![sample("Karim Adel")];
    assert!(store.save(&original).await);

    let mut oversized = original.clone();
    let mut heavy = sample("Heavy Photo");
    heavy.image = Some(format!("data:image/jpeg;base64,{}", "A".repeat(6 * MIB)));
    oversized.push(heavy);

    assert!(!store.save(&oversized).await);
    assert_eq!(store.load().await, original);
}

#[tokio::test]
async fn test_save_backend_failure_returns_false() {
    let backend = MemoryByteStore::new(QUOTA);
    let store = worker_store(&backend);
    backend.set_fail_writes(true);

    assert!(!store.save(&[sample("Karim Adel")]).await);
    assert!(store.try_save(&[sample("Karim Adel")]).await.is_err());
    assert_eq!(backend.raw(KEY).await, None);
}

#[tokio::test]
async fn test_unreadable_store_serves_defaults_without_writing() {
    struct BrokenStore;

    #[async_trait::async_trait]
    impl ByteStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, db::StoreError> {
            Err(db::StoreError::Backend("disk gone".to_string()))
        }
        async fn set(&self, _key: &str, _value: &[u8]) -> Result<(), db::StoreError> {
            panic!("load must not write to an unreadable store");
        }
        fn quota_bytes(&self) -> u64 {
            0
        }
    }

    let store = WorkerStore::new(Arc::new(BrokenStore), KEY);
    assert_eq!(store.load().await, default_roster());
}

#[tokio::test]
async fn test_sqlite_backend_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("sanaee.db");
    let records = vec![sample("Karim Adel"), sample("Samir Fawzy")];

    {
        let pool = db::init_database_pool(&db_path).await.unwrap();
        let store = WorkerStore::new(Arc::new(SqliteByteStore::new(pool.clone(), QUOTA)), KEY);
        assert_eq!(store.load().await.len(), 6);
        assert!(store.save(&records).await);
        pool.close().await;
    }

    let pool = db::init_database_pool(&db_path).await.unwrap();
    let store = WorkerStore::new(Arc::new(SqliteByteStore::new(pool, QUOTA)), KEY);
    assert_eq!(store.load().await, records);
}

#[tokio::test]
async fn test_sqlite_backend_enforces_quota() {
    let temp_dir = TempDir::new().unwrap();
    let pool = db::init_database_pool(&temp_dir.path().join("sanaee.db"))
        .await
        .unwrap();
    let backend = SqliteByteStore::new(pool, 512);
    let store = WorkerStore::new(Arc::new(backend.clone()), KEY);

    let small = vec![sample("Karim Adel")];
    assert!(store.save(&small).await);

    let big: Vec<WorkerRecord> = (0..20).map(|i| sample(&format!("Worker {}", i))).collect();
    assert!(!store.save(&big).await);
    assert_eq!(store.load().await, small);
    assert!(backend.used_bytes().await.unwrap() <= 512);
}
