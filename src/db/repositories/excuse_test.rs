//! Tests for ExcuseRepository.

use crate::db::{DbError, MemoryStore, NewExcuse, Tracker};

#[tokio::test(flavor = "multi_thread")]
async fn random_stays_within_category() {
    let tracker = Tracker::new(MemoryStore::new());
    let repo = tracker.excuses();

    for _ in 0..20 {
        let excuse = repo.random(Some("dishes")).await.unwrap().unwrap();
        assert_eq!(excuse.category, "dishes");
    }
    assert!(repo.random(None).await.unwrap().is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn random_from_empty_category_is_none() {
    let tracker = Tracker::new(MemoryStore::new());
    assert_eq!(tracker.excuses().random(Some("taxes")).await.unwrap(), None);

    let empty = Tracker::new(MemoryStore::new().without_seed_data());
    assert_eq!(empty.excuses().random(None).await.unwrap(), None);
}

#[tokio::test(flavor = "multi_thread")]
async fn create_adds_to_category() {
    let tracker = Tracker::new(MemoryStore::new());
    let repo = tracker.excuses();

    let created = repo
        .create(&NewExcuse {
            category: "taxes".to_string(),
            text: "The forms are in a language I do not speak.".to_string(),
            believability: 9,
        })
        .await
        .unwrap();
    assert_eq!(repo.get_by_category("taxes").await.unwrap(), vec![created.clone()]);
    assert_eq!(repo.random(Some("taxes")).await.unwrap(), Some(created));
}

#[tokio::test(flavor = "multi_thread")]
async fn believability_out_of_range_is_rejected() {
    let tracker = Tracker::new(MemoryStore::new());
    let err = tracker
        .excuses()
        .create(&NewExcuse {
            category: "general".to_string(),
            text: "The cat ate it.".to_string(),
            believability: 11,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Validation { .. }));
}
