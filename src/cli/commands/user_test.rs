use crate::cli::commands::user::*;
use crate::db::{MemoryStore, NewUser, Role, Tracker};

#[tokio::test(flavor = "multi_thread")]
async fn test_list_users_table_and_json() {
    let tracker = Tracker::new(MemoryStore::new());

    let table = list_users(&tracker, "table").await.unwrap();
    assert!(table.contains("Username"));
    assert!(table.contains("Head of Household"));

    let json = list_users(&tracker, "json").await.unwrap();
    let users: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(users[0]["username"], "admin");
    assert_eq!(users[0]["role"], "admin");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_create_user_reports_id() {
    let tracker = Tracker::new(MemoryStore::new());
    let output = create_user(
        &tracker,
        NewUser {
            username: "bea".to_string(),
            display_name: "Bea".to_string(),
            role: Role::Guest,
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(output, "✓ Created user: bea (2)");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_create_duplicate_user_fails() {
    let tracker = Tracker::new(MemoryStore::new());
    let result = create_user(
        &tracker,
        NewUser {
            username: "admin".to_string(),
            display_name: "Impostor".to_string(),
            ..Default::default()
        },
    )
    .await;
    assert!(result.unwrap_err().to_string().contains("username"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_bootstraps_first_user() {
    let tracker = Tracker::new(MemoryStore::new().without_seed_data());
    let output = login(&tracker, "dana", "table").await.unwrap();
    assert_eq!(output, "✓ Logged in as dana (dana, admin)");
}
