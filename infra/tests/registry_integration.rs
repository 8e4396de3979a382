//! Integration tests for the SQLx-backed connection registry

use std::io::Write;
use std::sync::Arc;

use cr_infra::{ConnectionTable, MySqlConnector, MySqlRegistry};

fn write_table(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn live_registry() -> MySqlRegistry {
    let table = ConnectionTable::from_env().expect("MYSQL_* environment variables must be set");
    MySqlConnector::new().into_registry(table)
}

#[tokio::test]
async fn test_registry_from_file_rejects_unknown_name() {
    let file = write_table(
        r#"
[connections.default]
host = "127.0.0.1"
port = 1
database = "test"
timeout = 1
"#,
    );

    let table = ConnectionTable::from_file(file.path()).unwrap();
    let registry = MySqlConnector::new().into_registry(table);

    let err = registry.connect("billing").await.unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(err.name(), "billing");

    let report = registry.close_all().await;
    assert!(report.is_clean());
    assert!(report.closed.is_empty());
}

#[tokio::test]
#[ignore] // Requires actual database
async fn test_default_connection_is_cached() {
    let registry = live_registry();

    let db = registry.init_default().await.unwrap();
    assert!(db.health_check().await.unwrap());

    let again = registry.default_connection().await.unwrap();
    assert_eq!(again.name(), "default");
    assert!(registry.is_cached("default"));

    let mut tx = again.begin_transaction().await.unwrap();
    let one: i64 = sqlx::query_scalar("SELECT 1").fetch_one(&mut *tx).await.unwrap();
    assert_eq!(one, 1);
    tx.rollback().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore] // Requires actual database
async fn test_concurrent_connect_shares_pool() {
    let registry = Arc::new(live_registry());

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.default_connection().await })
        })
        .collect();

    for task in tasks {
        let db = task.await.unwrap().unwrap();
        assert!(db.health_check().await.unwrap());
    }
    assert_eq!(registry.cached_names(), vec!["default"]);
}

#[tokio::test]
#[ignore] // Requires actual database
async fn test_close_all_closes_pools() {
    let registry = live_registry();

    let db = registry.init_default().await.unwrap();
    let report = registry.close_all().await;

    assert!(report.is_clean());
    assert_eq!(report.closed, vec!["default"]);
    assert!(db.is_closed());
    assert!(!registry.is_cached("default"));

    let reopened = registry.default_connection().await.unwrap();
    assert!(!reopened.is_closed());
    registry.close_all().await;
}
