//! CLI command tests against a live PostgreSQL database
//!
//! Run with: WORKHOURS_TEST_DATABASE_URL=postgres://... cargo test --test cli_tests -- --ignored --test-threads=1

use tokio_postgres::NoTls;

use workhours::accounts::create_account;
use workhours::auth::UserRole;
use workhours::cli::commands::open_store;
use workhours::store::Store;
use workhours::Config;

fn test_config() -> Config {
    let mut config = Config::default();
    config.database.url = std::env::var("WORKHOURS_TEST_DATABASE_URL")
        .expect("WORKHOURS_TEST_DATABASE_URL must point at a scratch database");
    config
}

#[tokio::test]
#[ignore] // Needs PostgreSQL, run with: cargo test --test cli_tests -- --ignored
async fn test_create_user_on_fresh_database() {
    let config = test_config();

    // Start from an empty database
    let (client, connection) = tokio_postgres::connect(&config.database.url, NoTls)
        .await
        .unwrap();
    tokio::spawn(connection);
    client
        .batch_execute("DROP TABLE IF EXISTS expenses, vacations, work_hours, users")
        .await
        .unwrap();

    let store = open_store(&config).await.unwrap();
    let user = create_account(&store, "admin", "changeme".to_string(), UserRole::Manager, 4)
        .await
        .unwrap();

    let users = store.list_users().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].id, user.id);

    // Opening again is harmless once the tables exist
    open_store(&config).await.unwrap();
}
