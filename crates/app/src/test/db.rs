//! Per-test `PostgreSQL` databases inside one shared container.

use std::sync::atomic::{AtomicU64, Ordering};

use once_cell::sync::Lazy;
use sqlx::{Connection, PgConnection, PgPool};
use testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres as PostgresImage;
use tokio::sync::{OnceCell, mpsc};

const USER: &str = "perkwise_test";
const PASSWORD: &str = "perkwise_test_password";

static POSTGRES_CONTAINER: Lazy<OnceCell<ContainerAsync<PostgresImage>>> = Lazy::new(OnceCell::new);

/// Databases waiting to be dropped once their `TestDb` goes away.
static CLEANUP_SENDER: Lazy<OnceCell<mpsc::UnboundedSender<String>>> = Lazy::new(OnceCell::new);

static DATABASE_COUNTER: AtomicU64 = AtomicU64::new(0);

async fn start_container() -> ContainerAsync<PostgresImage> {
    PostgresImage::default()
        .with_user(USER)
        .with_password(PASSWORD)
        .with_db_name("perkwise_test")
        .with_tag("17-alpine")
        .start()
        .await
        .expect("Failed to start PostgreSQL container")
}

async fn server_url(database: &str) -> String {
    let container = POSTGRES_CONTAINER.get_or_init(start_container).await;

    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get container port");

    let host =
        std::env::var("TESTCONTAINERS_HOST_OVERRIDE").unwrap_or_else(|_| "localhost".to_string());

    format!("postgresql://{USER}:{PASSWORD}@{host}:{port}/{database}")
}

async fn spawn_cleanup_task() -> mpsc::UnboundedSender<String> {
    let (sender, mut receiver) = mpsc::unbounded_channel::<String>();

    tokio::spawn(async move {
        while let Some(name) = receiver.recv().await {
            if let Err(error) = drop_database(&name).await {
                eprintln!("Failed to drop test database '{name}': {error}");
            }
        }
    });

    sender
}

async fn drop_database(name: &str) -> Result<(), sqlx::Error> {
    let mut conn = PgConnection::connect(&server_url("postgres").await).await?;

    sqlx::query(&format!("DROP DATABASE IF EXISTS \"{name}\" WITH (FORCE)"))
        .execute(&mut conn)
        .await?;

    conn.close().await
}

/// A freshly migrated database, dropped in the background when this value is dropped.
///
/// Services commit their own transactions, so isolation comes from giving every test its own
/// database rather than from rolling anything back.
#[derive(Debug)]
pub(crate) struct TestDb {
    pub(crate) pool: PgPool,
    name: String,
}

impl Drop for TestDb {
    fn drop(&mut self) {
        if let Some(sender) = CLEANUP_SENDER.get() {
            let _ = sender.send(self.name.clone());
        }
    }
}

impl TestDb {
    pub(crate) async fn new() -> Self {
        CLEANUP_SENDER.get_or_init(spawn_cleanup_task).await;

        let name = format!(
            "perkwise_{}_{}",
            std::process::id(),
            DATABASE_COUNTER.fetch_add(1, Ordering::Relaxed)
        );

        let mut conn = PgConnection::connect(&server_url("postgres").await)
            .await
            .expect("Failed to connect to postgres database");

        sqlx::query(&format!("CREATE DATABASE \"{name}\""))
            .execute(&mut conn)
            .await
            .expect("Failed to create test database");

        conn.close()
            .await
            .expect("Failed to close admin connection");

        let pool = PgPool::connect(&server_url(&name).await)
            .await
            .expect("Failed to connect to test database");

        crate::database::migrate(&pool)
            .await
            .expect("Failed to run migrations on test database");

        Self { pool, name }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn databases_are_migrated_and_isolated() {
        let first = TestDb::new().await;
        let second = TestDb::new().await;

        assert_ne!(first.name, second.name);

        let rules: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rules")
            .fetch_one(&first.pool)
            .await
            .expect("Failed to query migrated schema");

        assert_eq!(rules, 0);
    }
}
