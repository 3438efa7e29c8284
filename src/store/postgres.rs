use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

use super::UserStore;
use crate::configuration::DatabaseSettings;
use crate::domain::Credentials;
use crate::error::StoreError;

const UNIQUE_VIOLATION: &str = "23505";

/// Postgres-backed user store.
///
/// Every operation is bounded by `timeout`; when it elapses the query future is
/// dropped and `StoreError::Timeout` is returned.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgUserStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Open a connection pool for `settings`
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(settings.timeout())
            .connect(&settings.connection_string())
            .await?;

        Ok(Self::new(pool, settings.timeout()))
    }

    /// Apply pending migrations from `./migrations`
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("migration failed: {}", e)))
    }

    async fn bounded<T, F>(&self, operation: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, operation).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => Err(StoreError::Timeout),
        }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create_user(&self, user: &Credentials) -> Result<(), StoreError> {
        let now = Utc::now();
        let insert = sqlx::query(
            r#"
            INSERT INTO users (id, login, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.login)
        .bind(&user.password)
        .bind(now)
        .bind(now)
        .execute(&self.pool);

        match tokio::time::timeout(self.timeout, insert).await {
            Err(_) => Err(StoreError::Timeout),
            Ok(Ok(_)) => Ok(()),
            Ok(Err(sqlx::Error::Database(db_err)))
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) =>
            {
                Err(StoreError::Duplicate(user.login.clone()))
            }
            Ok(Err(e)) => Err(StoreError::from(e)),
        }
    }

    async fn get_user(&self, login: &str) -> Result<Credentials, StoreError> {
        let row = self
            .bounded(
                sqlx::query_as::<_, (Uuid, String, String)>(
                    "SELECT id, login, password_hash FROM users WHERE login = $1",
                )
                .bind(login)
                .fetch_optional(&self.pool),
            )
            .await?;

        match row {
            Some((id, login, password_hash)) => Ok(Credentials {
                id: Some(id),
                login,
                password: password_hash,
            }),
            None => Err(StoreError::NotFound(login.to_string())),
        }
    }

    async fn update_user(&self, user: &Credentials) -> Result<(), StoreError> {
        let result = self
            .bounded(
                sqlx::query(
                    r#"
                    UPDATE users
                    SET password_hash = $1, updated_at = $2
                    WHERE login = $3
                    "#,
                )
                .bind(&user.password)
                .bind(Utc::now())
                .bind(&user.login)
                .execute(&self.pool),
            )
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(user.login.clone()));
        }
        Ok(())
    }

    async fn delete_user(&self, login: &str) -> Result<(), StoreError> {
        let result = self
            .bounded(
                sqlx::query("DELETE FROM users WHERE login = $1")
                    .bind(login)
                    .execute(&self.pool),
            )
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(login.to_string()));
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
