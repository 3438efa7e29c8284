use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::UserStore;
use crate::domain::Credentials;
use crate::error::StoreError;

/// Process-local user store.
///
/// Used when no database is configured, and by the test suites.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, Credentials>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create_user(&self, user: &Credentials) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.login) {
            return Err(StoreError::Duplicate(user.login.clone()));
        }

        let mut record = user.clone();
        record.id = Some(Uuid::new_v4());
        users.insert(record.login.clone(), record);
        Ok(())
    }

    async fn get_user(&self, login: &str) -> Result<Credentials, StoreError> {
        self.users
            .read()
            .await
            .get(login)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(login.to_string()))
    }

    async fn update_user(&self, user: &Credentials) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let record = users
            .get_mut(&user.login)
            .ok_or_else(|| StoreError::NotFound(user.login.clone()))?;
        record.password = user.password.clone();
        Ok(())
    }

    async fn delete_user(&self, login: &str) -> Result<(), StoreError> {
        self.users
            .write()
            .await
            .remove(login)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(login.to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "in-memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_assigns_id() {
        let store = InMemoryUserStore::new();
        store.create_user(&Credentials::new("admin", "hash")).await.unwrap();

        let stored = store.get_user("admin").await.unwrap();
        assert!(stored.id.is_some());
        assert_eq!(stored.password, "hash");
    }

    #[tokio::test]
    async fn test_caller_supplied_id_is_replaced() {
        let store = InMemoryUserStore::new();
        let mut creds = Credentials::new("admin", "hash");
        creds.id = Some(Uuid::nil());
        store.create_user(&creds).await.unwrap();

        let stored = store.get_user("admin").await.unwrap();
        assert_ne!(stored.id, Some(Uuid::nil()));
    }

    #[tokio::test]
    async fn test_duplicate_login_rejected() {
        let store = InMemoryUserStore::new();
        store.create_user(&Credentials::new("admin", "a")).await.unwrap();

        let result = store.create_user(&Credentials::new("admin", "b")).await;
        assert_eq!(result, Err(StoreError::Duplicate("admin".to_string())));
        assert_eq!(store.get_user("admin").await.unwrap().password, "a");
    }

    #[tokio::test]
    async fn test_missing_user() {
        let store = InMemoryUserStore::new();

        assert!(matches!(store.get_user("nouser").await, Err(StoreError::NotFound(_))));
        assert!(matches!(store.delete_user("nouser").await, Err(StoreError::NotFound(_))));
        assert!(matches!(
            store.update_user(&Credentials::new("nouser", "x")).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_keeps_id() {
        let store = InMemoryUserStore::new();
        store.create_user(&Credentials::new("admin", "old")).await.unwrap();
        let before = store.get_user("admin").await.unwrap();

        store.update_user(&Credentials::new("admin", "new")).await.unwrap();

        let after = store.get_user("admin").await.unwrap();
        assert_eq!(after.password, "new");
        assert_eq!(after.id, before.id);
    }

    #[tokio::test]
    async fn test_delete_user() {
        let store = InMemoryUserStore::new();
        store.create_user(&Credentials::new("admin", "hash")).await.unwrap();

        store.delete_user("admin").await.unwrap();
        assert!(matches!(store.get_user("admin").await, Err(StoreError::NotFound(_))));
    }
}
