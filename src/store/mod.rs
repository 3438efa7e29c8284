/// User store
///
/// Credential records keyed by a unique login. Backends must be safe to share
/// across workers; the service holds one behind an `Arc<dyn UserStore>`.

mod memory;
mod postgres;

pub use memory::InMemoryUserStore;
pub use postgres::PgUserStore;

use async_trait::async_trait;

use crate::domain::Credentials;
use crate::error::StoreError;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new record. The `password` field is already hashed.
    ///
    /// # Errors
    /// `StoreError::Duplicate` if the login is taken
    async fn create_user(&self, user: &Credentials) -> Result<(), StoreError>;

    /// Fetch the record for `login`.
    ///
    /// # Errors
    /// `StoreError::NotFound` if there is none
    async fn get_user(&self, login: &str) -> Result<Credentials, StoreError>;

    /// Replace the password hash of an existing record. The login never changes.
    ///
    /// # Errors
    /// `StoreError::NotFound` if there is no record for `user.login`
    async fn update_user(&self, user: &Credentials) -> Result<(), StoreError>;

    /// # Errors
    /// `StoreError::NotFound` if there is no record for `login`
    async fn delete_user(&self, login: &str) -> Result<(), StoreError>;

    fn backend_name(&self) -> &'static str;
}
