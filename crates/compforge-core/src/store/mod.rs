//! Persistence contract for users and sessions.
//!
//! The server only talks to [`Store`]; [`MemoryStore`] is the bundled
//! implementation. Other backends implement the same trait out of tree.
mod memory;

pub use memory::MemoryStore;

use crate::model::{NewSession, NewUser, OAuthIdentity, Session, SessionId, User, UserId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("a user with email {email} already exists")]
    DuplicateEmail { email: String },
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: uuid::Uuid },
    #[error("storage backend failure: {message}")]
    Backend { message: String },
}

impl StoreError {
    pub fn duplicate_email(email: impl Into<String>) -> Self {
        Self::DuplicateEmail {
            email: email.into(),
        }
    }

    pub fn user_not_found(id: UserId) -> Self {
        Self::NotFound { kind: "user", id }
    }

    pub fn session_not_found(id: SessionId) -> Self {
        Self::NotFound { kind: "session", id }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Inserts a user. Emails are unique across the store.
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError>;

    async fn user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Looks a user up by normalized email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_oauth(
        &self,
        identity: &OAuthIdentity,
    ) -> Result<Option<User>, StoreError>;

    /// Replaces a stored user wholesale.
    async fn update_user(&self, user: User) -> Result<User, StoreError>;

    async fn create_session(&self, owner: UserId, new: NewSession)
    -> Result<Session, StoreError>;

    async fn session(&self, id: SessionId) -> Result<Option<Session>, StoreError>;

    /// Sessions owned by `owner`, most recently updated first.
    async fn sessions_for(&self, owner: UserId) -> Result<Vec<Session>, StoreError>;

    async fn update_session(&self, session: Session) -> Result<Session, StoreError>;

    /// Returns `false` when there was nothing to delete.
    async fn delete_session(&self, id: SessionId) -> Result<bool, StoreError>;
}
