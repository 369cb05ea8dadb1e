//! Email/password accounts and bearer tokens.
mod password;
mod token;

use std::sync::Arc;

pub use password::{MIN_PASSWORD_LEN, hash_password, validate_password, verify_password};
pub use token::{Claims, TOKEN_TTL_DAYS, TokenIssuer};

use crate::model::{NewUser, User};
use crate::store::{Store, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Password must be at least {min} characters")]
    WeakPassword { min: usize },
    #[error("User already exists")]
    EmailTaken,
    #[error("{0}")]
    InvalidInput(String),
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("token expired")]
    TokenExpired,
    #[error("user not found")]
    UserNotFound,
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("auth configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Store(StoreError),
}

impl AuthError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken(message.into())
    }

    pub fn hashing(message: impl Into<String>) -> Self {
        Self::Hashing(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail { .. } => Self::EmailTaken,
            other => Self::Store(other),
        }
    }
}

/// A signed-in user together with a fresh bearer token.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub token: String,
    pub user: User,
}

/// Registration, login and token verification against a [`Store`].
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    tokens: TokenIssuer,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, tokens: TokenIssuer) -> Self {
        Self { store, tokens }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    #[tracing::instrument(skip_all)]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Authenticated, AuthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::invalid_input("Name is required"));
        }
        if !email.contains('@') {
            return Err(AuthError::invalid_input("A valid email is required"));
        }
        validate_password(password)?;

        if self.store.find_user_by_email(email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }
        let phc = hash_password(password)?;
        let user = self
            .store
            .create_user(NewUser::new(email, name).password_hash(phc))
            .await?;
        tracing::info!(user_id = %user.id, "user registered");
        self.issue_for(user)
    }

    #[tracing::instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<Authenticated, AuthError> {
        let Some(user) = self.store.find_user_by_email(email).await? else {
            return Err(AuthError::InvalidCredentials);
        };
        // OAuth-only accounts have no password to check against.
        let Some(phc) = user.password_hash.as_deref() else {
            return Err(AuthError::InvalidCredentials);
        };
        if !verify_password(password, phc)? {
            tracing::debug!(user_id = %user.id, "password mismatch");
            return Err(AuthError::InvalidCredentials);
        }
        self.issue_for(user)
    }

    /// Resolves a bearer token to the user it was issued for.
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.tokens.verify(token)?;
        self.store
            .user(claims.user_id()?)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    pub fn issue_for(&self, user: User) -> Result<Authenticated, AuthError> {
        let token = self.tokens.issue(user.id)?;
        Ok(Authenticated { token, user })
    }
}
