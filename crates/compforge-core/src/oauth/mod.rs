//! Third-party sign-in: code exchange and account linking.
mod github;
mod google;

pub use github::{GithubConfig, GithubProvider};
pub use google::{GoogleConfig, GoogleProvider};

use crate::model::{NewUser, OAuthIdentity, OAuthKind, User};
use crate::store::{Store, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("{provider} account has no email address")]
    MissingEmail { provider: OAuthKind },
    #[error("{provider} rejected the authorization code: {message}")]
    Exchange {
        provider: OAuthKind,
        message: String,
    },
    #[error("{provider} request failed: {message}")]
    Http {
        provider: OAuthKind,
        message: String,
    },
    #[error("{0} sign-in is not configured")]
    NotConfigured(OAuthKind),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl OAuthError {
    pub fn exchange(provider: OAuthKind, message: impl Into<String>) -> Self {
        Self::Exchange {
            provider,
            message: message.into(),
        }
    }

    pub fn http(provider: OAuthKind, message: impl Into<String>) -> Self {
        Self::Http {
            provider,
            message: message.into(),
        }
    }
}

/// Account details reported by a provider after a successful code exchange.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OAuthProfile {
    /// Provider-side account id.
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub username: Option<String>,
    pub avatar: Option<String>,
}

impl OAuthProfile {
    fn preferred_name(&self, email: &str) -> String {
        self.display_name
            .iter()
            .chain(self.username.iter())
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| email.split('@').next().unwrap_or(email).to_owned())
    }
}

#[async_trait::async_trait]
pub trait OAuthProvider: Send + Sync {
    fn kind(&self) -> OAuthKind;

    /// Trades an authorization code for the signed-in account's profile.
    async fn exchange_code(&self, code: &str) -> Result<OAuthProfile, OAuthError>;
}

/// Resolves a provider profile to a local user.
///
/// 1. A user already linked to this provider account is returned as is.
/// 2. Otherwise a user with the same email gets the provider linked, the
///    avatar replaced and the email marked verified.
/// 3. Otherwise a new verified user is created.
#[tracing::instrument(skip(store, profile), fields(profile_id = %profile.id))]
pub async fn link_or_create_user(
    store: &dyn Store,
    provider: OAuthKind,
    profile: OAuthProfile,
) -> Result<User, OAuthError> {
    let identity = OAuthIdentity {
        provider,
        subject: profile.id.clone(),
    };
    if let Some(user) = store.find_user_by_oauth(&identity).await? {
        return Ok(user);
    }

    let Some(email) = profile.email.as_deref().filter(|e| !e.trim().is_empty()) else {
        return Err(OAuthError::MissingEmail { provider });
    };

    if let Some(mut user) = store.find_user_by_email(email).await? {
        user.oauth = Some(identity);
        user.avatar = profile.avatar.clone();
        user.email_verified = true;
        let user = store.update_user(user).await?;
        tracing::info!(user_id = %user.id, "linked existing account");
        return Ok(user);
    }

    let name = profile.preferred_name(email);
    let user = store
        .create_user(
            NewUser::new(email, name)
                .oauth(identity)
                .avatar(profile.avatar)
                .email_verified(true),
        )
        .await?;
    tracing::info!(user_id = %user.id, "created account from provider profile");
    Ok(user)
}
