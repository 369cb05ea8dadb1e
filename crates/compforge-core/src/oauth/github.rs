use serde::Deserialize;

use super::{OAuthError, OAuthProfile, OAuthProvider};
use crate::model::OAuthKind;

const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = "CompForge";

#[derive(Debug, Clone)]
pub struct GithubConfig {
    pub client_id: String,
    pub client_secret: String,
}

impl GithubConfig {
    /// `None` unless `GITHUB_CLIENT_ID` and `GITHUB_CLIENT_SECRET` are both set.
    pub fn from_env() -> Option<Self> {
        Some(Self {
            client_id: std::env::var("GITHUB_CLIENT_ID").ok()?,
            client_secret: std::env::var("GITHUB_CLIENT_SECRET").ok()?,
        })
    }
}

/// GitHub answers token requests with 200 and an `error` field on failure.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubUser {
    id: u64,
    login: String,
    name: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

/// Primary verified address first, then any verified one.
fn pick_email(emails: &[GithubEmail]) -> Option<String> {
    emails
        .iter()
        .find(|e| e.primary && e.verified)
        .or_else(|| emails.iter().find(|e| e.verified))
        .map(|e| e.email.clone())
}

pub struct GithubProvider {
    http: reqwest::Client,
    config: GithubConfig,
}

impl GithubProvider {
    pub fn new(config: GithubConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    async fn api_get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
    ) -> Result<T, OAuthError> {
        self.http
            .get(format!("{API_BASE}{path}"))
            .bearer_auth(token)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| OAuthError::http(OAuthKind::Github, e.to_string()))?
            .json()
            .await
            .map_err(|e| OAuthError::http(OAuthKind::Github, e.to_string()))
    }
}

#[async_trait::async_trait]
impl OAuthProvider for GithubProvider {
    fn kind(&self) -> OAuthKind {
        OAuthKind::Github
    }

    #[tracing::instrument(skip_all, fields(provider = "github"))]
    async fn exchange_code(&self, code: &str) -> Result<OAuthProfile, OAuthError> {
        let kind = self.kind();
        let token: TokenResponse = self
            .http
            .post(TOKEN_URL)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
            ])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| OAuthError::http(kind, e.to_string()))?
            .json()
            .await
            .map_err(|e| OAuthError::exchange(kind, e.to_string()))?;

        let access_token = match token {
            TokenResponse {
                access_token: Some(access_token),
                ..
            } => access_token,
            TokenResponse {
                error,
                error_description,
                ..
            } => {
                let message = error_description
                    .or(error)
                    .unwrap_or_else(|| "no access token returned".to_owned());
                return Err(OAuthError::exchange(kind, message));
            }
        };

        let user: GithubUser = self.api_get("/user", &access_token).await?;
        // Users with a private email only expose it through /user/emails.
        let email = match user.email {
            Some(email) => Some(email),
            None => {
                let emails: Vec<GithubEmail> = self.api_get("/user/emails", &access_token).await?;
                pick_email(&emails)
            }
        };

        Ok(OAuthProfile {
            id: user.id.to_string(),
            email,
            display_name: user.name,
            username: Some(user.login),
            avatar: user.avatar_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(address: &str, primary: bool, verified: bool) -> GithubEmail {
        GithubEmail {
            email: address.into(),
            primary,
            verified,
        }
    }

    #[test]
    fn prefers_primary_verified_email() {
        let emails = vec![
            email("old@example.com", false, true),
            email("main@example.com", true, true),
        ];
        assert_eq!(pick_email(&emails).as_deref(), Some("main@example.com"));
    }

    #[test]
    fn ignores_unverified_addresses() {
        let emails = vec![
            email("primary@example.com", true, false),
            email("alt@example.com", false, true),
        ];
        assert_eq!(pick_email(&emails).as_deref(), Some("alt@example.com"));
        assert_eq!(pick_email(&[email("x@example.com", true, false)]), None);
    }

    #[test]
    fn token_error_payload_deserializes() {
        let token: TokenResponse = serde_json::from_value(serde_json::json!({
            "error": "bad_verification_code",
            "error_description": "The code passed is incorrect or expired."
        }))
        .expect("token");
        assert!(token.access_token.is_none());
        assert_eq!(token.error.as_deref(), Some("bad_verification_code"));
    }
}
