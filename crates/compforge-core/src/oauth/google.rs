use serde::Deserialize;

use super::{OAuthError, OAuthProfile, OAuthProvider};
use crate::model::OAuthKind;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Must match the redirect URI registered with Google.
    pub redirect_uri: String,
}

impl GoogleConfig {
    /// `None` unless `GOOGLE_CLIENT_ID` and `GOOGLE_CLIENT_SECRET` are both set.
    ///
    /// `GOOGLE_REDIRECT_URI` defaults to the local callback route.
    pub fn from_env() -> Option<Self> {
        let client_id = std::env::var("GOOGLE_CLIENT_ID").ok()?;
        let client_secret = std::env::var("GOOGLE_CLIENT_SECRET").ok()?;
        let redirect_uri = std::env::var("GOOGLE_REDIRECT_URI")
            .unwrap_or_else(|_| "http://localhost:5000/api/auth/google/callback".to_owned());
        Some(Self {
            client_id,
            client_secret,
            redirect_uri,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    email: Option<String>,
    name: Option<String>,
    given_name: Option<String>,
    picture: Option<String>,
}

impl From<UserInfo> for OAuthProfile {
    fn from(info: UserInfo) -> Self {
        Self {
            id: info.sub,
            email: info.email,
            display_name: info.name,
            username: info.given_name,
            avatar: info.picture,
        }
    }
}

pub struct GoogleProvider {
    http: reqwest::Client,
    config: GoogleConfig,
}

impl GoogleProvider {
    pub fn new(config: GoogleConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait::async_trait]
impl OAuthProvider for GoogleProvider {
    fn kind(&self) -> OAuthKind {
        OAuthKind::Google
    }

    #[tracing::instrument(skip_all, fields(provider = "google"))]
    async fn exchange_code(&self, code: &str) -> Result<OAuthProfile, OAuthError> {
        let kind = self.kind();
        let response = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| OAuthError::http(kind, e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, %body, "token exchange rejected");
            return Err(OAuthError::exchange(kind, format!("status {status}")));
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| OAuthError::exchange(kind, e.to_string()))?;

        let info: UserInfo = self
            .http
            .get(USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| OAuthError::http(kind, e.to_string()))?
            .json()
            .await
            .map_err(|e| OAuthError::http(kind, e.to_string()))?;
        Ok(info.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn userinfo_maps_onto_profile() {
        let info: UserInfo = serde_json::from_value(serde_json::json!({
            "sub": "1093",
            "email": "ada@example.com",
            "email_verified": true,
            "name": "Ada Lovelace",
            "given_name": "Ada",
            "picture": "https://lh3.example/ada"
        }))
        .expect("userinfo");
        let profile = OAuthProfile::from(info);
        assert_eq!(profile.id, "1093");
        assert_eq!(profile.display_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(profile.avatar.as_deref(), Some("https://lh3.example/ada"));
    }
}
