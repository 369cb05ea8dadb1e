use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = uuid::Uuid;
pub type SessionId = uuid::Uuid;

/// Supported OAuth identity providers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthKind {
    Google,
    Github,
}

impl fmt::Display for OAuthKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Google => f.write_str("google"),
            Self::Github => f.write_str("github"),
        }
    }
}

/// Link between a user and an account at an OAuth provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OAuthIdentity {
    pub provider: OAuthKind,
    /// Provider-side account id.
    pub subject: String,
}

/// Registered account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    /// argon2 PHC string; `None` for OAuth-only accounts.
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub oauth: Option<OAuthIdentity>,
    pub avatar: Option<String>,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to create a [`User`]; the store assigns id and timestamps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: Option<String>,
    pub oauth: Option<OAuthIdentity>,
    pub avatar: Option<String>,
    pub email_verified: bool,
}

impl NewUser {
    /// Starts a new user with a normalized email.
    pub fn new(email: &str, name: impl Into<String>) -> Self {
        Self {
            email: normalize_email(email),
            name: name.into(),
            password_hash: None,
            oauth: None,
            avatar: None,
            email_verified: false,
        }
    }

    pub fn password_hash(mut self, hash: impl Into<String>) -> Self {
        self.password_hash = Some(hash.into());
        self
    }

    pub fn oauth(mut self, identity: OAuthIdentity) -> Self {
        self.oauth = Some(identity);
        self
    }

    pub fn avatar(mut self, avatar: Option<String>) -> Self {
        self.avatar = avatar;
        self
    }

    pub fn email_verified(mut self, verified: bool) -> Self {
        self.email_verified = verified;
        self
    }

    pub(crate) fn into_user(self) -> User {
        User {
            id: uuid::Uuid::new_v4(),
            email: self.email,
            name: self.name,
            password_hash: self.password_hash,
            oauth: self.oauth,
            avatar: self.avatar,
            email_verified: self.email_verified,
            created_at: Utc::now(),
        }
    }
}

/// Emails are compared case-insensitively and without surrounding blanks.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Author of a chat log entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

/// One entry of a session's chat log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Latest component of a session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSnapshot {
    pub jsx_code: String,
    pub css_code: String,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    /// Starts at 0 and increases by one on every replacement.
    pub version: u32,
}

/// A user's design session: its chat log and current component.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub owner: UserId,
    pub name: String,
    pub description: String,
    pub chat_history: Vec<ChatMessage>,
    pub current_component: ComponentSnapshot,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub(crate) fn create(owner: UserId, new: NewSession) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4(),
            owner,
            name: new.name,
            description: new.description.unwrap_or_default(),
            chat_history: Vec::new(),
            current_component: ComponentSnapshot::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Appends a message to the chat log.
    pub fn push_message(&mut self, message: ChatMessage) {
        self.chat_history.push(message);
        self.touch();
    }

    /// Replaces the current component and bumps its version.
    pub fn replace_component(
        &mut self,
        jsx_code: impl Into<String>,
        css_code: impl Into<String>,
        metadata: Option<serde_json::Map<String, serde_json::Value>>,
    ) {
        let component = &mut self.current_component;
        component.jsx_code = jsx_code.into();
        component.css_code = css_code.into();
        if let Some(metadata) = metadata {
            component.metadata = metadata;
        }
        component.version = component.version.saturating_add(1);
        self.touch();
    }

    /// Applies a partial update. A component in the patch goes through
    /// [`Session::replace_component`], so its version is always server-assigned.
    pub fn apply(&mut self, patch: SessionPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(component) = patch.current_component {
            self.replace_component(component.jsx_code, component.css_code, component.metadata);
        }
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Fields accepted when creating a session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSession {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial update of a session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub current_component: Option<ComponentUpdate>,
}

/// Replacement component sent by a client. A client-side `version` is ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentUpdate {
    pub jsx_code: String,
    #[serde(default)]
    pub css_code: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}
