//! Domain records, persistence, authentication and observability shared by
//! the CompForge server.

pub mod auth;
pub mod model;
pub mod oauth;
pub mod observability;
pub mod store;

pub use auth::{AuthError, AuthService, Authenticated, Claims, TokenIssuer};
pub use model::{
    ChatMessage, ChatRole, ComponentSnapshot, ComponentUpdate, NewSession, NewUser, OAuthIdentity,
    OAuthKind, Session, SessionId, SessionPatch, User, UserId,
};
pub use oauth::{
    GithubConfig, GithubProvider, GoogleConfig, GoogleProvider, OAuthError, OAuthProfile,
    OAuthProvider, link_or_create_user,
};
pub use store::{MemoryStore, Store, StoreError};
