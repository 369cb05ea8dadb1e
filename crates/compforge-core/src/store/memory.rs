use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{Store, StoreError};
use crate::model::{
    NewSession, NewUser, OAuthIdentity, Session, SessionId, User, UserId, normalize_email,
};

/// In-process store backed by concurrent hash maps. Contents are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: DashMap<UserId, User>,
    emails: DashMap<String, UserId>,
    sessions: DashMap<SessionId, Session>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let user = new.into_user();
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::duplicate_email(user.email)),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
                self.users.insert(user.id, user.clone());
                tracing::debug!(user_id = %user.id, "user created");
                Ok(user)
            }
        }
    }

    async fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let Some(id) = self.emails.get(&normalize_email(email)).map(|entry| *entry) else {
            return Ok(None);
        };
        self.user(id).await
    }

    async fn find_user_by_oauth(
        &self,
        identity: &OAuthIdentity,
    ) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .iter()
            .find(|entry| entry.oauth.as_ref() == Some(identity))
            .map(|entry| entry.value().clone()))
    }

    async fn update_user(&self, mut user: User) -> Result<User, StoreError> {
        user.email = normalize_email(&user.email);
        let previous_email = match self.users.get(&user.id) {
            Some(existing) => existing.email.clone(),
            None => return Err(StoreError::user_not_found(user.id)),
        };
        if previous_email != user.email {
            match self.emails.entry(user.email.clone()) {
                Entry::Occupied(_) => return Err(StoreError::duplicate_email(user.email)),
                Entry::Vacant(slot) => {
                    slot.insert(user.id);
                }
            }
            self.emails.remove(&previous_email);
        }
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn create_session(
        &self,
        owner: UserId,
        new: NewSession,
    ) -> Result<Session, StoreError> {
        let session = Session::create(owner, new);
        self.sessions.insert(session.id, session.clone());
        tracing::debug!(session_id = %session.id, owner = %owner, "session created");
        Ok(session)
    }

    async fn session(&self, id: SessionId) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.get(&id).map(|entry| entry.value().clone()))
    }

    async fn sessions_for(&self, owner: UserId) -> Result<Vec<Session>, StoreError> {
        let mut owned: Vec<Session> = self
            .sessions
            .iter()
            .filter(|entry| entry.owner == owner)
            .map(|entry| entry.value().clone())
            .collect();
        owned.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(owned)
    }

    async fn update_session(&self, session: Session) -> Result<Session, StoreError> {
        match self.sessions.get_mut(&session.id) {
            Some(mut slot) => {
                *slot = session.clone();
                Ok(session)
            }
            None => Err(StoreError::session_not_found(session.id)),
        }
    }

    async fn delete_session(&self, id: SessionId) -> Result<bool, StoreError> {
        Ok(self.sessions.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChatMessage, ChatRole, OAuthKind};

    fn new_session(name: &str) -> NewSession {
        NewSession {
            name: name.into(),
            description: None,
        }
    }

    #[tokio::test]
    async fn duplicate_emails_are_rejected_case_insensitively() {
        let store = MemoryStore::new();
        store
            .create_user(NewUser::new("ada@example.com", "Ada"))
            .await
            .expect("first insert");

        let err = store
            .create_user(NewUser::new("ADA@example.com", "Imposter"))
            .await
            .expect_err("duplicate");
        assert_eq!(err, StoreError::duplicate_email("ada@example.com"));

        let found = store
            .find_user_by_email(" Ada@Example.com")
            .await
            .expect("lookup")
            .expect("present");
        assert_eq!(found.name, "Ada");
    }

    #[tokio::test]
    async fn finds_users_by_oauth_identity() {
        let store = MemoryStore::new();
        let identity = OAuthIdentity {
            provider: OAuthKind::Github,
            subject: "42".into(),
        };
        let created = store
            .create_user(NewUser::new("gh@example.com", "Octo").oauth(identity.clone()))
            .await
            .expect("insert");

        let found = store.find_user_by_oauth(&identity).await.expect("lookup");
        assert_eq!(found.map(|u| u.id), Some(created.id));

        let other = OAuthIdentity {
            provider: OAuthKind::Google,
            subject: "42".into(),
        };
        assert!(store.find_user_by_oauth(&other).await.expect("lookup").is_none());
    }

    #[tokio::test]
    async fn updating_email_moves_the_index() {
        let store = MemoryStore::new();
        let mut user = store
            .create_user(NewUser::new("old@example.com", "Ada"))
            .await
            .expect("insert");
        user.email = "new@example.com".into();
        store.update_user(user).await.expect("update");

        assert!(store
            .find_user_by_email("old@example.com")
            .await
            .expect("lookup")
            .is_none());
        assert!(store
            .find_user_by_email("new@example.com")
            .await
            .expect("lookup")
            .is_some());
    }

    #[tokio::test]
    async fn updated_email_is_normalized_and_stays_unique() {
        let store = MemoryStore::new();
        let mut user = store
            .create_user(NewUser::new("old@example.com", "Ada"))
            .await
            .expect("insert");
        store
            .create_user(NewUser::new("taken@example.com", "Bob"))
            .await
            .expect("insert");

        user.email = "New@Example.com".into();
        let updated = store.update_user(user.clone()).await.expect("update");
        assert_eq!(updated.email, "new@example.com");
        let found = store
            .find_user_by_email("New@Example.com")
            .await
            .expect("lookup")
            .expect("present");
        assert_eq!(found.id, user.id);

        user.email = "TAKEN@example.com".into();
        let err = store.update_user(user).await.expect_err("duplicate");
        assert_eq!(err, StoreError::duplicate_email("taken@example.com"));
    }

    #[tokio::test]
    async fn sessions_are_scoped_to_their_owner_newest_first() {
        let store = MemoryStore::new();
        let alice = uuid::Uuid::new_v4();
        let bob = uuid::Uuid::new_v4();

        let first = store.create_session(alice, new_session("first")).await.expect("create");
        let second = store.create_session(alice, new_session("second")).await.expect("create");
        store.create_session(bob, new_session("bob's")).await.expect("create");

        let mut touched = first.clone();
        touched.push_message(ChatMessage::new(ChatRole::User, "make it blue"));
        store.update_session(touched).await.expect("update");

        let listed: Vec<_> = store
            .sessions_for(alice)
            .await
            .expect("list")
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(listed, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn delete_reports_whether_anything_was_removed() {
        let store = MemoryStore::new();
        let session = store
            .create_session(uuid::Uuid::new_v4(), new_session("tmp"))
            .await
            .expect("create");
        assert!(store.delete_session(session.id).await.expect("delete"));
        assert!(!store.delete_session(session.id).await.expect("delete"));

        let err = store.update_session(session.clone()).await.expect_err("gone");
        assert_eq!(err, StoreError::session_not_found(session.id));
    }
}
