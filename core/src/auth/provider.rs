//! Token provider
//! Owns the active session. Silent acquisition never fails loudly; interactive login does.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::session::{Account, AuthSession, SessionStore};
use super::AuthError;

/// Primitives the identity provider has to offer
#[async_trait]
pub trait IdentityClient: Send + Sync {
    /// Renew the session's access token without user interaction
    async fn acquire_token_silent(&self, session: &AuthSession) -> Result<AuthSession, AuthError>;

    /// Sign a user in interactively
    async fn login_interactive(&self) -> Result<AuthSession, AuthError>;
}

pub struct TokenProvider<C> {
    client: C,
    session: RwLock<Option<AuthSession>>,
    store: Option<SessionStore>,
}

impl<C: IdentityClient> TokenProvider<C> {
    /// Provider without persistence; starts signed out
    pub fn new(client: C) -> Self {
        Self {
            client,
            session: RwLock::new(None),
            store: None,
        }
    }

    /// Provider backed by a session file. An unreadable file means "signed out".
    pub fn with_store(client: C, store: SessionStore) -> Self {
        let session = match store.load() {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Ignoring unreadable session file {:?}: {}", store.path(), e);
                None
            }
        };
        Self {
            client,
            session: RwLock::new(session),
            store: Some(store),
        }
    }

    pub async fn active_account(&self) -> Option<Account> {
        self.session.read().await.as_ref().map(|s| s.account.clone())
    }

    /// Current bearer token, or `None` when not authenticated or renewal failed
    pub async fn get_access_token(&self) -> Option<String> {
        let current = self.session.read().await.clone()?;
        if current.is_fresh() {
            return Some(current.access_token);
        }

        tracing::debug!("Token for {} expiring soon, refreshing...", current.account.username);
        match self.client.acquire_token_silent(&current).await {
            Ok(refreshed) => {
                let token = refreshed.access_token.clone();
                let mut guard = self.session.write().await;
                // a logout or account switch while refreshing wins
                let same_account = guard
                    .as_ref()
                    .is_some_and(|s| s.account.home_account_id == current.account.home_account_id);
                if !same_account {
                    return None;
                }
                self.persist(&refreshed);
                *guard = Some(refreshed);
                Some(token)
            }
            Err(e) => {
                tracing::warn!("Silent token acquisition failed for {}: {}", current.account.username, e);
                None
            }
        }
    }

    /// Interactive sign-in; the new identity becomes the active one
    pub async fn login(&self) -> Result<Account, AuthError> {
        let session = self.client.login_interactive().await?;
        let account = session.account.clone();
        self.persist(&session);
        *self.session.write().await = Some(session);
        Ok(account)
    }

    pub async fn logout(&self) {
        let previous = self.session.write().await.take();
        if let Some(store) = &self.store {
            if let Err(e) = store.clear() {
                tracing::warn!("Failed to remove session file: {}", e);
            }
        }
        if let Some(session) = previous {
            tracing::info!("Signed out {}", session.account.username);
        }
    }

    fn persist(&self, session: &AuthSession) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save(session) {
                tracing::warn!("Failed to save session: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeIdentity {
        login_result: Mutex<Option<Result<AuthSession, AuthError>>>,
        refresh_ok: bool,
        silent_calls: AtomicUsize,
    }

    #[async_trait]
    impl IdentityClient for FakeIdentity {
        async fn acquire_token_silent(&self, session: &AuthSession) -> Result<AuthSession, AuthError> {
            self.silent_calls.fetch_add(1, Ordering::SeqCst);
            if self.refresh_ok {
                Ok(AuthSession::new(session.account.clone(), "renewed".to_string(), None, 3600))
            } else {
                Err(AuthError::Rejected {
                    error: "invalid_grant".to_string(),
                    description: "consent required".to_string(),
                })
            }
        }

        async fn login_interactive(&self) -> Result<AuthSession, AuthError> {
            self.login_result
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Err(AuthError::Expired))
        }
    }

    fn account(id: &str) -> Account {
        Account {
            home_account_id: id.to_string(),
            username: format!("{}@example.com", id),
            name: None,
        }
    }

    fn session(id: &str, token: &str, expires_in: i64) -> AuthSession {
        AuthSession::new(account(id), token.to_string(), Some("refresh".to_string()), expires_in)
    }

    #[tokio::test]
    async fn no_session_means_no_token() {
        let provider = TokenProvider::new(FakeIdentity::default());
        assert_eq!(provider.get_access_token().await, None);
        assert_eq!(provider.client.silent_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn login_activates_account_for_later_calls() {
        let identity = FakeIdentity::default();
        *identity.login_result.lock().unwrap() = Some(Ok(session("ada", "fresh-token", 3600)));
        let provider = TokenProvider::new(identity);

        let account = provider.login().await.unwrap();
        assert_eq!(account.home_account_id, "ada");
        assert_eq!(provider.active_account().await, Some(account));
        assert_eq!(provider.get_access_token().await.as_deref(), Some("fresh-token"));
        // still fresh, no renewal needed
        assert_eq!(provider.client.silent_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_login_propagates_and_keeps_state() {
        let provider = TokenProvider::new(FakeIdentity::default());
        assert!(matches!(provider.login().await, Err(AuthError::Expired)));
        assert!(provider.active_account().await.is_none());
    }

    #[tokio::test]
    async fn expired_token_is_renewed_silently() {
        let identity = FakeIdentity { refresh_ok: true, ..Default::default() };
        *identity.login_result.lock().unwrap() = Some(Ok(session("ada", "stale", 10)));
        let provider = TokenProvider::new(identity);
        provider.login().await.unwrap();

        assert_eq!(provider.get_access_token().await.as_deref(), Some("renewed"));
        assert_eq!(provider.client.silent_calls.load(Ordering::SeqCst), 1);
        // renewed token is cached
        assert_eq!(provider.get_access_token().await.as_deref(), Some("renewed"));
        assert_eq!(provider.client.silent_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn renewal_failure_collapses_to_none() {
        let identity = FakeIdentity::default();
        *identity.login_result.lock().unwrap() = Some(Ok(session("ada", "stale", 10)));
        let provider = TokenProvider::new(identity);
        provider.login().await.unwrap();

        assert_eq!(provider.get_access_token().await, None);
        // session kept so a later renewal can still succeed
        assert!(provider.active_account().await.is_some());
    }

    #[tokio::test]
    async fn store_round_trip_and_logout() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));

        let identity = FakeIdentity::default();
        *identity.login_result.lock().unwrap() = Some(Ok(session("ada", "persisted", 3600)));
        let provider = TokenProvider::with_store(identity, store.clone());
        provider.login().await.unwrap();

        let reopened = TokenProvider::with_store(FakeIdentity::default(), store.clone());
        assert_eq!(reopened.get_access_token().await.as_deref(), Some("persisted"));

        reopened.logout().await;
        assert!(reopened.active_account().await.is_none());
        assert!(store.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn unreadable_store_starts_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "garbage").unwrap();
        let provider = TokenProvider::with_store(FakeIdentity::default(), SessionStore::new(path));
        assert_eq!(provider.get_access_token().await, None);
    }
}
