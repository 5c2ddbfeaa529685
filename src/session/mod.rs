//! Session service: login, registration, token refresh and password reset.
//!
//! This is the only place that mutates identity state or mints tokens. The
//! request gate only ever verifies tokens; everything that creates or renews a
//! session goes through [`SessionService`].

pub mod notify;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use url::Url;

use crate::db::{Database, Identity, Role, UserStore};
use crate::jwt::{TokenCodec, TokenError};
use crate::password;
use crate::rpc::customer::CustomerClient;
use crate::rpc::{CallContext, ClientRequest};

pub use notify::{HttpResetMailer, NotifyError, ResetMailer};

/// Tokens and effective role returned by every successful identity operation.
#[derive(Debug, Clone, Serialize)]
pub struct AuthOutcome {
    pub access_token: String,
    pub refresh_token: String,
    pub role: Role,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid login or password")]
    InvalidCredentials,
    #[error("user not found")]
    NotFound,
    #[error("user already exists")]
    AlreadyExists,
    #[error("user is archived")]
    Archived,
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("downstream call failed: {0}")]
    Downstream(String),
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("failed to sign tokens: {0}")]
    Signing(TokenError),
}

impl SessionError {
    /// Failures of the gateway itself rather than of the caller's request.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            SessionError::Storage(_) | SessionError::Hashing(_) | SessionError::Signing(_)
        )
    }
}

pub struct SessionService {
    db: Database,
    tokens: Arc<TokenCodec>,
    customers: CustomerClient,
    mailer: Arc<dyn ResetMailer>,
    reset_link_base: Url,
}

impl SessionService {
    pub fn new(
        db: Database,
        tokens: Arc<TokenCodec>,
        customers: CustomerClient,
        mailer: Arc<dyn ResetMailer>,
        reset_link_base: Url,
    ) -> Self {
        Self {
            db,
            tokens,
            customers,
            mailer,
            reset_link_base,
        }
    }

    /// Log in (`is_registration == false`) or sign up a new client.
    pub async fn authenticate(
        &self,
        login: &str,
        password: &str,
        is_registration: bool,
    ) -> Result<AuthOutcome, SessionError> {
        let existing = self.db.users().get_by_login(login).await?;

        let (id, role) = if is_registration {
            if existing.is_some() {
                return Err(SessionError::AlreadyExists);
            }
            let id = self.register(login, password).await?;
            info!(user_id = id, "Registered new client");
            (id, Role::Client)
        } else {
            // Unknown login and wrong password look the same to the caller.
            let identity = existing.ok_or(SessionError::InvalidCredentials)?;
            if identity.is_archived {
                return Err(SessionError::Archived);
            }
            if !check_password(&identity.password_hash, password).await? {
                return Err(SessionError::InvalidCredentials);
            }
            (identity.id, identity.role)
        };

        self.mint(id, role)
    }

    async fn register(&self, login: &str, password: &str) -> Result<i64, SessionError> {
        let hash = hash_password(password).await?;

        let users = self.db.users();
        let id = match users.create(login, &hash, Role::Client).await {
            Ok(id) => id,
            Err(e) if UserStore::is_unique_violation(&e) => {
                return Err(SessionError::AlreadyExists);
            }
            Err(e) => return Err(e.into()),
        };

        let profile = ClientRequest {
            user_id: Some(id),
            email: Some(login.to_string()),
            ..Default::default()
        };
        if let Err(e) = self
            .customers
            .register_client(&CallContext::for_user(id), &profile)
            .await
        {
            warn!(user_id = id, error = %e, "Client profile registration failed, removing identity");
            if let Err(del) = users.delete(id).await {
                error!(user_id = id, error = %del, "Failed to remove identity after registration failure");
            }
            return Err(SessionError::Downstream(e.to_string()));
        }

        Ok(id)
    }

    /// Exchange a refresh token for a new pair. The stored role always wins.
    ///
    /// An archived subject answers the same as a missing one.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthOutcome, SessionError> {
        let verified = self.tokens.verify_refresh(refresh_token)?;

        let identity = self
            .db
            .users()
            .get_by_id(verified.subject)
            .await?
            .filter(|identity| !identity.is_archived)
            .ok_or(SessionError::NotFound)?;

        if verified.role != identity.role {
            warn!(
                user_id = identity.id,
                token_role = %verified.role,
                stored_role = %identity.role,
                "Role in refresh token differs from stored role"
            );
        }

        self.mint(identity.id, identity.role)
    }

    /// Send a reset link for `login` to the notification service.
    pub async fn request_password_reset(&self, login: &str) -> Result<(), SessionError> {
        self.active_identity(login).await?;

        let link = self.reset_link(login);
        self.mailer
            .send_reset_link(login, link.as_str())
            .await
            .map_err(|e| SessionError::Downstream(e.to_string()))?;

        info!("Password reset link dispatched");
        Ok(())
    }

    /// Replace the credential of `login`.
    pub async fn reset_password(&self, login: &str, new_password: &str) -> Result<(), SessionError> {
        self.active_identity(login).await?;

        let hash = hash_password(new_password).await?;
        if !self.db.users().update_password(login, &hash).await? {
            return Err(SessionError::NotFound);
        }
        Ok(())
    }

    /// `<reset_link_base>?token=<base64(login)>`
    pub fn reset_link(&self, login: &str) -> Url {
        let mut link = self.reset_link_base.clone();
        link.query_pairs_mut()
            .append_pair("token", &BASE64.encode(login));
        link
    }

    async fn active_identity(&self, login: &str) -> Result<Identity, SessionError> {
        let identity = self
            .db
            .users()
            .get_by_login(login)
            .await?
            .ok_or(SessionError::NotFound)?;
        if identity.is_archived {
            return Err(SessionError::Archived);
        }
        Ok(identity)
    }

    fn mint(&self, id: i64, role: Role) -> Result<AuthOutcome, SessionError> {
        let pair = self.tokens.issue(id, role).map_err(SessionError::Signing)?;
        Ok(AuthOutcome {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            role,
        })
    }
}

// Argon2 runs on the blocking pool.
async fn hash_password(password: &str) -> Result<String, SessionError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|e| SessionError::Hashing(e.to_string()))?
        .map_err(SessionError::Hashing)
}

async fn check_password(stored_hash: &str, password: &str) -> Result<bool, SessionError> {
    let stored_hash = stored_hash.to_string();
    let password = password.to_string();
    tokio::task::spawn_blocking(move || password::verify_password(&stored_hash, &password))
        .await
        .map_err(|e| SessionError::Hashing(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::{DEFAULT_ACCESS_TOKEN_DURATION_SECS, TokenKind};
    use crate::rpc::{RpcChannel, RpcError, RpcResult};
    use async_trait::async_trait;
    use std::sync::Mutex;

    const SECRET: &[u8] = b"session-test-secret-0123456789abcdef";

    #[derive(Default)]
    struct FakeChannel {
        fail: bool,
        calls: Mutex<Vec<(CallContext, String, serde_json::Value)>>,
    }

    #[async_trait]
    impl RpcChannel for FakeChannel {
        async fn unary(
            &self,
            ctx: &CallContext,
            method: &str,
            payload: Vec<u8>,
        ) -> RpcResult<Vec<u8>> {
            let body = serde_json::from_slice(&payload).unwrap();
            self.calls
                .lock()
                .unwrap()
                .push((*ctx, method.to_string(), body));
            if self.fail {
                return Err(RpcError::Unavailable("connection refused".into()));
            }
            Ok(b"{}".to_vec())
        }
    }

    #[derive(Default)]
    struct FakeMailer {
        fail: bool,
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl ResetMailer for FakeMailer {
        async fn send_reset_link(&self, login: &str, link: &str) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::Rejected(500));
            }
            self.sent
                .lock()
                .unwrap()
                .push((login.to_string(), link.to_string()));
            Ok(())
        }
    }

    struct Fixture {
        service: SessionService,
        db: Database,
        tokens: Arc<TokenCodec>,
        channel: Arc<FakeChannel>,
        mailer: Arc<FakeMailer>,
    }

    async fn fixture_with(channel: FakeChannel, mailer: FakeMailer) -> Fixture {
        let db = Database::open(":memory:").await.unwrap();
        let tokens = Arc::new(TokenCodec::new(SECRET, DEFAULT_ACCESS_TOKEN_DURATION_SECS));
        let channel = Arc::new(channel);
        let mailer = Arc::new(mailer);
        let service = SessionService::new(
            db.clone(),
            tokens.clone(),
            CustomerClient::new(channel.clone()),
            mailer.clone(),
            Url::parse("http://front.test/reset").unwrap(),
        );
        Fixture {
            service,
            db,
            tokens,
            channel,
            mailer,
        }
    }

    async fn fixture() -> Fixture {
        fixture_with(FakeChannel::default(), FakeMailer::default()).await
    }

    #[tokio::test]
    async fn test_register_then_login_scenario() {
        let f = fixture().await;

        let registered = f.service.authenticate("a@x.com", "P@ss1", true).await.unwrap();
        assert_eq!(registered.role, Role::Client);
        let subject = f.tokens.verify_access(&registered.access_token).unwrap().subject;

        assert!(matches!(
            f.service.authenticate("a@x.com", "wrong", false).await,
            Err(SessionError::InvalidCredentials)
        ));

        let logged_in = f.service.authenticate("a@x.com", "P@ss1", false).await.unwrap();
        let verified = f.tokens.verify_access(&logged_in.access_token).unwrap();
        assert_eq!(verified.subject, subject);
        assert_eq!(verified.role, Role::Client);

        f.service.reset_password("a@x.com", "P@ss2").await.unwrap();
        assert!(matches!(
            f.service.authenticate("a@x.com", "P@ss1", false).await,
            Err(SessionError::InvalidCredentials)
        ));
        f.service.authenticate("a@x.com", "P@ss2", false).await.unwrap();
    }

    #[tokio::test]
    async fn test_second_registration_fails() {
        let f = fixture().await;

        f.service.authenticate("dup@x.com", "one", true).await.unwrap();

        assert!(matches!(
            f.service.authenticate("dup@x.com", "two", true).await,
            Err(SessionError::AlreadyExists)
        ));
        assert_eq!(f.channel.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_registration_calls_customer_backend() {
        let f = fixture().await;

        let outcome = f.service.authenticate("new@x.com", "pw", true).await.unwrap();
        let id = f.tokens.verify_access(&outcome.access_token).unwrap().subject;

        let calls = f.channel.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (ctx, method, body) = &calls[0];
        assert_eq!(ctx.user_id, Some(id));
        assert_eq!(method, "/api.client.ClientService/RegisterClient");
        assert_eq!(body["email"], "new@x.com");
        assert_eq!(body["user_id"], id);
    }

    #[tokio::test]
    async fn test_failed_profile_registration_removes_identity() {
        let f = fixture_with(
            FakeChannel {
                fail: true,
                ..Default::default()
            },
            FakeMailer::default(),
        )
        .await;

        assert!(matches!(
            f.service.authenticate("b@x.com", "pw", true).await,
            Err(SessionError::Downstream(_))
        ));
        assert!(f.db.users().get_by_login("b@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_login_looks_like_wrong_password() {
        let f = fixture().await;

        assert!(matches!(
            f.service.authenticate("nobody@x.com", "pw", false).await,
            Err(SessionError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_archived_identity_cannot_login_or_refresh() {
        let f = fixture().await;
        let outcome = f.service.authenticate("c@x.com", "pw", true).await.unwrap();
        let id = f.tokens.verify_refresh(&outcome.refresh_token).unwrap().subject;

        f.db.users().set_archived(id, true).await.unwrap();

        assert!(matches!(
            f.service.authenticate("c@x.com", "pw", false).await,
            Err(SessionError::Archived)
        ));
        assert!(matches!(
            f.service.authenticate("c@x.com", "wrong", false).await,
            Err(SessionError::Archived)
        ));
        assert!(matches!(
            f.service.refresh(&outcome.refresh_token).await,
            Err(SessionError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_refresh_archived_matches_missing_subject() {
        let f = fixture().await;
        let outcome = f.service.authenticate("arch@x.com", "pw", true).await.unwrap();
        let id = f.tokens.verify_refresh(&outcome.refresh_token).unwrap().subject;
        f.db.users().set_archived(id, true).await.unwrap();

        let orphan = f.tokens.issue(9999, Role::Client).unwrap();
        let archived = f.service.refresh(&outcome.refresh_token).await.unwrap_err();
        let missing = f.service.refresh(&orphan.refresh_token).await.unwrap_err();

        assert_eq!(archived.to_string(), missing.to_string());
    }

    #[tokio::test]
    async fn test_refresh_reissues_pair() {
        let f = fixture().await;
        let first = f.service.authenticate("d@x.com", "pw", true).await.unwrap();

        let second = f.service.refresh(&first.refresh_token).await.unwrap();

        assert_ne!(first.access_token, second.access_token);
        assert_ne!(first.refresh_token, second.refresh_token);
        let a = f.tokens.verify_access(&first.access_token).unwrap();
        let b = f.tokens.verify_access(&second.access_token).unwrap();
        assert_eq!(a.subject, b.subject);
        assert_eq!(
            f.tokens.verify(&second.refresh_token).unwrap().kind,
            TokenKind::Refresh
        );
    }

    #[tokio::test]
    async fn test_refresh_uses_stored_role() {
        let f = fixture().await;
        let outcome = f.service.authenticate("e@x.com", "pw", true).await.unwrap();
        let id = f.tokens.verify_refresh(&outcome.refresh_token).unwrap().subject;

        f.db.users().set_role(id, Role::Manager).await.unwrap();
        let refreshed = f.service.refresh(&outcome.refresh_token).await.unwrap();

        assert_eq!(refreshed.role, Role::Manager);
        assert_eq!(
            f.tokens.verify_access(&refreshed.access_token).unwrap().role,
            Role::Manager
        );
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token_and_unknown_subject() {
        let f = fixture().await;
        let outcome = f.service.authenticate("f@x.com", "pw", true).await.unwrap();

        assert!(matches!(
            f.service.refresh(&outcome.access_token).await,
            Err(SessionError::Token(TokenError::WrongKind))
        ));

        let orphan = f.tokens.issue(9999, Role::Admin).unwrap();
        assert!(matches!(
            f.service.refresh(&orphan.refresh_token).await,
            Err(SessionError::NotFound)
        ));

        let foreign = TokenCodec::new(b"another-secret-another-secret-xx", 60)
            .issue(1, Role::Client)
            .unwrap();
        assert!(matches!(
            f.service.refresh(&foreign.refresh_token).await,
            Err(SessionError::Token(TokenError::InvalidSignature))
        ));
    }

    #[tokio::test]
    async fn test_password_reset_request_sends_link() {
        let f = fixture().await;
        f.service.authenticate("a@x.com", "pw", true).await.unwrap();

        f.service.request_password_reset("a@x.com").await.unwrap();

        let sent = f.mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "a@x.com");
        assert_eq!(sent[0].1, "http://front.test/reset?token=YUB4LmNvbQ%3D%3D");
    }

    #[tokio::test]
    async fn test_password_reset_request_errors() {
        let f = fixture_with(
            FakeChannel::default(),
            FakeMailer {
                fail: true,
                ..Default::default()
            },
        )
        .await;

        assert!(matches!(
            f.service.request_password_reset("missing@x.com").await,
            Err(SessionError::NotFound)
        ));

        f.service.authenticate("g@x.com", "pw", true).await.unwrap();
        assert!(matches!(
            f.service.request_password_reset("g@x.com").await,
            Err(SessionError::Downstream(_))
        ));
    }

    #[tokio::test]
    async fn test_reset_password_rejects_missing_and_archived() {
        let f = fixture().await;

        assert!(matches!(
            f.service.reset_password("missing@x.com", "pw").await,
            Err(SessionError::NotFound)
        ));

        let outcome = f.service.authenticate("h@x.com", "pw", true).await.unwrap();
        let id = f.tokens.verify_access(&outcome.access_token).unwrap().subject;
        f.db.users().set_archived(id, true).await.unwrap();

        assert!(matches!(
            f.service.reset_password("h@x.com", "new").await,
            Err(SessionError::Archived)
        ));
    }

    #[test]
    fn test_internal_errors() {
        assert!(SessionError::Hashing("x".into()).is_internal());
        assert!(SessionError::Signing(TokenError::TimeError).is_internal());
        assert!(!SessionError::InvalidCredentials.is_internal());
        assert!(!SessionError::Downstream("x".into()).is_internal());
        assert!(!SessionError::Token(TokenError::Expired).is_internal());
    }
}
