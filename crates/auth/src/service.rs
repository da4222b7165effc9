//! Auth service.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use common::{Principal, Role, UserId};
use notify::{Mail, Mailer};
use store::{Store, StoreError, User};
use tokio::sync::RwLock;

use crate::error::AuthError;
use crate::password::{hash_password, verify_password};
use crate::token::generate_token;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 6;

const ACCESS_TOKEN_TTL_MINUTES: i64 = 30;
const RESET_TOKEN_TTL_MINUTES: i64 = 15;

#[derive(Debug, Clone)]
struct Session {
    user_id: UserId,
    role: Role,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct ResetToken {
    user_id: UserId,
    expires_at: DateTime<Utc>,
}

/// Identity and access service.
///
/// Issues opaque bearer tokens backed by an in-process session table, and
/// single-use password-reset tokens delivered through the [`Mailer`].
/// Sessions and reset tokens are ephemeral; accounts live in the store.
#[derive(Clone)]
pub struct AuthService<S> {
    store: S,
    mailer: Arc<dyn Mailer>,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    reset_tokens: Arc<RwLock<HashMap<String, ResetToken>>>,
    /// Base URL the reset link is built from.
    reset_link_base: String,
    access_ttl: Duration,
    reset_ttl: Duration,
}

impl<S: Store> AuthService<S> {
    /// Creates a new auth service.
    pub fn new(store: S, mailer: Arc<dyn Mailer>, reset_link_base: impl Into<String>) -> Self {
        Self {
            store,
            mailer,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            reset_tokens: Arc::new(RwLock::new(HashMap::new())),
            reset_link_base: reset_link_base.into(),
            access_ttl: Duration::minutes(ACCESS_TOKEN_TTL_MINUTES),
            reset_ttl: Duration::minutes(RESET_TOKEN_TTL_MINUTES),
        }
    }

    /// Overrides both token lifetimes. Intended for tests.
    pub fn with_token_ttls(mut self, access_ttl: Duration, reset_ttl: Duration) -> Self {
        self.access_ttl = access_ttl;
        self.reset_ttl = reset_ttl;
        self
    }

    /// Registers a new customer account.
    #[tracing::instrument(skip(self, password))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::NameRequired);
        }
        if !is_valid_email(email) {
            return Err(AuthError::InvalidEmail);
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::PasswordTooShort {
                minimum: MIN_PASSWORD_LEN,
            });
        }

        let user = self
            .store
            .insert_user(User {
                id: UserId::new(),
                name: name.to_string(),
                email: email.to_string(),
                password_hash: hash_password(password),
                role: Role::Customer,
                created_at: Utc::now(),
            })
            .await
            .map_err(|e| match e {
                StoreError::EmailTaken(_) => AuthError::EmailTaken,
                other => AuthError::Store(other),
            })?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Authenticates a user and issues a bearer token.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, Role), AuthError> {
        let user = self
            .store
            .user_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        if !verify_password(password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let token = generate_token();
        self.sessions.write().await.insert(
            token.clone(),
            Session {
                user_id: user.id,
                role: user.role,
                expires_at: Utc::now() + self.access_ttl,
            },
        );

        metrics::counter!("logins").increment(1);
        tracing::info!(user_id = %user.id, "login succeeded");
        Ok((token, user.role))
    }

    /// Resolves a bearer token to a principal.
    ///
    /// Pure read against the session table; expired sessions fail without
    /// being mutated.
    pub async fn verify_token(&self, token: &str) -> Result<Principal, AuthError> {
        let sessions = self.sessions.read().await;
        let session = sessions.get(token).ok_or(AuthError::Unauthorized)?;
        if session.expires_at <= Utc::now() {
            return Err(AuthError::Unauthorized);
        }
        Ok(Principal::new(session.user_id, session.role))
    }

    /// Issues a password-reset token when the account exists.
    ///
    /// Always succeeds from the caller's point of view so that the
    /// endpoint cannot be used to enumerate accounts; the token only
    /// leaves the system through the mailer.
    #[tracing::instrument(skip(self))]
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let Some(user) = self.store.user_by_email(email).await? else {
            return Ok(());
        };

        let token = generate_token();
        self.reset_tokens.write().await.insert(
            token.clone(),
            ResetToken {
                user_id: user.id,
                expires_at: Utc::now() + self.reset_ttl,
            },
        );

        let reset_link = format!("{}/reset-password?token={token}", self.reset_link_base);
        let mail = Mail {
            to: user.email.clone(),
            subject: "Reset your password".to_string(),
            body: format!(
                "Hello {},\n\nUse the link below to choose a new password. \
                 The link expires in {RESET_TOKEN_TTL_MINUTES} minutes and works once.\n\n{reset_link}\n\n\
                 If you did not request a reset, you can ignore this message.",
                user.name
            ),
        };
        if let Err(err) = self.mailer.send(mail).await {
            tracing::warn!(error = %err, "failed to send password reset mail");
        }
        Ok(())
    }

    /// Consumes a reset token and replaces the account password.
    ///
    /// The new password is validated before the token is consumed, so a
    /// validation failure leaves the single-use token intact.
    #[tracing::instrument(skip(self, token, new_password))]
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        if new_password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::PasswordTooShort {
                minimum: MIN_PASSWORD_LEN,
            });
        }

        // Atomic consume: the token is gone whether or not it turns out to
        // be expired.
        let entry = self.reset_tokens.write().await.remove(token);
        let entry = entry.ok_or(AuthError::InvalidOrExpiredToken)?;
        if entry.expires_at <= Utc::now() {
            return Err(AuthError::InvalidOrExpiredToken);
        }

        self.store
            .update_password(entry.user_id, &hash_password(new_password))
            .await?;
        tracing::info!(user_id = %entry.user_id, "password reset");
        Ok(())
    }
}

/// Basic email shape validation: one `@`, non-empty local part, and a
/// dotted domain.
fn is_valid_email(email: &str) -> bool {
    if email.len() < 3 || email.len() > 255 {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && !domain.is_empty() && domain.contains('.') && !domain.contains('@')
}

#[cfg(test)]
mod tests {
    use notify::RecordingMailer;
    use store::InMemoryStore;

    use super::*;

    fn service() -> (AuthService<InMemoryStore>, RecordingMailer, InMemoryStore) {
        let store = InMemoryStore::new();
        let mailer = RecordingMailer::new();
        let service = AuthService::new(
            store.clone(),
            Arc::new(mailer.clone()),
            "http://localhost:3000",
        );
        (service, mailer, store)
    }

    fn reset_token_from(mail: &Mail) -> String {
        mail.body
            .split("token=")
            .nth(1)
            .expect("mail should carry a reset link")
            .trim()
            .split_whitespace()
            .next()
            .unwrap()
            .to_string()
    }

    #[test]
    fn email_shape_validation() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("user+tag@sub.example.com"));
        assert!(!is_valid_email("invalid"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user@nodot"));
    }

    #[tokio::test]
    async fn register_validates_input() {
        let (service, _, _) = service();

        assert!(matches!(
            service.register("  ", "a@example.com", "secret1").await,
            Err(AuthError::NameRequired)
        ));
        assert!(matches!(
            service.register("Jordan", "not-an-email", "secret1").await,
            Err(AuthError::InvalidEmail)
        ));
        assert!(matches!(
            service.register("Jordan", "a@example.com", "short").await,
            Err(AuthError::PasswordTooShort { minimum: 6 })
        ));
    }

    #[tokio::test]
    async fn register_assigns_customer_role_and_rejects_duplicates() {
        let (service, _, _) = service();

        let user = service
            .register("Jordan", "a@example.com", "secret1")
            .await
            .unwrap();
        assert_eq!(user.role, Role::Customer);
        assert!(verify_password("secret1", &user.password_hash));

        assert!(matches!(
            service.register("Other", "a@example.com", "secret2").await,
            Err(AuthError::EmailTaken)
        ));
    }

    #[tokio::test]
    async fn login_and_verify_roundtrip() {
        let (service, _, _) = service();
        let user = service
            .register("Jordan", "a@example.com", "secret1")
            .await
            .unwrap();

        let (token, role) = service.login("a@example.com", "secret1").await.unwrap();
        assert_eq!(role, Role::Customer);

        let principal = service.verify_token(&token).await.unwrap();
        assert_eq!(principal.user_id, user.id);
        assert_eq!(principal.role, Role::Customer);
    }

    #[tokio::test]
    async fn login_rejects_bad_credentials_uniformly() {
        let (service, _, _) = service();
        service
            .register("Jordan", "a@example.com", "secret1")
            .await
            .unwrap();

        assert!(matches!(
            service.login("a@example.com", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            service.login("nobody@example.com", "secret1").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn unknown_and_expired_tokens_are_unauthorized() {
        let (service, _, _) = service();
        assert!(matches!(
            service.verify_token("bogus").await,
            Err(AuthError::Unauthorized)
        ));

        let expiring = service.with_token_ttls(Duration::zero(), Duration::zero());
        expiring
            .register("Jordan", "a@example.com", "secret1")
            .await
            .unwrap();
        let (token, _) = expiring.login("a@example.com", "secret1").await.unwrap();
        assert!(matches!(
            expiring.verify_token(&token).await,
            Err(AuthError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn password_reset_flow_is_single_use() {
        let (service, mailer, _) = service();
        service
            .register("Jordan", "a@example.com", "secret1")
            .await
            .unwrap();

        service
            .request_password_reset("a@example.com")
            .await
            .unwrap();
        let mail = mailer.last_to("a@example.com").unwrap();
        let token = reset_token_from(&mail);

        service.reset_password(&token, "brand-new").await.unwrap();
        assert!(service.login("a@example.com", "brand-new").await.is_ok());
        assert!(matches!(
            service.login("a@example.com", "secret1").await,
            Err(AuthError::InvalidCredentials)
        ));

        // Consumed: a second use fails.
        assert!(matches!(
            service.reset_password(&token, "another-one").await,
            Err(AuthError::InvalidOrExpiredToken)
        ));
    }

    #[tokio::test]
    async fn reset_request_for_unknown_email_is_silent() {
        let (service, mailer, _) = service();
        service
            .request_password_reset("nobody@example.com")
            .await
            .unwrap();
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn short_new_password_leaves_token_intact() {
        let (service, mailer, _) = service();
        service
            .register("Jordan", "a@example.com", "secret1")
            .await
            .unwrap();
        service
            .request_password_reset("a@example.com")
            .await
            .unwrap();
        let token = reset_token_from(&mailer.last_to("a@example.com").unwrap());

        assert!(matches!(
            service.reset_password(&token, "tiny").await,
            Err(AuthError::PasswordTooShort { .. })
        ));
        // The failed attempt did not consume the token.
        service.reset_password(&token, "long-enough").await.unwrap();
    }

    #[tokio::test]
    async fn expired_reset_token_is_rejected() {
        let (service, mailer, _) = service();
        let service = service.with_token_ttls(Duration::minutes(30), Duration::zero());
        service
            .register("Jordan", "a@example.com", "secret1")
            .await
            .unwrap();
        service
            .request_password_reset("a@example.com")
            .await
            .unwrap();
        let token = reset_token_from(&mailer.last_to("a@example.com").unwrap());

        assert!(matches!(
            service.reset_password(&token, "long-enough").await,
            Err(AuthError::InvalidOrExpiredToken)
        ));
    }
}
