//! The credential refresh policy.
//!
//! [`CredentialGuard::ensure_valid`] is run before every data-bearing
//! operation: it validates the caller-supplied credential, refreshes the
//! access token when it is within the safety margin of expiry, and notifies
//! the host through [`TokenRefreshHook`] so the new values can be persisted.
//!
//! The guard holds no per-user state and no cache; every call re-evaluates
//! freshness against the credential the caller passed in.

use std::sync::Arc;

use tracing::debug;

use crate::auth::AuthApi;
use crate::credential::{Credential, RefreshedCredential, is_expiring, unix_now};
use crate::error::{ServiceError, ServiceResult};

/// Caller-supplied callback invoked synchronously whenever a refresh occurs.
///
/// The hook is responsible for persisting the refreshed credential. It runs
/// before the API call that triggered the refresh, so if the hook persists
/// successfully but that call later fails, the new token is already saved;
/// if the hook itself fails the refreshed token is lost unless the hook
/// completed persistence before failing. Hooks should be idempotent.
pub trait TokenRefreshHook: Send + Sync {
    /// Receives the original credential and the refreshed one.
    fn token_refreshed(
        &self,
        original: &Credential,
        refreshed: &RefreshedCredential,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<F> TokenRefreshHook for F
where
    F: Fn(&Credential, &RefreshedCredential) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
        + Send
        + Sync,
{
    fn token_refreshed(
        &self,
        original: &Credential,
        refreshed: &RefreshedCredential,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self(original, refreshed)
    }
}

/// Ensures outgoing API calls carry a currently valid access token.
pub struct CredentialGuard {
    auth: Arc<dyn AuthApi>,
    hook: Option<Arc<dyn TokenRefreshHook>>,
}

impl CredentialGuard {
    /// Creates a guard over the given OAuth client, with no hook.
    pub fn new(auth: Arc<dyn AuthApi>) -> Self {
        Self { auth, hook: None }
    }

    /// Sets the token-refreshed notification hook.
    pub fn with_hook(mut self, hook: Arc<dyn TokenRefreshHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Returns an access token valid for immediate use.
    ///
    /// Checks the credential's three required fields before any network I/O,
    /// then refreshes the token if `now >= expires - 30`. On refresh, the
    /// hook (if configured) is invoked before the token is returned; a hook
    /// failure propagates to the caller. The refresh exchange is attempted
    /// once, with no retry.
    pub async fn ensure_valid(&self, credential: &Credential) -> ServiceResult<String> {
        let (access_token, refresh_token, expires) = credential.require()?;

        let now = unix_now();
        if !is_expiring(expires, now) {
            return Ok(access_token.to_string());
        }

        debug!("access token expires at {}, refreshing", expires);
        let response = self
            .auth
            .exchange_refresh_token(refresh_token.to_string())
            .await?;

        let refreshed = RefreshedCredential::new(response, now);

        if let Some(hook) = &self.hook {
            hook.token_refreshed(credential, &refreshed).map_err(|e| {
                ServiceError::notification("token refresh hook failed").with_boxed_source(e)
            })?;
        }

        Ok(refreshed.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BoxFuture;
    use crate::credential::{REFRESH_MARGIN_SECS, TokenResponse};
    use crate::error::ServiceErrorCode;
    use std::sync::Mutex;

    /// Fake OAuth client recording refresh exchanges.
    struct FakeAuth {
        exchanges: Mutex<Vec<String>>,
        response: &'static str,
    }

    impl FakeAuth {
        fn new(response: &'static str) -> Self {
            Self {
                exchanges: Mutex::new(Vec::new()),
                response,
            }
        }

        fn exchange_count(&self) -> usize {
            self.exchanges.lock().unwrap().len()
        }
    }

    impl AuthApi for FakeAuth {
        fn exchange_auth_code(
            &self,
            _code: String,
        ) -> BoxFuture<'_, ServiceResult<TokenResponse>> {
            Box::pin(async { panic!("auth code exchange not expected in guard tests") })
        }

        fn exchange_refresh_token(
            &self,
            refresh_token: String,
        ) -> BoxFuture<'_, ServiceResult<TokenResponse>> {
            self.exchanges.lock().unwrap().push(refresh_token);
            let response = self.response;
            Box::pin(async move { TokenResponse::from_json(response) })
        }

        fn user_info(
            &self,
            _access_token: String,
        ) -> BoxFuture<'_, ServiceResult<crate::auth::UserInfo>> {
            Box::pin(async { panic!("userinfo not expected in guard tests") })
        }
    }

    const REFRESH_OK: &str =
        r#"{"access_token": "new-token", "expires_in": 3600, "scope": "email", "token_type": "Bearer"}"#;

    fn fresh_credential() -> Credential {
        Credential::new("old-token", "refresh-1", unix_now() + 3600)
    }

    fn stale_credential() -> Credential {
        Credential::new("old-token", "refresh-1", unix_now() + REFRESH_MARGIN_SECS - 5)
    }

    #[tokio::test]
    async fn fresh_token_is_used_unchanged() {
        let auth = Arc::new(FakeAuth::new(REFRESH_OK));
        let guard = CredentialGuard::new(auth.clone());

        let token = guard.ensure_valid(&fresh_credential()).await.unwrap();
        assert_eq!(token, "old-token");
        assert_eq!(auth.exchange_count(), 0);
    }

    #[tokio::test]
    async fn stale_token_triggers_exactly_one_exchange() {
        let auth = Arc::new(FakeAuth::new(REFRESH_OK));
        let guard = CredentialGuard::new(auth.clone());

        let token = guard.ensure_valid(&stale_credential()).await.unwrap();
        assert_eq!(token, "new-token");
        assert_eq!(auth.exchange_count(), 1);
        assert_eq!(auth.exchanges.lock().unwrap()[0], "refresh-1");
    }

    #[tokio::test]
    async fn missing_field_fails_before_any_exchange() {
        let auth = Arc::new(FakeAuth::new(REFRESH_OK));
        let guard = CredentialGuard::new(auth.clone());

        let credential = Credential {
            access_token: Some("a".into()),
            refresh_token: None,
            expires: Some(0),
        };

        let err = guard.ensure_valid(&credential).await.unwrap_err();
        assert_eq!(err.code(), ServiceErrorCode::Precondition);
        assert!(err.message().contains("refresh_token"));
        assert_eq!(auth.exchange_count(), 0);
    }

    #[tokio::test]
    async fn hook_receives_original_and_refreshed() {
        let auth = Arc::new(FakeAuth::new(REFRESH_OK));
        let seen: Arc<Mutex<Vec<(Credential, RefreshedCredential)>>> =
            Arc::new(Mutex::new(Vec::new()));

        let seen_in_hook = seen.clone();
        let hook = move |original: &Credential,
                         refreshed: &RefreshedCredential|
              -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            seen_in_hook
                .lock()
                .unwrap()
                .push((original.clone(), refreshed.clone()));
            Ok(())
        };

        let before = unix_now();
        let guard = CredentialGuard::new(auth).with_hook(Arc::new(hook));
        guard.ensure_valid(&stale_credential()).await.unwrap();
        let after = unix_now();

        let calls = seen.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (original, refreshed) = &calls[0];
        assert_eq!(original.access_token.as_deref(), Some("old-token"));
        assert_eq!(refreshed.access_token, "new-token");
        assert_eq!(refreshed.expires_in, 3600);
        // expires is now + expires_in for the now sampled inside the guard.
        assert!(refreshed.expires >= before + 3600 && refreshed.expires <= after + 3600);
        assert_eq!(
            refreshed.extra.get("scope").and_then(|v| v.as_str()),
            Some("email")
        );
    }

    #[tokio::test]
    async fn hook_is_not_invoked_without_refresh() {
        let auth = Arc::new(FakeAuth::new(REFRESH_OK));
        let count = Arc::new(Mutex::new(0usize));

        let count_in_hook = count.clone();
        let hook = move |_: &Credential,
                         _: &RefreshedCredential|
              -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            *count_in_hook.lock().unwrap() += 1;
            Ok(())
        };

        let guard = CredentialGuard::new(auth).with_hook(Arc::new(hook));
        guard.ensure_valid(&fresh_credential()).await.unwrap();
        assert_eq!(*count.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn hook_failure_propagates() {
        let auth = Arc::new(FakeAuth::new(REFRESH_OK));
        let hook = |_: &Credential, _: &RefreshedCredential| {
            Err::<(), Box<dyn std::error::Error + Send + Sync>>(
                std::io::Error::other("persist failed").into(),
            )
        };

        let guard = CredentialGuard::new(auth).with_hook(Arc::new(hook));
        let err = guard.ensure_valid(&stale_credential()).await.unwrap_err();
        assert_eq!(err.code(), ServiceErrorCode::Notification);
    }

    #[tokio::test]
    async fn failed_exchange_propagates_without_retry() {
        let auth = Arc::new(FakeAuth::new(
            r#"{"error": "invalid_grant", "error_description": "Token has been revoked."}"#,
        ));
        let guard = CredentialGuard::new(auth.clone());

        let err = guard.ensure_valid(&stale_credential()).await.unwrap_err();
        assert_eq!(err.code(), ServiceErrorCode::TokenExchange);
        assert!(err.message().contains("invalid_grant"));
        assert_eq!(auth.exchange_count(), 1);
    }
}
