//! Service configuration.
//!
//! Configuration is an explicit struct handed to [`CalendarService::new`]
//! rather than ambient process-wide state; business logic never reads the
//! environment itself.
//!
//! [`CalendarService::new`]: crate::service::CalendarService::new

use std::env;
use std::time::Duration;

use crate::error::{ServiceError, ServiceResult};

/// Environment variable holding the OAuth client ID.
pub const ENV_CLIENT_ID: &str = "GOOGLE_CALENDAR_CLIENT_ID";
/// Environment variable holding the OAuth client secret.
pub const ENV_CLIENT_SECRET: &str = "GOOGLE_CALENDAR_CLIENT_SECRET";
/// Environment variable holding the OAuth redirect URL.
pub const ENV_REDIRECT_URL: &str = "GOOGLE_CALENDAR_OAUTH_REDIRECT_URL";

/// Configuration for the calendar service.
#[derive(Debug, Clone)]
pub struct CalendarConfig {
    /// OAuth 2.0 client ID from the Google Cloud Console.
    pub client_id: String,

    /// OAuth 2.0 client secret from the Google Cloud Console.
    pub client_secret: String,

    /// Redirect URI registered for the OAuth flow. Used as the default for
    /// consent-URL generation and for the code exchange.
    pub redirect_uri: String,

    /// OAuth scopes to request, in order.
    pub scopes: Vec<String>,

    /// Calendar the event operations target.
    ///
    /// Defaults to `"primary"`.
    pub calendar_id: String,

    /// Request timeout for provider calls.
    pub timeout: Duration,

    /// User agent string for API requests.
    pub user_agent: String,
}

impl CalendarConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Default OAuth scopes: identity plus calendar event access.
    pub const DEFAULT_SCOPES: [&'static str; 3] = [
        "profile",
        "email",
        "https://www.googleapis.com/auth/calendar.events",
    ];

    /// Creates a configuration with the given client credentials and
    /// redirect URI, using default scopes and the primary calendar.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            scopes: Self::DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            calendar_id: "primary".to_string(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("gcal-oauth/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Loads the client credentials and redirect URI from the
    /// `GOOGLE_CALENDAR_*` environment variables.
    pub fn from_env() -> ServiceResult<Self> {
        let client_id = env::var(ENV_CLIENT_ID)
            .map_err(|_| ServiceError::configuration(format!("{ENV_CLIENT_ID} is not set")))?;
        let client_secret = env::var(ENV_CLIENT_SECRET)
            .map_err(|_| ServiceError::configuration(format!("{ENV_CLIENT_SECRET} is not set")))?;
        let redirect_uri = env::var(ENV_REDIRECT_URL)
            .map_err(|_| ServiceError::configuration(format!("{ENV_REDIRECT_URL} is not set")))?;

        Ok(Self::new(client_id, client_secret, redirect_uri))
    }

    /// Sets the OAuth scopes.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Sets the calendar the event operations target.
    pub fn with_calendar_id(mut self, id: impl Into<String>) -> Self {
        self.calendar_id = id.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ServiceResult<()> {
        if self.client_id.is_empty() {
            return Err(ServiceError::configuration("client_id is required"));
        }
        if self.client_secret.is_empty() {
            return Err(ServiceError::configuration("client_secret is required"));
        }
        if self.scopes.is_empty() {
            return Err(ServiceError::configuration(
                "at least one OAuth scope is required",
            ));
        }
        if self.calendar_id.is_empty() {
            return Err(ServiceError::configuration("calendar_id is required"));
        }
        Ok(())
    }
}
