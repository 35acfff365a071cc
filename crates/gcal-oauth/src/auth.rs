//! OAuth2 client for Google's token and userinfo endpoints.
//!
//! The [`AuthApi`] trait is the seam between the service and the provider:
//! the concrete [`GoogleAuthClient`] talks HTTP, while tests substitute fakes.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::BoxFuture;
use crate::config::CalendarConfig;
use crate::credential::TokenResponse;
use crate::error::{ServiceError, ServiceResult};

/// Google OAuth endpoints.
const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// The provider's OAuth2 surface as consumed by this crate.
///
/// Object-safe so the service can hold it behind a pointer; methods take
/// owned arguments and return boxed futures.
pub trait AuthApi: Send + Sync {
    /// Exchanges an authorization code for a token response.
    fn exchange_auth_code(&self, code: String) -> BoxFuture<'_, ServiceResult<TokenResponse>>;

    /// Exchanges a refresh token for a new token response.
    fn exchange_refresh_token(
        &self,
        refresh_token: String,
    ) -> BoxFuture<'_, ServiceResult<TokenResponse>>;

    /// Fetches the authorized user's profile.
    ///
    /// Requires the `email`/`profile`/`openid` scopes to have been granted.
    fn user_info(&self, access_token: String) -> BoxFuture<'_, ServiceResult<UserInfo>>;
}

/// Profile of the authorized user, from the OAuth2 userinfo endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    /// Stable Google account identifier.
    pub id: Option<String>,
    /// Primary email address.
    pub email: Option<String>,
    /// Whether the email address is verified.
    pub verified_email: Option<bool>,
    /// Full display name.
    pub name: Option<String>,
    /// Given name.
    pub given_name: Option<String>,
    /// Family name.
    pub family_name: Option<String>,
    /// Profile picture URL.
    pub picture: Option<String>,
    /// Locale code.
    pub locale: Option<String>,
}

/// Builds the consent URL for the authorization code flow.
///
/// `access_type=offline` is always requested so the provider issues a refresh
/// token; `force_approval_prompt` forces the consent screen even for a user
/// who already granted the scopes.
pub fn build_auth_url(
    client_id: &str,
    redirect_uri: &str,
    scopes: &[String],
    force_approval_prompt: bool,
) -> String {
    let scope = scopes.join(" ");
    let approval_prompt = if force_approval_prompt { "force" } else { "auto" };

    format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&\
        access_type=offline&approval_prompt={}",
        GOOGLE_AUTH_URL,
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(&scope),
        approval_prompt,
    )
}

/// HTTP client for Google's OAuth2 endpoints.
#[derive(Debug)]
pub struct GoogleAuthClient {
    http_client: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl GoogleAuthClient {
    /// Creates a new OAuth client from the service configuration.
    pub fn new(config: &CalendarConfig) -> ServiceResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                ServiceError::configuration("failed to create HTTP client").with_source(e)
            })?;

        Ok(Self {
            http_client,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
        })
    }

    /// Posts a grant request to the token endpoint and parses the response.
    async fn token_request(&self, params: &[(&str, &str)]) -> ServiceResult<TokenResponse> {
        let response = self
            .http_client
            .post(GOOGLE_TOKEN_URL)
            .form(params)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::network(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            // The token endpoint reports grant failures as an error payload
            // with a 4xx status; surface those as token exchange errors.
            return match TokenResponse::from_json(&body) {
                Err(err) if err.code() == crate::error::ServiceErrorCode::TokenExchange => Err(err),
                _ => Err(ServiceError::server(format!(
                    "token endpoint error ({status}): {body}"
                ))),
            };
        }

        TokenResponse::from_json(&body)
    }
}

impl AuthApi for GoogleAuthClient {
    fn exchange_auth_code(&self, code: String) -> BoxFuture<'_, ServiceResult<TokenResponse>> {
        Box::pin(async move {
            debug!("exchanging authorization code");
            let response = self
                .token_request(&[
                    ("client_id", self.client_id.as_str()),
                    ("client_secret", self.client_secret.as_str()),
                    ("code", code.as_str()),
                    ("grant_type", "authorization_code"),
                    ("redirect_uri", self.redirect_uri.as_str()),
                ])
                .await?;

            info!("obtained tokens for authorization code");
            Ok(response)
        })
    }

    fn exchange_refresh_token(
        &self,
        refresh_token: String,
    ) -> BoxFuture<'_, ServiceResult<TokenResponse>> {
        Box::pin(async move {
            debug!("exchanging refresh token");
            let response = self
                .token_request(&[
                    ("client_id", self.client_id.as_str()),
                    ("client_secret", self.client_secret.as_str()),
                    ("refresh_token", refresh_token.as_str()),
                    ("grant_type", "refresh_token"),
                ])
                .await?;

            info!("refreshed access token");
            Ok(response)
        })
    }

    fn user_info(&self, access_token: String) -> BoxFuture<'_, ServiceResult<UserInfo>> {
        Box::pin(async move {
            let response = self
                .http_client
                .get(GOOGLE_USERINFO_URL)
                .bearer_auth(&access_token)
                .send()
                .await
                .map_err(request_error)?;

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| ServiceError::network(format!("failed to read response: {e}")))?;

            if !status.is_success() {
                return Err(ServiceError::server(format!(
                    "userinfo error ({status}): {body}"
                )));
            }

            serde_json::from_str(&body).map_err(|e| {
                ServiceError::invalid_response(format!("failed to parse userinfo: {e}"))
            })
        })
    }
}

/// Maps a reqwest send failure to a network error.
pub(crate) fn request_error(e: reqwest::Error) -> ServiceError {
    if e.is_timeout() {
        ServiceError::network("request timeout").with_source(e)
    } else if e.is_connect() {
        ServiceError::network(format!("connection failed: {e}"))
    } else {
        ServiceError::network(format!("request failed: {e}"))
    }
}
