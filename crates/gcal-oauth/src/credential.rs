//! Credential types and the token staleness rule.
//!
//! A [`Credential`] is owned by the host application and passed in on every
//! call; this crate never mutates it. When a refresh occurs, the new values
//! are handed back as a [`RefreshedCredential`] through the notification hook
//! and persistence stays with the caller.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ServiceError, ServiceResult};

/// Safety margin, in seconds, subtracted from the expiry timestamp when
/// deciding staleness. Absorbs clock skew and the round trip between the
/// freshness check and the actual request.
pub const REFRESH_MARGIN_SECS: i64 = 30;

/// Returns true if an access token expiring at `expires` (Unix seconds) must
/// be refreshed before use at wall-clock time `now`.
pub fn is_expiring(expires: i64, now: i64) -> bool {
    now >= expires - REFRESH_MARGIN_SECS
}

/// A stored user credential for the calendar provider.
///
/// All three fields must be present before any API call is attempted; a
/// missing field is a precondition violation, not a runtime error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credential {
    /// Bearer token for calendar API calls.
    pub access_token: Option<String>,
    /// Token used to mint new access tokens.
    pub refresh_token: Option<String>,
    /// Absolute Unix timestamp (seconds) after which `access_token` is stale.
    pub expires: Option<i64>,
}

impl Credential {
    /// Creates a credential from its three parts.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires: i64,
    ) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token: Some(refresh_token.into()),
            expires: Some(expires),
        }
    }

    /// Builds a credential from a token endpoint response, computing the
    /// absolute expiry from the relative `expires_in`.
    pub fn from_token_response(response: &TokenResponse, now: i64) -> Self {
        Self {
            access_token: Some(response.access_token.clone()),
            refresh_token: response.refresh_token.clone(),
            expires: Some(now + response.expires_in),
        }
    }

    /// Returns the three required fields, or a precondition error naming the
    /// first missing one.
    pub fn require(&self) -> ServiceResult<(&str, &str, i64)> {
        let access_token = self
            .access_token
            .as_deref()
            .ok_or_else(|| ServiceError::missing_field("access_token"))?;
        let refresh_token = self
            .refresh_token
            .as_deref()
            .ok_or_else(|| ServiceError::missing_field("refresh_token"))?;
        let expires = self
            .expires
            .ok_or_else(|| ServiceError::missing_field("expires"))?;
        Ok((access_token, refresh_token, expires))
    }
}

/// A parsed response from the provider's token endpoint.
///
/// Provider fields beyond the three this crate interprets are preserved
/// verbatim in `extra` so the notification hook sees the full payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The new bearer token.
    pub access_token: String,
    /// A new refresh token. Google omits this on refresh exchanges.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Seconds until `access_token` expires, relative to issuance.
    pub expires_in: i64,
    /// Remaining provider fields (`scope`, `token_type`, `id_token`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenResponse {
    /// Parses a token endpoint body.
    ///
    /// A payload containing an `error` key becomes a token exchange error
    /// echoing every key/value pair for diagnostics. A payload missing
    /// `access_token` or `expires_in` is an invalid response.
    pub fn from_json(body: &str) -> ServiceResult<Self> {
        let value: Value = serde_json::from_str(body).map_err(|e| {
            ServiceError::invalid_response(format!("failed to parse token response: {e}"))
        })?;

        if let Some(object) = value.as_object()
            && object.contains_key("error")
        {
            return Err(ServiceError::token_exchange(format!(
                "token endpoint returned an error: {}",
                format_pairs(object)
            )));
        }

        serde_json::from_value(value).map_err(|e| {
            ServiceError::invalid_response(format!("invalid token response: {e}"))
        })
    }
}

/// The credential produced by a refresh exchange, as delivered to the
/// token-refreshed notification hook.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshedCredential {
    /// The new bearer token.
    pub access_token: String,
    /// A new refresh token, when the provider issued one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Seconds-to-live from the exchange response.
    pub expires_in: i64,
    /// Computed absolute expiry: exchange time plus `expires_in`.
    pub expires: i64,
    /// Remaining provider fields from the exchange response.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RefreshedCredential {
    /// Attaches an absolute expiry to a token endpoint response.
    pub fn new(response: TokenResponse, now: i64) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_in: response.expires_in,
            expires: now + response.expires_in,
            extra: response.extra,
        }
    }
}

/// Formats a JSON object as `key: value, ...` pairs for error messages.
fn format_pairs(object: &Map<String, Value>) -> String {
    object
        .iter()
        .map(|(key, value)| match value {
            Value::String(s) => format!("{key}: {s}"),
            other => format!("{key}: {other}"),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Returns the current wall-clock time as Unix seconds.
pub(crate) fn unix_now() -> i64 {
    Utc::now().timestamp()
}
