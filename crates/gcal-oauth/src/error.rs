//! Error types for the Google OAuth / Calendar integration.
//!
//! Every fallible operation in this crate returns [`ServiceError`], a single
//! error type carrying a [`ServiceErrorCode`] classification, a message, and
//! an optional source error.

use std::fmt;
use thiserror::Error;

/// The category of a service error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceErrorCode {
    /// A credential was missing a required field. Raised before any network
    /// I/O is attempted.
    Precondition,
    /// The provider's token endpoint returned an error payload. The message
    /// echoes the provider's raw key/value pairs.
    TokenExchange,
    /// The request was invalid (HTTP 400) or a caller-supplied value could
    /// not be parsed.
    BadRequest,
    /// Resource not found (HTTP 404).
    NotFound,
    /// Network error - connection failed, timeout, body read failure.
    Network,
    /// The API returned a non-success HTTP status.
    Server,
    /// The response could not be parsed or was missing a required field.
    InvalidResponse,
    /// Missing or invalid configuration.
    Configuration,
    /// The token-refreshed notification hook failed.
    Notification,
}

impl ServiceErrorCode {
    /// Returns a stable, machine-readable name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Precondition => "precondition",
            Self::TokenExchange => "token_exchange",
            Self::BadRequest => "bad_request",
            Self::NotFound => "not_found",
            Self::Network => "network",
            Self::Server => "server",
            Self::InvalidResponse => "invalid_response",
            Self::Configuration => "configuration",
            Self::Notification => "notification",
        }
    }
}

impl fmt::Display for ServiceErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error from an OAuth or Calendar operation.
#[derive(Debug, Error)]
pub struct ServiceError {
    /// The error code categorizing this error.
    code: ServiceErrorCode,
    /// A human-readable message describing the error.
    message: String,
    /// The underlying cause of this error, if any.
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ServiceError {
    /// Creates a new error with the given code and message.
    pub fn new(code: ServiceErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a precondition error for a credential missing `field`.
    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ServiceErrorCode::Precondition,
            format!("credential must have a field: {field}"),
        )
    }

    /// Creates a token exchange error.
    pub fn token_exchange(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorCode::TokenExchange, message)
    }

    /// Creates a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorCode::BadRequest, message)
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorCode::NotFound, message)
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorCode::Network, message)
    }

    /// Creates a server error.
    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorCode::Server, message)
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorCode::InvalidResponse, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorCode::Configuration, message)
    }

    /// Creates a notification hook error.
    pub fn notification(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorCode::Notification, message)
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Sets a boxed source error for this error.
    pub fn with_boxed_source(
        mut self,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        self.source = Some(source);
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> ServiceErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
