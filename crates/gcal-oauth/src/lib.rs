//! Google OAuth2 + Calendar integration for host web applications.
//!
//! This crate is a thin layer over Google's OAuth2 and Calendar v3 APIs:
//!
//! - [`CalendarService`] - the facade exposing consent-URL generation, the
//!   code-for-token exchange, user-info fetch, and event list/create/delete
//! - [`CredentialGuard`] - the refresh policy run before every data call,
//!   with a 30-second safety margin and a [`TokenRefreshHook`] for
//!   persistence by the host
//! - [`Credential`] / [`RefreshedCredential`] - the per-user token state,
//!   owned by the caller and never mutated here
//! - [`ServiceError`] - error type for all operations
//!
//! # Credential lifecycle
//!
//! ```text
//! consent URL ──▶ authorization code ──▶ get_token_by_code ──▶ Credential
//!                                                                  │
//!                  host persists ◀── TokenRefreshHook ◀── refresh exchange
//!                                                                  │
//!                        data call (userinfo / events) ◀── ensure_valid
//! ```
//!
//! The crate is stateless across calls: each operation re-evaluates the
//! caller-supplied credential, performs at most one refresh exchange (no
//! retry), and leaves persistence of the refreshed token to the hook.
//!
//! # Example
//!
//! ```ignore
//! use gcal_oauth::{CalendarConfig, CalendarService, EventSearchOptions};
//!
//! let config = CalendarConfig::from_env()?;
//! let service = CalendarService::new(config)?.with_refresh_hook(hook);
//!
//! let events = service
//!     .get_event_list(&credential, &EventSearchOptions::new().with_search("standup"))
//!     .await?;
//! ```

use std::future::Future;
use std::pin::Pin;

pub mod auth;
pub mod calendar;
pub mod config;
pub mod credential;
pub mod error;
pub mod guard;
pub mod service;
pub mod time;

/// A boxed future for async trait methods.
///
/// Boxing keeps the [`auth::AuthApi`] and [`calendar::CalendarApi`] traits
/// object-safe so the service can hold them behind trait objects.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// Re-export main types at crate root
pub use auth::{AuthApi, GoogleAuthClient, UserInfo, build_auth_url};
pub use calendar::{
    CalendarApi, Event, EventDraft, EventPage, EventPayload, EventSearchOptions, EventTime,
    GoogleCalendarClient,
};
pub use config::CalendarConfig;
pub use credential::{
    Credential, REFRESH_MARGIN_SECS, RefreshedCredential, TokenResponse, is_expiring,
};
pub use error::{ServiceError, ServiceErrorCode, ServiceResult};
pub use guard::{CredentialGuard, TokenRefreshHook};
pub use service::CalendarService;
