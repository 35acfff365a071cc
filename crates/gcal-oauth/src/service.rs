//! The calendar service facade.
//!
//! [`CalendarService`] wires the configuration, the OAuth and Calendar
//! clients, and the credential guard into the six public operations. Every
//! data-bearing operation runs the guard first, so callers never hand a stale
//! access token to the provider.

use std::sync::Arc;

use tracing::{debug, info};

use crate::auth::{AuthApi, GoogleAuthClient, UserInfo, build_auth_url};
use crate::calendar::{
    CalendarApi, Event, EventDraft, EventSearchOptions, GoogleCalendarClient,
};
use crate::config::CalendarConfig;
use crate::credential::{Credential, unix_now};
use crate::error::ServiceResult;
use crate::guard::{CredentialGuard, TokenRefreshHook};

/// Google OAuth2 and Calendar integration service.
///
/// The service is stateless across calls: all per-user state lives in the
/// caller-supplied [`Credential`], and persistence of refreshed tokens is
/// delegated to the [`TokenRefreshHook`].
pub struct CalendarService {
    config: CalendarConfig,
    auth: Arc<dyn AuthApi>,
    calendar: Arc<dyn CalendarApi>,
    guard: CredentialGuard,
}

impl CalendarService {
    /// Creates a service talking to the real Google endpoints.
    pub fn new(config: CalendarConfig) -> ServiceResult<Self> {
        let auth: Arc<dyn AuthApi> = Arc::new(GoogleAuthClient::new(&config)?);
        let calendar: Arc<dyn CalendarApi> = Arc::new(GoogleCalendarClient::new(&config)?);
        Self::from_parts(config, auth, calendar)
    }

    /// Creates a service over caller-supplied clients.
    ///
    /// Used for tests and for hosts substituting their own transports.
    pub fn from_parts(
        config: CalendarConfig,
        auth: Arc<dyn AuthApi>,
        calendar: Arc<dyn CalendarApi>,
    ) -> ServiceResult<Self> {
        config.validate()?;
        let guard = CredentialGuard::new(auth.clone());
        Ok(Self {
            config,
            auth,
            calendar,
            guard,
        })
    }

    /// Registers the token-refreshed notification hook.
    pub fn with_refresh_hook(mut self, hook: Arc<dyn TokenRefreshHook>) -> Self {
        self.guard = CredentialGuard::new(self.auth.clone()).with_hook(hook);
        self
    }

    /// Builds the OAuth consent URL.
    ///
    /// `redirect` overrides the configured redirect URI;
    /// `force_approval_prompt` forces the consent screen even for a user who
    /// already granted the scopes.
    pub fn get_auth_uri(&self, redirect: Option<&str>, force_approval_prompt: bool) -> String {
        let redirect_uri = redirect.unwrap_or(&self.config.redirect_uri);
        build_auth_url(
            &self.config.client_id,
            redirect_uri,
            &self.config.scopes,
            force_approval_prompt,
        )
    }

    /// Exchanges an authorization code for a credential.
    ///
    /// The credential's absolute expiry is computed from the response's
    /// relative `expires_in`.
    pub async fn get_token_by_code(&self, code: &str) -> ServiceResult<Credential> {
        let response = self.auth.exchange_auth_code(code.to_string()).await?;
        let credential = Credential::from_token_response(&response, unix_now());
        info!("exchanged authorization code for tokens");
        Ok(credential)
    }

    /// Fetches the authorized user's profile.
    pub async fn get_user_info(&self, credential: &Credential) -> ServiceResult<UserInfo> {
        let access_token = self.guard.ensure_valid(credential).await?;
        self.auth.user_info(access_token).await
    }

    /// Lists events matching `options`, following pagination to the end.
    ///
    /// Pages are concatenated in provider order; each follow-up request
    /// carries the `pageToken` merged with the original search options.
    pub async fn get_event_list(
        &self,
        credential: &Credential,
        options: &EventSearchOptions,
    ) -> ServiceResult<Vec<Event>> {
        let access_token = self.guard.ensure_valid(credential).await?;
        let base_query = options.to_query()?;

        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = base_query.clone();
            if let Some(token) = &page_token {
                query.push(("pageToken".to_string(), token.clone()));
            }

            let page = self
                .calendar
                .list_events(
                    access_token.clone(),
                    self.config.calendar_id.clone(),
                    query,
                )
                .await?;

            events.extend(page.items);

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!("collected {} events across all pages", events.len());
        Ok(events)
    }

    /// Creates an event on the configured calendar.
    pub async fn create_event(
        &self,
        credential: &Credential,
        draft: EventDraft,
    ) -> ServiceResult<Event> {
        let access_token = self.guard.ensure_valid(credential).await?;
        let payload = draft.into_payload()?;
        self.calendar
            .insert_event(access_token, self.config.calendar_id.clone(), payload)
            .await
    }

    /// Deletes an event from the configured calendar.
    pub async fn delete_event(
        &self,
        credential: &Credential,
        event_id: &str,
    ) -> ServiceResult<()> {
        let access_token = self.guard.ensure_valid(credential).await?;
        self.calendar
            .delete_event(
                access_token,
                self.config.calendar_id.clone(),
                event_id.to_string(),
            )
            .await
    }
}
