//! Google Calendar API client and wire types.
//!
//! [`CalendarApi`] covers the three event operations this crate exposes; the
//! concrete [`GoogleCalendarClient`] issues the HTTP requests. Each call
//! carries its own bearer token, so the client holds no per-user state.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::BoxFuture;
use crate::auth::request_error;
use crate::config::CalendarConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::time;

/// Base URL for Google Calendar API v3.
const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// The provider's event operations as consumed by this crate.
pub trait CalendarApi: Send + Sync {
    /// Fetches a single page of events matching `query`.
    fn list_events(
        &self,
        access_token: String,
        calendar_id: String,
        query: Vec<(String, String)>,
    ) -> BoxFuture<'_, ServiceResult<EventPage>>;

    /// Inserts an event into the calendar.
    fn insert_event(
        &self,
        access_token: String,
        calendar_id: String,
        payload: EventPayload,
    ) -> BoxFuture<'_, ServiceResult<Event>>;

    /// Deletes an event from the calendar.
    fn delete_event(
        &self,
        access_token: String,
        calendar_id: String,
        event_id: String,
    ) -> BoxFuture<'_, ServiceResult<()>>;
}

/// Search options for event listing.
///
/// Unset options are omitted from the request entirely; the three datetime
/// bounds accept local datetimes and are sent as RFC 3339 with offset.
#[derive(Debug, Clone, Default)]
pub struct EventSearchOptions {
    /// Sort order (`startTime` or `updated`).
    pub order_by: Option<String>,
    /// Free-text search, sent as the `q` parameter.
    pub search: Option<String>,
    /// Upper bound for event start time (local datetime).
    pub time_max: Option<String>,
    /// Lower bound for event start time (local datetime).
    pub time_min: Option<String>,
    /// Timezone used in the response.
    pub time_zone: Option<String>,
    /// Lower bound for last modification time (local datetime).
    pub updated_min: Option<String>,
    /// Maximum number of events per page.
    pub max_results: Option<u32>,
}

impl EventSearchOptions {
    /// Creates empty search options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the sort order.
    pub fn with_order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    /// Builder method to set the free-text search term.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Builder method to set the upper start-time bound.
    pub fn with_time_max(mut self, time_max: impl Into<String>) -> Self {
        self.time_max = Some(time_max.into());
        self
    }

    /// Builder method to set the lower start-time bound.
    pub fn with_time_min(mut self, time_min: impl Into<String>) -> Self {
        self.time_min = Some(time_min.into());
        self
    }

    /// Builder method to set the response timezone.
    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = Some(time_zone.into());
        self
    }

    /// Builder method to set the lower modification-time bound.
    pub fn with_updated_min(mut self, updated_min: impl Into<String>) -> Self {
        self.updated_min = Some(updated_min.into());
        self
    }

    /// Builder method to set the page size.
    pub fn with_max_results(mut self, max: u32) -> Self {
        self.max_results = Some(max);
        self
    }

    /// Serializes the set options into query parameters, omitting unset ones.
    pub fn to_query(&self) -> ServiceResult<Vec<(String, String)>> {
        let mut query = Vec::new();

        if let Some(order_by) = &self.order_by {
            query.push(("orderBy".to_string(), order_by.clone()));
        }
        if let Some(search) = &self.search {
            query.push(("q".to_string(), search.clone()));
        }
        if let Some(time_max) = &self.time_max {
            query.push(("timeMax".to_string(), time::to_rfc3339(time_max)?));
        }
        if let Some(time_min) = &self.time_min {
            query.push(("timeMin".to_string(), time::to_rfc3339(time_min)?));
        }
        if let Some(time_zone) = &self.time_zone {
            query.push(("timeZone".to_string(), time_zone.clone()));
        }
        if let Some(updated_min) = &self.updated_min {
            query.push(("updatedMin".to_string(), time::to_rfc3339(updated_min)?));
        }
        if let Some(max) = self.max_results {
            query.push(("maxResults".to_string(), max.to_string()));
        }

        Ok(query)
    }
}

/// Input for event creation: summary plus local start and end datetimes.
#[derive(Debug, Clone)]
pub struct EventDraft {
    /// Event title.
    pub summary: String,
    /// Local start datetime.
    pub start: String,
    /// Local end datetime.
    pub end: String,
}

impl EventDraft {
    /// Creates a new draft.
    pub fn new(
        summary: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Self {
        Self {
            summary: summary.into(),
            start: start.into(),
            end: end.into(),
        }
    }

    /// Converts the draft into an insert payload, normalizing the local
    /// datetimes to RFC 3339 with offset.
    pub fn into_payload(self) -> ServiceResult<EventPayload> {
        Ok(EventPayload {
            summary: self.summary,
            start: EventTime::at(time::to_rfc3339(&self.start)?),
            end: EventTime::at(time::to_rfc3339(&self.end)?),
        })
    }
}

/// Wire payload for event insertion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    /// Event title.
    pub summary: String,
    /// Start time.
    pub start: EventTime,
    /// End time.
    pub end: EventTime,
}

/// Event start/end time on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    /// All-day date (`YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Timed instant, RFC 3339 with offset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    /// IANA timezone identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventTime {
    /// A timed instant with no explicit timezone field.
    pub fn at(date_time: String) -> Self {
        Self {
            date: None,
            date_time: Some(date_time),
            time_zone: None,
        }
    }
}

/// A calendar event as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event identifier.
    pub id: Option<String>,
    /// Lifecycle status (`confirmed`, `tentative`, `cancelled`).
    pub status: Option<String>,
    /// Event title.
    pub summary: Option<String>,
    /// Event description.
    pub description: Option<String>,
    /// Event location.
    pub location: Option<String>,
    /// Link to the event in the calendar UI.
    pub html_link: Option<String>,
    /// Start time.
    pub start: Option<EventTime>,
    /// End time.
    pub end: Option<EventTime>,
    /// Last modification time.
    pub updated: Option<String>,
}

/// One page from the events.list endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPage {
    /// Events on this page, in provider order.
    #[serde(default)]
    pub items: Vec<Event>,
    /// Token for the next page, absent on the last one.
    pub next_page_token: Option<String>,
}

/// HTTP client for the Google Calendar API.
#[derive(Debug)]
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
}

impl GoogleCalendarClient {
    /// Creates a new calendar client from the service configuration.
    pub fn new(config: &CalendarConfig) -> ServiceResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                ServiceError::configuration("failed to create HTTP client").with_source(e)
            })?;

        Ok(Self { http_client })
    }

    fn events_url(calendar_id: &str) -> String {
        format!(
            "{}/calendars/{}/events",
            CALENDAR_API_BASE,
            urlencoding::encode(calendar_id)
        )
    }
}

impl CalendarApi for GoogleCalendarClient {
    fn list_events(
        &self,
        access_token: String,
        calendar_id: String,
        query: Vec<(String, String)>,
    ) -> BoxFuture<'_, ServiceResult<EventPage>> {
        Box::pin(async move {
            let response = self
                .http_client
                .get(Self::events_url(&calendar_id))
                .bearer_auth(&access_token)
                .query(&query)
                .send()
                .await
                .map_err(request_error)?;

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| ServiceError::network(format!("failed to read response: {e}")))?;

            if !status.is_success() {
                return Err(status_error(status, &body));
            }

            let page: EventPage = serde_json::from_str(&body).map_err(|e| {
                ServiceError::invalid_response(format!("failed to parse event list: {e}"))
            })?;

            debug!(
                "fetched {} events from calendar {}",
                page.items.len(),
                calendar_id
            );
            Ok(page)
        })
    }

    fn insert_event(
        &self,
        access_token: String,
        calendar_id: String,
        payload: EventPayload,
    ) -> BoxFuture<'_, ServiceResult<Event>> {
        Box::pin(async move {
            let response = self
                .http_client
                .post(Self::events_url(&calendar_id))
                .bearer_auth(&access_token)
                .json(&payload)
                .send()
                .await
                .map_err(request_error)?;

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| ServiceError::network(format!("failed to read response: {e}")))?;

            if !status.is_success() {
                return Err(status_error(status, &body));
            }

            serde_json::from_str(&body).map_err(|e| {
                ServiceError::invalid_response(format!("failed to parse created event: {e}"))
            })
        })
    }

    fn delete_event(
        &self,
        access_token: String,
        calendar_id: String,
        event_id: String,
    ) -> BoxFuture<'_, ServiceResult<()>> {
        Box::pin(async move {
            let url = format!(
                "{}/{}",
                Self::events_url(&calendar_id),
                urlencoding::encode(&event_id)
            );

            let response = self
                .http_client
                .delete(&url)
                .bearer_auth(&access_token)
                .send()
                .await
                .map_err(request_error)?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(status_error(status, &body));
            }

            debug!("deleted event {} from calendar {}", event_id, calendar_id);
            Ok(())
        })
    }
}

/// Maps a non-success HTTP status to a service error.
fn status_error(status: reqwest::StatusCode, body: &str) -> ServiceError {
    match status {
        reqwest::StatusCode::BAD_REQUEST => {
            ServiceError::bad_request(format!("API rejected request: {body}"))
        }
        reqwest::StatusCode::NOT_FOUND => ServiceError::not_found(format!("not found: {body}")),
        _ => ServiceError::server(format!("API error ({status}): {body}")),
    }
}
