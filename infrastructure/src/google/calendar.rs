//! Google Calendar v3 REST adapter.
//!
//! [`GoogleCalendarConnector`] turns a credential into a
//! [`GoogleCalendarService`]. The service keeps the credential in memory and
//! renews it with the refresh token when it expires, writing the renewed
//! credential back to the store.
//!
//! A failed write of the renewed credential is logged and the call goes on
//! with the renewed token. The token in memory stays usable; the store keeps
//! the previous credential, which the next process start refreshes again.

use super::wire::{ApiErrorResponse, EventList};
use async_trait::async_trait;
use calmcp_application::ports::authorizer::Authorizer;
use calmcp_application::ports::calendar_service::{
    CalendarConnector, CalendarError, CalendarService, ServiceHandle,
};
use calmcp_application::ports::credential_store::CredentialStore;
use calmcp_domain::{Credential, Event, EventDraft, EventQuery, SendUpdates};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

/// 403 reasons that mean "slow down" rather than "forbidden".
const QUOTA_REASONS: [&str; 4] = [
    "rateLimitExceeded",
    "userRateLimitExceeded",
    "quotaExceeded",
    "dailyLimitExceeded",
];

/// Builds [`GoogleCalendarService`] handles for one calendar.
pub struct GoogleCalendarConnector {
    http: reqwest::Client,
    api_base: String,
    calendar_id: String,
    authorizer: Arc<dyn Authorizer>,
    store: Arc<dyn CredentialStore>,
}

impl GoogleCalendarConnector {
    pub fn new(
        http: reqwest::Client,
        api_base: impl Into<String>,
        calendar_id: impl Into<String>,
        authorizer: Arc<dyn Authorizer>,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            http,
            api_base: api_base.into(),
            calendar_id: calendar_id.into(),
            authorizer,
            store,
        }
    }
}

#[async_trait]
impl CalendarConnector for GoogleCalendarConnector {
    async fn connect(&self, credential: Credential) -> Result<ServiceHandle, CalendarError> {
        if credential.access_token.is_empty() {
            return Err(CalendarError::Unauthorized(
                "credential has no access token".to_string(),
            ));
        }

        let events_url = events_url(&self.api_base, &self.calendar_id)?;
        debug!(url = %events_url, "Calendar service connected");

        Ok(Arc::new(GoogleCalendarService {
            http: self.http.clone(),
            events_url,
            credential: Mutex::new(credential),
            authorizer: Arc::clone(&self.authorizer),
            store: Arc::clone(&self.store),
        }))
    }
}

/// `{api_base}/calendars/{calendar_id}/events`, with the id percent-encoded.
fn events_url(api_base: &str, calendar_id: &str) -> Result<Url, CalendarError> {
    let mut url = Url::parse(api_base)
        .map_err(|e| CalendarError::Connection(format!("invalid API base URL: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| CalendarError::Connection(format!("invalid API base URL: {}", api_base)))?
        .pop_if_empty()
        .extend(["calendars", calendar_id, "events"]);
    Ok(url)
}

/// Authorized client for one calendar's events collection.
pub struct GoogleCalendarService {
    http: reqwest::Client,
    events_url: Url,
    credential: Mutex<Credential>,
    authorizer: Arc<dyn Authorizer>,
    store: Arc<dyn CredentialStore>,
}

impl GoogleCalendarService {
    /// Current access token, renewing the credential first if it expired.
    async fn access_token(&self) -> Result<String, CalendarError> {
        let mut credential = self.credential.lock().await;
        if credential.is_valid() {
            return Ok(credential.access_token.clone());
        }
        if !credential.can_refresh() {
            return Err(CalendarError::Unauthorized(
                "access token expired and cannot be refreshed".to_string(),
            ));
        }

        info!("Access token expired, refreshing");
        let refreshed = self
            .authorizer
            .refresh(&credential)
            .await
            .map_err(|e| CalendarError::Unauthorized(e.to_string()))?;
        if let Err(e) = self.store.save(&refreshed).await {
            warn!(error = %e, "Failed to persist refreshed credential, continuing with it in memory");
        }
        *credential = refreshed;
        Ok(credential.access_token.clone())
    }
}

#[async_trait]
impl CalendarService for GoogleCalendarService {
    async fn insert(
        &self,
        draft: &EventDraft,
        send_updates: SendUpdates,
    ) -> Result<Event, CalendarError> {
        let token = self.access_token().await?;
        let mut url = self.events_url.clone();
        url.query_pairs_mut()
            .append_pair("sendUpdates", send_updates.as_str());

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(draft)
            .send()
            .await
            .map_err(|e| CalendarError::Connection(e.to_string()))?;

        decode(response).await
    }

    async fn list(&self, query: &EventQuery) -> Result<Vec<Event>, CalendarError> {
        let token = self.access_token().await?;
        let mut url = self.events_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("timeMin", &query.time_min)
                .append_pair("timeMax", &query.time_max)
                .append_pair("maxResults", &query.max_results.to_string())
                .append_pair("singleEvents", &query.single_events.to_string())
                .append_pair("orderBy", query.order_by.as_str());
            if !query.query.is_empty() {
                pairs.append_pair("q", &query.query);
            }
        }

        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| CalendarError::Connection(e.to_string()))?;

        let page: EventList = decode(response).await?;
        Ok(page.items)
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, CalendarError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| CalendarError::Decode(e.to_string()));
    }

    let body = response.text().await.unwrap_or_default();
    Err(api_error(status, &body))
}

fn api_error(status: StatusCode, body: &str) -> CalendarError {
    let parsed = serde_json::from_str::<ApiErrorResponse>(body).ok();
    let message = parsed
        .as_ref()
        .map(|p| p.error.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.to_string());
    let quota = parsed
        .as_ref()
        .is_some_and(|p| p.error.has_reason(&QUOTA_REASONS));

    match status {
        StatusCode::UNAUTHORIZED => CalendarError::Unauthorized(message),
        StatusCode::TOO_MANY_REQUESTS => CalendarError::QuotaExceeded(message),
        StatusCode::FORBIDDEN if quota => CalendarError::QuotaExceeded(message),
        _ => CalendarError::Api {
            status: status.as_u16(),
            message,
        },
    }
}
