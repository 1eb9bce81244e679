//! Test doubles for the application ports.

use crate::ports::authorizer::{AuthorizationError, Authorizer};
use crate::ports::calendar_service::{
    CalendarConnector, CalendarError, CalendarService, ServiceHandle,
};
use crate::ports::credential_store::{CredentialStore, CredentialStoreError};
use async_trait::async_trait;
use calmcp_domain::{Credential, Event, EventDraft, EventQuery, SendUpdates};
use chrono::{Duration, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

// ==================== Credential store ====================

#[derive(Clone, Copy)]
enum StoreMode {
    Normal,
    Malformed,
    Unreadable,
}

pub struct MemoryStore {
    stored: Mutex<Option<Credential>>,
    mode: StoreMode,
    fail_saves: bool,
    pub loads: AtomicUsize,
    pub saves: AtomicUsize,
}

impl MemoryStore {
    fn build(stored: Option<Credential>, mode: StoreMode) -> Self {
        Self {
            stored: Mutex::new(stored),
            mode,
            fail_saves: false,
            loads: AtomicUsize::new(0),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::build(None, StoreMode::Normal)
    }

    pub fn with(credential: Credential) -> Self {
        Self::build(Some(credential), StoreMode::Normal)
    }

    pub fn malformed() -> Self {
        Self::build(None, StoreMode::Malformed)
    }

    pub fn unreadable() -> Self {
        Self::build(None, StoreMode::Unreadable)
    }

    pub fn failing_saves(mut self) -> Self {
        self.fail_saves = true;
        self
    }

    pub fn current(&self) -> Option<Credential> {
        self.stored.lock().unwrap().clone()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn load(&self) -> Result<Option<Credential>, CredentialStoreError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            StoreMode::Normal => Ok(self.current()),
            StoreMode::Malformed => Err(CredentialStoreError::Malformed(
                "expected value at line 1 column 1".to_string(),
            )),
            StoreMode::Unreadable => {
                Err(CredentialStoreError::Read("permission denied".to_string()))
            }
        }
    }

    async fn save(&self, credential: &Credential) -> Result<(), CredentialStoreError> {
        if self.fail_saves {
            return Err(CredentialStoreError::Write("disk full".to_string()));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.stored.lock().unwrap() = Some(credential.clone());
        Ok(())
    }
}

// ==================== Authorizer ====================

pub struct MockAuthorizer {
    delay: Option<StdDuration>,
    failing_refresh: bool,
    remaining_failures: AtomicUsize,
    pub authorizations: AtomicUsize,
    pub refreshes: AtomicUsize,
}

impl MockAuthorizer {
    pub fn new() -> Self {
        Self {
            delay: None,
            failing_refresh: false,
            remaining_failures: AtomicUsize::new(0),
            authorizations: AtomicUsize::new(0),
            refreshes: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: StdDuration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing_refresh(mut self) -> Self {
        self.failing_refresh = true;
        self
    }

    /// Fail the first `n` interactive authorizations.
    pub fn failing_authorizations(self, n: usize) -> Self {
        self.remaining_failures.store(n, Ordering::SeqCst);
        self
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl Authorizer for MockAuthorizer {
    async fn authorize(&self, scopes: &[String]) -> Result<Credential, AuthorizationError> {
        self.authorizations.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        let failing = self
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(AuthorizationError::Denied("access_denied".to_string()));
        }
        Ok(Credential::new("authorized", Utc::now() + Duration::hours(1))
            .with_refresh_token("refresh")
            .with_scopes(scopes.iter().cloned()))
    }

    async fn refresh(&self, credential: &Credential) -> Result<Credential, AuthorizationError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.failing_refresh {
            return Err(AuthorizationError::TokenExchange("invalid_grant".to_string()));
        }
        let mut refreshed = credential.clone();
        refreshed.access_token = "refreshed".to_string();
        refreshed.expiry = Utc::now() + Duration::hours(1);
        Ok(refreshed)
    }
}

// ==================== Calendar ====================

#[derive(Default)]
pub struct MockCalendar {
    events: Mutex<Vec<Event>>,
    next_error: Mutex<Option<CalendarError>>,
    pub inserted: Mutex<Vec<(EventDraft, SendUpdates)>>,
    pub queries: Mutex<Vec<EventQuery>>,
}

impl MockCalendar {
    pub fn with_events(events: Vec<Event>) -> Self {
        Self {
            events: Mutex::new(events),
            ..Self::default()
        }
    }

    /// Make the next backend call fail with `error`.
    pub fn fail_next(&self, error: CalendarError) {
        *self.next_error.lock().unwrap() = Some(error);
    }

    fn take_error(&self) -> Result<(), CalendarError> {
        match self.next_error.lock().unwrap().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CalendarService for MockCalendar {
    async fn insert(
        &self,
        draft: &EventDraft,
        send_updates: SendUpdates,
    ) -> Result<Event, CalendarError> {
        self.take_error()?;
        self.inserted
            .lock()
            .unwrap()
            .push((draft.clone(), send_updates));
        Ok(Event {
            id: "evt-1".to_string(),
            summary: Some(draft.summary.clone()),
            description: Some(draft.description.clone()),
            start: draft.start.clone(),
            end: draft.end.clone(),
            html_link: None,
            attendees: draft.attendees.clone(),
        })
    }

    async fn list(&self, query: &EventQuery) -> Result<Vec<Event>, CalendarError> {
        self.take_error()?;
        self.queries.lock().unwrap().push(query.clone());
        Ok(self.events.lock().unwrap().clone())
    }
}

// ==================== Connector ====================

pub struct MockConnector {
    pub calendar: Arc<MockCalendar>,
    failing: bool,
    last_token: Mutex<Option<String>>,
    pub connects: AtomicUsize,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::serving(Arc::new(MockCalendar::default()))
    }

    pub fn serving(calendar: Arc<MockCalendar>) -> Self {
        Self {
            calendar,
            failing: false,
            last_token: Mutex::new(None),
            connects: AtomicUsize::new(0),
        }
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn last_access_token(&self) -> Option<String> {
        self.last_token.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarConnector for MockConnector {
    async fn connect(&self, credential: Credential) -> Result<ServiceHandle, CalendarError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        *self.last_token.lock().unwrap() = Some(credential.access_token);
        if self.failing {
            return Err(CalendarError::Unauthorized(
                "token rejected by backend".to_string(),
            ));
        }
        Ok(Arc::clone(&self.calendar) as ServiceHandle)
    }
}
