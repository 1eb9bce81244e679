//! Service lifecycle: lazy, single-flight acquisition of the calendar service.
//!
//! [`ServiceLifecycle::ensure_ready`] guarantees an authorized
//! [`ServiceHandle`] before any tool executes. The first caller starts the
//! acquisition sequence; callers arriving while it runs await the same shared
//! future and are released with the same outcome.
//!
//! # Acquisition sequence
//!
//! ```text
//! ensure_ready()
//!   ├─ cached handle?        → return it (no I/O)
//!   ├─ in-flight init?       → await the shared future
//!   └─ start init (spawned)
//!        ├─ load stored credential
//!        │    ├─ valid             → use it
//!        │    ├─ expired + refresh → refresh → persist
//!        │    └─ absent / stale    → interactive authorize → persist
//!        ├─ connect → ServiceHandle
//!        └─ cache handle, clear in-flight marker
//! ```
//!
//! The acquisition runs on its own task, so it completes even if every
//! caller that was waiting on it goes away. On failure the cache stays empty
//! and the next call starts a fresh attempt; nothing is retried
//! automatically.

use crate::ports::authorizer::{AuthorizationError, Authorizer};
use crate::ports::calendar_service::{CalendarConnector, CalendarError, ServiceHandle};
use crate::ports::credential_store::{CredentialStore, CredentialStoreError};
use calmcp_domain::Credential;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Why the calendar service could not be made ready.
///
/// Cloneable so every caller waiting on the same attempt receives the error.
#[derive(Error, Debug, Clone)]
pub enum InitializationError {
    #[error("Failed to load stored credential: {0}")]
    Load(#[source] Arc<CredentialStoreError>),

    #[error("Authorization failed: {0}")]
    Authorization(#[source] Arc<AuthorizationError>),

    #[error("Failed to persist credential: {0}")]
    Persist(#[source] Arc<CredentialStoreError>),

    #[error("Calendar backend rejected the credential: {0}")]
    Connect(#[source] Arc<CalendarError>),

    /// The acquisition task ended without producing a result (panicked).
    #[error("Initialization aborted: {0}")]
    Aborted(String),
}

type InFlight = Shared<BoxFuture<'static, Result<ServiceHandle, InitializationError>>>;

#[derive(Default)]
struct LifecycleState {
    handle: Option<ServiceHandle>,
    in_flight: Option<InFlight>,
    /// Incremented per attempt so a finished attempt never clears a newer one.
    generation: u64,
}

struct LifecycleInner {
    store: Arc<dyn CredentialStore>,
    authorizer: Arc<dyn Authorizer>,
    connector: Arc<dyn CalendarConnector>,
    scopes: Vec<String>,
    state: Mutex<LifecycleState>,
}

/// Owner of the process-wide [`ServiceHandle`].
///
/// Cloning is cheap; clones share the same handle and in-flight attempt.
#[derive(Clone)]
pub struct ServiceLifecycle {
    inner: Arc<LifecycleInner>,
}

impl ServiceLifecycle {
    /// Creates a lifecycle that authorizes for `scopes`.
    ///
    /// # Arguments
    ///
    /// * `store` - Where the credential is persisted between runs
    /// * `authorizer` - Interactive flow and refresh
    /// * `connector` - Builds the service from a credential
    /// * `scopes` - Scopes requested by the interactive flow
    pub fn new(
        store: Arc<dyn CredentialStore>,
        authorizer: Arc<dyn Authorizer>,
        connector: Arc<dyn CalendarConnector>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            inner: Arc::new(LifecycleInner {
                store,
                authorizer,
                connector,
                scopes,
                state: Mutex::new(LifecycleState::default()),
            }),
        }
    }

    /// Return the cached handle, or acquire one.
    ///
    /// Safe to call concurrently: at most one acquisition runs at a time.
    ///
    /// # Errors
    ///
    /// Returns the [`InitializationError`] of the attempt this call joined.
    pub async fn ensure_ready(&self) -> Result<ServiceHandle, InitializationError> {
        let in_flight = {
            let mut state = self.inner.lock_state();
            if let Some(handle) = &state.handle {
                return Ok(Arc::clone(handle));
            }
            match &state.in_flight {
                Some(in_flight) => {
                    debug!("Joining in-flight calendar service initialization");
                    in_flight.clone()
                }
                None => {
                    state.generation += 1;
                    let in_flight = Self::start(Arc::clone(&self.inner), state.generation);
                    state.in_flight = Some(in_flight.clone());
                    in_flight
                }
            }
        };

        in_flight.await
    }

    /// Whether a handle is cached.
    pub fn is_ready(&self) -> bool {
        self.inner.lock_state().handle.is_some()
    }

    /// Drop the cached handle so the next call acquires a new one.
    ///
    /// An attempt already in flight is left alone.
    pub fn invalidate(&self) {
        if self.inner.lock_state().handle.take().is_some() {
            info!("Calendar service handle invalidated");
        }
    }

    fn start(inner: Arc<LifecycleInner>, generation: u64) -> InFlight {
        let task_inner = Arc::clone(&inner);
        let task = tokio::spawn(async move {
            let result = task_inner.initialize().await;
            task_inner.finish(generation, &result);
            result
        });

        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => {
                    let err = InitializationError::Aborted(e.to_string());
                    inner.finish(generation, &Err(err.clone()));
                    Err(err)
                }
            }
        }
        .boxed()
        .shared()
    }
}

impl LifecycleInner {
    fn lock_state(&self) -> MutexGuard<'_, LifecycleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish(&self, generation: u64, result: &Result<ServiceHandle, InitializationError>) {
        let mut state = self.lock_state();
        if state.generation != generation {
            return;
        }
        state.in_flight = None;
        if let Ok(handle) = result {
            state.handle = Some(Arc::clone(handle));
        }
    }

    async fn initialize(&self) -> Result<ServiceHandle, InitializationError> {
        info!("Starting calendar service initialization");

        let result = async {
            let credential = self.acquire_credential().await?;
            self.connector
                .connect(credential)
                .await
                .map_err(|e| InitializationError::Connect(Arc::new(e)))
        }
        .await;

        match &result {
            Ok(_) => info!("Calendar service initialized"),
            Err(e) => error!(error = %e, "Failed to initialize calendar service"),
        }
        result
    }

    async fn acquire_credential(&self) -> Result<Credential, InitializationError> {
        let stored = match self.store.load().await {
            Ok(stored) => stored,
            Err(CredentialStoreError::Malformed(reason)) => {
                warn!(%reason, "Ignoring malformed stored credential");
                None
            }
            Err(e) => return Err(InitializationError::Load(Arc::new(e))),
        };

        if let Some(credential) = stored {
            if !credential.scopes.is_empty()
                && !credential.covers(self.scopes.iter().map(String::as_str))
            {
                info!("Stored credential does not cover the configured scopes");
            } else if credential.is_valid() {
                debug!(expiry = %credential.expiry, "Using stored credential");
                return Ok(credential);
            } else if credential.can_refresh() {
                info!("Stored credential expired, refreshing");
                match self.authorizer.refresh(&credential).await {
                    Ok(refreshed) => {
                        self.persist(&refreshed).await?;
                        return Ok(refreshed);
                    }
                    Err(e) => {
                        warn!(error = %e, "Refresh rejected, falling back to interactive authorization");
                    }
                }
            } else {
                info!("Stored credential expired and cannot be refreshed");
            }
        } else {
            info!("No stored credential found");
        }

        let credential = self
            .authorizer
            .authorize(&self.scopes)
            .await
            .map_err(|e| InitializationError::Authorization(Arc::new(e)))?;
        self.persist(&credential).await?;
        Ok(credential)
    }

    async fn persist(&self, credential: &Credential) -> Result<(), InitializationError> {
        self.store
            .save(credential)
            .await
            .map_err(|e| InitializationError::Persist(Arc::new(e)))?;
        debug!("Credential persisted");
        Ok(())
    }
}
