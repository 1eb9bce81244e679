//! Tool dispatch use case
//!
//! Validates a tool call, makes sure the calendar service is ready, routes
//! the call to the matching operation and renders the result as text.
//!
//! | Step | Failure               | Touches I/O |
//! |------|-----------------------|-------------|
//! | 1    | `MissingArguments`    | no          |
//! | 2    | `UnknownTool`         | no          |
//! | 3    | `InvalidArguments`    | no          |
//! | 4    | `Initialization`      | yes         |
//! | 5    | `Execution`           | yes         |

use super::ensure_ready::{InitializationError, ServiceLifecycle};
use crate::ports::calendar_service::{CalendarError, ServiceHandle};
use crate::ports::tool_schema::ToolSchemaPort;
use calmcp_domain::{
    ArgumentError, ContentBlock, SendUpdates, ToolCallRequest, ToolDescriptor, ToolInvocation,
    ToolSpec, describe_created, describe_search,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur while handling a tool call
#[derive(Error, Debug)]
pub enum CallToolError {
    #[error("Missing arguments")]
    MissingArguments,

    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error(transparent)]
    InvalidArguments(#[from] ArgumentError),

    #[error("Failed to initialize calendar service: {0}")]
    Initialization(#[from] InitializationError),

    #[error("Calendar operation failed: {0}")]
    Execution(#[from] CalendarError),
}

impl CallToolError {
    /// Whether the caller can fix the error by changing the request.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            CallToolError::MissingArguments
                | CallToolError::UnknownTool { .. }
                | CallToolError::InvalidArguments(_)
        )
    }
}

/// Routes tool calls to calendar operations.
///
/// Holds the tool registry and the shared [`ServiceLifecycle`]; cheap to
/// share behind an `Arc` across concurrent requests.
pub struct ToolDispatcher {
    lifecycle: ServiceLifecycle,
    spec: ToolSpec,
    schema: Arc<dyn ToolSchemaPort>,
    send_updates: SendUpdates,
}

impl ToolDispatcher {
    pub fn new(lifecycle: ServiceLifecycle, spec: ToolSpec, schema: Arc<dyn ToolSchemaPort>) -> Self {
        Self {
            lifecycle,
            spec,
            schema,
            send_updates: SendUpdates::All,
        }
    }

    /// Set who gets notified when an event is created (default: everyone).
    pub fn with_send_updates(mut self, send_updates: SendUpdates) -> Self {
        self.send_updates = send_updates;
        self
    }

    pub fn lifecycle(&self) -> &ServiceLifecycle {
        &self.lifecycle
    }

    /// Descriptors for every registered tool, in registration order.
    ///
    /// Pure: never touches credentials or the backend.
    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.schema.all_descriptors(&self.spec)
    }

    /// Execute a tool call.
    ///
    /// On success the result is a single text block. The request is fully
    /// validated before the calendar service is acquired.
    pub async fn execute(
        &self,
        request: &ToolCallRequest,
    ) -> Result<Vec<ContentBlock>, CallToolError> {
        let arguments = request
            .non_empty_arguments()
            .ok_or(CallToolError::MissingArguments)?;

        let definition =
            self.spec
                .get(&request.name)
                .ok_or_else(|| CallToolError::UnknownTool {
                    name: request.name.clone(),
                })?;

        let invocation = ToolInvocation::decode(definition, arguments)?;
        debug!(tool = %invocation.kind(), "Tool call validated");

        let service = self.lifecycle.ensure_ready().await?;

        let text = self.run(&service, invocation).await.map_err(|e| {
            if e.is_unauthorized() {
                warn!(error = %e, "Credential rejected by calendar backend");
                self.lifecycle.invalidate();
            }
            CallToolError::Execution(e)
        })?;

        Ok(vec![ContentBlock::text(text)])
    }

    async fn run(
        &self,
        service: &ServiceHandle,
        invocation: ToolInvocation,
    ) -> Result<String, CalendarError> {
        match invocation {
            ToolInvocation::CreateEvent(args) => {
                let draft = args.into_draft();
                let event = service.insert(&draft, self.send_updates).await?;
                info!(event_id = %event.id, "Event created");
                Ok(describe_created(&event))
            }
            ToolInvocation::SearchEvents(args) => {
                let query = args.into_query();
                let events = service.list(&query).await?;
                info!(count = events.len(), "Events listed");
                Ok(describe_search(&events))
            }
        }
    }
}
