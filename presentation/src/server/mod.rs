//! MCP server over newline-delimited JSON-RPC.
//!
//! The server reads one message per line and answers on the writer. Protocol
//! housekeeping (`initialize`, `ping`, `tools/list`) is answered inline;
//! each `tools/call` runs on its own task so a slow backend call, or the
//! first call that has to authorize, never blocks the read loop.
//!
//! ```text
//! reader ──▶ classify ──┬─ initialize / ping / tools/list ──▶ respond
//!                       ├─ tools/call ──▶ spawn ──▶ ToolDispatcher ──▶ respond
//!                       └─ notification ──▶ log
//! ```
//!
//! Responses go through a shared writer and may be emitted out of order;
//! clients correlate them by `id`. A tool call whose execution panics still
//! gets a response: an `INTERNAL_ERROR` for its `id`.

pub mod protocol;
pub mod transport;

use calmcp_application::{CallToolError, ToolDispatcher};
use calmcp_domain::ToolCallRequest;
use protocol::{
    CallToolResult, IncomingMessage, InitializeResult, JsonRpcResponseOut, ListToolsResult,
    RequestId, RpcError, ServerInfo, error_codes,
};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, error, info, trace, warn};
use transport::{MessageKind, classify_message};

/// Errors that stop the server loop
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

type SharedWriter<W> = Arc<Mutex<W>>;

/// MCP server exposing the calendar tools.
pub struct McpServer {
    dispatcher: Arc<ToolDispatcher>,
    info: ServerInfo,
}

impl McpServer {
    pub fn new(dispatcher: Arc<ToolDispatcher>, info: ServerInfo) -> Self {
        Self { dispatcher, info }
    }

    /// Serve until the reader reaches end of input.
    ///
    /// Tool calls still running at end of input are awaited so their
    /// responses are written before returning.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<(), ServerError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let writer: SharedWriter<W> = Arc::new(Mutex::new(writer));
        let mut calls = JoinSet::new();
        let mut lines = reader.lines();

        info!(server = %self.info.name, "MCP server listening");

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            trace!("Received: {}", line);

            if let Some(response) = self.handle_line(line, &writer, &mut calls) {
                send(&writer, &response).await?;
            }

            // Reap finished calls so the set does not grow unbounded
            while let Some(joined) = calls.try_join_next() {
                log_call_outcome(joined);
            }
        }

        debug!(pending = calls.len(), "Input closed, draining tool calls");
        while let Some(joined) = calls.join_next().await {
            log_call_outcome(joined);
        }
        info!("MCP server stopped");
        Ok(())
    }

    /// Handle one frame; returns the response to send inline, if any.
    fn handle_line<W>(
        &self,
        line: &str,
        writer: &SharedWriter<W>,
        calls: &mut JoinSet<Result<(), ServerError>>,
    ) -> Option<JsonRpcResponseOut>
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let json: Value = match serde_json::from_str(line) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Unparseable message");
                return Some(JsonRpcResponseOut::failure(
                    None,
                    RpcError::new(error_codes::PARSE_ERROR, format!("Parse error: {}", e)),
                ));
            }
        };

        match classify_message(&json) {
            MessageKind::Request { id } => self.handle_request(id, json, writer, calls),
            MessageKind::Notification => {
                self.handle_notification(&json);
                None
            }
            MessageKind::Response => {
                debug!("Ignoring response from client");
                None
            }
            MessageKind::Invalid { id } => Some(JsonRpcResponseOut::failure(
                id,
                RpcError::new(error_codes::INVALID_REQUEST, "Invalid Request"),
            )),
        }
    }

    fn handle_request<W>(
        &self,
        id: RequestId,
        json: Value,
        writer: &SharedWriter<W>,
        calls: &mut JoinSet<Result<(), ServerError>>,
    ) -> Option<JsonRpcResponseOut>
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let message: IncomingMessage = match serde_json::from_value(json) {
            Ok(message) => message,
            Err(e) => {
                return Some(JsonRpcResponseOut::failure(
                    Some(id),
                    RpcError::new(error_codes::INVALID_REQUEST, e.to_string()),
                ));
            }
        };
        debug!(%id, method = %message.method, "Request");

        let result = match message.method.as_str() {
            "initialize" => to_value(InitializeResult::new(self.info.clone())),
            "ping" => Ok(Value::Object(Default::default())),
            "tools/list" => to_value(ListToolsResult {
                tools: self.dispatcher.list_tools(),
            }),
            "tools/call" => {
                let request: ToolCallRequest =
                    match serde_json::from_value(message.params.unwrap_or(Value::Null)) {
                        Ok(request) => request,
                        Err(e) => {
                            return Some(JsonRpcResponseOut::failure(
                                Some(id),
                                RpcError::new(
                                    error_codes::INVALID_PARAMS,
                                    format!("Invalid tools/call params: {}", e),
                                ),
                            ));
                        }
                    };
                self.spawn_call(id, request, writer, calls);
                return None;
            }
            other => Err(RpcError::new(
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", other),
            )),
        };

        Some(match result {
            Ok(value) => JsonRpcResponseOut::success(id, value),
            Err(error) => JsonRpcResponseOut::failure(Some(id), error),
        })
    }

    fn spawn_call<W>(
        &self,
        id: RequestId,
        request: ToolCallRequest,
        writer: &SharedWriter<W>,
        calls: &mut JoinSet<Result<(), ServerError>>,
    ) where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let dispatcher = Arc::clone(&self.dispatcher);
        let writer = Arc::clone(writer);

        calls.spawn(async move {
            let tool = request.name.clone();
            info!(%id, %tool, "Tool call");

            let execution = tokio::spawn(async move { dispatcher.execute(&request).await });
            let response = match execution.await {
                Ok(outcome) => {
                    let result = match outcome {
                        Ok(content) => CallToolResult::success(content),
                        Err(e) => {
                            log_tool_error(&id, &tool, &e);
                            CallToolResult::error(e.to_string())
                        }
                    };
                    JsonRpcResponseOut::success(id, serde_json::to_value(result)?)
                }
                Err(e) => {
                    error!(%id, %tool, error = %e, "Tool call task failed");
                    JsonRpcResponseOut::failure(
                        Some(id),
                        RpcError::new(
                            error_codes::INTERNAL_ERROR,
                            format!("Tool call failed: {}", e),
                        ),
                    )
                }
            };
            send(&writer, &response).await
        });
    }

    fn handle_notification(&self, json: &Value) {
        match json.get("method").and_then(Value::as_str) {
            Some("notifications/initialized") => info!("Client initialized"),
            Some(method) => debug!(%method, "Ignoring notification"),
            None => {}
        }
    }
}

fn to_value<T: serde::Serialize>(value: T) -> Result<Value, RpcError> {
    serde_json::to_value(value).map_err(|e| RpcError::new(error_codes::INTERNAL_ERROR, e.to_string()))
}

fn log_tool_error(id: &RequestId, tool: &str, error: &CallToolError) {
    if error.is_request_error() {
        warn!(%id, %tool, error = %error, "Tool call rejected");
    } else {
        warn!(%id, %tool, error = %error, "Tool call failed");
    }
}

fn log_call_outcome(joined: Result<Result<(), ServerError>, tokio::task::JoinError>) {
    match joined {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "Failed to send tool call response"),
        Err(e) => warn!(error = %e, "Tool call response task failed"),
    }
}

async fn send<W>(writer: &SharedWriter<W>, response: &JsonRpcResponseOut) -> Result<(), ServerError>
where
    W: AsyncWrite + Unpin,
{
    let mut json = serde_json::to_string(response)?;
    trace!("Sending: {}", json);
    json.push('\n');

    let mut writer = writer.lock().await;
    writer.write_all(json.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use calmcp_application::ports::authorizer::{AuthorizationError, Authorizer};
    use calmcp_application::ports::calendar_service::{
        CalendarConnector, CalendarError, CalendarService, ServiceHandle,
    };
    use calmcp_application::ports::credential_store::{CredentialStore, CredentialStoreError};
    use calmcp_application::ports::tool_schema::ToolSchemaPort;
    use calmcp_application::ServiceLifecycle;
    use calmcp_domain::tool::entities::ToolDefinition;
    use calmcp_domain::{
        CALENDAR_SCOPE, Credential, Event, EventDraft, EventQuery, SendUpdates,
        calendar_tool_spec,
    };
    use chrono::{Duration, Utc};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};

    // ==================== Test Mocks ====================

    struct NullStore;

    #[async_trait]
    impl CredentialStore for NullStore {
        async fn load(&self) -> Result<Option<Credential>, CredentialStoreError> {
            Ok(None)
        }

        async fn save(&self, _credential: &Credential) -> Result<(), CredentialStoreError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct InstantAuthorizer {
        authorizations: AtomicUsize,
    }

    #[async_trait]
    impl Authorizer for InstantAuthorizer {
        async fn authorize(&self, _scopes: &[String]) -> Result<Credential, AuthorizationError> {
            self.authorizations.fetch_add(1, Ordering::SeqCst);
            Ok(Credential::new("tok", Utc::now() + Duration::hours(1)).with_scopes([CALENDAR_SCOPE]))
        }

        async fn refresh(&self, credential: &Credential) -> Result<Credential, AuthorizationError> {
            Ok(credential.clone())
        }
    }

    struct EchoCalendar;

    #[async_trait]
    impl CalendarService for EchoCalendar {
        async fn insert(
            &self,
            draft: &EventDraft,
            _send_updates: SendUpdates,
        ) -> Result<Event, CalendarError> {
            Ok(Event {
                id: "evt-9".to_string(),
                summary: Some(draft.summary.clone()),
                start: draft.start.clone(),
                end: draft.end.clone(),
                ..Event::default()
            })
        }

        async fn list(&self, _query: &EventQuery) -> Result<Vec<Event>, CalendarError> {
            Ok(Vec::new())
        }
    }

    struct EchoConnector;

    #[async_trait]
    impl CalendarConnector for EchoConnector {
        async fn connect(&self, _credential: Credential) -> Result<ServiceHandle, CalendarError> {
            Ok(Arc::new(EchoCalendar))
        }
    }

    struct PanickingCalendar;

    #[async_trait]
    impl CalendarService for PanickingCalendar {
        async fn insert(
            &self,
            _draft: &EventDraft,
            _send_updates: SendUpdates,
        ) -> Result<Event, CalendarError> {
            panic!("insert exploded")
        }

        async fn list(&self, _query: &EventQuery) -> Result<Vec<Event>, CalendarError> {
            panic!("list exploded")
        }
    }

    struct PanickingConnector;

    #[async_trait]
    impl CalendarConnector for PanickingConnector {
        async fn connect(&self, _credential: Credential) -> Result<ServiceHandle, CalendarError> {
            Ok(Arc::new(PanickingCalendar))
        }
    }

    struct ObjectSchema;

    impl ToolSchemaPort for ObjectSchema {
        fn input_schema(&self, _tool: &ToolDefinition) -> Value {
            json!({"type": "object"})
        }
    }

    // ==================== Harness ====================

    struct Client {
        input: DuplexStream,
        output: BufReader<DuplexStream>,
    }

    impl Client {
        async fn send(&mut self, message: Value) {
            self.send_raw(&message.to_string()).await;
        }

        async fn send_raw(&mut self, line: &str) {
            self.input.write_all(line.as_bytes()).await.unwrap();
            self.input.write_all(b"\n").await.unwrap();
        }

        async fn recv(&mut self) -> Value {
            let mut line = String::new();
            self.output.read_line(&mut line).await.unwrap();
            serde_json::from_str(&line).unwrap()
        }
    }

    fn start() -> (Client, Arc<InstantAuthorizer>, tokio::task::JoinHandle<()>) {
        start_with(Arc::new(EchoConnector))
    }

    fn start_with(
        connector: Arc<dyn CalendarConnector>,
    ) -> (Client, Arc<InstantAuthorizer>, tokio::task::JoinHandle<()>) {
        let authorizer = Arc::new(InstantAuthorizer::default());
        let lifecycle = ServiceLifecycle::new(
            Arc::new(NullStore),
            Arc::clone(&authorizer) as Arc<dyn Authorizer>,
            connector,
            vec![CALENDAR_SCOPE.to_string()],
        );
        let dispatcher = Arc::new(ToolDispatcher::new(
            lifecycle,
            calendar_tool_spec(),
            Arc::new(ObjectSchema),
        ));
        let server = McpServer::new(dispatcher, ServerInfo::new(protocol::SERVER_NAME, "0.1.0"));

        let (client_in, server_in) = tokio::io::duplex(4096);
        let (server_out, client_out) = tokio::io::duplex(4096);
        let handle = tokio::spawn(async move {
            server
                .serve(BufReader::new(server_in), server_out)
                .await
                .unwrap();
        });

        let client = Client {
            input: client_in,
            output: BufReader::new(client_out),
        };
        (client, authorizer, handle)
    }

    #[tokio::test]
    async fn test_initialize_handshake() {
        let (mut client, _, _) = start();

        client
            .send(json!({
                "jsonrpc": "2.0", "id": 1, "method": "initialize",
                "params": {"protocolVersion": "2024-11-05", "capabilities": {},
                           "clientInfo": {"name": "test", "version": "1"}}
            }))
            .await;
        let response = client.recv().await;

        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(response["result"]["serverInfo"]["name"], "googleCalendar");

        // Notifications get no reply; the next response belongs to ping
        client
            .send(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
            .await;
        client.send(json!({"jsonrpc": "2.0", "id": "p", "method": "ping"})).await;
        let response = client.recv().await;
        assert_eq!(response["id"], "p");
        assert_eq!(response["result"], json!({}));
    }

    #[tokio::test]
    async fn test_tools_list_does_not_authorize() {
        let (mut client, authorizer, _) = start();

        client
            .send(json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}))
            .await;
        let response = client.recv().await;

        let names: Vec<&str> = response["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["create-event", "search-events"]);
        assert!(response["result"]["tools"][0]["inputSchema"].is_object());
        assert_eq!(authorizer.authorizations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_tools_call_success() {
        let (mut client, authorizer, _) = start();

        client
            .send(json!({
                "jsonrpc": "2.0", "id": 3, "method": "tools/call",
                "params": {"name": "create-event", "arguments": {
                    "summary": "Standup",
                    "start_time": "2024-12-04T10:00:00Z",
                    "end_time": "2024-12-04T10:15:00Z"
                }}
            }))
            .await;
        let response = client.recv().await;

        assert_eq!(response["id"], 3);
        assert!(response["result"].get("isError").is_none());
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("Created event: Standup"));
        assert!(text.ends_with("ID: evt-9"));
        assert_eq!(authorizer.authorizations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_tool_errors_are_results() {
        let (mut client, authorizer, _) = start();

        client
            .send(json!({
                "jsonrpc": "2.0", "id": 4, "method": "tools/call",
                "params": {"name": "delete-event", "arguments": {"id": "x"}}
            }))
            .await;
        let response = client.recv().await;
        assert_eq!(response["result"]["isError"], true);
        assert_eq!(
            response["result"]["content"][0]["text"],
            "Unknown tool: delete-event"
        );

        client
            .send(json!({
                "jsonrpc": "2.0", "id": 5, "method": "tools/call",
                "params": {"name": "search-events"}
            }))
            .await;
        let response = client.recv().await;
        assert_eq!(response["result"]["content"][0]["text"], "Missing arguments");

        assert_eq!(authorizer.authorizations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let (mut client, _, _) = start();

        client.send_raw("{not json").await;
        let response = client.recv().await;
        assert_eq!(response["error"]["code"], -32700);
        assert_eq!(response["id"], Value::Null);

        client
            .send(json!({"jsonrpc": "2.0", "id": 6, "method": "resources/list"}))
            .await;
        let response = client.recv().await;
        assert_eq!(response["error"]["code"], -32601);
        assert_eq!(response["id"], 6);

        client
            .send(json!({"jsonrpc": "2.0", "id": 7, "method": "tools/call", "params": {}}))
            .await;
        let response = client.recv().await;
        assert_eq!(response["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn test_panicking_call_gets_internal_error() {
        let (mut client, _, _) = start_with(Arc::new(PanickingConnector));

        client
            .send(json!({
                "jsonrpc": "2.0", "id": 9, "method": "tools/call",
                "params": {"name": "search-events", "arguments": {
                    "time_min": "2024-12-01T00:00:00Z",
                    "time_max": "2024-12-31T00:00:00Z"
                }}
            }))
            .await;
        let response = client.recv().await;

        assert_eq!(response["id"], 9);
        assert_eq!(response["error"]["code"], -32603);
        assert!(response.get("result").is_none());

        // The server keeps serving after the failed call
        client.send(json!({"jsonrpc": "2.0", "id": 10, "method": "ping"})).await;
        let response = client.recv().await;
        assert_eq!(response["id"], 10);
        assert_eq!(response["result"], json!({}));
    }

    #[tokio::test]
    async fn test_pending_calls_complete_after_input_closes() {
        let (mut client, _, handle) = start();

        client
            .send(json!({
                "jsonrpc": "2.0", "id": 8, "method": "tools/call",
                "params": {"name": "search-events", "arguments": {
                    "time_min": "2024-12-01T00:00:00Z",
                    "time_max": "2024-12-31T00:00:00Z"
                }}
            }))
            .await;
        let Client { input, mut output } = client;
        drop(input);

        let mut line = String::new();
        output.read_line(&mut line).await.unwrap();
        let response: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(response["result"]["content"][0]["text"], "No events found");

        handle.await.unwrap();
    }
}
