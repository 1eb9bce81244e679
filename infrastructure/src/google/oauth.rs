//! Google OAuth 2.0 for installed applications.
//!
//! Interactive authorization uses the loopback redirect flow with PKCE:
//!
//! ```text
//! bind 127.0.0.1:<port>  ──▶  print consent URL  ──▶  user approves in browser
//!                                                          │
//! token endpoint  ◀──  code + verifier  ◀──  GET /?code=..&state=..
//! ```
//!
//! The redirect listener is a `tiny_http` server: every connection is served
//! on its own thread, so an idle connection (a browser preconnect) never
//! holds up the redirect.
//!
//! Refresh posts the stored refresh token to the same token endpoint. The
//! client secret file is read on every flow, so replacing it takes effect
//! without a restart.

use super::wire::{TokenErrorResponse, TokenResponse};
use crate::credentials::ClientSecret;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use calmcp_application::ports::authorizer::{AuthorizationError, Authorizer};
use calmcp_domain::Credential;
use chrono::{TimeDelta, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tiny_http::{Header, Request, Response, Server};
use tracing::{debug, info};
use url::Url;

const SUCCESS_PAGE: &str =
    "The authentication flow has completed. You may close this window.";

/// [`Authorizer`] backed by Google's OAuth endpoints.
pub struct GoogleOAuthClient {
    http: reqwest::Client,
    client_secret_file: PathBuf,
    redirect_host: String,
    redirect_port: u16,
}

impl GoogleOAuthClient {
    pub fn new(http: reqwest::Client, client_secret_file: impl Into<PathBuf>) -> Self {
        Self {
            http,
            client_secret_file: client_secret_file.into(),
            redirect_host: "127.0.0.1".to_string(),
            redirect_port: 0,
        }
    }

    /// Where the loopback listener binds (port 0 picks a free port).
    pub fn with_redirect(mut self, host: impl Into<String>, port: u16) -> Self {
        self.redirect_host = host.into();
        self.redirect_port = port;
        self
    }

    async fn client(&self) -> Result<ClientSecret, AuthorizationError> {
        ClientSecret::load(&self.client_secret_file)
            .await
            .map_err(|e| AuthorizationError::ClientSecret(e.to_string()))
    }

    /// Bind the redirect listener and build the consent URL.
    pub async fn start(&self, scopes: &[String]) -> Result<PendingAuthorization, AuthorizationError> {
        let client = self.client().await?;

        let server = Server::http((self.redirect_host.as_str(), self.redirect_port))
            .map_err(|e| AuthorizationError::Flow(format!("cannot bind redirect listener: {}", e)))?;
        let port = server
            .server_addr()
            .to_ip()
            .ok_or_else(|| AuthorizationError::Flow("redirect listener has no IP address".to_string()))?
            .port();
        let redirect_uri = format!("http://{}:{}/", self.redirect_host, port);

        let verifier = random_token(32);
        let state = random_token(16);
        let url = consent_url(&client, &redirect_uri, scopes, &state, &code_challenge(&verifier))?;

        Ok(PendingAuthorization {
            http: self.http.clone(),
            client,
            server: Arc::new(server),
            redirect_uri,
            url,
            state,
            verifier,
            scopes: scopes.to_vec(),
        })
    }
}

#[async_trait]
impl Authorizer for GoogleOAuthClient {
    async fn authorize(&self, scopes: &[String]) -> Result<Credential, AuthorizationError> {
        let pending = self.start(scopes).await?;
        info!(redirect_uri = %pending.redirect_uri, "Waiting for browser authorization");
        // stdout carries the protocol
        eprintln!(
            "Please visit this URL to authorize this application: {}",
            pending.url()
        );
        pending.complete().await
    }

    async fn refresh(&self, credential: &Credential) -> Result<Credential, AuthorizationError> {
        let refresh_token = credential
            .refresh_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AuthorizationError::TokenExchange("credential has no refresh token".to_string())
            })?;
        let client = self.client().await?;

        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", client.client_id.as_str()),
        ];
        if let Some(secret) = &client.client_secret {
            form.push(("client_secret", secret.as_str()));
        }

        let response = request_token(&self.http, &client.token_uri, &form).await?;
        debug!("Access token refreshed");
        into_credential(response, Some(refresh_token), credential.scopes.iter().cloned())
    }
}

/// An interactive authorization waiting for the browser redirect.
///
/// Dropping it shuts the redirect listener down.
pub struct PendingAuthorization {
    http: reqwest::Client,
    client: ClientSecret,
    server: Arc<Server>,
    redirect_uri: String,
    url: Url,
    state: String,
    verifier: String,
    scopes: Vec<String>,
}

impl PendingAuthorization {
    /// Consent page the user must open.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Wait for the redirect and exchange its code for a credential.
    pub async fn complete(self) -> Result<Credential, AuthorizationError> {
        let server = Arc::clone(&self.server);
        let state = self.state.clone();
        let code = tokio::task::spawn_blocking(move || wait_for_code(&server, &state))
            .await
            .map_err(|e| AuthorizationError::Flow(format!("redirect listener failed: {}", e)))??;
        debug!("Authorization code received");

        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.client.client_id.as_str()),
            ("code_verifier", self.verifier.as_str()),
        ];
        if let Some(secret) = &self.client.client_secret {
            form.push(("client_secret", secret.as_str()));
        }

        let response = request_token(&self.http, &self.client.token_uri, &form).await?;
        info!("Authorization completed");
        into_credential(response, None, self.scopes.iter().cloned())
    }
}

impl Drop for PendingAuthorization {
    fn drop(&mut self) {
        // Releases a thread still blocked in `recv`
        self.server.unblock();
    }
}

/// URL-safe random string carrying `bytes` bytes of entropy.
fn random_token(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    OsRng.fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}

/// S256 PKCE challenge (RFC 7636 §4.2).
fn code_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

fn consent_url(
    client: &ClientSecret,
    redirect_uri: &str,
    scopes: &[String],
    state: &str,
    challenge: &str,
) -> Result<Url, AuthorizationError> {
    let scope = scopes.join(" ");
    Url::parse_with_params(
        &client.auth_uri,
        [
            ("response_type", "code"),
            ("client_id", client.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("scope", scope.as_str()),
            ("state", state),
            ("code_challenge", challenge),
            ("code_challenge_method", "S256"),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ],
    )
    .map_err(|e| AuthorizationError::ClientSecret(format!("invalid auth_uri: {}", e)))
}

/// Serve redirect requests until one carries the authorization result.
///
/// Blocking; runs on the blocking pool.
fn wait_for_code(server: &Server, state: &str) -> Result<String, AuthorizationError> {
    loop {
        let request = server
            .recv()
            .map_err(|e| AuthorizationError::Flow(format!("redirect listener stopped: {}", e)))?;
        debug!(url = %request.url(), "Redirect request received");

        match parse_redirect(request.url(), state) {
            Ok(Some(code)) => {
                reply(request, 200, SUCCESS_PAGE);
                return Ok(code);
            }
            Ok(None) => reply(request, 404, "Not found"),
            Err(e) => {
                reply(request, 400, &e.to_string());
                return Err(e);
            }
        }
    }
}

fn reply(request: Request, status: u16, body: &str) {
    let mut response = Response::from_string(body).with_status_code(status);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], &b"text/plain; charset=utf-8"[..]) {
        response = response.with_header(header);
    }
    if let Err(e) = request.respond(response) {
        debug!(error = %e, "Failed to answer redirect request");
    }
}

/// Extract the authorization code from a redirect request target.
///
/// `Ok(None)` for requests that are not the redirect (e.g. `/favicon.ico`).
fn parse_redirect(target: &str, state: &str) -> Result<Option<String>, AuthorizationError> {
    let url = Url::parse("http://localhost")
        .and_then(|base| base.join(target))
        .map_err(|e| AuthorizationError::Flow(format!("malformed redirect target: {}", e)))?;

    if url.path() != "/" {
        return Ok(None);
    }

    let params: HashMap<String, String> = url.query_pairs().into_owned().collect();

    if let Some(error) = params.get("error") {
        return Err(AuthorizationError::Denied(error.clone()));
    }
    if params.get("state").map(String::as_str) != Some(state) {
        return Err(AuthorizationError::Flow(
            "redirect state does not match the request".to_string(),
        ));
    }
    match params.get("code") {
        Some(code) if !code.is_empty() => Ok(Some(code.clone())),
        _ => Err(AuthorizationError::Flow(
            "redirect carried no authorization code".to_string(),
        )),
    }
}

async fn request_token(
    http: &reqwest::Client,
    token_uri: &str,
    form: &[(&str, &str)],
) -> Result<TokenResponse, AuthorizationError> {
    let response = http
        .post(token_uri)
        .form(form)
        .send()
        .await
        .map_err(|e| AuthorizationError::TokenExchange(e.to_string()))?;

    let status = response.status();
    if status.is_success() {
        return response
            .json::<TokenResponse>()
            .await
            .map_err(|e| AuthorizationError::TokenExchange(format!("unexpected response: {}", e)));
    }

    let body = response.text().await.unwrap_or_default();
    let reason = serde_json::from_str::<TokenErrorResponse>(&body)
        .map(|e| e.to_string())
        .unwrap_or(body);
    Err(AuthorizationError::TokenExchange(format!(
        "status {}: {}",
        status.as_u16(),
        reason
    )))
}

/// Build a credential from a token response.
///
/// The response's refresh token wins over `previous_refresh`; granted scopes
/// win over `requested`. An `expires_in` that does not fit a timestamp is a
/// token exchange error.
fn into_credential(
    response: TokenResponse,
    previous_refresh: Option<&str>,
    requested: impl IntoIterator<Item = String>,
) -> Result<Credential, AuthorizationError> {
    let expiry = TimeDelta::try_seconds(response.expires_in)
        .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
        .ok_or_else(|| {
            AuthorizationError::TokenExchange(format!(
                "token lifetime out of range: expires_in={}",
                response.expires_in
            ))
        })?;
    let scopes = response
        .granted_scopes()
        .unwrap_or_else(|| requested.into_iter().collect());
    let credential = Credential::new(response.access_token, expiry).with_scopes(scopes);

    Ok(match response.refresh_token.as_deref().or(previous_refresh) {
        Some(refresh_token) => credential.with_refresh_token(refresh_token),
        None => credential,
    })
}
