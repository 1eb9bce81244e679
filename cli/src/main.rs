//! CLI entrypoint for calmcp
//!
//! This is the main binary that wires together all layers using
//! dependency injection and serves the calendar tools over stdio.

use anyhow::{Context, Result, anyhow};
use calmcp_application::{ServiceLifecycle, ToolDispatcher};
use calmcp_domain::calendar_tool_spec;
use calmcp_infrastructure::{
    ConfigLoader, FileConfig, FileCredentialStore, GoogleCalendarConnector, GoogleOAuthClient,
    JsonSchemaToolConverter,
};
use calmcp_presentation::{Cli, McpServer, SERVER_NAME, ServerInfo};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // === Configuration ===
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
    }
    .map_err(|e| anyhow!("Failed to load configuration: {}", e))?;

    if cli.show_config {
        let config_path = if cli.no_config {
            None
        } else {
            cli.config.as_deref()
        };
        println!("{}", ConfigLoader::describe_sources(config_path));
        println!();
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    config.validate()?;

    // stdout carries the protocol, so logs never go there
    let _guard = init_logging(cli.verbose, &config)?;

    info!("Starting calmcp {}", env!("CARGO_PKG_VERSION"));

    // === Dependency Injection ===
    let http = reqwest::Client::builder()
        .timeout(config.calendar.timeout())
        .build()
        .context("Failed to build HTTP client")?;

    let store = Arc::new(FileCredentialStore::new(&config.credentials.token_file));
    let authorizer = Arc::new(
        GoogleOAuthClient::new(http.clone(), &config.credentials.client_secret_file)
            .with_redirect(&config.oauth.redirect_host, config.oauth.redirect_port),
    );
    let connector = Arc::new(GoogleCalendarConnector::new(
        http,
        &config.calendar.api_base,
        &config.calendar.calendar_id,
        authorizer.clone(),
        store.clone(),
    ));

    let lifecycle = ServiceLifecycle::new(store, authorizer, connector, config.oauth.scopes.clone());

    if cli.authorize {
        lifecycle
            .ensure_ready()
            .await
            .map_err(|e| anyhow!("Authorization failed: {}", e))?;
        eprintln!(
            "Authorized. Credential stored in {}",
            config.credentials.token_file.display()
        );
        return Ok(());
    }

    let dispatcher = Arc::new(
        ToolDispatcher::new(
            lifecycle,
            calendar_tool_spec(),
            Arc::new(JsonSchemaToolConverter),
        )
        .with_send_updates(config.calendar.send_updates),
    );

    let server = McpServer::new(
        dispatcher,
        ServerInfo::new(SERVER_NAME, env!("CARGO_PKG_VERSION")),
    );

    server
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;

    info!("Client disconnected, shutting down");
    Ok(())
}

/// Install the stderr subscriber and, if configured, the debug log file.
///
/// The returned guard flushes the file writer on drop.
fn init_logging(verbose: u8, config: &FileConfig) -> Result<Option<WorkerGuard>> {
    let stderr_filter = match verbose {
        0 => EnvFilter::try_new(config.logging.level.as_deref().unwrap_or("warn"))
            .context("Invalid logging.level")?,
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(stderr_filter);

    let (file_layer, guard) = match &config.logging.file {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(file_appender(path)?);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(EnvFilter::new("debug"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

fn file_appender(path: &Path) -> Result<tracing_appender::rolling::RollingFileAppender> {
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("logging.file has no file name: {}", path.display()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok(tracing_appender::rolling::never(dir, file_name))
}
