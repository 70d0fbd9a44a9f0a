//! # Queue Inspector CLI
//!
//! Command-line interface for read-only inspection of a Service Bus queue
//! or topic subscription and its dead-letter queue.
//!
//! This module provides CLI commands for:
//! - Serving the inspection tools to AI agents over MCP (stdio or HTTP)
//! - Serving the HTTP API
//! - One-shot listing and fetching of messages
//! - Configuration validation
//!
//! Logs always go to stderr; stdout carries the MCP transport and command
//! output.

use async_trait::async_trait;
use clap::{CommandFactory, Parser, Subcommand};
use queue_inspector_core::{
    BackendConnector, ConfigError, InspectorClient, InspectorError, InspectorSettings,
    MessageSummary, ProviderError, QueueTargets, RangeError, ReadKind, ReceiverFactory,
    SequenceNumber, ServerSettings, TimeRange,
};
use queue_inspector_mcp::InspectorMcpServer;
use rmcp::{transport::stdio, ServiceExt};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

// ============================================================================
// CLI Structure
// ============================================================================

/// Queue Inspector - read-only Azure Service Bus inspection
#[derive(Debug, Parser)]
#[command(name = "queue-inspector")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Read-only inspection of Azure Service Bus queues and dead-letter queues")]
#[command(
    long_about = "Queue Inspector peeks messages on a Service Bus queue or topic subscription and its dead-letter queue without receiving, locking or deleting them"
)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "QUEUE_INSPECTOR_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Service Bus connection string, overriding the configuration file
    #[arg(long, env = "SERVICEBUS_CONNECTION_STRING", hide_env_values = true)]
    pub connection_string: Option<String>,

    /// Logging level, used when RUST_LOG is not set
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    pub json_logs: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve the inspection tools over MCP
    Mcp {
        /// Transport to serve on
        #[arg(short, long, value_enum, default_value = "stdio")]
        transport: McpTransport,

        /// Host to bind for the HTTP transport, overriding the configuration file
        #[arg(long)]
        host: Option<String>,

        /// Port to bind for the HTTP transport, overriding the configuration file
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run the HTTP API
    Serve {
        /// Host to bind, overriding the configuration file
        #[arg(long)]
        host: Option<String>,

        /// Port to bind, overriding the configuration file
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List message summaries, optionally bounded by enqueue time
    List {
        /// RFC3339 start time (inclusive)
        #[arg(long)]
        from: Option<String>,

        /// RFC3339 end time (inclusive)
        #[arg(long)]
        to: Option<String>,

        /// Read the dead-letter queue
        #[arg(short, long)]
        dead_letter: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show one message by sequence number
    Show {
        /// Sequence number of the message
        sequence: SequenceNumber,

        /// Read the dead-letter queue
        #[arg(short, long)]
        dead_letter: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Validate configuration
    Config {
        /// Show resolved configuration
        #[arg(short, long)]
        show: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// MCP transport options
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum McpTransport {
    /// Standard input and output, for agents that spawn the binary
    Stdio,
    /// Streamable HTTP with server-sent events, mounted at `/mcp`
    #[value(alias = "sse")]
    Http,
}

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}

// ============================================================================
// CLI Error Types
// ============================================================================

/// CLI-specific errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Backend error: {message}")]
    Backend { message: String },

    #[error("Command failed: {message}")]
    CommandFailed { message: String },

    #[error("Invalid argument: {arg} - {message}")]
    InvalidArgument { arg: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) => 1,
            Self::Backend { .. } => 2,
            Self::CommandFailed { .. } => 3,
            Self::InvalidArgument { .. } => 4,
            Self::Io(_) => 5,
        }
    }

    fn command_failed(error: impl std::fmt::Display) -> Self {
        Self::CommandFailed {
            message: error.to_string(),
        }
    }

    /// Client construction fails either on configuration or on the backend
    fn from_connect(error: ConfigError) -> Self {
        if matches!(error, ConfigError::Connect(_)) {
            Self::Backend {
                message: error.to_string(),
            }
        } else {
            Self::Configuration(error)
        }
    }
}

impl From<InspectorError> for CliError {
    fn from(error: InspectorError) -> Self {
        if error.provider_error().is_some() {
            Self::Backend {
                message: error.to_string(),
            }
        } else {
            Self::command_failed(error)
        }
    }
}

impl From<RangeError> for CliError {
    fn from(error: RangeError) -> Self {
        let RangeError::InvalidBound { bound, .. } = &error;
        Self::InvalidArgument {
            arg: format!("--{}", bound),
            message: error.to_string(),
        }
    }
}

// ============================================================================
// Backend Selection
// ============================================================================

/// Stand-in used when the binary is built without a real backend
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedConnector;

#[async_trait]
impl BackendConnector for UnsupportedConnector {
    async fn connect(
        &self,
        _connection_string: &str,
    ) -> Result<Arc<dyn ReceiverFactory>, ProviderError> {
        Err(ProviderError::Provider {
            provider: "AzureServiceBus".to_string(),
            code: "FeatureDisabled".to_string(),
            message: "built without Azure Service Bus support; rebuild with `--features azure`"
                .to_string(),
        })
    }
}

/// Connector for the backend compiled into this binary
pub fn default_connector() -> Box<dyn BackendConnector> {
    #[cfg(feature = "azure")]
    {
        Box::new(queue_inspector_core::providers::AzureServiceBusConnector)
    }

    #[cfg(not(feature = "azure"))]
    {
        Box::new(UnsupportedConnector)
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

/// Main CLI entry point
pub async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();

    initialize_logging(&cli)?;

    let connector = default_connector();
    let mut stdout = std::io::stdout();
    run(cli, connector.as_ref(), &mut stdout).await
}

/// Execute a parsed command line against `connector`, writing command
/// output to `out`
pub async fn run(
    cli: Cli,
    connector: &dyn BackendConnector,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let Cli {
        config,
        connection_string,
        command,
        ..
    } = cli;

    if let Commands::Completions { shell } = command {
        return execute_completions_command(shell, out);
    }

    let settings = InspectorSettings::load(&config, connection_string)?;

    match command {
        Commands::Config { show } => execute_config_command(&config, &settings, show, out),
        Commands::Mcp {
            transport,
            host,
            port,
        } => {
            let client = connect_client(&settings, connector).await?;
            match transport {
                McpTransport::Stdio => execute_mcp_command(client).await,
                McpTransport::Http => {
                    let server = bind_settings(&settings.server, host, port);
                    execute_mcp_http_command(client, &server).await
                }
            }
        }
        Commands::Serve { host, port } => {
            let client = connect_client(&settings, connector).await?;
            let server = bind_settings(&settings.server, host, port);
            execute_serve_command(client, &server).await
        }
        Commands::List {
            from,
            to,
            dead_letter,
            format,
        } => {
            let range = TimeRange::parse(from.as_deref(), to.as_deref())?;
            let client = connect_client(&settings, connector).await?;
            execute_list_command(&client, &range, dead_letter, format, out).await
        }
        Commands::Show {
            sequence,
            dead_letter,
            format,
        } => {
            let client = connect_client(&settings, connector).await?;
            execute_show_command(&client, sequence, dead_letter, format, out).await
        }
        Commands::Completions { .. } => Ok(()),
    }
}

// ============================================================================
// Initialization
// ============================================================================

/// Install the global subscriber. `RUST_LOG` wins over `--log-level`.
fn initialize_logging(cli: &Cli) -> Result<(), CliError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&cli.log_level).map_err(|e| CliError::InvalidArgument {
            arg: "--log-level".to_string(),
            message: e.to_string(),
        })?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let result = if cli.json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    result.map_err(CliError::command_failed)
}

/// Listener settings with command-line overrides applied
fn bind_settings(
    configured: &ServerSettings,
    host: Option<String>,
    port: Option<u16>,
) -> ServerSettings {
    ServerSettings {
        host: host.unwrap_or_else(|| configured.host.clone()),
        port: port.unwrap_or(configured.port),
    }
}

async fn connect_client(
    settings: &InspectorSettings,
    connector: &dyn BackendConnector,
) -> Result<Arc<InspectorClient>, CliError> {
    let client = InspectorClient::connect(&settings.service_bus, connector)
        .await
        .map_err(CliError::from_connect)?;
    Ok(Arc::new(client))
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn execute_mcp_command(client: Arc<InspectorClient>) -> Result<(), CliError> {
    info!("Starting MCP server on stdio");

    let service = InspectorMcpServer::new(client)
        .serve(stdio())
        .await
        .map_err(CliError::command_failed)?;
    let reason = service.waiting().await.map_err(CliError::command_failed)?;

    info!(reason = ?reason, "MCP server stopped");
    Ok(())
}

async fn execute_mcp_http_command(
    client: Arc<InspectorClient>,
    server: &ServerSettings,
) -> Result<(), CliError> {
    let address = format!("{}:{}", server.host, server.port);
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| CliError::CommandFailed {
            message: format!("failed to bind {}: {}", address, e),
        })?;

    queue_inspector_mcp::serve_http(listener, client, queue_inspector_api::shutdown_signal())
        .await?;

    info!("MCP server stopped");
    Ok(())
}

async fn execute_serve_command(
    client: Arc<InspectorClient>,
    server: &ServerSettings,
) -> Result<(), CliError> {
    queue_inspector_api::start_server(client, server)
        .await
        .map_err(CliError::command_failed)
}

async fn execute_list_command(
    client: &InspectorClient,
    range: &TimeRange,
    dead_letter: bool,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let kind = ReadKind::from_dead_letter_flag(dead_letter);
    let messages = client.list(kind, range).await?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&messages).map_err(CliError::command_failed)?;
            writeln!(out, "{}", json)?;
        }
        OutputFormat::Text => write_summaries(out, kind, &messages)?,
    }
    Ok(())
}

fn write_summaries(
    out: &mut dyn Write,
    kind: ReadKind,
    messages: &[MessageSummary],
) -> std::io::Result<()> {
    if messages.is_empty() {
        return writeln!(out, "No {} messages found", kind);
    }

    writeln!(out, "{:>12}  ENQUEUED", "SEQUENCE")?;
    for message in messages {
        writeln!(
            out,
            "{:>12}  {}",
            message.sequence_number,
            message.enqueued_time.to_rfc3339()
        )?;
    }
    writeln!(out, "{} {} message(s)", messages.len(), kind)
}

async fn execute_show_command(
    client: &InspectorClient,
    sequence: SequenceNumber,
    dead_letter: bool,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let details = client.fetch_message(sequence, dead_letter).await?.to_details();

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&details).map_err(CliError::command_failed)?;
            writeln!(out, "{}", json)?;
        }
        OutputFormat::Text => {
            writeln!(out, "Sequence number: {}", details.sequence_number)?;
            writeln!(out, "Enqueued time:   {}", details.enqueued_time)?;

            let system = &details.system_properties;
            let fields = [
                ("Message ID", &system.message_id),
                ("Content type", &system.content_type),
                ("Correlation ID", &system.correlation_id),
                ("Subject", &system.subject),
                ("To", &system.to),
                ("Reply to", &system.reply_to),
                ("Reply to session", &system.reply_to_session_id),
                ("Session ID", &system.session_id),
            ];
            for (label, value) in fields {
                if let Some(value) = value {
                    writeln!(out, "{:<17}{}", format!("{}:", label), value)?;
                }
            }

            if !details.properties.is_empty() {
                writeln!(out, "Properties:")?;
                for (key, value) in &details.properties {
                    writeln!(out, "  {} = {}", key, value)?;
                }
            }

            writeln!(out, "Body:")?;
            writeln!(out, "{}", details.body)?;
        }
    }
    Ok(())
}

/// Resolved configuration as printed by `config --show`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolvedConfig {
    config_file: String,
    connection_string: &'static str,
    peek_batch_size: u32,
    targets: QueueTargets,
    server: ServerSettings,
}

fn execute_config_command(
    path: &Path,
    settings: &InspectorSettings,
    show: bool,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let targets = settings.service_bus.targets();
    if targets.live().is_err() {
        return Err(ConfigError::MissingTarget.into());
    }

    if !show {
        writeln!(out, "Configuration is valid: {}", path.display())?;
        return Ok(());
    }

    let resolved = ResolvedConfig {
        config_file: path.display().to_string(),
        connection_string: "<REDACTED>",
        peek_batch_size: settings.service_bus.peek_batch_size,
        targets,
        server: settings.server.clone(),
    };
    let yaml = serde_yaml::to_string(&resolved).map_err(CliError::command_failed)?;
    write!(out, "{}", yaml)?;
    Ok(())
}

/// Execute completions command
fn execute_completions_command(
    shell: clap_complete::Shell,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, out);
    Ok(())
}
