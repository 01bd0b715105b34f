//! Gateway binary entry point: mode selection, signal handling, and the
//! fatal-failure policy live here.

use anyhow::Result;
use mcp_tool_gateway::config::{ServerConfig, TransportMode};
use mcp_tool_gateway::protocol::Dispatcher;
use mcp_tool_gateway::server::{GatewayHandler, ServerStateBuilder};
use mcp_tool_gateway::transport::{HttpTransport, StdioTransport};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    install_panic_hook();

    let remote_flag = std::env::args().any(|arg| arg == "--remote");
    let config = ServerConfig::builder()
        .remote_flag(remote_flag)
        .from_env()
        .build();

    info!(
        "Starting {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );
    info!(
        "Mode: {}",
        if config.mode.is_remote() {
            "remote (HTTP)"
        } else {
            "local (stdio)"
        }
    );

    let state = Arc::new(ServerStateBuilder::new().config(config.clone()).build()?);
    info!("Registered tools: {}", state.tools.names().join(", "));

    let handler = Arc::new(GatewayHandler::new(Arc::clone(&state)));

    match config.mode {
        TransportMode::Remote => {
            let transport = Arc::new(HttpTransport::new(state, handler));
            transport.serve(shutdown_signal()).await?;
        }
        TransportMode::Local => {
            let dispatcher = Dispatcher::new(handler);
            let transport = StdioTransport::new();

            tokio::select! {
                result = transport.serve(&dispatcher) => result?,
                _ = shutdown_signal() => {}
            }
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mcp_tool_gateway=info,warn"));

    // Structured JSON logging to stderr (stdout is reserved for the stdio
    // transport's protocol frames).
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .json()
        .init();
}

/// Log every panic through tracing before the default hook runs. Panics in
/// spawned tasks are survived by the runtime; a panic on the main thread
/// still unwinds to a non-zero exit, since continuing in an unknown state
/// is worse than restarting.
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        error!("Uncaught panic: {}", panic_info);
        default_hook(panic_info);
    }));
}

/// Resolves when an interrupt or terminate signal arrives. Both produce a
/// clean zero-exit shutdown.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install interrupt handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => info!("Interrupt received, shutting down gracefully"),
        _ = terminate => info!("Terminate received, shutting down gracefully"),
    }
}
