//! chatrelay HTTP server
//!
//! Starts an Axum web server that relays chat and image requests upstream.

use chatrelay::{
    cli::{Cli, Command, generate_config_template},
    client::Credential,
    config::Config,
    handlers::{self, AppState},
    telemetry,
};
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Command::Config { output }) = cli.command {
        let template = generate_config_template();
        match output {
            Some(path) => {
                std::fs::write(&path, template)?;
                println!("Wrote configuration template to {}", path);
            }
            None => print!("{}", template),
        }
        return Ok(());
    }

    // The default path is optional; an explicitly named file must exist
    let config = if cli.config == "config.toml" && !Path::new(&cli.config).exists() {
        Config::default()
    } else {
        Config::from_file(&cli.config)?
    };

    telemetry::init(&config.observability.log_level);

    let credential = Credential::from_env(&config.upstream.api_key_env);
    match &credential {
        Some(key) => tracing::info!(
            env_var = %config.upstream.api_key_env,
            key_length = key.len(),
            "Upstream API key loaded"
        ),
        None => tracing::warn!(
            env_var = %config.upstream.api_key_env,
            "No upstream API key found. Chat replies will come from the fallback responder \
            and images will be placeholders"
        ),
    }

    let host: IpAddr = config.server.host.parse().map_err(|e| {
        format!(
            "server.host '{}' is not a valid IP address: {}",
            config.server.host, e
        )
    })?;
    let addr = SocketAddr::from((host, config.server.port));

    tracing::info!(
        upstream = %config.upstream.base_url,
        model = %config.completion.model,
        "Starting chatrelay server on {}",
        addr
    );

    let state = AppState::new(config, credential)?;
    let app = handlers::build_router(state);

    tracing::info!("Health check available at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    wait_for_signal(tokio::signal::ctrl_c()).await
}

/// Resolve once `signal` fires
///
/// If the signal cannot be registered this never resolves, so the server
/// keeps running without graceful shutdown.
async fn wait_for_signal<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
