//! Command-line interface for chatrelay
//!
//! Provides argument parsing and subcommand handling for the chatrelay binary.

use clap::{Parser, Subcommand};

/// Resilient relay between chat clients and an OpenAI-compatible API
#[derive(Parser)]
#[command(name = "chatrelay")]
#[command(version)]
#[command(about = "Resilient relay between chat clients and an OpenAI-compatible API")]
#[command(
    long_about = "chatrelay forwards chat and image requests to an OpenAI-compatible \
    upstream, retries rate-limited calls with exponential backoff, and answers with \
    an offline fallback responder when the upstream cannot be reached."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# chatrelay Configuration
# ========================
#
# Every section is optional. Values shown are the built-in defaults.

# ─────────────────────────────────────────────────────────────────────────────
# SERVER
# ─────────────────────────────────────────────────────────────────────────────

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "127.0.0.1"

# Port to listen on
port = 3001

# ─────────────────────────────────────────────────────────────────────────────
# UPSTREAM API
# ─────────────────────────────────────────────────────────────────────────────

[upstream]
# OpenAI-compatible base URL (must start with http:// or https://)
base_url = "https://api.openai.com/v1"

# Environment variable holding the API key. The key itself never goes in
# this file.
api_key_env = "OPENAI_API_KEY"

# Per-attempt timeouts in seconds (1-300)
chat_timeout_seconds = 30
image_timeout_seconds = 60

# ─────────────────────────────────────────────────────────────────────────────
# RETRY
# ─────────────────────────────────────────────────────────────────────────────
#
# Only rate-limited (HTTP 429) completions are retried. The wait before
# attempt n+1 is base_backoff_ms * 2^(n-1), capped at 30 seconds.

[retry]
max_attempts = 3
base_backoff_ms = 2000

# ─────────────────────────────────────────────────────────────────────────────
# COMPLETION DEFAULTS
# ─────────────────────────────────────────────────────────────────────────────

[completion]
# Supported: "gpt-4o-mini", "gpt-3.5-turbo". Other names are remapped.
model = "gpt-4o-mini"

# Sampling temperature (0.0-2.0)
temperature = 0.7

max_tokens = 1024

# Prior transcript messages sent along with each new chat message
history_limit = 10

# ─────────────────────────────────────────────────────────────────────────────
# DOCUMENTS
# ─────────────────────────────────────────────────────────────────────────────

[documents]
# Upload ceiling in bytes (10 MB)
max_file_bytes = 10485760

# ─────────────────────────────────────────────────────────────────────────────
# SESSION
# ─────────────────────────────────────────────────────────────────────────────

[session]
# Name used in the system prompt and in failure notices
display_name = "User"

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error"
# RUST_LOG takes precedence when set.
log_level = "info"

# Prometheus metrics are always available at /metrics on the server port
"#
}
