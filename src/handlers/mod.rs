//! HTTP request handlers for the chatrelay API

use crate::client::{
    CompletionClient, CompletionConfig, CompletionTransport, Credential, UpstreamClient,
};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::metrics::Metrics;
use crate::middleware::request_id_middleware;
use crate::pipeline::ChatPipeline;
use crate::router::ModelRequest;
use crate::session::SessionState;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    handler::Handler,
    http::{Method, StatusCode, header},
    middleware,
    routing::{MethodRouter, delete, get, post},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod chat;
pub mod documents;
pub mod extractor;
pub mod health;
pub mod history;
pub mod image;
pub mod metrics;
pub mod relay;
pub mod settings;

pub use extractor::ApiJson;

/// Application state shared across all handlers
///
/// All fields are Arc'd for cheap cloning across Axum handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    upstream: Arc<UpstreamClient>,
    pipeline: Arc<ChatPipeline>,
    session: Arc<RwLock<SessionState>>,
    metrics: Arc<Metrics>,
}

impl AppState {
    /// Create state that talks to the configured upstream
    pub fn new(config: Config, credential: Option<Credential>) -> AppResult<Self> {
        let upstream = UpstreamClient::new(&config.upstream.base_url, credential)?;
        let transport: Arc<dyn CompletionTransport> = Arc::new(upstream.clone());
        Self::with_transport(config, upstream, transport)
    }

    /// Create state with a custom completion transport
    ///
    /// The relay and image endpoints still go through `upstream`.
    pub fn with_transport(
        config: Config,
        upstream: UpstreamClient,
        transport: Arc<dyn CompletionTransport>,
    ) -> AppResult<Self> {
        let metrics = Arc::new(
            Metrics::new()
                .map_err(|e| AppError::Internal(format!("Failed to initialize metrics: {}", e)))?,
        );
        let policy = config.retry.policy()?;
        let client = CompletionClient::new(transport, policy).with_metrics(metrics.clone());
        let pipeline = ChatPipeline::new(client).with_metrics(metrics.clone());
        let session = SessionState::new(config.session.display_name.clone());

        Ok(Self {
            config: Arc::new(config),
            upstream: Arc::new(upstream),
            pipeline: Arc::new(pipeline),
            session: Arc::new(RwLock::new(session)),
            metrics,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn upstream(&self) -> &UpstreamClient {
        &self.upstream
    }

    pub fn pipeline(&self) -> &ChatPipeline {
        &self.pipeline
    }

    pub fn session(&self) -> &RwLock<SessionState> {
        &self.session
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        self.metrics.clone()
    }

    /// Completion settings for one call, using the configured defaults
    pub fn completion_config(
        &self,
        model: Option<&str>,
        display_name: &str,
    ) -> AppResult<CompletionConfig> {
        let defaults = &self.config.completion;
        let request = ModelRequest::new(
            model.or(Some(defaults.model.as_str())),
            defaults.temperature,
            defaults.max_tokens,
        )
        .map_err(|e| AppError::Validation(e.to_string()))?;
        Ok(CompletionConfig::new(
            request,
            display_name,
            self.config.upstream.chat_timeout(),
        ))
    }
}

/// Build the full application router
pub fn build_router(state: AppState) -> Router {
    let upload_limit = upload_body_limit(state.config().documents.max_file_bytes);

    Router::new()
        .route("/health", get(health::handler))
        .route("/metrics", get(metrics::handler))
        .route("/api/chat", post_only(relay::handler))
        .route("/generate-image", post_only(image::handler))
        .route("/api/generate-image", post_only(image::handler))
        .route("/api/credential-status", get(settings::credential_status))
        .route(
            "/api/settings",
            get(settings::get_settings).put(settings::update_settings),
        )
        .route(
            "/api/modes/{mode}/messages",
            get(chat::list_messages)
                .post(chat::send_message)
                .delete(chat::clear_messages),
        )
        .route("/api/code-review", post(chat::code_review))
        .route(
            "/api/documents",
            get(documents::list)
                .post(documents::upload)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/documents/{id}", delete(documents::remove))
        .route("/api/documents/{id}/ask", post(documents::ask))
        .route(
            "/api/history",
            get(history::list)
                .post(history::archive)
                .delete(history::clear),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .layer(middleware::from_fn(request_id_middleware))
}

/// One byte over the upload limit, so oversize bodies are detected by the handler
fn upload_body_limit(max_file_bytes: u64) -> usize {
    usize::try_from(max_file_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(1)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
}

/// POST route that answers OPTIONS with 200 and any other method with 405
fn post_only<H, T>(handler: H) -> MethodRouter<AppState>
where
    H: Handler<T, AppState>,
    T: 'static,
{
    post(handler)
        .options(preflight)
        .fallback(method_not_allowed)
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
