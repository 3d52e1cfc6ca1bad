//! chatrelay - resilient relay between chat clients and an OpenAI-compatible API
//!
//! Completion calls are retried on rate limiting with exponential backoff and
//! classified when they fail for good. A failed call is answered by an offline
//! keyword responder, so every chat request gets a reply. Uploaded documents
//! are reduced to plain text for question answering.

pub mod cli;
pub mod client;
pub mod config;
pub mod conversation;
pub mod documents;
pub mod error;
pub mod extract;
pub mod fallback;
pub mod handlers;
pub mod image;
pub mod metrics;
pub mod middleware;
pub mod pipeline;
pub mod router;
pub mod session;
pub mod telemetry;
