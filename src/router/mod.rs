//! Model name routing
//!
//! Maps the model identifier a client asks for onto the small set of
//! identifiers the upstream API is known to serve. Upstream availability of
//! specific model names changes over time, so the table lives here and
//! nowhere else.

use serde::Serialize;
use thiserror::Error;

/// Model used when a request names none, or names one outside the allow-list
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Identifiers that may be sent upstream
pub const ALLOWED_MODELS: &[&str] = &[DEFAULT_MODEL, "gpt-3.5-turbo"];

/// Aspirational model names and the supported identifier they map to
pub const REMAP_TABLE: &[(&str, &str)] = &[
    ("gpt-4o", DEFAULT_MODEL),
    ("gpt-4.1", DEFAULT_MODEL),
    ("gpt-4.1-mini", DEFAULT_MODEL),
    ("o1-preview", DEFAULT_MODEL),
    ("o1-mini", DEFAULT_MODEL),
];

/// Resolve a requested model name through the remap table
///
/// Names found in [`REMAP_TABLE`] are replaced by their mapped identifier;
/// anything else is returned unchanged.
///
/// # Examples
///
/// ```
/// use chatrelay::router::resolve;
///
/// assert_eq!(resolve("o1-preview"), "gpt-4o-mini");
/// assert_eq!(resolve("gpt-3.5-turbo"), "gpt-3.5-turbo");
/// ```
pub fn resolve(requested: &str) -> &str {
    REMAP_TABLE
        .iter()
        .find(|(from, _)| *from == requested)
        .map(|(_, to)| *to)
        .unwrap_or(requested)
}

/// Whether `model` may be sent upstream as-is
pub fn is_allowed(model: &str) -> bool {
    ALLOWED_MODELS.contains(&model)
}

/// Invalid sampling parameters on a model request
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelRequestError {
    #[error("temperature must be a finite number between 0.0 and 2.0, got {0}")]
    InvalidTemperature(f64),

    #[error("max_tokens must be greater than 0")]
    ZeroMaxTokens,
}

/// A validated model selection plus sampling parameters
///
/// `resolved_model` is always a member of [`ALLOWED_MODELS`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelRequest {
    requested_model: String,
    resolved_model: String,
    temperature: f64,
    max_tokens: u32,
}

impl ModelRequest {
    /// Build a request, resolving the model and validating sampling parameters
    ///
    /// A missing model resolves to [`DEFAULT_MODEL`]. A resolved name that is
    /// not in the allow-list is replaced by [`DEFAULT_MODEL`].
    pub fn new(
        requested: Option<&str>,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<Self, ModelRequestError> {
        if !temperature.is_finite() || !(0.0..=2.0).contains(&temperature) {
            return Err(ModelRequestError::InvalidTemperature(temperature));
        }
        if max_tokens == 0 {
            return Err(ModelRequestError::ZeroMaxTokens);
        }

        let requested_model = requested
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_MODEL)
            .to_string();
        let remapped = resolve(&requested_model);
        let resolved_model = if is_allowed(remapped) {
            remapped.to_string()
        } else {
            tracing::debug!(
                requested_model = %requested_model,
                fallback_model = DEFAULT_MODEL,
                "Requested model is not supported upstream, using default"
            );
            DEFAULT_MODEL.to_string()
        };

        Ok(Self {
            requested_model,
            resolved_model,
            temperature,
            max_tokens,
        })
    }

    pub fn requested_model(&self) -> &str {
        &self.requested_model
    }

    /// The identifier actually sent upstream
    pub fn resolved_model(&self) -> &str {
        &self.resolved_model
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}
