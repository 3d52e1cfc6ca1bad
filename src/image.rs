//! Image generation relay
//!
//! Prompts are normalized before going upstream. Any upstream failure,
//! a missing credential included, is answered with a placeholder image so
//! the caller always receives a usable URL.

use crate::client::transport::{IMAGE_GENERATIONS_PATH, TransportError, UpstreamClient};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

pub const IMAGE_MODEL: &str = "dall-e-3";
pub const IMAGE_QUALITY: &str = "standard";

/// Prompts shorter than this (in characters) get a descriptive prefix
const MIN_PROMPT_CHARS: usize = 10;
const SHORT_PROMPT_PREFIX: &str = "A beautiful and detailed ";

static TRAILING_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+in\s+\w+\s+style\s*$").expect("Valid style suffix regex"));

/// Supported output sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageSize {
    #[default]
    #[serde(rename = "1024x1024")]
    Square,
    #[serde(rename = "1792x1024")]
    Landscape,
    #[serde(rename = "1024x1792")]
    Portrait,
}

impl ImageSize {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            ImageSize::Square => (1024, 1024),
            ImageSize::Landscape => (1792, 1024),
            ImageSize::Portrait => (1024, 1792),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::Square => "1024x1024",
            ImageSize::Landscape => "1792x1024",
            ImageSize::Portrait => "1024x1792",
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1024x1024" => Ok(ImageSize::Square),
            "1792x1024" => Ok(ImageSize::Landscape),
            "1024x1792" => Ok(ImageSize::Portrait),
            other => Err(format!(
                "Unsupported image size '{}'. Expected one of: 1024x1024, 1792x1024, 1024x1792",
                other
            )),
        }
    }
}

/// Strip a trailing "in <word> style" and pad very short prompts
///
/// # Examples
///
/// ```
/// use chatrelay::image::normalize_prompt;
///
/// assert_eq!(normalize_prompt("a lighthouse at dawn in watercolor style"), "a lighthouse at dawn");
/// assert_eq!(normalize_prompt("cat"), "A beautiful and detailed cat");
/// ```
pub fn normalize_prompt(prompt: &str) -> String {
    let cleaned = TRAILING_STYLE.replace(prompt, "");
    let cleaned = cleaned.trim();
    if cleaned.chars().count() < MIN_PROMPT_CHARS {
        format!("{}{}", SHORT_PROMPT_PREFIX, cleaned)
    } else {
        cleaned.to_string()
    }
}

/// Body of an image generation request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageRequestBody {
    pub model: &'static str,
    pub prompt: String,
    pub size: ImageSize,
    pub quality: &'static str,
    pub n: u32,
}

impl ImageRequestBody {
    pub fn new(prompt: &str, size: ImageSize) -> Self {
        Self {
            model: IMAGE_MODEL,
            prompt: normalize_prompt(prompt),
            size,
            quality: IMAGE_QUALITY,
            n: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageData {
    pub url: String,
    pub revised_prompt: String,
}

/// Image generation response in the upstream's shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageResponse {
    pub created: i64,
    pub data: Vec<ImageData>,
}

/// Placeholder response for a failed generation
pub fn fallback_response(original_prompt: &str, size: ImageSize, now: DateTime<Utc>) -> ImageResponse {
    let (width, height) = size.dimensions();
    ImageResponse {
        created: now.timestamp(),
        data: vec![ImageData {
            url: format!(
                "https://picsum.photos/{}/{}?random={}",
                width,
                height,
                now.timestamp_millis()
            ),
            revised_prompt: format!("Fallback image generated for: {}", original_prompt),
        }],
    }
}

/// Result of an image relay call
#[derive(Debug, Clone, PartialEq)]
pub enum ImageOutcome {
    /// Upstream body, passed through untouched
    Generated(Value),
    Fallback {
        response: ImageResponse,
        reason: String,
    },
}

impl ImageOutcome {
    pub fn into_body(self) -> Value {
        match self {
            ImageOutcome::Generated(body) => body,
            ImageOutcome::Fallback { response, .. } => {
                serde_json::to_value(response).unwrap_or(Value::Null)
            }
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ImageOutcome::Fallback { .. })
    }
}

/// Generate an image, falling back to a placeholder on any failure
pub async fn generate(
    client: &UpstreamClient,
    prompt: &str,
    size: ImageSize,
    timeout: Duration,
) -> ImageOutcome {
    let body = ImageRequestBody::new(prompt, size);
    tracing::debug!(
        prompt_length = body.prompt.len(),
        size = %size,
        "Generating image"
    );

    let reason = match serde_json::to_value(&body) {
        Ok(payload) => match client.post_json(IMAGE_GENERATIONS_PATH, &payload, timeout).await {
            Ok(response) if response.is_success() => {
                tracing::info!(size = %size, "Image generation succeeded");
                return ImageOutcome::Generated(response.body);
            }
            Ok(response) => format!("upstream returned HTTP {}", response.status),
            Err(TransportError::MissingCredential) => "API key not configured".to_string(),
            Err(e) => e.to_string(),
        },
        Err(e) => format!("failed to encode request: {}", e),
    };

    tracing::warn!(reason = %reason, size = %size, "Image generation failed, using placeholder");
    ImageOutcome::Fallback {
        response: fallback_response(prompt, size, Utc::now()),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_trailing_style_is_removed() {
        assert_eq!(
            normalize_prompt("A castle on a cliff In Anime Style  "),
            "A castle on a cliff"
        );
        assert_eq!(
            normalize_prompt("in cartoon style, a red balloon floating"),
            "in cartoon style, a red balloon floating"
        );
    }

    #[test]
    fn test_short_prompt_is_padded() {
        assert_eq!(normalize_prompt("  dog "), "A beautiful and detailed dog");
        assert_eq!(
            normalize_prompt("owl in pixel style"),
            "A beautiful and detailed owl"
        );
        assert_eq!(normalize_prompt("0123456789"), "0123456789");
    }

    #[test]
    fn test_size_parsing() {
        assert_eq!("1792x1024".parse::<ImageSize>(), Ok(ImageSize::Landscape));
        assert!("512x512".parse::<ImageSize>().is_err());
        assert_eq!(ImageSize::default().dimensions(), (1024, 1024));
    }

    #[test]
    fn test_request_body_shape() {
        let body = ImageRequestBody::new("a fox in a snowy forest", ImageSize::Portrait);
        let json = serde_json::to_value(&body).expect("serializable");
        assert_eq!(json["model"], "dall-e-3");
        assert_eq!(json["size"], "1024x1792");
        assert_eq!(json["quality"], "standard");
        assert_eq!(json["n"], 1);
    }

    #[test]
    fn test_fallback_response_uses_original_prompt() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).single().expect("valid");
        let response = fallback_response("cat in oil style", ImageSize::Landscape, now);
        assert_eq!(response.created, 1_700_000_000);
        assert_eq!(
            response.data[0].url,
            "https://picsum.photos/1792/1024?random=1700000000123"
        );
        assert_eq!(
            response.data[0].revised_prompt,
            "Fallback image generated for: cat in oil style"
        );
    }

    #[tokio::test]
    async fn test_missing_credential_falls_back() {
        let client = UpstreamClient::new("http://127.0.0.1:9", None).expect("client");
        let outcome = generate(&client, "sunset", ImageSize::Square, Duration::from_secs(1)).await;
        match outcome {
            ImageOutcome::Fallback { reason, response } => {
                assert_eq!(reason, "API key not configured");
                assert!(response.data[0].url.starts_with("https://picsum.photos/1024/1024?random="));
            }
            other => panic!("expected fallback, got {:?}", other),
        }
    }
}
