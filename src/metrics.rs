//! Prometheus metrics collection for chatrelay
//!
//! This module provides metrics instrumentation for tracking:
//! - Completion attempts and their outcomes
//! - Completion latency
//! - Fallback replies and fallback images
//! - Extracted documents by category
//!
//! Metrics are exposed via the `/metrics` endpoint in Prometheus text format.

use crate::client::failure::FailureKind;
use crate::extract::FileCategory;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Final outcome of a completion call, as a metrics label
///
/// Restricts label values to a closed set at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(FailureKind),
}

impl Outcome {
    /// Convert outcome to Prometheus label string
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure(kind) => kind.as_str(),
        }
    }
}

/// Metrics collector for chatrelay
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    completion_attempts: IntCounter,
    completion_results: IntCounterVec,
    completion_duration: HistogramVec,
    fallback_replies: IntCounter,
    image_fallbacks: IntCounter,
    documents_extracted: IntCounterVec,
}

impl Metrics {
    /// Create a new Metrics instance
    ///
    /// Registers all metrics with a new Prometheus registry.
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // Every upstream attempt, retries included
        let completion_attempts = IntCounter::with_opts(Opts::new(
            "chatrelay_completion_attempts_total",
            "Total number of upstream completion attempts, retries included",
        ))?;

        // Cardinality: success + 6 failure kinds = 7 time series
        let completion_results = IntCounterVec::new(
            Opts::new(
                "chatrelay_completion_results_total",
                "Total number of finished completion calls by outcome",
            ),
            &["outcome"],
        )?;

        let completion_duration = HistogramVec::new(
            HistogramOpts::new(
                "chatrelay_completion_duration_ms",
                "Completion call latency in milliseconds, backoff included",
            )
            .buckets(vec![
                50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0, 30000.0, 60000.0,
            ]),
            &["outcome"],
        )?;

        let fallback_replies = IntCounter::with_opts(Opts::new(
            "chatrelay_fallback_replies_total",
            "Total number of replies produced by the offline fallback responder",
        ))?;

        let image_fallbacks = IntCounter::with_opts(Opts::new(
            "chatrelay_image_fallbacks_total",
            "Total number of image requests answered with a placeholder image",
        ))?;

        // Cardinality: bounded by the number of file categories
        let documents_extracted = IntCounterVec::new(
            Opts::new(
                "chatrelay_documents_extracted_total",
                "Total number of documents whose text was extracted, by file category",
            ),
            &["category"],
        )?;

        registry.register(Box::new(completion_attempts.clone()))?;
        registry.register(Box::new(completion_results.clone()))?;
        registry.register(Box::new(completion_duration.clone()))?;
        registry.register(Box::new(fallback_replies.clone()))?;
        registry.register(Box::new(image_fallbacks.clone()))?;
        registry.register(Box::new(documents_extracted.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            completion_attempts,
            completion_results,
            completion_duration,
            fallback_replies,
            image_fallbacks,
            documents_extracted,
        })
    }

    pub fn record_attempt(&self) {
        self.completion_attempts.inc();
    }

    /// Record the outcome of a finished completion call
    ///
    /// # Errors
    ///
    /// Returns an error if the metric is not registered.
    pub fn record_result(&self, outcome: Outcome) -> Result<(), prometheus::Error> {
        self.completion_results
            .get_metric_with_label_values(&[outcome.as_str()])?
            .inc();
        Ok(())
    }

    /// Record completion call duration
    ///
    /// # Errors
    ///
    /// Returns an error if `duration_ms` is NaN, infinite, or negative.
    /// Such values would corrupt every percentile of the histogram.
    pub fn record_duration(
        &self,
        outcome: Outcome,
        duration_ms: f64,
    ) -> Result<(), prometheus::Error> {
        if !duration_ms.is_finite() {
            return Err(prometheus::Error::Msg(format!(
                "Histogram value must be finite (not NaN or Infinity), got: {}",
                duration_ms
            )));
        }
        if duration_ms < 0.0 {
            return Err(prometheus::Error::Msg(format!(
                "Histogram value must be non-negative (duration cannot be negative), got: {}",
                duration_ms
            )));
        }

        self.completion_duration
            .get_metric_with_label_values(&[outcome.as_str()])?
            .observe(duration_ms);
        Ok(())
    }

    pub fn record_fallback_reply(&self) {
        self.fallback_replies.inc();
    }

    pub fn record_image_fallback(&self) {
        self.image_fallbacks.inc();
    }

    /// Record a successful extraction
    ///
    /// # Errors
    ///
    /// Returns an error if the metric is not registered.
    pub fn record_document(&self, category: FileCategory) -> Result<(), prometheus::Error> {
        self.documents_extracted
            .get_metric_with_label_values(&[category.as_str()])?
            .inc();
        Ok(())
    }

    pub fn completion_attempts_count(&self) -> u64 {
        self.completion_attempts.get()
    }

    pub fn fallback_replies_count(&self) -> u64 {
        self.fallback_replies.get()
    }

    pub fn image_fallbacks_count(&self) -> u64 {
        self.image_fallbacks.get()
    }

    /// Gather all metrics in Prometheus text format
    ///
    /// # Errors
    ///
    /// Returns an error if metric encoding fails.
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let metric_families = self.registry.gather();
        let metric_count = metric_families.len();

        tracing::debug!(
            metric_family_count = metric_count,
            "Encoding metrics to Prometheus text format"
        );

        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();

        encoder.encode(&metric_families, &mut buffer).map_err(|e| {
            tracing::error!(
                error = %e,
                metric_family_count = metric_count,
                "Prometheus text encoder failed"
            );
            prometheus::Error::Msg(format!(
                "Failed to encode {} metric families: {}",
                metric_count, e
            ))
        })?;

        String::from_utf8(buffer).map_err(|e| {
            let valid_up_to = e.utf8_error().valid_up_to();
            tracing::error!(
                invalid_byte_index = valid_up_to,
                "Prometheus encoder produced invalid UTF-8"
            );
            prometheus::Error::Msg(format!(
                "Failed to convert metrics to UTF-8 at byte {}: {}",
                valid_up_to, e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new_registers_families() {
        let metrics = Metrics::new().expect("Failed to create metrics");

        metrics.record_attempt();
        metrics
            .record_result(Outcome::Success)
            .expect("Test operation should succeed");
        metrics
            .record_duration(Outcome::Success, 12.0)
            .expect("Test operation should succeed");
        metrics.record_fallback_reply();
        metrics.record_image_fallback();
        metrics
            .record_document(FileCategory::Document)
            .expect("Test operation should succeed");

        let names: Vec<String> = metrics
            .registry
            .gather()
            .iter()
            .map(|m| m.name().to_string())
            .collect();
        assert_eq!(names.len(), 6, "Expected 6 metric families: {:?}", names);
        assert!(names.contains(&"chatrelay_completion_attempts_total".to_string()));
        assert!(names.contains(&"chatrelay_completion_results_total".to_string()));
        assert!(names.contains(&"chatrelay_documents_extracted_total".to_string()));
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Outcome::Success.as_str(), "success");
        assert_eq!(
            Outcome::Failure(FailureKind::RateLimited).as_str(),
            "rate_limited"
        );
    }

    #[test]
    fn test_record_result_by_outcome() {
        let metrics = Metrics::new().expect("Failed to create test metrics");
        metrics
            .record_result(Outcome::Failure(FailureKind::ServerError))
            .expect("Test operation should succeed");

        let output = metrics.gather().expect("Failed to gather test metrics");
        assert!(output.contains("chatrelay_completion_results_total{outcome=\"server_error\"} 1"));
    }

    #[test]
    fn test_counters_accumulate() {
        let metrics = Metrics::new().expect("Failed to create test metrics");
        for _ in 0..3 {
            metrics.record_attempt();
        }
        metrics.record_fallback_reply();
        assert_eq!(metrics.completion_attempts_count(), 3);
        assert_eq!(metrics.fallback_replies_count(), 1);
        assert_eq!(metrics.image_fallbacks_count(), 0);
    }

    #[test]
    fn test_histogram_rejects_invalid_values() {
        let metrics = Metrics::new().expect("Failed to create test metrics");
        assert!(metrics.record_duration(Outcome::Success, f64::NAN).is_err());
        assert!(
            metrics
                .record_duration(Outcome::Success, f64::INFINITY)
                .is_err()
        );
        assert!(metrics.record_duration(Outcome::Success, -1.0).is_err());
        assert!(metrics.record_duration(Outcome::Success, 0.0).is_ok());
    }

    #[test]
    fn test_gather_produces_prometheus_text_format() {
        let metrics = Metrics::new().expect("Failed to create test metrics");
        metrics.record_attempt();
        let output = metrics.gather().expect("Failed to gather test metrics");
        assert!(output.contains("# HELP chatrelay_completion_attempts_total"));
        assert!(output.contains("# TYPE chatrelay_completion_attempts_total counter"));
    }

    #[test]
    fn test_metrics_is_clonable() {
        let metrics = Metrics::new().expect("Failed to create test metrics");
        let clone = metrics.clone();
        clone.record_image_fallback();
        assert_eq!(metrics.image_fallbacks_count(), 1);
    }
}
