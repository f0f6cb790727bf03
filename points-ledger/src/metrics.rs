//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the ledger.
//!
//! # Metrics
//!
//! - `points_transactions_total` - Transactions appended (grants, corrections and spends)
//! - `points_validation_failures_total` - Requests rejected by validation
//! - `points_spends_total` - Committed spends
//! - `points_spends_rejected_total` - Spends rejected for insufficient points
//! - `points_spent_total` - Points deducted by committed spends
//! - `points_spend_duration_seconds` - Histogram of plan-and-commit latencies

use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry, Encoder, Histogram,
    HistogramOpts, IntCounter, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Transactions appended
    pub transactions_total: IntCounter,

    /// Validation failures
    pub validation_failures_total: IntCounter,

    /// Committed spends
    pub spends_total: IntCounter,

    /// Rejected spends
    pub spends_rejected_total: IntCounter,

    /// Points deducted
    pub points_spent_total: IntCounter,

    /// Spend duration histogram
    pub spend_duration: Histogram,

    /// Prometheus registry owned by this collector
    registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let transactions_total = register_int_counter_with_registry!(
            Opts::new("points_transactions_total", "Total number of transactions appended"),
            registry
        )?;

        let validation_failures_total = register_int_counter_with_registry!(
            Opts::new(
                "points_validation_failures_total",
                "Total number of requests rejected by validation"
            ),
            registry
        )?;

        let spends_total = register_int_counter_with_registry!(
            Opts::new("points_spends_total", "Total number of committed spends"),
            registry
        )?;

        let spends_rejected_total = register_int_counter_with_registry!(
            Opts::new(
                "points_spends_rejected_total",
                "Total number of spends rejected for insufficient points"
            ),
            registry
        )?;

        let points_spent_total = register_int_counter_with_registry!(
            Opts::new("points_spent_total", "Total points deducted by spends"),
            registry
        )?;

        let spend_duration = register_histogram_with_registry!(
            HistogramOpts::new(
                "points_spend_duration_seconds",
                "Histogram of plan-and-commit latencies"
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.010, 0.050, 0.100, 0.500]),
            registry
        )?;

        Ok(Self {
            transactions_total,
            validation_failures_total,
            spends_total,
            spends_rejected_total,
            points_spent_total,
            spend_duration,
            registry: Arc::new(registry),
        })
    }

    /// Record appended transactions
    pub fn record_transaction(&self, count: usize) {
        self.transactions_total.inc_by(count as u64);
    }

    /// Record a validation failure
    pub fn record_validation_failure(&self) {
        self.validation_failures_total.inc();
    }

    /// Record a committed spend
    pub fn record_spend(&self, points: i64, duration_seconds: f64) {
        self.spends_total.inc();
        self.points_spent_total.inc_by(points.max(0) as u64);
        self.spend_duration.observe(duration_seconds);
    }

    /// Record a rejected spend
    pub fn record_spend_rejected(&self) {
        self.spends_rejected_total.inc();
    }

    /// Render in the Prometheus text exposition format
    pub fn export(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("transactions_total", &self.transactions_total.get())
            .field("spends_total", &self.spends_total.get())
            .finish_non_exhaustive()
    }
}
