//! Logging and metrics for the Fleetline API client
//!
//! This crate provides:
//! - Structured logging setup with tracing
//! - An in-process registry for dispatch counters and latencies
//! - Timers that record into the registry

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Global metrics registry
static METRICS: Lazy<MetricsRegistry> = Lazy::new(MetricsRegistry::new);

/// Samples kept per histogram for percentiles
pub const SAMPLE_WINDOW: usize = 1024;

/// Metric names recorded by the dispatcher
pub mod names {
    /// Requests handed to the transport, retries included
    pub const ATTEMPTS: &str = "dispatch.attempts";
    /// Attempts that were followed by another attempt
    pub const RETRIES: &str = "dispatch.retries";
    /// Logical calls that returned a value
    pub const SUCCESSES: &str = "dispatch.successes";
    /// Logical calls that returned an error
    pub const FAILURES: &str = "dispatch.failures";
    /// Wall time of a logical call in milliseconds
    pub const LATENCY_MS: &str = "dispatch.latency_ms";
}

/// Initialize logging with the default configuration
pub fn init() -> anyhow::Result<()> {
    init_with_config(TelemetryConfig::default())
}

/// Initialize logging with a custom configuration
pub fn init_with_config(config: TelemetryConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let layer = fmt::layer()
        .with_target(config.show_target)
        .with_thread_ids(config.show_thread_ids)
        .with_file(config.show_file)
        .with_line_number(config.show_line_number);

    let result = if config.json {
        tracing::subscriber::set_global_default(
            tracing_subscriber::registry().with(filter).with(layer.json()),
        )
    } else {
        tracing::subscriber::set_global_default(
            tracing_subscriber::registry().with(filter).with(layer.compact()),
        )
    };
    result.map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {e}"))?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Telemetry initialized");

    Ok(())
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit JSON lines instead of compact text
    pub json: bool,
    /// Include the event target
    pub show_target: bool,
    /// Include thread ids
    pub show_thread_ids: bool,
    /// Include the source file
    pub show_file: bool,
    /// Include the source line
    pub show_line_number: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
        }
    }
}

/// Running totals plus the most recent samples
#[derive(Debug, Default)]
struct Histogram {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    recent: VecDeque<f64>,
}

impl Histogram {
    fn record(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += value;

        if self.recent.len() == SAMPLE_WINDOW {
            self.recent.pop_front();
        }
        self.recent.push_back(value);
    }

    fn stats(&self) -> HistogramStats {
        if self.count == 0 {
            return HistogramStats::default();
        }

        let mut sorted: Vec<f64> = self.recent.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);

        #[allow(clippy::cast_precision_loss)]
        let mean = self.sum / self.count as f64;

        HistogramStats {
            count: self.count,
            min: self.min,
            max: self.max,
            mean,
            p50: percentile(&sorted, 50.0),
            p95: percentile(&sorted, 95.0),
            p99: percentile(&sorted, 99.0),
        }
    }
}

/// Metrics registry for counters and latency histograms
pub struct MetricsRegistry {
    counters: RwLock<HashMap<String, AtomicU64>>,
    histograms: Mutex<HashMap<String, Histogram>>,
}

impl MetricsRegistry {
    fn new() -> Self {
        Self {
            counters: RwLock::new(HashMap::new()),
            histograms: Mutex::new(HashMap::new()),
        }
    }

    /// Increment a counter
    pub fn increment(&self, name: &str) {
        if !cfg!(feature = "metrics") {
            return;
        }
        let counters = self.counters.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(counter) = counters.get(name) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            drop(counters);
            let mut counters = self.counters.write().unwrap_or_else(PoisonError::into_inner);
            counters
                .entry(name.to_string())
                .or_insert_with(|| AtomicU64::new(0))
                .fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Current value of a counter (zero if never incremented)
    pub fn counter(&self, name: &str) -> u64 {
        let counters = self.counters.read().unwrap_or_else(PoisonError::into_inner);
        counters
            .get(name)
            .map_or(0, |counter| counter.load(Ordering::Relaxed))
    }

    /// Record a histogram value.
    ///
    /// Totals cover every value; percentiles cover the last [`SAMPLE_WINDOW`].
    pub fn histogram(&self, name: &str, value: f64) {
        if !cfg!(feature = "metrics") {
            return;
        }
        let mut histograms = self.histograms.lock().unwrap_or_else(PoisonError::into_inner);
        histograms.entry(name.to_string()).or_default().record(value);
    }

    /// Statistics for one histogram
    pub fn histogram_stats(&self, name: &str) -> HistogramStats {
        let histograms = self.histograms.lock().unwrap_or_else(PoisonError::into_inner);
        histograms.get(name).map(Histogram::stats).unwrap_or_default()
    }
}

/// Histogram statistics
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HistogramStats {
    /// Values recorded since start
    pub count: u64,
    /// Smallest value recorded
    pub min: f64,
    /// Largest value recorded
    pub max: f64,
    /// Mean of all values recorded
    pub mean: f64,
    /// Median of the recent samples
    pub p50: f64,
    /// 95th percentile of the recent samples
    pub p95: f64,
    /// 99th percentile of the recent samples
    pub p99: f64,
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((p / 100.0) * (sorted.len() - 1) as f64).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Get the global metrics registry
pub fn metrics() -> &'static MetricsRegistry {
    &METRICS
}

/// Timer for measuring call duration
pub struct Timer {
    name: &'static str,
    start: Instant,
    recorded: bool,
}

impl Timer {
    /// Start a new timer
    pub fn start(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
            recorded: false,
        }
    }

    /// Stop the timer and record the duration
    pub fn stop(mut self) -> Duration {
        self.record()
    }

    fn record(&mut self) -> Duration {
        let duration = self.start.elapsed();
        if !self.recorded {
            self.recorded = true;
            metrics().histogram(self.name, duration.as_secs_f64() * 1000.0);
        }
        duration
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        // Dropped futures still count towards latency
        self.record();
    }
}
