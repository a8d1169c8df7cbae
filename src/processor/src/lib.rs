//! Histogram percentile processor.
//!
//! Replaces delta-temporality explicit-bucket histograms in OTLP metric batches
//! with gauge series for the 50th, 75th, 90th and 95th percentiles plus the
//! point count and sum. Cumulative histograms and every other metric type are
//! left untouched.

pub mod buckets;
pub mod consumer;
pub mod convert;
pub mod error;
pub mod factory;
pub mod histogram_processor;
pub mod percentile;
pub mod rewrite;

pub use consumer::{Capabilities, MetricsConsumer};
pub use error::{ProcessorError, Result};
pub use factory::{ComponentId, HistogramProcessorFactory, Stability};
pub use histogram_processor::HistogramProcessor;
pub use percentile::{PERCENTILES, Percentile, estimate_percentile};
pub use rewrite::{RewriteStats, rewrite_batch};
