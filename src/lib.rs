//! An adaptive sampling and aggregation engine for statsd-style metric
//! lines.
//!
//! A relay sitting in front of a statsd backend sees every metric line a
//! fleet emits, but most backends charge per unique time series, not per
//! line. For a key that is reported thousands of times per window, the
//! backend only needs a faithful aggregate, not every line. This crate
//! watches each key's arrival rate, and once a key crosses a configured
//! threshold within a window, switches that key from passthrough to
//! aggregation: counters get rate-compensated summation, timers get a
//! max/min plus a uniformly-sampled reservoir of the rest. Keys under the
//! threshold pass straight through untouched.
//!
//! The entry point is [`Engine`] (or [`SyncEngine`] for a shared instance
//! behind a lock):
//!
//! ```
//! use adaptive_statsd_sampler::{Engine, EngineConfig, SamplingResult};
//!
//! let mut engine = Engine::new(EngineConfig::default()).unwrap();
//! match engine.consider("requests:1|c").unwrap() {
//!     SamplingResult::NotSampling => { /* forward the raw line */ }
//!     SamplingResult::Sampling => { /* absorbed; nothing to forward yet */ }
//! }
//! engine.flush(|_key, line| println!("{line}"));
//! ```

mod bucket;
mod config;
mod counter;
mod engine;
mod error;
mod flush;
mod parser;
mod reservoir;
mod sampling;

pub use bucket::{Bucket, BucketType};
pub use config::EngineConfig;
pub use engine::{Engine, RejectionCounts, SyncEngine};
pub use error::{ConfigError, EngineError, ParseError};
pub use parser::{parse, MetricType, Observation};
pub use sampling::SamplingResult;
