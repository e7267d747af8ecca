use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::bucket::{Bucket, BucketTable};
use crate::config::EngineConfig;
use crate::error::{EngineError, ParseError};
use crate::parser::{self, MetricType};
use crate::sampling::SamplingResult;

/// Per-engine counts of rejected lines, broken down by reason (§7).
///
/// The core itself does not export these to any metrics backend — it has
/// no opinion on Prometheus vs. statsd vs. a log line — it only keeps the
/// counts so a host can read and export them however it likes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RejectionCounts {
    pub missing_separator: u64,
    pub empty_key: u64,
    pub invalid_value: u64,
    pub unknown_type: u64,
    pub invalid_rate: u64,
    pub empty_rate: u64,
    /// A recognized-but-unsupported type (kv/gauge/histogram/set) was
    /// presented to `consider`. Not a parse failure — the line is well
    /// formed, the engine simply does not aggregate this type (§7).
    pub unsupported_type: u64,
}

impl RejectionCounts {
    fn record_parse_error(&mut self, err: ParseError) {
        match err {
            ParseError::MissingSeparator => self.missing_separator += 1,
            ParseError::EmptyKey => self.empty_key += 1,
            ParseError::InvalidValue => self.invalid_value += 1,
            ParseError::UnknownType => self.unknown_type += 1,
            ParseError::InvalidRate => self.invalid_rate += 1,
            ParseError::EmptyRate => self.empty_rate += 1,
        }
    }

    /// Sum across every reason, parse failures and unsupported types alike.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.missing_separator
            + self.empty_key
            + self.invalid_value
            + self.unknown_type
            + self.invalid_rate
            + self.empty_rate
            + self.unsupported_type
    }
}

/// The engine facade (§4.G): coordinates the parser, bucket table,
/// sampling state machine, reservoir/counter aggregators, and flush
/// engine behind four operations.
///
/// Not `Sync` by itself — see [`SyncEngine`] for a host that wants one
/// shared instance behind a lock instead of explicit sharding (§5).
pub struct Engine {
    config: EngineConfig,
    table: BucketTable,
    rng: StdRng,
    rejections: RejectionCounts,
}

impl Engine {
    /// Build a new engine, seeding its reservoir-replacement PRNG from
    /// wall-clock time (§5). Returns [`EngineError::Config`] if `config`
    /// fails validation.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self::with_seed(config, seed)
    }

    /// Build a new engine with an explicit PRNG seed, for deterministic
    /// tests. Reservoir *contents* are still only statistically uniform,
    /// not reproducible across engine versions — only the seed is.
    pub fn with_seed(config: EngineConfig, seed: u64) -> Result<Self, EngineError> {
        config.validate().map_err(EngineError::from)?;
        Ok(Self {
            config,
            table: BucketTable::new(),
            rng: StdRng::seed_from_u64(seed),
            rejections: RejectionCounts::default(),
        })
    }

    /// The configuration this engine was built with.
    #[must_use]
    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Rejection counters accumulated so far.
    #[must_use]
    pub fn rejections(&self) -> RejectionCounts {
        self.rejections
    }

    /// Number of distinct keys currently tracked.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.table.len()
    }

    /// Parse `line` and absorb it if its bucket is currently SAMPLING
    /// (§4.G). Unsupported types (kv/gauge/histogram/set) always return
    /// `NotSampling` without creating a bucket or mutating any state.
    pub fn consider(&mut self, line: &str) -> Result<SamplingResult, EngineError> {
        let observation = match parser::parse(line) {
            Ok(observation) => observation,
            Err(err) => {
                self.rejections.record_parse_error(err);
                return Err(EngineError::from(err));
            }
        };

        match observation.metric_type {
            MetricType::Counter => {
                let bucket = self
                    .table
                    .get_or_insert_with(observation.key, Bucket::new_counter);
                let result = bucket.note_arrival(observation.key, self.config.threshold);
                if result == SamplingResult::Sampling {
                    bucket.absorb_counter(observation.value, observation.presampling_value);
                }
                Ok(result)
            }
            MetricType::Timer => {
                let reservoir_size = self.config.reservoir_size();
                let bucket = self
                    .table
                    .get_or_insert_with(observation.key, || Bucket::new_timer(reservoir_size));
                let result = bucket.note_arrival(observation.key, self.config.threshold);
                if result == SamplingResult::Sampling {
                    bucket.absorb_timer(
                        observation.value,
                        observation.presampling_value,
                        reservoir_size,
                        &mut self.rng,
                    );
                }
                Ok(result)
            }
            MetricType::Kv | MetricType::Gauge | MetricType::Histogram | MetricType::Set => {
                self.rejections.unsupported_type += 1;
                Ok(SamplingResult::NotSampling)
            }
        }
    }

    /// Walk every bucket, emitting replacement lines via `on_line(key,
    /// line)` for any bucket that is SAMPLING with nonzero `count`, then
    /// reset its aggregation state and run the window-boundary state
    /// machine transition (§4.F). `on_line` must not retain the borrowed
    /// strings past the call — they do not outlive this `flush` call.
    pub fn flush(&mut self, mut on_line: impl FnMut(&str, &str)) {
        let threshold = self.config.threshold;
        for (key, bucket) in self.table.iter_mut() {
            crate::flush::flush_bucket(key, bucket, &mut on_line);
            bucket.update_flags(threshold);
        }
    }

    /// Run the window-boundary state-machine transition (§4.C) on every
    /// bucket without emitting anything — for a host tick where no output
    /// is required. Aggregation state (`sum`/`count`/reservoir/extrema) is
    /// untouched; only [`flush`](Self::flush) resets it.
    pub fn update_flags(&mut self) {
        let threshold = self.config.threshold;
        for (_, bucket) in self.table.iter_mut() {
            bucket.update_flags(threshold);
        }
    }

    /// Diagnostic: is `key`'s bucket currently SAMPLING? Returns
    /// `NotSampling` for a key that has never been observed.
    #[must_use]
    pub fn is_sampling(&self, key: &str) -> SamplingResult {
        match self.table.get(key) {
            Some(bucket) if bucket.is_sampling() => SamplingResult::Sampling,
            _ => SamplingResult::NotSampling,
        }
    }

    /// Diagnostic: borrow `key`'s bucket, if one has been observed.
    #[must_use]
    pub fn bucket(&self, key: &str) -> Option<&Bucket> {
        self.table.get(key)
    }

    /// Consume and drop the engine, releasing all bucket memory.
    ///
    /// Rust already does this when `Engine` goes out of scope; this
    /// method exists only so callers translating from the reference
    /// API's explicit `destroy()` have a direct equivalent to call.
    pub fn destroy(self) {}
}

/// A thread-safe wrapper around one [`Engine`], for hosts that prefer a
/// single shared instance over explicit per-thread sharding (§5).
///
/// Mirrors the teacher crate's `MetricsCollector { inner: Mutex<Inner> }`
/// shape: a single lock around the whole mutable core, since `consider`
/// and `flush` are cheap enough that lock contention is the simpler
/// tradeoff against splitting the table itself.
pub struct SyncEngine {
    inner: Mutex<Engine>,
}

impl SyncEngine {
    /// Build a new shared engine.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        Ok(Self {
            inner: Mutex::new(Engine::new(config)?),
        })
    }

    /// See [`Engine::consider`].
    pub fn consider(&self, line: &str) -> Result<SamplingResult, EngineError> {
        self.inner.lock().consider(line)
    }

    /// See [`Engine::flush`].
    pub fn flush(&self, on_line: impl FnMut(&str, &str)) {
        self.inner.lock().flush(on_line);
    }

    /// See [`Engine::update_flags`].
    pub fn update_flags(&self) {
        self.inner.lock().update_flags();
    }

    /// See [`Engine::is_sampling`].
    #[must_use]
    pub fn is_sampling(&self, key: &str) -> SamplingResult {
        self.inner.lock().is_sampling(key)
    }

    /// See [`Engine::rejections`].
    #[must_use]
    pub fn rejections(&self) -> RejectionCounts {
        self.inner.lock().rejections()
    }
}
