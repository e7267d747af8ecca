use std::collections::HashMap;

/// A key's fixed type, set at bucket creation and never changed (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketType {
    /// Aggregated via [`crate::counter`].
    Counter,
    /// Aggregated via [`crate::reservoir`].
    Timer,
}

/// Timer-only state: the reservoir array plus the extrema tracked outside
/// it (§3, §4.D).
#[derive(Debug)]
pub(crate) struct TimerState {
    /// Fixed-length array; `None` is the "empty slot" sentinel.
    pub(crate) reservoir: Vec<Option<f64>>,
    /// Next write position while still filling (`< reservoir.len()`).
    pub(crate) reservoir_index: usize,
    /// Current window maximum. `None` is the sentinel "unset".
    pub(crate) upper: Option<f64>,
    /// Current window minimum. `None` is the sentinel "unset".
    pub(crate) lower: Option<f64>,
    /// Pre-sample rate declared at the moment `upper` was adopted.
    pub(crate) upper_sample_rate: f64,
    /// Pre-sample rate declared at the moment `lower` was adopted.
    pub(crate) lower_sample_rate: f64,
}

impl TimerState {
    fn new(reservoir_size: usize) -> Self {
        Self {
            reservoir: vec![None; reservoir_size],
            reservoir_index: 0,
            upper: None,
            lower: None,
            upper_sample_rate: 1.0,
            lower_sample_rate: 1.0,
        }
    }

    /// Number of non-sentinel reservoir slots (used by the flush engine to
    /// derive the reservoir sample rate).
    pub(crate) fn num_samples(&self) -> usize {
        self.reservoir.iter().filter(|slot| slot.is_some()).count()
    }

    fn reset(&mut self) {
        for slot in &mut self.reservoir {
            *slot = None;
        }
        self.reservoir_index = 0;
        self.upper = None;
        self.lower = None;
    }
}

/// Per-key aggregation state (§3).
///
/// `bucket_type` is fixed for the lifetime of the bucket: the engine never
/// re-creates a bucket with a different type for the same key, so there is
/// no code path that would need to change it after construction.
#[derive(Debug)]
pub struct Bucket {
    pub(crate) bucket_type: BucketType,
    pub(crate) sampling: bool,
    pub(crate) last_window_count: u64,
    pub(crate) sum: f64,
    pub(crate) count: f64,
    pub(crate) timer: Option<TimerState>,
}

impl Bucket {
    pub(crate) fn new_counter() -> Self {
        Self {
            bucket_type: BucketType::Counter,
            sampling: false,
            last_window_count: 0,
            sum: 0.0,
            count: 0.0,
            timer: None,
        }
    }

    pub(crate) fn new_timer(reservoir_size: usize) -> Self {
        Self {
            bucket_type: BucketType::Timer,
            sampling: false,
            last_window_count: 0,
            sum: 0.0,
            count: 0.0,
            timer: Some(TimerState::new(reservoir_size)),
        }
    }

    /// The bucket's immutable type.
    #[must_use]
    pub fn bucket_type(&self) -> BucketType {
        self.bucket_type
    }

    /// Whether the bucket is currently in SAMPLING state.
    #[must_use]
    pub fn is_sampling(&self) -> bool {
        self.sampling
    }

    /// Arrivals seen so far in the current window (§3). Diagnostic, mirrors
    /// [`Self::is_sampling`] — reset to zero at every flush boundary.
    #[must_use]
    pub fn last_window_count(&self) -> u64 {
        self.last_window_count
    }

    /// Current window maximum. `None` for counter buckets and for timer
    /// buckets that have not yet absorbed an observation this window.
    #[must_use]
    pub fn upper(&self) -> Option<f64> {
        self.timer.as_ref().and_then(|timer| timer.upper)
    }

    /// Current window minimum. `None` for counter buckets and for timer
    /// buckets that have not yet absorbed an observation this window.
    #[must_use]
    pub fn lower(&self) -> Option<f64> {
        self.timer.as_ref().and_then(|timer| timer.lower)
    }

    /// The non-sentinel reservoir contents. Empty for counter buckets and
    /// for timer buckets with nothing reserved yet.
    #[must_use]
    pub fn reservoir_samples(&self) -> Vec<f64> {
        self.timer
            .as_ref()
            .map(|timer| timer.reservoir.iter().filter_map(|slot| *slot).collect())
            .unwrap_or_default()
    }

    /// Reset post-flush aggregation state (§4.F): `sum`, `count`, and for
    /// timers the extrema and reservoir contents. Does not touch
    /// `sampling`/`last_window_count` — those are the state machine's job
    /// (see [`crate::sampling`]).
    pub(crate) fn reset_aggregation(&mut self) {
        self.sum = 0.0;
        self.count = 0.0;
        if let Some(timer) = &mut self.timer {
            timer.reset();
        }
    }
}

/// Mapping from metric key to [`Bucket`] (§4.B).
///
/// A thin newtype over [`std::collections::HashMap`] — the standard keyed
/// associative container already provides the load-factor/rehash behaviour
/// this component asks for, so there is no bespoke hashing to maintain
/// here. The newtype exists purely to pin down the three operations this
/// spec names (`get`, `insert`/`get_or_insert_with`, `iter`) instead of
/// exposing the full `HashMap` surface to callers.
#[derive(Debug, Default)]
pub struct BucketTable {
    buckets: HashMap<String, Bucket>,
}

impl BucketTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: HashMap::new(),
        }
    }

    /// Look up an existing bucket without creating one.
    pub fn get(&self, key: &str) -> Option<&Bucket> {
        self.buckets.get(key)
    }

    /// Look up a bucket for mutation, creating it with `make` on first
    /// observation of `key`. `make` is only invoked on a miss.
    pub(crate) fn get_or_insert_with(
        &mut self,
        key: &str,
        make: impl FnOnce() -> Bucket,
    ) -> &mut Bucket {
        if !self.buckets.contains_key(key) {
            self.buckets.insert(key.to_owned(), make());
        }
        self.buckets.get_mut(key).expect("just inserted")
    }

    /// Visit every `(key, bucket)` pair. Iteration order is
    /// implementation-defined, matching §4.F's "across keys the order is
    /// implementation-defined".
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Bucket)> {
        self.buckets.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of distinct keys currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Whether no key has been observed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
