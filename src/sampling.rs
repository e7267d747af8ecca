use crate::bucket::Bucket;

/// Whether an observation was absorbed by the sampling engine or should be
/// forwarded downstream untouched (§4.C, §4.G).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingResult {
    /// The bucket is in SAMPLING state and the observation was absorbed
    /// into its aggregation state; the caller should *not* forward the raw
    /// line.
    Sampling,
    /// The bucket is in PASSTHROUGH state (or the key/type was not
    /// tracked); the caller should forward the raw line as-is.
    NotSampling,
}

impl Bucket {
    /// §4.C "Transition on each observation", run from
    /// [`crate::Engine::consider`] before any aggregation happens.
    ///
    /// Increments `last_window_count` and, on the first crossing of
    /// `threshold` within the current window, flips PASSTHROUGH→SAMPLING
    /// and logs the transition once.
    pub(crate) fn note_arrival(&mut self, key: &str, threshold: u64) -> SamplingResult {
        self.last_window_count += 1;

        if !self.sampling && self.last_window_count > threshold {
            self.sampling = true;
            tracing::debug!(
                key,
                threshold,
                last_window_count = self.last_window_count,
                "key entered SAMPLING state"
            );
        }

        if self.sampling {
            SamplingResult::Sampling
        } else {
            SamplingResult::NotSampling
        }
    }

    /// §4.C "Transition at window boundary", run once per key from
    /// [`crate::Engine::update_flags`] (itself invoked by `flush`).
    ///
    /// Re-evaluates engagement against the window's final
    /// `last_window_count`, disengages a bucket that fell back under
    /// threshold, and always resets the window counter to zero.
    pub(crate) fn update_flags(&mut self, threshold: u64) {
        if self.last_window_count > threshold {
            self.sampling = true;
        } else if self.sampling {
            self.sampling = false;
            if let Some(timer) = &mut self.timer {
                timer.reservoir_index = 0;
            }
        }
        self.last_window_count = 0;
    }
}
