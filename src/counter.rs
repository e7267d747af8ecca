use crate::bucket::Bucket;

/// `1 / presampling_value` when the producer declared a sub-1.0 rate,
/// else `1.0` (§4.E). Shared verbatim with [`crate::reservoir`], which
/// uses the same formula to compensate `count` for timers.
pub(crate) fn effective_count(presampling_value: f64) -> f64 {
    if presampling_value > 0.0 && presampling_value < 1.0 {
        1.0 / presampling_value
    } else {
        1.0
    }
}

impl Bucket {
    /// Absorb one counter observation into a SAMPLING counter bucket
    /// (§4.E). The observation is first "un-sampled" by `effective_count`
    /// to reconstruct its implied un-sampled contribution before being
    /// added to `sum`.
    pub(crate) fn absorb_counter(&mut self, value: f64, presampling_value: f64) {
        let effective = effective_count(presampling_value);
        self.sum += value * effective;
        self.count += effective;
    }
}
