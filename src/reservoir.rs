use rand::RngCore;

use crate::bucket::Bucket;
use crate::counter::effective_count;

impl Bucket {
    /// Absorb one timer observation into a SAMPLING timer bucket, with
    /// extrema hand-off (§4.D).
    ///
    /// `reservoir_size` is the physical reservoir length (this crate's
    /// chosen convention for the threshold/reservoir_size ambiguity, see
    /// `SPEC_FULL.md` §9 and `DESIGN.md`). `threshold` is used only as the
    /// denominator in the random-replacement draw, matching §4.D's use of
    /// `last_window_count` — which, at the point this is called, already
    /// reflects this observation.
    ///
    /// Resolution of an ambiguity in the base spec: `sum`/`count` are
    /// updated for *every* absorbed observation using the raw `value`,
    /// including the first-in-window observation that seeds both
    /// `upper`/`lower` from the sentinel and is therefore never written to
    /// the reservoir. Gating `sum`/`count` on reservoir insertion (the
    /// other reading of "aggregation alongside reservoir insertion") would
    /// let `count` stay at zero for an arbitrarily long time whenever a
    /// window's first observations are all new extrema, which would make
    /// the flush-time `count == 0` skip condition (§4.F) spuriously
    /// swallow real extrema. See `DESIGN.md`.
    ///
    /// The very first observation absorbed in a window finds both `upper`
    /// and `lower` sentinel; it seeds *both* from that single value and is
    /// held out of the reservoir, rather than becoming only `upper` and
    /// leaving `lower` to be adopted unconditionally — and incorrectly —
    /// by whatever observation happens to fail the `upper` check next.
    pub(crate) fn absorb_timer(
        &mut self,
        value: f64,
        presampling_value: f64,
        reservoir_size: usize,
        rng: &mut dyn RngCore,
    ) {
        let effective = effective_count(presampling_value);

        let to_insert = {
            let timer = self
                .timer
                .as_mut()
                .expect("absorb_timer called on a non-timer bucket");

            if timer.upper.is_none() && timer.lower.is_none() {
                // First observation absorbed this window: both extrema are
                // sentinel, so this single value seeds both upper and lower
                // and is held out of the reservoir, symmetrically with the
                // single-extremum case the spec calls out for §4.D.
                timer.upper = Some(value);
                timer.lower = Some(value);
                timer.upper_sample_rate = presampling_value;
                timer.lower_sample_rate = presampling_value;
                None
            } else if timer.upper.map_or(false, |upper| value > upper) {
                let previous = timer.upper.replace(value);
                timer.upper_sample_rate = presampling_value;
                previous
            } else if timer.lower.map_or(false, |lower| value < lower) {
                let previous = timer.lower.replace(value);
                timer.lower_sample_rate = presampling_value;
                previous
            } else {
                Some(value)
            }
        };

        self.sum += value;
        self.count += effective;

        if let Some(value_to_insert) = to_insert {
            let last_window_count = self.last_window_count;
            let timer = self.timer.as_mut().expect("checked above");

            if timer.reservoir_index < reservoir_size {
                timer.reservoir[timer.reservoir_index] = Some(value_to_insert);
                timer.reservoir_index += 1;
            } else if last_window_count > 0 {
                // Algorithm R-style replacement: last_window_count is the
                // "i-th item seen this window" denominator, so earlier
                // observations aren't systematically favored.
                let draw = rng.next_u64();
                let k = (draw % last_window_count) as usize;
                if k < reservoir_size {
                    timer.reservoir[k] = Some(value_to_insert);
                }
            }
        }
    }
}
