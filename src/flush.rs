use crate::bucket::{Bucket, BucketType};

/// `<key>:<mean>|c@<rate>` for a SAMPLING counter bucket (§4.F).
fn format_counter_line(key: &str, bucket: &Bucket) -> String {
    let mean = bucket.sum / bucket.count;
    let rate = 1.0 / bucket.count;
    format!("{key}:{mean}|c@{rate}")
}

/// Upper, then lower, then reservoir samples, in that order (§4.F
/// "Ordering"). Reservoir line order within the array is whatever order
/// the slots happen to hold — the spec only constrains ordering relative
/// to the extrema, not within the reservoir itself.
fn format_timer_lines(key: &str, bucket: &Bucket) -> Vec<String> {
    let timer = bucket
        .timer
        .as_ref()
        .expect("format_timer_lines called on a non-timer bucket");

    let mut lines = Vec::with_capacity(2 + timer.reservoir.len());

    if let Some(upper) = timer.upper {
        lines.push(format!("{key}:{upper}|ms@{}", timer.upper_sample_rate));
    }
    if let Some(lower) = timer.lower {
        lines.push(format!("{key}:{lower}|ms@{}", timer.lower_sample_rate));
    }

    let num_samples = timer.num_samples();
    if num_samples > 0 {
        let sample_rate = num_samples as f64 / bucket.count;
        for slot in &timer.reservoir {
            if let Some(v) = slot {
                lines.push(format!("{key}:{v}|ms@{sample_rate}"));
            }
        }
    }

    lines
}

/// Emit (via `on_line`) the replacement lines for one bucket, if any, and
/// reset its aggregation state (§4.F). Does *not* run the state-machine
/// window reset — that is [`crate::sampling`]'s responsibility and is
/// driven by [`crate::Engine::flush`] once per bucket, unconditionally.
pub(crate) fn flush_bucket(key: &str, bucket: &mut Bucket, mut on_line: impl FnMut(&str, &str)) {
    let should_emit = bucket.sampling && bucket.count > 0.0;

    if should_emit {
        match bucket.bucket_type {
            BucketType::Counter => {
                let line = format_counter_line(key, bucket);
                on_line(key, &line);
            }
            BucketType::Timer => {
                for line in format_timer_lines(key, bucket) {
                    on_line(key, &line);
                }
            }
        }
    }

    bucket.reset_aggregation();
}
