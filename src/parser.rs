use crate::error::ParseError;

/// The metric type token that followed the first `|`.
///
/// Only [`MetricType::Counter`] and [`MetricType::Timer`] are ever absorbed
/// by the sampling engine (§3); the rest parse successfully but are passed
/// through untouched by [`crate::Engine::consider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    /// `c` — counter.
    Counter,
    /// `ms` — timer, milliseconds.
    Timer,
    /// `kv` — plain key/value, not aggregated.
    Kv,
    /// `g` — gauge, not aggregated.
    Gauge,
    /// `h` — histogram, not aggregated.
    Histogram,
    /// `s` — set, not aggregated.
    Set,
}

impl MetricType {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "c" => Some(Self::Counter),
            "ms" => Some(Self::Timer),
            "kv" => Some(Self::Kv),
            "g" => Some(Self::Gauge),
            "h" => Some(Self::Histogram),
            "s" => Some(Self::Set),
            _ => None,
        }
    }
}

/// A single parsed observation, borrowed from the input line (§3).
///
/// Never outlives the `consider` call it was produced for; `key` borrows
/// directly from the caller's byte slice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation<'a> {
    /// The metric name. May itself contain `:` (tag notation); never
    /// contains the separating `|`.
    pub key: &'a str,
    /// The observed value.
    pub value: f64,
    /// The declared metric type.
    pub metric_type: MetricType,
    /// Producer-declared pre-sample rate, in `(0, 1]`. Defaults to `1.0`
    /// when the line carries no `|@rate` clause.
    pub presampling_value: f64,
}

/// Parse one statsd-style line: `<key>:<value>|<type>[|@<rate>]` (§4.A).
///
/// `line` must not include the trailing newline. The key separator is
/// located by scanning from the *right*, because keys may themselves embed
/// `:` in tag notation (e.g. `svc.__region=us:west:42.0|ms`) — see
/// `SPEC_FULL.md` §9 for why a left-to-right scan is wrong here.
pub fn parse(line: &str) -> Result<Observation<'_>, ParseError> {
    let colon = line.rfind(':').ok_or(ParseError::MissingSeparator)?;
    let (key, rest) = (&line[..colon], &line[colon + 1..]);
    if key.is_empty() {
        return Err(ParseError::EmptyKey);
    }

    let mut fields = rest.split('|');
    let value_token = fields.next().unwrap_or("");
    let value: f64 = value_token
        .parse()
        .map_err(|_| ParseError::InvalidValue)?;
    if !value.is_finite() {
        return Err(ParseError::InvalidValue);
    }

    let type_token = fields.next().ok_or(ParseError::UnknownType)?;
    let metric_type = MetricType::from_token(type_token).ok_or(ParseError::UnknownType)?;

    let presampling_value = match fields.next() {
        None => 1.0,
        Some(rate_field) => {
            let rate_str = rate_field
                .strip_prefix('@')
                .ok_or(ParseError::InvalidRate)?;
            if rate_str.is_empty() {
                return Err(ParseError::EmptyRate);
            }
            let rate: f64 = rate_str.parse().map_err(|_| ParseError::InvalidRate)?;
            if !(rate.is_finite() && rate > 0.0 && rate <= 1.0) {
                return Err(ParseError::InvalidRate);
            }
            rate
        }
    };

    Ok(Observation {
        key,
        value,
        metric_type,
        presampling_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_counter() {
        let obs = parse("foo:1|c").unwrap();
        assert_eq!(obs.key, "foo");
        assert_eq!(obs.value, 1.0);
        assert_eq!(obs.metric_type, MetricType::Counter);
        assert_eq!(obs.presampling_value, 1.0);
    }

    #[test]
    fn parses_timer_with_rate() {
        let obs = parse("t:42.5|ms|@0.1").unwrap();
        assert_eq!(obs.key, "t");
        assert_eq!(obs.value, 42.5);
        assert_eq!(obs.metric_type, MetricType::Timer);
        assert_eq!(obs.presampling_value, 0.1);
    }

    #[test]
    fn tag_like_key_with_embedded_colon() {
        // S6: rightmost ':' wins, not the first one.
        let obs = parse("svc.__region=us:west:42.0|ms|@0.1").unwrap();
        assert_eq!(obs.key, "svc.__region=us:west");
        assert_eq!(obs.value, 42.0);
        assert_eq!(obs.metric_type, MetricType::Timer);
        assert_eq!(obs.presampling_value, 0.1);
    }

    #[test]
    fn missing_separator_rejected() {
        assert_eq!(parse("noSeparator|c"), Err(ParseError::MissingSeparator));
    }

    #[test]
    fn empty_key_rejected() {
        assert_eq!(parse(":1|c"), Err(ParseError::EmptyKey));
    }

    #[test]
    fn non_numeric_value_rejected() {
        assert_eq!(parse("foo:abc|c"), Err(ParseError::InvalidValue));
    }

    #[test]
    fn nan_value_rejected() {
        assert_eq!(parse("foo:NaN|c"), Err(ParseError::InvalidValue));
    }

    #[test]
    fn unknown_type_rejected() {
        assert_eq!(parse("foo:1|xyz"), Err(ParseError::UnknownType));
    }

    #[test]
    fn missing_type_rejected() {
        assert_eq!(parse("foo:1"), Err(ParseError::UnknownType));
    }

    #[test]
    fn malformed_rate_missing_at_rejected() {
        assert_eq!(parse("foo:1|c|0.5"), Err(ParseError::InvalidRate));
    }

    #[test]
    fn empty_rate_rejected() {
        assert_eq!(parse("foo:1|c|@"), Err(ParseError::EmptyRate));
    }

    #[test]
    fn rate_out_of_range_rejected() {
        assert_eq!(parse("foo:1|c|@1.5"), Err(ParseError::InvalidRate));
        assert_eq!(parse("foo:1|c|@0"), Err(ParseError::InvalidRate));
        assert_eq!(parse("foo:1|c|@-0.5"), Err(ParseError::InvalidRate));
    }

    #[test]
    fn rate_boundary_one_is_accepted() {
        let obs = parse("foo:1|c|@1").unwrap();
        assert_eq!(obs.presampling_value, 1.0);
    }

    #[test]
    fn passthrough_types_parse_successfully() {
        for (line, expected) in [
            ("foo:1|kv", MetricType::Kv),
            ("foo:1|g", MetricType::Gauge),
            ("foo:1|h", MetricType::Histogram),
            ("foo:1|s", MetricType::Set),
        ] {
            assert_eq!(parse(line).unwrap().metric_type, expected);
        }
    }
}
