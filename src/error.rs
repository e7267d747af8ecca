use thiserror::Error;

/// Why the line parser (§4.A) rejected a line.
///
/// Kept distinct from [`EngineError`] so a host can match on the precise
/// reason when incrementing its own rejection-reason counter, without
/// needing to downcast a boxed error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    /// No `:` separator was found in the line at all.
    #[error("no ':' separator found")]
    MissingSeparator,
    /// The key prefix (everything before the rightmost `:`) was empty.
    #[error("key is empty")]
    EmptyKey,
    /// The value between `:` and `|` did not parse as a finite `f64`.
    #[error("value is not a finite number")]
    InvalidValue,
    /// The type token did not match the closed set `{c, ms, kv, g, h, s}`.
    #[error("unrecognized metric type")]
    UnknownType,
    /// A `|@` clause was present but the rate failed to parse, or was
    /// outside `(0, 1]`.
    #[error("sample rate is not a finite number in (0, 1]")]
    InvalidRate,
    /// A `|@` clause was present with nothing after the `@`.
    #[error("sample rate is empty")]
    EmptyRate,
}

/// Errors surfaced by [`crate::config::EngineConfig`] validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `threshold` must be at least 1.
    #[error("threshold must be >= 1, got {0}")]
    ThresholdTooSmall(u64),
    /// `reservoir_size` must be at least 1.
    #[error("reservoir_size must be >= 1, got {0}")]
    ReservoirSizeTooSmall(usize),
}

/// Top-level error type for the engine facade (§7).
///
/// There is deliberately no `AllocationFailure` variant here: the spec's
/// C-style taxonomy treats bucket allocation as fallible, but Rust's global
/// allocator aborts the process on true out-of-memory rather than handing
/// `HashMap::insert` an `Err` to propagate, so that row of the taxonomy has
/// no reachable code path in this implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The line failed to parse; see the nested [`ParseError`] for why.
    #[error("invalid line: {0}")]
    InvalidLine(#[from] ParseError),
    /// Engine construction was given an invalid [`crate::config::EngineConfig`].
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}
