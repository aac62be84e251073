use std::fmt;

use thiserror::Error;

/// Which bound a value was checked against.
///
/// Soft limits (`Minimum`/`Maximum`) are user-adjustable; hard limits are
/// fixed at construction and constrain the soft limits themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    Minimum,
    Maximum,
    HardMinimum,
    HardMaximum,
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Minimum => "minimum",
            Self::Maximum => "maximum",
            Self::HardMinimum => "hard minimum",
            Self::HardMaximum => "hard maximum",
        };
        f.write_str(s)
    }
}

/// Errors raised by the parameter system.
#[derive(Error, Debug)]
pub enum ParameterError {
    /// A value or limit violates a bound. The read or write that triggered
    /// the check fails; the parameter is never silently clamped.
    #[error("parameter {name} has a {limit} of {bound}")]
    Edge {
        name: String,
        limit: LimitKind,
        bound: f64,
    },

    /// A link expression referenced something that is not a parameter of
    /// this collection.
    #[error("a link may only reference parameters of the same collection")]
    NotLink,

    /// An always-frozen parameter cannot be re-expressed as a link.
    #[error("parameter {name} is always frozen and cannot be linked")]
    FrozenNoLink { name: String },

    /// A link would make a parameter depend on itself.
    #[error("link of parameter {name} would create a cyclic reference")]
    LinkCycle { name: String },

    /// An always-frozen parameter cannot be thawed.
    #[error("parameter {name} is always frozen and cannot be thawed")]
    AlwaysFrozen { name: String },

    /// A name lookup found no matching parameter.
    #[error("parameter {name} not found")]
    NotFound { name: String },

    /// An expression string could not be parsed.
    #[error("failed to parse expression: {message}")]
    Parse { message: String },

    /// Mismatch between supplied values and the thawed-parameter list.
    #[error("expected {expected} values for thawed parameters, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    /// I/O failure while persisting or restoring a collection.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON failure while persisting or restoring a collection.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PartialEq for ParameterError {
    fn eq(&self, other: &Self) -> bool {
        use ParameterError::*;
        match (self, other) {
            (
                Edge {
                    name: a,
                    limit: la,
                    bound: ba,
                },
                Edge {
                    name: b,
                    limit: lb,
                    bound: bb,
                },
            ) => a == b && la == lb && ba == bb,
            (NotLink, NotLink) => true,
            (FrozenNoLink { name: a }, FrozenNoLink { name: b }) => a == b,
            (LinkCycle { name: a }, LinkCycle { name: b }) => a == b,
            (AlwaysFrozen { name: a }, AlwaysFrozen { name: b }) => a == b,
            (NotFound { name: a }, NotFound { name: b }) => a == b,
            (Parse { message: a }, Parse { message: b }) => a == b,
            (
                CountMismatch {
                    expected: ea,
                    actual: aa,
                },
                CountMismatch {
                    expected: eb,
                    actual: ab,
                },
            ) => ea == eb && aa == ab,
            _ => false,
        }
    }
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, ParameterError>;
