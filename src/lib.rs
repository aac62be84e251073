//! # fitpars
//!
//! `fitpars` is a bounds-checked, linkable parameter system for fitting
//! numerical models to scientific data.
//!
//! The library provides:
//! - Parameters with soft limits that validate every change, inside fixed
//!   hard limits
//! - Freeze/thaw state so parameters can be excluded from a fit
//! - Linked parameters defined by expressions over other parameters, with
//!   cycle detection and repair
//! - An expression parser for building links from text
//! - Text and HTML rendering of parameter settings
//!
//! ## Basic Usage
//!
//! ```
//! use fitpars::{Parameter, Parameters};
//!
//! let mut pars = Parameters::new();
//! let a = pars.add(Parameter::new("mdl", "a", 2.0).unwrap());
//! let b = pars.add(Parameter::new("mdl", "b", 1.0).unwrap());
//!
//! pars.set_link(b, 10.0 - a).unwrap();
//! assert_eq!(pars.value(b).unwrap(), 8.0);
//! ```

// Public modules
pub mod error;

// Parameter system
pub mod parameters;

// Re-exports for convenience
pub use error::{LimitKind, ParameterError, Result};
pub use parameters::{Expr, ParamId, Parameter, ParameterUpdate, Parameters};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
