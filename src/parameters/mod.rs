//! # Parameter System
//!
//! This module provides the parameter system used to describe the adjustable
//! quantities of a model that is fit to data. Parameters carry soft and hard
//! limits, can be frozen out of a fit, and can be linked to expressions over
//! other parameters.
//!
//! ## Key Features
//!
//! - **Bounds Checking**: Every value change is validated against the
//!   parameter's soft limits, and the soft limits against its hard limits
//! - **Freeze and Thaw**: Parameters can be excluded from fitting, either
//!   temporarily or permanently
//! - **Linked Parameters**: A parameter can be defined by an expression over
//!   other parameters, built with the arithmetic operators or parsed from text
//! - **Cycle Handling**: Self-referencing links are rejected, and cycles
//!   through chains of links are repaired by breaking the chain
//! - **Serialization Support**: Save and load parameter collections with serde
//!
//! ## Core Components
//!
//! - [`Parameter`]: Individual parameters with values, limits, and state flags
//! - [`Parameters`]: The arena holding parameters and the link graph
//! - [`Expr`]: Link expressions over parameters and constants
//! - [`Limits`]: The soft and hard limit sets
//!
//! ## Example Usage
//!
//! ```rust
//! use fitpars::parameters::{Parameter, Parameters};
//!
//! let mut pars = Parameters::new();
//!
//! // Add parameters, with or without limits.
//! let pos = pars.add(Parameter::new("gauss", "pos", 0.0).unwrap());
//! let fwhm = pars.add(
//!     Parameter::with_limits("gauss", "fwhm", 10.0, 0.0, 100.0).unwrap(),
//! );
//! let ampl = pars.add(Parameter::new("gauss", "ampl", 1.0).unwrap());
//!
//! // Freeze a parameter so a fit will not vary it.
//! pars.freeze(pos).unwrap();
//!
//! // Link the amplitude to the width.
//! pars.set_link(ampl, 2.0 * fwhm).unwrap();
//! assert_eq!(pars.value(ampl).unwrap(), 20.0);
//!
//! // Only fwhm is free to vary now.
//! assert_eq!(pars.thawed(), vec![fwhm]);
//! pars.set_thawed_values(&[25.0]).unwrap();
//! assert_eq!(pars.value(ampl).unwrap(), 50.0);
//! ```

pub mod display;
pub mod expression;
pub mod limits;
pub mod parameter;
pub mod parameters;

// Re-export key types
pub use expression::{BinaryOp, EvaluationContext, Expr, IntoExpr, UnaryOp};
pub use limits::{Limits, SetLimitOutcome, HUGEVAL, TINYVAL};
pub use parameter::{Parameter, ParameterUpdate};
pub use parameters::{ParamId, Parameters};
