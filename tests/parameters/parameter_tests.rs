//! Integration tests for the Parameter struct
//!
//! These tests verify that a single parameter behaves correctly through
//! its whole lifecycle: construction, value changes, limit changes,
//! freezing and resetting.

use fitpars::parameters::{SetLimitOutcome, HUGEVAL};
use fitpars::{LimitKind, Parameter, ParameterError, ParameterUpdate};

#[test]
fn test_parameter_lifecycle() {
    let mut param = Parameter::new("mdl", "ampl", 10.0).unwrap();

    // Check initial state
    assert_eq!(param.name(), "ampl");
    assert_eq!(param.fullname(), "mdl.ampl");
    assert_eq!(param.value(), 10.0);
    assert_eq!(param.min(), -HUGEVAL);
    assert_eq!(param.max(), HUGEVAL);
    assert!(!param.is_frozen());
    assert!(param.link().is_none());

    // Change value; the default follows.
    param.set_value(15.0).unwrap();
    assert_eq!(param.value(), 15.0);
    assert_eq!(param.default_value(), 15.0);

    // Narrow the limits.
    assert_eq!(param.set_min(0.0).unwrap(), SetLimitOutcome::Unchanged);
    assert_eq!(param.set_max(20.0).unwrap(), SetLimitOutcome::Unchanged);

    // Values outside the new limits are rejected, leaving state alone.
    assert!(param.set_value(-5.0).is_err());
    assert!(param.set_value(25.0).is_err());
    assert_eq!(param.value(), 15.0);

    assert!(param.set_value(5.0).is_ok());
    assert_eq!(param.value(), 5.0);

    // Freeze and thaw.
    param.freeze();
    assert!(param.is_frozen());
    param.thaw().unwrap();
    assert!(!param.is_frozen());

    // Reset returns to the default value.
    param.set_default_value(10.0).unwrap();
    param.reset();
    assert_eq!(param.value(), 10.0);
}

#[test]
fn test_error_messages_name_the_bound() {
    let mut param = Parameter::with_limits("mdl", "eta", 2.0, 0.0, 10.0).unwrap();

    let err = param.set_value(1e12).unwrap_err();
    assert_eq!(err.to_string(), "parameter mdl.eta has a maximum of 10");

    let err = Parameter::new("mdl", "eta", 1e39).unwrap_err();
    assert_eq!(
        err,
        ParameterError::Edge {
            name: "mdl.eta".to_string(),
            limit: LimitKind::Maximum,
            bound: HUGEVAL,
        }
    );
}

#[test]
fn test_narrowing_limit_moves_value() {
    let mut param = Parameter::with_limits("mdl", "x", 9.0, 0.0, 10.0).unwrap();

    // The value follows a limit that passes over it.
    assert_eq!(param.set_max(3.0).unwrap(), SetLimitOutcome::ClampedValue(3.0));
    assert_eq!(param.value(), 3.0);
    assert_eq!(param.default_value(), 3.0);

    let mut param = Parameter::with_limits("mdl", "x", 1.0, 0.0, 10.0).unwrap();
    assert_eq!(param.set_min(5.0).unwrap(), SetLimitOutcome::ClampedValue(5.0));
    assert_eq!(param.value(), 5.0);
}

#[test]
fn test_clamp_cannot_cross_the_other_bound() {
    let mut param = Parameter::with_limits("mdl", "x", 2.0, 0.0, 4.0).unwrap();

    // Raising min above max would leave no legal value; the call fails and
    // nothing changes.
    let err = param.set_min(6.0).unwrap_err();
    assert_eq!(
        err,
        ParameterError::Edge {
            name: "mdl.x".to_string(),
            limit: LimitKind::Maximum,
            bound: 4.0,
        }
    );
    assert_eq!(param.min(), 0.0);
    assert_eq!(param.value(), 2.0);
}

#[test]
fn test_hard_limits_bound_the_soft_limits() {
    let mut param =
        Parameter::with_hard_limits("mdl", "x", 0.5, 0.0, 1.0, 0.0, 1.0).unwrap();

    assert!(param.set_min(-0.1).is_err());
    assert!(param.set_max(1.5).is_err());
    assert_eq!(param.min(), 0.0);
    assert_eq!(param.max(), 1.0);

    // Values inside the hard range but outside the soft range still fail.
    param.set_max(0.8).unwrap();
    assert!(param.set_value(0.9).is_err());
}

#[test]
fn test_always_frozen_parameter() {
    let mut param = Parameter::new("mdl", "ref", 1.0).unwrap().always_frozen();

    assert!(param.is_frozen());
    assert!(param.is_always_frozen());
    assert_eq!(
        param.thaw().unwrap_err(),
        ParameterError::AlwaysFrozen {
            name: "mdl.ref".to_string(),
        }
    );

    // Its value can still be changed.
    param.set_value(2.0).unwrap();
    assert_eq!(param.value(), 2.0);
}

#[test]
fn test_batch_set_applies_in_safe_order() {
    let mut param = Parameter::with_limits("mdl", "x", 2.0, 0.0, 10.0).unwrap();

    // Value and range move together above the old range.
    param
        .set(&ParameterUpdate {
            val: Some(20.0),
            min: Some(8.0),
            max: Some(30.0),
            frozen: Some(true),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(param.value(), 20.0);
    assert_eq!(param.min(), 8.0);
    assert_eq!(param.max(), 30.0);
    assert!(param.is_frozen());

    // And back below it.
    param
        .set(&ParameterUpdate {
            val: Some(1.0),
            min: Some(0.0),
            max: Some(6.0),
            frozen: Some(false),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(param.value(), 1.0);
    assert_eq!(param.min(), 0.0);
    assert_eq!(param.max(), 6.0);
    assert!(!param.is_frozen());
}

#[test]
fn test_batch_set_defaults() {
    let mut param = Parameter::with_limits("mdl", "x", 2.0, 0.0, 10.0).unwrap();

    param
        .set(&ParameterUpdate {
            default_val: Some(5.0),
            default_min: Some(1.0),
            default_max: Some(9.0),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(param.default_value(), 5.0);
    assert_eq!(param.default_min(), 1.0);
    assert_eq!(param.default_max(), 9.0);
    // The live settings are untouched.
    assert_eq!(param.value(), 2.0);
    assert_eq!(param.min(), 0.0);
    assert_eq!(param.max(), 10.0);
}

#[test]
fn test_guessed_limits_are_undone_by_reset() {
    let mut param = Parameter::with_limits("mdl", "x", 2.0, 0.0, 10.0).unwrap();

    param.guess_limits(1.5, 2.5).unwrap();
    assert!(param.is_guessed());
    assert_eq!(param.min(), 1.5);
    assert_eq!(param.max(), 2.5);

    param.reset();
    assert!(!param.is_guessed());
    assert_eq!(param.min(), 0.0);
    assert_eq!(param.max(), 10.0);
    assert_eq!(param.value(), 2.0);
}

#[test]
fn test_builder_settings() {
    let param = Parameter::new("mdl", "nh", 0.1)
        .unwrap()
        .units("10^22 cm^-2")
        .frozen(true)
        .hidden()
        .alias("column");

    assert_eq!(param.units_str(), "10^22 cm^-2");
    assert!(param.is_frozen());
    assert!(param.is_hidden());
    assert_eq!(param.aliases(), &["column".to_string()]);
}
