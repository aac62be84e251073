//! Integration tests for expression building, parsing and evaluation
//!
//! Expressions are exercised end-to-end: built with operators or parsed
//! from text, then evaluated through a live parameter collection.

use approx::assert_relative_eq;

use fitpars::parameters::{BinaryOp, Expr, UnaryOp};
use fitpars::{Parameter, ParameterError, Parameters};

fn pair() -> (Parameters, fitpars::ParamId, fitpars::ParamId) {
    let mut pars = Parameters::new();
    let a = pars.add(Parameter::new("mdl", "a", 2.0).unwrap());
    let b = pars.add(Parameter::new("mdl", "b", 3.0).unwrap());
    (pars, a, b)
}

#[test]
fn test_arithmetic_over_parameters() {
    let (pars, a, b) = pair();

    assert_relative_eq!(pars.eval_expr(&(a + b)).unwrap(), 5.0);
    assert_relative_eq!(pars.eval_expr(&(a - b)).unwrap(), -1.0);
    assert_relative_eq!(pars.eval_expr(&(a * b)).unwrap(), 6.0);
    assert_relative_eq!(pars.eval_expr(&(b / a)).unwrap(), 1.5);
    assert_relative_eq!(pars.eval_expr(&a.pow(b)).unwrap(), 8.0);
    assert_relative_eq!(pars.eval_expr(&(-a)).unwrap(), -2.0);
    assert_relative_eq!(pars.eval_expr(&(100.0 + 2.0 * a)).unwrap(), 104.0);
}

#[test]
fn test_mixed_operand_forms_agree() {
    let (pars, a, _) = pair();

    // Integer literals, float literals, and reflected forms all build the
    // same arithmetic.
    assert_relative_eq!(
        pars.eval_expr(&(a * 2)).unwrap(),
        pars.eval_expr(&(2.0 * a)).unwrap()
    );
    assert_relative_eq!(
        pars.eval_expr(&(10.0 - a)).unwrap(),
        pars.eval_expr(&((-a) + 10.0)).unwrap()
    );
}

#[test]
fn test_remainder_and_floor_division() {
    let mut pars = Parameters::new();
    let x = pars.add(Parameter::new("mdl", "x", -7.0).unwrap());
    let y = pars.add(Parameter::new("mdl", "y", 3.0).unwrap());

    // The remainder takes the sign of the divisor.
    assert_relative_eq!(pars.eval_expr(&(x % y)).unwrap(), 2.0);
    assert_relative_eq!(pars.eval_expr(&x.floor_div(y)).unwrap(), -3.0);
}

#[test]
fn test_expression_display_name() {
    let (mut pars, a, b) = pair();

    let link = 2.0 * b;
    pars.set_link(a, link).unwrap();
    let expr = pars.get(a).unwrap().link().unwrap();
    assert_eq!(expr.fullname(&pars).unwrap(), "(2 * mdl.b)");

    let expr = (Expr::from(a) + b).abs();
    assert_eq!(expr.fullname(&pars).unwrap(), "abs((mdl.a + mdl.b))");
}

#[test]
fn test_composite_flattening_order() {
    let (_, a, b) = pair();

    let sum = a + b;
    let expr = sum.clone() / 2.0;

    let parts = expr.parts();
    assert_eq!(parts.len(), 4);
    assert_eq!(parts[0], &sum);
    assert_eq!(parts[1], &Expr::Param(a));
    assert_eq!(parts[2], &Expr::Param(b));
    assert_eq!(parts[3], &Expr::Const(2.0));

    assert_eq!(expr.params(), vec![a, b]);
}

#[test]
fn test_parse_through_collection() {
    let (mut pars, a, _) = pair();

    let expr = pars.parse_expr("(mdl.a + mdl.b) / 2").unwrap();
    assert_relative_eq!(pars.eval_expr(&expr).unwrap(), 2.5);

    // Bare names and mixed case parse too.
    let expr = pars.parse_expr("ABS(-B) ** a").unwrap();
    assert_relative_eq!(pars.eval_expr(&expr).unwrap(), 9.0);

    // And the parsed expression can be installed as a link.
    pars.link_by_name(a, "10 - mdl.b").unwrap();
    assert_relative_eq!(pars.value(a).unwrap(), 7.0);
}

#[test]
fn test_parse_rejects_unknown_names_and_functions() {
    let (pars, _, _) = pair();

    assert_eq!(
        pars.parse_expr("2 * sigma").unwrap_err(),
        ParameterError::NotFound {
            name: "sigma".to_string(),
        }
    );

    assert!(matches!(
        pars.parse_expr("sqrt(mdl.a)").unwrap_err(),
        ParameterError::Parse { .. }
    ));

    assert!(matches!(
        pars.parse_expr("mdl.a +").unwrap_err(),
        ParameterError::Parse { .. }
    ));
}

#[test]
fn test_parse_precedence_matches_operator_building() {
    let (pars, a, b) = pair();

    let parsed = pars.parse_expr("mdl.a + mdl.b * 2").unwrap();
    let built = a + b * 2.0;
    assert_eq!(parsed, built);
    assert_relative_eq!(pars.eval_expr(&parsed).unwrap(), 8.0);
}

#[test]
fn test_operator_symbols() {
    assert_eq!(BinaryOp::Add.symbol(), "+");
    assert_eq!(BinaryOp::FloorDiv.symbol(), "//");
    assert_eq!(BinaryOp::Pow.symbol(), "**");
    assert_eq!(UnaryOp::Abs.symbol(), "abs");
}
