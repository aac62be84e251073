//! Integration tests for the text and HTML rendering

use fitpars::parameters::HUGEVAL;
use fitpars::{Parameter, ParameterError, Parameters};

#[test]
fn test_report_layout() {
    let mut pars = Parameters::new();
    let p = pars.add(
        Parameter::with_limits("src", "eta", 2.0, 0.0, 10.0)
            .unwrap()
            .units("keV"),
    );

    let report = pars.report(p).unwrap();
    assert_eq!(
        report,
        "val         = 2\n\
         min         = 0\n\
         max         = 10\n\
         units       = keV\n\
         frozen      = false\n\
         link        = None\n\
         default_val = 2\n\
         default_min = 0\n\
         default_max = 10"
    );
}

#[test]
fn test_report_shows_link_expression() {
    let mut pars = Parameters::new();
    let beta = pars.add(Parameter::new("other", "beta", 4.0).unwrap());
    let p = pars.add(Parameter::new("src", "eta", 2.0).unwrap());

    pars.set_link(p, 2.0 * beta).unwrap();
    let report = pars.report(p).unwrap();

    assert!(report.contains("val         = 8"));
    assert!(report.contains("frozen      = true"));
    assert!(report.contains("link        = (2 * other.beta)"));
}

#[test]
fn test_report_fails_when_link_breaks_limits() {
    let mut pars = Parameters::new();
    let beta = pars.add(Parameter::new("other", "beta", 100.0).unwrap());
    let p = pars.add(Parameter::with_limits("src", "eta", 2.0, 0.0, 10.0).unwrap());

    pars.set_link(p, 2.0 * beta).unwrap();
    assert!(matches!(
        pars.report(p).unwrap_err(),
        ParameterError::Edge { .. }
    ));
}

#[test]
fn test_html_table_for_free_parameter() {
    let mut pars = Parameters::new();
    let p = pars.add(Parameter::with_limits("src", "eta", 2.0, 0.0, 10.0).unwrap());

    let html = pars.to_html(p).unwrap();
    assert!(html.starts_with("<details open><summary>Parameter</summary>"));
    assert!(html.contains("<th>Component</th>"));
    assert!(html.contains("<th class=\"model-odd\">src</th>"));
    assert!(html.contains("<td>eta</td>"));
    assert!(html.contains("checkbox\" checked"));
    assert!(!html.contains("colspan"));
}

#[test]
fn test_html_table_for_linked_parameter() {
    let mut pars = Parameters::new();
    let beta = pars.add(Parameter::new("other", "beta", 4.0).unwrap());
    let p = pars.add(Parameter::new("src", "eta", 2.0).unwrap());
    pars.set_link(p, 2.0 * beta).unwrap();

    let html = pars.to_html(p).unwrap();
    assert!(html.contains("<td>linked</td>"));
    assert!(html.contains("<td>8</td>"));
    assert!(html.contains("<td colspan=\"2\">&#8656; 2 * other.beta</td>"));
}

#[test]
fn test_html_limit_sentinels() {
    let mut pars = Parameters::new();
    let p = pars.add(Parameter::new("src", "eta", 2.0).unwrap());

    let html = pars.to_html(p).unwrap();
    // Default limits display as labels, not huge numbers.
    assert!(html.contains("<td>-MAX</td>"));
    assert!(html.contains("<td>MAX</td>"));
    assert!(!html.contains(&format!("{HUGEVAL}")));
}

#[test]
fn test_html_radian_values_as_pi() {
    let pi = std::f64::consts::PI;
    let mut pars = Parameters::new();
    let p = pars.add(
        Parameter::with_limits("src", "angle", pi, -2.0 * pi, 2.0 * pi)
            .unwrap()
            .units("radian"),
    );

    let html = pars.to_html(p).unwrap();
    assert!(html.contains("<td>&#960;</td>"));
    assert!(html.contains("<td>-2&#960;</td>"));
    assert!(html.contains("<td>2&#960;</td>"));
}
