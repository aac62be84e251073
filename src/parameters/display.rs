//! Text and HTML rendering of parameters
//!
//! The plain report mirrors the layout users see in an interactive
//! session; the HTML table targets notebook-style rich display. Both
//! resolve links through the collection, so rendering a linked parameter
//! whose expression falls outside its limits fails the same way a value
//! read does.

use crate::error::Result;
use crate::parameters::limits::{HUGEVAL, TINYVAL};
use crate::parameters::parameters::{ParamId, Parameters};

impl Parameters {
    /// A multi-line settings report for one parameter.
    ///
    /// # Examples
    ///
    /// ```
    /// use fitpars::parameters::{Parameter, Parameters};
    ///
    /// let mut pars = Parameters::new();
    /// let p = pars.add(Parameter::with_limits("mdl", "x", 2.0, 0.0, 10.0).unwrap());
    /// let report = pars.report(p).unwrap();
    /// assert!(report.starts_with("val         = 2\n"));
    /// ```
    pub fn report(&self, id: ParamId) -> Result<String> {
        let par = self.by_id(id)?;

        let link = match par.link() {
            Some(expr) => expr.fullname(self)?,
            None => "None".to_string(),
        };

        Ok(format!(
            "val         = {}\n\
             min         = {}\n\
             max         = {}\n\
             units       = {}\n\
             frozen      = {}\n\
             link        = {}\n\
             default_val = {}\n\
             default_min = {}\n\
             default_max = {}",
            self.value(id)?,
            par.min(),
            par.max(),
            par.units_str(),
            par.is_frozen(),
            link,
            self.default_value(id)?,
            par.default_min(),
            par.default_max(),
        ))
    }

    /// An HTML table row set describing one parameter, for rich display
    /// in notebook frontends.
    ///
    /// Limit sentinels render as `MAX`/`TINY`, and values of parameters
    /// whose units are radians render as multiples of &#960; where they
    /// match exactly.
    pub fn to_html(&self, id: ParamId) -> Result<String> {
        let par = self.by_id(id)?;
        let units = par.units_str();

        let mut out = String::from("<table class=\"model\">");
        out.push_str("<thead><tr>");
        for col in [
            "Component",
            "Parameter",
            "Thawed",
            "Value",
            "Min",
            "Max",
            "Units",
        ] {
            out.push_str(&format!("<th>{col}</th>"));
        }
        out.push_str("</tr></thead><tbody><tr>");

        out.push_str(&format!(
            "<th class=\"model-odd\">{}</th>",
            par.modelname()
        ));
        out.push_str(&format!("<td>{}</td>", par.name()));

        match par.link() {
            Some(expr) => {
                out.push_str("<td>linked</td>");
                out.push_str(&format!("<td>{}</td>", val_to_html(self.value(id)?, units)));

                let fullname = expr.fullname(self)?;
                let linkstr = clean_bracket(&fullname);
                out.push_str(&format!("<td colspan=\"2\">&#8656; {linkstr}</td>"));
            }
            None => {
                let checked = if par.is_frozen() { "" } else { " checked" };
                out.push_str(&format!(
                    "<td><input disabled type=\"checkbox\"{checked}></input></td>"
                ));

                out.push_str(&format!("<td>{}</td>", val_to_html(par.value(), units)));
                out.push_str(&format!("<td>{}</td>", val_to_html(par.min(), units)));
                out.push_str(&format!("<td>{}</td>", val_to_html(par.max(), units)));
            }
        }

        out.push_str(&format!("<td>{units}</td>"));
        out.push_str("</tr></tbody></table>");

        Ok(format!(
            "<details open><summary>Parameter</summary>{out}</details>"
        ))
    }

    fn by_id(&self, id: ParamId) -> Result<&crate::parameters::parameter::Parameter> {
        self.get(id).ok_or(crate::error::ParameterError::NotLink)
    }
}

/// Render a value, replacing the limit sentinels with readable labels and
/// showing angles as multiples of pi. Exact equality is intended here:
/// the sentinels and the pi factors are stored, not computed.
fn val_to_html(v: f64, units: &str) -> String {
    if v == HUGEVAL {
        return "MAX".to_string();
    }
    if v == -HUGEVAL {
        return "-MAX".to_string();
    }
    if v == TINYVAL {
        return "TINY".to_string();
    }
    if v == -TINYVAL {
        return "-TINY".to_string();
    }

    if units == "radian" || units == "radians" {
        let tau = 2.0 * std::f64::consts::PI;
        if v == tau {
            return "2&#960;".to_string();
        }
        if v == -tau {
            return "-2&#960;".to_string();
        }
        if v == std::f64::consts::PI {
            return "&#960;".to_string();
        }
        if v == -std::f64::consts::PI {
            return "-&#960;".to_string();
        }
    }

    format!("{v}")
}

/// Strip a single layer of brackets from an expression name, so that
/// `(2 * mdl.a)` displays as `2 * mdl.a`.
fn clean_bracket(name: &str) -> &str {
    name.strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(name)
}
