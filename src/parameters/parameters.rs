//! A collection of parameters and the link graph between them
//!
//! Parameters live in a [`Parameters`] arena and are addressed by the
//! opaque [`ParamId`] handed out by [`Parameters::add`]. Link expressions
//! reference other parameters by id, so every operation that needs to see
//! across parameters (evaluating a link, detecting cycles, batch get/set of
//! the thawed values) goes through the collection.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ParameterError, Result};
use crate::parameters::expression::{EvaluationContext, Expr, IntoExpr};
use crate::parameters::limits::SetLimitOutcome;
use crate::parameters::parameter::{Parameter, ParameterUpdate};

/// An opaque handle to a parameter stored in a [`Parameters`] collection.
///
/// Ids are only meaningful for the collection that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParamId(usize);

impl ParamId {
    pub(crate) fn new(index: usize) -> Self {
        ParamId(index)
    }

    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// The parameter arena.
///
/// # Examples
///
/// ```
/// use fitpars::parameters::{Parameter, Parameters};
///
/// let mut pars = Parameters::new();
/// let a = pars.add(Parameter::new("mdl", "a", 2.0).unwrap());
/// let b = pars.add(Parameter::new("mdl", "b", 1.0).unwrap());
///
/// // Link b to an expression over a. Reads of b now follow the link.
/// pars.set_link(b, 10.0 - a).unwrap();
/// assert_eq!(pars.value(b).unwrap(), 8.0);
///
/// pars.set_value(a, 3.0).unwrap();
/// assert_eq!(pars.value(b).unwrap(), 7.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    pars: Vec<Parameter>,
}

/// Evaluation context that resolves parameter references against the arena
/// while tracking the chain of parameters currently being evaluated, so
/// that a cyclic link graph surfaces as an error instead of unbounded
/// recursion.
struct EvalGuard<'a> {
    pars: &'a Parameters,
    active: RefCell<Vec<ParamId>>,
    /// Evaluate default values instead of current values, skipping the
    /// soft-limit check on linked reads.
    defaults: bool,
}

impl<'a> EvalGuard<'a> {
    fn new(pars: &'a Parameters, defaults: bool) -> Self {
        Self {
            pars,
            active: RefCell::new(Vec::new()),
            defaults,
        }
    }
}

impl EvaluationContext for EvalGuard<'_> {
    fn value_of(&self, id: ParamId) -> Result<f64> {
        let par = self.pars.get(id).ok_or(ParameterError::NotLink)?;

        if self.active.borrow().contains(&id) {
            return Err(ParameterError::LinkCycle {
                name: par.fullname().to_string(),
            });
        }

        let result = match par.link() {
            Some(link) => {
                self.active.borrow_mut().push(id);
                let value = link.eval(self);
                self.active.borrow_mut().pop();

                let value = value?;
                if !self.defaults {
                    par.validate_value(value)?;
                }
                value
            }
            None if self.defaults => par.default_value(),
            None => par.value(),
        };

        Ok(result)
    }
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter, returning its id.
    pub fn add(&mut self, par: Parameter) -> ParamId {
        let id = ParamId::new(self.pars.len());
        self.pars.push(par);
        id
    }

    pub fn len(&self) -> usize {
        self.pars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pars.is_empty()
    }

    pub fn get(&self, id: ParamId) -> Option<&Parameter> {
        self.pars.get(id.index())
    }

    pub fn get_mut(&mut self, id: ParamId) -> Option<&mut Parameter> {
        self.pars.get_mut(id.index())
    }

    /// Iterate over all parameters with their ids, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (ParamId, &Parameter)> {
        self.pars
            .iter()
            .enumerate()
            .map(|(i, p)| (ParamId::new(i), p))
    }

    /// All ids in insertion order.
    pub fn ids(&self) -> Vec<ParamId> {
        (0..self.pars.len()).map(ParamId::new).collect()
    }

    /// Find a parameter by name, case-insensitively.
    ///
    /// The name may be the `model.par` fullname, the bare parameter name,
    /// or one of its aliases. The first match in insertion order wins.
    pub fn lookup(&self, name: &str) -> Option<ParamId> {
        let wanted = name.to_lowercase();

        for (id, par) in self.iter() {
            if par.fullname().to_lowercase() == wanted {
                return Some(id);
            }
        }
        for (id, par) in self.iter() {
            if par.name().to_lowercase() == wanted
                || par.aliases().iter().any(|a| a == &wanted)
            {
                return Some(id);
            }
        }
        None
    }

    /// Find a parameter by name or fail with
    /// [`NotFound`](ParameterError::NotFound).
    pub fn by_name(&self, name: &str) -> Result<ParamId> {
        self.lookup(name).ok_or_else(|| ParameterError::NotFound {
            name: name.to_string(),
        })
    }

    fn get_checked(&self, id: ParamId) -> Result<&Parameter> {
        self.get(id).ok_or(ParameterError::NotLink)
    }

    fn get_mut_checked(&mut self, id: ParamId) -> Result<&mut Parameter> {
        self.pars.get_mut(id.index()).ok_or(ParameterError::NotLink)
    }

    /// The current value of a parameter.
    ///
    /// For a linked parameter the link expression is evaluated, and the
    /// result must satisfy the parameter's own soft limits. A cycle in the
    /// link graph is reported as
    /// [`LinkCycle`](ParameterError::LinkCycle).
    pub fn value(&self, id: ParamId) -> Result<f64> {
        EvalGuard::new(self, false).value_of(id)
    }

    /// The default value of a parameter, following links.
    pub fn default_value(&self, id: ParamId) -> Result<f64> {
        EvalGuard::new(self, true).value_of(id)
    }

    /// Evaluate an arbitrary expression against the current values.
    pub fn eval_expr(&self, expr: &Expr) -> Result<f64> {
        expr.eval(&EvalGuard::new(self, false))
    }

    /// Parse the text form of an expression, resolving names through
    /// [`lookup`](Self::lookup).
    pub fn parse_expr(&self, input: &str) -> Result<Expr> {
        Expr::parse(input, |name| self.lookup(name))
    }

    /// Set the value of a parameter, removing any link.
    pub fn set_value(&mut self, id: ParamId, val: f64) -> Result<()> {
        self.get_mut_checked(id)?.set_value(val)
    }

    /// Set the soft minimum of a parameter, logging the value adjustment
    /// if the current value had to be pulled up.
    pub fn set_min(&mut self, id: ParamId, min: f64) -> Result<SetLimitOutcome> {
        let par = self.get_mut_checked(id)?;
        let outcome = par.set_min(min)?;
        if let SetLimitOutcome::ClampedValue(value) = outcome {
            warn!(
                parameter = par.fullname(),
                value, "parameter less than new minimum; value reset"
            );
        }
        Ok(outcome)
    }

    /// Set the soft maximum of a parameter, logging the value adjustment
    /// if the current value had to be pulled down.
    pub fn set_max(&mut self, id: ParamId, max: f64) -> Result<SetLimitOutcome> {
        let par = self.get_mut_checked(id)?;
        let outcome = par.set_max(max)?;
        if let SetLimitOutcome::ClampedValue(value) = outcome {
            warn!(
                parameter = par.fullname(),
                value, "parameter greater than new maximum; value reset"
            );
        }
        Ok(outcome)
    }

    pub fn freeze(&mut self, id: ParamId) -> Result<()> {
        self.get_mut_checked(id)?.freeze();
        Ok(())
    }

    pub fn thaw(&mut self, id: ParamId) -> Result<()> {
        self.get_mut_checked(id)?.thaw()
    }

    /// Apply a batch of settings to one parameter.
    pub fn set(&mut self, id: ParamId, update: &ParameterUpdate) -> Result<Vec<SetLimitOutcome>> {
        self.get_mut_checked(id)?.set(update)
    }

    /// Link a parameter to an expression over other parameters.
    ///
    /// The linked parameter reports itself frozen and its reads follow the
    /// expression until [`unlink`](Self::unlink) is called.
    ///
    /// An expression that refers back to the parameter itself is rejected
    /// with [`LinkCycle`](ParameterError::LinkCycle). A cycle formed
    /// through a chain of already-linked parameters is instead repaired:
    /// the chain is broken by removing the link of the parameter this
    /// expression points at, and the new link is installed.
    pub fn set_link(&mut self, id: ParamId, link: impl IntoExpr) -> Result<()> {
        let expr = link.into_expr();

        let par = self.get_checked(id)?;
        if par.is_always_frozen() {
            return Err(ParameterError::FrozenNoLink {
                name: par.fullname().to_string(),
            });
        }

        // Every leaf of the expression must be a live parameter.
        for leaf in expr.params() {
            self.get_checked(leaf)?;
        }

        // A direct self-reference can never be evaluated.
        if expr.contains_param(id) {
            return Err(ParameterError::LinkCycle {
                name: par.fullname().to_string(),
            });
        }

        if self.walk_finds_cycle(id, &expr) {
            self.break_downstream_cycle(id, &expr)?;
        }

        self.get_mut_checked(id)?.set_link_unchecked(Some(expr));
        Ok(())
    }

    /// Parse and install a link in one step.
    pub fn link_by_name(&mut self, id: ParamId, input: &str) -> Result<()> {
        let expr = self.parse_expr(input)?;
        self.set_link(id, expr)
    }

    /// Remove any link from a parameter.
    pub fn unlink(&mut self, id: ParamId) -> Result<()> {
        self.get_mut_checked(id)?.unlink();
        Ok(())
    }

    /// Walk the chain of single-parameter links starting at the new
    /// expression, looking for a path back to `id`. The walk stops at the
    /// first expression that is not a bare parameter reference, so cycles
    /// routed through a composite expression are not found here; they are
    /// caught at evaluation time instead.
    fn walk_finds_cycle(&self, id: ParamId, expr: &Expr) -> bool {
        let mut current = expr.as_param();

        while let Some(pid) = current {
            let Some(par) = self.get(pid) else {
                return false;
            };
            let Some(link) = par.link() else {
                return false;
            };

            if link.contains_param(id) {
                return true;
            }
            current = link.as_param();
        }
        false
    }

    /// Repair a cyclic chain by removing the link of the parameter the
    /// new expression points at.
    fn break_downstream_cycle(&mut self, id: ParamId, expr: &Expr) -> Result<()> {
        let Some(target) = expr.as_param() else {
            return Ok(());
        };

        let own = self.get_checked(id)?.fullname().to_string();
        let par = self.get_mut_checked(target)?;
        warn!(
            parameter = par.fullname(),
            linked_to = own.as_str(),
            "removing link to break a cycle in the link graph"
        );
        par.set_link_unchecked(None);
        Ok(())
    }

    /// Ids of the parameters free to vary during a fit, in insertion
    /// order. Linked and frozen parameters are excluded.
    pub fn thawed(&self) -> Vec<ParamId> {
        self.iter()
            .filter(|(_, p)| !p.is_frozen())
            .map(|(id, _)| id)
            .collect()
    }

    /// The values of the thawed parameters, in the order of
    /// [`thawed`](Self::thawed).
    pub fn thawed_values(&self) -> Vec<f64> {
        self.thawed()
            .into_iter()
            .filter_map(|id| self.get(id).map(Parameter::value))
            .collect()
    }

    /// Assign new values to the thawed parameters.
    ///
    /// The slice must have exactly one entry per thawed parameter; each
    /// value is validated against that parameter's soft limits before
    /// being stored.
    pub fn set_thawed_values(&mut self, values: &[f64]) -> Result<()> {
        let ids = self.thawed();
        if ids.len() != values.len() {
            return Err(ParameterError::CountMismatch {
                expected: ids.len(),
                actual: values.len(),
            });
        }

        for (id, &value) in ids.iter().zip(values) {
            self.get_mut_checked(*id)?.set_value(value)?;
        }
        Ok(())
    }

    /// Reset every parameter to its default value and, where the limits
    /// were guessed, its default limits.
    pub fn reset_all(&mut self) {
        for par in &mut self.pars {
            par.reset();
        }
    }

    /// Serialize the collection to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize a collection from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the collection to a JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Read a collection from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Snapshot the current values of every parameter, following links.
    pub fn values(&self) -> Result<HashMap<ParamId, f64>> {
        let mut out = HashMap::with_capacity(self.pars.len());
        for id in self.ids() {
            out.insert(id, self.value(id)?);
        }
        Ok(out)
    }
}
