//! A single bounds-checked model parameter
//!
//! A [`Parameter`] stores a value together with soft limits (`min`/`max`,
//! adjustable) and hard limits (`hard_min`/`hard_max`, fixed at
//! construction). Every mutation is validated: values must stay inside the
//! soft limits, and soft limits must stay inside the hard limits. Each
//! parameter also remembers default values and limits so it can be reset
//! after a fit.

use serde::{Deserialize, Serialize};

use crate::error::{LimitKind, ParameterError, Result};
use crate::parameters::expression::Expr;
use crate::parameters::limits::{Limits, SetLimitOutcome, HUGEVAL};

/// A named, bounds-checked model parameter.
///
/// # Examples
///
/// ```
/// use fitpars::parameters::Parameter;
///
/// let mut p = Parameter::with_limits("gauss", "sigma", 1.0, 0.0, 10.0).unwrap();
/// assert_eq!(p.value(), 1.0);
/// assert_eq!(p.fullname(), "gauss.sigma");
///
/// // Values outside the soft limits are rejected.
/// assert!(p.set_value(20.0).is_err());
/// assert_eq!(p.value(), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    modelname: String,
    name: String,
    fullname: String,
    units: String,
    val: f64,
    limits: Limits,
    default_val: f64,
    default_min: f64,
    default_max: f64,
    frozen: bool,
    alwaysfrozen: bool,
    hidden: bool,
    guessed: bool,
    aliases: Vec<String>,
    link: Option<Expr>,
}

/// A batch of parameter settings for [`Parameter::set`].
///
/// Fields left as `None` are not changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterUpdate {
    pub val: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub default_val: Option<f64>,
    pub default_min: Option<f64>,
    pub default_max: Option<f64>,
    pub frozen: Option<bool>,
}

impl Parameter {
    /// Create a parameter with the widest possible limits.
    ///
    /// # Arguments
    ///
    /// * `modelname` - The name of the model component owning the parameter
    /// * `name` - The parameter name, matched case-insensitively
    /// * `val` - The initial (and default) value
    pub fn new(modelname: &str, name: &str, val: f64) -> Result<Self> {
        Self::with_hard_limits(modelname, name, val, -HUGEVAL, HUGEVAL, -HUGEVAL, HUGEVAL)
    }

    /// Create a parameter with the given soft limits.
    ///
    /// The hard limits stay at their widest.
    pub fn with_limits(modelname: &str, name: &str, val: f64, min: f64, max: f64) -> Result<Self> {
        Self::with_hard_limits(modelname, name, val, min, max, -HUGEVAL, HUGEVAL)
    }

    /// Create a parameter with the given soft and hard limits.
    ///
    /// The hard limits are fixed for the lifetime of the parameter. The
    /// soft limits must lie within them, and the value within the soft
    /// limits, otherwise an [`Edge`](ParameterError::Edge) error is
    /// returned.
    pub fn with_hard_limits(
        modelname: &str,
        name: &str,
        val: f64,
        min: f64,
        max: f64,
        hard_min: f64,
        hard_max: f64,
    ) -> Result<Self> {
        let fullname = format!("{modelname}.{name}");

        let mut limits = Limits {
            min: -HUGEVAL,
            max: HUGEVAL,
            hard_min,
            hard_max,
        };

        // Validate in dependency order: the soft limits against the hard
        // limits, then the value against the soft limits.
        check_against_hard(&limits, &fullname, min)?;
        limits.min = min;
        check_against_hard(&limits, &fullname, max)?;
        limits.max = max;

        if let Some((kind, bound)) = limits.check_soft(val) {
            return Err(ParameterError::Edge {
                name: fullname,
                limit: kind,
                bound,
            });
        }

        Ok(Self {
            modelname: modelname.to_string(),
            name: name.to_string(),
            fullname,
            units: String::new(),
            val,
            limits,
            default_val: val,
            default_min: min,
            default_max: max,
            frozen: false,
            alwaysfrozen: false,
            hidden: false,
            guessed: false,
            aliases: Vec::new(),
            link: None,
        })
    }

    // Builder-style settings, used when declaring a model's parameters.

    /// Set the units label for display purposes.
    pub fn units(mut self, units: &str) -> Self {
        self.units = units.to_string();
        self
    }

    /// Set the initial frozen state.
    pub fn frozen(mut self, frozen: bool) -> Self {
        self.frozen = frozen;
        self
    }

    /// Mark the parameter as permanently frozen. It can never be thawed
    /// or linked.
    pub fn always_frozen(mut self) -> Self {
        self.alwaysfrozen = true;
        self.frozen = true;
        self
    }

    /// Hide the parameter from user-facing listings.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Add an alternative name for lookup. Aliases are stored and matched
    /// in lower case.
    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_lowercase());
        self
    }

    // Accessors

    pub fn modelname(&self) -> &str {
        &self.modelname
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `modelname.name` form used in messages and expressions.
    pub fn fullname(&self) -> &str {
        &self.fullname
    }

    pub fn units_str(&self) -> &str {
        &self.units
    }

    /// The stored value.
    ///
    /// For a linked parameter this is the last value stored directly; the
    /// live value comes from evaluating the link expression through the
    /// owning collection.
    pub fn value(&self) -> f64 {
        self.val
    }

    pub fn min(&self) -> f64 {
        self.limits.min
    }

    pub fn max(&self) -> f64 {
        self.limits.max
    }

    pub fn hard_min(&self) -> f64 {
        self.limits.hard_min
    }

    pub fn hard_max(&self) -> f64 {
        self.limits.hard_max
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn default_value(&self) -> f64 {
        self.default_val
    }

    pub fn default_min(&self) -> f64 {
        self.default_min
    }

    pub fn default_max(&self) -> f64 {
        self.default_max
    }

    /// Is the parameter excluded from fitting? A parameter is frozen if
    /// it was frozen explicitly, is always frozen, or is linked.
    pub fn is_frozen(&self) -> bool {
        self.link.is_some() || self.frozen
    }

    pub fn is_always_frozen(&self) -> bool {
        self.alwaysfrozen
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_linked(&self) -> bool {
        self.link.is_some()
    }

    /// The link expression, if the parameter is linked.
    pub fn link(&self) -> Option<&Expr> {
        self.link.as_ref()
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Were the current soft limits produced by a guessing routine?
    pub fn is_guessed(&self) -> bool {
        self.guessed
    }

    // Mutators

    /// Check a candidate value against the soft limits.
    pub fn validate_value(&self, val: f64) -> Result<()> {
        if let Some((kind, bound)) = self.limits.check_soft(val) {
            return Err(ParameterError::Edge {
                name: self.fullname.clone(),
                limit: kind,
                bound,
            });
        }
        Ok(())
    }

    /// Set the parameter value.
    ///
    /// The value must lie within the soft limits. On success any existing
    /// link is removed and the default value follows the new value.
    pub fn set_value(&mut self, val: f64) -> Result<()> {
        self.validate_value(val)?;
        self.link = None;
        self.val = val;
        self.default_val = val;
        Ok(())
    }

    /// Set the default value used by [`reset`](Self::reset).
    ///
    /// The value must lie within the soft limits. On success any existing
    /// link is removed.
    pub fn set_default_value(&mut self, default_val: f64) -> Result<()> {
        self.validate_value(default_val)?;
        self.link = None;
        self.default_val = default_val;
        Ok(())
    }

    /// Set the soft minimum.
    ///
    /// The new minimum must lie within the hard limits. If the current
    /// value falls below the new minimum it is pulled up to it, and the
    /// adjustment is reported via
    /// [`SetLimitOutcome::ClampedValue`].
    pub fn set_min(&mut self, min: f64) -> Result<SetLimitOutcome> {
        check_against_hard(&self.limits, &self.fullname, min)?;

        if self.val < min {
            // The clamped value still has to respect the opposite bound.
            if min > self.limits.max {
                return Err(ParameterError::Edge {
                    name: self.fullname.clone(),
                    limit: LimitKind::Maximum,
                    bound: self.limits.max,
                });
            }
            self.limits.min = min;
            self.val = min;
            self.default_val = min;
            return Ok(SetLimitOutcome::ClampedValue(min));
        }

        self.limits.min = min;
        Ok(SetLimitOutcome::Unchanged)
    }

    /// Set the soft maximum.
    ///
    /// The new maximum must lie within the hard limits. If the current
    /// value exceeds the new maximum it is pulled down to it, and the
    /// adjustment is reported via
    /// [`SetLimitOutcome::ClampedValue`].
    pub fn set_max(&mut self, max: f64) -> Result<SetLimitOutcome> {
        check_against_hard(&self.limits, &self.fullname, max)?;

        if self.val > max {
            if max < self.limits.min {
                return Err(ParameterError::Edge {
                    name: self.fullname.clone(),
                    limit: LimitKind::Minimum,
                    bound: self.limits.min,
                });
            }
            self.limits.max = max;
            self.val = max;
            self.default_val = max;
            return Ok(SetLimitOutcome::ClampedValue(max));
        }

        self.limits.max = max;
        Ok(SetLimitOutcome::Unchanged)
    }

    /// Set the default minimum restored by [`reset`](Self::reset).
    ///
    /// The default limits never clamp the value, so the outcome is always
    /// [`SetLimitOutcome::Unchanged`].
    pub fn set_default_min(&mut self, min: f64) -> Result<SetLimitOutcome> {
        check_against_hard(&self.limits, &self.fullname, min)?;
        self.default_min = min;
        Ok(SetLimitOutcome::Unchanged)
    }

    /// Set the default maximum restored by [`reset`](Self::reset).
    pub fn set_default_max(&mut self, max: f64) -> Result<SetLimitOutcome> {
        check_against_hard(&self.limits, &self.fullname, max)?;
        self.default_max = max;
        Ok(SetLimitOutcome::Unchanged)
    }

    /// Exclude the parameter from fitting.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Allow the parameter to vary during fitting.
    ///
    /// Fails with [`AlwaysFrozen`](ParameterError::AlwaysFrozen) for a
    /// permanently frozen parameter. Thawing does not remove a link; a
    /// linked parameter reports itself frozen until it is unlinked.
    pub fn thaw(&mut self) -> Result<()> {
        self.set_frozen(false)
    }

    /// Set the frozen flag directly.
    pub fn set_frozen(&mut self, frozen: bool) -> Result<()> {
        if self.alwaysfrozen && !frozen {
            return Err(ParameterError::AlwaysFrozen {
                name: self.fullname.clone(),
            });
        }
        self.frozen = frozen;
        Ok(())
    }

    /// Install a link expression without any cycle checking. The checks
    /// live in the owning collection, which can see the whole graph.
    pub(crate) fn set_link_unchecked(&mut self, link: Option<Expr>) {
        self.link = link;
    }

    /// Remove any link, making the stored value current again.
    pub fn unlink(&mut self) {
        self.link = None;
    }

    /// Restore the default value, and the default limits if the current
    /// limits came from a guessing routine.
    ///
    /// The defaults were validated when they were stored, so no checks are
    /// repeated here.
    pub fn reset(&mut self) {
        if self.guessed {
            self.limits.min = self.default_min;
            self.limits.max = self.default_max;
            self.guessed = false;
        }
        self.val = self.default_val;
    }

    /// Install soft limits produced by a guessing routine.
    ///
    /// The default limits are left alone so that [`reset`](Self::reset)
    /// can undo the guess.
    pub fn guess_limits(&mut self, min: f64, max: f64) -> Result<Vec<SetLimitOutcome>> {
        let outcomes = self.set(&ParameterUpdate {
            min: Some(min),
            max: Some(max),
            ..Default::default()
        })?;
        self.guessed = true;
        Ok(outcomes)
    }

    /// Change several settings at once.
    ///
    /// A combination such as a new value together with a new range must
    /// not fail just because the value lies outside the range in force
    /// before the call. Limits are therefore widened first, then values
    /// applied, then the requested limits installed, with the frozen flag
    /// last.
    ///
    /// Returns the outcomes of the limit changes, in the order they were
    /// applied.
    pub fn set(&mut self, update: &ParameterUpdate) -> Result<Vec<SetLimitOutcome>> {
        let mut outcomes = Vec::new();

        if let Some(max) = update.max {
            if max > self.limits.max {
                outcomes.push(self.set_max(max)?);
            }
        }
        if let Some(default_max) = update.default_max {
            if default_max > self.default_max {
                outcomes.push(self.set_default_max(default_max)?);
            }
        }

        if let Some(min) = update.min {
            if min < self.limits.min {
                outcomes.push(self.set_min(min)?);
            }
        }
        if let Some(default_min) = update.default_min {
            if default_min < self.default_min {
                outcomes.push(self.set_default_min(default_min)?);
            }
        }

        if let Some(val) = update.val {
            self.set_value(val)?;
        }
        if let Some(default_val) = update.default_val {
            self.set_default_value(default_val)?;
        }

        if let Some(min) = update.min {
            outcomes.push(self.set_min(min)?);
        }
        if let Some(max) = update.max {
            outcomes.push(self.set_max(max)?);
        }

        if let Some(default_min) = update.default_min {
            outcomes.push(self.set_default_min(default_min)?);
        }
        if let Some(default_max) = update.default_max {
            outcomes.push(self.set_default_max(default_max)?);
        }

        if let Some(frozen) = update.frozen {
            self.set_frozen(frozen)?;
        }

        Ok(outcomes)
    }
}

/// Reject a candidate soft limit lying outside the hard limits.
fn check_against_hard(limits: &Limits, fullname: &str, val: f64) -> Result<()> {
    if let Some((kind, bound)) = limits.check_hard(val) {
        return Err(ParameterError::Edge {
            name: fullname.to_string(),
            limit: kind,
            bound,
        });
    }
    Ok(())
}
