//! Configuration for the integrators.
//!
//! Options are plain structs with sensible defaults. They can be built in code
//! with struct-update syntax or loaded from JSON; missing fields take their
//! default values.
//!
//! ```
//! use quadrs::integrate::{AdaptiveQuadOptions, RuleOrder};
//!
//! let options = AdaptiveQuadOptions::from_json_str(r#"{ "rule": "K21", "nbin": 4 }"#).unwrap();
//! assert_eq!(options.rule, RuleOrder::K21);
//! assert_eq!(options.max_iterations, AdaptiveQuadOptions::default().max_iterations);
//! ```

use serde::{Deserialize, Serialize};

use crate::integrate::error::{IntegrateError, IntegrateResult};
use crate::integrate::quadrature::RuleOrder;

/// Options for self-adaptive Gauss-Kronrod quadrature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveQuadOptions {
    /// Maximum relative error per node (default: 1e-15)
    pub tolerance: f64,
    /// Gauss-Kronrod rule (default: G7-K15)
    pub rule: RuleOrder,
    /// Number of initial equal-width bins (default: 10)
    pub nbin: usize,
    /// Maximum number of refinement iterations (default: 50)
    pub max_iterations: usize,
    /// Maximum number of nodes, active and retired (default: 10 000)
    pub max_nodes: usize,
}

impl Default for AdaptiveQuadOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-15,
            rule: RuleOrder::K15,
            nbin: 10,
            max_iterations: 50,
            max_nodes: 10_000,
        }
    }
}

impl AdaptiveQuadOptions {
    /// Parse options from a JSON document.
    pub fn from_json_str(json: &str) -> IntegrateResult<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Check that every option is usable.
    pub fn validate(&self) -> IntegrateResult<()> {
        validate_tolerance(self.tolerance)?;
        if self.nbin == 0 {
            return Err(IntegrateError::invalid_parameter("nbin", "must be at least 1"));
        }
        if self.nbin > u32::MAX as usize {
            return Err(IntegrateError::invalid_parameter(
                "nbin",
                "must fit in a 32-bit bin id",
            ));
        }
        if self.max_iterations == 0 {
            return Err(IntegrateError::invalid_parameter(
                "max_iterations",
                "must be at least 1",
            ));
        }
        if self.max_nodes < self.nbin {
            return Err(IntegrateError::invalid_parameter(
                "max_nodes",
                format!("must be at least nbin ({})", self.nbin),
            ));
        }
        Ok(())
    }
}

pub(crate) fn validate_tolerance(tolerance: f64) -> IntegrateResult<()> {
    if !(tolerance.is_finite() && tolerance > 0.0) {
        return Err(IntegrateError::invalid_parameter(
            "tolerance",
            format!("must be finite and positive, got {}", tolerance),
        ));
    }
    Ok(())
}

/// Sampling strategy for VEGAS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VegasMode {
    /// Importance sampling with stratification when enough calls are
    /// available (switches to `Stratified` automatically).
    #[default]
    Importance,
    /// Pure importance sampling, one box.
    ImportanceOnly,
    /// Stratified sampling; grid weights come from per-box variances.
    Stratified,
}

/// Options for the VEGAS Monte-Carlo integrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VegasOptions {
    /// Function calls per iteration (default: 10 000)
    pub calls: usize,
    /// Maximum iterations per `integrate` call (default: 5)
    pub iterations: usize,
    /// Maximum number of grid bins per dimension (default: 50)
    pub bins_max: usize,
    /// Grid stiffness exponent (default: 1.5)
    pub alpha: f64,
    /// Sampling mode (default: Importance)
    pub mode: VegasMode,
    /// Stop early once `sigma / |value|` falls below this (default: 1e-4)
    pub max_relative_error: f64,
    /// Base seed of the per-box random streams (default: 0x5eed)
    pub seed: u64,
}

impl Default for VegasOptions {
    fn default() -> Self {
        Self {
            calls: 10_000,
            iterations: 5,
            bins_max: 50,
            alpha: 1.5,
            mode: VegasMode::Importance,
            max_relative_error: 1e-4,
            seed: 0x5eed,
        }
    }
}

impl VegasOptions {
    /// Parse options from a JSON document.
    pub fn from_json_str(json: &str) -> IntegrateResult<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Check that every option is usable.
    pub fn validate(&self) -> IntegrateResult<()> {
        if self.calls < 2 {
            return Err(IntegrateError::invalid_parameter("calls", "must be at least 2"));
        }
        if self.iterations == 0 {
            return Err(IntegrateError::invalid_parameter(
                "iterations",
                "must be at least 1",
            ));
        }
        if self.bins_max < 2 {
            return Err(IntegrateError::invalid_parameter(
                "bins_max",
                "must be at least 2",
            ));
        }
        if !(self.alpha.is_finite() && self.alpha >= 0.0) {
            return Err(IntegrateError::invalid_parameter(
                "alpha",
                "must be finite and non-negative",
            ));
        }
        if !(self.max_relative_error.is_finite() && self.max_relative_error >= 0.0) {
            return Err(IntegrateError::invalid_parameter(
                "max_relative_error",
                "must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(AdaptiveQuadOptions::default().validate().is_ok());
        assert!(VegasOptions::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_adaptive_options() {
        let options = AdaptiveQuadOptions {
            nbin: 0,
            ..Default::default()
        };
        assert!(options.validate().is_err());

        let options = AdaptiveQuadOptions {
            tolerance: -1.0,
            ..Default::default()
        };
        assert!(options.validate().is_err());

        let options = AdaptiveQuadOptions {
            nbin: 20,
            max_nodes: 10,
            ..Default::default()
        };
        assert!(options.validate().is_err());

        let options = AdaptiveQuadOptions {
            max_iterations: 0,
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_json_round_trip_with_defaults() {
        let options = AdaptiveQuadOptions::from_json_str(r#"{ "tolerance": 1e-10 }"#).unwrap();
        assert_eq!(options.tolerance, 1e-10);
        assert_eq!(options.nbin, 10);

        let vegas = VegasOptions::from_json_str(r#"{ "mode": "Stratified", "calls": 500 }"#).unwrap();
        assert_eq!(vegas.mode, VegasMode::Stratified);
        assert_eq!(vegas.calls, 500);

        assert!(AdaptiveQuadOptions::from_json_str(r#"{ "nbin": 0 }"#).is_err());
        assert!(VegasOptions::from_json_str("not json").is_err());
    }
}
