//! Interpreter configuration: a `Config`/`InternalConfig` split, a small
//! set of knobs with sane defaults, validated once at construction rather
//! than re-checked on every use.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which CFPQ solver `cfpq::solve_with_config` uses when the caller doesn't
/// pick one explicitly. The `strum::Display`/`strum::EnumString` derives are
/// what let this enum's name round-trip through `log` messages and
/// `serde_json`-serialized config files without a hand-written match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString)]
pub enum CfpqSolver {
    /// Hellings' worklist algorithm.
    Hellings,
    /// The matrix-fixed-point algorithm.
    Matrix,
}

impl Default for CfpqSolver {
    fn default() -> Self {
        CfpqSolver::Hellings
    }
}

/// User-facing interpreter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Upper bound on transitive-closure fixed-point iterations, guarding
    /// against non-termination on pathological input. `None` means
    /// unbounded.
    pub max_closure_iterations: Option<u32>,
    /// Whether `load` caches resolved graphs by name within one run.
    pub load_cache_enabled: bool,
    /// The default CFPQ solver for unqualified `cfpq(...)` calls.
    pub default_solver: CfpqSolver,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_closure_iterations: Some(10_000),
            load_cache_enabled: true,
            default_solver: CfpqSolver::default(),
        }
    }
}

/// The config after validation, the only form the interpreter accepts.
/// Construction is the single place invalid combinations are rejected.
#[derive(Debug, Clone)]
pub struct InternalConfig {
    inner: Config,
}

impl InternalConfig {
    /// Validates `config`, rejecting a zero iteration cap (which would
    /// make every fixed-point computation trivially fail).
    pub fn new(config: Config) -> Result<Self, String> {
        if config.max_closure_iterations == Some(0) {
            return Err("max_closure_iterations must be nonzero".to_string());
        }
        Ok(Self { inner: config })
    }

    /// The iteration cap, if any.
    pub fn max_closure_iterations(&self) -> Option<u32> {
        self.inner.max_closure_iterations
    }

    /// Whether the `load` cache is enabled.
    pub fn load_cache_enabled(&self) -> bool {
        self.inner.load_cache_enabled
    }

    /// The default CFPQ solver.
    pub fn default_solver(&self) -> CfpqSolver {
        self.inner.default_solver
    }
}

impl Default for InternalConfig {
    fn default() -> Self {
        InternalConfig::new(Config::default()).expect("default config is always valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_iteration_cap_is_rejected() {
        let config = Config {
            max_closure_iterations: Some(0),
            ..Config::default()
        };
        assert!(InternalConfig::new(config).is_err());
    }

    #[test]
    fn default_config_is_valid() {
        assert!(InternalConfig::new(Config::default()).is_ok());
    }

    #[test]
    fn solver_display_matches_variant_name() {
        assert_eq!(CfpqSolver::Hellings.to_string(), "Hellings");
        assert_eq!(CfpqSolver::Matrix.to_string(), "Matrix");
    }

    #[test]
    fn solver_round_trips_through_its_display_form() {
        assert_eq!(CfpqSolver::from_str("Matrix").unwrap(), CfpqSolver::Matrix);
        assert!(CfpqSolver::from_str("not-a-solver").is_err());
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = Config {
            max_closure_iterations: Some(500),
            load_cache_enabled: false,
            default_solver: CfpqSolver::Matrix,
        };
        let json = serde_json::to_string(&config).unwrap();
        let restored: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.max_closure_iterations, Some(500));
        assert!(!restored.load_cache_enabled);
        assert_eq!(restored.default_solver, CfpqSolver::Matrix);
    }
}
