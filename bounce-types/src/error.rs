//! Error types for simulation operations.

use thiserror::Error;

/// Errors that can occur during simulation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// Invalid body ID referenced.
    #[error("invalid body ID: {0}")]
    InvalidBodyId(usize),

    /// Invalid timestep.
    #[error("invalid timestep: {0} (must be positive and finite)")]
    InvalidTimestep(f64),

    /// Restitution coefficient outside `[0, 1]`.
    #[error("invalid restitution: {0} (must be in [0, 1])")]
    InvalidRestitution(f64),

    /// Non-positive sphere radius.
    #[error("invalid radius: {0} (must be positive and finite)")]
    InvalidRadius(f64),

    /// Non-positive mass density.
    #[error("invalid density: {0} (must be positive and finite)")]
    InvalidDensity(f64),

    /// Plane normal too short to normalize.
    #[error("degenerate plane normal (length {length})")]
    DegenerateNormal {
        /// Length of the rejected normal vector.
        length: f64,
    },

    /// Invalid mass properties.
    #[error("invalid mass properties: {reason}")]
    InvalidMassProperties {
        /// Description of what's wrong.
        reason: String,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },

    /// Simulation diverged (`NaN` or `Inf` detected in a body's state).
    #[error("simulation diverged: {reason}")]
    Diverged {
        /// Description of what went wrong, naming the offending body.
        reason: String,
    },
}

impl SimError {
    /// Create a diverged error.
    #[must_use]
    pub fn diverged(reason: impl Into<String>) -> Self {
        Self::Diverged {
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create an invalid mass properties error.
    #[must_use]
    pub fn invalid_mass(reason: impl Into<String>) -> Self {
        Self::InvalidMassProperties {
            reason: reason.into(),
        }
    }

    /// Check if this is a divergence error.
    #[must_use]
    pub fn is_diverged(&self) -> bool {
        matches!(self, Self::Diverged { .. })
    }

    /// Check if this is a configuration error.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig { .. }
                | Self::InvalidTimestep(_)
                | Self::InvalidRestitution(_)
                | Self::InvalidRadius(_)
                | Self::InvalidDensity(_)
                | Self::DegenerateNormal { .. }
                | Self::InvalidMassProperties { .. }
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SimError::InvalidBodyId(3);
        assert!(err.to_string().contains('3'));

        let err = SimError::InvalidTimestep(-0.5);
        assert!(err.to_string().contains("-0.5"));

        let err = SimError::diverged("NaN in linear momentum of Body(2)");
        assert!(err.to_string().contains("Body(2)"));
    }

    #[test]
    fn test_error_predicates() {
        let err = SimError::diverged("test");
        assert!(err.is_diverged());
        assert!(!err.is_config_error());

        let err = SimError::InvalidRestitution(1.5);
        assert!(err.is_config_error());
        assert!(!err.is_diverged());

        let err = SimError::DegenerateNormal { length: 0.0 };
        assert!(err.is_config_error());
    }
}
