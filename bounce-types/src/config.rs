//! Configuration types for simulation.
//!
//! [`SimulationConfig`] carries everything that is fixed for the lifetime
//! of a simulation: the timestep, gravity, the coefficient of restitution,
//! the contact tolerance, and the solver pass count.

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Gravitational acceleration applied to every movable body each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Gravity {
    /// Acceleration vector in m/s².
    pub acceleration: Vector3<f64>,
}

impl Default for Gravity {
    fn default() -> Self {
        Self::earth()
    }
}

impl Gravity {
    /// Standard Earth gravity along −Y.
    #[must_use]
    pub fn earth() -> Self {
        Self {
            acceleration: Vector3::new(0.0, -9.81, 0.0),
        }
    }

    /// No gravity.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            acceleration: Vector3::zeros(),
        }
    }

    /// Gravity with a custom acceleration vector.
    #[must_use]
    pub const fn from_acceleration(acceleration: Vector3<f64>) -> Self {
        Self { acceleration }
    }

    /// Check if gravity is effectively zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.acceleration.norm_squared() < 1e-20
    }
}

/// Main configuration for a simulation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimulationConfig {
    /// Fixed timestep for physics integration (seconds).
    pub timestep: f64,
    /// Gravity configuration.
    pub gravity: Gravity,
    /// Coefficient of restitution `e ∈ [0, 1]` for all contacts.
    pub restitution: f64,
    /// Contact tolerance: separations below this register as contacts.
    pub contact_epsilon: f64,
    /// Number of Gauss-Seidel sweeps over the contact set per tick.
    pub solver_passes: usize,
    /// Maximum simulation time (`None` for unlimited).
    pub max_time: Option<f64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            timestep: 1.0 / 120.0,
            gravity: Gravity::earth(),
            restitution: 0.9,
            contact_epsilon: 1e-3,
            solver_passes: 1,
            max_time: None,
        }
    }
}

impl SimulationConfig {
    /// Create a configuration with the given timestep.
    #[must_use]
    pub fn with_timestep(timestep: f64) -> Self {
        Self {
            timestep,
            ..Default::default()
        }
    }

    /// Configuration for real-time display rates (60 Hz).
    #[must_use]
    pub fn realtime() -> Self {
        Self {
            timestep: 1.0 / 60.0,
            ..Default::default()
        }
    }

    /// Configuration for high-fidelity runs (4000 Hz).
    ///
    /// Small steps keep penetrations well inside the contact tolerance,
    /// which matters for resting and stacked configurations.
    #[must_use]
    pub fn high_fidelity() -> Self {
        Self {
            timestep: 1.0 / 4000.0,
            ..Default::default()
        }
    }

    /// Set the gravity.
    #[must_use]
    pub fn gravity(mut self, gravity: Gravity) -> Self {
        self.gravity = gravity;
        self
    }

    /// Disable gravity.
    #[must_use]
    pub fn zero_gravity(mut self) -> Self {
        self.gravity = Gravity::zero();
        self
    }

    /// Set the coefficient of restitution.
    #[must_use]
    pub fn restitution(mut self, e: f64) -> Self {
        self.restitution = e;
        self
    }

    /// Set the contact tolerance.
    #[must_use]
    pub fn contact_epsilon(mut self, epsilon: f64) -> Self {
        self.contact_epsilon = epsilon;
        self
    }

    /// Set the number of solver passes.
    #[must_use]
    pub fn solver_passes(mut self, passes: usize) -> Self {
        self.solver_passes = passes;
        self
    }

    /// Set the maximum simulation time.
    #[must_use]
    pub fn max_time(mut self, max_time: f64) -> Self {
        self.max_time = Some(max_time);
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> crate::Result<()> {
        if !self.timestep.is_finite() || self.timestep <= 0.0 {
            return Err(crate::SimError::InvalidTimestep(self.timestep));
        }

        if self.timestep > 1.0 {
            return Err(crate::SimError::invalid_config(
                "timestep > 1 second is likely an error",
            ));
        }

        if !self.restitution.is_finite() || !(0.0..=1.0).contains(&self.restitution) {
            return Err(crate::SimError::InvalidRestitution(self.restitution));
        }

        if !self.contact_epsilon.is_finite() || self.contact_epsilon < 0.0 {
            return Err(crate::SimError::invalid_config(
                "contact_epsilon must be non-negative and finite",
            ));
        }

        if self.solver_passes == 0 {
            return Err(crate::SimError::invalid_config(
                "solver_passes must be at least 1",
            ));
        }

        if !self.gravity.acceleration.iter().all(|x| x.is_finite()) {
            return Err(crate::SimError::invalid_config(
                "gravity acceleration must be finite",
            ));
        }

        Ok(())
    }

    /// Get the tick frequency in Hz.
    #[must_use]
    pub fn frequency(&self) -> f64 {
        1.0 / self.timestep
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_relative_eq!(config.timestep, 1.0 / 120.0, epsilon = 1e-12);
        assert_relative_eq!(config.restitution, 0.9, epsilon = 1e-12);
        assert_relative_eq!(config.contact_epsilon, 1e-3, epsilon = 1e-12);
        assert_eq!(config.solver_passes, 1);
    }

    #[test]
    fn test_config_presets() {
        let realtime = SimulationConfig::realtime();
        assert_relative_eq!(realtime.timestep, 1.0 / 60.0, epsilon = 1e-12);

        let hifi = SimulationConfig::high_fidelity();
        assert_relative_eq!(hifi.timestep, 1.0 / 4000.0, epsilon = 1e-12);
        assert!(hifi.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = SimulationConfig::with_timestep(0.001)
            .zero_gravity()
            .restitution(1.0)
            .contact_epsilon(1e-4)
            .max_time(10.0);

        assert_relative_eq!(config.timestep, 0.001, epsilon = 1e-12);
        assert!(config.gravity.is_zero());
        assert_relative_eq!(config.restitution, 1.0, epsilon = 1e-12);
        assert_eq!(config.max_time, Some(10.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = SimulationConfig::default();
        assert!(config.validate().is_ok());

        config.timestep = 0.0;
        assert!(config.validate().is_err());
        config.timestep = f64::NAN;
        assert!(config.validate().is_err());
        config.timestep = 1.0 / 120.0;

        config.restitution = 1.5;
        assert!(config.validate().is_err());
        config.restitution = -0.1;
        assert!(config.validate().is_err());
        config.restitution = 0.9;

        config.contact_epsilon = -1e-3;
        assert!(config.validate().is_err());
        config.contact_epsilon = 1e-3;

        config.solver_passes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_gravity() {
        assert!(Gravity::zero().is_zero());
        assert!(!Gravity::earth().is_zero());
        assert_relative_eq!(Gravity::earth().acceleration.y, -9.81, epsilon = 1e-12);
    }

    #[test]
    fn test_frequency() {
        let config = SimulationConfig::with_timestep(0.01);
        assert_relative_eq!(config.frequency(), 100.0, epsilon = 1e-12);
    }
}
