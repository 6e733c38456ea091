//! Simulation stepping and control flow.
//!
//! The [`Stepper`] orchestrates the fixed-Δt tick:
//!
//! 1. Clear accumulators and apply gravity (`F = m·g`, `τ = 0`)
//! 2. RK4-integrate every movable body; renormalize orientations and
//!    refresh world quantities
//! 3. Detect sphere/plane and sphere/sphere contacts
//! 4. Run the impulse solver over the contact set
//! 5. Advance simulation time
//!
//! Integration of all bodies completes before detection begins, and
//! detection completes before the solver runs. Simulation time advances
//! by whole ticks, independently of wall time: [`Stepper::step_to`]
//! catches the simulation clock up to a wall-clock target and then
//! invokes the driver's render callback once.

use crate::world::World;
use bounce_types::SimError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Result of a simulation step.
#[derive(Debug, Clone, Copy)]
pub struct StepResult {
    /// Simulation time after the step.
    pub time: f64,
    /// Number of contacts detected this tick.
    pub contacts: usize,
    /// Number of impulses applied this tick.
    pub impulses: usize,
    /// Whether simulation has completed (reached `max_time`).
    pub completed: bool,
}

/// Configuration for the stepper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StepperConfig {
    /// Whether to automatically apply gravity each step.
    pub apply_gravity: bool,
    /// Whether to detect and resolve contacts each step.
    pub enable_contacts: bool,
}

impl Default for StepperConfig {
    fn default() -> Self {
        Self {
            apply_gravity: true,
            enable_contacts: true,
        }
    }
}

impl StepperConfig {
    /// Create config without gravity (bodies keep their momenta).
    #[must_use]
    pub fn zero_gravity() -> Self {
        Self {
            apply_gravity: false,
            ..Default::default()
        }
    }

    /// Create config without contact handling (free flight).
    #[must_use]
    pub fn no_contacts() -> Self {
        Self {
            enable_contacts: false,
            ..Default::default()
        }
    }
}

/// Render callback invoked once per [`Stepper::step_to`] call. The
/// engine passes no arguments and expects no return.
pub type RenderCallback = Box<dyn FnMut()>;

/// The simulation stepper orchestrates the physics loop.
pub struct Stepper {
    /// Stepper configuration.
    config: StepperConfig,
    /// Driver-supplied render hook for [`Stepper::step_to`].
    render: Option<RenderCallback>,
}

impl std::fmt::Debug for Stepper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stepper")
            .field("config", &self.config)
            .field("render", &self.render.as_ref().map(|_| "FnMut()"))
            .finish()
    }
}

impl Default for Stepper {
    fn default() -> Self {
        Self::new()
    }
}

impl Stepper {
    /// Create a new stepper with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: StepperConfig::default(),
            render: None,
        }
    }

    /// Create a stepper with custom configuration.
    #[must_use]
    pub fn with_config(config: StepperConfig) -> Self {
        Self {
            config,
            render: None,
        }
    }

    /// Get the stepper configuration.
    #[must_use]
    pub fn config(&self) -> &StepperConfig {
        &self.config
    }

    /// Install the render callback invoked once per [`Stepper::step_to`].
    pub fn set_render_callback(&mut self, callback: RenderCallback) {
        self.render = Some(callback);
    }

    /// Remove the render callback.
    pub fn clear_render_callback(&mut self) {
        self.render = None;
    }

    /// Execute one simulation tick of fixed duration `world.timestep()`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or a body's
    /// state contains `NaN`/`Inf` before or after the tick (the error
    /// names the body; the tick is terminated).
    pub fn step(&mut self, world: &mut World) -> bounce_types::Result<StepResult> {
        world.validate()?;

        let dt = world.timestep();

        // 1. Fresh accumulators, then gravity
        world.clear_forces();
        if self.config.apply_gravity {
            world.apply_gravity();
        }

        // 2. Integrate all movable bodies
        world.integrate(dt);

        // 3-4. Contact set, then a Gauss-Seidel impulse sweep over it
        let (contacts, impulses) = if self.config.enable_contacts {
            let contacts = world.detect_contacts();
            let report = world.resolve_contacts(&contacts);
            (contacts.len(), report.applied)
        } else {
            (0, 0)
        };

        // 5. Commit the tick
        world.advance_time(dt);
        world.validate()?;

        Ok(StepResult {
            time: world.time(),
            contacts,
            impulses,
            completed: world.is_complete(),
        })
    }

    /// Advance zero or more whole ticks until the simulation clock would
    /// pass `wall_time`, then invoke the render callback once.
    ///
    /// Returns the number of ticks executed.
    pub fn step_to(&mut self, world: &mut World, wall_time: f64) -> bounce_types::Result<u64> {
        if !wall_time.is_finite() {
            return Err(SimError::invalid_config("wall_time must be finite"));
        }

        let dt = world.timestep();
        let mut ticks = 0;
        while world.time() + dt <= wall_time {
            self.step(world)?;
            ticks += 1;
        }

        if let Some(render) = self.render.as_mut() {
            render();
        }

        Ok(ticks)
    }

    /// Run until completion or until `max_steps` ticks have executed.
    pub fn run(
        &mut self,
        world: &mut World,
        max_steps: Option<u64>,
    ) -> bounce_types::Result<u64> {
        let mut steps = 0u64;
        loop {
            let result = self.step(world)?;
            steps += 1;

            if result.completed {
                break;
            }
            if let Some(max) = max_steps {
                if steps >= max {
                    break;
                }
            }
        }
        Ok(steps)
    }

    /// Run for a specific duration of simulation time.
    pub fn run_for(&mut self, world: &mut World, duration: f64) -> bounce_types::Result<u64> {
        self.step_to(world, world.time() + duration)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use bounce_types::SimulationConfig;
    use nalgebra::{Point3, Vector3};
    use std::cell::Cell;
    use std::rc::Rc;

    fn falling_sphere_world() -> World {
        let mut world = World::new(SimulationConfig::default());
        world.add_plane(Vector3::y(), 0.0).unwrap();
        world
            .add_sphere(Point3::new(0.0, 10.0, 0.0), 1.0, 1.0)
            .unwrap();
        world
    }

    #[test]
    fn test_single_step() {
        let mut world = falling_sphere_world();
        let mut stepper = Stepper::new();

        let result = stepper.step(&mut world).unwrap();
        assert!(!result.completed);
        assert_eq!(result.contacts, 0);
        assert_relative_eq!(result.time, world.timestep(), epsilon = 1e-15);
        assert_eq!(world.step_count(), 1);
    }

    #[test]
    fn test_free_fall_trajectory() {
        let mut world = falling_sphere_world();
        let mut stepper = Stepper::new();

        // One second of free fall: far above the floor, no contacts
        let dt = world.timestep();
        let steps = (1.0 / dt).round() as u64;
        for _ in 0..steps {
            stepper.step(&mut world).unwrap();
        }

        let body = world.bodies().find(|b| !b.is_static()).unwrap();
        // Exact for constant force: y = 10 − ½·g·t², v = −g·t
        assert_relative_eq!(body.position().y, 10.0 - 0.5 * 9.81, epsilon = 1e-9);
        assert_relative_eq!(body.velocity().y, -9.81, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_gravity_config() {
        let mut world = World::new(SimulationConfig::default().zero_gravity());
        let id = world
            .add_sphere(Point3::new(0.0, 5.0, 0.0), 1.0, 1.0)
            .unwrap();

        let mut stepper = Stepper::new();
        for _ in 0..100 {
            stepper.step(&mut world).unwrap();
        }

        assert_relative_eq!(world.body(id).unwrap().position().y, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_stepper_gravity_toggle() {
        let mut world = falling_sphere_world();
        let mut stepper = Stepper::with_config(StepperConfig::zero_gravity());

        for _ in 0..50 {
            stepper.step(&mut world).unwrap();
        }

        let body = world.bodies().find(|b| !b.is_static()).unwrap();
        assert_relative_eq!(body.position().y, 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_step_to_advances_whole_ticks() {
        let mut world = falling_sphere_world();
        let mut stepper = Stepper::new();

        let dt = world.timestep();
        let ticks = stepper.step_to(&mut world, 10.5 * dt).unwrap();
        assert_eq!(ticks, 10);
        assert_relative_eq!(world.time(), 10.0 * dt, epsilon = 1e-12);

        // Already caught up: zero ticks
        let ticks = stepper.step_to(&mut world, 10.5 * dt).unwrap();
        assert_eq!(ticks, 0);
    }

    #[test]
    fn test_step_to_invokes_render_once() {
        let mut world = falling_sphere_world();
        let mut stepper = Stepper::new();

        let calls = Rc::new(Cell::new(0u32));
        let calls_in_callback = Rc::clone(&calls);
        stepper.set_render_callback(Box::new(move || {
            calls_in_callback.set(calls_in_callback.get() + 1);
        }));

        stepper.step_to(&mut world, 0.1).unwrap();
        assert_eq!(calls.get(), 1);

        // Even with no ticks to run, the render callback fires
        stepper.step_to(&mut world, 0.1).unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_run_until_complete() {
        let config = SimulationConfig::default().max_time(0.1);
        let mut world = World::new(config);
        world.add_sphere(Point3::origin(), 1.0, 1.0).unwrap();

        let mut stepper = Stepper::new();
        let steps = stepper.run(&mut world, None).unwrap();

        assert!(world.is_complete());
        // Accumulated float time reaches 0.1 within a tick either way
        let expected = (0.1 / world.timestep()).ceil() as u64;
        assert!(steps >= expected && steps <= expected + 1);
    }

    #[test]
    fn test_run_for_duration() {
        let mut world = falling_sphere_world();
        let mut stepper = Stepper::new();

        let ticks = stepper.run_for(&mut world, 0.5).unwrap();
        let expected = (0.5 / world.timestep()) as u64;
        assert!((ticks as i64 - expected as i64).abs() <= 1);
    }

    #[test]
    fn test_diverged_state_is_fatal_and_named() {
        let mut world = falling_sphere_world();
        let sphere_id = world
            .bodies()
            .find(|b| !b.is_static())
            .map(|b| b.id)
            .unwrap();
        world.body_mut(sphere_id).unwrap().state.position.y = f64::NAN;

        let mut stepper = Stepper::new();
        let err = stepper.step(&mut world).unwrap_err();
        assert!(err.is_diverged());
        assert!(err.to_string().contains(&format!("{sphere_id}")));
    }

    #[test]
    fn test_invalid_wall_time() {
        let mut world = falling_sphere_world();
        let mut stepper = Stepper::new();
        assert!(stepper.step_to(&mut world, f64::NAN).is_err());
    }
}
