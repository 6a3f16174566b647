use anyhow::Result;
use log::trace;
use lwrl_core::{Action, ActionSpec, Env, StateSpec, Step};
use ndarray::{arr1, ArrayD};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Configuration of [`CartPole`].
///
/// Defaults are those of the classic control task: a 1 kg cart, a 0.1 kg
/// pole of half-length 0.5 m, 10 N pushes and a 0.02 s time step.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartPoleConfig {
    /// Downward acceleration of gravity (m/s^2).
    pub gravity: f64,

    /// Mass of the cart (kg).
    pub mass_cart: f64,

    /// Mass of the pole (kg).
    pub mass_pole: f64,

    /// Half the length of the pole (m).
    pub length_half_pole: f64,

    /// Magnitude of the force applied by actions (N).
    pub action_force: f64,

    /// Simulation time step (s).
    pub time_step: f64,

    /// Maximum absolute cart position (m) before the episode ends.
    pub max_pos: f64,

    /// Maximum absolute pole angle (rad) before the episode ends.
    pub max_angle: f64,

    /// Episodes are truncated after this number of steps.
    pub max_episode_steps: usize,
}

impl Default for CartPoleConfig {
    fn default() -> Self {
        Self {
            gravity: 9.8,
            mass_cart: 1.0,
            mass_pole: 0.1,
            length_half_pole: 0.5,
            action_force: 10.0,
            time_step: 0.02,
            max_pos: 2.4,
            max_angle: 12.0f64.to_radians(),
            max_episode_steps: 500,
        }
    }
}

impl CartPoleConfig {
    /// Sets the number of steps after which episodes are truncated.
    pub fn max_episode_steps(mut self, v: usize) -> Self {
        self.max_episode_steps = v;
        self
    }
}

/// Cart-pole environment.
///
/// A pole is hinged on a cart moving along a frictionless track. Action `0`
/// pushes the cart to the left and `1` to the right. Every step gives
/// reward `1`; the episode ends when the pole falls beyond `max_angle`, the
/// cart leaves `[-max_pos, max_pos]`, or `max_episode_steps` is reached.
///
/// Observations are `[cart_position, cart_velocity, pole_angle, pole_angular_velocity]`.
#[derive(Debug)]
pub struct CartPole {
    config: CartPoleConfig,
    state: [f64; 4],
    n_steps: usize,
    rng: SmallRng,
}

impl CartPole {
    /// Constructs the environment.
    pub fn new(config: CartPoleConfig, seed: u64) -> Self {
        Self {
            config,
            state: [0.0; 4],
            n_steps: 0,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Configuration.
    pub fn config(&self) -> &CartPoleConfig {
        &self.config
    }

    fn obs(&self) -> ArrayD<f32> {
        arr1(&[
            self.state[0] as f32,
            self.state[1] as f32,
            self.state[2] as f32,
            self.state[3] as f32,
        ])
        .into_dyn()
    }

    /// Advances the physics by one time step with semi-implicit Euler integration.
    fn integrate(&mut self, force: f64) {
        let c = &self.config;
        let [x, x_dot, theta, theta_dot] = self.state;
        let total_mass = c.mass_cart + c.mass_pole;
        let mass_length_pole = c.mass_pole * c.length_half_pole;
        let (sin_theta, cos_theta) = theta.sin_cos();

        let temp = (force + mass_length_pole * theta_dot * theta_dot * sin_theta) / total_mass;
        let theta_acc = (c.gravity * sin_theta - cos_theta * temp)
            / (c.length_half_pole
                * (4.0 / 3.0 - c.mass_pole * cos_theta * cos_theta / total_mass));
        let x_acc = temp - mass_length_pole * theta_acc * cos_theta / total_mass;

        let x_dot = x_dot + c.time_step * x_acc;
        let x = x + c.time_step * x_dot;
        let theta_dot = theta_dot + c.time_step * theta_acc;
        let theta = theta + c.time_step * theta_dot;
        self.state = [x, x_dot, theta, theta_dot];
    }
}

impl Env for CartPole {
    fn state_spec(&self) -> StateSpec {
        StateSpec::new(vec![4])
    }

    fn action_spec(&self) -> ActionSpec {
        ActionSpec::discrete(2)
    }

    fn reset(&mut self) -> Result<ArrayD<f32>> {
        for s in self.state.iter_mut() {
            *s = self.rng.gen_range(-0.05..=0.05);
        }
        self.n_steps = 0;
        Ok(self.obs())
    }

    fn step(&mut self, act: &Action) -> Result<Step> {
        self.action_spec().check(act)?;
        let force = match act {
            Action::Discrete(0) => -self.config.action_force,
            _ => self.config.action_force,
        };
        self.integrate(force);
        self.n_steps += 1;

        let [x, _, theta, _] = self.state;
        let terminated = x.abs() > self.config.max_pos || theta.abs() > self.config.max_angle;
        let truncated = self.n_steps >= self.config.max_episode_steps;
        trace!("step {}: {:?}", self.n_steps, self.state);

        Ok(Step::new(self.obs(), 1.0, terminated || truncated))
    }
}
