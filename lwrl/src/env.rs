//! Environments.
mod cartpole;
use crate::GymError;
use anyhow::Result;
pub use cartpole::{CartPole, CartPoleConfig};

/// Ids of the available environments.
pub const ENV_IDS: [&str; 2] = ["CartPole-v0", "CartPole-v1"];

/// Constructs the environment registered with `id`.
///
/// Fails with [`GymError::UnknownEnv`] for unregistered ids.
pub fn make_env(id: &str, seed: u64) -> Result<CartPole> {
    let config = match id {
        "CartPole-v0" => CartPoleConfig::default().max_episode_steps(200),
        "CartPole-v1" => CartPoleConfig::default().max_episode_steps(500),
        _ => return Err(GymError::UnknownEnv(id.to_string()).into()),
    };
    Ok(CartPole::new(config, seed))
}
