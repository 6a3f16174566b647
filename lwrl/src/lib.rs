//! Experiments with lwrl.
//!
//! The crate bundles environments written in Rust and the configuration of
//! the `lwrl-gym` binary, which trains a DQN agent or tests a saved one:
//!
//! ```text
//! lwrl-gym --env-id CartPole-v1 --agent agent.yaml --network network.yaml \
//!     --save-dir model/cartpole --is-train
//! ```
pub mod config;
pub mod env;
mod error;
pub use error::GymError;
