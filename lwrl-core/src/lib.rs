#![warn(missing_docs)]
//! Core of a lightweight reinforcement learning harness.
//!
//! The central type is [`Model`], the trainable agent. It owns the shared
//! scaffolding of every algorithm: observation preprocessing, exploration on
//! a schedule, step and update counters, and checkpointing. Concrete
//! algorithms plug into it by implementing [`Algorithm`].
//!
//! ```text
//!   raw obs --> Pipeline --> Algorithm::decide --> exploration --> Action
//!                                                         |
//!   Runner: Env::step --> Model::observe (timestep += 1) <-+
//!           replay buffer --> Model::update (num_updates += 1)
//! ```
pub mod checkpoint;
pub mod dummy;
pub mod error;
pub mod opt;
pub mod preprocess;
pub mod record;
pub mod replay_buffer;
pub mod schedule;

mod base;
pub use base::{Action, ActionSpec, Algorithm, Env, LearnContext, Setup, StateSpec, Step, TransitionBatch};

mod model;
pub use model::{Model, ModelConfig};

mod runner;
pub use runner::{Runner, RunnerConfig};
