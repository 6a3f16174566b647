//! Core abstractions shared by models, algorithms and environments.
mod algorithm;
mod batch;
mod env;
mod spaces;
pub use algorithm::{Algorithm, LearnContext, Setup};
pub use batch::TransitionBatch;
pub use env::{Env, Step};
pub use spaces::{Action, ActionSpec, StateSpec};
