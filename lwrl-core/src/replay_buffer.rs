//! Replay buffer of raw transitions.
mod base;
mod config;
pub use base::SimpleReplayBuffer;
pub use config::SimpleReplayBufferConfig;
