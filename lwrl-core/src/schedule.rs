//! Exploration schedules, functions of the training step.
use crate::error::LwrlError;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A named schedule mapping a step to the intensity of exploration.
///
/// In YAML, a schedule is written as `{type: name, args: {...}}`:
///
/// ```yaml
/// type: linear
/// args:
///   initial_value: 1.0
///   final_value: 0.02
///   schedule_steps: 10000
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", content = "args", rename_all = "snake_case")]
pub enum ScheduleConfig {
    /// The same value at every step.
    Constant {
        /// Value.
        value: f64,
    },

    /// Linear interpolation from `initial_value` at step 0 to `final_value`
    /// at `schedule_steps`, constant afterwards.
    Linear {
        /// Value at step 0.
        initial_value: f64,
        /// Value from `schedule_steps` on.
        final_value: f64,
        /// Number of steps to reach `final_value`.
        schedule_steps: u64,
    },

    /// `final + (initial - final) * decay_rate ^ (step / decay_steps)`.
    Exponential {
        /// Value at step 0.
        initial_value: f64,
        /// Asymptotic value.
        final_value: f64,
        /// Decay per `decay_steps` steps, in `(0, 1]`.
        decay_rate: f64,
        /// Steps per decay.
        decay_steps: u64,
    },

    /// Linear interpolation between `(step, value)` endpoints sorted by step.
    Piecewise {
        /// Endpoints of the segments.
        endpoints: Vec<(u64, f64)>,
        /// Value outside of the endpoints. The nearest endpoint value is
        /// used when not given.
        #[serde(default)]
        outside_value: Option<f64>,
    },
}

impl ScheduleConfig {
    /// Linear decay from `initial_value` to `final_value` over `schedule_steps`.
    pub fn linear(initial_value: f64, final_value: f64, schedule_steps: u64) -> Self {
        Self::Linear {
            initial_value,
            final_value,
            schedule_steps,
        }
    }

    /// Constant schedule.
    pub fn constant(value: f64) -> Self {
        Self::Constant { value }
    }

    /// Checks parameters of the schedule.
    pub fn validate(&self) -> Result<()> {
        if !self.values().iter().all(|v| v.is_finite()) {
            return err("values must be finite");
        }
        match self {
            Self::Constant { .. } => Ok(()),
            Self::Linear { schedule_steps, .. } => match schedule_steps {
                0 => err("schedule_steps must be positive"),
                _ => Ok(()),
            },
            Self::Exponential {
                decay_rate,
                decay_steps,
                ..
            } => {
                if *decay_steps == 0 {
                    err("decay_steps must be positive")
                } else if *decay_rate <= 0.0 || *decay_rate > 1.0 {
                    err("decay_rate must be in (0, 1]")
                } else {
                    Ok(())
                }
            }
            Self::Piecewise { endpoints, .. } => {
                if endpoints.is_empty() {
                    err("endpoints must not be empty")
                } else if endpoints.windows(2).any(|w| w[0].0 >= w[1].0) {
                    err("endpoints must be sorted by step")
                } else {
                    Ok(())
                }
            }
        }
    }

    fn values(&self) -> Vec<f64> {
        match self {
            Self::Constant { value } => vec![*value],
            Self::Linear {
                initial_value,
                final_value,
                ..
            }
            | Self::Exponential {
                initial_value,
                final_value,
                ..
            } => vec![*initial_value, *final_value],
            Self::Piecewise {
                endpoints,
                outside_value,
            } => endpoints
                .iter()
                .map(|(_, v)| *v)
                .chain(outside_value.iter().cloned())
                .collect(),
        }
    }

    /// Returns the value of the schedule at `step`.
    pub fn value(&self, step: u64) -> f64 {
        match self {
            Self::Constant { value } => *value,
            Self::Linear {
                initial_value,
                final_value,
                schedule_steps,
            } => {
                let fraction = (step as f64 / *schedule_steps as f64).min(1.0);
                initial_value + fraction * (final_value - initial_value)
            }
            Self::Exponential {
                initial_value,
                final_value,
                decay_rate,
                decay_steps,
            } => {
                let decay = decay_rate.powf(step as f64 / *decay_steps as f64);
                final_value + (initial_value - final_value) * decay
            }
            Self::Piecewise {
                endpoints,
                outside_value,
            } => piecewise(endpoints, *outside_value, step),
        }
    }
}

fn err(msg: &str) -> Result<()> {
    Err(LwrlError::InvalidConfig(format!("schedule: {}", msg)).into())
}

fn piecewise(endpoints: &[(u64, f64)], outside_value: Option<f64>, step: u64) -> f64 {
    let (first, last) = match (endpoints.first(), endpoints.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return outside_value.unwrap_or(0.0),
    };

    if step < first.0 {
        return outside_value.unwrap_or(first.1);
    }
    if step > last.0 {
        return outside_value.unwrap_or(last.1);
    }

    for w in endpoints.windows(2) {
        let ((l_t, l_v), (r_t, r_v)) = (w[0], w[1]);
        if l_t <= step && step < r_t {
            let alpha = (step - l_t) as f64 / (r_t - l_t) as f64;
            return l_v + alpha * (r_v - l_v);
        }
    }
    last.1
}
