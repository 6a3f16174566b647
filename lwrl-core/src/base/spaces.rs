//! Descriptions of observations and actions.
use crate::error::LwrlError;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Shape and value range of observations.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StateSpec {
    /// Shape of a single observation.
    pub shape: Vec<usize>,

    /// Lower bound of observation values, if known.
    #[serde(default)]
    pub min_value: Option<f32>,

    /// Upper bound of observation values, if known.
    #[serde(default)]
    pub max_value: Option<f32>,
}

impl StateSpec {
    /// Constructs an unbounded state spec with the given shape.
    pub fn new(shape: impl Into<Vec<usize>>) -> Self {
        Self {
            shape: shape.into(),
            min_value: None,
            max_value: None,
        }
    }

    /// Sets the value range.
    pub fn bounds(mut self, min_value: f32, max_value: f32) -> Self {
        self.min_value = Some(min_value);
        self.max_value = Some(max_value);
        self
    }

    /// Fails with [`LwrlError::ShapeMismatch`] if `shape` differs from `self.shape`.
    pub fn check_shape(&self, shape: &[usize]) -> Result<()> {
        if self.shape.as_slice() != shape {
            return Err(LwrlError::ShapeMismatch {
                expected: self.shape.clone(),
                actual: shape.to_vec(),
            }
            .into());
        }
        Ok(())
    }
}

fn default_dim() -> usize {
    1
}

/// Kind and range of actions.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionSpec {
    /// Actions are indices in `[0, num_actions)`.
    Discrete {
        /// Number of actions.
        num_actions: usize,
    },

    /// Actions are real vectors of length `dim`.
    Continuous {
        /// Length of an action vector.
        #[serde(default = "default_dim")]
        dim: usize,

        /// Lower bound of action values.
        #[serde(default)]
        min_value: Option<f32>,

        /// Upper bound of action values.
        #[serde(default)]
        max_value: Option<f32>,
    },
}

impl ActionSpec {
    /// Discrete action spec.
    pub fn discrete(num_actions: usize) -> Self {
        Self::Discrete { num_actions }
    }

    /// Scalar continuous action spec bounded by `[min_value, max_value]`.
    pub fn continuous(min_value: f32, max_value: f32) -> Self {
        Self::Continuous {
            dim: 1,
            min_value: Some(min_value),
            max_value: Some(max_value),
        }
    }

    /// Parses an action spec from YAML.
    ///
    /// Unknown kinds and missing fields are reported as
    /// [`LwrlError::InvalidActionSpec`].
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let spec: Self =
            serde_yaml::from_str(s).map_err(|e| LwrlError::InvalidActionSpec(e.to_string()))?;
        spec.validate()?;
        Ok(spec)
    }

    /// Checks the internal consistency of the action spec.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Discrete { num_actions } => {
                if *num_actions == 0 {
                    return Err(LwrlError::InvalidActionSpec(
                        "num_actions must be positive".to_string(),
                    )
                    .into());
                }
            }
            Self::Continuous {
                dim,
                min_value,
                max_value,
            } => {
                if *dim == 0 {
                    return Err(
                        LwrlError::InvalidActionSpec("dim must be positive".to_string()).into(),
                    );
                }
                match (min_value, max_value) {
                    (Some(lo), Some(hi)) if !lo.is_finite() || !hi.is_finite() => {
                        return Err(LwrlError::InvalidActionSpec(format!(
                            "bounds must be finite, got [{}, {}]",
                            lo, hi
                        ))
                        .into())
                    }
                    (Some(lo), Some(hi)) if lo > hi => {
                        return Err(LwrlError::InvalidActionSpec(format!(
                            "min_value {} is larger than max_value {}",
                            lo, hi
                        ))
                        .into())
                    }
                    (Some(_), None) | (None, Some(_)) => {
                        return Err(LwrlError::InvalidActionSpec(
                            "min_value and max_value must be given together".to_string(),
                        )
                        .into())
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Fails with [`LwrlError::InvalidAction`] if `action` does not fit this action spec.
    pub fn check(&self, action: &Action) -> Result<()> {
        match (self, action) {
            (Self::Discrete { num_actions }, Action::Discrete(ix)) => {
                if ix >= num_actions {
                    return Err(LwrlError::InvalidAction(format!(
                        "index {} is out of [0, {})",
                        ix, num_actions
                    ))
                    .into());
                }
            }
            (Self::Continuous { dim, .. }, Action::Continuous(v)) => {
                if v.len() != *dim {
                    return Err(LwrlError::InvalidAction(format!(
                        "expected {} components, got {}",
                        dim,
                        v.len()
                    ))
                    .into());
                }
            }
            _ => {
                return Err(LwrlError::InvalidAction(format!(
                    "{:?} does not match {:?}",
                    action, self
                ))
                .into())
            }
        }
        Ok(())
    }

    /// Clamps continuous components to the bounds, if present.
    pub fn clamp(&self, action: Action) -> Action {
        match (self, action) {
            (
                Self::Continuous {
                    min_value: Some(lo),
                    max_value: Some(hi),
                    ..
                },
                Action::Continuous(v),
            ) => Action::Continuous(v.into_iter().map(|x| x.clamp(*lo, *hi)).collect()),
            (_, action) => action,
        }
    }
}

/// An action applied to an environment.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum Action {
    /// Index of a discrete action.
    Discrete(usize),

    /// Components of a continuous action.
    Continuous(Vec<f32>),
}

impl Action {
    /// Returns the index of a discrete action.
    pub fn as_discrete(&self) -> Option<usize> {
        match self {
            Self::Discrete(ix) => Some(*ix),
            Self::Continuous(_) => None,
        }
    }

    /// Returns the components of a continuous action.
    pub fn as_continuous(&self) -> Option<&[f32]> {
        match self {
            Self::Discrete(_) => None,
            Self::Continuous(v) => Some(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_spec_from_yaml() -> Result<()> {
        let spec = ActionSpec::from_yaml_str("kind: discrete\nnum_actions: 4\n")?;
        assert_eq!(spec, ActionSpec::discrete(4));

        let spec = ActionSpec::from_yaml_str("kind: continuous\nmin_value: -1.0\nmax_value: 1.0\n")?;
        assert_eq!(spec, ActionSpec::continuous(-1.0, 1.0));
        Ok(())
    }

    #[test]
    fn test_unknown_kind_is_invalid_action_spec() {
        let err = ActionSpec::from_yaml_str("kind: multi_binary\nn: 3\n").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LwrlError>(),
            Some(LwrlError::InvalidActionSpec(_))
        ));
    }

    #[test]
    fn test_validate() {
        assert!(ActionSpec::discrete(0).validate().is_err());
        assert!(ActionSpec::continuous(1.0, -1.0).validate().is_err());
        let half_bounded = ActionSpec::Continuous {
            dim: 1,
            min_value: Some(0.0),
            max_value: None,
        };
        assert!(half_bounded.validate().is_err());
        for (lo, hi) in [(f32::NAN, 1.0), (-1.0, f32::NAN), (f32::NEG_INFINITY, 1.0)].iter() {
            let spec = ActionSpec::Continuous {
                dim: 1,
                min_value: Some(*lo),
                max_value: Some(*hi),
            };
            let err = spec.validate().unwrap_err();
            assert!(matches!(
                err.downcast_ref::<LwrlError>(),
                Some(LwrlError::InvalidActionSpec(_))
            ));
        }
        assert!(ActionSpec::continuous(-2.0, 2.0).validate().is_ok());
    }

    #[test]
    fn test_check_and_clamp() {
        let spec = ActionSpec::discrete(3);
        assert!(spec.check(&Action::Discrete(2)).is_ok());
        assert!(spec.check(&Action::Discrete(3)).is_err());
        assert!(spec.check(&Action::Continuous(vec![0.0])).is_err());

        let spec = ActionSpec::continuous(-1.0, 1.0);
        assert!(spec.check(&Action::Continuous(vec![0.3, 0.2])).is_err());
        assert_eq!(
            spec.clamp(Action::Continuous(vec![1.5])),
            Action::Continuous(vec![1.0])
        );
        assert_eq!(
            spec.clamp(Action::Continuous(vec![-3.0])),
            Action::Continuous(vec![-1.0])
        );
    }

    #[test]
    fn test_shape_mismatch() {
        let spec = StateSpec::new(vec![4]);
        assert!(spec.check_shape(&[4]).is_ok());
        let err = spec.check_shape(&[2, 2]).unwrap_err();
        match err.downcast_ref::<LwrlError>() {
            Some(LwrlError::ShapeMismatch { expected, actual }) => {
                assert_eq!(expected, &vec![4]);
                assert_eq!(actual, &vec![2, 2]);
            }
            _ => panic!("unexpected error: {:?}", err),
        }
    }
}
