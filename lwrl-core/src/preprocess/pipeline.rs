use super::{Preprocessor, PreprocessorConfig};
use anyhow::Result;
use ndarray::ArrayD;

/// Ordered sequence of preprocessing steps.
#[derive(Default)]
pub struct Pipeline {
    steps: Vec<Box<dyn Preprocessor>>,
}

impl Pipeline {
    /// Constructs a pipeline from steps, applied in the given order.
    pub fn new(steps: Vec<Box<dyn Preprocessor>>) -> Self {
        Self { steps }
    }

    /// Builds the named steps.
    pub fn build(configs: &[PreprocessorConfig]) -> Result<Self> {
        let steps = configs
            .iter()
            .map(|config| config.build())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { steps })
    }

    /// Appends a step.
    pub fn push(&mut self, step: Box<dyn Preprocessor>) {
        self.steps.push(step);
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if the pipeline has no step.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Applies the steps in order, updating stateful steps.
    pub fn process(&mut self, obs: ArrayD<f32>) -> Result<ArrayD<f32>> {
        self.steps
            .iter_mut()
            .try_fold(obs, |obs, step| step.process(obs))
    }

    /// Applies the steps in order without updating their state.
    pub fn transform(&self, obs: ArrayD<f32>) -> Result<ArrayD<f32>> {
        self.steps.iter().try_fold(obs, |obs, step| step.transform(obs))
    }

    /// Resets all steps.
    pub fn reset(&mut self) {
        self.steps.iter_mut().for_each(|step| step.reset());
    }

    /// Shape of the output given the shape of raw observations.
    pub fn output_shape(&self, input: &[usize]) -> Vec<usize> {
        self.steps
            .iter()
            .fold(input.to_vec(), |shape, step| step.output_shape(&shape))
    }
}
