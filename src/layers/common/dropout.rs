//! Randomly zeroes values of the input during training.
//!
//! In [Phase::Train][train] every value is kept with probability `keep_prob` and scaled
//! by `1 / keep_prob`, so the expected sum stays the same. All other values are set to
//! zero. In [Phase::Test][test] the layer passes its input through unchanged.
//!
//! [train]: ../../../layer/enum.Phase.html
//! [test]: ../../../layer/enum.Phase.html
use co::prelude::*;
use rand::{self, Rng};
use error::Error;
use layer::*;
use util::{host_data, host_data_mut};

#[derive(Debug, Clone)]
/// Dropout Layer
pub struct Dropout {
    keep_prob: f32,
    phase: Phase,
}

impl Dropout {
    /// Create a Dropout layer from a DropoutConfig.
    pub fn from_config(config: &DropoutConfig) -> Dropout {
        Dropout {
            keep_prob: config.keep_prob,
            phase: config.phase,
        }
    }
}

impl ILayer for Dropout {
    fn calculate_output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>, Error> {
        if !(self.keep_prob > 0f32 && self.keep_prob <= 1f32) {
            return Err(Error::InvalidConfig(format!("keep probability {} is not in (0, 1]", self.keep_prob)));
        }
        Ok(input_shape.to_vec())
    }
}

impl ComputeOutput<f32, Backend<Native>> for Dropout {
    fn compute_output(&self,
                      _backend: &Backend<Native>,
                      _weights: &[&SharedTensor<f32>],
                      input_data: &[&SharedTensor<f32>],
                      output_data: &mut [&mut SharedTensor<f32>]) -> Result<(), Error> {
        let input = host_data(input_data[0])?;
        let output = host_data_mut(output_data[0])?;
        match self.phase {
            Phase::Test => output.copy_from_slice(input),
            Phase::Train => {
                let mut rng = rand::thread_rng();
                let scale = 1f32 / self.keep_prob;
                for (y, x) in output.iter_mut().zip(input.iter()) {
                    *y = if rng.next_f32() < self.keep_prob { x * scale } else { 0f32 };
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Copy, Clone)]
/// Specifies configuration parameters for a Dropout Layer.
pub struct DropoutConfig {
    /// The probability to keep a value.
    pub keep_prob: f32,
    /// The phase the layer is built for.
    pub phase: Phase,
}

impl Into<LayerType> for DropoutConfig {
    fn into(self) -> LayerType {
        LayerType::Dropout(self)
    }
}

#[cfg(test)]
mod tests {
    use layer::{ComputeOutput, ILayer, Phase};
    use util::{host_data, host_tensor, host_tensor_from, native_backend};
    use super::{Dropout, DropoutConfig};

    fn run(phase: Phase, data: &[f32]) -> Vec<f32> {
        let layer = Dropout::from_config(&DropoutConfig { keep_prob: 0.5, phase: phase });
        let input = host_tensor_from(&[1, data.len()], data).unwrap();
        let mut output = host_tensor(&[1, data.len()]).unwrap();
        layer.compute_output(&native_backend(), &[], &[&input], &mut [&mut output]).unwrap();
        host_data(&output).unwrap().to_vec()
    }

    #[test]
    fn identity_in_test_phase() {
        let data = [1f32, -2f32, 3f32];
        assert_eq!(data.to_vec(), run(Phase::Test, &data));
    }

    #[test]
    fn zeroes_or_scales_in_train_phase() {
        let data = vec![1f32; 1000];
        let output = run(Phase::Train, &data);
        assert!(output.iter().all(|y| *y == 0f32 || *y == 2f32));
        let kept = output.iter().filter(|y| **y == 2f32).count();
        assert!(kept > 350 && kept < 650);
    }

    #[test]
    fn rejects_invalid_keep_probability() {
        let layer = Dropout::from_config(&DropoutConfig { keep_prob: 0f32, phase: Phase::Train });
        assert!(layer.calculate_output_shape(&[1, 2]).is_err());
    }
}
