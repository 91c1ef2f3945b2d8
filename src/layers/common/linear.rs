//! Applies a linear transformation to the input data `y = a * x + b`
//!
//! The variables are:
//!
//! - `y`: output value
//! - `a`: weight (a trainable weight in a neural network)
//! - `x`: input value
//! - `b`: bias (optional)
//!
//! The output can optionally be passed through a ReLU.
//!
//! ## Input
//!
//! **The first dimension is treated as batch size** (`N`). All remaining dimensions
//! are flattened into one input vector per sample, and the transformation is applied
//! to every vector using the same weights and biases.
//!
//! In the context of convolutional neural networks this layer is also
//! called a "fully-connected layer" if it is used at the end of the network.
use co::prelude::*;
use coblas::transpose::Transpose;
use coblas::plugin::*;
use conn::Relu;
use error::Error;
use layer::*;
use util::{host_tensor, host_tensor_from, native_scalar, reshaped_copy};
use weight::{FillerType, WeightConfig};

#[derive(Debug)]
/// Linear Layer
pub struct Linear {
    output_size: usize,
    use_bias: bool,
    relu: bool,

    one: SharedTensor<f32>,
    zero: SharedTensor<f32>,
}

impl Linear {
    /// Create a Linear layer from a LinearConfig.
    pub fn from_config(config: &LinearConfig) -> Linear {
        let one = native_scalar(1f32);
        let zero = native_scalar(0f32);

        Linear {
            output_size: config.output_size,
            use_bias: config.use_bias,
            relu: config.relu,

            one: one,
            zero: zero,
        }
    }

    // Calculates the input size by skipping the batch size.
    fn calculate_input_size(input_shape: &[usize]) -> usize {
        input_shape.iter().skip(1).fold(1, |prod, i| prod * i)
    }

    fn calculate_weight_shape(&self, input_shape: &[usize]) -> Vec<usize> {
        let m = Self::calculate_input_size(input_shape);
        vec![self.output_size, m]
    }
}

impl ILayer for Linear {
    fn weights(&self, input_shape: &[usize]) -> Vec<(WeightConfig, Vec<usize>)> {
        let weights_filler = FillerType::Glorot {
            input_size: Self::calculate_input_size(input_shape),
            output_size: self.output_size,
        };
        let mut weights = vec![(WeightConfig::new("weights", weights_filler), self.calculate_weight_shape(input_shape))];
        if self.use_bias {
            let biases_filler = FillerType::Glorot {
                input_size: self.output_size,
                output_size: self.output_size,
            };
            weights.push((WeightConfig::new("biases", biases_filler), vec![self.output_size]));
        }
        weights
    }

    fn calculate_output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>, Error> {
        if input_shape.len() < 2 {
            return Err(Error::InvalidConfig(format!("Linear expects a batch of inputs, got shape {:?}", input_shape)));
        }
        let n = input_shape[0]; // batch size
        Ok(vec![n, self.output_size])
    }
}

impl ComputeOutput<f32, Backend<Native>> for Linear {
    fn compute_output(&self,
                      backend: &Backend<Native>,
                      weights: &[&SharedTensor<f32>],
                      input_data: &[&SharedTensor<f32>],
                      output_data: &mut [&mut SharedTensor<f32>]) -> Result<(), Error> {
        let batch_size = input_data[0].desc()[0];
        let mut pre_activation = host_tensor(&[batch_size, self.output_size])?;
        backend.gemm_plain(&self.one, Transpose::NoTrans, input_data[0], Transpose::Trans, weights[0], &self.zero, &mut pre_activation)?;
        if self.use_bias {
            let bias_multiplier = host_tensor_from(&[batch_size, 1], &vec![1f32; batch_size])?;
            let bias_data = reshaped_copy(weights[1], &[1, self.output_size])?;
            backend.gemm_plain(&self.one, Transpose::NoTrans, &bias_multiplier, Transpose::NoTrans, &bias_data, &self.one, &mut pre_activation)?;
        }

        if self.relu {
            backend.relu_plain(&pre_activation, output_data[0])?;
        } else {
            backend.copy_plain(&pre_activation, output_data[0])?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
#[allow(missing_copy_implementations)]
/// Specifies configuration parameters for a Linear Layer.
pub struct LinearConfig {
    /// The number of output values
    pub output_size: usize,
    /// Add a trainable bias to every output value.
    ///
    /// Defaults to `true`
    pub use_bias: bool,
    /// Pass the output through a ReLU.
    ///
    /// Defaults to `true`
    pub relu: bool,
}

impl LinearConfig {
    /// Creates a config for a biased, ReLU activated layer.
    pub fn new(output_size: usize) -> LinearConfig {
        LinearConfig {
            output_size: output_size,
            use_bias: true,
            relu: true,
        }
    }

    /// Creates a config for a biased layer without activation.
    pub fn logits(output_size: usize) -> LinearConfig {
        LinearConfig {
            relu: false,
            ..LinearConfig::new(output_size)
        }
    }
}

impl Into<LayerType> for LinearConfig {
    fn into(self) -> LayerType {
        LayerType::Linear(self)
    }
}
