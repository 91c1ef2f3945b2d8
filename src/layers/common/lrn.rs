//! Applies local response normalization across channels.
//!
//! Every value is divided by a power of the sum of squares of the values at the same
//! spatial position in the neighbouring channels:
//!
//! `y[c] = x[c] / (bias + alpha * sum(x[c - r ..= c + r]^2))^beta`
//!
//! ## Input Data
//!
//! The layer expects the input to be in 4D NCHW format.
use co::prelude::*;
use error::Error;
use layer::*;
use util::{host_data, host_data_mut};

#[derive(Debug, Clone)]
/// [Local Response Normalization](./index.html) Layer
pub struct LRN {
    config: LRNConfig,
}

impl LRN {
    /// Create a LRN layer from a LRNConfig.
    pub fn from_config(config: &LRNConfig) -> LRN {
        LRN { config: config.clone() }
    }
}

impl ILayer for LRN {
    fn calculate_output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>, Error> {
        if input_shape.len() != 4 {
            return Err(Error::InvalidConfig(format!("LRN expects NCHW input, got shape {:?}", input_shape)));
        }
        Ok(input_shape.to_vec())
    }
}

impl ComputeOutput<f32, Backend<Native>> for LRN {
    fn compute_output(&self,
                      _backend: &Backend<Native>,
                      _weights: &[&SharedTensor<f32>],
                      input_data: &[&SharedTensor<f32>],
                      output_data: &mut [&mut SharedTensor<f32>]) -> Result<(), Error> {
        let shape = input_data[0].desc().clone();
        let input = host_data(input_data[0])?;
        normalize(&self.config, &shape, input, host_data_mut(output_data[0])?);
        Ok(())
    }
}

/// Normalizes the NCHW `input` of `shape` into `output`.
pub fn normalize(config: &LRNConfig, shape: &[usize], input: &[f32], output: &mut [f32]) {
    let (channels, plane) = (shape[1], shape[2] * shape[3]);
    let radius = config.depth_radius;
    for image in 0..shape[0] {
        let base = image * channels * plane;
        for c in 0..channels {
            let first = c.saturating_sub(radius);
            let last = ::std::cmp::min(channels - 1, c + radius);
            for p in 0..plane {
                let mut sqr_sum = 0f32;
                for neighbour in first..(last + 1) {
                    let value = input[base + neighbour * plane + p];
                    sqr_sum += value * value;
                }
                let index = base + c * plane + p;
                output[index] = input[index] / (config.bias + config.alpha * sqr_sum).powf(config.beta);
            }
        }
    }
}

#[derive(Debug, Copy, Clone)]
/// Specifies configuration parameters for a LRN Layer.
pub struct LRNConfig {
    /// Number of channels on each side of a channel that take part in its normalization.
    pub depth_radius: usize,
    /// Offset added to the weighted sum of squares.
    pub bias: f32,
    /// Scale of the sum of squares.
    pub alpha: f32,
    /// Exponent of the normalization.
    pub beta: f32,
}

impl Default for LRNConfig {
    /// The normalization used by the AlexNet and VGG topologies.
    fn default() -> LRNConfig {
        LRNConfig {
            depth_radius: 2,
            bias: 1.0,
            alpha: 2e-5,
            beta: 0.75,
        }
    }
}

impl Into<LayerType> for LRNConfig {
    fn into(self) -> LayerType {
        LayerType::LRN(self)
    }
}
