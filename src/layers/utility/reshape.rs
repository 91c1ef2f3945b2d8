//! Gives every sample of a batch a new shape.
//!
//! The batch dimension is kept; the configured shape describes a single sample and
//! has to hold the same number of values as a sample of the input. The values are
//! copied in order, so `[N, H * W * 3]` becomes `[N, H, W, 3]` without moving data
//! between samples.
use co::prelude::*;
use error::Error;
use layer::*;
use util::{host_data, host_data_mut};

#[derive(Debug, Clone)]
/// Reshape Utility Layer
pub struct Reshape {
    shape: Vec<usize>,
}

impl Reshape {
    /// Create a Reshape layer from a ReshapeConfig.
    pub fn from_config(config: &ReshapeConfig) -> Reshape {
        Reshape {
            shape: config.shape.clone(),
        }
    }
}

impl ILayer for Reshape {
    fn calculate_output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>, Error> {
        let sample_size = input_shape.iter().skip(1).fold(1, |prod, i| prod * i);
        let target_size = self.shape.iter().fold(1, |prod, i| prod * i);
        if input_shape.is_empty() || sample_size != target_size {
            return Err(Error::InvalidConfig(format!("cannot reshape samples of {:?} into {:?}", input_shape, self.shape)));
        }
        let mut output_shape = vec![input_shape[0]];
        output_shape.extend_from_slice(&self.shape);
        Ok(output_shape)
    }
}

impl ComputeOutput<f32, Backend<Native>> for Reshape {
    fn compute_output(&self,
                      _backend: &Backend<Native>,
                      _weights: &[&SharedTensor<f32>],
                      input_data: &[&SharedTensor<f32>],
                      output_data: &mut [&mut SharedTensor<f32>]) -> Result<(), Error> {
        host_data_mut(output_data[0])?.copy_from_slice(host_data(input_data[0])?);
        Ok(())
    }
}

#[derive(Debug, Clone)]
/// Specifies configuration parameters for a Reshape Layer.
pub struct ReshapeConfig {
    /// The target shape that every sample of the input should assume.
    pub shape: Vec<usize>,
}

impl ReshapeConfig {
    /// Create a ReshapeConfig that describes a Reshape layer with a provided shape.
    pub fn of_shape(shape: &[usize]) -> ReshapeConfig {
        ReshapeConfig {
            shape: shape.to_owned()
        }
    }
}

impl Into<LayerType> for ReshapeConfig {
    fn into(self) -> LayerType {
        LayerType::Reshape(self)
    }
}

#[cfg(test)]
mod tests {
    use layer::ILayer;
    use super::{Reshape, ReshapeConfig};

    #[test]
    fn keeps_batch_dimension() {
        let layer = Reshape::from_config(&ReshapeConfig::of_shape(&[4, 4, 3]));
        assert_eq!(vec![5, 4, 4, 3], layer.calculate_output_shape(&[5, 48]).unwrap());
        assert!(layer.calculate_output_shape(&[5, 47]).is_err());
    }
}
