//! Clips negative values to zero: `y = max(0, x)`.
//!
//! Convolution and Linear layers apply the same function themselves when configured
//! to; this standalone layer is for networks that need it between other layers.
use co::prelude::*;
use conn::Relu;
use error::Error;
use layer::*;

#[derive(Debug, Clone)]
#[allow(missing_copy_implementations)]
/// ReLU Activation Layer
pub struct ReLU;

impl ILayer for ReLU {
    fn calculate_output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>, Error> {
        Ok(input_shape.to_vec())
    }
}

impl ComputeOutput<f32, Backend<Native>> for ReLU {
    fn compute_output(&self,
                      backend: &Backend<Native>,
                      _weights: &[&SharedTensor<f32>],
                      input_data: &[&SharedTensor<f32>],
                      output_data: &mut [&mut SharedTensor<f32>]) -> Result<(), Error> {
        backend.relu_plain(input_data[0], output_data[0])?;
        Ok(())
    }
}
