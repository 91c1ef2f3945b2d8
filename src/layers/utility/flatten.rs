//! Flattens the input into one vector per sample.
//!
//! Input of shape n * c * h * w becomes
//! a simple vector output of shape n * (c*h*w).
use co::prelude::*;
use error::Error;
use layer::*;
use util::{host_data, host_data_mut};

#[derive(Debug, Clone)]
#[allow(missing_copy_implementations)]
/// Flattening Utility Layer
pub struct Flatten;

impl ILayer for Flatten {
    fn calculate_output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>, Error> {
        match input_shape.first() {
            Some(batch_size) => Ok(vec![*batch_size, input_shape.iter().skip(1).fold(1, |prod, i| prod * i)]),
            None => Err(Error::InvalidConfig("cannot flatten a scalar".to_owned())),
        }
    }
}

impl ComputeOutput<f32, Backend<Native>> for Flatten {
    fn compute_output(&self,
                      _backend: &Backend<Native>,
                      _weights: &[&SharedTensor<f32>],
                      input_data: &[&SharedTensor<f32>],
                      output_data: &mut [&mut SharedTensor<f32>]) -> Result<(), Error> {
        host_data_mut(output_data[0])?.copy_from_slice(host_data(input_data[0])?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use layer::ILayer;
    use super::Flatten;

    #[test]
    fn keeps_batch_dimension() {
        assert_eq!(vec![2, 1024], Flatten.calculate_output_shape(&[2, 64, 4, 4]).unwrap());
    }
}
