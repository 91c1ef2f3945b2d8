//! Standardizes every sample of the input independently.
//!
//! Each sample is shifted to zero mean and scaled to unit variance:
//! `y = (x - mean) / max(stddev, 1 / sqrt(num_elements))`.
//!
//! The lower bound of the divisor protects uniform samples, e.g. an all black image,
//! from a division by zero.
use co::prelude::*;
use error::Error;
use layer::*;
use util::{host_data, host_data_mut};

#[derive(Debug, Clone)]
#[allow(missing_copy_implementations)]
/// Per-sample Standardization Utility Layer
pub struct Standardize;

impl ILayer for Standardize {
    fn calculate_output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>, Error> {
        if input_shape.len() < 2 {
            return Err(Error::InvalidConfig(format!("Standardize expects a batch of samples, got shape {:?}", input_shape)));
        }
        Ok(input_shape.to_vec())
    }
}

impl ComputeOutput<f32, Backend<Native>> for Standardize {
    fn compute_output(&self,
                      _backend: &Backend<Native>,
                      _weights: &[&SharedTensor<f32>],
                      input_data: &[&SharedTensor<f32>],
                      output_data: &mut [&mut SharedTensor<f32>]) -> Result<(), Error> {
        let sample_size = input_data[0].desc().iter().skip(1).fold(1, |prod, i| prod * i);
        let input = host_data(input_data[0])?;
        let output = host_data_mut(output_data[0])?;
        if sample_size == 0 {
            return Ok(());
        }
        for (sample, standardized) in input.chunks(sample_size).zip(output.chunks_mut(sample_size)) {
            standardize(sample, standardized);
        }
        Ok(())
    }
}

/// Standardizes a single sample.
pub fn standardize(sample: &[f32], output: &mut [f32]) {
    let count = sample.len() as f64;
    let mean = sample.iter().fold(0f64, |sum, x| sum + *x as f64) / count;
    let variance = sample.iter().fold(0f64, |sum, x| sum + (*x as f64 - mean).powi(2)) / count;
    let adjusted_stddev = variance.sqrt().max(1f64 / count.sqrt());
    for (y, x) in output.iter_mut().zip(sample.iter()) {
        *y = ((*x as f64 - mean) / adjusted_stddev) as f32;
    }
}

#[cfg(test)]
mod tests {
    use super::standardize;

    #[test]
    fn uniform_sample_becomes_zero() {
        let mut output = [1f32; 4];
        standardize(&[3f32; 4], &mut output);
        assert_eq!([0f32; 4], output);
    }

    #[test]
    fn scales_to_unit_variance() {
        let mut output = [0f32; 2];
        standardize(&[1f32, 3f32], &mut output);
        assert_eq!([-1f32, 1f32], output);
    }
}
