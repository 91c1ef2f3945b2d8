//! Applies pooling to the input.
//!
//! This layers looks at adjectant values of the input and then computes a
//! simple pooling operation over them (e.g. taking their maximum or average value).
//! *See [PoolingMode][pooling_mode]*
//!
//! [pooling_mode]: ./enum.PoolingMode.html
//!
//! Windows that reach into the implicit padding of [Padding::Same][same] only pool
//! over the values that are inside the input.
//! [same]: ../enum.Padding.html
//!
//! ## Input Data
//!
//! The layer expects the input to be in 4D NCHW format.
use co::prelude::*;
use error::Error;
use layer::*;
use util::{host_data, host_data_mut};
use super::{FilterLayer, Padding, WindowAxis};

#[derive(Debug, Clone)]
/// [Pooling](./index.html) Layer
pub struct Pooling {
    mode: PoolingMode,

    filter_shape: Vec<usize>,
    stride: Vec<usize>,
    padding: Padding,
}

impl Pooling {
    /// Create a Pooling layer from a PoolingConfig.
    pub fn from_config(config: &PoolingConfig) -> Pooling {
        Pooling {
            mode: config.mode,

            filter_shape: config.filter_shape.clone(),
            stride: config.stride.clone(),
            padding: config.padding,
        }
    }
}

impl FilterLayer for Pooling {
    fn filter_shape(&self) -> &[usize] {
        &self.filter_shape
    }

    fn stride(&self) -> &[usize] {
        &self.stride
    }

    fn padding(&self) -> Padding {
        self.padding
    }
}

impl ILayer for Pooling {
    fn calculate_output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>, Error> {
        let windows = self.calculate_windows(input_shape)?;
        Ok(vec![input_shape[0], input_shape[1], windows[0].output, windows[1].output])
    }
}

impl ComputeOutput<f32, Backend<Native>> for Pooling {
    fn compute_output(&self,
                      _backend: &Backend<Native>,
                      _weights: &[&SharedTensor<f32>],
                      input_data: &[&SharedTensor<f32>],
                      output_data: &mut [&mut SharedTensor<f32>]) -> Result<(), Error> {
        let input_shape = input_data[0].desc().clone();
        let windows = self.calculate_windows(&input_shape)?;
        pool(self.mode, host_data(input_data[0])?, &input_shape, &windows[0], &windows[1],
             host_data_mut(output_data[0])?);
        Ok(())
    }
}

fn pool(mode: PoolingMode, input: &[f32], input_shape: &[usize], rows: &WindowAxis, cols: &WindowAxis, output: &mut [f32]) {
    let planes = input_shape[0] * input_shape[1];
    let (height, width) = (input_shape[2], input_shape[3]);
    for plane in 0..planes {
        let input_plane = &input[plane * height * width..(plane + 1) * height * width];
        for oy in 0..rows.output {
            let (y_start, y_end) = rows.range(oy);
            for ox in 0..cols.output {
                let (x_start, x_end) = cols.range(ox);
                let mut max = ::std::f32::NEG_INFINITY;
                let mut sum = 0f32;
                for y in y_start..y_end {
                    for value in &input_plane[y * width + x_start..y * width + x_end] {
                        max = max.max(*value);
                        sum += *value;
                    }
                }
                let count = (y_end - y_start) * (x_end - x_start);
                output[(plane * rows.output + oy) * cols.output + ox] = match mode {
                    PoolingMode::Max => max,
                    PoolingMode::Average => sum / count as f32,
                };
            }
        }
    }
}

#[derive(Debug, Clone)]
/// Specifies configuration parameters for a Pooling Layer.
pub struct PoolingConfig {
    /// The PoolingMode to use
    pub mode: PoolingMode,
    /// The shape of the filter
    pub filter_shape: Vec<usize>,
    /// The stride size
    pub stride: Vec<usize>,
    /// The padding mode
    pub padding: Padding,
}

impl PoolingConfig {
    /// Creates a config for max pooling with a square window.
    pub fn max(filter_size: usize, stride: usize, padding: Padding) -> PoolingConfig {
        PoolingConfig {
            mode: PoolingMode::Max,
            filter_shape: vec![filter_size],
            stride: vec![stride],
            padding: padding,
        }
    }

    /// Creates a config for average pooling with a square window.
    pub fn average(filter_size: usize, stride: usize, padding: Padding) -> PoolingConfig {
        PoolingConfig {
            mode: PoolingMode::Average,
            ..PoolingConfig::max(filter_size, stride, padding)
        }
    }
}

impl Into<LayerType> for PoolingConfig {
    fn into(self) -> LayerType {
        LayerType::Pooling(self)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
/// The different modes of pooling that can be calculated.
pub enum PoolingMode {
    /// The maximum value inside the pooling window will be used as result.
    Max,
    /// The average of all values inside the pooling window will be used as result.
    Average,
}

#[cfg(test)]
mod tests {
    use layer::{ComputeOutput, ILayer};
    use util::{host_data, host_tensor, host_tensor_from, native_backend};
    use super::{Pooling, PoolingConfig};
    use super::super::Padding;

    fn run(config: &PoolingConfig, shape: &[usize], data: &[f32]) -> Vec<f32> {
        let layer = Pooling::from_config(config);
        let input = host_tensor_from(shape, data).unwrap();
        let mut output = host_tensor(&layer.calculate_output_shape(shape).unwrap()).unwrap();
        layer.compute_output(&native_backend(), &[], &[&input], &mut [&mut output]).unwrap();
        host_data(&output).unwrap().to_vec()
    }

    #[test]
    fn max_pooling_valid() {
        let data = (0..16).map(|i| i as f32).collect::<Vec<f32>>();
        assert_eq!(vec![10f32, 11f32, 14f32, 15f32], run(&PoolingConfig::max(3, 1, Padding::Valid), &[1, 1, 4, 4], &data));
    }

    #[test]
    fn average_pooling_same_ignores_padding() {
        // 3x3 input, 2x2 windows with stride 2 -> 2x2 output, last row/column are partial windows
        let data = [1f32, 2f32, 3f32,
                    4f32, 5f32, 6f32,
                    7f32, 8f32, 9f32];
        let output = run(&PoolingConfig::average(2, 2, Padding::Same), &[1, 1, 3, 3], &data);
        assert_eq!(vec![3f32, 4.5f32, 7.5f32, 9f32], output);
    }

    #[test]
    fn max_pooling_keeps_channels_apart() {
        let data = [1f32, 2f32, 3f32, 4f32, -1f32, -2f32, -3f32, -4f32];
        assert_eq!(vec![4f32, -1f32], run(&PoolingConfig::max(2, 2, Padding::Same), &[1, 2, 2, 2], &data));
    }
}
