//! Convolves the input tensor.
//!
//! Does this convolution with a set of learnable filters, each producing one
//! feature map in the output tensor. A bias per feature map is added, the result is
//! optionally normalized with [LRN][lrn] and passed through a ReLU.
//! [lrn]: ../lrn/index.html
//!
//! ## Groups
//!
//! With `groups > 1` the input channels and the filters are split into `groups` equal
//! parts. Every part of the filters only sees its part of the input channels and the
//! results are concatenated along the channel axis, as in AlexNet (Krizhevsky et al., 2012).
//!
//! ## Input Data
//!
//! The layer expects the input to be in 4D NCHW format.
use co::prelude::*;
use conn::Relu;
use error::Error;
use layer::*;
use util::{host_data, host_data_mut, host_tensor};
use weight::{FillerType, WeightConfig};
use super::{FilterLayer, Padding, WindowAxis};
use super::lrn::{self, LRNConfig};

#[derive(Debug, Clone)]
/// Convolution Layer
pub struct Convolution {
    num_output: usize,
    filter_shape: Vec<usize>,
    stride: Vec<usize>,
    padding: Padding,
    groups: usize,
    batch_norm: Option<LRNConfig>,
}

impl Convolution {
    /// Create a Convolution layer from a ConvolutionConfig.
    pub fn from_config(config: &ConvolutionConfig) -> Convolution {
        Convolution {
            num_output: config.num_output,

            filter_shape: config.filter_shape.clone(),
            stride: config.stride.clone(),
            padding: config.padding,
            groups: config.groups,

            batch_norm: if config.batch_norm { Some(LRNConfig::default()) } else { None },
        }
    }

    fn check_groups(&self, channels: usize) -> Result<(), Error> {
        if self.groups == 0 || channels % self.groups != 0 || self.num_output % self.groups != 0 {
            return Err(Error::InvalidConfig(format!("{} groups do not evenly divide {} input channels and {} filters",
                                                    self.groups, channels, self.num_output)));
        }
        Ok(())
    }

    fn calculate_filter_shape(&self, input_shape: &[usize]) -> Vec<usize> {
        let spatial_dims = self.spatial_filter_dims();
        let filter_n = self.num_output; // number of output feature maps
        let filter_c = input_shape[1] / self.groups; // number of input feature maps per group
        let filter_h = spatial_dims[0];
        let filter_w = spatial_dims[1];

        vec![filter_n, filter_c, filter_h, filter_w]
    }
}

impl FilterLayer for Convolution {
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

impl ILayer for Convolution {
    fn weights(&self, input_shape: &[usize]) -> Vec<(WeightConfig, Vec<usize>)> {
        let filter_shape = self.calculate_filter_shape(input_shape);
        let receptive_field = filter_shape[2] * filter_shape[3];
        let weights_filler = FillerType::Glorot {
            input_size: filter_shape[1] * receptive_field,
            output_size: filter_shape[0] * receptive_field,
        };
        let biases_filler = FillerType::Glorot {
            input_size: self.num_output,
            output_size: self.num_output,
        };
        vec![(WeightConfig::new("weights", weights_filler), filter_shape),
             (WeightConfig::new("biases", biases_filler), vec![self.num_output])]
    }

    fn calculate_output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>, Error> {
        let windows = self.calculate_windows(input_shape)?;
        self.check_groups(input_shape[1])?;
        Ok(vec![input_shape[0], self.num_output, windows[0].output, windows[1].output])
    }
}

impl ComputeOutput<f32, Backend<Native>> for Convolution {
    fn compute_output(&self,
                      backend: &Backend<Native>,
                      weights: &[&SharedTensor<f32>],
                      input_data: &[&SharedTensor<f32>],
                      output_data: &mut [&mut SharedTensor<f32>]) -> Result<(), Error> {
        let input_shape = input_data[0].desc().clone();
        let windows = self.calculate_windows(&input_shape)?;
        let output_shape = output_data[0].desc().clone();

        let mut pre_activation = host_tensor(&output_shape)?;
        {
            let filter = host_data(weights[0])?;
            let biases = host_data(weights[1])?;
            let output = host_data_mut(&mut pre_activation)?;
            convolve(host_data(input_data[0])?, &input_shape, filter, &weights[0].desc().clone(),
                     self.groups, &windows[0], &windows[1], output);
            add_channel_bias(output, &output_shape, biases);
            if let Some(ref lrn_config) = self.batch_norm {
                let convolved = output.to_vec();
                lrn::normalize(lrn_config, &output_shape, &convolved, output);
            }
        }
        backend.relu_plain(&pre_activation, output_data[0])?;
        Ok(())
    }
}

/// Grouped 2D convolution of an NCHW `input` with `[K, C / groups, kh, kw]` filters.
pub fn convolve(input: &[f32],
                input_shape: &[usize],
                filter: &[f32],
                filter_shape: &[usize],
                groups: usize,
                rows: &WindowAxis,
                cols: &WindowAxis,
                output: &mut [f32]) {
    let (batch, channels, height, width) = (input_shape[0], input_shape[1], input_shape[2], input_shape[3]);
    let (num_output, group_channels, kh, kw) = (filter_shape[0], filter_shape[1], filter_shape[2], filter_shape[3]);
    let outputs_per_group = num_output / groups;
    for n in 0..batch {
        for k in 0..num_output {
            let first_channel = (k / outputs_per_group) * group_channels;
            for oy in 0..rows.output {
                for ox in 0..cols.output {
                    let mut sum = 0f32;
                    for ci in 0..group_channels {
                        let input_plane = (n * channels + first_channel + ci) * height;
                        let filter_plane = (k * group_channels + ci) * kh;
                        for fy in 0..kh {
                            let iy = match rows.tap(oy, fy) {
                                Some(iy) => iy,
                                None => continue,
                            };
                            for fx in 0..kw {
                                if let Some(ix) = cols.tap(ox, fx) {
                                    sum += input[(input_plane + iy) * width + ix] * filter[(filter_plane + fy) * kw + fx];
                                }
                            }
                        }
                    }
                    output[((n * num_output + k) * rows.output + oy) * cols.output + ox] = sum;
                }
            }
        }
    }
}

/// Adds one bias per channel to an NCHW tensor.
fn add_channel_bias(data: &mut [f32], shape: &[usize], biases: &[f32]) {
    let plane = shape[2] * shape[3];
    for (i, value) in data.iter_mut().enumerate() {
        *value += biases[(i / plane) % shape[1]];
    }
}

#[derive(Debug, Clone)]
/// Specifies configuration parameters for a Convolution Layer.
pub struct ConvolutionConfig {
    /// The number of output feature maps
    pub num_output: usize,
    /// The size of the kernel
    pub filter_shape: Vec<usize>,
    /// The stride size
    pub stride: Vec<usize>,
    /// The padding mode
    pub padding: Padding,
    /// The number of groups the channels are split into.
    ///
    /// Defaults to `1`
    pub groups: usize,
    /// Apply local response normalization before the activation.
    ///
    /// Defaults to `false`
    pub batch_norm: bool,
}

impl ConvolutionConfig {
    /// Creates a config for a square filter without groups or normalization.
    pub fn new(num_output: usize, filter_size: usize, stride: usize, padding: Padding) -> ConvolutionConfig {
        ConvolutionConfig {
            num_output: num_output,
            filter_shape: vec![filter_size],
            stride: vec![stride],
            padding: padding,
            groups: 1,
            batch_norm: false,
        }
    }
}

impl Into<LayerType> for ConvolutionConfig {
    fn into(self) -> LayerType {
        LayerType::Convolution(self)
    }
}

#[cfg(test)]
mod tests {
    use super::{Convolution, ConvolutionConfig};
    use super::super::{FilterLayer, Padding};
    use layer::ILayer;

    #[test]
    fn correct_shapes() {
        let cfg = ConvolutionConfig::new(64, 5, 1, Padding::Valid);
        let layer = Convolution::from_config(&cfg);
        assert_eq!(vec![5, 5], layer.spatial_filter_dims());
        assert_eq!(vec![1, 1], layer.stride_dims());
        assert_eq!(vec![64, 3, 5, 5], layer.calculate_filter_shape(&[1, 3, 24, 24]));
        assert_eq!(vec![1, 64, 20, 20], layer.calculate_output_shape(&[1, 3, 24, 24]).unwrap());
    }

    #[test]
    fn grouped_filters_see_a_part_of_the_channels() {
        let cfg = ConvolutionConfig { groups: 2, ..ConvolutionConfig::new(64, 5, 1, Padding::Same) };
        let layer = Convolution::from_config(&cfg);
        assert_eq!(vec![64, 32, 5, 5], layer.calculate_filter_shape(&[1, 64, 9, 9]));
        assert_eq!(vec![1, 64, 9, 9], layer.calculate_output_shape(&[1, 64, 9, 9]).unwrap());
    }

    #[test]
    fn rejects_groups_not_dividing_channels() {
        let cfg = ConvolutionConfig { groups: 2, ..ConvolutionConfig::new(4, 3, 1, Padding::Same) };
        let layer = Convolution::from_config(&cfg);
        assert!(layer.calculate_output_shape(&[1, 3, 8, 8]).is_err());
    }
}
