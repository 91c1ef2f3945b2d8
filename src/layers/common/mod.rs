//! Provides common neural network layers.
//!
//! For now the layers in common should be described as layers that are typical
//! layers for building neural networks but are not activation layers.
pub use self::convolution::{Convolution, ConvolutionConfig};
pub use self::dropout::{Dropout, DropoutConfig};
pub use self::linear::{Linear, LinearConfig};
pub use self::lrn::{LRN, LRNConfig};
pub use self::pooling::{Pooling, PoolingConfig, PoolingMode};
pub use self::sequential::{Sequential, SequentialConfig};

use error::Error;

pub mod convolution;
pub mod dropout;
pub mod linear;
pub mod lrn;
pub mod pooling;
pub mod sequential;

#[derive(Debug, Copy, Clone, PartialEq)]
/// How the borders of the input are treated by a sliding window.
pub enum Padding {
    /// The input is implicitly padded so that the output has `ceil(input / stride)`
    /// elements along every spatial axis.
    ///
    /// The padding is distributed evenly, an odd remainder goes to the bottom/right.
    Same,
    /// No padding. Only windows that lie completely inside the input are used.
    Valid,
}

impl Padding {
    /// Calculates the output size and the implicit padding in front of the input
    /// for one spatial axis.
    pub fn output_size_and_offset(&self, input: usize, filter: usize, stride: usize) -> Result<(usize, usize), Error> {
        if filter == 0 || stride == 0 {
            return Err(Error::InvalidConfig(format!("filter ({}) and stride ({}) have to be positive", filter, stride)));
        }
        match *self {
            Padding::Same => {
                let output = (input + stride - 1) / stride;
                let needed = (output.saturating_sub(1) * stride + filter).saturating_sub(input);
                Ok((output, needed / 2))
            }
            Padding::Valid => {
                if input < filter {
                    return Err(Error::InvalidConfig(format!("filter of size {} does not fit into input of size {}", filter, input)));
                }
                Ok(((input - filter) / stride + 1, 0))
            }
        }
    }
}

/// Geometry of a sliding window along one spatial axis.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WindowAxis {
    /// Size of the input along the axis.
    pub input: usize,
    /// Size of the output along the axis.
    pub output: usize,
    /// Size of the window.
    pub filter: usize,
    /// Step between two windows.
    pub stride: usize,
    /// Implicit padding in front of the input.
    pub offset: usize,
}

impl WindowAxis {
    /// Returns the input coordinates covered by window `out`, clipped to the input.
    pub fn range(&self, out: usize) -> (usize, usize) {
        let start = (out * self.stride) as isize - self.offset as isize;
        let end = start + self.filter as isize;
        let clip = |i: isize| if i < 0 { 0 } else if i as usize > self.input { self.input } else { i as usize };
        (clip(start), clip(end))
    }

    /// Returns the input coordinate of window `out` at filter tap `tap`, if it is inside the input.
    pub fn tap(&self, out: usize, tap: usize) -> Option<usize> {
        let position = (out * self.stride + tap) as isize - self.offset as isize;
        if position < 0 || position as usize >= self.input {
            None
        } else {
            Some(position as usize)
        }
    }
}

/// Provides common utilities for Layers that utilize a filter with stride and padding.
///
/// This is used by the Convolution and Pooling layers.
pub trait FilterLayer {
    /// Returns the filter shape as configured (one value or one per spatial dimension).
    fn filter_shape(&self) -> &[usize];

    /// Returns the stride as configured (one value or one per spatial dimension).
    fn stride(&self) -> &[usize];

    /// Returns the padding mode.
    fn padding(&self) -> Padding;

    /// Retrievs the spatial dimensions for the filter based on `self.filter_shape()`.
    ///
    /// A single value is used for both spatial dimensions.
    fn spatial_filter_dims(&self) -> Vec<usize> {
        expand_dims(self.filter_shape())
    }

    /// Retrievs the stride for the spatial dimensions based on `self.stride()`.
    fn stride_dims(&self) -> Vec<usize> {
        expand_dims(self.stride())
    }

    /// Calculates the window geometry along the height and width of an NCHW input.
    fn calculate_windows(&self, input_shape: &[usize]) -> Result<Vec<WindowAxis>, Error> {
        if input_shape.len() != 4 {
            return Err(Error::InvalidConfig(format!("expected NCHW input, got shape {:?}", input_shape)));
        }
        let filter = self.spatial_filter_dims();
        let stride = self.stride_dims();
        if filter.len() != 2 || stride.len() != 2 {
            return Err(Error::InvalidConfig(format!("filter {:?} and stride {:?} need one or two values", filter, stride)));
        }
        let mut windows = Vec::with_capacity(2);
        for axis in 0..2 {
            let input = input_shape[2 + axis];
            let (output, offset) = self.padding().output_size_and_offset(input, filter[axis], stride[axis])?;
            windows.push(WindowAxis {
                input: input,
                output: output,
                filter: filter[axis],
                stride: stride[axis],
                offset: offset,
            });
        }
        Ok(windows)
    }
}

/// Expands a setting to the two spatial dimensions of an NCHW input.
fn expand_dims(setting: &[usize]) -> Vec<usize> {
    match setting.len() {
        1 => vec![setting[0], setting[0]],
        _ => setting.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::Padding;

    #[test]
    fn same_padding_rounds_up() {
        assert_eq!((12, 0), Padding::Same.output_size_and_offset(24, 3, 2).unwrap());
        assert_eq!((24, 1), Padding::Same.output_size_and_offset(24, 3, 1).unwrap());
        assert_eq!((3, 0), Padding::Same.output_size_and_offset(5, 2, 2).unwrap());
    }

    #[test]
    fn valid_padding_drops_partial_windows() {
        assert_eq!((20, 0), Padding::Valid.output_size_and_offset(24, 5, 1).unwrap());
        assert_eq!((9, 0), Padding::Valid.output_size_and_offset(20, 3, 2).unwrap());
        assert!(Padding::Valid.output_size_and_offset(2, 3, 1).is_err());
    }
}
