//! VGG networks: blocks of 3x3 convolutions, each block followed by a 2x2 max pooling.
//!
//! All convolutions use SAME padding and normalize their output with LRN before the
//! ReLU. The convolution stack is followed by two fully connected layers of 4096 units
//! and the logits layer.
//!
//! | variant | convolution blocks                        |
//! |---------|-------------------------------------------|
//! | VGG11   | 64, 128, 256x2, 512x2, 512x2              |
//! | VGG19   | 64x2, 128x2, 256x4, 512x4                 |
use std::rc::Rc;
use co::prelude::*;
use error::Error;
use layer::*;
use layers::*;
use weight::ParameterStore;
use super::{image_input_shape, FeatureExtractor};

const FEATURE_LAYER: &'static str = "fc7";
const FEATURE_SIZE: usize = 4096;

#[derive(Debug, Copy, Clone, PartialEq)]
/// The supported depths of VGG.
pub enum VggVariant {
    /// 8 convolutions in 5 blocks.
    Vgg11,
    /// 16 convolutions in 4 blocks.
    Vgg19,
}

impl VggVariant {
    /// Returns the number of filters of every convolution, grouped by block.
    pub fn blocks(&self) -> Vec<Vec<usize>> {
        match *self {
            VggVariant::Vgg11 => vec![vec![64], vec![128], vec![256; 2], vec![512; 2], vec![512; 2]],
            VggVariant::Vgg19 => vec![vec![64; 2], vec![128; 2], vec![256; 4], vec![512; 4]],
        }
    }
}

#[derive(Debug, Copy, Clone)]
/// Specifies the parameters of a VGG network.
pub struct VggConfig {
    /// The depth of the network.
    pub variant: VggVariant,
    /// The number of classes the logits are computed for.
    pub num_classes: usize,
    /// Width and height of the input images.
    pub image_size: usize,
    /// The probability to keep a value in the dropout after `fc6` and `fc7`.
    ///
    /// Defaults to `0.5`
    pub keep_prob: f32,
    /// The phase the network is built for. Dropout is only active in `Phase::Train`.
    ///
    /// Defaults to `Phase::Test`
    pub phase: Phase,
}

impl Default for VggConfig {
    fn default() -> VggConfig {
        VggConfig {
            variant: VggVariant::Vgg19,
            num_classes: 60,
            image_size: 24,
            keep_prob: 0.5,
            phase: Phase::Test,
        }
    }
}

#[derive(Debug)]
/// VGG topology
pub struct Vgg {
    network: Sequential,
    variant: VggVariant,
}

impl Vgg {
    /// Describes the layers of the configured VGG network.
    pub fn config(config: &VggConfig) -> SequentialConfig {
        let mut cfg = SequentialConfig::default();
        cfg.add_input(&image_input_shape(config.image_size));

        cfg.add_layer(LayerConfig::new("standardize", LayerType::Standardize));
        for (block, filters) in config.variant.blocks().iter().enumerate() {
            for (i, num_output) in filters.iter().enumerate() {
                let conv = ConvolutionConfig { batch_norm: true, ..ConvolutionConfig::new(*num_output, 3, 1, Padding::Same) };
                cfg.add_layer(LayerConfig::new(&format!("conv{}_{}", block + 1, i + 1), conv));
            }
            cfg.add_layer(LayerConfig::new(&format!("pool{}", block + 1), PoolingConfig::max(2, 2, Padding::Same)));
        }

        cfg.add_layer(LayerConfig::new("flatten", LayerType::Flatten));
        let dropout = DropoutConfig { keep_prob: config.keep_prob, phase: config.phase };
        cfg.add_layer(LayerConfig::new("fc6", LinearConfig::new(4096)));
        cfg.add_layer(LayerConfig::new("dropout6", dropout));
        cfg.add_layer(LayerConfig::new(FEATURE_LAYER, LinearConfig::new(FEATURE_SIZE)));
        cfg.add_layer(LayerConfig::new("dropout7", dropout));
        cfg.add_layer(LayerConfig::new("fc8", LinearConfig::logits(config.num_classes)));
        cfg
    }

    /// Builds a VGG network on the weights of `store`, creating the ones that do not exist yet.
    pub fn new(backend: Rc<Backend<Native>>, store: &mut ParameterStore, config: &VggConfig) -> Result<Vgg, Error> {
        info!("Creating {:?} for {} classes", config.variant, config.num_classes);
        let network = Sequential::from_config(backend, &Self::config(config), store)?;
        Ok(Vgg {
            network: network,
            variant: config.variant,
        })
    }

    /// Computes the unscaled class scores for a batch of images.
    pub fn logits(&self, images: &SharedTensor<f32>) -> Result<SharedTensor<f32>, Error> {
        self.network.forward(images)
    }

    /// The depth of the network.
    pub fn variant(&self) -> VggVariant {
        self.variant
    }

    /// The underlying layers.
    pub fn network(&self) -> &Sequential {
        &self.network
    }
}

impl FeatureExtractor for Vgg {
    fn features(&self, images: &SharedTensor<f32>) -> Result<SharedTensor<f32>, Error> {
        self.network.forward_to(images, FEATURE_LAYER)
    }

    fn feature_size(&self) -> usize {
        FEATURE_SIZE
    }

    fn feature_layer(&self) -> &str {
        FEATURE_LAYER
    }
}

#[cfg(test)]
mod tests {
    use layer::LayerType;
    use super::{Vgg, VggConfig, VggVariant};

    fn conv_names(config: &VggConfig) -> Vec<String> {
        Vgg::config(config).layers.iter()
            .filter(|layer| match layer.layer_type { LayerType::Convolution(_) => true, _ => false })
            .map(|layer| layer.name.clone())
            .collect()
    }

    #[test]
    fn vgg19_has_sixteen_convolutions() {
        let names = conv_names(&VggConfig::default());
        assert_eq!(16, names.len());
        assert_eq!("conv3_4", names[7]);
        assert_eq!("conv4_4", names[15]);
    }

    #[test]
    fn vgg11_has_eight_convolutions_in_five_blocks() {
        let config = VggConfig { variant: VggVariant::Vgg11, ..VggConfig::default() };
        assert_eq!(8, conv_names(&config).len());
        let pools = Vgg::config(&config).layers.iter().filter(|layer| layer.name.starts_with("pool")).count();
        assert_eq!(5, pools);
    }
}
