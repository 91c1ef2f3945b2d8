//! Visual-semantic embedding model.
//!
//! An image backbone computes the penultimate features of every image and the `proj`
//! layer maps them linearly (with bias, without activation) into the word-vector space.
use std::rc::Rc;
use co::prelude::*;
use error::Error;
use layer::*;
use layers::*;
use weight::ParameterStore;
use super::{AlexNet, FeatureExtractor, Vgg, VggConfig, VggVariant};

/// Name of the projection layer.
pub const PROJECTION_LAYER: &'static str = "proj";

#[derive(Debug, Copy, Clone, PartialEq)]
/// The image backbones a composite model can be built on.
pub enum BackboneKind {
    /// AlexNet, features of `fc4` (192 values).
    AlexNet,
    /// VGG19, features of `fc7` (4096 values).
    Vgg19,
}

#[derive(Debug, Copy, Clone)]
/// Specifies the parameters of a composite model.
pub struct CompositeConfig {
    /// The image backbone.
    pub backbone: BackboneKind,
    /// The number of classes of the backbone's logits layer.
    pub num_classes: usize,
    /// The size of the word vectors the images are projected to.
    pub word2vec_size: usize,
    /// Width and height of the input images.
    pub image_size: usize,
}

impl Default for CompositeConfig {
    fn default() -> CompositeConfig {
        CompositeConfig {
            backbone: BackboneKind::AlexNet,
            num_classes: 60,
            word2vec_size: 200,
            image_size: 24,
        }
    }
}

#[derive(Debug)]
/// Composite visual-semantic model
pub struct CompositeModel {
    backbone: Box<dyn FeatureExtractor>,
    projection: Layer,
    config: CompositeConfig,
}

impl CompositeModel {
    /// Builds the backbone and the projection on the weights of `store`.
    pub fn new(backend: Rc<Backend<Native>>, store: &mut ParameterStore, config: &CompositeConfig) -> Result<CompositeModel, Error> {
        let backbone: Box<dyn FeatureExtractor> = match config.backbone {
            BackboneKind::AlexNet => Box::new(AlexNet::new(backend.clone(), store, config.num_classes, config.image_size)?),
            BackboneKind::Vgg19 => {
                let vgg_config = VggConfig {
                    variant: VggVariant::Vgg19,
                    num_classes: config.num_classes,
                    image_size: config.image_size,
                    ..VggConfig::default()
                };
                Box::new(Vgg::new(backend.clone(), store, &vgg_config)?)
            }
        };

        let mut projection = Layer::from_config(backend, &LayerConfig::new(PROJECTION_LAYER, LinearConfig::logits(config.word2vec_size)));
        projection.connect(&[1, backbone.feature_size()], store)?;
        info!("Composite model projects {} features of {} into {} dimensions",
              backbone.feature_size(), backbone.feature_layer(), config.word2vec_size);

        Ok(CompositeModel {
            backbone: backbone,
            projection: projection,
            config: *config,
        })
    }

    /// Embeds a batch of NCHW images into the word-vector space, shaped `[batch, word2vec_size]`.
    pub fn embed(&self, images: &SharedTensor<f32>) -> Result<SharedTensor<f32>, Error> {
        let features = self.backbone.features(images)?;
        self.projection.forward(&features)
    }

    /// The image backbone.
    pub fn backbone(&self) -> &dyn FeatureExtractor {
        &*self.backbone
    }

    /// The configuration the model was built with.
    pub fn config(&self) -> &CompositeConfig {
        &self.config
    }
}
