//! Provides the fixed network topologies built from the [layers][layers].
//! [layers]: ../layers/index.html
//!
//! All image models start by standardizing every image, followed by blocks of
//! convolution, normalization and pooling, a flattening step and a stack of fully
//! connected layers. The layer names are the scopes of their weights inside the
//! [ParameterStore][store], so a checkpoint written for one instance of a topology can
//! be restored into every other instance of it.
//!
//! [store]: ../weight/struct.ParameterStore.html
use std::fmt;
use co::prelude::*;
use error::Error;

pub use self::alexnet::{AlexNet, PretrainedWeights};
pub use self::composite::{BackboneKind, CompositeConfig, CompositeModel};
pub use self::reverse::{ReverseConfig, ReverseModel};
pub use self::vgg::{Vgg, VggConfig, VggVariant};

pub mod alexnet;
pub mod composite;
pub mod reverse;
pub mod vgg;

/// An image backbone that produces a feature vector of known size per image.
pub trait FeatureExtractor {
    /// Computes the features of a batch of NCHW images, shaped `[batch, feature_size]`.
    fn features(&self, images: &SharedTensor<f32>) -> Result<SharedTensor<f32>, Error>;

    /// The number of features per image.
    fn feature_size(&self) -> usize;

    /// The name of the layer the features are taken from.
    fn feature_layer(&self) -> &str;
}

impl fmt::Debug for dyn FeatureExtractor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "FeatureExtractor({}, {})", self.feature_layer(), self.feature_size())
    }
}

/// The shape of a single RGB image in NCHW layout, used to connect image models.
pub fn image_input_shape(image_size: usize) -> Vec<usize> {
    vec![1, 3, image_size, image_size]
}
