//! Decodes word vectors back into images.
//!
//! Two fully connected layers: `L1` with `H * W * 3 / 2` units and ReLU, `L2` with
//! `H * W * 3` units and no activation, reshaped to `[batch, H, W, 3]`.
use std::rc::Rc;
use co::prelude::*;
use error::Error;
use layer::*;
use layers::*;
use weight::ParameterStore;

#[derive(Debug, Copy, Clone)]
/// Specifies the parameters of a reverse model.
pub struct ReverseConfig {
    /// The size of the input word vectors.
    pub word2vec_size: usize,
    /// Width and height of the produced images.
    pub image_size: usize,
}

impl Default for ReverseConfig {
    fn default() -> ReverseConfig {
        ReverseConfig {
            word2vec_size: 200,
            image_size: 24,
        }
    }
}

#[derive(Debug)]
/// Reverse (word vector to image) model
pub struct ReverseModel {
    network: Sequential,
}

impl ReverseModel {
    /// Describes the layers of the reverse model.
    pub fn config(config: &ReverseConfig) -> SequentialConfig {
        let image_values = config.image_size * config.image_size * 3;
        let mut cfg = SequentialConfig::default();
        cfg.add_input(&[1, config.word2vec_size]);
        cfg.add_layer(LayerConfig::new("L1", LinearConfig::new(image_values / 2)));
        cfg.add_layer(LayerConfig::new("L2", LinearConfig::logits(image_values)));
        cfg.add_layer(LayerConfig::new("image", ReshapeConfig::of_shape(&[config.image_size, config.image_size, 3])));
        cfg
    }

    /// Builds the reverse model on the weights of `store`.
    pub fn new(backend: Rc<Backend<Native>>, store: &mut ParameterStore, config: &ReverseConfig) -> Result<ReverseModel, Error> {
        Ok(ReverseModel {
            network: Sequential::from_config(backend, &Self::config(config), store)?,
        })
    }

    /// Reconstructs images from a batch of word vectors, shaped `[batch, H, W, 3]`.
    pub fn reconstruct(&self, word_vectors: &SharedTensor<f32>) -> Result<SharedTensor<f32>, Error> {
        self.network.forward(word_vectors)
    }

    /// The underlying layers.
    pub fn network(&self) -> &Sequential {
        &self.network
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;
    use util::{host_tensor_from, native_backend};
    use weight::ParameterStore;
    use super::{ReverseConfig, ReverseModel};

    #[test]
    fn reconstructs_images_of_configured_size() {
        let mut store = ParameterStore::new();
        let config = ReverseConfig { word2vec_size: 4, image_size: 2 };
        let model = ReverseModel::new(Rc::new(native_backend()), &mut store, &config).unwrap();
        assert_eq!(Some(vec![6, 4]), store.shape("L1/weights"));
        assert_eq!(Some(vec![12, 6]), store.shape("L2/weights"));

        let words = host_tensor_from(&[3, 4], &[0.5f32; 12]).unwrap();
        let images = model.reconstruct(&words).unwrap();
        assert_eq!(&vec![3, 2, 2, 3], images.desc());
    }
}
