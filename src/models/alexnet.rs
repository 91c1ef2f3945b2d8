//! AlexNet for small (24x24) RGB images.
//!
//! ```text
//! standardize
//! conv1  5x5x64 VALID    -> norm1 -> pool1 3x3/2 VALID
//! conv2  5x5x64 SAME, 2 groups -> norm2 -> pool2 3x3/2 VALID
//! flatten
//! fc3    384
//! fc4    192    (features)
//! fc5    num_classes (logits)
//! ```
use std::path::Path;
use std::rc::Rc;
use co::prelude::*;
use capnp_util::*;
use error::Error;
use lamina_capnp::pretrained_weights as capnp_weights;
use layer::*;
use layers::*;
use weight::ParameterStore;
use super::{image_input_shape, FeatureExtractor};

const FEATURE_LAYER: &'static str = "fc4";
const FEATURE_SIZE: usize = 192;

#[derive(Debug)]
/// AlexNet topology
pub struct AlexNet {
    network: Sequential,
    num_classes: usize,
}

impl AlexNet {
    /// Describes the layers of AlexNet for images of `image_size` x `image_size` pixels.
    pub fn config(num_classes: usize, image_size: usize) -> SequentialConfig {
        let mut cfg = SequentialConfig::default();
        cfg.add_input(&image_input_shape(image_size));

        cfg.add_layer(LayerConfig::new("standardize", LayerType::Standardize));

        cfg.add_layer(LayerConfig::new("conv1", ConvolutionConfig::new(64, 5, 1, Padding::Valid)));
        cfg.add_layer(LayerConfig::new("norm1", LRNConfig::default()));
        cfg.add_layer(LayerConfig::new("pool1", PoolingConfig::max(3, 2, Padding::Valid)));

        let conv2 = ConvolutionConfig { groups: 2, ..ConvolutionConfig::new(64, 5, 1, Padding::Same) };
        cfg.add_layer(LayerConfig::new("conv2", conv2));
        cfg.add_layer(LayerConfig::new("norm2", LRNConfig::default()));
        cfg.add_layer(LayerConfig::new("pool2", PoolingConfig::max(3, 2, Padding::Valid)));

        cfg.add_layer(LayerConfig::new("flatten", LayerType::Flatten));
        cfg.add_layer(LayerConfig::new("fc3", LinearConfig::new(384)));
        cfg.add_layer(LayerConfig::new(FEATURE_LAYER, LinearConfig::new(FEATURE_SIZE)));
        cfg.add_layer(LayerConfig::new("fc5", LinearConfig::logits(num_classes)));
        cfg
    }

    /// Builds AlexNet on the weights of `store`, creating the ones that do not exist yet.
    pub fn new(backend: Rc<Backend<Native>>, store: &mut ParameterStore, num_classes: usize, image_size: usize) -> Result<AlexNet, Error> {
        info!("Creating AlexNet for {} classes", num_classes);
        let network = Sequential::from_config(backend, &Self::config(num_classes, image_size), store)?;
        Ok(AlexNet {
            network: network,
            num_classes: num_classes,
        })
    }

    /// Computes the unscaled class scores for a batch of images.
    pub fn logits(&self, images: &SharedTensor<f32>) -> Result<SharedTensor<f32>, Error> {
        self.network.forward(images)
    }

    /// The number of classes the logits are computed for.
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// The underlying layers.
    pub fn network(&self) -> &Sequential {
        &self.network
    }

    /// Loads pretrained weights into the AlexNet weights of `store`.
    ///
    /// Every layer of the file whose name is not in `skip_layers` is loaded: arrays with
    /// one dimension are copied into `<layer>/biases`, all others into `<layer>/weights`.
    /// Loaded weights are marked as not trainable.
    ///
    /// The weights have to exist in the store already, i.e. an AlexNet has to be built on
    /// it first.
    ///
    /// The arrays have to be stored in the layout of this crate: `[K, C / groups, kh, kw]`
    /// for convolutions and `[out, in]` for linear layers. Any other shape is rejected
    /// with a `ShapeMismatch`, the values are never transposed. The store is only changed
    /// if every array fits.
    pub fn load_pretrained<P: AsRef<Path>>(store: &mut ParameterStore, path: P, skip_layers: &[&str]) -> Result<(), Error> {
        let pretrained = PretrainedWeights::load(path.as_ref())?;
        let mut planned = Vec::new();
        for &(ref layer_name, ref arrays) in &pretrained.layers {
            if skip_layers.contains(&&layer_name[..]) {
                debug!("Skipping pretrained layer {}", layer_name);
                continue;
            }
            for array in arrays {
                let weight_name = if array.shape.len() == 1 { "biases" } else { "weights" };
                let full_name = ParameterStore::full_name(layer_name, weight_name);
                store.check_assignable(&full_name, &array.shape, &array.data)?;
                planned.push((full_name, array));
            }
        }

        for &(ref full_name, array) in &planned {
            store.assign(full_name, &array.shape, &array.data)?;
            store.set_trainable(full_name, false)?;
        }
        info!("Loaded {} pretrained weights from {:?}", planned.len(), path.as_ref());
        Ok(())
    }
}

impl FeatureExtractor for AlexNet {
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

#[derive(Debug, Clone, Default)]
/// Arrays of pretrained layers, in the order in which they are stored.
pub struct PretrainedWeights {
    /// Layer name and the arrays belonging to the layer.
    pub layers: Vec<(String, Vec<TensorRecord>)>,
}

impl PretrainedWeights {
    /// Read pretrained weights from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<PretrainedWeights, Error> {
        let message_reader = read_message(path)?;
        let reader = message_reader.get_root::<capnp_weights::Reader>()?;
        PretrainedWeights::read_capnp(reader)
    }

    /// Write pretrained weights into a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let mut message = ::capnp::message::Builder::new_default();
        {
            let mut weights = message.init_root::<capnp_weights::Builder>();
            self.write_capnp(&mut weights);
        }
        write_message(path, &message)
    }
}

impl<'a> CapnpWrite<'a> for PretrainedWeights {
    type Builder = capnp_weights::Builder<'a>;

    fn write_capnp(&self, builder: &mut Self::Builder) {
        let mut layers = builder.borrow().init_layers(self.layers.len() as u32);
        for (i, &(ref name, ref arrays)) in self.layers.iter().enumerate() {
            let mut layer = layers.borrow().get(i as u32);
            layer.set_name(name);
            let mut arrays_builder = layer.init_arrays(arrays.len() as u32);
            for (j, array) in arrays.iter().enumerate() {
                array.write_capnp(&mut arrays_builder.borrow().get(j as u32));
            }
        }
    }
}

impl<'a> CapnpRead<'a> for PretrainedWeights {
    type Reader = capnp_weights::Reader<'a>;

    fn read_capnp(reader: Self::Reader) -> Result<Self, Error> {
        let read_layers = reader.get_layers()?;
        let mut layers = Vec::new();
        for i in 0..read_layers.len() {
            let layer = read_layers.get(i);
            let read_arrays = layer.get_arrays()?;
            let mut arrays = Vec::new();
            for j in 0..read_arrays.len() {
                arrays.push(TensorRecord::read_capnp(read_arrays.get(j))?);
            }
            layers.push((layer.get_name()?.to_owned(), arrays));
        }
        Ok(PretrainedWeights { layers: layers })
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;
    use super::AlexNet;
    use util::native_backend;
    use weight::ParameterStore;

    #[test]
    fn geometry_for_small_images() {
        let mut store = ParameterStore::new();
        let net = AlexNet::new(Rc::new(native_backend()), &mut store, 10, 24).unwrap();
        assert_eq!(Some(vec![1, 64, 20, 20]), net.network().layer_output_shape("conv1"));
        assert_eq!(Some(vec![1, 64, 9, 9]), net.network().layer_output_shape("pool1"));
        assert_eq!(Some(vec![1, 64, 4, 4]), net.network().layer_output_shape("pool2"));
        assert_eq!(Some(vec![384, 1024]), store.shape("fc3/weights"));
        assert_eq!(Some(vec![64, 32, 5, 5]), store.shape("conv2/weights"));
        assert_eq!(&[1, 10], net.network().output_shape());
    }
}
