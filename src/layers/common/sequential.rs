//! A container that runs its layers sequentially, feeding the output of each layer
//! into the next one.
//!
//! The output of every contained layer stays addressable by the layer name, so
//! intermediate activations (like the penultimate features of a classifier) can be
//! computed with [forward_to][1].
//! [1]: ./struct.Sequential.html#method.forward_to
use std::rc::Rc;
use co::prelude::*;
use error::Error;
use layer::*;
use util::reshaped_copy;
use weight::ParameterStore;

#[derive(Debug)]
/// Sequential Layer
pub struct Sequential {
    layers: Vec<Layer>,

    input_shape: Vec<usize>,
    output_shape: Vec<usize>,
}

impl Sequential {
    /// Create a empty Sequential container layer.
    pub fn empty() -> Sequential {
        Sequential {
            layers: vec![],

            input_shape: vec![],
            output_shape: vec![],
        }
    }

    /// Create a Sequential layer from a SequentialConfig.
    ///
    /// Every weight of the contained layers is requested from `store`.
    pub fn from_config(backend: Rc<Backend<Native>>, config: &SequentialConfig, store: &mut ParameterStore) -> Result<Sequential, Error> {
        let mut layer = Self::empty();

        layer.init_layers(backend, config, store)?;

        Ok(layer)
    }

    /// Initializes a sequential container.
    ///
    /// Creates every layer of the supplied [SequentialConfig][1] and connects it to the
    /// output shape of the previous layer, starting with the input shape of the config.
    ///
    /// [1]: ./struct.SequentialConfig.html
    pub fn init_layers(&mut self, backend: Rc<Backend<Native>>, config: &SequentialConfig, store: &mut ParameterStore) -> Result<(), Error> {
        if config.input_shape.is_empty() {
            return Err(Error::InvalidConfig("sequential container needs an input shape".to_owned()));
        }
        self.input_shape = config.input_shape.clone();

        let mut shape = config.input_shape.clone();
        for layer_config in &config.layers {
            if self.layers.iter().any(|layer| layer.name == layer_config.name) {
                return Err(Error::InvalidConfig(format!("layer name {} is used more than once", layer_config.name)));
            }
            debug!("Creating Layer {}", &layer_config.name);
            let mut layer = Layer::from_config(backend.clone(), layer_config);
            shape = layer.connect(&shape, store)?;
            self.layers.push(layer);
        }
        self.output_shape = shape;

        info!("Sequential container initialization done.");
        Ok(())
    }

    /// Runs all layers and returns the output of the last one.
    pub fn forward(&self, input: &SharedTensor<f32>) -> Result<SharedTensor<f32>, Error> {
        self.run(input, None)
    }

    /// Runs the layers up to and including the layer named `name` and returns its output.
    pub fn forward_to(&self, input: &SharedTensor<f32>, name: &str) -> Result<SharedTensor<f32>, Error> {
        if !self.layers.iter().any(|layer| layer.name == name) {
            return Err(Error::InvalidConfig(format!("no layer named {}", name)));
        }
        self.run(input, Some(name))
    }

    fn run(&self, input: &SharedTensor<f32>, until: Option<&str>) -> Result<SharedTensor<f32>, Error> {
        let mut output: Option<SharedTensor<f32>> = None;
        for layer in &self.layers {
            let next = match output {
                Some(ref data) => layer.forward(data)?,
                None => layer.forward(input)?,
            };
            output = Some(next);
            if until == Some(&layer.name[..]) {
                break;
            }
        }
        match output {
            Some(data) => Ok(data),
            None => reshaped_copy(input, input.desc()),
        }
    }

    /// Returns the names of the contained layers in execution order.
    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|layer| &layer.name[..]).collect()
    }

    /// Returns the shape the output of the layer named `name` has for the configured input.
    pub fn layer_output_shape(&self, name: &str) -> Option<Vec<usize>> {
        let mut shape = self.input_shape.clone();
        for layer in &self.layers {
            shape = match layer.worker.calculate_output_shape(&shape) {
                Ok(output_shape) => output_shape,
                Err(_) => return None,
            };
            if layer.name == name {
                return Some(shape);
            }
        }
        None
    }

    /// Returns the full names of all weights used by the contained layers.
    pub fn weights_names(&self) -> Vec<String> {
        self.layers.iter().flat_map(|layer| layer.weights_names().to_vec()).collect()
    }

    /// Returns the input shape the container was connected with.
    pub fn input_shape(&self) -> &[usize] {
        &self.input_shape
    }

    /// Returns the output shape for the configured input shape.
    pub fn output_shape(&self) -> &[usize] {
        &self.output_shape
    }
}

#[derive(Debug, Clone, Default)]
/// Specifies configuration parameters for a Sequential Layer.
pub struct SequentialConfig {
    /// Defines the layers of the container via [LayerConfig][layer_config]s.
    /// [layer_config]: ../../../layer/struct.LayerConfig.html
    pub layers: Vec<LayerConfig>,

    /// The shape of the input of the container, including the batch dimension.
    ///
    /// The batch size only serves as example; any batch size can be used with
    /// [forward][1].
    /// [1]: ./struct.Sequential.html#method.forward
    pub input_shape: Vec<usize>,
}

impl SequentialConfig {
    /// Add layer at the end of the sequential container.
    pub fn add_layer(&mut self, layer: LayerConfig) {
        self.layers.push(layer);
    }

    /// Set the shape of the input of the container.
    pub fn add_input(&mut self, shape: &[usize]) {
        self.input_shape = shape.to_owned();
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;
    use layer::{LayerConfig, LayerType};
    use layers::LinearConfig;
    use util::{host_data, host_tensor_from, native_backend};
    use weight::ParameterStore;
    use super::{Sequential, SequentialConfig};

    fn two_layer_config() -> SequentialConfig {
        let mut cfg = SequentialConfig::default();
        cfg.add_input(&[1, 2]);
        cfg.add_layer(LayerConfig::new("fc1", LinearConfig { use_bias: false, ..LinearConfig::logits(2) }));
        cfg.add_layer(LayerConfig::new("relu1", LayerType::ReLU));
        cfg
    }

    #[test]
    fn exposes_intermediate_outputs() {
        let mut store = ParameterStore::new();
        let network = Sequential::from_config(Rc::new(native_backend()), &two_layer_config(), &mut store).unwrap();
        store.assign("fc1/weights", &[2, 2], &[1f32, 0f32, 0f32, -1f32]).unwrap();

        let input = host_tensor_from(&[1, 2], &[3f32, 4f32]).unwrap();
        assert_eq!(&[3f32, -4f32], host_data(&network.forward_to(&input, "fc1").unwrap()).unwrap());
        assert_eq!(&[3f32, 0f32], host_data(&network.forward(&input).unwrap()).unwrap());
        assert!(network.forward_to(&input, "fc9").is_err());
        assert_eq!(vec!["fc1", "relu1"], network.layer_names());
        assert_eq!(Some(vec![1, 2]), network.layer_output_shape("fc1"));
    }

    #[test]
    fn rejects_duplicate_layer_names() {
        let mut cfg = two_layer_config();
        cfg.add_layer(LayerConfig::new("fc1", LinearConfig::new(2)));
        let mut store = ParameterStore::new();
        assert!(Sequential::from_config(Rc::new(native_backend()), &cfg, &mut store).is_err());
    }
}
