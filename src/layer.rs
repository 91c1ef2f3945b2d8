//! Provides the generics and interfaces for the specific [Layers][layers].
//! [layers]: ../layers/index.html
use std::fmt;
use std::rc::Rc;
use co::prelude::*;
use error::Error;
use layers::*;
use util::{ArcLock, host_tensor};
use weight::{ParameterStore, WeightConfig};

#[derive(Debug)]
/// The generic Layer
pub struct Layer {
    /// Identifies the Network
    ///
    /// The name is mainly used for logging purposes and as scope of the layer's weights.
    pub name: String,
    /// The configuration of the Layer
    pub config: Box<LayerConfig>,
    /// The [implementation][1] of the Layer.
    /// [1]: ../layers/index.html
    ///
    /// This is the part that does most of the work ([forward][2]).
    /// [2]: ./trait.ILayer.html#method.forward
    pub worker: Box<dyn ILayer>,

    backend: Rc<Backend<Native>>,

    /// The non-batch dimensions of the input the layer was connected with.
    input_dims: Vec<usize>,

    weights_data: Vec<ArcLock<SharedTensor<f32>>>,
    weights_names: Vec<String>,
}

impl Layer {
    /// Creates a new Layer from a [LayerConfig][1].
    /// [1]: ./struct.LayerConfig.html
    ///
    /// The layer has no weights until it is [connected][2].
    /// [2]: #method.connect
    pub fn from_config(backend: Rc<Backend<Native>>, config: &LayerConfig) -> Layer {
        let cl = config.clone();
        let cfg = Box::<LayerConfig>::new(cl);
        Layer {
            name: cfg.name.clone(),

            worker: Layer::worker_from_config(&cfg),
            config: cfg,

            backend: backend,

            input_dims: vec![],

            weights_data: vec![],
            weights_names: vec![],
        }
    }

    /// Helper for [from_config] to match a [LayerType][2] to its [implementation][3].
    /// [1]: #method.from_config
    /// [2]: ./enum.LayerType.html
    /// [3]: ../layers/index.html
    fn worker_from_config(config: &LayerConfig) -> Box<dyn ILayer> {
        match config.layer_type.clone() {
            LayerType::Convolution(layer_config) => Box::new(Convolution::from_config(&layer_config)),
            LayerType::Linear(layer_config) => Box::new(Linear::from_config(&layer_config)),
            LayerType::Pooling(layer_config) => Box::new(Pooling::from_config(&layer_config)),
            LayerType::LRN(layer_config) => Box::new(LRN::from_config(&layer_config)),
            LayerType::Dropout(layer_config) => Box::new(Dropout::from_config(&layer_config)),
            LayerType::Standardize => Box::new(Standardize),
            LayerType::ReLU => Box::new(ReLU),
            LayerType::Reshape(layer_config) => Box::new(Reshape::from_config(&layer_config)),
            LayerType::Flatten => Box::new(Flatten),
        }
    }

    /// Connect the layer to an input of the given shape.
    ///
    /// Requests every weight the layer needs from the `store`, under the scope of the
    /// layer name, and returns the shape of the output the layer will produce.
    pub fn connect(&mut self, input_shape: &[usize], store: &mut ParameterStore) -> Result<Vec<usize>, Error> {
        let output_shape = self.worker.calculate_output_shape(input_shape)?;

        self.weights_data.clear();
        self.weights_names.clear();
        for (weight_config, weight_shape) in self.worker.weights(input_shape) {
            let weight = store.get_or_create(&self.name, &weight_config, &weight_shape)?;
            self.weights_names.push(ParameterStore::full_name(&self.name, &weight_config.name));
            self.weights_data.push(weight);
        }
        self.input_dims = input_shape.iter().skip(1).cloned().collect();
        info!("{} {:?} -> {:?}", self.name, input_shape, output_shape);

        Ok(output_shape)
    }

    /// Uses the underlying layer implementation to compute the output of the layer.
    ///
    /// The batch size may differ from the one the layer was connected with; all other
    /// dimensions have to match.
    pub fn forward(&self, input: &SharedTensor<f32>) -> Result<SharedTensor<f32>, Error> {
        let input_shape = input.desc().clone();
        if input_shape.iter().skip(1).cloned().collect::<Vec<usize>>() != self.input_dims {
            return Err(Error::InvalidConfig(format!("layer {} was connected for inputs [_, {:?}], got {:?}",
                                                    self.name, self.input_dims, input_shape)));
        }
        let output_shape = self.worker.calculate_output_shape(&input_shape)?;
        let mut output = host_tensor(&output_shape)?;

        let weights_guards = self.weights_data.iter().map(|w| w.read().unwrap()).collect::<Vec<_>>();
        let weights = weights_guards.iter().map(|w| &**w).collect::<Vec<&SharedTensor<f32>>>();
        self.worker.compute_output(&*self.backend, &weights, &[input], &mut [&mut output])?;

        Ok(output)
    }

    /// Returns the full names of the weights used by this layer.
    pub fn weights_names(&self) -> &[String] {
        &self.weights_names
    }

    /// Returns the weights used by this layer.
    pub fn weights_data(&self) -> &[ArcLock<SharedTensor<f32>>] {
        &self.weights_data
    }
}

/// A Layer that can compute its output from an input and its weights.
///
/// See [Layers][layers]
/// [layers]: ../layers/index.html
pub trait ILayer : ComputeOutput<f32, Backend<Native>> {
    /// Returns the configuration and shape of every weight the layer needs for an input
    /// of `input_shape`.
    ///
    /// The order of the returned weights is the order in which they are passed to
    /// [compute_output][1].
    /// [1]: ./trait.ComputeOutput.html#method.compute_output
    #[allow(unused_variables)]
    fn weights(&self, input_shape: &[usize]) -> Vec<(WeightConfig, Vec<usize>)> {
        vec![]
    }

    /// Calculates the output shape for an input of `input_shape`.
    ///
    /// Returns an error if the layer can not be applied to an input of that shape.
    fn calculate_output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>, Error>;
}

/// A Layer that can compute the output for a given input.
pub trait ComputeOutput<T, B: IBackend> {
    /// Compute output for given input and write them into `output_data`.
    fn compute_output(&self,
                      backend: &B,
                      weights_data: &[&SharedTensor<T>],
                      input_data: &[&SharedTensor<T>],
                      output_data: &mut [&mut SharedTensor<T>]) -> Result<(), Error>;
}

impl fmt::Debug for dyn ILayer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({})", "ILayer")
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
/// The phase a network is built for.
pub enum Phase {
    /// Stochastic layers like [Dropout][1] are active.
    /// [1]: ../layers/common/dropout/index.html
    Train,
    /// All layers are deterministic.
    Test,
}

#[derive(Debug, Clone)]
/// Layer Configuration Struct
pub struct LayerConfig {
    /// The name of the Layer
    pub name: String,

    /// The type of the Layer
    pub layer_type: LayerType,
}

#[derive(Debug, Clone)]
/// The Layer Types
pub enum LayerType {
    // Common layers
    /// Convolution Layer
    Convolution(ConvolutionConfig),
    /// Linear Layer
    Linear(LinearConfig),
    /// Pooling Layer
    Pooling(PoolingConfig),
    /// Local Response Normalization Layer
    LRN(LRNConfig),
    /// Dropout Layer
    Dropout(DropoutConfig),
    // Activation layers
    /// ReLU Layer
    ReLU,
    // Utility layers
    /// Per-image Standardization Layer
    Standardize,
    /// Reshape Layer
    Reshape(ReshapeConfig),
    /// Flatten Layer
    Flatten,
}

impl LayerConfig {
    /// Creates a new LayerConfig
    pub fn new<L: Into<LayerType>>(name: &str, layer_type: L) -> LayerConfig {
        LayerConfig {
            name: name.to_owned(),
            layer_type: layer_type.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;
    use super::*;
    use util::{host_data, host_tensor_from, native_backend};
    use weight::ParameterStore;

    #[test]
    fn connect_registers_scoped_weights() {
        let mut store = ParameterStore::new();
        let mut layer = Layer::from_config(Rc::new(native_backend()),
                                           &LayerConfig::new("fc1", LinearConfig::new(3)));
        let output_shape = layer.connect(&[1, 4], &mut store).unwrap();
        assert_eq!(vec![1, 3], output_shape);
        assert_eq!(&["fc1/weights".to_owned(), "fc1/biases".to_owned()], layer.weights_names());
        assert_eq!(Some(vec![3, 4]), store.shape("fc1/weights"));
    }

    #[test]
    fn forward_accepts_other_batch_size() {
        let mut store = ParameterStore::new();
        let mut layer = Layer::from_config(Rc::new(native_backend()), &LayerConfig::new("relu", LayerType::ReLU));
        layer.connect(&[1, 2], &mut store).unwrap();

        let input = host_tensor_from(&[2, 2], &[-1f32, 2f32, 3f32, -4f32]).unwrap();
        let output = layer.forward(&input).unwrap();
        assert_eq!(&[0f32, 2f32, 3f32, 0f32], host_data(&output).unwrap());

        let wrong = host_tensor_from(&[1, 3], &[1f32, 2f32, 3f32]).unwrap();
        assert!(layer.forward(&wrong).is_err());
    }
}
