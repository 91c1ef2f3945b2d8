//! Provides configuration of weights, their initialization and the registry they live in.
//!
//! Every trainable weight of a network is stored in a [ParameterStore][store] under its
//! full name `<scope>/<name>`, where the scope is the name of the layer that requested it
//! (e.g. `conv1/weights`, `fc4/biases`).
//!
//! Requesting a name that already exists returns the existing tensor instead of creating a
//! second one, so networks built against the same store share their parameters.
//!
//! [store]: ./struct.ParameterStore.html
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};
use rand;
use rand::distributions::{IndependentSample, Range};
use co::SharedTensor;
use capnp_util::*;
use error::Error;
use lamina_capnp::checkpoint as capnp_checkpoint;
use util::{ArcLock, host_data, host_data_mut, host_tensor, sync_to_host};

#[derive(Debug, Clone)]
/// Specifies training configuration for a weight.
pub struct WeightConfig {
    /// The name of the weight inside the scope of its layer, e.g. `weights` or `biases`.
    ///
    /// Default: ""
    pub name: String,

    /// Whether the weight is updated during training.
    ///
    /// Default: true
    pub trainable: bool,

    /// The filler that initializes the weights in the weight.
    ///
    /// Default: None
    pub filler: Option<FillerType>,
}

impl Default for WeightConfig {
    fn default() -> WeightConfig {
        WeightConfig {
            name: "".to_owned(),
            trainable: true,
            filler: None,
        }
    }
}

impl WeightConfig {
    /// Create a WeightConfig with a name and a filler.
    pub fn new(name: &str, filler: FillerType) -> WeightConfig {
        WeightConfig {
            name: name.to_owned(),
            filler: Some(filler),
            ..WeightConfig::default()
        }
    }

    /// Checks that a reused weight is requested with the shape it was created with.
    /// Returns an error if the shapes differ.
    pub fn check_dimensions(&self,
                            existing_shape: &[usize],
                            requested_shape: &[usize],
                            full_name: &str)
                            -> Result<(), Error> {
        if existing_shape != requested_shape {
            return Err(Error::ShapeMismatch {
                name: full_name.to_owned(),
                expected: existing_shape.to_owned(),
                actual: requested_shape.to_owned(),
            });
        }
        Ok(())
    }
}

fn count(shape: &[usize]) -> usize {
    shape.iter().fold(1, |prod, i| prod * i)
}

#[derive(Debug, Copy, Clone, PartialEq)]
/// Enum for specifing the type of Filler.
pub enum FillerType {
    /// Fills the weight with a constant `value` (all values are the same).
    Constant {
        /// The value that will be used to fill the weight.
        value: f32
    },
    /// Fills the weights based on the paper:
    ///
    /// `[Bengio and Glorot 2010]: Understanding the difficulty of training deep feedforward neural networks.`
    ///
    /// Also known as Xavier filler.
    Glorot {
        /// Number of input nodes for each output.
        input_size: usize,
        /// Number of output nodes for each input.
        output_size: usize,
    },
}

impl FillerType {
    /// Uses a filler as specified by this FillerType to fill the values in a SharedTensor
    ///
    /// This filling of weights is usually done directly after creation of the weight.
    pub fn fill(&self, weight: &mut SharedTensor<f32>) -> Result<(), Error> {
        sync_to_host(weight)?;
        let native_weight = host_data_mut(weight)?;

        match *self {
            FillerType::Constant { value } => Self::fill_constant(native_weight, value),
            FillerType::Glorot { input_size, output_size } => Self::fill_glorot(native_weight, input_size, output_size),
        }
        Ok(())
    }

    /// Directly use the [Constant Filler](#variant.Constant).
    pub fn fill_constant(weight: &mut [f32], value: f32) {
        for e in weight.iter_mut() {
            *e = value;
        }
    }

    /// Directly use the [Glorot Filler](#variant.Glorot).
    pub fn fill_glorot(weight: &mut [f32], num_inputs: usize, num_outputs: usize) {
        let init_range = (6.0f32 / (num_inputs as f32 + num_outputs as f32)).sqrt();

        let between = Range::new(-init_range, init_range);
        let mut rng = rand::thread_rng();
        for e in weight.iter_mut() {
            *e = between.ind_sample(&mut rng);
        }
    }
}

#[derive(Debug, Clone)]
/// A named weight tensor together with its training flag.
pub struct Parameter {
    /// The shared weight data.
    pub data: ArcLock<SharedTensor<f32>>,
    /// Whether the weight is updated during training.
    pub trainable: bool,
}

#[derive(Debug, Default)]
/// Registry of all weights of one or more networks, keyed by `<scope>/<name>`.
///
/// Lookups are explicit: [get_or_create][1] checks whether a name is known before it creates
/// anything, so a shape mismatch on reuse surfaces as an error instead of being mistaken
/// for a missing weight.
///
/// [1]: #method.get_or_create
pub struct ParameterStore {
    names: Vec<String>,
    parameters: HashMap<String, Parameter>,
}

impl ParameterStore {
    /// Create an empty ParameterStore.
    pub fn new() -> ParameterStore {
        ParameterStore::default()
    }

    /// Join a scope and a weight name into the full name used as key.
    pub fn full_name(scope: &str, name: &str) -> String {
        format!("{}/{}", scope, name)
    }

    /// Returns the weight for `<scope>/<config.name>`, creating and filling it if it does
    /// not exist yet.
    pub fn get_or_create(&mut self,
                         scope: &str,
                         config: &WeightConfig,
                         shape: &[usize])
                         -> Result<ArcLock<SharedTensor<f32>>, Error> {
        let full_name = Self::full_name(scope, &config.name);
        if let Some(existing) = self.parameters.get(&full_name) {
            let existing_shape = existing.data.read().unwrap().desc().clone();
            config.check_dimensions(&existing_shape, shape, &full_name)?;
            debug!("Reusing weight {} {:?}", full_name, existing_shape);
            return Ok(existing.data.clone());
        }

        let mut tensor = host_tensor(shape)?;
        match config.filler {
            Some(filler) => filler.fill(&mut tensor)?,
            None => FillerType::fill_constant(host_data_mut(&mut tensor)?, 0f32),
        }
        info!("Creating weight {} {:?}", full_name, shape);
        let data = Arc::new(RwLock::new(tensor));
        self.names.push(full_name.clone());
        self.parameters.insert(full_name, Parameter { data: data.clone(), trainable: config.trainable });
        Ok(data)
    }

    /// Returns true if a weight with the full name exists.
    pub fn contains(&self, full_name: &str) -> bool {
        self.parameters.contains_key(full_name)
    }

    /// Returns the weight with the full name, if it exists.
    pub fn get(&self, full_name: &str) -> Option<ArcLock<SharedTensor<f32>>> {
        self.parameters.get(full_name).map(|param| param.data.clone())
    }

    /// Returns the shape of the weight with the full name, if it exists.
    pub fn shape(&self, full_name: &str) -> Option<Vec<usize>> {
        self.parameters.get(full_name).map(|param| param.data.read().unwrap().desc().clone())
    }

    /// Returns the training flag of the weight with the full name, if it exists.
    pub fn is_trainable(&self, full_name: &str) -> Option<bool> {
        self.parameters.get(full_name).map(|param| param.trainable)
    }

    /// Change the training flag of an existing weight.
    pub fn set_trainable(&mut self, full_name: &str, trainable: bool) -> Result<(), Error> {
        match self.parameters.get_mut(full_name) {
            Some(param) => {
                param.trainable = trainable;
                Ok(())
            }
            None => Err(Error::MissingWeight(full_name.to_owned())),
        }
    }

    /// Checks that `values` of `shape` could be assigned to the weight with the full name,
    /// without changing anything.
    pub fn check_assignable(&self, full_name: &str, shape: &[usize], values: &[f32]) -> Result<(), Error> {
        let existing_shape = match self.shape(full_name) {
            Some(existing_shape) => existing_shape,
            None => return Err(Error::MissingWeight(full_name.to_owned())),
        };
        if existing_shape != shape || values.len() != count(&existing_shape) {
            return Err(Error::ShapeMismatch {
                name: full_name.to_owned(),
                expected: existing_shape,
                actual: shape.to_owned(),
            });
        }
        Ok(())
    }

    /// Overwrite the values of an existing weight.
    ///
    /// The supplied shape has to match the shape of the weight exactly.
    pub fn assign(&self, full_name: &str, shape: &[usize], values: &[f32]) -> Result<(), Error> {
        self.check_assignable(full_name, shape, values)?;
        let param = &self.parameters[full_name];
        let mut tensor = param.data.write().unwrap();
        sync_to_host(&mut tensor)?;
        host_data_mut(&mut tensor)?.copy_from_slice(values);
        Ok(())
    }

    /// Copy the values of a weight into host memory.
    pub fn values(&self, full_name: &str) -> Result<Vec<f32>, Error> {
        match self.parameters.get(full_name) {
            Some(param) => Ok(host_data(&param.data.read().unwrap())?.to_vec()),
            None => Err(Error::MissingWeight(full_name.to_owned())),
        }
    }

    /// Full names of all weights in creation order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Full names of all weights that are updated during training.
    pub fn trainable_names(&self) -> Vec<String> {
        self.names.iter().filter(|name| self.parameters[*name].trainable).cloned().collect()
    }

    /// Number of weights in the store.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if the store holds no weights.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Write all weights into a checkpoint file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let mut message = ::capnp::message::Builder::new_default();
        {
            let mut checkpoint = message.init_root::<capnp_checkpoint::Builder>();
            self.write_capnp(&mut checkpoint)?;
        }
        write_message(path.as_ref(), &message)?;
        info!("Saved {} weights to {:?}", self.len(), path.as_ref());
        Ok(())
    }

    fn write_capnp(&self, builder: &mut capnp_checkpoint::Builder) -> Result<(), Error> {
        let mut weights = builder.borrow().init_weights(self.names.len() as u32);
        for (i, name) in self.names.iter().enumerate() {
            let param = &self.parameters[name];
            let tensor = param.data.read().unwrap();
            let record = TensorRecord::new(tensor.desc(), host_data(&tensor)?);

            let mut weight = weights.borrow().get(i as u32);
            weight.set_name(name);
            weight.set_trainable(param.trainable);
            record.write_capnp(&mut weight.init_tensor());
        }
        Ok(())
    }

    /// Restore the values of all weights from a checkpoint file.
    ///
    /// Every weight of the store has to be present in the checkpoint with the same shape.
    /// Entries of the checkpoint that the store does not know are ignored.
    /// Nothing is changed unless the whole checkpoint fits the store.
    pub fn restore<P: AsRef<Path>>(&mut self, path: P) -> Result<(), Error> {
        let message_reader = read_message(path.as_ref())?;
        let checkpoint = message_reader.get_root::<capnp_checkpoint::Reader>()?;
        let read_weights = checkpoint.get_weights()?;

        let mut restored = HashMap::new();
        for i in 0..read_weights.len() {
            let weight = read_weights.get(i);
            let name = weight.get_name()?.to_owned();
            let record = TensorRecord::read_capnp(weight.get_tensor()?)?;
            restored.insert(name, (record, weight.get_trainable()));
        }

        for name in &self.names {
            if !restored.contains_key(name) {
                return Err(Error::MissingWeight(name.clone()));
            }
        }
        restored.retain(|name, _| {
            let known = self.parameters.contains_key(name);
            if !known {
                debug!("Ignoring weight {} from checkpoint", name);
            }
            known
        });
        for (name, &(ref record, _)) in &restored {
            self.check_assignable(name, &record.shape, &record.data)?;
        }

        for (name, (record, trainable)) in restored {
            self.assign(&name, &record.shape, &record.data)?;
            self.set_trainable(&name, trainable)?;
        }
        info!("Restored {} weights from {:?}", self.len(), path.as_ref());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::env;
    use super::*;
    use util::host_data;

    fn weights_config() -> WeightConfig {
        WeightConfig::new("weights", FillerType::Glorot { input_size: 4, output_size: 3 })
    }

    #[test]
    fn dim_check_requires_same_shape() {
        let cfg = WeightConfig::default();
        assert!(cfg.check_dimensions(&[2, 3, 3], &[2, 3, 3], "foo").is_ok());
        assert!(cfg.check_dimensions(&[2, 3, 3], &[3, 2, 3], "foo").is_err());
    }

    #[test]
    fn glorot_stays_in_range() {
        let mut values = vec![0f32; 100];
        FillerType::fill_glorot(&mut values, 10, 20);
        let range = (6f32 / 30f32).sqrt();
        assert!(values.iter().all(|v| *v >= -range && *v <= range));
    }

    #[test]
    fn get_or_create_reuses_existing_weight() {
        let mut store = ParameterStore::new();
        let first = store.get_or_create("fc", &weights_config(), &[3, 4]).unwrap();
        let second = store.get_or_create("fc", &weights_config(), &[3, 4]).unwrap();
        assert_eq!(1, store.len());

        store.assign("fc/weights", &[3, 4], &[0.5f32; 12]).unwrap();
        assert_eq!(&[0.5f32; 12], host_data(&first.read().unwrap()).unwrap());
        assert_eq!(&[0.5f32; 12], host_data(&second.read().unwrap()).unwrap());
    }

    #[test]
    fn get_or_create_rejects_other_shape() {
        let mut store = ParameterStore::new();
        store.get_or_create("fc", &weights_config(), &[3, 4]).unwrap();
        match store.get_or_create("fc", &weights_config(), &[4, 4]) {
            Err(Error::ShapeMismatch { name, expected, actual }) => {
                assert_eq!("fc/weights", name);
                assert_eq!(vec![3, 4], expected);
                assert_eq!(vec![4, 4], actual);
            }
            other => panic!("expected shape mismatch, got {:?}", other),
        }
    }

    #[test]
    fn unfilled_weight_is_zero() {
        let mut store = ParameterStore::new();
        let cfg = WeightConfig { name: "biases".to_owned(), ..WeightConfig::default() };
        store.get_or_create("fc", &cfg, &[5]).unwrap();
        assert_eq!(vec![0f32; 5], store.values("fc/biases").unwrap());
    }

    #[test]
    fn checkpoint_restores_values_and_flags() {
        let path = env::temp_dir().join("lamina_weight_checkpoint.capnp");
        let mut store = ParameterStore::new();
        store.get_or_create("fc", &weights_config(), &[3, 4]).unwrap();
        store.set_trainable("fc/weights", false).unwrap();
        let saved = store.values("fc/weights").unwrap();
        store.save(&path).unwrap();

        let mut restored = ParameterStore::new();
        restored.get_or_create("fc", &weights_config(), &[3, 4]).unwrap();
        restored.restore(&path).unwrap();
        assert_eq!(saved, restored.values("fc/weights").unwrap());
        assert_eq!(Some(false), restored.is_trainable("fc/weights"));
    }

    #[test]
    fn checkpoint_missing_weight_fails() {
        let path = env::temp_dir().join("lamina_weight_checkpoint_missing.capnp");
        ParameterStore::new().save(&path).unwrap();

        let mut store = ParameterStore::new();
        store.get_or_create("fc", &weights_config(), &[3, 4]).unwrap();
        match store.restore(&path) {
            Err(Error::MissingWeight(name)) => assert_eq!("fc/weights", name),
            other => panic!("expected missing weight, got {:?}", other),
        }
    }

    #[test]
    fn checkpoint_with_wrong_shape_changes_nothing() {
        let gain = WeightConfig::new("weights", FillerType::Constant { value: 2f32 });
        let path = env::temp_dir().join("lamina_weight_checkpoint_wrong_shape.capnp");
        {
            let mut other = ParameterStore::new();
            other.get_or_create("fc", &weights_config(), &[3, 4]).unwrap();
            other.get_or_create("g", &gain, &[3]).unwrap();
            other.assign("fc/weights", &[3, 4], &[7f32; 12]).unwrap();
            other.set_trainable("fc/weights", false).unwrap();
            other.save(&path).unwrap();
        }

        let mut store = ParameterStore::new();
        store.get_or_create("fc", &weights_config(), &[3, 4]).unwrap();
        store.get_or_create("g", &gain, &[2]).unwrap();
        let before = store.values("fc/weights").unwrap();

        match store.restore(&path) {
            Err(Error::ShapeMismatch { name, expected, actual }) => {
                assert_eq!("g/weights", name);
                assert_eq!(vec![2], expected);
                assert_eq!(vec![3], actual);
            }
            other => panic!("expected shape mismatch, got {:?}", other),
        }
        assert_eq!(before, store.values("fc/weights").unwrap());
        assert_eq!(Some(true), store.is_trainable("fc/weights"));
        assert_eq!(vec![2f32; 2], store.values("g/weights").unwrap());
    }
}
