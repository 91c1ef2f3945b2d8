//! Provides common utility functions
use std::sync::{Arc, RwLock};
use co::backend::{Backend, BackendConfig};
use co::framework::IFramework;
use co::frameworks::Native;
use co::memory::MemoryType;
use co::tensor::{ITensorDesc, SharedTensor};
use error::Error;

/// Shared Lock used for our tensors
pub type ArcLock<T> = Arc<RwLock<T>>;

/// Create a simple native backend.
///
/// This is handy when you need to sync data to host memory to read/write it.
pub fn native_backend() -> Backend<Native> {
    let framework = Native::new();
    let hardwares = &framework.hardwares().to_vec();
    let backend_config = BackendConfig::new(framework, hardwares);
    Backend::new(backend_config).unwrap()
}

/// Write into a native Collenchyma Memory.
pub fn write_to_memory<T: ::std::marker::Copy>(mem: &mut MemoryType, data: &[T]) {
    match mem {
        &mut MemoryType::Native(ref mut mem) => {
            let mut mem_buffer = mem.as_mut_slice::<T>();
            for (index, datum) in data.iter().enumerate() {
                mem_buffer[index] = *datum;
            }
        },
    }
}

/// Create a Collenchyma SharedTensor for a scalar value.
pub fn native_scalar<T: ::std::marker::Copy>(scalar: T) -> SharedTensor<T> {
    let native = native_backend();
    let mut shared_scalar = SharedTensor::<T>::new(native.device(), &vec![1]).unwrap();
    write_to_memory(shared_scalar.get_mut(native.device()).unwrap(), &[scalar]);

    shared_scalar
}

/// Allocate a tensor of the given shape in host memory.
///
/// The contents are unspecified until written.
pub fn host_tensor(shape: &[usize]) -> Result<SharedTensor<f32>, Error> {
    let native = native_backend();
    Ok(SharedTensor::<f32>::new(native.device(), &shape.to_vec())?)
}

/// Allocate a host tensor of the given shape and copy `data` into it.
pub fn host_tensor_from(shape: &[usize], data: &[f32]) -> Result<SharedTensor<f32>, Error> {
    let count = shape.iter().fold(1, |prod, i| prod * i);
    if count != data.len() {
        return Err(Error::InvalidConfig(format!("{} values do not fit a tensor of shape {:?}", data.len(), shape)));
    }
    let mut tensor = host_tensor(shape)?;
    host_data_mut(&mut tensor)?.copy_from_slice(data);
    Ok(tensor)
}

/// Borrow the host copy of a tensor.
pub fn host_data(tensor: &SharedTensor<f32>) -> Result<&[f32], Error> {
    let native = native_backend();
    match tensor.get(native.device()).and_then(|mem| mem.as_native()) {
        Some(flat) => Ok(flat.as_slice::<f32>()),
        None => Err(Error::Memory(format!("tensor of shape {:?} has no host memory", tensor.desc()))),
    }
}

/// Mutably borrow the host copy of a tensor.
pub fn host_data_mut(tensor: &mut SharedTensor<f32>) -> Result<&mut [f32], Error> {
    let native = native_backend();
    let shape = tensor.desc().clone();
    match tensor.get_mut(native.device()).and_then(|mem| mem.as_mut_native()) {
        Some(flat) => Ok(flat.as_mut_slice::<f32>()),
        None => Err(Error::Memory(format!("tensor of shape {:?} has no host memory", shape))),
    }
}

/// Make sure the latest data of a tensor is available in host memory.
pub fn sync_to_host(tensor: &mut SharedTensor<f32>) -> Result<(), Error> {
    let native = native_backend();
    let _ = tensor.add_device(native.device());
    tensor.sync(native.device())?;
    Ok(())
}

/// Copy the host data of a tensor into a new host tensor of another shape.
///
/// Both shapes need to describe the same number of elements.
pub fn reshaped_copy(tensor: &SharedTensor<f32>, shape: &[usize]) -> Result<SharedTensor<f32>, Error> {
    if tensor.desc().size() != shape.iter().fold(1, |prod, i| prod * i) {
        return Err(Error::InvalidConfig(format!("cannot reshape {:?} into {:?}", tensor.desc(), shape)));
    }
    host_tensor_from(shape, host_data(tensor)?)
}
