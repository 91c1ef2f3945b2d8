//! Provides functionality for Cap'n Proto (de)serialization.
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use capnp::message::{Builder, HeapAllocator, Reader, ReaderOptions};
use capnp::serialize::OwnedSegments;
use capnp::serialize_packed;
use error::Error;
use lamina_capnp::tensor as capnp_tensor;

/// Weights of the larger topologies easily exceed the default traversal limit of 64MiB.
const TRAVERSAL_LIMIT_IN_WORDS: u64 = 1 << 31;

pub trait CapnpWrite<'a> {
    /// The Builder that was autogenerated by capnp.
    type Builder;

    /// Write the struct into the message that is being built by the Builder.
    fn write_capnp(&self, builder: &mut Self::Builder);
}

pub trait CapnpRead<'a> {
    /// The Reader that was autogenerated by capnp.
    type Reader;

    /// Create the struct from the capnp message that is read by the Reader.
    fn read_capnp(reader: Self::Reader) -> Result<Self, Error> where Self: Sized;
}

/// A tensor in host memory, as it is stored in Lamina files.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorRecord {
    /// Shape of the tensor.
    pub shape: Vec<usize>,
    /// Values in row-major order.
    pub data: Vec<f32>,
}

impl TensorRecord {
    /// Copies shape and values into a new record.
    pub fn new(shape: &[usize], data: &[f32]) -> TensorRecord {
        TensorRecord {
            shape: shape.to_owned(),
            data: data.to_owned(),
        }
    }
}

impl<'a> CapnpWrite<'a> for TensorRecord {
    type Builder = capnp_tensor::Builder<'a>;

    fn write_capnp(&self, builder: &mut Self::Builder) {
        {
            let mut shape = builder.borrow().init_shape(self.shape.len() as u32);
            for (i, dim) in self.shape.iter().enumerate() {
                shape.set(i as u32, *dim as u64);
            }
        }
        {
            let mut data = builder.borrow().init_data(self.data.len() as u32);
            for (i, value) in self.data.iter().enumerate() {
                data.set(i as u32, *value);
            }
        }
    }
}

impl<'a> CapnpRead<'a> for TensorRecord {
    type Reader = capnp_tensor::Reader<'a>;

    fn read_capnp(reader: Self::Reader) -> Result<Self, Error> {
        let read_shape = reader.get_shape()?;
        let mut shape = Vec::new();
        for i in 0..read_shape.len() {
            shape.push(read_shape.get(i) as usize);
        }
        let read_data = reader.get_data()?;
        let mut data = Vec::with_capacity(read_data.len() as usize);
        for i in 0..read_data.len() {
            data.push(read_data.get(i));
        }
        let count = shape.iter().fold(1, |prod, i| prod * i);
        if count != data.len() {
            return Err(Error::InvalidConfig(format!("stored tensor of shape {:?} holds {} values", shape, data.len())));
        }

        Ok(TensorRecord {
            shape: shape,
            data: data,
        })
    }
}

/// Write a finished message to `path` in packed encoding.
pub fn write_message<P: AsRef<Path>>(path: P, message: &Builder<HeapAllocator>) -> Result<(), Error> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    serialize_packed::write_message(&mut writer, message)?;
    Ok(())
}

/// Read a packed message from `path`.
pub fn read_message<P: AsRef<Path>>(path: P) -> Result<Reader<OwnedSegments>, Error> {
    let file = File::open(path.as_ref())?;
    let mut reader = BufReader::new(file);
    let mut options = ReaderOptions::new();
    options.traversal_limit_in_words(TRAVERSAL_LIMIT_IN_WORDS);
    Ok(serialize_packed::read_message(&mut reader, options)?)
}
