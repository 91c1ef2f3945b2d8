//! Provides the error type shared by all Lamina operations.
use std::{error, fmt, io};
use capnp;
use co;
use serde_pickle;

#[derive(Debug)]
/// Defines the set of errors that can occur while building, running or visualizing a network.
pub enum Error {
    /// Failure inside the Collenchyma framework (allocation, synchronization, plugin operation).
    Framework(co::error::Error),
    /// Failure while allocating, resizing or synchronizing a tensor.
    Tensor(co::tensor::Error),
    /// Tensor memory is not available where it is needed.
    Memory(String),
    /// Failure while reading or writing a file.
    Io(io::Error),
    /// Failure while encoding or decoding a Cap'n Proto message.
    Capnp(capnp::Error),
    /// Failure while decoding a pickled label file.
    Pickle(serde_pickle::Error),
    /// A weight was requested or restored with a shape that differs from the existing one.
    ShapeMismatch {
        /// Full name of the weight, `<scope>/<name>`.
        name: String,
        /// Shape of the weight that already exists.
        expected: Vec<usize>,
        /// Shape that was requested or supplied.
        actual: Vec<usize>,
    },
    /// A weight that is required does not exist.
    MissingWeight(String),
    /// An embedding was produced for a label that is not part of the known labels.
    UnknownLabel(String),
    /// No word vector could be found for a label.
    MissingWordVector(String),
    /// A configuration value is missing or inconsistent.
    InvalidConfig(String),
    /// The manifold reduction did not produce a usable result.
    Reduction(String),
    /// A plot could not be drawn or saved.
    Render(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Framework(ref err) => write!(f, "Framework error: {:?}", err),
            Error::Tensor(ref err) => write!(f, "Tensor error: {:?}", err),
            Error::Memory(ref msg) => write!(f, "Memory error: {}", msg),
            Error::Io(ref err) => write!(f, "IO error: {}", err),
            Error::Capnp(ref err) => write!(f, "Cap'n Proto error: {:?}", err),
            Error::Pickle(ref err) => write!(f, "Pickle error: {}", err),
            Error::ShapeMismatch { ref name, ref expected, ref actual } => {
                write!(f, "Shape mismatch for weight '{}': existing shape is {:?}, got {:?}", name, expected, actual)
            }
            Error::MissingWeight(ref name) => write!(f, "Missing weight '{}'", name),
            Error::UnknownLabel(ref label) => write!(f, "Unknown label '{}'", label),
            Error::MissingWordVector(ref label) => write!(f, "No word vector for '{}'", label),
            Error::InvalidConfig(ref msg) => write!(f, "Invalid configuration: {}", msg),
            Error::Reduction(ref msg) => write!(f, "Manifold reduction failed: {}", msg),
            Error::Render(ref msg) => write!(f, "Rendering failed: {}", msg),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            Error::Pickle(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<co::error::Error> for Error {
    fn from(err: co::error::Error) -> Error {
        Error::Framework(err)
    }
}

impl From<co::tensor::Error> for Error {
    fn from(err: co::tensor::Error) -> Error {
        Error::Tensor(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<capnp::Error> for Error {
    fn from(err: capnp::Error) -> Error {
        Error::Capnp(err)
    }
}

impl From<serde_pickle::Error> for Error {
    fn from(err: serde_pickle::Error) -> Error {
        Error::Pickle(err)
    }
}
