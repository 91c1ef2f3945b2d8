//! Layers without weights that prepare a tensor for the next layer.
//!
//! [Standardize][1] normalizes the values of every image; Flatten and Reshape only
//! change the shape and copy the values unchanged.
//!
//! [1]: ./standardize/index.html
pub use self::flatten::Flatten;
pub use self::reshape::{Reshape, ReshapeConfig};
pub use self::standardize::Standardize;

pub mod flatten;
pub mod reshape;
pub mod standardize;
