//! Element-wise activation layers; the output has the shape of the input.
pub use self::relu::ReLU;

pub mod relu;
