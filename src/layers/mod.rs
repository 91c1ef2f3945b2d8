//! Provides the fundamental units of computation for the [models][1].
//! [1]: ../models/index.html
//!
//! Every layer works on host tensors of the native backend. Spatial layers expect
//! NCHW input; the others treat everything after the batch dimension as one sample.
//! The layers fall into three groups:
//!
//! * [__Activation__][mod_activation]</br>
//! Element-wise nonlinear [activation functions][2]. Only ReLU is needed here.
//!
//! * [__Common__][mod_common]</br>
//! The layers image networks are made of: convolution (optionally grouped),
//! linear, pooling, local response normalization and dropout, plus the
//! Sequential container.
//!
//! * [__Utility__][mod_utility]</br>
//! Per-image standardization and the layers that only restructure a tensor
//! (Flatten, Reshape).
//!
//! For more information about how these layers work together, see the
//! documentation for the general [Layer module][3].
//!
//! [2]: https://en.wikipedia.org/wiki/Activation_function
//! [3]: ../layer/index.html
//!
//! [mod_activation]: ./activation/index.html
//! [mod_common]: ./common/index.html
//! [mod_utility]: ./utility/index.html

#[allow(unused_import_braces)]
pub use self::activation::{
    ReLU,
};

#[allow(unused_import_braces)]
pub use self::common::{
    Convolution, ConvolutionConfig,
    Dropout, DropoutConfig,
    Linear, LinearConfig,
    LRN, LRNConfig,
    Padding,
    Pooling, PoolingConfig, PoolingMode,
    Sequential, SequentialConfig,
};

#[allow(unused_import_braces)]
pub use self::utility::{
    Flatten,
    Reshape, ReshapeConfig,
    Standardize,
};

pub mod activation;
pub mod common;
pub mod utility;
