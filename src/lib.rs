//! Lamina provides visual-semantic embedding networks on top of the backend-agnostic
//! computation framework [Collenchyma][collenchyma], together with the tooling needed to
//! inspect what such a network has learned.
//!
//! ## Architecture
//!
//! A network is a [Sequential][sequential] container of [layers][layers]. Every layer
//! describes a small unit of computation over an NCHW (or `[batch, features]`) tensor and
//! declares the trainable weights it needs. Weights are never owned by a layer: they live
//! in a [ParameterStore][weight], keyed by `<layer>/<weight>`, and a layer asking for a name
//! that is already known receives the very same tensor. This is how two networks built on
//! one store share their parameters, and how checkpoints are restored into a freshly
//! constructed network.
//!
//! On top of the layers, the [models][models] module builds the fixed topologies:
//!
//! * AlexNet, VGG11 and VGG19 image classifiers,
//! * the composite visual-semantic model, which projects the penultimate image features of
//!   a backbone into a word-vector space,
//! * the reverse model, decoding a word vector back into an image.
//!
//! The [visualize][visualize] module runs a trained composite model over held-out data,
//! reduces all embeddings and label anchors to 2D with [t-SNE][manifold] and renders one
//! scatter plot per class.
//!
//! [collenchyma]: https://github.com/autumnai/collenchyma
//! [sequential]: ./layers/common/sequential/index.html
//! [layers]: ./layers/index.html
//! [weight]: ./weight/struct.ParameterStore.html
//! [models]: ./models/index.html
//! [visualize]: ./visualize/index.html
//! [manifold]: ./manifold/index.html
//!
//! ## Examples
//!
//! ```
//! # extern crate lamina;
//! # use lamina::models::{CompositeConfig, BackboneKind};
//! # fn main() {
//! let config = CompositeConfig { backbone: BackboneKind::AlexNet, ..CompositeConfig::default() };
//! assert_eq!(200, config.word2vec_size);
//! # }
//! ```
#![cfg_attr(lint, feature(plugin))]
#![cfg_attr(lint, plugin(clippy))]
#![deny(unsafe_code,
        unused_import_braces)]
#![warn(missing_docs,
        missing_debug_implementations,
        trivial_casts, trivial_numeric_casts)]

#[macro_use]
extern crate log;
extern crate rand;
extern crate capnp;
extern crate serde_pickle;
extern crate plotters;
extern crate collenchyma as co;
extern crate collenchyma_blas as coblas;
extern crate collenchyma_nn as conn;

pub mod error;
pub mod util;
pub mod weight;
pub mod layer;
pub mod layers;
pub mod models;
pub mod data;
pub mod word_vectors;
pub mod manifold;
pub mod evaluation;
pub mod visualize;

mod capnp_util;

#[allow(missing_docs, unused_qualifications, trivial_numeric_casts)]
mod lamina_capnp {
    include!(concat!(env!("OUT_DIR"), "/lamina_capnp.rs"));
}

pub use capnp_util::TensorRecord;
pub use error::Error;
