//! Per-pixel trail compositing.
//!
//! [`ops`] holds the element-wise kernels; [`trail`] holds the stateful [`Compositor`].

pub mod ops;
pub mod trail;

pub use trail::{Compositor, TrailMode, WeightTable};
