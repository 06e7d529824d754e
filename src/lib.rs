//! Kernel algebra for infinite-width neural network analysis
//!
//! This crate re-exports the workspace crates under one name. See
//! [`nt_core`] for the [`Kernel`] record and its transformations.

pub use nt_core::*;
