//! Covariance kernels for infinite-width neural networks
//!
//! This crate provides the [`Kernel`] record that carries NNGP and NTK
//! covariances from one layer of an infinite-width network to the next,
//! together with the shape transformations layers apply to it.
//!
//! # Storage conventions
//!
//! Every covariance array starts with its batch axes followed by spatial
//! axes. Three structural flags select the exact layout (see [`Layout`]):
//!
//! - **diagonal batch**: `cov1`/`cov2` store only per-sample variances
//! - **diagonal spatial**: only matching locations are stored, one axis per
//!   spatial dimension instead of a location-location pair
//! - **reversed**: spatial dimensions are stored last-to-first
//!
//! # Operations
//!
//! - [`Kernel::slice`]: select sub-batches
//! - [`Kernel::reverse`]: reverse the spatial dimension order
//! - [`Kernel::transpose`]: permute spatial dimensions
//! - [`Kernel::mask`]: zero out covariances of masked input positions
//! - [`Kernel::map_arrays`]: apply a transform to every covariance array
//!
//! All operations borrow the kernel and return a new one; unchanged arrays
//! are shared between the two.
//!
//! # Example
//!
//! ```rust
//! use ndarray::{ArrayD, IxDyn};
//! use nt_core::{Kernel, Result};
//!
//! fn main() -> Result<()> {
//!     let cov1 = ArrayD::<f64>::ones(IxDyn(&[4, 8, 8, 8, 8])).into_shared();
//!     let nngp = ArrayD::<f64>::ones(IxDyn(&[4, 4, 8, 8, 8, 8])).into_shared();
//!     let kernel = Kernel::builder(cov1, [4, 8, 8, 3]).nngp(nngp).build();
//!
//!     let kernel = kernel.reverse()?.slice(0..2, 0..2)?;
//!     assert!(kernel.is_reversed());
//!     assert_eq!(kernel.shape1(), &[2, 8, 8, 3]);
//!
//!     // mask the last image row of every sample
//!     let mask = ArrayD::from_shape_fn(IxDyn(&[2, 8, 1, 1]), |idx| idx[1] == 7);
//!     let masked = kernel.mask(Some(mask.into_shared()), None)?;
//!     assert!(masked.mask1().is_some());
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `parallel`: parallel masking through rayon
//! - `serde`: `Serialize`/`Deserialize` for [`Kernel`]

pub mod error;
pub mod fields;
pub mod kernel;
pub mod layout;
pub mod numeric;
mod ops;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

// Re-export core types
pub use error::{Error, Result};
pub use fields::KernelField;
pub use kernel::{Kernel, KernelBuilder, SharedArray};
pub use layout::{Layout, NNGP_BATCH_NDIM};
pub use numeric::KernelScalar;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Error, Kernel, KernelBuilder, KernelField, KernelScalar, Layout, Result, SharedArray,
    };
}
