//! Error types for kernel transformations
//!
//! Every failure in this crate is a precondition violation raised by the
//! caller; none of them are recoverable by retrying.

use thiserror::Error;

/// Core error type for kernel operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid parameter provided to a function
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Spatial axes passed to `transpose` are not a permutation
    #[error("Invalid permutation: {axes:?} is not a permutation of 0..{ndim}")]
    InvalidPermutation { axes: Vec<usize>, ndim: usize },

    /// Array shapes disagree with each other or with the kernel layout
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Requested behavior is not supported for infinite-width layers
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// Error reported by `ndarray`
    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// Other errors, typically from caller supplied transforms
    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error for an axis that does not exist in an array of `rank`
    pub fn axis_out_of_range(axis: usize, rank: usize, context: &str) -> Self {
        Self::InvalidParameter(format!(
            "Axis {axis} out of range for {context} of rank {rank}"
        ))
    }

    /// Create an error for arrays that cannot be broadcast together
    pub fn not_broadcastable(from: &[usize], to: &[usize], context: &str) -> Self {
        Self::ShapeMismatch(format!(
            "cannot broadcast {context} of shape {from:?} to {to:?}"
        ))
    }

    /// Create an error for masks that vary along the channel axis
    pub fn channel_wise_mask(shape: &[usize]) -> Self {
        Self::NotSupported(format!(
            "Different channel-wise masks are not supported for infinite-width \
             layers (got `mask.shape == {shape:?}`)"
        ))
    }
}
