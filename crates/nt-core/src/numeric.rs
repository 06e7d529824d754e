//! Element types accepted by covariance arrays
//!
//! Kernels are generic over their floating point precision. The only numeric
//! capability the shape transformations need is the additive identity, used
//! when masked positions are zeroed out.

use num_traits::Zero;
use std::fmt::Debug;

/// Element type of the covariance arrays stored in a [`Kernel`](crate::Kernel)
///
/// Blanket-implemented for every `Clone + Zero` type that can cross threads,
/// so `f32`, `f64` and complex numbers all qualify.
pub trait KernelScalar: Clone + Zero + Debug + Send + Sync + 'static {
    /// The zero of this numeric type
    #[inline]
    fn zero_value() -> Self {
        <Self as Zero>::zero()
    }
}

impl<T> KernelScalar for T where T: Clone + Zero + Debug + Send + Sync + 'static {}
