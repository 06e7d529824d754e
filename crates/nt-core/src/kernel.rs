//! The `Kernel` record carrying NNGP and NTK covariances between layers
//!
//! A [`Kernel`] is produced by a layer's kernel function and consumed by the
//! next one. It is never mutated: every transformation goes through
//! [`Kernel::replace`], which copies all fields and overrides a subset.
//! Arrays are reference counted, so fields that a transformation does not
//! touch are shared with the source kernel.

use crate::error::{Error, Result};
use crate::layout::Layout;
use crate::numeric::KernelScalar;
use ndarray::{ArcArray, IxDyn};

/// Dynamic-rank, reference counted array used for all kernel fields
pub type SharedArray<T> = ArcArray<T, IxDyn>;

/// Covariance statistics of a layer's outputs for two batches of inputs
///
/// # Array shapes
///
/// - `nngp`, `ntk`: `(n1, n2, H, [H,] W, [W,] ...)`
/// - `cov1`: `(n1, [n1,] H, [H,] W, [W,] ...)`
/// - `cov2`: `(n2, [n2,] H, [H,] W, [W,] ...)`
///
/// Bracketed axes are present only when `diagonal_batch` (for the batch
/// axis) or `diagonal_spatial` (for spatial axes) is `false`. When
/// `is_reversed` is set, spatial dimensions are stored last-to-first.
///
/// # Example
///
/// ```rust
/// use ndarray::{ArrayD, IxDyn};
/// use nt_core::Kernel;
///
/// // 4 images of 8x8 pixels with 3 channels, full spatial covariance
/// let cov1 = ArrayD::<f64>::ones(IxDyn(&[4, 8, 8, 8, 8])).into_shared();
/// let nngp = ArrayD::<f64>::ones(IxDyn(&[4, 4, 8, 8, 8, 8])).into_shared();
///
/// let kernel = Kernel::builder(cov1, [4, 8, 8, 3])
///     .nngp(nngp)
///     .x1_is_x2(true)
///     .build();
///
/// assert_eq!(kernel.spatial_ndim(), 2);
/// assert!(kernel.diagonal_batch());
/// assert!(!kernel.diagonal_spatial());
/// assert!(kernel.ntk().is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Kernel<T> {
    pub(crate) nngp: Option<SharedArray<T>>,
    pub(crate) ntk: Option<SharedArray<T>>,
    pub(crate) cov1: SharedArray<T>,
    pub(crate) cov2: Option<SharedArray<T>>,
    pub(crate) x1_is_x2: bool,

    pub(crate) is_gaussian: bool,
    pub(crate) is_reversed: bool,
    pub(crate) is_input: bool,

    pub(crate) diagonal_batch: bool,
    pub(crate) diagonal_spatial: bool,

    pub(crate) shape1: Vec<usize>,
    pub(crate) shape2: Vec<usize>,

    pub(crate) batch_axis: usize,
    pub(crate) channel_axis: usize,

    pub(crate) mask1: Option<SharedArray<bool>>,
    pub(crate) mask2: Option<SharedArray<bool>>,
}

impl<T: KernelScalar> Kernel<T> {
    /// Start building a kernel from the batch-1 covariance and input shape.
    ///
    /// Defaults: `diagonal_batch = true`, `diagonal_spatial = false`,
    /// `batch_axis = 0`, `channel_axis` the last axis, `shape2 = shape1`,
    /// all flags `false` otherwise and every optional array absent.
    pub fn builder(cov1: SharedArray<T>, shape1: impl Into<Vec<usize>>) -> KernelBuilder<T> {
        let shape1 = shape1.into();
        KernelBuilder {
            inner: Kernel {
                nngp: None,
                ntk: None,
                cov1,
                cov2: None,
                x1_is_x2: false,
                is_gaussian: false,
                is_reversed: false,
                is_input: false,
                diagonal_batch: true,
                diagonal_spatial: false,
                shape2: shape1.clone(),
                batch_axis: 0,
                channel_axis: shape1.len().saturating_sub(1),
                shape1,
                mask1: None,
                mask2: None,
            },
        }
    }

    /// Copy this kernel into a builder to override some of its fields.
    ///
    /// Arrays are shared with `self` until replaced.
    pub fn replace(&self) -> KernelBuilder<T> {
        KernelBuilder {
            inner: self.clone(),
        }
    }

    pub fn nngp(&self) -> Option<&SharedArray<T>> {
        self.nngp.as_ref()
    }

    pub fn ntk(&self) -> Option<&SharedArray<T>> {
        self.ntk.as_ref()
    }

    pub fn cov1(&self) -> &SharedArray<T> {
        &self.cov1
    }

    pub fn cov2(&self) -> Option<&SharedArray<T>> {
        self.cov2.as_ref()
    }

    /// Batch-2 covariance, falling back to `cov1` when `cov2` is absent
    pub fn cov2_or_cov1(&self) -> &SharedArray<T> {
        self.cov2.as_ref().unwrap_or(&self.cov1)
    }

    pub fn x1_is_x2(&self) -> bool {
        self.x1_is_x2
    }

    pub fn is_gaussian(&self) -> bool {
        self.is_gaussian
    }

    pub fn is_reversed(&self) -> bool {
        self.is_reversed
    }

    pub fn is_input(&self) -> bool {
        self.is_input
    }

    pub fn diagonal_batch(&self) -> bool {
        self.diagonal_batch
    }

    pub fn diagonal_spatial(&self) -> bool {
        self.diagonal_spatial
    }

    pub fn shape1(&self) -> &[usize] {
        &self.shape1
    }

    pub fn shape2(&self) -> &[usize] {
        &self.shape2
    }

    pub fn batch_axis(&self) -> usize {
        self.batch_axis
    }

    pub fn channel_axis(&self) -> usize {
        self.channel_axis
    }

    pub fn mask1(&self) -> Option<&SharedArray<bool>> {
        self.mask1.as_ref()
    }

    pub fn mask2(&self) -> Option<&SharedArray<bool>> {
        self.mask2.as_ref()
    }

    /// Number of spatial dimensions: all logical axes except batch and channel
    pub fn spatial_ndim(&self) -> usize {
        self.shape1.len().saturating_sub(2)
    }

    /// Storage layout implied by the structural flags
    pub fn layout(&self) -> Layout {
        Layout::new(
            self.spatial_ndim(),
            self.diagonal_batch,
            self.diagonal_spatial,
            self.is_reversed,
        )
    }

    /// Check that array shapes agree with the structural fields.
    ///
    /// The transformations never call this; it is meant for callers that
    /// construct kernels by hand and want an early, descriptive error.
    pub fn validate(&self) -> Result<()> {
        let rank = self.shape1.len();
        if rank < 2 {
            return Err(Error::InvalidParameter(format!(
                "shape1 {:?} must have batch and channel axes",
                self.shape1
            )));
        }
        if self.shape2.len() != rank {
            return Err(Error::ShapeMismatch(format!(
                "shape1 {:?} and shape2 {:?} have different ranks",
                self.shape1, self.shape2
            )));
        }
        if self.batch_axis >= rank {
            return Err(Error::axis_out_of_range(self.batch_axis, rank, "shape1"));
        }
        if self.channel_axis >= rank {
            return Err(Error::axis_out_of_range(self.channel_axis, rank, "shape1"));
        }
        if self.batch_axis == self.channel_axis {
            return Err(Error::InvalidParameter(format!(
                "batch_axis and channel_axis must differ (both {})",
                self.batch_axis
            )));
        }

        let spatial1 = self.storage_spatial_sizes(&self.shape1);
        let spatial2 = self.storage_spatial_sizes(&self.shape2);
        let n1 = self.shape1[0];
        let n2 = self.shape2[0];

        let cov_batch = if self.diagonal_batch { 1 } else { 2 };
        check_array(
            "cov1",
            self.cov1.shape(),
            &expected_shape(&vec![n1; cov_batch], &spatial1, &spatial1, self.diagonal_spatial),
        )?;
        if let Some(cov2) = &self.cov2 {
            check_array(
                "cov2",
                cov2.shape(),
                &expected_shape(&vec![n2; cov_batch], &spatial2, &spatial2, self.diagonal_spatial),
            )?;
        }

        if self.diagonal_spatial && spatial1 != spatial2 {
            return Err(Error::ShapeMismatch(format!(
                "diagonal spatial covariance needs equal spatial sizes, \
                 got {spatial1:?} and {spatial2:?}"
            )));
        }
        let cross = expected_shape(&[n1, n2], &spatial1, &spatial2, self.diagonal_spatial);
        if let Some(nngp) = &self.nngp {
            check_array("nngp", nngp.shape(), &cross)?;
        }
        if let Some(ntk) = &self.ntk {
            check_array("ntk", ntk.shape(), &cross)?;
        }

        if let Some(mask1) = &self.mask1 {
            check_mask("mask1", mask1.shape(), &self.shape1)?;
        }
        if let Some(mask2) = &self.mask2 {
            check_mask("mask2", mask2.shape(), &self.shape2)?;
        }
        Ok(())
    }

    /// Spatial sizes of `shape` in the order they are stored
    fn storage_spatial_sizes(&self, shape: &[usize]) -> Vec<usize> {
        let mut sizes: Vec<usize> = shape
            .iter()
            .enumerate()
            .filter(|&(axis, _)| axis != self.batch_axis && axis != self.channel_axis)
            .map(|(_, &size)| size)
            .collect();
        if self.is_reversed {
            sizes.reverse();
        }
        sizes
    }
}

fn expected_shape(
    batch: &[usize],
    left: &[usize],
    right: &[usize],
    diagonal_spatial: bool,
) -> Vec<usize> {
    let mut shape = batch.to_vec();
    for (&l, &r) in left.iter().zip(right) {
        if diagonal_spatial {
            shape.push(l);
        } else {
            shape.extend([l, r]);
        }
    }
    shape
}

fn check_array(name: &str, actual: &[usize], expected: &[usize]) -> Result<()> {
    if actual != expected {
        return Err(Error::ShapeMismatch(format!(
            "{name} has shape {actual:?}, expected {expected:?}"
        )));
    }
    Ok(())
}

fn check_mask(name: &str, mask: &[usize], shape: &[usize]) -> Result<()> {
    let compatible = mask.len() == shape.len()
        && mask.iter().zip(shape).all(|(&m, &s)| m == s || m == 1);
    if !compatible {
        return Err(Error::not_broadcastable(mask, shape, name));
    }
    Ok(())
}

/// Builder for [`Kernel`], used both for construction and for
/// "copy with overrides" through [`Kernel::replace`].
#[derive(Debug, Clone)]
pub struct KernelBuilder<T> {
    inner: Kernel<T>,
}

impl<T: KernelScalar> KernelBuilder<T> {
    pub fn nngp(mut self, nngp: impl Into<Option<SharedArray<T>>>) -> Self {
        self.inner.nngp = nngp.into();
        self
    }

    pub fn ntk(mut self, ntk: impl Into<Option<SharedArray<T>>>) -> Self {
        self.inner.ntk = ntk.into();
        self
    }

    pub fn cov1(mut self, cov1: SharedArray<T>) -> Self {
        self.inner.cov1 = cov1;
        self
    }

    pub fn cov2(mut self, cov2: impl Into<Option<SharedArray<T>>>) -> Self {
        self.inner.cov2 = cov2.into();
        self
    }

    pub fn x1_is_x2(mut self, x1_is_x2: bool) -> Self {
        self.inner.x1_is_x2 = x1_is_x2;
        self
    }

    pub fn is_gaussian(mut self, is_gaussian: bool) -> Self {
        self.inner.is_gaussian = is_gaussian;
        self
    }

    pub fn is_reversed(mut self, is_reversed: bool) -> Self {
        self.inner.is_reversed = is_reversed;
        self
    }

    pub fn is_input(mut self, is_input: bool) -> Self {
        self.inner.is_input = is_input;
        self
    }

    pub fn diagonal_batch(mut self, diagonal_batch: bool) -> Self {
        self.inner.diagonal_batch = diagonal_batch;
        self
    }

    pub fn diagonal_spatial(mut self, diagonal_spatial: bool) -> Self {
        self.inner.diagonal_spatial = diagonal_spatial;
        self
    }

    pub fn shape1(mut self, shape1: impl Into<Vec<usize>>) -> Self {
        self.inner.shape1 = shape1.into();
        self
    }

    pub fn shape2(mut self, shape2: impl Into<Vec<usize>>) -> Self {
        self.inner.shape2 = shape2.into();
        self
    }

    pub fn batch_axis(mut self, batch_axis: usize) -> Self {
        self.inner.batch_axis = batch_axis;
        self
    }

    pub fn channel_axis(mut self, channel_axis: usize) -> Self {
        self.inner.channel_axis = channel_axis;
        self
    }

    pub fn mask1(mut self, mask1: impl Into<Option<SharedArray<bool>>>) -> Self {
        self.inner.mask1 = mask1.into();
        self
    }

    pub fn mask2(mut self, mask2: impl Into<Option<SharedArray<bool>>>) -> Self {
        self.inner.mask2 = mask2.into();
        self
    }

    /// Finish the kernel. Shapes are not checked; see [`Kernel::validate`].
    pub fn build(self) -> Kernel<T> {
        self.inner
    }
}
