//! Axis arithmetic for the storage layouts of covariance arrays
//!
//! A covariance array stores some leading batch axes followed by its spatial
//! axes. How many of each there are depends on three structural flags of a
//! [`Kernel`](crate::Kernel):
//!
//! - `diagonal_batch`: `cov1`/`cov2` carry one batch axis (`true`) or a
//!   sample-sample pair (`false`). `nngp`/`ntk` always carry two.
//! - `diagonal_spatial`: each spatial dimension is one axis (`true`) or an
//!   adjacent location-location pair (`false`).
//! - `is_reversed`: spatial dimensions are stored last-to-first.
//!
//! All functions here are pure functions of a [`Layout`], so every variant
//! can be tested without building arrays.

use crate::error::{Error, Result};
use crate::utils::check_permutation;

/// Number of leading batch axes in `nngp` and `ntk`
pub const NNGP_BATCH_NDIM: usize = 2;

/// Structural description of how a kernel lays out its arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Layout {
    /// Number of logical spatial dimensions
    pub ndim: usize,
    pub diagonal_batch: bool,
    pub diagonal_spatial: bool,
    pub is_reversed: bool,
}

impl Layout {
    pub fn new(
        ndim: usize,
        diagonal_batch: bool,
        diagonal_spatial: bool,
        is_reversed: bool,
    ) -> Self {
        Self {
            ndim,
            diagonal_batch,
            diagonal_spatial,
            is_reversed,
        }
    }

    /// Leading batch axes of `cov1` and `cov2`
    #[inline]
    pub fn cov_batch_ndim(&self) -> usize {
        if self.diagonal_batch {
            1
        } else {
            2
        }
    }

    /// Storage axes occupied by one logical spatial dimension
    #[inline]
    pub fn axes_per_spatial_dim(&self) -> usize {
        if self.diagonal_spatial {
            1
        } else {
            2
        }
    }

    /// Total number of spatial storage axes
    #[inline]
    pub fn spatial_storage_ndim(&self) -> usize {
        self.ndim * self.axes_per_spatial_dim()
    }

    /// Rank of an array with `batch_ndim` leading axes in this layout
    #[inline]
    pub fn storage_ndim(&self, batch_ndim: usize) -> usize {
        batch_ndim + self.spatial_storage_ndim()
    }

    /// Storage axes backing logical spatial dimension `dim`
    pub fn spatial_storage_axes(&self, batch_ndim: usize, dim: usize) -> std::ops::Range<usize> {
        let per = self.axes_per_spatial_dim();
        let first = batch_ndim + dim * per;
        first..first + per
    }

    /// Axis permutation reversing the spatial dimension order of an array of
    /// the given `rank`.
    ///
    /// Spatial axes are counted from the end, so the same permutation logic
    /// applies regardless of how many batch axes lead. Paired axes move as a
    /// unit and keep their internal order: `(N, H, H', W, W')` becomes
    /// `(N, W, W', H, H')`.
    pub fn reverse_permutation(&self, rank: usize) -> Result<Vec<usize>> {
        let batch_ndim = self.leading_ndim(rank)?;
        let mut perm: Vec<usize> = (0..batch_ndim).collect();
        for dim in (0..self.ndim).rev() {
            perm.extend(self.spatial_storage_axes(batch_ndim, dim));
        }
        Ok(perm)
    }

    /// Axis permutation applying the spatial permutation `axes` to an array
    /// with `batch_ndim` leading axes.
    ///
    /// Leading axes are never moved. In the full spatial layout each entry
    /// of `axes` expands to its two storage axes.
    pub fn transpose_permutation(&self, batch_ndim: usize, axes: &[usize]) -> Result<Vec<usize>> {
        check_permutation(axes, self.ndim)?;
        let mut perm: Vec<usize> = (0..batch_ndim).collect();
        for &dim in axes {
            perm.extend(self.spatial_storage_axes(batch_ndim, dim));
        }
        Ok(perm)
    }

    /// Axis range `[start, end)` of a canonical mask over which the outer
    /// product of two masks is taken.
    ///
    /// `start` skips the batch axis when batch covariances are diagonal.
    /// With diagonal spatial storage only the batch axis is expanded and
    /// spatial positions are combined elementwise.
    pub fn mask_outer_range(&self, batch_ndim: usize, mask_rank: usize) -> (usize, usize) {
        let start = NNGP_BATCH_NDIM.saturating_sub(batch_ndim);
        let end = if self.diagonal_spatial { 1 } else { mask_rank };
        (start, end.max(start))
    }

    /// Axis order turning a mask with its channel axis already removed into
    /// canonical `(batch, spatial...)` storage order.
    ///
    /// `batch_axis` and `channel_axis` index the logical mask before the
    /// channel axis is dropped.
    pub fn canonical_mask_order(
        &self,
        mask_rank: usize,
        batch_axis: usize,
        channel_axis: usize,
    ) -> Result<Vec<usize>> {
        if batch_axis >= mask_rank {
            return Err(Error::axis_out_of_range(batch_axis, mask_rank, "mask"));
        }
        if channel_axis >= mask_rank {
            return Err(Error::axis_out_of_range(channel_axis, mask_rank, "mask"));
        }
        if batch_axis == channel_axis {
            return Err(Error::InvalidParameter(format!(
                "batch_axis and channel_axis must differ (both {batch_axis})"
            )));
        }

        let batch = if batch_axis > channel_axis {
            batch_axis - 1
        } else {
            batch_axis
        };
        let mut spatial: Vec<usize> = (0..mask_rank - 1).filter(|&a| a != batch).collect();
        if self.is_reversed {
            spatial.reverse();
        }

        let mut order = Vec::with_capacity(mask_rank - 1);
        order.push(batch);
        order.extend(spatial);
        Ok(order)
    }

    fn leading_ndim(&self, rank: usize) -> Result<usize> {
        rank.checked_sub(self.spatial_storage_ndim()).ok_or_else(|| {
            Error::ShapeMismatch(format!(
                "array of rank {rank} cannot hold {} spatial storage axes",
                self.spatial_storage_ndim()
            ))
        })
    }
}
