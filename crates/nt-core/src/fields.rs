//! Uniform access to the array-valued fields of a [`Kernel`]
//!
//! Layer kernel functions apply the same numeric transform to every
//! covariance array (scaling by a weight variance, adding a bias variance,
//! ...). These helpers visit `nngp`, `ntk`, `cov1` and `cov2` while leaving
//! the structural fields and the masks untouched. Absent fields are skipped
//! and stay absent.

use crate::error::{Error, Result};
use crate::kernel::{Kernel, SharedArray};
use crate::numeric::KernelScalar;
use std::fmt;

/// Array-valued field of a [`Kernel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelField {
    Nngp,
    Ntk,
    Cov1,
    Cov2,
}

impl KernelField {
    /// All array fields in declaration order
    pub const ALL: [KernelField; 4] = [Self::Nngp, Self::Ntk, Self::Cov1, Self::Cov2];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Nngp => "nngp",
            Self::Ntk => "ntk",
            Self::Cov1 => "cov1",
            Self::Cov2 => "cov2",
        }
    }

    /// Leading batch axes of this field under the given batch convention
    pub fn batch_ndim(&self, diagonal_batch: bool) -> usize {
        match self {
            Self::Nngp | Self::Ntk => crate::layout::NNGP_BATCH_NDIM,
            Self::Cov1 | Self::Cov2 => {
                if diagonal_batch {
                    1
                } else {
                    2
                }
            }
        }
    }
}

impl fmt::Display for KernelField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl<T: KernelScalar> Kernel<T> {
    /// The array stored in `field`, if present
    pub fn field(&self, field: KernelField) -> Option<&SharedArray<T>> {
        match field {
            KernelField::Nngp => self.nngp.as_ref(),
            KernelField::Ntk => self.ntk.as_ref(),
            KernelField::Cov1 => Some(&self.cov1),
            KernelField::Cov2 => self.cov2.as_ref(),
        }
    }

    /// Whether `field` holds an array
    pub fn has(&self, field: KernelField) -> bool {
        self.field(field).is_some()
    }

    /// Present array fields with their names
    pub fn arrays(&self) -> impl Iterator<Item = (KernelField, &SharedArray<T>)> + '_ {
        KernelField::ALL
            .into_iter()
            .filter_map(move |field| self.field(field).map(|arr| (field, arr)))
    }

    /// Apply `f` to every present array field.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ndarray::{ArrayD, IxDyn};
    /// use nt_core::Kernel;
    ///
    /// let cov1 = ArrayD::<f64>::ones(IxDyn(&[2, 3, 3])).into_shared();
    /// let kernel = Kernel::builder(cov1, [2, 3, 1]).build();
    ///
    /// // weight variance of 2.0
    /// let scaled = kernel.map_arrays(|_, arr| arr.mapv(|x| 2.0 * x).into_shared());
    /// assert!(scaled.cov1().iter().all(|&x| x == 2.0));
    /// assert!(scaled.nngp().is_none());
    /// ```
    pub fn map_arrays<F>(&self, mut f: F) -> Self
    where
        F: FnMut(KernelField, &SharedArray<T>) -> SharedArray<T>,
    {
        Kernel {
            nngp: self.nngp.as_ref().map(|a| f(KernelField::Nngp, a)),
            ntk: self.ntk.as_ref().map(|a| f(KernelField::Ntk, a)),
            cov1: f(KernelField::Cov1, &self.cov1),
            cov2: self.cov2.as_ref().map(|a| f(KernelField::Cov2, a)),
            ..self.clone()
        }
    }

    /// Fallible variant of [`map_arrays`](Self::map_arrays); the first error
    /// is returned and no kernel is produced.
    pub fn try_map_arrays<F, E>(&self, mut f: F) -> Result<Self>
    where
        F: FnMut(KernelField, &SharedArray<T>) -> std::result::Result<SharedArray<T>, E>,
        E: Into<Error>,
    {
        let mut apply =
            |field: KernelField, arr: &SharedArray<T>| f(field, arr).map_err(Into::into);

        let nngp = self.nngp.as_ref().map(|a| apply(KernelField::Nngp, a)).transpose()?;
        let ntk = self.ntk.as_ref().map(|a| apply(KernelField::Ntk, a)).transpose()?;
        let cov1 = apply(KernelField::Cov1, &self.cov1)?;
        let cov2 = self.cov2.as_ref().map(|a| apply(KernelField::Cov2, a)).transpose()?;

        Ok(self.replace().nngp(nngp).ntk(ntk).cov1(cov1).cov2(cov2).build())
    }
}
