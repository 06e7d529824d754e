use crate::error::Result;
use crate::fields::KernelField;
use crate::kernel::{Kernel, SharedArray};
use crate::numeric::KernelScalar;
use crate::utils::{check_permutation, permute};
use log::{debug, trace};

impl<T: KernelScalar> Kernel<T> {
    /// Permute spatial dimensions according to `axes`.
    ///
    /// Follows `numpy.transpose` semantics restricted to spatial dimensions:
    /// dimension `i` of the result is dimension `axes[i]` of `self`. Batch
    /// axes stay leading and are never moved. If `cov1` has shape
    /// `(n1, X, X, Y, Y)` and `axes == [1, 0]`, the result has shape
    /// `(n1, Y, Y, X, X)`. `None` means the identity permutation.
    ///
    /// Fails with [`Error::InvalidPermutation`](crate::Error::InvalidPermutation)
    /// unless `axes` is a permutation of `0..spatial_ndim()`.
    pub fn transpose(&self, axes: Option<&[usize]>) -> Result<Self> {
        let layout = self.layout();
        let identity: Vec<usize> = (0..layout.ndim).collect();
        let axes = axes.unwrap_or(identity.as_slice());
        check_permutation(axes, layout.ndim)?;
        debug!("transposing spatial dims with axes={axes:?}");

        let transpose = |field: KernelField, arr: &SharedArray<T>| -> Result<SharedArray<T>> {
            let batch_ndim = field.batch_ndim(self.diagonal_batch);
            let perm = layout.transpose_permutation(batch_ndim, axes)?;
            trace!("{field}: transpose permutation {perm:?}");
            permute(arr, &perm, field.name())
        };

        let cov1 = transpose(KernelField::Cov1, &self.cov1)?;
        let cov2 = self
            .cov2
            .as_ref()
            .map(|a| transpose(KernelField::Cov2, a))
            .transpose()?;
        let nngp = self
            .nngp
            .as_ref()
            .map(|a| transpose(KernelField::Nngp, a))
            .transpose()?;
        let ntk = self
            .ntk
            .as_ref()
            .map(|a| transpose(KernelField::Ntk, a))
            .transpose()?;

        Ok(self.replace().cov1(cov1).cov2(cov2).nngp(nngp).ntk(ntk).build())
    }
}
