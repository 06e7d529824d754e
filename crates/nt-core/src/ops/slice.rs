use crate::error::Result;
use crate::kernel::{Kernel, SharedArray};
use crate::numeric::KernelScalar;
use crate::utils::slice_along;
use log::debug;
use ndarray::{Axis, Slice};

impl<T: KernelScalar> Kernel<T> {
    /// Select sub-batches `n1` of the first and `n2` of the second input.
    ///
    /// `cov1` is sliced with `n1`; `cov2` with `n2`, taken from `cov1` when
    /// `cov2` is absent (both batches were the same inputs). `nngp` and
    /// `ntk` are sliced with `n1` along axis 0 and `n2` along axis 1, the
    /// masks along `batch_axis`. The leading entries of `shape1`/`shape2`
    /// become the selected lengths.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ndarray::{ArrayD, IxDyn, Slice};
    /// use nt_core::Kernel;
    ///
    /// let cov1 = ArrayD::<f64>::zeros(IxDyn(&[4, 5, 5])).into_shared();
    /// let nngp = ArrayD::<f64>::zeros(IxDyn(&[4, 4, 5, 5])).into_shared();
    /// let kernel = Kernel::builder(cov1, [4, 5, 2]).nngp(nngp).build();
    ///
    /// let sub = kernel.slice(0..2, Slice::new(0, None, 2)).unwrap();
    /// assert_eq!(sub.shape1(), &[2, 5, 2]);
    /// assert_eq!(sub.nngp().unwrap().shape(), &[2, 2, 5, 5]);
    /// assert_eq!(sub.cov2().unwrap().shape(), &[2, 5, 5]);
    /// ```
    pub fn slice(&self, n1: impl Into<Slice>, n2: impl Into<Slice>) -> Result<Self> {
        let (n1, n2) = (n1.into(), n2.into());
        debug!("slicing kernel with n1={n1:?}, n2={n2:?}");

        let cov1 = slice_along(&self.cov1, 0, n1, "cov1")?;
        let cov2 = slice_along(self.cov2_or_cov1(), 0, n2, "cov2")?;

        let cross = |arr: &SharedArray<T>, name: &str| -> Result<SharedArray<T>> {
            let arr = slice_along(arr, 0, n1, name)?;
            slice_along(&arr, 1, n2, name)
        };
        let nngp = self.nngp.as_ref().map(|a| cross(a, "nngp")).transpose()?;
        let ntk = self.ntk.as_ref().map(|a| cross(a, "ntk")).transpose()?;

        let mask1 = self
            .mask1
            .as_ref()
            .map(|m| self.slice_mask(m, n1, "mask1"))
            .transpose()?;
        let mask2 = self
            .mask2
            .as_ref()
            .map(|m| self.slice_mask(m, n2, "mask2"))
            .transpose()?;

        let shape1 = with_batch_size(&self.shape1, cov1.len_of(Axis(0)));
        let shape2 = with_batch_size(&self.shape2, cov2.len_of(Axis(0)));

        Ok(self
            .replace()
            .cov1(cov1)
            .cov2(cov2)
            .nngp(nngp)
            .ntk(ntk)
            .shape1(shape1)
            .shape2(shape2)
            .mask1(mask1)
            .mask2(mask2)
            .build())
    }

    // A mask with a singleton batch axis is shared by all samples and is
    // kept as is.
    fn slice_mask(
        &self,
        mask: &SharedArray<bool>,
        n: Slice,
        name: &str,
    ) -> Result<SharedArray<bool>> {
        if mask.shape().get(self.batch_axis) == Some(&1) {
            return Ok(mask.clone());
        }
        slice_along(mask, self.batch_axis, n, name)
    }
}

fn with_batch_size(shape: &[usize], size: usize) -> Vec<usize> {
    let mut shape = shape.to_vec();
    if let Some(first) = shape.first_mut() {
        *first = size;
    }
    shape
}
