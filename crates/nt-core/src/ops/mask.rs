use crate::error::{Error, Result};
use crate::kernel::{Kernel, SharedArray};
use crate::layout::NNGP_BATCH_NDIM;
use crate::numeric::KernelScalar;
use crate::utils::outer_prod;
use log::{debug, trace};
use ndarray::{ArrayD, ArrayViewD, Axis, Zip};

/// Position-pair masks for `cov1`, `nngp`/`ntk` and `cov2`
struct MaskProducts {
    m11: Option<ArrayD<bool>>,
    m12: Option<ArrayD<bool>>,
    m22: Option<ArrayD<bool>>,
}

impl<T: KernelScalar> Kernel<T> {
    /// Zero out all covariance entries involving a masked input position.
    ///
    /// `mask1` and `mask2` have the logical layout of `shape1` and `shape2`
    /// (same rank, every axis either full size or 1) with `true` marking a
    /// masked position. An entry of a covariance array is zeroed if either of
    /// the two positions it relates is masked. The new masks replace any
    /// previous ones; `None` means no masking on that side.
    ///
    /// Masks must be constant along the channel axis: a mask whose channel
    /// axis has size other than 1 is rejected with
    /// [`Error::NotSupported`](crate::Error::NotSupported).
    ///
    /// When `mask2` is `None`, `cov2` is masked with the `mask1` product.
    pub fn mask(
        &self,
        mask1: Option<SharedArray<bool>>,
        mask2: Option<SharedArray<bool>>,
    ) -> Result<Self> {
        debug!(
            "masking kernel (mask1={:?}, mask2={:?})",
            mask1.as_ref().map(|m| m.shape()),
            mask2.as_ref().map(|m| m.shape())
        );
        let MaskProducts { m11, m12, m22 } = self.mask_prods(mask1.as_ref(), mask2.as_ref())?;

        let cov1 = zero_masked(&self.cov1, m11.as_ref(), "cov1")?;
        let cov2 = self
            .cov2
            .as_ref()
            .map(|a| zero_masked(a, m22.as_ref(), "cov2"))
            .transpose()?;
        let nngp = self
            .nngp
            .as_ref()
            .map(|a| zero_masked(a, m12.as_ref(), "nngp"))
            .transpose()?;
        let ntk = self
            .ntk
            .as_ref()
            .map(|a| zero_masked(a, m12.as_ref(), "ntk"))
            .transpose()?;

        Ok(self
            .replace()
            .cov1(cov1)
            .cov2(cov2)
            .nngp(nngp)
            .ntk(ntk)
            .mask1(mask1)
            .mask2(mask2)
            .build())
    }

    fn mask_prods(
        &self,
        mask1: Option<&SharedArray<bool>>,
        mask2: Option<&SharedArray<bool>>,
    ) -> Result<MaskProducts> {
        let cov_batch_ndim = self.layout().cov_batch_ndim();
        let m1 = mask1.map(|m| self.canonical_mask(m)).transpose()?;
        let m2 = mask2.map(|m| self.canonical_mask(m)).transpose()?;

        let m11 = self.mask_prod(m1.as_ref(), m1.as_ref(), cov_batch_ndim)?;
        let m22 = if m2.is_some() {
            self.mask_prod(m2.as_ref(), m2.as_ref(), cov_batch_ndim)?
        } else {
            m11.clone()
        };
        let m12 = self.mask_prod(m1.as_ref(), m2.as_ref(), NNGP_BATCH_NDIM)?;
        Ok(MaskProducts { m11, m12, m22 })
    }

    /// Drop the channel axis and move the batch axis first, giving a
    /// `(batch, spatial...)` view with spatial axes in storage order.
    fn canonical_mask<'a>(&self, mask: &'a SharedArray<bool>) -> Result<ArrayViewD<'a, bool>> {
        let order = self
            .layout()
            .canonical_mask_order(mask.ndim(), self.batch_axis, self.channel_axis)?;
        if mask.len_of(Axis(self.channel_axis)) != 1 {
            return Err(Error::channel_wise_mask(mask.shape()));
        }
        Ok(mask
            .view()
            .index_axis_move(Axis(self.channel_axis), 0)
            .permuted_axes(order.as_slice()))
    }

    fn mask_prod<'a>(
        &self,
        m1: Option<&ArrayViewD<'a, bool>>,
        m2: Option<&ArrayViewD<'a, bool>>,
        batch_ndim: usize,
    ) -> Result<Option<ArrayD<bool>>> {
        let Some(rank) = m1.or(m2).map(|m| m.ndim()) else {
            return Ok(None);
        };
        let (start, end) = self.layout().mask_outer_range(batch_ndim, rank);
        let prod = outer_prod(m1.cloned(), m2.cloned(), start, end, |a, b| *a || *b)?;
        trace!(
            "mask product over axes [{start}, {end}) with shape {:?}",
            prod.as_ref().map(|p| p.shape())
        );
        Ok(prod)
    }
}

/// Replace entries of `arr` where `mask` is `true` by zero.
fn zero_masked<T: KernelScalar>(
    arr: &SharedArray<T>,
    mask: Option<&ArrayD<bool>>,
    name: &str,
) -> Result<SharedArray<T>> {
    let Some(mask) = mask else {
        return Ok(arr.clone());
    };
    let mask = mask
        .broadcast(arr.shape())
        .ok_or_else(|| Error::not_broadcastable(mask.shape(), arr.shape(), name))?;

    let zip = Zip::from(arr).and(&mask);
    let select = |x: &T, &masked: &bool| if masked { T::zero_value() } else { x.clone() };
    #[cfg(feature = "parallel")]
    let out = zip.par_map_collect(select);
    #[cfg(not(feature = "parallel"))]
    let out = zip.map_collect(select);
    Ok(out.into_shared())
}
