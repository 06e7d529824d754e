use crate::error::Result;
use crate::kernel::{Kernel, SharedArray};
use crate::numeric::KernelScalar;
use crate::utils::permute;
use log::{debug, trace};

impl<T: KernelScalar> Kernel<T> {
    /// Reverse the order of spatial dimensions in all covariance arrays.
    ///
    /// If `nngp` has shape `(n1, n2, H, H, W, W, D, D)`, the result has
    /// shape `(n1, n2, D, D, W, W, H, H)`: location pairs move together and
    /// keep their internal order. `is_reversed` is toggled, so reversing
    /// twice gives back the original kernel.
    pub fn reverse(&self) -> Result<Self> {
        let layout = self.layout();
        debug!(
            "reversing {} spatial dims (diagonal_spatial={}, is_reversed={})",
            layout.ndim, layout.diagonal_spatial, layout.is_reversed
        );

        let reverse = |arr: &SharedArray<T>, name: &str| -> Result<SharedArray<T>> {
            let perm = layout.reverse_permutation(arr.ndim())?;
            trace!("{name}: reverse permutation {perm:?}");
            permute(arr, &perm, name)
        };

        let cov1 = reverse(&self.cov1, "cov1")?;
        let cov2 = self.cov2.as_ref().map(|a| reverse(a, "cov2")).transpose()?;
        let nngp = self.nngp.as_ref().map(|a| reverse(a, "nngp")).transpose()?;
        let ntk = self.ntk.as_ref().map(|a| reverse(a, "ntk")).transpose()?;

        Ok(self
            .replace()
            .cov1(cov1)
            .cov2(cov2)
            .nngp(nngp)
            .ntk(ntk)
            .is_reversed(!self.is_reversed)
            .build())
    }
}

#[cfg(test)]
mod tests {
    use crate::layout::Layout;
    use crate::testing::{all_layouts, arange_kernel};

    #[test]
    fn test_reverse_is_self_inverse_for_all_layouts() {
        for layout in all_layouts(3) {
            let kernel = arange_kernel(2, 3, &[2, 3, 4], layout);
            let twice = kernel.reverse().unwrap().reverse().unwrap();
            assert_eq!(twice, kernel, "{layout:?}");
        }
    }

    #[test]
    fn test_reverse_toggles_flag_only() {
        let kernel = arange_kernel(2, 2, &[3, 4], Layout::new(2, true, false, false))
            .replace()
            .is_gaussian(true)
            .build();
        let reversed = kernel.reverse().unwrap();

        assert!(reversed.is_reversed());
        assert!(reversed.is_gaussian());
        assert_eq!(reversed.shape1(), kernel.shape1());
        assert_eq!(reversed.shape2(), kernel.shape2());
        assert_eq!(reversed.mask1(), kernel.mask1());
    }

    #[test]
    fn test_reverse_moves_pairs_as_units() {
        let kernel = arange_kernel(2, 2, &[3, 4], Layout::new(2, true, false, false));
        let reversed = kernel.reverse().unwrap();

        let nngp = kernel.nngp().unwrap();
        let rev = reversed.nngp().unwrap();
        assert_eq!(rev.shape(), &[2, 2, 4, 4, 3, 3]);
        // (n1, n2, h, h', w, w') -> (n1, n2, w, w', h, h')
        assert_eq!(rev[[1, 0, 3, 2, 0, 2]], nngp[[1, 0, 0, 2, 3, 2]]);
        assert_eq!(rev[[0, 1, 1, 0, 2, 1]], nngp[[0, 1, 2, 1, 1, 0]]);

        let cov1 = kernel.cov1();
        let rev_cov1 = reversed.cov1();
        assert_eq!(rev_cov1.shape(), &[2, 4, 4, 3, 3]);
        assert_eq!(rev_cov1[[1, 3, 0, 1, 2]], cov1[[1, 1, 2, 3, 0]]);
    }

    #[test]
    fn test_reverse_full_batch() {
        let kernel = arange_kernel(2, 3, &[2, 5], Layout::new(2, false, false, false));
        let reversed = kernel.reverse().unwrap();
        assert_eq!(reversed.cov1().shape(), &[2, 2, 5, 5, 2, 2]);
        assert_eq!(reversed.cov2().unwrap().shape(), &[3, 3, 5, 5, 2, 2]);
        assert_eq!(
            reversed.cov2().unwrap()[[2, 1, 4, 3, 0, 1]],
            kernel.cov2().unwrap()[[2, 1, 0, 1, 4, 3]]
        );
    }

    #[test]
    fn test_reverse_diagonal_spatial() {
        let kernel = arange_kernel(2, 2, &[3, 4, 5], Layout::new(3, true, true, false));
        let reversed = kernel.reverse().unwrap();
        assert_eq!(reversed.nngp().unwrap().shape(), &[2, 2, 5, 4, 3]);
        assert_eq!(
            reversed.cov1()[[1, 4, 0, 2]],
            kernel.cov1()[[1, 2, 0, 4]]
        );
    }

    #[test]
    fn test_reverse_absent_fields_stay_absent() {
        let kernel = arange_kernel(2, 2, &[3], Layout::new(1, true, false, false))
            .replace()
            .ntk(None)
            .cov2(None)
            .build();
        let reversed = kernel.reverse().unwrap();
        assert!(reversed.ntk().is_none());
        assert!(reversed.cov2().is_none());
    }

    #[test]
    fn test_reverse_rank_mismatch_is_an_error() {
        // claims three spatial dims but stores one
        let kernel = arange_kernel(2, 2, &[3], Layout::new(1, true, false, false))
            .replace()
            .shape1([2, 3, 3, 3, 3])
            .build();
        assert!(kernel.reverse().is_err());
    }
}
