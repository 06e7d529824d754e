//! End-to-end scenario: a batch of 8x8 RGB images flowing through the
//! kernel transformations a CNN stack applies between layers.

use ndarray::{ArrayD, Axis, IxDyn};
use nt_kernels::prelude::*;

fn arange(shape: &[usize]) -> SharedArray<f64> {
    let len = shape.iter().product();
    ArrayD::from_shape_vec(IxDyn(shape), (0..len).map(|i| i as f64).collect())
        .unwrap()
        .into_shared()
}

fn image_kernel() -> Kernel<f64> {
    Kernel::builder(arange(&[4, 8, 8, 8, 8]), [4, 8, 8, 3])
        .shape2([4, 8, 8, 3])
        .nngp(arange(&[4, 4, 8, 8, 8, 8]))
        .x1_is_x2(true)
        .diagonal_batch(true)
        .diagonal_spatial(false)
        .build()
}

#[test]
fn test_reverse_then_slice() -> anyhow::Result<()> {
    let kernel = image_kernel();
    kernel.validate()?;

    let reversed = kernel.reverse()?;
    assert!(reversed.is_reversed());

    // trailing axes (h, h', w, w') become (w, w', h, h')
    let nngp = kernel.nngp().unwrap();
    let rev = reversed.nngp().unwrap();
    assert_eq!(rev.shape(), &[4, 4, 8, 8, 8, 8]);
    for (h, h2, w, w2) in [(0, 1, 2, 3), (7, 0, 5, 6), (3, 3, 1, 4)] {
        assert_eq!(rev[[2, 1, w, w2, h, h2]], nngp[[2, 1, h, h2, w, w2]]);
    }

    let sliced = reversed.slice(0..2, 0..2)?;
    assert_eq!(sliced.shape1(), &[2, 8, 8, 3]);
    assert_eq!(sliced.shape2(), &[2, 8, 8, 3]);
    assert_eq!(sliced.cov1().shape(), &[2, 8, 8, 8, 8]);
    assert_eq!(sliced.nngp().unwrap().shape(), &[2, 2, 8, 8, 8, 8]);
    // cov2 was absent, so it is taken from cov1
    assert_eq!(sliced.cov2().unwrap(), sliced.cov1());
    assert!(sliced.is_reversed());
    sliced.validate()?;
    Ok(())
}

#[test]
fn test_mask_after_reverse_targets_logical_positions() -> anyhow::Result<()> {
    let kernel = image_kernel().reverse()?;

    // mask pixel (h=6, w=1) of image 3 only
    let mask = ArrayD::from_shape_fn(IxDyn(&[4, 8, 8, 1]), |idx| {
        idx[0] == 3 && idx[1] == 6 && idx[2] == 1
    })
    .into_shared();
    let masked = kernel.mask(Some(mask.clone()), Some(mask))?;

    let cov1 = masked.cov1();
    // storage order is (n, w, w', h, h')
    assert_eq!(cov1[[3, 1, 0, 6, 0]], 0.0);
    assert_eq!(cov1[[3, 4, 1, 2, 6]], 0.0);
    assert_ne!(cov1[[3, 6, 0, 1, 0]], 0.0);
    assert_eq!(cov1[[2, 1, 0, 6, 0]], kernel.cov1()[[2, 1, 0, 6, 0]]);

    let nngp = masked.nngp().unwrap();
    assert_eq!(nngp[[3, 0, 1, 5, 6, 5]], 0.0);
    assert_eq!(nngp[[0, 3, 5, 1, 5, 6]], 0.0);
    assert_eq!(nngp[[0, 2, 1, 5, 6, 5]], kernel.nngp().unwrap()[[0, 2, 1, 5, 6, 5]]);

    // undoing the reversal gives the same result as masking first
    let direct = image_kernel().mask(masked.mask1().cloned(), masked.mask2().cloned())?;
    assert_eq!(masked.reverse()?.cov1(), direct.cov1());
    Ok(())
}

#[test]
fn test_transpose_then_reverse_matches_spatial_permutation() -> anyhow::Result<()> {
    let kernel = image_kernel();
    // with two spatial dims, swapping them is the same as reversing them
    let swapped = kernel.transpose(Some(&[1, 0]))?;
    let reversed = kernel.reverse()?;
    assert_eq!(swapped.nngp(), reversed.nngp());
    assert_eq!(swapped.cov1(), reversed.cov1());
    assert!(!swapped.is_reversed());
    Ok(())
}

#[test]
fn test_layer_style_transform_over_arrays() -> anyhow::Result<()> {
    let kernel = image_kernel().slice(0..3, 1..4)?;
    // dense layer with weight variance 2 and bias variance 0.5
    let next = kernel.try_map_arrays(|_, arr| {
        Ok::<_, nt_kernels::Error>(arr.mapv(|x| 2.0 * x + 0.5).into_shared())
    })?;

    assert_eq!(next.cov1().len_of(Axis(0)), 3);
    assert_eq!(next.cov2().unwrap().len_of(Axis(0)), 3);
    assert_eq!(next.cov1()[[0, 0, 0, 0, 0]], 0.5);
    assert!(next.ntk().is_none());
    assert_eq!(next.shape1(), kernel.shape1());
    Ok(())
}

#[test]
fn test_precondition_errors_surface() {
    let kernel = image_kernel();
    assert!(matches!(
        kernel.transpose(Some(&[0, 2])),
        Err(Error::InvalidPermutation { .. })
    ));

    let channel_mask = ArrayD::from_elem(IxDyn(&[4, 8, 8, 3]), false).into_shared();
    assert!(matches!(
        kernel.mask(Some(channel_mask), None),
        Err(Error::NotSupported(_))
    ));
}
