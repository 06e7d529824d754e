//! Fixtures shared by unit tests

use crate::kernel::{Kernel, SharedArray};
use crate::layout::Layout;
use ndarray::{ArrayD, IxDyn};

pub(crate) fn arange(shape: &[usize], offset: f64) -> SharedArray<f64> {
    let len = shape.iter().product();
    ArrayD::from_shape_vec(IxDyn(shape), (0..len).map(|i| offset + i as f64).collect())
        .expect("shape matches data")
        .into_shared()
}

pub(crate) fn storage_shape(
    batch: &[usize],
    spatial: &[usize],
    diagonal_spatial: bool,
) -> Vec<usize> {
    let mut shape = batch.to_vec();
    for &s in spatial {
        if diagonal_spatial {
            shape.push(s);
        } else {
            shape.extend([s, s]);
        }
    }
    shape
}

/// NHWC-style kernel with distinct values in every array entry so that any
/// misplaced axis shows up in comparisons.
pub(crate) fn arange_kernel(
    n1: usize,
    n2: usize,
    spatial: &[usize],
    layout: Layout,
) -> Kernel<f64> {
    let cov_batch = |n: usize| vec![n; layout.cov_batch_ndim()];
    let cov1 = arange(&storage_shape(&cov_batch(n1), spatial, layout.diagonal_spatial), 0.0);
    let cov2 = arange(&storage_shape(&cov_batch(n2), spatial, layout.diagonal_spatial), 1e4);
    let cross = storage_shape(&[n1, n2], spatial, layout.diagonal_spatial);

    let shape = |n: usize| {
        let mut shape = vec![n];
        shape.extend_from_slice(spatial);
        shape.push(3);
        shape
    };

    Kernel::builder(cov1, shape(n1))
        .cov2(cov2)
        .nngp(arange(&cross, 2e4))
        .ntk(arange(&cross, 3e4))
        .shape2(shape(n2))
        .diagonal_batch(layout.diagonal_batch)
        .diagonal_spatial(layout.diagonal_spatial)
        .is_reversed(layout.is_reversed)
        .build()
}

pub(crate) fn all_layouts(ndim: usize) -> Vec<Layout> {
    let mut layouts = Vec::new();
    for &diagonal_batch in &[true, false] {
        for &diagonal_spatial in &[true, false] {
            for &is_reversed in &[true, false] {
                layouts.push(Layout::new(ndim, diagonal_batch, diagonal_spatial, is_reversed));
            }
        }
    }
    layouts
}
