//! Shared utilities for integration tests

#![allow(dead_code)]

use ndarray::{ArrayD, IxDyn};
use nt_core::{Kernel, Layout, SharedArray};

/// Every combination of the structural layout flags
pub fn all_layouts(ndim: usize) -> Vec<Layout> {
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

/// Array with distinct entries `offset, offset + 1, ...` in row-major order
pub fn arange(shape: &[usize], offset: f64) -> SharedArray<f64> {
    let len = shape.iter().product();
    ArrayD::from_shape_vec(IxDyn(shape), (0..len).map(|i| offset + i as f64).collect())
        .unwrap()
        .into_shared()
}

/// Storage shape of a covariance array with the given batch axes
pub fn storage_shape(batch: &[usize], spatial: &[usize], diagonal_spatial: bool) -> Vec<usize> {
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

/// Kernel over NHWC-style inputs with `spatial` given in storage order
pub fn kernel_for(n1: usize, n2: usize, spatial: &[usize], layout: Layout) -> Kernel<f64> {
    let cov_batch = |n: usize| vec![n; layout.cov_batch_ndim()];
    let cross = storage_shape(&[n1, n2], spatial, layout.diagonal_spatial);
    let logical = |n: usize| {
        let mut logical: Vec<usize> = spatial.to_vec();
        if layout.is_reversed {
            logical.reverse();
        }
        let mut shape = vec![n];
        shape.extend(logical);
        shape.push(3);
        shape
    };

    Kernel::builder(
        arange(&storage_shape(&cov_batch(n1), spatial, layout.diagonal_spatial), 0.0),
        logical(n1),
    )
    .cov2(arange(&storage_shape(&cov_batch(n2), spatial, layout.diagonal_spatial), 1e5))
    .nngp(arange(&cross, 2e5))
    .ntk(arange(&cross, 3e5))
    .shape2(logical(n2))
    .diagonal_batch(layout.diagonal_batch)
    .diagonal_spatial(layout.diagonal_spatial)
    .is_reversed(layout.is_reversed)
    .build()
}
