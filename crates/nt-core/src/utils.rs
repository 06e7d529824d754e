//! Array helpers shared by the kernel operations
//!
//! These work on dynamic-rank `ndarray` arrays and report bad axes or
//! incompatible shapes as [`Error`] values instead of panicking.

use crate::error::{Error, Result};
use crate::kernel::SharedArray;
use ndarray::{ArrayD, ArrayViewD, Axis, Slice, Zip};

/// Check that `axes` is a permutation of `0..ndim`
///
/// # Examples
///
/// ```rust
/// use nt_core::utils::check_permutation;
///
/// assert!(check_permutation(&[1, 0, 2], 3).is_ok());
/// assert!(check_permutation(&[1, 1, 2], 3).is_err());
/// ```
pub fn check_permutation(axes: &[usize], ndim: usize) -> Result<()> {
    let invalid = || Error::InvalidPermutation {
        axes: axes.to_vec(),
        ndim,
    };
    if axes.len() != ndim {
        return Err(invalid());
    }
    let mut seen = vec![false; ndim];
    for &a in axes {
        if a >= ndim || seen[a] {
            return Err(invalid());
        }
        seen[a] = true;
    }
    Ok(())
}

/// Permute the axes of a shared array without copying its data
pub fn permute<A>(arr: &SharedArray<A>, perm: &[usize], name: &str) -> Result<SharedArray<A>> {
    if perm.len() != arr.ndim() {
        return Err(Error::ShapeMismatch(format!(
            "{name} has rank {} but the permutation {perm:?} has length {}",
            arr.ndim(),
            perm.len()
        )));
    }
    check_permutation(perm, arr.ndim())?;
    Ok(arr.clone().permuted_axes(perm))
}

/// Select `slice` along `axis` of a shared array without copying its data
pub fn slice_along<A>(
    arr: &SharedArray<A>,
    axis: usize,
    slice: Slice,
    name: &str,
) -> Result<SharedArray<A>> {
    if axis >= arr.ndim() {
        return Err(Error::axis_out_of_range(axis, arr.ndim(), name));
    }
    check_slice(slice, arr.len_of(Axis(axis)), name)?;
    let mut out = arr.clone();
    out.slice_axis_inplace(Axis(axis), slice);
    Ok(out)
}

fn check_slice(slice: Slice, len: usize, name: &str) -> Result<()> {
    if slice.step == 0 {
        return Err(Error::InvalidParameter(format!(
            "slice step for {name} must not be zero"
        )));
    }
    let abs = |index: isize| -> Option<usize> {
        if index < 0 {
            len.checked_sub(index.unsigned_abs())
        } else {
            let index = index as usize;
            (index <= len).then_some(index)
        }
    };
    let out_of_bounds = || {
        Error::InvalidParameter(format!(
            "slice {slice:?} out of bounds for {name} axis of length {len}"
        ))
    };
    abs(slice.start).ok_or_else(out_of_bounds)?;
    abs(slice.end.unwrap_or(len as isize)).ok_or_else(out_of_bounds)?;
    Ok(())
}

/// Numpy-style broadcast shape of two shapes, aligned on trailing axes
///
/// Returns `None` if the shapes are incompatible.
pub fn broadcast_shape(a: &[usize], b: &[usize]) -> Option<Vec<usize>> {
    let rank = a.len().max(b.len());
    let dim = |shape: &[usize], i: usize| {
        let offset = rank - shape.len();
        if i < offset {
            1
        } else {
            shape[i - offset]
        }
    };
    (0..rank)
        .map(|i| match (dim(a, i), dim(b, i)) {
            (x, y) if x == y => Some(x),
            (1, y) => Some(y),
            (x, 1) => Some(x),
            _ => None,
        })
        .collect()
}

/// Insert a size-1 axis next to every axis in `[start, end)`
///
/// With `ones_after` the new axes follow the original ones
/// (`(N, H, W) -> (N, H, 1, W, 1)` for `[1, 3)`), otherwise they precede
/// them (`(N, 1, H, 1, W)`).
pub fn interleave_ones<'a, A>(
    x: ArrayViewD<'a, A>,
    start: usize,
    end: usize,
    ones_after: bool,
) -> ArrayViewD<'a, A> {
    let shift = usize::from(ones_after);
    (0..end.saturating_sub(start)).fold(x, |x, k| x.insert_axis(Axis(start + 2 * k + shift)))
}

/// Outer product of `x` and `y` over the axes `[start, end)`, combined
/// elementwise with `op`.
///
/// Axes before `start` and from `end` on are matched elementwise
/// (broadcasting where one side has size 1), while each axis in
/// `[start, end)` expands into an `x`-indexed axis followed by a `y`-indexed
/// one. A missing operand contributes nothing: the present one is returned
/// in the expanded layout, and `None` is returned if both are missing.
pub fn outer_prod<'a, A, F>(
    x: Option<ArrayViewD<'a, A>>,
    y: Option<ArrayViewD<'a, A>>,
    start: usize,
    end: usize,
    op: F,
) -> Result<Option<ArrayD<A>>>
where
    A: Clone,
    F: Fn(&A, &A) -> A,
{
    let x = x.map(|x| interleave_ones(x, start, end, true));
    let y = y.map(|y| interleave_ones(y, start, end, false));

    match (x, y) {
        (None, None) => Ok(None),
        (Some(only), None) | (None, Some(only)) => Ok(Some(only.to_owned())),
        (Some(x), Some(y)) => {
            let shape = broadcast_shape(x.shape(), y.shape())
                .ok_or_else(|| Error::not_broadcastable(y.shape(), x.shape(), "mask"))?;
            let xb = x
                .broadcast(shape.as_slice())
                .ok_or_else(|| Error::not_broadcastable(x.shape(), &shape, "mask"))?;
            let yb = y
                .broadcast(shape.as_slice())
                .ok_or_else(|| Error::not_broadcastable(y.shape(), &shape, "mask"))?;
            Ok(Some(Zip::from(&xb).and(&yb).map_collect(|a, b| op(a, b))))
        }
    }
}
