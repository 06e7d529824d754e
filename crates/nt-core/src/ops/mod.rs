//! Shape transformations of a [`Kernel`](crate::Kernel)
//!
//! Each submodule adds one method to `Kernel`. All of them take `&self` and
//! return a new kernel that differs only in the fields the operation
//! documents.

mod mask;
mod reverse;
mod slice;
mod transpose;
