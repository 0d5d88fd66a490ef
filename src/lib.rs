//! Reference-element operators and residual scheduling for high-order flux reconstruction.
//!
//! The crate has two halves. The [`element`] module derives, for every supported reference
//! element, the dense spectral operator matrices of the flux reconstruction scheme
//! (interpolation, differentiation, correction and quadrature projection), built on top of
//! [`quadrature`] rules and the orthonormal bases in [`polys`]. Composite operators are
//! formed with the restricted expression language in [`algebra`].
//!
//! The [`scheduler`] module drives, once per timestep, the pipeline of kernels that turns
//! the current solution into a residual, overlapping local computation with the exchange of
//! partition-boundary data.

pub mod algebra;
pub mod config;
pub mod element;
pub mod error;
pub mod jacobi;
pub mod polys;
pub mod quadrature;
pub mod scheduler;
pub mod util;

pub use error::Error;

pub extern crate nalgebra;

/// A set of points in a reference domain, stored with one point per row.
pub type PointSet = nalgebra::DMatrix<f64>;
