//! Orthonormal and nodal polynomial bases on reference shapes.
//!
//! Every reference domain has an orthonormal ("modal") basis spanning the polynomials of
//! the given degree: tensor products of normalised Legendre polynomials for the line,
//! quadrilateral and hexahedron, and the Dubiner basis for the triangle. A [`PolyBasis`]
//! additionally fixes a unisolvent point set, which defines the nodal (Lagrange) basis.
use crate::jacobi::{jacobi, jacobi_diff};
use crate::{Error, PointSet};
use nalgebra::DMatrix;
use std::f64::consts::SQRT_2;
use std::fmt;
use std::str::FromStr;

/// Reference shapes of elements and faces.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Shape {
    /// The zero-dimensional face of a line element.
    Point,
    Line,
    Tri,
    Quad,
    Hex,
}

impl Shape {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::Line => "line",
            Self::Tri => "tri",
            Self::Quad => "quad",
            Self::Hex => "hex",
        }
    }

    pub fn ndims(&self) -> usize {
        match self {
            Self::Point => 0,
            Self::Line => 1,
            Self::Tri | Self::Quad => 2,
            Self::Hex => 3,
        }
    }

    /// Dimension of the polynomial space of the given degree on this shape.
    ///
    /// # Panics
    ///
    /// Panics if the dimension does not fit in a `usize`.
    pub fn nbasis(&self, degree: usize) -> usize {
        match self.checked_nbasis(degree) {
            Some(nbasis) => nbasis,
            None => panic!("dimension of the degree {} space on a {} overflows", degree, self),
        }
    }

    /// Dimension of the polynomial space of the given degree, or `None` on overflow.
    pub fn checked_nbasis(&self, degree: usize) -> Option<usize> {
        let n = degree.checked_add(1)?;
        match self {
            Self::Point => Some(1),
            Self::Line => Some(n),
            Self::Tri => n.checked_mul(n.checked_add(1)?).map(|nn| nn / 2),
            Self::Quad => n.checked_mul(n),
            Self::Hex => n.checked_mul(n)?.checked_mul(n),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Shape {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "point" => Ok(Self::Point),
            "line" => Ok(Self::Line),
            "tri" => Ok(Self::Tri),
            "quad" => Ok(Self::Quad),
            "hex" => Ok(Self::Hex),
            other => Err(Error::config(format!("unknown shape {:?}", other))),
        }
    }
}

/// Maps triangle coordinates to the collapsed square.
fn rs_to_ab(r: f64, s: f64) -> (f64, f64) {
    let a = if (1.0 - s).abs() > 1e-14 {
        2.0 * (1.0 + r) / (1.0 - s) - 1.0
    } else {
        -1.0
    };
    (a, s)
}

fn assert_point_dim(shape: Shape, pts: &PointSet) {
    assert_eq!(
        pts.ncols(),
        shape.ndims(),
        "points must have one column per dimension of the {} shape",
        shape
    );
}

/// Evaluates the orthonormal basis of the given degree at the given points.
///
/// Returns a matrix with one row per basis function and one column per point.
pub fn ortho_basis(shape: Shape, degree: usize, pts: &PointSet) -> DMatrix<f64> {
    assert_point_dim(shape, pts);
    let p = degree;
    let n = p + 1;
    let mut result = DMatrix::zeros(shape.nbasis(degree), pts.nrows());

    for (col, x) in pts.row_iter().enumerate() {
        let mut column = result.column_mut(col);
        match shape {
            Shape::Point => column[0] = 1.0,
            Shape::Line => {
                for (i, v) in jacobi(p, 0, 0, x[0]).into_iter().enumerate() {
                    column[i] = v;
                }
            }
            Shape::Quad => {
                let (px, py) = (jacobi(p, 0, 0, x[0]), jacobi(p, 0, 0, x[1]));
                for i in 0..n {
                    for j in 0..n {
                        column[i * n + j] = px[i] * py[j];
                    }
                }
            }
            Shape::Hex => {
                let (px, py, pz) = (jacobi(p, 0, 0, x[0]), jacobi(p, 0, 0, x[1]), jacobi(p, 0, 0, x[2]));
                for i in 0..n {
                    for j in 0..n {
                        for k in 0..n {
                            column[(i * n + j) * n + k] = px[i] * py[j] * pz[k];
                        }
                    }
                }
            }
            Shape::Tri => {
                let (a, b) = rs_to_ab(x[0], x[1]);
                let fa = jacobi(p, 0, 0, a);
                let mut idx = 0;
                for i in 0..=p {
                    let gb = jacobi(p - i, 2 * i as u32 + 1, 0, b);
                    for gb_j in gb {
                        column[idx] = SQRT_2 * fa[i] * gb_j * (1.0 - b).powi(i as i32);
                        idx += 1;
                    }
                }
            }
        }
    }
    result
}

/// Evaluates the partial derivatives of the orthonormal basis at the given points.
///
/// Returns one matrix per reference dimension, laid out as in [`ortho_basis`].
pub fn jac_ortho_basis(shape: Shape, degree: usize, pts: &PointSet) -> Vec<DMatrix<f64>> {
    assert_point_dim(shape, pts);
    let p = degree;
    let n = p + 1;
    let nbasis = shape.nbasis(degree);
    let mut result = vec![DMatrix::zeros(nbasis, pts.nrows()); shape.ndims()];

    for (col, x) in pts.row_iter().enumerate() {
        match shape {
            Shape::Point => {}
            Shape::Line => {
                for (i, dv) in jacobi_diff(p, 0, 0, x[0]).into_iter().enumerate() {
                    result[0][(i, col)] = dv;
                }
            }
            Shape::Quad => {
                let (px, py) = (jacobi(p, 0, 0, x[0]), jacobi(p, 0, 0, x[1]));
                let (dpx, dpy) = (jacobi_diff(p, 0, 0, x[0]), jacobi_diff(p, 0, 0, x[1]));
                for i in 0..n {
                    for j in 0..n {
                        result[0][(i * n + j, col)] = dpx[i] * py[j];
                        result[1][(i * n + j, col)] = px[i] * dpy[j];
                    }
                }
            }
            Shape::Hex => {
                let (px, py, pz) = (jacobi(p, 0, 0, x[0]), jacobi(p, 0, 0, x[1]), jacobi(p, 0, 0, x[2]));
                let (dpx, dpy, dpz) = (
                    jacobi_diff(p, 0, 0, x[0]),
                    jacobi_diff(p, 0, 0, x[1]),
                    jacobi_diff(p, 0, 0, x[2]),
                );
                for i in 0..n {
                    for j in 0..n {
                        for k in 0..n {
                            let idx = (i * n + j) * n + k;
                            result[0][(idx, col)] = dpx[i] * py[j] * pz[k];
                            result[1][(idx, col)] = px[i] * dpy[j] * pz[k];
                            result[2][(idx, col)] = px[i] * py[j] * dpz[k];
                        }
                    }
                }
            }
            Shape::Tri => {
                let (a, b) = rs_to_ab(x[0], x[1]);
                let fa = jacobi(p, 0, 0, a);
                let dfa = jacobi_diff(p, 0, 0, a);
                let half = 0.5 * (1.0 - b);
                let mut idx = 0;
                for i in 0..=p {
                    let alpha = 2 * i as u32 + 1;
                    let gb = jacobi(p - i, alpha, 0, b);
                    let dgb = jacobi_diff(p - i, alpha, 0, b);
                    // Powers of (1 - b) / 2 with the i = 0 special cases folded in
                    let pow_i = half.powi(i as i32);
                    let pow_im1 = if i > 0 { half.powi(i as i32 - 1) } else { 1.0 };
                    let scale = 2f64.powf(i as f64 + 0.5);

                    for j in 0..gb.len() {
                        let dr = dfa[i] * gb[j] * pow_im1;
                        let mut ds = dfa[i] * gb[j] * 0.5 * (1.0 + a) * pow_im1;
                        let mut tmp = dgb[j] * pow_i;
                        if i > 0 {
                            tmp -= 0.5 * i as f64 * gb[j] * pow_im1;
                        }
                        ds += fa[i] * tmp;

                        result[0][(idx, col)] = scale * dr;
                        result[1][(idx, col)] = scale * ds;
                        idx += 1;
                    }
                }
            }
        }
    }
    result
}

/// A polynomial basis of fixed degree on a reference shape, defined by a unisolvent point set.
///
/// The nodal basis function $L_j$ equals one at the $j$-th defining point and zero at all
/// others.
#[derive(Debug, Clone)]
pub struct PolyBasis {
    shape: Shape,
    degree: usize,
    pts: PointSet,
    vdm: DMatrix<f64>,
    inv_vdm: DMatrix<f64>,
}

impl PolyBasis {
    /// Constructs the basis, validating that the points define a nodal basis.
    pub fn new(shape: Shape, degree: usize, pts: PointSet) -> Result<Self, Error> {
        let nbasis = shape.nbasis(degree);
        if pts.nrows() != nbasis || pts.ncols() != shape.ndims() {
            return Err(Error::config(format!(
                "a degree {} basis on a {} needs {} points in {} dimensions, got {}x{}",
                degree,
                shape,
                nbasis,
                shape.ndims(),
                pts.nrows(),
                pts.ncols()
            )));
        }

        let vdm = ortho_basis(shape, degree, &pts);
        let inv_vdm = vdm
            .clone()
            .try_inverse()
            .ok_or_else(|| {
                Error::config(format!(
                    "points are not unisolvent for a degree {} {} basis",
                    degree, shape
                ))
            })?;

        Ok(Self {
            shape,
            degree,
            pts,
            vdm,
            inv_vdm,
        })
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn nbasis(&self) -> usize {
        self.pts.nrows()
    }

    pub fn points(&self) -> &PointSet {
        &self.pts
    }

    /// The generalized Vandermonde matrix $V_{ij} = \varphi_i(x_j)$.
    pub fn vdm(&self) -> &DMatrix<f64> {
        &self.vdm
    }

    pub fn ortho_basis_at(&self, pts: &PointSet) -> DMatrix<f64> {
        ortho_basis(self.shape, self.degree, pts)
    }

    pub fn jac_ortho_basis_at(&self, pts: &PointSet) -> Vec<DMatrix<f64>> {
        jac_ortho_basis(self.shape, self.degree, pts)
    }

    /// Evaluates the nodal basis, returning one row per point and one column per basis function.
    pub fn nodal_basis_at(&self, pts: &PointSet) -> DMatrix<f64> {
        (&self.inv_vdm * self.ortho_basis_at(pts)).transpose()
    }

    /// Evaluates the partial derivatives of the nodal basis, one matrix per dimension laid out as
    /// in [`PolyBasis::nodal_basis_at`].
    pub fn jac_nodal_basis_at(&self, pts: &PointSet) -> Vec<DMatrix<f64>> {
        self.jac_ortho_basis_at(pts)
            .into_iter()
            .map(|jac| (&self.inv_vdm * jac).transpose())
            .collect()
    }
}
