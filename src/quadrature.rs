//! Named quadrature rules and point sets on the reference shapes.
//!
//! Rules are looked up by shape, rule name and either the number of points
//! ([`get_quadrule`]) or a polynomial degree that must be integrated exactly
//! ([`get_quadrule_by_degree`]). The following rules are available:
//!
//! | shape          | names                                                          |
//! |----------------|----------------------------------------------------------------|
//! | `point`        | any name, a single point with unit weight                      |
//! | `line`         | `gauss-legendre`, `gauss-legendre-lobatto`, `equi-spaced`      |
//! | `quad`, `hex`  | tensor products of the line rules                              |
//! | `tri`          | `equi-spaced`, `collapsed-gauss-legendre`                      |
//!
//! Equi-spaced point sets carry interpolatory weights.
use crate::polys::{ortho_basis, Shape};
use crate::{Error, PointSet};
use fluxrec_quadrature::simplex::{triangle_collapsed_gauss, triangle_equi_spaced_points};
use fluxrec_quadrature::tensor::{hexahedron_tensor_product, quadrilateral_tensor_product};
use fluxrec_quadrature::univariate::{equi_spaced_points, gauss, try_gauss_lobatto};
use fluxrec_quadrature::Point;
use nalgebra::{DMatrix, DVector};

/// Errors returned by the raw quadrature rules.
pub use fluxrec_quadrature::Error as QuadratureError;

pub const GAUSS_LEGENDRE: &str = "gauss-legendre";
pub const GAUSS_LEGENDRE_LOBATTO: &str = "gauss-legendre-lobatto";
pub const EQUI_SPACED: &str = "equi-spaced";
pub const COLLAPSED_GAUSS_LEGENDRE: &str = "collapsed-gauss-legendre";

/// A quadrature rule on a reference shape.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadratureRule {
    shape: Shape,
    name: String,
    points: PointSet,
    weights: DVector<f64>,
    degree: usize,
}

impl QuadratureRule {
    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The quadrature points, one per row.
    pub fn points(&self) -> &PointSet {
        &self.points
    }

    pub fn weights(&self) -> &DVector<f64> {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// The polynomial degree up to which the rule is exact.
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Approximates the integral of `f` over the reference shape.
    pub fn integrate(&self, f: impl Fn(&[f64]) -> f64) -> f64 {
        let mut x = vec![0.0; self.points.ncols()];
        self.points
            .row_iter()
            .zip(self.weights.iter())
            .map(|(row, w)| {
                x.iter_mut().zip(row.iter()).for_each(|(xi, ri)| *xi = *ri);
                w * f(&x)
            })
            .sum()
    }
}

/// The rule used for a shape when none is configured.
pub fn default_rule_name(shape: Shape) -> &'static str {
    match shape {
        Shape::Tri => COLLAPSED_GAUSS_LEGENDRE,
        _ => GAUSS_LEGENDRE,
    }
}

fn no_rule(shape: Shape, name: &str, npts: usize) -> Error {
    Error::config(format!(
        "no {} rule {:?} with {} points is available ({})",
        shape,
        name,
        npts,
        QuadratureError::NoRuleAvailable
    ))
}

fn unknown_rule(shape: Shape, name: &str) -> Error {
    Error::config(format!("unknown quadrature rule {:?} for {} elements", name, shape))
}

/// Returns `Some(n)` if `value == n^dim` for some integer `n`.
fn exact_root(value: usize, dim: u32) -> Option<usize> {
    let guess = (value as f64).powf(1.0 / f64::from(dim)).round() as usize;
    (guess.saturating_sub(1)..=guess.saturating_add(1)).find(|n| n.checked_pow(dim) == Some(value))
}

/// Returns `Some(k)` if `value == k (k + 1) / 2` for some integer `k`.
fn triangular_root(value: usize) -> Option<usize> {
    let guess = ((2.0 * value as f64).sqrt()).floor() as usize;
    (guess.saturating_sub(1)..=guess.saturating_add(1))
        .find(|&k| k.checked_mul(k + 1).map(|kk| kk / 2) == Some(value))
}

fn to_point_set<const D: usize>(points: &[Point<D>]) -> PointSet {
    DMatrix::from_fn(points.len(), D, |i, d| points[i][d])
}

/// Computes interpolatory weights for a unisolvent point set by moment fitting.
///
/// Solves $V w = m$ with $V_{ij} = \varphi_i(x_j)$ and $m_i = \int \varphi_i$. Only the
/// constant basis function has a non-zero integral.
fn interpolatory_weights(shape: Shape, degree: usize, points: &PointSet) -> Result<DVector<f64>, Error> {
    let vdm = ortho_basis(shape, degree, points);
    let volume: f64 = match shape {
        Shape::Point => 1.0,
        Shape::Line | Shape::Tri => 2.0,
        Shape::Quad => 4.0,
        Shape::Hex => 8.0,
    };
    let mut moments = DVector::zeros(vdm.nrows());
    moments[0] = volume.sqrt();
    vdm.lu()
        .solve(&moments)
        .ok_or_else(|| Error::config(format!("{} points are not unisolvent on a {}", points.nrows(), shape)))
}

/// A line rule with `n` points along with its degree of exactness.
fn line_rule(name: &str, n: usize) -> Result<(Vec<f64>, Vec<Point<1>>, usize), Error> {
    match name {
        GAUSS_LEGENDRE if n >= 1 => {
            let (w, p) = gauss(n);
            Ok((w, p, 2 * n - 1))
        }
        GAUSS_LEGENDRE_LOBATTO => try_gauss_lobatto(n)
            .map(|(w, p)| (w, p, 2 * n - 3))
            .ok_or_else(|| no_rule(Shape::Line, name, n)),
        EQUI_SPACED if n >= 1 => {
            let p: Vec<_> = equi_spaced_points(n).into_iter().map(|x| [x]).collect();
            let w = interpolatory_weights(Shape::Line, n - 1, &to_point_set(&p))?;
            Ok((w.iter().copied().collect(), p, n - 1))
        }
        GAUSS_LEGENDRE | EQUI_SPACED => Err(no_rule(Shape::Line, name, n)),
        _ => Err(unknown_rule(Shape::Line, name)),
    }
}

/// Looks up the rule with the given name and number of points.
pub fn get_quadrule(shape: Shape, name: &str, npts: usize) -> Result<QuadratureRule, Error> {
    let (points, weights, degree) = match shape {
        Shape::Point => {
            if npts != 1 {
                return Err(no_rule(shape, name, npts));
            }
            (PointSet::zeros(1, 0), DVector::from_element(1, 1.0), usize::MAX)
        }
        Shape::Line => {
            let (w, p, degree) = line_rule(name, npts)?;
            (to_point_set(&p), DVector::from_vec(w), degree)
        }
        Shape::Quad => {
            let n = exact_root(npts, 2).ok_or_else(|| no_rule(shape, name, npts))?;
            let (w, p, degree) = line_rule(name, n)?;
            let (w, p) = quadrilateral_tensor_product(&(w, p));
            (to_point_set(&p), DVector::from_vec(w), degree)
        }
        Shape::Hex => {
            let n = exact_root(npts, 3).ok_or_else(|| no_rule(shape, name, npts))?;
            let (w, p, degree) = line_rule(name, n)?;
            let (w, p) = hexahedron_tensor_product(&(w, p));
            (to_point_set(&p), DVector::from_vec(w), degree)
        }
        Shape::Tri => match name {
            EQUI_SPACED => {
                let k = triangular_root(npts)
                    .filter(|&k| k > 0)
                    .ok_or_else(|| no_rule(shape, name, npts))?;
                let p = to_point_set(&triangle_equi_spaced_points(k));
                let w = interpolatory_weights(shape, k - 1, &p)?;
                (p, w, k - 1)
            }
            COLLAPSED_GAUSS_LEGENDRE => {
                let m = exact_root(npts, 2)
                    .filter(|&m| m > 0)
                    .ok_or_else(|| no_rule(shape, name, npts))?;
                let (w, p) = triangle_collapsed_gauss(m);
                (to_point_set(&p), DVector::from_vec(w), 2 * m - 2)
            }
            _ => return Err(unknown_rule(shape, name)),
        },
    };

    Ok(QuadratureRule {
        shape,
        name: name.to_string(),
        points,
        weights,
        degree,
    })
}

/// Looks up the smallest rule of the given name (or the shape's default rule) that integrates
/// polynomials of the given degree exactly.
pub fn get_quadrule_by_degree(shape: Shape, name: Option<&str>, degree: usize) -> Result<QuadratureRule, Error> {
    let name = name.unwrap_or_else(|| default_rule_name(shape));

    // Number of points per dimension (or per edge for the triangle lattice)
    let n = match name {
        GAUSS_LEGENDRE => degree / 2 + 1,
        GAUSS_LEGENDRE_LOBATTO => degree / 2 + 2,
        EQUI_SPACED => degree.saturating_add(1),
        COLLAPSED_GAUSS_LEGENDRE => degree / 2 + 1 + degree % 2,
        _ if shape == Shape::Point => 1,
        _ => return Err(unknown_rule(shape, name)),
    };

    let npts = match shape {
        Shape::Point => Some(1),
        Shape::Tri if name != EQUI_SPACED => n.checked_mul(n),
        // Equi-spaced triangle lattices with n points per edge span polynomials of degree n - 1
        shape => shape.checked_nbasis(n - 1),
    };
    let npts = npts.ok_or_else(|| {
        Error::config(format!("no {} rule {:?} of degree {} is available", shape, name, degree))
    })?;
    get_quadrule(shape, name, npts)
}
