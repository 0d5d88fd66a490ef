//! Rules and point sets for the reference triangle with vertices `(-1, -1)`, `(1, -1)` and
//! `(-1, 1)`.

use crate::univariate::gauss;
use crate::{Point2, Rule2d};

/// A collapsed Gauss rule for the reference triangle.
///
/// The rule is obtained by mapping the tensor product Gauss rule on the square through the
/// Duffy transformation `r = (1 + a)(1 - b) / 2 - 1`, `s = b`. With `m` points per
/// dimension the rule has `m^2` points and integrates polynomials of total degree up to
/// `2 m - 2` exactly.
///
/// # Panics
///
/// Panics if zero points are requested.
pub fn triangle_collapsed_gauss(num_points_per_dim: usize) -> Rule2d {
    let (weights1d, points1d) = gauss(num_points_per_dim);
    let n = weights1d.len();
    let mut weights = Vec::with_capacity(n * n);
    let mut points = Vec::with_capacity(n * n);

    for (&wa, &[a]) in weights1d.iter().zip(&points1d) {
        for (&wb, &[b]) in weights1d.iter().zip(&points1d) {
            let r = 0.5 * (1.0 + a) * (1.0 - b) - 1.0;
            // Jacobian of the collapse
            let j = 0.5 * (1.0 - b);
            weights.push(wa * wb * j);
            points.push([r, b]);
        }
    }

    (weights, points)
}

/// The equi-spaced lattice with `k` points along each edge of the reference triangle.
///
/// The lattice has `k (k + 1) / 2` points. A single point is placed at the centroid.
pub fn triangle_equi_spaced_points(num_points_per_edge: usize) -> Vec<Point2> {
    let k = num_points_per_edge;
    match k {
        0 => Vec::new(),
        1 => vec![[-1.0 / 3.0, -1.0 / 3.0]],
        _ => {
            let p = (k - 1) as f64;
            let mut points = Vec::with_capacity(k * (k + 1) / 2);
            for j in 0..k {
                for i in 0..(k - j) {
                    points.push([-1.0 + 2.0 * i as f64 / p, -1.0 + 2.0 * j as f64 / p]);
                }
            }
            points
        }
    }
}
