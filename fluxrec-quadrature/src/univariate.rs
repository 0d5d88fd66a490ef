//! Quadrature rules for the one-dimensional domain `[-1, 1]`.

use crate::Rule;
use std::f64::consts::PI;

/// Recurrence relation for Legendre polynomials.
///
/// Note: we use a formula for which derivatives are *not* defined at |x| == 1, so it is only
/// suitable for evaluation in the open interval (-1, 1).
#[derive(Debug, Default)]
struct LegendreRecurrence {
    n: usize,
    x: f64,
    // The current value, i.e. p_n(x)
    p1: f64,
    // The previous value in the recurrence, i.e. p_{n - 1}(x)
    p2: f64,
}

impl LegendreRecurrence {
    pub fn evaluate(n: usize, x: f64) -> Self {
        //  m P_m(x) = (2m - 1) * x P_{m - 1}(x) - (m - 1) P_{m - 2}(x)
        let mut p1 = 1.0;
        let mut p2 = 0.0;
        let mut p3;
        for m in 1..=n {
            let m = m as f64;
            p3 = p2;
            p2 = p1;
            p1 = ((2.0 * m - 1.0) * x * p2 - (m - 1.0) * p3) / m;
        }

        Self { n, x, p1, p2 }
    }

    fn value(&self) -> f64 {
        self.p1
    }

    fn derivative(&self) -> f64 {
        let Self { n, x, p1, p2 } = &self;
        let n = *n as f64;
        // dp_n/dx (x) = n * (x * p_n(x) - p_{n - 1}(x)) / (x^2 - 1)
        n * (x * p1 - p2) / (x * x - 1.0)
    }

    fn value_and_derivative(&self) -> (f64, f64) {
        (self.value(), self.derivative())
    }
}

const MAX_NEWTON_ITERATIONS: usize = 100;

/// Gauss quadrature for the reference interval [-1, 1].
///
/// Returns the [Gauss quadrature rule] with the given number of points. Given `n` points,
/// the rule integrates polynomials of order up to `2 n - 1` exactly. Points are sorted in
/// ascending order.
///
/// # Panics
///
/// Panics if zero points are requested.
///
/// [Gauss quadrature rule]: https://en.wikipedia.org/wiki/Gaussian_quadrature
pub fn gauss(num_points: usize) -> Rule<1> {
    let n = num_points;
    assert!(n > 0, "number of points must be positive");

    // Loosely based on the procedure used in
    // Numerical Recipes, The art of Scientific Computing, Third Edition (2007)
    let m = (n + 1) / 2;

    let mut points = Vec::with_capacity(n);
    let mut weights = Vec::with_capacity(n);

    // Only find the first m roots (in descending order). The rest follow by symmetry
    for i in 0..m {
        let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        let (_, mut dp) = LegendreRecurrence::evaluate(n, x).value_and_derivative();

        for _ in 0..MAX_NEWTON_ITERATIONS {
            let (p, dp_x) = LegendreRecurrence::evaluate(n, x).value_and_derivative();
            let dx = -p / dp_x;
            x += dx;
            dp = LegendreRecurrence::evaluate(n, x).derivative();
            if dx.abs() <= 1e-15 {
                break;
            }
        }

        let w = 2.0 / ((1.0 - x * x) * dp * dp);
        points.push(x);
        weights.push(w);
    }

    mirror_into_ascending(n, points, weights)
}

/// Gauss-Lobatto quadrature for the reference interval [-1, 1].
///
/// The rule contains both end points. Given `n >= 2` points, polynomials of order up to
/// `2 n - 3` are integrated exactly. Returns `None` if fewer than two points are requested.
pub fn try_gauss_lobatto(num_points: usize) -> Option<Rule<1>> {
    let n = num_points;
    if n < 2 {
        return None;
    }

    // Interior points are the roots of P'_{n - 1}
    let order = n - 1;
    let m = n / 2;
    let mut points = Vec::with_capacity(n);
    let mut weights = Vec::with_capacity(n);
    let endpoint_weight = 2.0 / ((order * n) as f64);

    points.push(1.0);
    weights.push(endpoint_weight);

    for i in 1..m {
        // Chebyshev-Gauss-Lobatto initial guess
        let mut x = (PI * i as f64 / order as f64).cos();
        for _ in 0..MAX_NEWTON_ITERATIONS {
            let recurrence = LegendreRecurrence::evaluate(order, x);
            let (p, dp) = recurrence.value_and_derivative();
            // Newton on L(x) = (1 - x^2) P'(x), using L'(x) = -n (n + 1) P(x)
            let dx = (1.0 - x * x) * dp / ((order * n) as f64 * p);
            x += dx;
            if dx.abs() <= 1e-15 {
                break;
            }
        }
        let p = LegendreRecurrence::evaluate(order, x).value();
        points.push(x);
        weights.push(endpoint_weight / (p * p));
    }

    if n % 2 == 1 {
        let p = LegendreRecurrence::evaluate(order, 0.0).value();
        points.push(0.0);
        weights.push(endpoint_weight / (p * p));
    }

    let (weights, points) = mirror_into_ascending(n, points, weights);
    Some((weights, points))
}

/// Gauss-Lobatto quadrature for the reference interval [-1, 1].
///
/// # Panics
///
/// Panics if fewer than two points are requested.
pub fn gauss_lobatto(num_points: usize) -> Rule<1> {
    try_gauss_lobatto(num_points).expect("Gauss-Lobatto rules require at least two points")
}

/// Equi-spaced points on [-1, 1], including the end points if `n >= 2`.
///
/// A single point is placed at the midpoint.
pub fn equi_spaced_points(num_points: usize) -> Vec<f64> {
    match num_points {
        0 => Vec::new(),
        1 => vec![0.0],
        n => (0..n)
            .map(|i| -1.0 + 2.0 * i as f64 / (n - 1) as f64)
            .collect(),
    }
}

/// Given the first `ceil(n / 2)` points in descending order (non-negative half), recovers the
/// full rule by symmetry and sorts the points in ascending order.
fn mirror_into_ascending(n: usize, half_points: Vec<f64>, half_weights: Vec<f64>) -> Rule<1> {
    let m = half_points.len();
    let mut points = Vec::with_capacity(n);
    let mut weights = Vec::with_capacity(n);

    for i in 0..(n - m) {
        points.push([-half_points[i]]);
        weights.push(half_weights[i]);
    }
    for i in (0..m).rev() {
        points.push([half_points[i]]);
        weights.push(half_weights[i]);
    }

    assert_eq!(points.len(), weights.len());
    assert_eq!(points.len(), n, "Internal error: incorrect number of points produced");
    (weights, points)
}
