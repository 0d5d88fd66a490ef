//! Normalised Jacobi polynomials.
//!
//! The polynomials $P_n^{(\alpha, \beta)}$ returned here are orthonormal on $[-1, 1]$ with
//! respect to the weight $(1 - x)^\alpha (1 + x)^\beta$. For $\alpha = \beta = 0$ they are
//! the normalised Legendre polynomials $\sqrt{(2n + 1) / 2} \, P_n(x)$.

fn factorial(n: u32) -> f64 {
    (1..=n).map(f64::from).product()
}

/// Evaluates $P_0, \dots, P_{n}$ at `x`.
pub fn jacobi(n: usize, alpha: u32, beta: u32, x: f64) -> Vec<f64> {
    let a = f64::from(alpha);
    let b = f64::from(beta);
    let mut values = Vec::with_capacity(n + 1);

    let gamma0 = 2f64.powf(a + b + 1.0) / (a + b + 1.0) * factorial(alpha) * factorial(beta)
        / factorial(alpha + beta);
    values.push(1.0 / gamma0.sqrt());
    if n == 0 {
        return values;
    }

    let gamma1 = (a + 1.0) * (b + 1.0) / (a + b + 3.0) * gamma0;
    values.push(((a + b + 2.0) * x / 2.0 + (a - b) / 2.0) / gamma1.sqrt());

    let mut a_old = 2.0 / (2.0 + a + b) * ((a + 1.0) * (b + 1.0) / (a + b + 3.0)).sqrt();
    for i in 1..n {
        let fi = i as f64;
        let h1 = 2.0 * fi + a + b;
        let a_new = 2.0 / (h1 + 2.0)
            * ((fi + 1.0) * (fi + 1.0 + a + b) * (fi + 1.0 + a) * (fi + 1.0 + b) / (h1 + 1.0) / (h1 + 3.0)).sqrt();
        let b_new = -(a * a - b * b) / h1 / (h1 + 2.0);
        let next = (-a_old * values[i - 1] + (x - b_new) * values[i]) / a_new;
        values.push(next);
        a_old = a_new;
    }
    values
}

/// Evaluates the derivatives of $P_0, \dots, P_{n}$ at `x`.
pub fn jacobi_diff(n: usize, alpha: u32, beta: u32, x: f64) -> Vec<f64> {
    let mut derivatives = vec![0.0; n + 1];
    if n == 0 {
        return derivatives;
    }

    let shifted = jacobi(n - 1, alpha + 1, beta + 1, x);
    let ab = f64::from(alpha + beta);
    for (k, dp) in derivatives.iter_mut().enumerate().skip(1) {
        let fk = k as f64;
        *dp = (fk * (fk + ab + 1.0)).sqrt() * shifted[k - 1];
    }
    derivatives
}
