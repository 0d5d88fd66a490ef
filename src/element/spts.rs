use crate::element::ElementType;
use crate::Error;
use log::debug;
use num::{BigInt, Signed, Zero};

/// Number of shape points of an element with `sptord` shape points per edge.
pub fn nspts_from_order<E: ElementType>(sptord: usize) -> usize {
    let x = sptord as i128;
    let p = E::NSPTS_COEFFS
        .iter()
        .fold(0i128, |acc, &c| acc * x + i128::from(c));
    (p / i128::from(E::NSPTS_CDENOM)) as usize
}

/// Recovers the number of shape points per edge from a total number of shape points.
///
/// This is the inverse of [`nspts_from_order`]. Fails if `nspts` is not a valid count for the
/// element type.
pub fn order_from_nspts<E: ElementType>(nspts: usize) -> Result<usize, Error> {
    // Solve P(x) - D*n = 0 over the positive integers
    let mut coeffs: Vec<BigInt> = E::NSPTS_COEFFS.iter().copied().map(BigInt::from).collect();
    if let Some(last) = coeffs.last_mut() {
        *last -= BigInt::from(E::NSPTS_CDENOM) * BigInt::from(nspts);
    }

    // With non-negative coefficients P is increasing on the positive integers
    let increasing = E::NSPTS_COEFFS
        .iter()
        .rev()
        .skip(1)
        .all(|&c| c >= 0);
    let roots = if increasing {
        bisect_positive_integer_root(&coeffs).into_iter().collect()
    } else {
        positive_integer_roots(&coeffs)
    };
    if roots.len() > 1 {
        debug!("Multiple shape orders match {} {} shape points: {:?}", nspts, E::NAME, roots);
    }

    roots
        .first()
        .and_then(|root| usize::try_from(root).ok())
        .ok_or_else(|| Error::config(format!("invalid number of shape points for {} elements: {}", E::NAME, nspts)))
}

/// Finds all positive integer roots, in ascending order, of the integer polynomial with the
/// given coefficients in descending powers.
///
/// Candidates are the divisors of the lowest order non-zero coefficient, each of which is
/// checked with exact arithmetic.
pub fn positive_integer_roots(coeffs: &[BigInt]) -> Vec<BigInt> {
    // Factor out powers of x, since zero is not a positive root
    let trimmed = match coeffs.iter().rposition(|c| !c.is_zero()) {
        Some(last) => &coeffs[..=last],
        None => return Vec::new(),
    };
    let constant = match trimmed.last() {
        Some(c) => c.abs(),
        None => return Vec::new(),
    };

    let mut candidates = Vec::new();
    let mut d = BigInt::from(1);
    let limit = constant.sqrt();
    while d <= limit {
        if (&constant % &d).is_zero() {
            candidates.push(&constant / &d);
            candidates.push(d.clone());
        }
        d += 1u32;
    }
    candidates.sort();
    candidates.dedup();

    candidates
        .into_iter()
        .filter(|x| evaluate(trimmed, x).is_zero())
        .collect()
}

/// Finds the positive integer root of a polynomial with integer coefficients in descending
/// powers, all of which except the constant term are non-negative.
///
/// Such a polynomial is increasing on the positive integers, so at most one root exists and
/// it lies in `[1, |constant|]`. The root is found by bisection with exact arithmetic.
pub fn bisect_positive_integer_root(coeffs: &[BigInt]) -> Option<BigInt> {
    if coeffs.iter().all(Zero::is_zero) {
        return None;
    }
    let constant = coeffs.last()?.abs();
    let mut lo = BigInt::from(1);
    let mut hi = constant.max(BigInt::from(1));
    if evaluate(coeffs, &hi).is_negative() {
        return None;
    }

    // Smallest x in [lo, hi] with P(x) >= 0
    while lo < hi {
        let mid: BigInt = (&lo + &hi) / 2u32;
        if evaluate(coeffs, &mid).is_negative() {
            lo = mid + 1u32;
        } else {
            hi = mid;
        }
    }
    evaluate(coeffs, &lo).is_zero().then_some(lo)
}

fn evaluate(coeffs: &[BigInt], x: &BigInt) -> BigInt {
    coeffs
        .iter()
        .fold(BigInt::zero(), |acc, c| acc * x + c)
}
