//! Dense matrix helpers shared by the operator construction routines.
use nalgebra::DMatrix;

/// Absolute distance to the nearest integer below which [`chop`] snaps an entry.
pub const CHOP_TOLERANCE: f64 = 1e-14;

/// Snaps entries within [`CHOP_TOLERANCE`] of an integer to that integer.
///
/// Operator matrices are frequently composed with each other, and entries which are
/// analytically integers (in particular zeros) would otherwise carry round-off into every
/// product. The operation is idempotent.
pub fn chop(mut matrix: DMatrix<f64>) -> DMatrix<f64> {
    chop_in_place(&mut matrix);
    matrix
}

pub fn chop_in_place(matrix: &mut DMatrix<f64>) {
    for x in matrix.iter_mut() {
        let nearest = x.round();
        if (*x - nearest).abs() < CHOP_TOLERANCE {
            // Adding zero also turns -0.0 into 0.0
            *x = nearest + 0.0;
        }
    }
}

/// Assembles a block diagonal matrix from the given blocks.
pub fn block_diag(blocks: &[&DMatrix<f64>]) -> DMatrix<f64> {
    let nrows = blocks.iter().map(|b| b.nrows()).sum();
    let ncols = blocks.iter().map(|b| b.ncols()).sum();
    let mut result = DMatrix::zeros(nrows, ncols);

    let (mut i, mut j) = (0, 0);
    for block in blocks {
        result
            .view_mut((i, j), block.shape())
            .copy_from(*block);
        i += block.nrows();
        j += block.ncols();
    }
    result
}

/// Stacks matrices with the same number of columns on top of each other.
///
/// # Panics
///
/// Panics if the number of columns differ.
pub fn vstack(blocks: &[&DMatrix<f64>]) -> DMatrix<f64> {
    let ncols = blocks.first().map(|b| b.ncols()).unwrap_or(0);
    assert!(
        blocks.iter().all(|b| b.ncols() == ncols),
        "all blocks must have the same number of columns"
    );
    let nrows = blocks.iter().map(|b| b.nrows()).sum();
    let mut result = DMatrix::zeros(nrows, ncols);

    let mut i = 0;
    for block in blocks {
        result.rows_mut(i, block.nrows()).copy_from(*block);
        i += block.nrows();
    }
    result
}
