use crate::element::{map_points, ElementType};
use crate::polys::Shape;
use crate::PointSet;
use nalgebra::DMatrix;
use std::f64::consts::{FRAC_1_SQRT_2, SQRT_2};

/// The reference triangle with vertices `(-1, -1)`, `(1, -1)` and `(-1, 1)`.
///
/// Faces are numbered counter-clockwise starting from the bottom edge, the hypotenuse being
/// face 1.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Tri;

impl ElementType for Tri {
    const NAME: &'static str = "tri";
    const SHAPE: Shape = Shape::Tri;
    const FACE_SHAPE: Shape = Shape::Line;
    const NFACES: usize = 3;
    const NSPTS_COEFFS: &'static [i64] = &[1, 1, 0];
    const NSPTS_CDENOM: i64 = 2;

    #[rustfmt::skip]
    fn face_normals() -> DMatrix<f64> {
        DMatrix::from_row_slice(3, 2, &[
             0.0,           -1.0,
             FRAC_1_SQRT_2,  FRAC_1_SQRT_2,
            -1.0,            0.0,
        ])
    }

    fn face_jacobians() -> Vec<f64> {
        vec![1.0, SQRT_2, 1.0]
    }

    fn project_to_face(face: usize, pts: &PointSet) -> PointSet {
        assert!(face < Self::NFACES, "triangles have three faces");
        map_points(pts, |x| {
            let s = x[0];
            match face {
                0 => [s, -1.0],
                1 => [-s, s],
                _ => [-1.0, -s],
            }
        })
    }
}
