use crate::element::{map_points, ElementType};
use crate::polys::Shape;
use crate::PointSet;
use nalgebra::DMatrix;

/// The reference quadrilateral `[-1, 1]^2`.
///
/// Faces are numbered counter-clockwise starting from the bottom edge `y = -1`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Quad;

impl ElementType for Quad {
    const NAME: &'static str = "quad";
    const SHAPE: Shape = Shape::Quad;
    const FACE_SHAPE: Shape = Shape::Line;
    const NFACES: usize = 4;
    const NSPTS_COEFFS: &'static [i64] = &[1, 0, 0];
    const NSPTS_CDENOM: i64 = 1;

    #[rustfmt::skip]
    fn face_normals() -> DMatrix<f64> {
        DMatrix::from_row_slice(4, 2, &[
             0.0, -1.0,
             1.0,  0.0,
             0.0,  1.0,
            -1.0,  0.0,
        ])
    }

    fn face_jacobians() -> Vec<f64> {
        vec![1.0; 4]
    }

    fn project_to_face(face: usize, pts: &PointSet) -> PointSet {
        assert!(face < Self::NFACES, "quadrilaterals have four faces");
        map_points(pts, |x| {
            let s = x[0];
            match face {
                0 => [s, -1.0],
                1 => [1.0, s],
                2 => [-s, 1.0],
                _ => [-1.0, -s],
            }
        })
    }
}
