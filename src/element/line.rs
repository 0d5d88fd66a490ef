use crate::element::{map_points, ElementType};
use crate::polys::Shape;
use crate::PointSet;
use nalgebra::DMatrix;

/// The reference line `[-1, 1]`, with faces at `x = -1` and `x = 1`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Line;

impl ElementType for Line {
    const NAME: &'static str = "line";
    const SHAPE: Shape = Shape::Line;
    const FACE_SHAPE: Shape = Shape::Point;
    const NFACES: usize = 2;
    const NSPTS_COEFFS: &'static [i64] = &[1, 0];
    const NSPTS_CDENOM: i64 = 1;

    fn face_normals() -> DMatrix<f64> {
        DMatrix::from_row_slice(2, 1, &[-1.0, 1.0])
    }

    fn face_jacobians() -> Vec<f64> {
        vec![1.0, 1.0]
    }

    fn project_to_face(face: usize, pts: &PointSet) -> PointSet {
        assert!(face < Self::NFACES, "line elements have two faces");
        let x = if face == 0 { -1.0 } else { 1.0 };
        map_points(pts, |_| [x])
    }
}
