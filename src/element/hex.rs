use crate::element::{map_points, ElementType};
use crate::polys::Shape;
use crate::PointSet;
use nalgebra::DMatrix;

/// The reference hexahedron `[-1, 1]^3`.
///
/// Faces are ordered `z = -1`, `y = -1`, `x = 1`, `y = 1`, `x = -1` and `z = 1`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Hex;

impl ElementType for Hex {
    const NAME: &'static str = "hex";
    const SHAPE: Shape = Shape::Hex;
    const FACE_SHAPE: Shape = Shape::Quad;
    const NFACES: usize = 6;
    const NSPTS_COEFFS: &'static [i64] = &[1, 0, 0, 0];
    const NSPTS_CDENOM: i64 = 1;

    #[rustfmt::skip]
    fn face_normals() -> DMatrix<f64> {
        DMatrix::from_row_slice(6, 3, &[
             0.0,  0.0, -1.0,
             0.0, -1.0,  0.0,
             1.0,  0.0,  0.0,
             0.0,  1.0,  0.0,
            -1.0,  0.0,  0.0,
             0.0,  0.0,  1.0,
        ])
    }

    fn face_jacobians() -> Vec<f64> {
        vec![1.0; 6]
    }

    fn project_to_face(face: usize, pts: &PointSet) -> PointSet {
        assert!(face < Self::NFACES, "hexahedra have six faces");
        map_points(pts, |x| {
            let (s, t) = (x[0], x[1]);
            match face {
                0 => [s, t, -1.0],
                1 => [s, -1.0, t],
                2 => [1.0, s, t],
                3 => [-s, 1.0, t],
                4 => [-1.0, -s, t],
                _ => [s, t, 1.0],
            }
        })
    }
}
