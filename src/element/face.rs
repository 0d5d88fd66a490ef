use crate::config::Config;
use crate::polys::{PolyBasis, Shape};
use crate::quadrature::{get_quadrule, QuadratureRule, GAUSS_LEGENDRE};
use crate::{Error, PointSet};
use nalgebra::DMatrix;

/// Quadrature rule used to project face bases into the element's solution basis.
pub fn face_quadrature_rule(face_shape: Shape, order: usize) -> Result<QuadratureRule, Error> {
    let n = order + 1;
    match face_shape {
        Shape::Point => get_quadrule(Shape::Point, "point", 1),
        Shape::Line => get_quadrule(Shape::Line, GAUSS_LEGENDRE, n),
        Shape::Quad => get_quadrule(Shape::Quad, GAUSS_LEGENDRE, n * n),
        _ => Err(Error::config(format!(
            "no face quadrature rule registered for {} faces",
            face_shape
        ))),
    }
}

/// Flux points on the reference face shape, read from `solver-interfaces-<face>.flux-pts`.
///
/// Point faces have a single flux point and need no configuration.
pub fn face_flux_points(face_shape: Shape, cfg: &Config, nffpts: usize) -> Result<PointSet, Error> {
    let rule = match face_shape {
        Shape::Point => get_quadrule(Shape::Point, "point", nffpts)?,
        _ => {
            let sect = format!("solver-interfaces-{}", face_shape);
            get_quadrule(face_shape, cfg.get(&sect, "flux-pts")?, nffpts)?
        }
    };
    Ok(rule.points().clone())
}

/// Expresses the nodal basis of every face, scaled by its face Jacobian, in the orthonormal
/// basis of the element.
///
/// The face basis is projected with a quadrature rule on the face shape. Rows of the result
/// correspond to flux points ordered by face and columns to orthonormal modes of `ubasis`.
pub fn face_basis_coefficients<F>(
    ubasis: &PolyBasis,
    cfg: &Config,
    face_shape: Shape,
    fproj: F,
    fdjacs: &[f64],
    nffpts: usize,
) -> Result<DMatrix<f64>, Error>
where
    F: Fn(usize, &PointSet) -> PointSet,
{
    let order = ubasis.degree();
    let qrule = face_quadrature_rule(face_shape, order)?;
    let ffpts = face_flux_points(face_shape, cfg, nffpts)?;
    let face_basis = PolyBasis::new(face_shape, order, ffpts)?;

    // Face nodal basis at the face quadrature points, weighted
    let mut weighted = face_basis.nodal_basis_at(qrule.points());
    for (mut row, w) in weighted.row_iter_mut().zip(qrule.weights().iter()) {
        row *= *w;
    }
    let weighted = weighted.transpose();

    let mut result = DMatrix::zeros(fdjacs.len() * nffpts, ubasis.nbasis());
    for (face, &fdjac) in fdjacs.iter().enumerate() {
        let ortho = ubasis.ortho_basis_at(&fproj(face, qrule.points()));
        let coeffs = &weighted * ortho.transpose() * fdjac;
        result.rows_mut(face * nffpts, nffpts).copy_from(&coeffs);
    }
    Ok(result)
}
