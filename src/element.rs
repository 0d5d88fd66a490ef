//! Reference elements and their flux reconstruction operator matrices.
//!
//! An [`ElementBasis`] is generic over an [`ElementType`], which supplies the fixed geometry
//! of a reference element: its shape, the shape of its faces, how face coordinates map into
//! the element, and the outward normals and Jacobians of its faces. From this and the solver
//! configuration the basis derives solution, flux and quadrature points and, on first use,
//! each of the operator matrices `M0` to `M10`.
//!
//! Point sets always store one point per row. With `n` solution points, `F` flux points,
//! `Q` quadrature points and `d` dimensions, the operators are laid out as follows:
//!
//! | Operator | Shape          | Meaning                                                     |
//! |----------|----------------|-------------------------------------------------------------|
//! | `M0`     | `F x n`        | solution points to flux points                              |
//! | `M1`     | `d*n x n`      | gradient at solution points, dimension-major rows           |
//! | `M2`     | `F x d*n`      | normal component of a flux at flux points                   |
//! | `M3`     | `n x F`        | correction functions at solution points                     |
//! | `M4`     | `n x d*n`      | divergence at solution points                               |
//! | `M5`     | `n x nspts`    | shape points to solution points                             |
//! | `M6`     | `d*n x F`      | normal-weighted correction functions                        |
//! | `M7`     | `Q x n`        | solution points to quadrature points                        |
//! | `M8`     | `(F+Q) x n`    | `M0` stacked on top of `M7`                                 |
//! | `M9`     | `n x Q`        | weighted projection from quadrature points                  |
//! | `M10`    | `d*n x d*Q`    | `M9` repeated block-diagonally per dimension                |
use crate::algebra::{self, Operator};
use crate::config::Config;
use crate::polys::{PolyBasis, Shape};
use crate::quadrature::{get_quadrule, get_quadrule_by_degree, QuadratureRule, EQUI_SPACED};
use crate::util::{block_diag, chop, vstack};
use crate::{Error, PointSet};
use log::{debug, info};
use nalgebra::DMatrix;
use std::fmt::{self, Debug};
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::OnceLock;

mod face;
mod hex;
mod line;
mod quad;
mod spts;
mod tri;

pub use face::*;
pub use hex::*;
pub use line::*;
pub use quad::*;
pub use spts::*;
pub use tri::*;

/// Fixed geometric data of a reference element.
pub trait ElementType: Debug + Copy + Send + Sync + 'static {
    /// Name used in configuration sections, e.g. `solver-elements-quad`.
    const NAME: &'static str;
    const SHAPE: Shape;
    const FACE_SHAPE: Shape;
    const NFACES: usize;

    /// Coefficients, in descending powers, of the polynomial `P` such that an element with
    /// `n` shape points per edge has `P(n) / NSPTS_CDENOM` shape points.
    const NSPTS_COEFFS: &'static [i64];
    const NSPTS_CDENOM: i64;

    /// Outward unit normals of the faces, one row per face.
    fn face_normals() -> DMatrix<f64>;

    /// Ratio between the measure of each face and the measure of the reference face shape.
    fn face_jacobians() -> Vec<f64>;

    /// Maps points on the reference face shape onto the given face of the element.
    fn project_to_face(face: usize, pts: &PointSet) -> PointSet;

    /// Equi-spaced points defining a shape function of the given order on the element.
    fn std_ele(sptord: usize) -> Result<PointSet, Error> {
        Ok(get_quadrule(Self::SHAPE, EQUI_SPACED, Self::SHAPE.nbasis(sptord))?
            .points()
            .clone())
    }
}

/// Maps every row of `pts` through `f`.
pub(crate) fn map_points<const D: usize>(pts: &PointSet, f: impl Fn(&[f64]) -> [f64; D]) -> PointSet {
    let mut result = PointSet::zeros(pts.nrows(), D);
    let mut x = vec![0.0; pts.ncols()];
    for (i, row) in pts.row_iter().enumerate() {
        for (xi, ri) in x.iter_mut().zip(row.iter()) {
            *xi = *ri;
        }
        for (d, yd) in f(&x).into_iter().enumerate() {
            result[(i, d)] = yd;
        }
    }
    result
}

/// Which parts of the flux evaluation are computed at quadrature points.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct AntiAlias {
    pub flux: bool,
    pub div_flux: bool,
}

impl AntiAlias {
    pub fn is_enabled(&self) -> bool {
        self.flux || self.div_flux
    }
}

impl FromStr for AntiAlias {
    type Err = Error;

    /// Parses a comma separated list of `flux` and `div-flux`, ignoring `none`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut result = Self::default();
        for token in s.split(',').map(str::trim) {
            match token {
                "none" => {}
                "flux" => result.flux = true,
                "div-flux" => result.div_flux = true,
                _ => return Err(Error::config(format!("invalid anti-aliasing option {:?} in {:?}", token, s))),
            }
        }
        Ok(result)
    }
}

impl fmt::Display for AntiAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.flux, self.div_flux) {
            (false, false) => write!(f, "none"),
            (true, false) => write!(f, "flux"),
            (false, true) => write!(f, "div-flux"),
            (true, true) => write!(f, "flux, div-flux"),
        }
    }
}

#[derive(Debug)]
struct ShapePoints {
    order: usize,
    basis: PolyBasis,
    m5: OnceLock<DMatrix<f64>>,
}

/// Solution, flux and quadrature points of a reference element together with its lazily
/// computed operator matrices.
///
/// Each operator is computed at most once and is safe to request from several threads.
pub struct ElementBasis<E: ElementType> {
    order: usize,
    antialias: AntiAlias,
    ubasis: PolyBasis,
    shape_points: Option<ShapePoints>,
    qrule: QuadratureRule,
    facefpts: Vec<PointSet>,
    fbasis_coeffs: DMatrix<f64>,
    operators: [OnceLock<DMatrix<f64>>; Operator::COUNT],
    marker: PhantomData<E>,
}

impl<E: ElementType> Debug for ElementBasis<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementBasis")
            .field("element", &E::NAME)
            .field("order", &self.order)
            .field("antialias", &self.antialias)
            .field("nupts", &self.nupts())
            .field("nfpts", &self.nfpts())
            .field("nqpts", &self.nqpts())
            .finish()
    }
}

/// Section holding element specific options, e.g. `solver-elements-tri`.
pub fn element_section<E: ElementType>() -> String {
    format!("solver-elements-{}", E::NAME)
}

impl<E: ElementType> ElementBasis<E> {
    /// Builds the basis of an element with `nspts` shape points from the configuration.
    ///
    /// Shape point data is only available when `nspts` is given. All configuration errors,
    /// including those of the face flux points, are reported here rather than when an
    /// operator is first requested.
    pub fn new(nspts: Option<usize>, cfg: &Config) -> Result<Self, Error> {
        let order = cfg.get_usize("solver", "order")?;
        if E::SHAPE.checked_nbasis(order).is_none() {
            return Err(Error::config(format!("solution order {} is too large for {} elements", order, E::NAME)));
        }
        let antialias: AntiAlias = cfg.get_or("solver", "anti-alias", "none").parse()?;
        let sect = element_section::<E>();

        let upts = get_quadrule(E::SHAPE, cfg.get(&sect, "soln-pts")?, E::SHAPE.nbasis(order))?
            .points()
            .clone();
        let ubasis = PolyBasis::new(E::SHAPE, order, upts)?;

        let shape_points = match nspts {
            Some(nspts) => {
                let sptord = order_from_nspts::<E>(nspts)?;
                // The shape order is one less than the number of points per edge
                let degree = sptord.checked_sub(1).ok_or_else(|| {
                    Error::config(format!("{} elements need at least one shape point per edge", E::NAME))
                })?;
                let basis = PolyBasis::new(E::SHAPE, degree, E::std_ele(degree)?)?;
                Some(ShapePoints {
                    order: sptord,
                    basis,
                    m5: OnceLock::new(),
                })
            }
            None => None,
        };

        let qrule = element_quadrature::<E>(cfg, order)?;

        let nffpts = E::FACE_SHAPE.nbasis(order);
        let ffpts = face_flux_points(E::FACE_SHAPE, cfg, nffpts)?;
        let facefpts = (0..E::NFACES)
            .map(|face| E::project_to_face(face, &ffpts))
            .collect();
        let fbasis_coeffs =
            face_basis_coefficients(&ubasis, cfg, E::FACE_SHAPE, E::project_to_face, &E::face_jacobians(), nffpts)?;

        let basis = Self {
            order,
            antialias,
            ubasis,
            shape_points,
            qrule,
            facefpts,
            fbasis_coeffs,
            operators: Default::default(),
            marker: PhantomData,
        };
        info!(
            "Constructed {} basis of order {}: {} solution points, {} flux points, {} quadrature points ({})",
            E::NAME,
            order,
            basis.nupts(),
            basis.nfpts(),
            basis.nqpts(),
            basis.qrule.name()
        );
        Ok(basis)
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn antialias(&self) -> AntiAlias {
        self.antialias
    }

    pub fn ndims(&self) -> usize {
        E::SHAPE.ndims()
    }

    pub fn ubasis(&self) -> &PolyBasis {
        &self.ubasis
    }

    pub fn upts(&self) -> &PointSet {
        self.ubasis.points()
    }

    pub fn nupts(&self) -> usize {
        self.upts().nrows()
    }

    /// Nodal basis of the shape points, if the element was built with them.
    pub fn sbasis(&self) -> Option<&PolyBasis> {
        self.shape_points.as_ref().map(|sp| &sp.basis)
    }

    /// Number of shape points per edge.
    pub fn nsptsord(&self) -> Option<usize> {
        self.shape_points.as_ref().map(|sp| sp.order)
    }

    pub fn spts(&self) -> Option<&PointSet> {
        self.sbasis().map(PolyBasis::points)
    }

    pub fn nspts(&self) -> Option<usize> {
        self.spts().map(|spts| spts.nrows())
    }

    pub fn qrule(&self) -> &QuadratureRule {
        &self.qrule
    }

    pub fn qpts(&self) -> &PointSet {
        self.qrule.points()
    }

    pub fn nqpts(&self) -> usize {
        self.qrule.len()
    }

    /// Flux points of each face.
    pub fn facefpts(&self) -> &[PointSet] {
        &self.facefpts
    }

    pub fn nfacefpts(&self) -> Vec<usize> {
        self.facefpts.iter().map(|pts| pts.nrows()).collect()
    }

    /// All flux points, ordered by face.
    pub fn fpts(&self) -> PointSet {
        let faces: Vec<_> = self.facefpts.iter().collect();
        vstack(&faces)
    }

    pub fn nfpts(&self) -> usize {
        self.facefpts.iter().map(|pts| pts.nrows()).sum()
    }

    /// Outward unit normal at every flux point.
    pub fn norm_fpts(&self) -> DMatrix<f64> {
        let normals = E::face_normals();
        let mut result = DMatrix::zeros(self.nfpts(), self.ndims());
        let mut i = 0;
        for (face, pts) in self.facefpts.iter().enumerate() {
            for _ in 0..pts.nrows() {
                result.row_mut(i).copy_from(&normals.row(face));
                i += 1;
            }
        }
        result
    }

    /// Coefficients of the face basis in the orthonormal solution basis, one row per flux point.
    pub fn fbasis_coeffs(&self) -> &DMatrix<f64> {
        &self.fbasis_coeffs
    }

    /// Evaluates the correction functions of every flux point at the given points.
    ///
    /// The result has one row per point and one column per flux point.
    pub fn face_basis_at(&self, pts: &PointSet) -> DMatrix<f64> {
        chop((&self.fbasis_coeffs * self.ubasis.ortho_basis_at(pts)).transpose())
    }

    /// Returns the requested operator matrix, computing it on first use.
    ///
    /// Fails only for `M5` on an element built without shape points.
    pub fn operator(&self, op: Operator) -> Result<&DMatrix<f64>, Error> {
        match op {
            Operator::M5 => self.m5(),
            op => Ok(self.cached(op)),
        }
    }

    /// Evaluates an operator expression such as `M1 - M3*M2`.
    pub fn opmat(&self, expr: &str) -> Result<DMatrix<f64>, Error> {
        debug!("Evaluating operator expression {:?} for {} elements", expr, E::NAME);
        algebra::evaluate(expr, |op| self.operator(op)).map(chop)
    }

    pub fn m0(&self) -> &DMatrix<f64> {
        self.cached(Operator::M0)
    }

    pub fn m1(&self) -> &DMatrix<f64> {
        self.cached(Operator::M1)
    }

    pub fn m2(&self) -> &DMatrix<f64> {
        self.cached(Operator::M2)
    }

    pub fn m3(&self) -> &DMatrix<f64> {
        self.cached(Operator::M3)
    }

    pub fn m4(&self) -> &DMatrix<f64> {
        self.cached(Operator::M4)
    }

    pub fn m5(&self) -> Result<&DMatrix<f64>, Error> {
        let sp = self.shape_points.as_ref().ok_or_else(|| {
            Error::config(format!("{} basis was constructed without shape points", E::NAME))
        })?;
        Ok(sp
            .m5
            .get_or_init(|| sp.basis.nodal_basis_at(self.upts())))
    }

    pub fn m6(&self) -> &DMatrix<f64> {
        self.cached(Operator::M6)
    }

    pub fn m7(&self) -> &DMatrix<f64> {
        self.cached(Operator::M7)
    }

    pub fn m8(&self) -> &DMatrix<f64> {
        self.cached(Operator::M8)
    }

    pub fn m9(&self) -> &DMatrix<f64> {
        self.cached(Operator::M9)
    }

    pub fn m10(&self) -> &DMatrix<f64> {
        self.cached(Operator::M10)
    }

    fn cached(&self, op: Operator) -> &DMatrix<f64> {
        self.operators[op.index()].get_or_init(|| {
            let m = self.compute(op);
            debug!("Computed {} for {} elements: {}x{}", op, E::NAME, m.nrows(), m.ncols());
            m
        })
    }

    fn compute(&self, op: Operator) -> DMatrix<f64> {
        let (n, d) = (self.nupts(), self.ndims());
        match op {
            Operator::M0 => self.ubasis.nodal_basis_at(&self.fpts()),
            Operator::M1 => {
                let jac = self.ubasis.jac_nodal_basis_at(self.upts());
                let blocks: Vec<_> = jac.iter().collect();
                vstack(&blocks)
            }
            Operator::M2 => {
                let (m0, norms) = (self.m0(), self.norm_fpts());
                DMatrix::from_fn(m0.nrows(), d * n, |f, col| norms[(f, col / n)] * m0[(f, col % n)])
            }
            Operator::M3 => self.face_basis_at(self.upts()),
            Operator::M4 => {
                let m1 = self.m1();
                DMatrix::from_fn(n, d * n, |i, col| m1[((col / n) * n + i, col % n)])
            }
            Operator::M5 => unreachable!("shape point operators are cached with the shape basis"),
            Operator::M6 => {
                let (m3, norms) = (self.m3(), self.norm_fpts());
                DMatrix::from_fn(d * n, m3.ncols(), |row, f| norms[(f, row / n)] * m3[(row % n, f)])
            }
            Operator::M7 => self.ubasis.nodal_basis_at(self.qpts()),
            Operator::M8 => vstack(&[self.m0(), self.m7()]),
            Operator::M9 => {
                let mut ortho = self.ubasis.ortho_basis_at(self.qpts());
                for (mut col, w) in ortho.column_iter_mut().zip(self.qrule.weights().iter()) {
                    col *= *w;
                }
                chop(self.ubasis.vdm().transpose() * ortho)
            }
            Operator::M10 => {
                let m9 = self.m9();
                block_diag(&vec![m9; d])
            }
        }
    }
}

/// Quadrature rule used for anti-aliasing, `quad-pts` and `quad-deg` overriding the shape's
/// default rule of degree twice the solution order.
fn element_quadrature<E: ElementType>(cfg: &Config, order: usize) -> Result<QuadratureRule, Error> {
    let sect = element_section::<E>();
    let degree = match cfg.get_int_opt(&sect, "quad-deg")? {
        Some(deg) => usize::try_from(deg)
            .map_err(|_| Error::config(format!("option {}.quad-deg must be non-negative, got {}", sect, deg)))?,
        None => order.saturating_mul(2),
    };
    get_quadrule_by_degree(E::SHAPE, cfg.get_opt(&sect, "quad-pts"), degree)
}
