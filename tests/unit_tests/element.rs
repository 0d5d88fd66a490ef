use crate::default_config;
use fluxrec::element::{
    face_quadrature_rule, nspts_from_order, order_from_nspts, positive_integer_roots, AntiAlias, ElementBasis,
    ElementType, Hex, Line, Quad, Tri,
};
use fluxrec::nalgebra::{DMatrix, DVector};
use fluxrec::polys::Shape;
use fluxrec::util::chop;
use fluxrec::{Error, PointSet};
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use num::BigInt;
use paste::paste;
use proptest::prelude::*;
use std::f64::consts::SQRT_2;

fn basis<E: ElementType>(order: usize) -> ElementBasis<E> {
    ElementBasis::new(None, &default_config(order)).unwrap()
}

fn face_measure(face_shape: Shape) -> f64 {
    match face_shape {
        Shape::Point => 1.0,
        Shape::Line => 2.0,
        Shape::Quad => 4.0,
        shape => panic!("unexpected face shape {}", shape),
    }
}

/// A polynomial of total degree two along with its gradient.
fn quadratic(x: &[f64]) -> (f64, Vec<f64>) {
    match *x {
        [x] => (x * x - x, vec![2.0 * x - 1.0]),
        [x, y] => (x * x + x * y - y * y, vec![2.0 * x + y, x - 2.0 * y]),
        [x, y, z] => (x * x + y * z - z * z, vec![2.0 * x, z, y - 2.0 * z]),
        _ => panic!("unexpected dimension"),
    }
}

fn point(pts: &PointSet, i: usize) -> Vec<f64> {
    pts.row(i).iter().copied().collect()
}

#[test]
fn line_order_three_with_gauss_legendre_points() {
    let basis = basis::<Line>(3);

    assert_eq!(basis.nupts(), 4);
    assert_eq!(basis.nfacefpts(), vec![1, 1]);
    assert_eq!(basis.nfpts(), 2);
    assert_eq!(basis.m0().shape(), (2, 4));
    assert_eq!(basis.antialias(), AntiAlias::default());

    let fpts = basis.fpts();
    assert_eq!(fpts, DMatrix::from_row_slice(2, 1, &[-1.0, 1.0]));
    assert_eq!(basis.norm_fpts(), DMatrix::from_row_slice(2, 1, &[-1.0, 1.0]));

    // Extrapolating a cubic to the end points is exact
    let u = DVector::from_iterator(4, basis.upts().iter().map(|&x| x.powi(3) + x));
    assert_matrix_eq!(basis.m0() * u, DVector::from_vec(vec![-2.0, 2.0]), comp = abs, tol = 1e-12);
}

#[test]
fn quad_normals_scale_interpolation_and_correction_operators() {
    let basis = basis::<Quad>(2);
    let (n, f) = (basis.nupts(), basis.nfpts());
    let norms = basis.norm_fpts();

    for k in 0..2 {
        let m2_block = basis.m2().columns(k * n, n).clone_owned();
        let expected = DMatrix::from_diagonal(&norms.column(k).clone_owned()) * basis.m0();
        assert_matrix_eq!(m2_block, expected, comp = abs, tol = 1e-14);

        let m6_block = basis.m6().rows(k * n, n).clone_owned();
        let expected = basis.m3() * DMatrix::from_diagonal(&norms.column(k).clone_owned());
        assert_matrix_eq!(m6_block, expected, comp = abs, tol = 1e-14);
    }
    assert_eq!(basis.m6().shape(), (2 * n, f));
}

#[test]
fn triangle_hypotenuse_has_scaled_normal_and_jacobian() {
    let basis = basis::<Tri>(2);
    assert_eq!(basis.nfacefpts(), vec![3, 3, 3]);
    assert_eq!(Tri::face_jacobians(), vec![1.0, SQRT_2, 1.0]);

    let norms = basis.norm_fpts();
    for i in 3..6 {
        assert_scalar_eq!(norms[(i, 0)], SQRT_2 / 2.0, comp = abs, tol = 1e-15);
        assert_scalar_eq!(norms[(i, 1)], SQRT_2 / 2.0, comp = abs, tol = 1e-15);
    }
}

fn check_operator_shapes<E: ElementType>(order: usize) {
    let basis = basis::<E>(order);
    let (n, f, q, d) = (basis.nupts(), basis.nfpts(), basis.nqpts(), basis.ndims());

    assert_eq!(n, E::SHAPE.nbasis(order));
    assert_eq!(f, E::NFACES * E::FACE_SHAPE.nbasis(order));
    assert_eq!(basis.facefpts().len(), E::NFACES);

    assert_eq!(basis.m0().shape(), (f, n));
    assert_eq!(basis.m1().shape(), (d * n, n));
    assert_eq!(basis.m2().shape(), (f, d * n));
    assert_eq!(basis.m3().shape(), (n, f));
    assert_eq!(basis.m4().shape(), (n, d * n));
    assert_eq!(basis.m6().shape(), (d * n, f));
    assert_eq!(basis.m7().shape(), (q, n));
    assert_eq!(basis.m8().shape(), (f + q, n));
    assert_eq!(basis.m9().shape(), (n, q));
    assert_eq!(basis.m10().shape(), (d * n, d * q));
    assert_eq!(basis.fbasis_coeffs().shape(), (f, n));
}

fn check_interpolation_is_partition_of_unity<E: ElementType>(order: usize) {
    let basis = basis::<E>(order);
    for op in [basis.m0(), basis.m7(), basis.m8()] {
        let row_sums = op * DVector::repeat(basis.nupts(), 1.0);
        assert_matrix_eq!(row_sums, DVector::repeat(op.nrows(), 1.0), comp = abs, tol = 1e-12);
    }
}

fn check_gradient_is_exact_for_quadratics<E: ElementType>() {
    let basis = basis::<E>(2);
    let (n, d) = (basis.nupts(), basis.ndims());
    let upts = basis.upts();

    let u = DVector::from_fn(n, |i, _| quadratic(&point(upts, i)).0);
    let expected = DVector::from_fn(d * n, |row, _| quadratic(&point(upts, row % n)).1[row / n]);
    assert_matrix_eq!(basis.m1() * &u, expected, comp = abs, tol = 1e-11);

    // The divergence of (u, 0, ...) is the first partial derivative
    let mut flux = DVector::zeros(d * n);
    flux.rows_mut(0, n).copy_from(&u);
    assert_matrix_eq!(basis.m4() * flux, expected.rows(0, n).clone_owned(), comp = abs, tol = 1e-11);
}

fn check_projection_reproduces_solution_polynomials<E: ElementType>(order: usize) {
    let basis = basis::<E>(order);
    let n = basis.nupts();
    assert_matrix_eq!(basis.m9() * basis.m7(), DMatrix::<f64>::identity(n, n), comp = abs, tol = 1e-12);
}

fn check_face_correction_lifts_constants<E: ElementType>(order: usize) {
    let basis = basis::<E>(order);
    let qweights = basis.qrule().weights();
    let integrals = basis.face_basis_at(basis.qpts()).transpose() * qweights;

    let mut offset = 0;
    for (face, fdjac) in E::face_jacobians().into_iter().enumerate() {
        let nfp = basis.nfacefpts()[face];
        let total: f64 = integrals.rows(offset, nfp).sum();
        assert_scalar_eq!(total, fdjac * face_measure(E::FACE_SHAPE), comp = abs, tol = 1e-11);
        offset += nfp;
    }
}

fn check_face_points_lie_on_their_faces<E: ElementType>(order: usize) {
    let basis = basis::<E>(order);
    let normals = E::face_normals();

    for (face, pts) in basis.facefpts().iter().enumerate() {
        let distances = pts * normals.row(face).transpose();
        let d0 = distances[0];
        assert!(d0 > -1e-14);
        for d in distances.iter() {
            assert_scalar_eq!(*d, d0, comp = abs, tol = 1e-14);
        }
    }
}

fn check_operator_expressions<E: ElementType>(order: usize) {
    let basis = basis::<E>(order);

    let doubled = basis.opmat("M0+M0").unwrap();
    assert_matrix_eq!(doubled, basis.m0() * 2.0, comp = abs, tol = 1e-13);

    let divergence = basis.opmat("M4 - M3*M2").unwrap();
    let expected = basis.m4() - basis.m3() * basis.m2();
    assert_matrix_eq!(divergence, expected, comp = abs, tol = 1e-12);

    let chopped = chop(basis.m3().clone());
    assert_eq!(chop(chopped.clone()), chopped);
    assert_eq!(chop(divergence.clone()), divergence);
}

macro_rules! element_tests {
    ($($element:ident),*) => {
        $(
            paste! {
                #[test]
                fn [<operator_shapes_ $element:lower>]() {
                    for order in 1..=3 {
                        check_operator_shapes::<$element>(order);
                    }
                }

                #[test]
                fn [<interpolation_is_partition_of_unity_ $element:lower>]() {
                    check_interpolation_is_partition_of_unity::<$element>(2);
                }

                #[test]
                fn [<gradient_is_exact_for_quadratics_ $element:lower>]() {
                    check_gradient_is_exact_for_quadratics::<$element>();
                }

                #[test]
                fn [<projection_reproduces_solution_polynomials_ $element:lower>]() {
                    for order in 1..=3 {
                        check_projection_reproduces_solution_polynomials::<$element>(order);
                    }
                }

                #[test]
                fn [<face_correction_lifts_constants_ $element:lower>]() {
                    for order in 1..=3 {
                        check_face_correction_lifts_constants::<$element>(order);
                    }
                }

                #[test]
                fn [<face_points_lie_on_their_faces_ $element:lower>]() {
                    check_face_points_lie_on_their_faces::<$element>(2);
                }

                #[test]
                fn [<operator_expressions_ $element:lower>]() {
                    check_operator_expressions::<$element>(2);
                }
            }
        )*
    };
}

element_tests!(Line, Quad, Tri, Hex);

#[test]
fn shape_point_counts() {
    assert_eq!(nspts_from_order::<Line>(3), 3);
    assert_eq!(nspts_from_order::<Quad>(3), 9);
    assert_eq!(nspts_from_order::<Tri>(3), 6);
    assert_eq!(nspts_from_order::<Hex>(3), 27);

    assert_eq!(order_from_nspts::<Tri>(10), Ok(4));
    assert_eq!(order_from_nspts::<Hex>(8), Ok(2));

    // Counts near the top of the range are inverted without enumerating divisors
    assert_eq!(order_from_nspts::<Line>(usize::MAX), Ok(usize::MAX));
    assert_eq!(order_from_nspts::<Quad>(((1usize << 32) - 1).pow(2)), Ok((1 << 32) - 1));
    assert_eq!(order_from_nspts::<Hex>(1 << 63), Ok(1 << 21));
    assert!(order_from_nspts::<Quad>(usize::MAX).is_err());
    assert!(order_from_nspts::<Tri>(usize::MAX).is_err());
    for (invalid_tri, invalid_quad) in [(0, 0), (2, 2), (4, 5), (7, 8)] {
        assert!(matches!(order_from_nspts::<Tri>(invalid_tri), Err(Error::InvalidConfiguration(_))));
        assert!(matches!(order_from_nspts::<Quad>(invalid_quad), Err(Error::InvalidConfiguration(_))));
    }
}

fn shape_point_roots<E: ElementType>(nspts: usize) -> Vec<BigInt> {
    let mut coeffs: Vec<_> = E::NSPTS_COEFFS.iter().copied().map(BigInt::from).collect();
    if let Some(last) = coeffs.last_mut() {
        *last -= BigInt::from(E::NSPTS_CDENOM) * BigInt::from(nspts);
    }
    positive_integer_roots(&coeffs)
}

proptest! {
    #[test]
    fn shape_point_order_round_trips(sptord in 1usize..200) {
        prop_assert_eq!(order_from_nspts::<Line>(nspts_from_order::<Line>(sptord)), Ok(sptord));
        prop_assert_eq!(order_from_nspts::<Quad>(nspts_from_order::<Quad>(sptord)), Ok(sptord));
        prop_assert_eq!(order_from_nspts::<Tri>(nspts_from_order::<Tri>(sptord)), Ok(sptord));
        prop_assert_eq!(order_from_nspts::<Hex>(nspts_from_order::<Hex>(sptord)), Ok(sptord));
    }

    #[test]
    fn shape_point_order_is_unique(sptord in 1usize..100) {
        prop_assert_eq!(shape_point_roots::<Quad>(nspts_from_order::<Quad>(sptord)).len(), 1);
        prop_assert_eq!(shape_point_roots::<Tri>(nspts_from_order::<Tri>(sptord)).len(), 1);
        prop_assert_eq!(shape_point_roots::<Hex>(nspts_from_order::<Hex>(sptord)).len(), 1);
    }
}

#[test]
fn shape_points_define_the_geometric_operator() {
    let cfg = default_config(2);
    let quad = ElementBasis::<Quad>::new(Some(9), &cfg).unwrap();
    assert_eq!(quad.nsptsord(), Some(3));
    assert_eq!(quad.nspts(), Some(9));

    let m5 = quad.m5().unwrap();
    assert_eq!(m5.shape(), (quad.nupts(), 9));
    let row_sums = m5 * DVector::repeat(9, 1.0);
    assert_matrix_eq!(row_sums, DVector::repeat(quad.nupts(), 1.0), comp = abs, tol = 1e-12);
    assert_eq!(quad.opmat("M5").unwrap().shape(), (9, 9));

    // Straight sided shape functions map the shape points to themselves
    let tri = ElementBasis::<Tri>::new(Some(3), &cfg).unwrap();
    let spts = tri.spts().unwrap();
    let mapped = tri.m5().unwrap() * spts;
    assert_matrix_eq!(mapped, tri.upts().clone(), comp = abs, tol = 1e-12);
}

#[test]
fn missing_shape_points_only_fail_the_geometric_operator() {
    let basis = basis::<Quad>(2);
    assert!(matches!(basis.m5(), Err(Error::InvalidConfiguration(_))));
    assert!(matches!(basis.opmat("M5 + M5"), Err(Error::InvalidConfiguration(_))));
    assert!(basis.opmat("M0").is_ok());

    let result = ElementBasis::<Quad>::new(Some(5), &default_config(2));
    assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
}

#[test]
fn opmat_rejects_expressions_outside_the_operator_language() {
    let basis = basis::<Line>(3);
    for expr in ["M0; rm -rf", "__import__('os')", "M0.T", "M0 @ M1", ""] {
        assert!(
            matches!(basis.opmat(expr), Err(Error::InvalidExpression(_))),
            "{:?} should be rejected",
            expr
        );
    }
    assert!(matches!(basis.opmat("M0 + M1"), Err(Error::InvalidExpression(_))));

    let nested = "(".repeat(2000) + "M0" + &")".repeat(2000);
    assert!(matches!(basis.opmat(&nested), Err(Error::InvalidExpression(_))));
    assert!(matches!(basis.opmat("M00 + M0"), Err(Error::InvalidExpression(_))));
}

#[test]
fn anti_aliasing_options() {
    let cfg = default_config(2).with("solver", "anti-alias", "flux, div-flux");
    let basis = ElementBasis::<Quad>::new(None, &cfg).unwrap();
    assert_eq!(
        basis.antialias(),
        AntiAlias {
            flux: true,
            div_flux: true
        }
    );

    let cfg = default_config(2).with("solver", "anti-alias", "none, flux");
    let basis = ElementBasis::<Quad>::new(None, &cfg).unwrap();
    assert!(basis.antialias().flux);
    assert!(!basis.antialias().div_flux);

    for invalid in ["flux, bogus", "foo, flux", "flux,,div-flux"] {
        let cfg = default_config(2).with("solver", "anti-alias", invalid);
        let result = ElementBasis::<Quad>::new(None, &cfg);
        assert!(matches!(result, Err(Error::InvalidConfiguration(_))), "{:?} should be rejected", invalid);
    }
}

#[test]
fn quadrature_rule_can_be_overridden() {
    let cfg = default_config(2)
        .with("solver-elements-quad", "quad-pts", "gauss-legendre-lobatto")
        .with("solver-elements-quad", "quad-deg", 5);
    let basis = ElementBasis::<Quad>::new(None, &cfg).unwrap();
    assert_eq!(basis.qrule().name(), "gauss-legendre-lobatto");
    assert_eq!(basis.nqpts(), 16);

    let cfg = default_config(2).with("solver-elements-tri", "quad-deg", -2);
    assert!(matches!(
        ElementBasis::<Tri>::new(None, &cfg),
        Err(Error::InvalidConfiguration(_))
    ));
}

#[test]
fn configuration_errors_surface_at_construction() {
    let cfg = default_config(2).with("solver-interfaces-line", "flux-pts", "gauss-chebyshev");
    assert!(matches!(
        ElementBasis::<Quad>::new(None, &cfg),
        Err(Error::InvalidConfiguration(_))
    ));
    // Line elements have point faces and need no interface configuration
    assert!(ElementBasis::<Line>::new(None, &cfg).is_ok());

    let cfg = default_config(2).with("solver-elements-hex", "soln-pts", "equi-spaced-ish");
    assert!(matches!(ElementBasis::<Hex>::new(None, &cfg), Err(Error::InvalidConfiguration(_))));

    let cfg = fluxrec::config::Config::new().with("solver", "order", 2);
    assert!(matches!(ElementBasis::<Line>::new(None, &cfg), Err(Error::InvalidConfiguration(_))));

    let cfg = default_config(2).with("solver", "order", i64::MAX);
    assert!(matches!(ElementBasis::<Hex>::new(None, &cfg), Err(Error::InvalidConfiguration(_))));
    let cfg = default_config(2).with("solver", "order", 1u64 << 32);
    assert!(matches!(ElementBasis::<Quad>::new(None, &cfg), Err(Error::InvalidConfiguration(_))));

    assert!(matches!(face_quadrature_rule(Shape::Tri, 2), Err(Error::InvalidConfiguration(_))));
    assert_eq!(face_quadrature_rule(Shape::Quad, 2).unwrap().len(), 9);
}

#[test]
fn operators_are_computed_once_across_threads() {
    let basis = basis::<Hex>(2);
    let pointers: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| basis.m3() as *const DMatrix<f64> as usize))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(pointers.iter().all(|&p| p == pointers[0]));
    assert!(std::ptr::eq(basis.m3(), basis.operator("M3".parse().unwrap()).unwrap()));
}
