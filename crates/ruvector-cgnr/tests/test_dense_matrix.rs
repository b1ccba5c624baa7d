//! Integration tests for `DenseMatrix` and the vector kernels.

mod helpers;

use approx::assert_relative_eq;
use ruvector_cgnr::linalg::{dot, residual, residual_norm};
use ruvector_cgnr::traits::LinearOperator;
use ruvector_cgnr::types::DenseMatrix;

use helpers::{compute_residual, l2_norm, random_dense, random_vector};

// ---------------------------------------------------------------------------
// Products against a naive reference
// ---------------------------------------------------------------------------

fn naive_matvec(h: &DenseMatrix, x: &[f64]) -> Vec<f64> {
    (0..h.rows())
        .map(|i| (0..h.cols()).map(|j| h.get(i, j) * x[j]).sum())
        .collect()
}

#[test]
fn test_matvec_matches_naive() {
    // Row count above the parallel block size so both code paths see
    // several blocks.
    let h = random_dense(150, 17, 3);
    let x = random_vector(17, 4);

    let mut y = vec![0.0; 150];
    h.matvec(&x, &mut y);

    for (a, b) in y.iter().zip(naive_matvec(&h, &x)) {
        assert_relative_eq!(*a, b, epsilon = 1e-12);
    }
}

#[test]
fn test_matvec_transpose_matches_explicit_transpose() {
    let h = random_dense(150, 17, 5);
    let x = random_vector(150, 6);

    let mut y = vec![1.0; 17];
    h.matvec_transpose(&x, &mut y);

    let expected = naive_matvec(&h.transpose(), &x);
    for (a, b) in y.iter().zip(expected) {
        assert_relative_eq!(*a, b, epsilon = 1e-12);
    }
}

#[test]
fn test_transpose_adjoint_identity() {
    // <H x, y> == <x, H^T y>
    let h = random_dense(40, 9, 7);
    let x = random_vector(9, 8);
    let y = random_vector(40, 9);

    let mut hx = vec![0.0; 40];
    let mut hty = vec![0.0; 9];
    h.apply(&x, &mut hx);
    h.apply_transpose(&y, &mut hty);

    assert_relative_eq!(dot(&hx, &y), dot(&x, &hty), epsilon = 1e-10);
}

#[test]
fn test_transposed_product_is_deterministic() {
    let h = random_dense(300, 11, 10);
    let x = random_vector(300, 11);

    let mut a = vec![0.0; 11];
    let mut b = vec![0.0; 11];
    h.matvec_transpose(&x, &mut a);
    h.matvec_transpose(&x, &mut b);

    assert_eq!(a, b);
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

#[test]
fn test_from_rows_and_accessors() {
    let h = DenseMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();

    assert_eq!(h.rows(), 3);
    assert_eq!(h.cols(), 2);
    assert_eq!(h.get(2, 0), 5.0);
    assert_eq!(h.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    assert_eq!(LinearOperator::stored_entries(&h), 6);
}

#[test]
fn test_new_checks_length() {
    assert!(DenseMatrix::new(2, 2, vec![0.0; 4]).is_ok());
    assert!(DenseMatrix::new(2, 2, vec![0.0; 3]).is_err());
    assert!(DenseMatrix::new(usize::MAX, 2, Vec::new()).is_err());
}

#[test]
#[should_panic(expected = "out of bounds")]
fn test_get_out_of_bounds_panics() {
    DenseMatrix::zeros(2, 2).get(2, 0);
}

// ---------------------------------------------------------------------------
// Residual helpers
// ---------------------------------------------------------------------------

#[test]
fn test_residual_matches_reference() {
    let h = random_dense(12, 4, 13);
    let f = random_vector(4, 14);
    let g = random_vector(12, 15);

    let r = residual(&h, &f, &g);
    let expected = compute_residual(&h, &f, &g);
    for (a, b) in r.iter().zip(&expected) {
        assert_relative_eq!(*a, *b, epsilon = 1e-12);
    }
    assert_relative_eq!(residual_norm(&h, &f, &g), l2_norm(&expected), epsilon = 1e-12);
}

#[test]
fn test_operator_through_reference() {
    let h = DenseMatrix::identity(3);
    let by_ref: &DenseMatrix = &h;

    let mut y = vec![0.0; 3];
    LinearOperator::apply(&by_ref, &[1.0, 2.0, 3.0], &mut y);
    assert_eq!(y, vec![1.0, 2.0, 3.0]);
    assert_eq!(LinearOperator::rows(&by_ref), 3);
}
