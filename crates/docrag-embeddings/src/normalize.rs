//! Vector normalization and similarity functions.
//!
//! Sums are accumulated in `f64`: squaring any finite `f32` component can
//! neither overflow nor underflow there, so large and tiny vectors keep
//! their direction.

use crate::errors::{EmbeddingError, Operand, Result};

fn sum_squares(v: &[f32]) -> f64 {
    v.iter().map(|x| f64::from(*x) * f64::from(*x)).sum()
}

fn dot_f64(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum()
}

/// Compute the L2 (Euclidean) norm of a vector.
#[allow(clippy::cast_possible_truncation)]
pub fn l2_norm(v: &[f32]) -> f32 {
    sum_squares(v).sqrt() as f32
}

/// L2-normalize a vector in-place. Zero vectors remain zero.
#[allow(clippy::cast_possible_truncation)]
pub fn l2_normalize(v: &mut [f32]) {
    let norm = sum_squares(v).sqrt();
    if norm > 0.0 && norm.is_finite() {
        for x in v.iter_mut() {
            *x = (f64::from(*x) / norm) as f32;
        }
    }
}

/// Dot product of two vectors of equal length.
#[allow(clippy::cast_possible_truncation)]
pub fn dot(a: &[f32], b: &[f32]) -> Result<f32> {
    check_dimensions(a, b)?;
    Ok(dot_f64(a, b) as f32)
}

fn check_dimensions(a: &[f32], b: &[f32]) -> Result<()> {
    if a.len() == b.len() {
        Ok(())
    } else {
        Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        })
    }
}

/// Norm of one operand, rejecting NaN or infinite components and zero
/// magnitude.
fn operand_norm(v: &[f32], operand: Operand) -> Result<f64> {
    if v.iter().any(|x| !x.is_finite()) {
        return Err(EmbeddingError::NonFinite { operand });
    }
    let norm = sum_squares(v).sqrt();
    if norm == 0.0 {
        return Err(EmbeddingError::DegenerateVector { operand });
    }
    Ok(norm)
}

/// Cosine similarity: `dot(a, b) / (‖a‖ · ‖b‖)`.
///
/// Fails with [`EmbeddingError::DimensionMismatch`] when the lengths differ,
/// with [`EmbeddingError::NonFinite`] when a component is NaN or infinite,
/// and with [`EmbeddingError::DegenerateVector`] when either vector has zero
/// magnitude. The left operand is checked before the right. Empty vectors
/// are degenerate. The result is always finite and within `[-1, 1]`.
#[allow(clippy::cast_possible_truncation)]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    check_dimensions(a, b)?;
    let norm_a = operand_norm(a, Operand::Left)?;
    let norm_b = operand_norm(b, Operand::Right)?;
    let cos = dot_f64(a, b) / (norm_a * norm_b);
    Ok(cos.clamp(-1.0, 1.0) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-6;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn l2_norm_known() {
        assert!(approx_eq(l2_norm(&[3.0, 4.0]), 5.0));
    }

    #[test]
    fn l2_norm_empty() {
        assert!(approx_eq(l2_norm(&[]), 0.0));
    }

    #[test]
    fn l2_normalize_known_vector() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!(approx_eq(v[0], 0.6));
        assert!(approx_eq(v[1], 0.8));
    }

    #[test]
    fn l2_normalize_zero_vector() {
        let mut v = vec![0.0, 0.0, 0.0];
        l2_normalize(&mut v);
        assert!(v.iter().all(|x| *x == 0.0), "zero vector stays zero");
        assert!(!v.iter().any(|x| x.is_nan()), "no NaN");
    }

    #[test]
    fn dot_mismatch() {
        assert!(matches!(
            dot(&[1.0], &[1.0, 2.0]),
            Err(EmbeddingError::DimensionMismatch {
                expected: 1,
                actual: 2
            })
        ));
    }

    #[test]
    fn cosine_identical() {
        let v = vec![0.6, 0.8];
        assert!(approx_eq(cosine_similarity(&v, &v).unwrap(), 1.0));
    }

    #[test]
    fn cosine_orthogonal() {
        assert!(approx_eq(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap(), 0.0));
    }

    #[test]
    fn cosine_opposite() {
        assert!(approx_eq(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]).unwrap(), -1.0));
    }

    #[test]
    fn cosine_diagonal() {
        let s = cosine_similarity(&[1.0, 0.0], &[1.0, 1.0]).unwrap();
        assert!(approx_eq(s, std::f32::consts::FRAC_1_SQRT_2));
    }

    #[test]
    fn cosine_known_values() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![4.0, 5.0, 6.0];
        let dot = 4.0 + 10.0 + 18.0; // 32
        let norm_a = (1.0 + 4.0 + 9.0_f32).sqrt(); // sqrt(14)
        let norm_b = (16.0 + 25.0 + 36.0_f32).sqrt(); // sqrt(77)
        let expected = dot / (norm_a * norm_b);
        assert!(approx_eq(cosine_similarity(&a, &b).unwrap(), expected));
    }

    #[test]
    fn cosine_dimension_mismatch() {
        let err = cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn cosine_zero_left_is_degenerate() {
        let err = cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::DegenerateVector {
                operand: Operand::Left
            }
        ));
    }

    #[test]
    fn cosine_zero_right_is_degenerate() {
        let err = cosine_similarity(&[1.0, 0.0], &[0.0, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::DegenerateVector {
                operand: Operand::Right
            }
        ));
    }

    #[test]
    fn cosine_both_zero_reports_left() {
        let err = cosine_similarity(&[0.0], &[0.0]).unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::DegenerateVector {
                operand: Operand::Left
            }
        ));
    }

    #[test]
    fn cosine_empty_is_degenerate() {
        assert!(matches!(
            cosine_similarity(&[], &[]),
            Err(EmbeddingError::DegenerateVector { .. })
        ));
    }

    #[test]
    fn large_components_keep_their_direction() {
        let s = cosine_similarity(&[1e20, 0.0], &[1e20, 0.0]).unwrap();
        assert!(approx_eq(s, 1.0));
        let s = cosine_similarity(&[1.0, 0.0], &[1e20, 1e20]).unwrap();
        assert!(approx_eq(s, std::f32::consts::FRAC_1_SQRT_2));
        let s = cosine_similarity(&[f32::MAX, f32::MAX], &[-f32::MAX, -f32::MAX]).unwrap();
        assert!(approx_eq(s, -1.0));
    }

    #[test]
    fn tiny_components_are_not_degenerate() {
        let s = cosine_similarity(&[1e-25, 0.0], &[1.0, 0.0]).unwrap();
        assert!(approx_eq(s, 1.0));
        let smallest = f32::from_bits(1);
        let s = cosine_similarity(&[smallest, smallest], &[1.0, 0.0]).unwrap();
        assert!(approx_eq(s, std::f32::consts::FRAC_1_SQRT_2));
    }

    #[test]
    fn large_vector_norm_is_finite() {
        assert!(((l2_norm(&[3e20, 4e20]) - 5e20) / 5e20).abs() < 1e-6);
        let mut v = vec![3e-30, 4e-30];
        l2_normalize(&mut v);
        assert!(approx_eq(v[0], 0.6));
        assert!(approx_eq(v[1], 0.8));
    }

    #[test]
    fn nan_component_is_rejected() {
        let err = cosine_similarity(&[f32::NAN, 1.0], &[1.0, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::NonFinite {
                operand: Operand::Left
            }
        ));
    }

    #[test]
    fn infinite_component_is_rejected() {
        let err = cosine_similarity(&[1.0, 0.0], &[f32::INFINITY, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::NonFinite {
                operand: Operand::Right
            }
        ));
    }

    #[test]
    fn non_finite_left_reported_before_degenerate_right() {
        let err = cosine_similarity(&[f32::NEG_INFINITY], &[0.0]).unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::NonFinite {
                operand: Operand::Left
            }
        ));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn non_degenerate(len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<f32>> {
            proptest::collection::vec(-100.0f32..100.0, len)
                .prop_filter("non-degenerate", |v| l2_norm(v) > 1e-3)
        }

        proptest! {
            #[test]
            fn normalize_produces_unit(v in proptest::collection::vec(-100.0f32..100.0, 1..64)) {
                let has_nonzero = v.iter().any(|x| *x != 0.0);
                let mut v = v;
                l2_normalize(&mut v);
                if has_nonzero {
                    prop_assert!((l2_norm(&v) - 1.0).abs() < 1e-4);
                }
            }

            #[test]
            fn self_similarity_is_one(a in non_degenerate(1..64)) {
                let s = cosine_similarity(&a, &a).unwrap();
                prop_assert!((s - 1.0).abs() < 1e-4);
            }

            #[test]
            fn cosine_symmetry(
                a in non_degenerate(8..9),
                b in non_degenerate(8..9),
            ) {
                let ab = cosine_similarity(&a, &b).unwrap();
                let ba = cosine_similarity(&b, &a).unwrap();
                prop_assert!((ab - ba).abs() < 1e-5);
            }

            #[test]
            fn cosine_scale_invariant(
                a in non_degenerate(8..9),
                b in non_degenerate(8..9),
                c in 0.01f32..100.0,
            ) {
                let scaled: Vec<f32> = a.iter().map(|x| x * c).collect();
                let base = cosine_similarity(&a, &b).unwrap();
                let s = cosine_similarity(&scaled, &b).unwrap();
                prop_assert!((base - s).abs() < 1e-4);
            }

            #[test]
            fn cosine_scale_invariant_across_magnitudes(
                a in non_degenerate(8..9),
                b in non_degenerate(8..9),
                exp in -30i32..30,
            ) {
                let c = 10f32.powi(exp);
                let scaled: Vec<f32> = a.iter().map(|x| x * c).collect();
                let base = cosine_similarity(&a, &b).unwrap();
                let s = cosine_similarity(&scaled, &b).unwrap();
                prop_assert!(s.is_finite());
                prop_assert!((base - s).abs() < 1e-4);
            }

            #[test]
            fn cosine_in_range(
                a in non_degenerate(8..9),
                b in non_degenerate(8..9),
            ) {
                let s = cosine_similarity(&a, &b).unwrap();
                prop_assert!((-1.0 - 1e-5..=1.0 + 1e-5).contains(&s));
            }

            #[test]
            fn zero_query_always_degenerate(b in non_degenerate(4..5)) {
                let zero = vec![0.0f32; 4];
                prop_assert!(
                    matches!(
                        cosine_similarity(&zero, &b),
                        Err(EmbeddingError::DegenerateVector { operand: Operand::Left })
                    ),
                    "expected degenerate left operand"
                );
            }
        }
    }
}
