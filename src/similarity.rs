//! Cosine similarity between embedding vectors.

use crate::errors::Error;

/// Compute cosine similarity between two embedding vectors.
///
/// Accumulates in f64 so scores are symmetric and stable across argument order.
///
/// # Errors
///
/// - Returns `Error::EmptyVector` if either vector is empty.
/// - Returns `Error::DimensionMismatch` if vectors have different lengths.
/// - Returns `Error::InvalidEmbedding` if any value is NaN or infinite.
/// - Returns `Error::DegenerateVector` if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64, Error> {
    if a.is_empty() || b.is_empty() {
        return Err(Error::EmptyVector);
    }

    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    if a.iter().chain(b.iter()).any(|x| !x.is_finite()) {
        return Err(Error::InvalidEmbedding(
            "Vector contains NaN or infinite values".to_string(),
        ));
    }

    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(Error::DegenerateVector);
    }

    Ok(dot / (norm_a * norm_b))
}

/// Check that `v` can take part in a cosine comparison.
///
/// Rejects the same vectors `cosine_similarity` would: empty, non-finite, or
/// zero-magnitude.
pub fn validate_embedding(v: &[f32]) -> Result<(), Error> {
    if v.is_empty() {
        return Err(Error::EmptyVector);
    }
    if v.iter().any(|x| !x.is_finite()) {
        return Err(Error::InvalidEmbedding(
            "Vector contains NaN or infinite values".to_string(),
        ));
    }
    if v.iter().all(|&x| x == 0.0) {
        return Err(Error::DegenerateVector);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_vectors() {
        let vec = vec![1.0f32; 384];
        let sim = cosine_similarity(&vec, &vec).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_orthogonal_vectors() {
        let mut a = vec![0.0f32; 384];
        let mut b = vec![0.0f32; 384];
        a[0] = 1.0;
        b[1] = 1.0;
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn test_opposite_vectors() {
        let a = vec![1.0f32; 8];
        let b = vec![-1.0f32; 8];
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_magnitude_independent() {
        let a = vec![1.0f32, 2.0, 3.0];
        let b = vec![10.0f32, 20.0, 30.0];
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!((sim - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_symmetric() {
        let a = vec![0.3f32, -1.2, 4.5, 0.01];
        let b = vec![2.0f32, 0.7, -0.4, 9.9];
        assert_eq!(
            cosine_similarity(&a, &b).unwrap(),
            cosine_similarity(&b, &a).unwrap()
        );
    }

    #[test]
    fn test_empty_vector() {
        let empty = vec![];
        let vec = vec![1.0f32; 384];
        assert!(matches!(
            cosine_similarity(&empty, &vec),
            Err(Error::EmptyVector)
        ));
    }

    #[test]
    fn test_mismatched_dimensions() {
        let a = vec![1.0f32; 384];
        let b = vec![1.0f32; 256];
        assert!(matches!(
            cosine_similarity(&a, &b),
            Err(Error::DimensionMismatch {
                expected: 384,
                actual: 256
            })
        ));
    }

    #[test]
    fn test_nan_values() {
        let mut a = vec![1.0f32; 384];
        a[0] = f32::NAN;
        let b = vec![1.0f32; 384];
        assert!(matches!(
            cosine_similarity(&a, &b),
            Err(Error::InvalidEmbedding(_))
        ));
    }

    #[test]
    fn test_infinite_values() {
        let a = vec![1.0f32; 384];
        let mut b = vec![1.0f32; 384];
        b[7] = f32::NEG_INFINITY;
        assert!(matches!(
            cosine_similarity(&a, &b),
            Err(Error::InvalidEmbedding(_))
        ));
    }

    #[test]
    fn test_zero_norm_is_rejected() {
        let zero = vec![0.0f32; 384];
        let vec = vec![1.0f32; 384];
        assert!(matches!(
            cosine_similarity(&zero, &vec),
            Err(Error::DegenerateVector)
        ));
    }

    #[test]
    fn test_validate_embedding() {
        assert!(validate_embedding(&[0.0, 0.5]).is_ok());
        assert!(matches!(validate_embedding(&[]), Err(Error::EmptyVector)));
        assert!(matches!(
            validate_embedding(&[0.0; 4]),
            Err(Error::DegenerateVector)
        ));
        assert!(matches!(
            validate_embedding(&[1.0, f32::NAN]),
            Err(Error::InvalidEmbedding(_))
        ));
    }
}
