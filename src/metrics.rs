//! Pairwise numeric measures over component arrays.
//!
//! Every two-argument function checks that both inputs have the same
//! length and reports [`VectoError::DimensionMismatch`] otherwise.
//! Degenerate but well-defined inputs (zero magnitude, zero variance)
//! resolve to `0.0` instead of NaN.

use crate::{Result, VectoError};
use ndarray::{Array1, Zip};

fn check_dimensions(a: &Array1<f64>, b: &Array1<f64>) -> Result<()> {
    if a.len() != b.len() {
        return Err(VectoError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(())
}

pub fn dot_product(a: &Array1<f64>, b: &Array1<f64>) -> Result<f64> {
    check_dimensions(a, b)?;
    Ok(a.dot(b))
}

pub fn magnitude(a: &Array1<f64>) -> f64 {
    a.dot(a).sqrt()
}

pub fn squared_distance(a: &Array1<f64>, b: &Array1<f64>) -> Result<f64> {
    check_dimensions(a, b)?;
    Ok(Zip::from(a).and(b).fold(0.0, |acc, &x, &y| {
        let d = x - y;
        acc + d * d
    }))
}

pub fn euclidean_distance(a: &Array1<f64>, b: &Array1<f64>) -> Result<f64> {
    Ok(squared_distance(a, b)?.sqrt())
}

pub fn manhattan_distance(a: &Array1<f64>, b: &Array1<f64>) -> Result<f64> {
    check_dimensions(a, b)?;
    Ok(Zip::from(a).and(b).fold(0.0, |acc, &x, &y| acc + (x - y).abs()))
}

/// Cosine of the angle between `a` and `b`. Returns `0.0` when either
/// magnitude is exactly zero.
pub fn cosine_similarity(a: &Array1<f64>, b: &Array1<f64>) -> Result<f64> {
    let dot = dot_product(a, b)?;
    let norm_a = magnitude(a);
    let norm_b = magnitude(b);

    if norm_a == 0.0 || norm_b == 0.0 {
        Ok(0.0)
    } else {
        Ok(dot / (norm_a * norm_b))
    }
}

/// Pearson correlation, pairing components by index. Returns `0.0` when
/// either side has zero variance.
pub fn correlation(a: &Array1<f64>, b: &Array1<f64>) -> Result<f64> {
    check_dimensions(a, b)?;
    let n = a.len();
    if n == 0 {
        return Ok(0.0);
    }

    let mean_a = a.sum() / n as f64;
    let mean_b = b.sum() / n as f64;

    let (cov, var_a, var_b) = Zip::from(a)
        .and(b)
        .fold((0.0, 0.0, 0.0), |(cov, va, vb), &x, &y| {
            let dx = x - mean_a;
            let dy = y - mean_b;
            (cov + dx * dy, va + dx * dx, vb + dy * dy)
        });

    if var_a == 0.0 || var_b == 0.0 {
        return Ok(0.0);
    }
    // Rounding can push |r| a hair past 1.
    Ok((cov / (var_a.sqrt() * var_b.sqrt())).clamp(-1.0, 1.0))
}

pub fn normalize(a: &Array1<f64>) -> Array1<f64> {
    let norm = magnitude(a);
    if norm > 0.0 {
        a / norm
    } else {
        a.clone()
    }
}
