//! Placeholder for a t-SNE embedding.
//!
//! This is NOT stochastic neighbour embedding. Each vector is placed at its
//! first two raw components (missing components read as 0) plus uniform
//! jitter in `[-jitter, jitter]` per axis. The contract a real
//! implementation must keep: one 2D point per input vector, in input order,
//! for any dimensionality including 0.

use crate::{vector::Vector, Result, VectoError};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TsneResult {
    pub embedding: Vec<[f64; 2]>,
}

/// `jitter` must be finite and non-negative.
pub fn approximate_tsne<R: Rng + ?Sized>(
    vectors: &[Vector],
    jitter: f64,
    rng: &mut R,
) -> Result<TsneResult> {
    if !(jitter.is_finite() && jitter >= 0.0) {
        return Err(VectoError::InvalidConfig(format!(
            "t-SNE jitter must be finite and non-negative, got {}",
            jitter
        )));
    }

    let mut noise = || {
        if jitter > 0.0 {
            rng.gen_range(-jitter..=jitter)
        } else {
            0.0
        }
    };

    let embedding = vectors
        .iter()
        .map(|v| {
            let x = v.components.get(0).copied().unwrap_or(0.0);
            let y = v.components.get(1).copied().unwrap_or(0.0);
            [x + noise(), y + noise()]
        })
        .collect();

    Ok(TsneResult { embedding })
}
