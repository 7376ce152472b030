//! Information-theoretic measures for a single vector.

use crate::metrics::magnitude;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Shannon entropy (bits) of the distribution `|c_i| / Σ|c_j|`.
///
/// Zero components contribute nothing (`0·log2 0 = 0`), and an all-zero or
/// empty vector has entropy `0.0`.
pub fn shannon_entropy(components: &Array1<f64>) -> f64 {
    let total: f64 = components.iter().map(|c| c.abs()).sum();
    if total == 0.0 {
        return 0.0;
    }

    let entropy: f64 = components
        .iter()
        .map(|c| c.abs() / total)
        .filter(|&p| p > 0.0)
        .map(|p| -p * p.log2())
        .sum();
    // Guards against a tiny negative from rounding on one-hot inputs
    entropy.max(0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Charge {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantumDecomposition {
    /// Sum of the positive components
    pub excitatory: f64,
    /// Sum of the magnitudes of the negative components
    pub inhibitory: f64,
}

impl QuantumDecomposition {
    /// Net charge; exact ties are neutral.
    pub fn charge(&self) -> Charge {
        if self.excitatory > self.inhibitory {
            Charge::Positive
        } else if self.inhibitory > self.excitatory {
            Charge::Negative
        } else {
            Charge::Neutral
        }
    }

    pub fn net(&self) -> f64 {
        self.excitatory - self.inhibitory
    }

    pub fn total(&self) -> f64 {
        self.excitatory + self.inhibitory
    }
}

pub fn quantum_decomposition(components: &Array1<f64>) -> QuantumDecomposition {
    components.iter().fold(
        QuantumDecomposition {
            excitatory: 0.0,
            inhibitory: 0.0,
        },
        |mut acc, &c| {
            if c > 0.0 {
                acc.excitatory += c;
            } else if c < 0.0 {
                acc.inhibitory -= c;
            }
            acc
        },
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuantumKind {
    Excitatory,
    Inhibitory,
    Silent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantum {
    pub dimension: usize,
    pub value: f64,
    pub kind: QuantumKind,
}

/// Classifies each component by sign.
pub fn information_quanta(components: &Array1<f64>) -> Vec<Quantum> {
    components
        .iter()
        .enumerate()
        .map(|(dimension, &value)| Quantum {
            dimension,
            value,
            kind: if value > 0.0 {
                QuantumKind::Excitatory
            } else if value < 0.0 {
                QuantumKind::Inhibitory
            } else {
                QuantumKind::Silent
            },
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorStatistics {
    pub dimensions: usize,
    pub magnitude: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    /// Fraction of components that are exactly zero
    pub sparsity: f64,
    pub entropy: f64,
    /// Entropy divided by its maximum `log2(n)`; 0 when `n <= 1`
    pub normalized_entropy: f64,
    pub quantum: QuantumDecomposition,
    pub charge: Charge,
}

pub fn vector_statistics(components: &Array1<f64>) -> VectorStatistics {
    let n = components.len();
    let quantum = quantum_decomposition(components);
    let entropy = shannon_entropy(components);

    let (mean, std_dev, min, max, sparsity) = if n == 0 {
        (0.0, 0.0, 0.0, 0.0, 0.0)
    } else {
        let mean = components.sum() / n as f64;
        let variance = components.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n as f64;
        let min = components.iter().copied().fold(f64::INFINITY, f64::min);
        let max = components.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let zeros = components.iter().filter(|&&c| c == 0.0).count();
        (mean, variance.sqrt(), min, max, zeros as f64 / n as f64)
    };

    let normalized_entropy = if n > 1 {
        entropy / (n as f64).log2()
    } else {
        0.0
    };

    VectorStatistics {
        dimensions: n,
        magnitude: magnitude(components),
        mean,
        std_dev,
        min,
        max,
        sparsity,
        entropy,
        normalized_entropy,
        quantum,
        charge: quantum.charge(),
    }
}
