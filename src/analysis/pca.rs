//! Principal component analysis via a symmetric eigen-decomposition of the
//! sample covariance matrix.

use crate::{vector::Vector, Result, VectoError};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

const MAX_SWEEPS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcaResult {
    /// Unit principal axes, largest variance first
    pub components: Vec<Array1<f64>>,
    /// Share of the total variance carried by each kept component
    pub explained_variance: Vec<f64>,
    pub eigenvalues: Vec<f64>,
    pub mean: Array1<f64>,
    /// Each input vector expressed in the kept components
    pub projections: Vec<Vec<f64>>,
}

fn data_matrix(vectors: &[Vector]) -> Result<Array2<f64>> {
    let d = vectors.first().map(|v| v.dimension()).unwrap_or(0);
    let mut data = Array2::zeros((vectors.len(), d));
    for (mut row, vector) in data.axis_iter_mut(Axis(0)).zip(vectors) {
        if vector.dimension() != d {
            return Err(VectoError::DimensionMismatch {
                expected: d,
                actual: vector.dimension(),
            });
        }
        row.assign(&vector.components);
    }
    Ok(data)
}

/// Keeps the top `target_dimensions` components (clamped to the data's
/// dimensionality). Needs at least two vectors.
pub fn pca(vectors: &[Vector], target_dimensions: usize) -> Result<PcaResult> {
    let n = vectors.len();
    if n < 2 {
        return Err(VectoError::InsufficientData {
            required: 2,
            actual: n,
        });
    }

    let data = data_matrix(vectors)?;
    let d = data.ncols();
    let mean = data
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(d));
    let centered = &data - &mean;
    let covariance = centered.t().dot(&centered) / (n - 1) as f64;

    let (values, vectors_matrix) = jacobi_eigen(&covariance);

    let mut order: Vec<usize> = (0..d).collect();
    order.sort_by(|&a, &b| {
        values[b]
            .partial_cmp(&values[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Covariance is PSD; negative eigenvalues are rounding noise.
    let eigenvalues_all: Vec<f64> = order.iter().map(|&i| values[i].max(0.0)).collect();
    let total: f64 = eigenvalues_all.iter().sum();

    let keep = target_dimensions.min(d);
    let components: Vec<Array1<f64>> = order
        .iter()
        .take(keep)
        .map(|&i| vectors_matrix.column(i).to_owned())
        .collect();
    let eigenvalues: Vec<f64> = eigenvalues_all[..keep].to_vec();
    let explained_variance: Vec<f64> = eigenvalues
        .iter()
        .map(|&ev| if total > 0.0 { ev / total } else { 0.0 })
        .collect();

    let projections: Vec<Vec<f64>> = centered
        .axis_iter(Axis(0))
        .map(|row| components.iter().map(|c| row.dot(c)).collect::<Vec<f64>>())
        .collect();

    Ok(PcaResult {
        components,
        explained_variance,
        eigenvalues,
        mean,
        projections,
    })
}

/// Cyclic Jacobi rotations for a symmetric matrix. Returns the eigenvalues
/// (unsorted) and the matching eigenvectors as columns.
fn jacobi_eigen(matrix: &Array2<f64>) -> (Array1<f64>, Array2<f64>) {
    let n = matrix.nrows();
    let mut a = matrix.clone();
    let mut v = Array2::<f64>::eye(n);

    let scale: f64 = a.iter().map(|x| x * x).sum();
    if scale == 0.0 {
        return (a.diag().to_owned(), v);
    }

    for _ in 0..MAX_SWEEPS {
        let mut off = 0.0;
        for p in 0..n {
            for q in (p + 1)..n {
                off += a[[p, q]] * a[[p, q]];
            }
        }
        if off <= scale * 1e-30 {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq == 0.0 {
                    continue;
                }
                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[[k, p]];
                    let akq = a[[k, q]];
                    a[[k, p]] = c * akp - s * akq;
                    a[[k, q]] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[[p, k]];
                    let aqk = a[[q, k]];
                    a[[p, k]] = c * apk - s * aqk;
                    a[[q, k]] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let vkp = v[[k, p]];
                    let vkq = v[[k, q]];
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    (a.diag().to_owned(), v)
}
