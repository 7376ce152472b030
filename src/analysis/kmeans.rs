use crate::metrics::{euclidean_distance, squared_distance};
use crate::{vector::Vector, Result, VectoError};
use ndarray::Array1;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub centroid: Array1<f64>,
    /// Indices into the input slice
    pub members: Vec<usize>,
    pub member_ids: Vec<u64>,
    /// Mean squared distance of the members to the centroid
    pub within_variance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KMeansResult {
    pub k: usize,
    pub clusters: Vec<Cluster>,
    /// Cluster index of each input vector
    pub assignments: Vec<usize>,
    pub converged: bool,
    pub iterations: usize,
    /// Total squared distance of every vector to its centroid
    pub inertia: f64,
}

/// Lloyd's algorithm. Initial centroids are `k` distinct input vectors
/// drawn from `rng`; iteration stops once assignments repeat or after
/// `max_iterations` assignment passes (at least one).
///
/// Distance ties go to the lowest centroid index, so identical input
/// vectors always share a cluster. With duplicates present, `k == n`
/// therefore leaves some clusters empty instead of producing singletons.
pub fn kmeans<R: Rng + ?Sized>(
    vectors: &[Vector],
    k: usize,
    max_iterations: usize,
    rng: &mut R,
) -> Result<KMeansResult> {
    let n = vectors.len();
    if k < 1 || k > n {
        return Err(VectoError::InvalidK { k, available: n });
    }
    if max_iterations == 0 {
        return Err(VectoError::InvalidConfig(
            "k-means needs at least one iteration".into(),
        ));
    }

    let d = vectors[0].dimension();
    if let Some(bad) = vectors.iter().find(|v| v.dimension() != d) {
        return Err(VectoError::DimensionMismatch {
            expected: d,
            actual: bad.dimension(),
        });
    }

    let mut centroids: Vec<Array1<f64>> = rand::seq::index::sample(rng, n, k)
        .into_iter()
        .map(|i| vectors[i].components.clone())
        .collect();

    let mut assignments: Vec<usize> = Vec::new();
    let mut converged = false;
    let mut iterations = 0;

    while iterations < max_iterations {
        iterations += 1;
        let next = assign(vectors, &centroids)?;
        if next == assignments {
            converged = true;
            break;
        }
        assignments = next;
        centroids = update_centroids(vectors, &assignments, &centroids);
    }

    let mut clusters: Vec<Cluster> = centroids
        .into_iter()
        .map(|centroid| Cluster {
            centroid,
            members: Vec::new(),
            member_ids: Vec::new(),
            within_variance: 0.0,
        })
        .collect();

    let mut inertia = 0.0;
    for (i, &c) in assignments.iter().enumerate() {
        let d2 = squared_distance(&vectors[i].components, &clusters[c].centroid)?;
        inertia += d2;
        clusters[c].within_variance += d2;
        clusters[c].members.push(i);
        clusters[c].member_ids.push(vectors[i].id);
    }
    for cluster in clusters.iter_mut() {
        if !cluster.members.is_empty() {
            cluster.within_variance /= cluster.members.len() as f64;
        }
    }

    Ok(KMeansResult {
        k,
        clusters,
        assignments,
        converged,
        iterations,
        inertia,
    })
}

/// Nearest centroid per vector; ties go to the lower centroid index.
fn assign(vectors: &[Vector], centroids: &[Array1<f64>]) -> Result<Vec<usize>> {
    vectors
        .iter()
        .map(|v| {
            let mut best = 0;
            let mut best_dist = f64::INFINITY;
            for (c, centroid) in centroids.iter().enumerate() {
                let dist = euclidean_distance(&v.components, centroid)?;
                if dist < best_dist {
                    best_dist = dist;
                    best = c;
                }
            }
            Ok(best)
        })
        .collect()
}

/// Component-wise mean of each cluster's members. A cluster that lost all
/// its members keeps its previous centroid.
fn update_centroids(
    vectors: &[Vector],
    assignments: &[usize],
    previous: &[Array1<f64>],
) -> Vec<Array1<f64>> {
    let mut sums: Vec<Array1<f64>> = previous
        .iter()
        .map(|c| Array1::zeros(c.len()))
        .collect();
    let mut counts = vec![0usize; previous.len()];

    for (vector, &c) in vectors.iter().zip(assignments) {
        sums[c] += &vector.components;
        counts[c] += 1;
    }

    sums.into_iter()
        .zip(counts)
        .zip(previous)
        .map(|((sum, count), prev)| {
            if count == 0 {
                prev.clone()
            } else {
                sum / count as f64
            }
        })
        .collect()
}
