//! Pairwise force/affinity computation over a vector set.

use crate::metrics::{
    correlation, cosine_similarity, dot_product, euclidean_distance, magnitude,
    manhattan_distance, squared_distance,
};
use crate::{vector::Vector, Result, VectoError};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use tracing::debug;

pub const DEFAULT_EPSILON: f64 = 0.01;

/// Signature shared by every pair kernel: `(a, b, epsilon) -> value`.
pub type PairKernel = fn(&Array1<f64>, &Array1<f64>, f64) -> Result<f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// `dot² / (d² + ε)`: high for vectors that are both aligned (either
    /// sign) and close
    #[default]
    Resonance,
    Gravity,
    Repulsion,
    Cosine,
    Correlation,
    Euclidean,
    Manhattan,
}

impl MetricKind {
    pub const ALL: [MetricKind; 7] = [
        MetricKind::Resonance,
        MetricKind::Gravity,
        MetricKind::Repulsion,
        MetricKind::Cosine,
        MetricKind::Correlation,
        MetricKind::Euclidean,
        MetricKind::Manhattan,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MetricKind::Resonance => "resonance",
            MetricKind::Gravity => "gravity",
            MetricKind::Repulsion => "repulsion",
            MetricKind::Cosine => "cosine",
            MetricKind::Correlation => "correlation",
            MetricKind::Euclidean => "euclidean",
            MetricKind::Manhattan => "manhattan",
        }
    }

    pub fn kernel(self) -> PairKernel {
        match self {
            MetricKind::Resonance => resonance,
            MetricKind::Gravity => gravity,
            MetricKind::Repulsion => repulsion,
            MetricKind::Cosine => abs_cosine,
            MetricKind::Correlation => abs_correlation,
            MetricKind::Euclidean => euclidean_affinity,
            MetricKind::Manhattan => manhattan_affinity,
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MetricKind {
    type Err = VectoError;

    fn from_str(s: &str) -> Result<Self> {
        MetricKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| VectoError::InvalidConfig(format!("unknown metric kind '{}'", s)))
    }
}

fn resonance(a: &Array1<f64>, b: &Array1<f64>, epsilon: f64) -> Result<f64> {
    let dot = dot_product(a, b)?;
    Ok(dot * dot / (squared_distance(a, b)? + epsilon))
}

fn gravity(a: &Array1<f64>, b: &Array1<f64>, epsilon: f64) -> Result<f64> {
    let d2 = squared_distance(a, b)?;
    Ok(magnitude(a) * magnitude(b) / (d2 + epsilon))
}

fn repulsion(a: &Array1<f64>, b: &Array1<f64>, epsilon: f64) -> Result<f64> {
    Ok(1.0 / (squared_distance(a, b)? + epsilon))
}

fn abs_cosine(a: &Array1<f64>, b: &Array1<f64>, _epsilon: f64) -> Result<f64> {
    Ok(cosine_similarity(a, b)?.abs())
}

fn abs_correlation(a: &Array1<f64>, b: &Array1<f64>, _epsilon: f64) -> Result<f64> {
    Ok(correlation(a, b)?.abs())
}

fn euclidean_affinity(a: &Array1<f64>, b: &Array1<f64>, _epsilon: f64) -> Result<f64> {
    Ok(1.0 / (1.0 + euclidean_distance(a, b)?))
}

fn manhattan_affinity(a: &Array1<f64>, b: &Array1<f64>, _epsilon: f64) -> Result<f64> {
    Ok(1.0 / (1.0 + manhattan_distance(a, b)?))
}

/// One unordered pair of the force matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceEdge {
    pub source_index: usize,
    pub target_index: usize,
    pub source_id: u64,
    pub target_id: u64,
    pub value: f64,
    pub metric: MetricKind,
}

/// Force between the probe vector and one vector of the set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeForce {
    pub index: usize,
    pub id: u64,
    pub value: f64,
}

#[derive(Debug, Clone)]
pub struct ForceCalculator {
    epsilon: f64,
    metric: MetricKind,
}

impl ForceCalculator {
    pub fn new() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            metric: MetricKind::default(),
        }
    }

    pub fn with_epsilon(epsilon: f64) -> Result<Self> {
        Self::new().epsilon(epsilon)
    }

    pub fn from_config(config: &crate::config::ForceConfig) -> Result<Self> {
        Ok(Self::with_epsilon(config.epsilon)?.metric(config.metric))
    }

    pub fn epsilon(mut self, epsilon: f64) -> Result<Self> {
        if !(epsilon.is_finite() && epsilon > 0.0) {
            return Err(VectoError::InvalidConfig(format!(
                "epsilon must be a positive finite number, got {}",
                epsilon
            )));
        }
        self.epsilon = epsilon;
        Ok(self)
    }

    pub fn metric(mut self, metric: MetricKind) -> Self {
        self.metric = metric;
        self
    }

    pub fn get_epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn default_metric(&self) -> MetricKind {
        self.metric
    }

    pub fn pair_force(&self, a: &Array1<f64>, b: &Array1<f64>, metric: MetricKind) -> Result<f64> {
        (metric.kernel())(a, b, self.epsilon)
    }

    /// Computes one edge per unordered pair `(i, j)` with `i < j`, outer
    /// loop over `i` ascending and inner loop over `j` ascending. Fewer than
    /// two vectors yield no edges.
    pub fn compute_force_matrix(
        &self,
        vectors: &[Vector],
        metric: MetricKind,
    ) -> Result<Vec<ForceEdge>> {
        let n = vectors.len();
        if n < 2 {
            return Ok(Vec::new());
        }

        let kernel = metric.kernel();
        let mut edges = Vec::with_capacity(n * (n - 1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                let value = kernel(&vectors[i].components, &vectors[j].components, self.epsilon)?;
                edges.push(ForceEdge {
                    source_index: i,
                    target_index: j,
                    source_id: vectors[i].id,
                    target_id: vectors[j].id,
                    value,
                    metric,
                });
            }
        }

        debug!(vectors = n, edges = edges.len(), metric = %metric, "Computed force matrix");
        Ok(edges)
    }

    /// Force from `probe` to every vector, in vector order.
    pub fn compute_probe_forces(
        &self,
        vectors: &[Vector],
        probe: &Vector,
        metric: MetricKind,
    ) -> Result<Vec<ProbeForce>> {
        let kernel = metric.kernel();
        vectors
            .iter()
            .enumerate()
            .map(|(index, vector)| {
                Ok(ProbeForce {
                    index,
                    id: vector.id,
                    value: kernel(&probe.components, &vector.components, self.epsilon)?,
                })
            })
            .collect()
    }
}

impl Default for ForceCalculator {
    fn default() -> Self {
        Self::new()
    }
}

/// The `n` largest edges, strongest first. Ties keep enumeration order.
pub fn strongest_edges(edges: &[ForceEdge], n: usize) -> Vec<ForceEdge> {
    let mut sorted = edges.to_vec();
    sorted.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(std::cmp::Ordering::Equal));
    sorted.truncate(n);
    sorted
}

pub fn edges_above(edges: &[ForceEdge], threshold: f64) -> Vec<ForceEdge> {
    edges.iter().filter(|e| e.value > threshold).cloned().collect()
}

/// Memoizes force matrices by a hash of everything the result depends on:
/// each vector's id and component bit patterns, the metric and epsilon.
/// Any edit to a component produces a different key, so entries never go
/// stale; they are only dropped by [`ForceCache::clear`] or eviction.
/// A hit is confirmed against the stored inputs, so a key collision costs
/// a recomputation, never someone else's edges.
pub struct ForceCache {
    calculator: ForceCalculator,
    entries: HashMap<u64, CacheEntry>,
    capacity: usize,
    hits: usize,
    misses: usize,
}

struct CacheEntry {
    metric: MetricKind,
    epsilon_bits: u64,
    inputs: Vec<(u64, Vec<u64>)>,
    edges: Vec<ForceEdge>,
}

impl CacheEntry {
    fn matches(&self, vectors: &[Vector], metric: MetricKind, epsilon: f64) -> bool {
        self.metric == metric
            && self.epsilon_bits == epsilon.to_bits()
            && self.inputs.len() == vectors.len()
            && self.inputs.iter().zip(vectors).all(|((id, bits), v)| {
                *id == v.id
                    && bits.len() == v.components.len()
                    && bits.iter().zip(v.components.iter()).all(|(b, c)| *b == c.to_bits())
            })
    }
}

impl ForceCache {
    pub fn new(calculator: ForceCalculator, capacity: usize) -> Self {
        Self {
            calculator,
            entries: HashMap::new(),
            capacity: capacity.max(1),
            hits: 0,
            misses: 0,
        }
    }

    pub fn content_key(vectors: &[Vector], metric: MetricKind, epsilon: f64) -> u64 {
        let mut hasher = DefaultHasher::new();
        metric.hash(&mut hasher);
        epsilon.to_bits().hash(&mut hasher);
        vectors.len().hash(&mut hasher);
        for vector in vectors {
            vector.id.hash(&mut hasher);
            vector.components.len().hash(&mut hasher);
            for c in vector.components.iter() {
                c.to_bits().hash(&mut hasher);
            }
        }
        hasher.finish()
    }

    pub fn force_matrix(&mut self, vectors: &[Vector], metric: MetricKind) -> Result<Vec<ForceEdge>> {
        let epsilon = self.calculator.get_epsilon();
        let key = Self::content_key(vectors, metric, epsilon);
        if let Some(entry) = self.entries.get(&key) {
            if entry.matches(vectors, metric, epsilon) {
                self.hits += 1;
                return Ok(entry.edges.clone());
            }
        }

        self.misses += 1;
        let edges = self.calculator.compute_force_matrix(vectors, metric)?;
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            // No recency tracking; a full cache simply starts over.
            self.entries.clear();
        }
        let entry = CacheEntry {
            metric,
            epsilon_bits: epsilon.to_bits(),
            inputs: vectors
                .iter()
                .map(|v| (v.id, v.components.iter().map(|c| c.to_bits()).collect()))
                .collect(),
            edges: edges.clone(),
        };
        self.entries.insert(key, entry);
        Ok(edges)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}
