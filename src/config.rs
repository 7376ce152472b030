use crate::force::MetricKind;
use crate::{Result, VectoError};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Top-level configuration. Every section falls back to its defaults when
/// omitted from the JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectoConfig {
    pub force: ForceConfig,
    pub analysis: AnalysisConfig,
    pub activation: ActivationConfig,
    pub limits: SpaceLimits,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
    /// Added to squared distances in the inverse-distance metrics
    pub epsilon: f64,
    pub metric: MetricKind,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.01,
            metric: MetricKind::Resonance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub pca_dimensions: usize,
    pub kmeans_k: usize,
    /// Hard cap on Lloyd iterations
    pub max_iterations: usize,
    /// Seed for k-means initialization and t-SNE jitter; `None` draws from entropy
    pub seed: Option<u64>,
    /// Half-width of the uniform jitter added by the t-SNE approximation
    pub tsne_jitter: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            pca_dimensions: 2,
            kmeans_k: 3,
            max_iterations: 300,
            seed: None,
            tsne_jitter: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivationConfig {
    pub leaky_slope: f64,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self { leaky_slope: 0.01 }
    }
}

/// Size guardrails applied by [`crate::VectorSpace`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceLimits {
    pub max_dimensions: usize,
    pub max_vectors: usize,
}

impl Default for SpaceLimits {
    fn default() -> Self {
        Self {
            max_dimensions: 20,
            max_vectors: 100,
        }
    }
}

impl VectoConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: VectoConfig =
            serde_json::from_str(json).context("Failed to parse configuration JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)
            .with_context(|| format!("Failed to open config file {}", path.display()))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .context("Failed to read config file contents")?;

        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.force.epsilon.is_finite() && self.force.epsilon > 0.0) {
            return Err(VectoError::InvalidConfig(format!(
                "force.epsilon must be a positive finite number, got {}",
                self.force.epsilon
            )));
        }
        if self.analysis.pca_dimensions == 0 {
            return Err(VectoError::InvalidConfig(
                "analysis.pca_dimensions must be at least 1".into(),
            ));
        }
        if self.analysis.kmeans_k == 0 {
            return Err(VectoError::InvalidConfig(
                "analysis.kmeans_k must be at least 1".into(),
            ));
        }
        if self.analysis.max_iterations == 0 {
            return Err(VectoError::InvalidConfig(
                "analysis.max_iterations must be at least 1".into(),
            ));
        }
        if !(self.analysis.tsne_jitter.is_finite() && self.analysis.tsne_jitter >= 0.0) {
            return Err(VectoError::InvalidConfig(format!(
                "analysis.tsne_jitter must be non-negative, got {}",
                self.analysis.tsne_jitter
            )));
        }
        if !self.activation.leaky_slope.is_finite() {
            return Err(VectoError::InvalidConfig(
                "activation.leaky_slope must be finite".into(),
            ));
        }
        if self.limits.max_dimensions == 0 || self.limits.max_vectors == 0 {
            return Err(VectoError::InvalidConfig(
                "limits must allow at least one vector and one dimension".into(),
            ));
        }
        Ok(())
    }
}
