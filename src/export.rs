//! Numeric payload handed to the JSON/CSV/SVG/... exporters.

use crate::force::{ForceCalculator, ForceEdge, MetricKind};
use crate::information::{vector_statistics, VectorStatistics};
use crate::space::VectorSource;
use crate::{vector::Vector, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedVector {
    pub id: u64,
    pub components: Vec<f64>,
    pub x: f64,
    pub y: f64,
    pub custom_color: Option<String>,
    pub statistics: VectorStatistics,
}

impl From<&Vector> for ExportedVector {
    fn from(vector: &Vector) -> Self {
        Self {
            id: vector.id,
            components: vector.components.to_vec(),
            x: vector.x,
            y: vector.y,
            custom_color: vector.custom_color.clone(),
            statistics: vector_statistics(&vector.components),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportPayload {
    pub dimensions: usize,
    pub metric: MetricKind,
    pub epsilon: f64,
    pub vectors: Vec<ExportedVector>,
    pub input_vector: Option<ExportedVector>,
    pub edges: Vec<ForceEdge>,
}

impl ExportPayload {
    pub fn build(
        source: &dyn VectorSource,
        calculator: &ForceCalculator,
        metric: MetricKind,
    ) -> Result<Self> {
        let vectors = source.vectors();
        let dimensions = vectors
            .first()
            .or(source.input_vector())
            .map(Vector::dimension)
            .unwrap_or(0);

        Ok(Self {
            dimensions,
            metric,
            epsilon: calculator.get_epsilon(),
            vectors: vectors.iter().map(ExportedVector::from).collect(),
            input_vector: source.input_vector().map(ExportedVector::from),
            edges: calculator.compute_force_matrix(vectors, metric)?,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize export payload to JSON")?;
        Ok(json)
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = self.to_json()?;

        let mut file = File::create(path.as_ref())
            .context("Failed to create file for writing")?;

        file.write_all(json.as_bytes())
            .context("Failed to write export payload to file")?;

        Ok(())
    }
}
