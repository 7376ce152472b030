use crate::metrics;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// A single point in the vector space.
///
/// `x`/`y` hold the 2D layout position chosen by the renderer; nothing in
/// this crate reads or writes them beyond carrying them along.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    pub id: u64,
    pub components: Array1<f64>,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub custom_color: Option<String>,
}

impl Vector {
    pub fn new(id: u64, components: Array1<f64>) -> Self {
        Self {
            id,
            components,
            x: 0.0,
            y: 0.0,
            custom_color: None,
        }
    }

    pub fn from_vec(id: u64, components: Vec<f64>) -> Self {
        Self::new(id, Array1::from_vec(components))
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.custom_color = Some(color.into());
        self
    }

    pub fn dimension(&self) -> usize {
        self.components.len()
    }

    pub fn magnitude(&self) -> f64 {
        metrics::magnitude(&self.components)
    }

    /// Returns a copy with every component negated. Id and layout are kept.
    pub fn negated(&self) -> Self {
        Self {
            components: self.components.mapv(|c| -c),
            ..self.clone()
        }
    }
}
