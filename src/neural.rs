//! Neural-mode view: the probe vector acts as an input signal and every
//! vector in the set as a neuron whose activation is the probe force
//! passed through an activation function.

use crate::activation::{apply_activation_with_slope, ActivationKind, DEFAULT_LEAKY_SLOPE};
use crate::force::{ForceCalculator, MetricKind};
use crate::{vector::Vector, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuronActivation {
    pub index: usize,
    pub id: u64,
    /// Probe force before activation
    pub raw: f64,
    pub activation: f64,
}

#[derive(Debug, Clone)]
pub struct NeuralLayer {
    calculator: ForceCalculator,
    metric: MetricKind,
    activation: ActivationKind,
    leaky_slope: f64,
}

impl NeuralLayer {
    pub fn new(calculator: ForceCalculator, metric: MetricKind, activation: ActivationKind) -> Self {
        Self {
            calculator,
            metric,
            activation,
            leaky_slope: DEFAULT_LEAKY_SLOPE,
        }
    }

    pub fn leaky_slope(mut self, slope: f64) -> Self {
        self.leaky_slope = slope;
        self
    }

    /// One activation per vector, in vector order. Context activations are
    /// normalized against all raw probe forces of this call.
    pub fn respond(&self, vectors: &[Vector], probe: &Vector) -> Result<Vec<NeuronActivation>> {
        let forces = self
            .calculator
            .compute_probe_forces(vectors, probe, self.metric)?;
        let raw: Vec<f64> = forces.iter().map(|f| f.value).collect();

        let activations = forces
            .iter()
            .map(|force| {
                Ok(NeuronActivation {
                    index: force.index,
                    id: force.id,
                    raw: force.value,
                    activation: apply_activation_with_slope(
                        force.value,
                        self.activation,
                        Some(&raw),
                        self.leaky_slope,
                    )?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            neurons = activations.len(),
            metric = %self.metric,
            activation = %self.activation,
            "Computed neural response"
        );
        Ok(activations)
    }
}

pub fn neural_response(
    vectors: &[Vector],
    probe: &Vector,
    metric: MetricKind,
    activation: ActivationKind,
    calculator: &ForceCalculator,
) -> Result<Vec<NeuronActivation>> {
    NeuralLayer::new(calculator.clone(), metric, activation).respond(vectors, probe)
}

/// Most activated neuron; the first one wins ties.
pub fn strongest_neuron(activations: &[NeuronActivation]) -> Option<&NeuronActivation> {
    activations.iter().fold(None, |best, a| match best {
        Some(b) if b.activation >= a.activation => Some(b),
        _ => Some(a),
    })
}
