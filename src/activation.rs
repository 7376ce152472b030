//! Activation functions
//!
//! Maps raw metric values to bounded activations for the neural-mode view.
//! Scalar kinds look only at the value; context kinds (softmax family and
//! soft sigmoid) normalize the value against the full set of candidates it
//! competes with. For a fixed context every kind except swish is monotone
//! in the value; swish dips below zero around x = -1.28.

use crate::{Result, VectoError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_LEAKY_SLOPE: f64 = 0.01;

/// Sigmoid activation: σ(x) = 1 / (1 + e^(-x))
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

pub fn tanh(x: f64) -> f64 {
    x.tanh()
}

/// ReLU activation: max(0, x)
pub fn relu(x: f64) -> f64 {
    x.max(0.0)
}

/// Leaky ReLU: x for x > 0, slope·x otherwise
pub fn leaky_relu(x: f64, slope: f64) -> f64 {
    if x > 0.0 {
        x
    } else {
        slope * x
    }
}

/// Softplus: ln(1 + e^x), written to avoid overflow for large x
pub fn softplus(x: f64) -> f64 {
    x.max(0.0) + (-x.abs()).exp().ln_1p()
}

/// Swish: x·σ(x)
pub fn swish(x: f64) -> f64 {
    x * sigmoid(x)
}

fn context_max(x: f64, context: &[f64]) -> f64 {
    context.iter().copied().fold(x, f64::max)
}

/// `e^(x-m) / Σ e^(c-m)` over the context, `m` the largest of value and context.
pub fn softmax(x: f64, context: &[f64]) -> f64 {
    let m = context_max(x, context);
    let denom: f64 = context.iter().map(|c| (c - m).exp()).sum();
    if denom == 0.0 {
        return 0.0;
    }
    ((x - m).exp() / denom).clamp(0.0, 1.0)
}

/// Base-2 softmax, `2^(x-m) / Σ 2^(c-m)`. Flatter than [`softmax`] for the
/// same spread of inputs.
pub fn softermax(x: f64, context: &[f64]) -> f64 {
    let m = context_max(x, context);
    let denom: f64 = context.iter().map(|c| (c - m).exp2()).sum();
    if denom == 0.0 {
        return 0.0;
    }
    ((x - m).exp2() / denom).clamp(0.0, 1.0)
}

/// Sigmoid of the value standardized against the context.
pub fn soft_sigmoid(x: f64, context: &[f64]) -> f64 {
    let n = context.len() as f64;
    let mean = context.iter().sum::<f64>() / n;
    let variance = context.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();
    if std > 0.0 {
        sigmoid((x - mean) / std)
    } else {
        sigmoid(x - mean)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationKind {
    Sigmoid,
    Tanh,
    Relu,
    LeakyRelu,
    Softplus,
    Swish,
    Softmax,
    Softermax,
    SoftSigmoid,
}

enum ActivationFn {
    Scalar(fn(f64) -> f64),
    Sloped(fn(f64, f64) -> f64),
    Contextual(fn(f64, &[f64]) -> f64),
}

impl ActivationKind {
    pub const ALL: [ActivationKind; 9] = [
        ActivationKind::Sigmoid,
        ActivationKind::Tanh,
        ActivationKind::Relu,
        ActivationKind::LeakyRelu,
        ActivationKind::Softplus,
        ActivationKind::Swish,
        ActivationKind::Softmax,
        ActivationKind::Softermax,
        ActivationKind::SoftSigmoid,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ActivationKind::Sigmoid => "sigmoid",
            ActivationKind::Tanh => "tanh",
            ActivationKind::Relu => "relu",
            ActivationKind::LeakyRelu => "leaky_relu",
            ActivationKind::Softplus => "softplus",
            ActivationKind::Swish => "swish",
            ActivationKind::Softmax => "softmax",
            ActivationKind::Softermax => "softermax",
            ActivationKind::SoftSigmoid => "soft_sigmoid",
        }
    }

    fn function(self) -> ActivationFn {
        match self {
            ActivationKind::Sigmoid => ActivationFn::Scalar(sigmoid),
            ActivationKind::Tanh => ActivationFn::Scalar(tanh),
            ActivationKind::Relu => ActivationFn::Scalar(relu),
            ActivationKind::LeakyRelu => ActivationFn::Sloped(leaky_relu),
            ActivationKind::Softplus => ActivationFn::Scalar(softplus),
            ActivationKind::Swish => ActivationFn::Scalar(swish),
            ActivationKind::Softmax => ActivationFn::Contextual(softmax),
            ActivationKind::Softermax => ActivationFn::Contextual(softermax),
            ActivationKind::SoftSigmoid => ActivationFn::Contextual(soft_sigmoid),
        }
    }

    pub fn needs_context(self) -> bool {
        matches!(self.function(), ActivationFn::Contextual(_))
    }

    /// Inclusive output bounds.
    pub fn range(self) -> (f64, f64) {
        match self {
            ActivationKind::Sigmoid
            | ActivationKind::Softmax
            | ActivationKind::Softermax
            | ActivationKind::SoftSigmoid => (0.0, 1.0),
            ActivationKind::Tanh => (-1.0, 1.0),
            ActivationKind::Relu | ActivationKind::Softplus => (0.0, f64::INFINITY),
            ActivationKind::LeakyRelu => (f64::NEG_INFINITY, f64::INFINITY),
            // min of x·σ(x) is about -0.278
            ActivationKind::Swish => (-0.2785, f64::INFINITY),
        }
    }
}

impl fmt::Display for ActivationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActivationKind {
    type Err = VectoError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().replace('-', "_");
        ActivationKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| VectoError::InvalidConfig(format!("unknown activation '{}'", s)))
    }
}

/// Activates `value`. Context kinds require a non-empty `context`.
pub fn apply_activation(value: f64, kind: ActivationKind, context: Option<&[f64]>) -> Result<f64> {
    apply_activation_with_slope(value, kind, context, DEFAULT_LEAKY_SLOPE)
}

pub fn apply_activation_with_slope(
    value: f64,
    kind: ActivationKind,
    context: Option<&[f64]>,
    leaky_slope: f64,
) -> Result<f64> {
    match kind.function() {
        ActivationFn::Scalar(f) => Ok(f(value)),
        ActivationFn::Sloped(f) => Ok(f(value, leaky_slope)),
        ActivationFn::Contextual(f) => match context {
            Some(ctx) if !ctx.is_empty() => Ok(f(value, ctx)),
            _ => Err(VectoError::MissingActivationContext(kind)),
        },
    }
}

/// Activates every value, using the whole slice as context.
pub fn apply_activation_all(values: &[f64], kind: ActivationKind) -> Result<Vec<f64>> {
    values
        .iter()
        .map(|&v| apply_activation(v, kind, Some(values)))
        .collect()
}
