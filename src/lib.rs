pub mod activation;
pub mod analysis;
pub mod config;
pub mod events;
pub mod export;
pub mod force;
pub mod information;
pub mod inspector;
pub mod metrics;
pub mod neural;
pub mod space;
pub mod vector;

use activation::ActivationKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VectoError {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Insufficient data: need at least {required} vectors, got {actual}")]
    InsufficientData { required: usize, actual: usize },
    #[error("Invalid cluster count k={k} for {available} vectors")]
    InvalidK { k: usize, available: usize },
    #[error("An analysis is already running")]
    AnalysisInProgress,
    #[error("Duplicate vector id {0}")]
    DuplicateId(u64),
    #[error("Missing vector id {0}")]
    MissingId(u64),
    #[error("Activation {0} needs the candidate values as context")]
    MissingActivationContext(ActivationKind),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, VectoError>;

// Re-export main types for convenience
pub use activation::{apply_activation, apply_activation_all};
pub use analysis::{AnalysisEngine, AnalysisKind, AnalysisOptions, AnalysisResult, AnalysisState};
pub use config::VectoConfig;
pub use events::{EventSink, VectoEvent};
pub use force::{ForceCalculator, ForceEdge, MetricKind};
pub use information::{quantum_decomposition, shannon_entropy, Charge, QuantumDecomposition};
pub use inspector::Inspector;
pub use metrics::{cosine_similarity, euclidean_distance};
pub use space::{VectorSource, VectorSpace};
pub use vector::Vector;
