//! Aggregate analyses over a whole vector set.
//!
//! [`AnalysisEngine::perform_analysis`] is the single entry point. Each
//! engine runs at most one analysis at a time: a call that arrives while
//! another is running is rejected with [`VectoError::AnalysisInProgress`]
//! rather than queued. The engine is `Send + Sync`, so callers that want
//! the work off their own thread can share it behind an `Arc`.

pub mod kmeans;
pub mod pca;
pub mod tsne;

pub use kmeans::{Cluster, KMeansResult};
pub use pca::PcaResult;
pub use tsne::TsneResult;

use crate::config::AnalysisConfig;
use crate::events::{EventSink, NullSink, VectoEvent};
use crate::{vector::Vector, Result, VectoError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    Pca,
    KMeans,
    Tsne,
}

impl AnalysisKind {
    pub fn name(self) -> &'static str {
        match self {
            AnalysisKind::Pca => "pca",
            AnalysisKind::KMeans => "kmeans",
            AnalysisKind::Tsne => "tsne",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AnalysisKind {
    type Err = VectoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pca" => Ok(AnalysisKind::Pca),
            "kmeans" | "k-means" => Ok(AnalysisKind::KMeans),
            "tsne" | "t-sne" => Ok(AnalysisKind::Tsne),
            other => Err(VectoError::InvalidConfig(format!(
                "unknown analysis type '{}'",
                other
            ))),
        }
    }
}

/// Per-call overrides. Unset fields fall back to the engine's
/// [`AnalysisConfig`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    pub target_dimensions: Option<usize>,
    pub k: Option<usize>,
    pub max_iterations: Option<usize>,
    pub seed: Option<u64>,
}

impl AnalysisOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target_dimensions(mut self, dims: usize) -> Self {
        self.target_dimensions = Some(dims);
        self
    }

    pub fn k(mut self, k: usize) -> Self {
        self.k = Some(k);
        self
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnalysisResult {
    Pca(PcaResult),
    KMeans(KMeansResult),
    Tsne(TsneResult),
}

impl AnalysisResult {
    pub fn kind(&self) -> AnalysisKind {
        match self {
            AnalysisResult::Pca(_) => AnalysisKind::Pca,
            AnalysisResult::KMeans(_) => AnalysisKind::KMeans,
            AnalysisResult::Tsne(_) => AnalysisKind::Tsne,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisState {
    Idle,
    Running(AnalysisKind),
    Completed(AnalysisKind),
    Failed { kind: AnalysisKind, error: String },
}

/// Holds the engine's single in-flight slot; released on drop, including
/// during unwinding.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct AnalysisEngine {
    config: AnalysisConfig,
    sink: Arc<dyn EventSink>,
    in_flight: AtomicBool,
    state: Mutex<AnalysisState>,
}

impl AnalysisEngine {
    pub fn new(config: AnalysisConfig) -> Self {
        Self::with_sink(config, Arc::new(NullSink))
    }

    pub fn with_sink(config: AnalysisConfig, sink: Arc<dyn EventSink>) -> Self {
        Self {
            config,
            sink,
            in_flight: AtomicBool::new(false),
            state: Mutex::new(AnalysisState::Idle),
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn state(&self) -> AnalysisState {
        match self.state.lock() {
            Ok(state) => state.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn set_state(&self, next: AnalysisState) {
        match self.state.lock() {
            Ok(mut state) => *state = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    fn rng(&self, options: &AnalysisOptions) -> StdRng {
        match options.seed.or(self.config.seed) {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    pub fn perform_analysis(
        &self,
        kind: AnalysisKind,
        vectors: &[Vector],
        options: &AnalysisOptions,
    ) -> Result<AnalysisResult> {
        let _guard = match InFlightGuard::acquire(&self.in_flight) {
            Some(guard) => guard,
            None => {
                warn!(kind = %kind, "Rejected analysis while another is running");
                return Err(VectoError::AnalysisInProgress);
            }
        };

        self.set_state(AnalysisState::Running(kind));
        self.sink.emit(&VectoEvent::AnalysisStarted { kind });
        debug!(kind = %kind, vectors = vectors.len(), "Starting analysis");

        let outcome = self.run(kind, vectors, options);

        match &outcome {
            Ok(result) => {
                self.set_state(AnalysisState::Completed(kind));
                info!(kind = %kind, vectors = vectors.len(), "Analysis completed");
                self.sink.emit(&VectoEvent::AnalysisCompleted {
                    result: result.clone(),
                });
            }
            Err(e) => {
                let error = e.to_string();
                self.set_state(AnalysisState::Failed {
                    kind,
                    error: error.clone(),
                });
                warn!(kind = %kind, error = %error, "Analysis failed");
                self.sink.emit(&VectoEvent::AnalysisFailed { kind, error });
            }
        }

        outcome
    }

    fn run(
        &self,
        kind: AnalysisKind,
        vectors: &[Vector],
        options: &AnalysisOptions,
    ) -> Result<AnalysisResult> {
        match kind {
            AnalysisKind::Pca => {
                let target = options
                    .target_dimensions
                    .unwrap_or(self.config.pca_dimensions);
                pca::pca(vectors, target).map(AnalysisResult::Pca)
            }
            AnalysisKind::KMeans => {
                let k = options.k.unwrap_or(self.config.kmeans_k);
                // The configured cap bounds any per-call override
                let max_iterations = options
                    .max_iterations
                    .map_or(self.config.max_iterations, |m| {
                        m.min(self.config.max_iterations)
                    });
                let mut rng = self.rng(options);
                kmeans::kmeans(vectors, k, max_iterations, &mut rng).map(AnalysisResult::KMeans)
            }
            AnalysisKind::Tsne => {
                let mut rng = self.rng(options);
                tsne::approximate_tsne(vectors, self.config.tsne_jitter, &mut rng)
                    .map(AnalysisResult::Tsne)
            }
        }
    }
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CollectingSink;
    use std::sync::{OnceLock, Weak};

    fn sample_vectors() -> Vec<Vector> {
        vec![
            Vector::from_vec(0, vec![1.0, 0.0, 0.5]),
            Vector::from_vec(1, vec![0.9, 0.1, 0.4]),
            Vector::from_vec(2, vec![-1.0, 0.2, -0.5]),
            Vector::from_vec(3, vec![-0.8, 0.0, -0.6]),
        ]
    }

    #[test]
    fn test_state_transitions_and_events() {
        let sink = Arc::new(CollectingSink::new());
        let engine = AnalysisEngine::with_sink(AnalysisConfig::default(), sink.clone());
        assert_eq!(engine.state(), AnalysisState::Idle);

        let result = engine
            .perform_analysis(AnalysisKind::Pca, &sample_vectors(), &AnalysisOptions::new())
            .unwrap();
        assert_eq!(result.kind(), AnalysisKind::Pca);
        assert_eq!(engine.state(), AnalysisState::Completed(AnalysisKind::Pca));
        assert_eq!(sink.event_types(), vec!["AnalysisStarted", "AnalysisCompleted"]);
        assert!(!engine.is_running());
    }

    #[test]
    fn test_failure_is_reported_not_retried() {
        let sink = Arc::new(CollectingSink::new());
        let engine = AnalysisEngine::with_sink(AnalysisConfig::default(), sink.clone());

        let err = engine
            .perform_analysis(
                AnalysisKind::KMeans,
                &sample_vectors(),
                &AnalysisOptions::new().k(9),
            )
            .unwrap_err();
        assert!(matches!(err, VectoError::InvalidK { k: 9, available: 4 }));
        assert!(matches!(
            engine.state(),
            AnalysisState::Failed {
                kind: AnalysisKind::KMeans,
                ..
            }
        ));
        assert_eq!(sink.event_types(), vec!["AnalysisStarted", "AnalysisFailed"]);

        // The slot is free again after a failure
        assert!(engine
            .perform_analysis(AnalysisKind::Tsne, &sample_vectors(), &AnalysisOptions::new())
            .is_ok());
    }

    #[test]
    fn test_per_call_iterations_are_bounded() {
        let config = AnalysisConfig {
            max_iterations: 2,
            ..AnalysisConfig::default()
        };
        let engine = AnalysisEngine::new(config);
        let vectors: Vec<Vector> = (0..12)
            .map(|i| Vector::from_vec(i, vec![(i * i) as f64, (i % 5) as f64]))
            .collect();

        let result = engine
            .perform_analysis(
                AnalysisKind::KMeans,
                &vectors,
                &AnalysisOptions::new().k(4).max_iterations(10_000).seed(1),
            )
            .unwrap();
        let AnalysisResult::KMeans(kmeans) = result else {
            panic!("expected k-means result");
        };
        assert!(kmeans.iterations <= 2);
        assert_eq!(kmeans.assignments.len(), 12);

        let err = engine
            .perform_analysis(
                AnalysisKind::KMeans,
                &sample_vectors(),
                &AnalysisOptions::new().k(2).max_iterations(0),
            )
            .unwrap_err();
        assert!(matches!(err, VectoError::InvalidConfig(_)));
    }

    #[test]
    fn test_invalid_jitter_fails_instead_of_panicking() {
        let sink = Arc::new(CollectingSink::new());
        let config = AnalysisConfig {
            tsne_jitter: f64::INFINITY,
            ..AnalysisConfig::default()
        };
        let engine = AnalysisEngine::with_sink(config, sink.clone());

        let err = engine
            .perform_analysis(AnalysisKind::Tsne, &sample_vectors(), &AnalysisOptions::new())
            .unwrap_err();
        assert!(matches!(err, VectoError::InvalidConfig(_)));
        assert_eq!(sink.event_types(), vec!["AnalysisStarted", "AnalysisFailed"]);
        assert!(!engine.is_running());
    }

    /// Calls back into the engine from inside the `AnalysisStarted` event,
    /// i.e. while the first analysis still holds the slot.
    struct ReentrantSink {
        engine: OnceLock<Weak<AnalysisEngine>>,
        nested: Mutex<Vec<Result<AnalysisResult>>>,
    }

    impl EventSink for ReentrantSink {
        fn emit(&self, event: &VectoEvent) {
            if let VectoEvent::AnalysisStarted { kind: AnalysisKind::Pca } = event {
                if let Some(engine) = self.engine.get().and_then(Weak::upgrade) {
                    let nested = engine.perform_analysis(
                        AnalysisKind::Tsne,
                        &sample_vectors(),
                        &AnalysisOptions::new(),
                    );
                    self.nested.lock().unwrap().push(nested);
                }
            }
        }
    }

    #[test]
    fn test_concurrent_call_is_rejected() {
        let sink = Arc::new(ReentrantSink {
            engine: OnceLock::new(),
            nested: Mutex::new(Vec::new()),
        });
        let engine = Arc::new(AnalysisEngine::with_sink(
            AnalysisConfig::default(),
            sink.clone(),
        ));
        sink.engine.set(Arc::downgrade(&engine)).unwrap();

        let outer = engine.perform_analysis(
            AnalysisKind::Pca,
            &sample_vectors(),
            &AnalysisOptions::new(),
        );
        assert!(outer.is_ok());

        let nested = sink.nested.lock().unwrap();
        assert_eq!(nested.len(), 1);
        assert!(matches!(nested[0], Err(VectoError::AnalysisInProgress)));
        // The rejected call must not clobber the running analysis' state
        assert_eq!(engine.state(), AnalysisState::Completed(AnalysisKind::Pca));
    }

    #[test]
    fn test_seeded_kmeans_is_reproducible() {
        let engine = AnalysisEngine::default();
        let options = AnalysisOptions::new().k(2).seed(17);
        let a = engine
            .perform_analysis(AnalysisKind::KMeans, &sample_vectors(), &options)
            .unwrap();
        let b = engine
            .perform_analysis(AnalysisKind::KMeans, &sample_vectors(), &options)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("PCA".parse::<AnalysisKind>().unwrap(), AnalysisKind::Pca);
        assert_eq!("k-means".parse::<AnalysisKind>().unwrap(), AnalysisKind::KMeans);
        assert_eq!("tsne".parse::<AnalysisKind>().unwrap(), AnalysisKind::Tsne);
        assert!("umap".parse::<AnalysisKind>().is_err());
    }

    #[test]
    fn test_result_serializes_with_type_tag() {
        let engine = AnalysisEngine::default();
        let result = engine
            .perform_analysis(AnalysisKind::Tsne, &sample_vectors(), &AnalysisOptions::new())
            .unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["type"], "tsne");
        assert_eq!(json["embedding"].as_array().unwrap().len(), 4);
    }
}
