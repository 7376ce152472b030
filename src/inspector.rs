use crate::activation::ActivationKind;
use crate::analysis::{AnalysisEngine, AnalysisKind, AnalysisOptions, AnalysisResult};
use crate::events::{EventSink, VectoEvent};
use crate::force::{ForceCalculator, ForceEdge, MetricKind, ProbeForce};
use crate::information::{vector_statistics, VectorStatistics};
use crate::neural::{NeuralLayer, NeuronActivation};
use crate::space::VectorSource;
use crate::{Result, VectoError};

/// Read-only entry point the rendering layer talks to. Borrows one
/// snapshot of the vector set for its whole lifetime.
pub struct Inspector<'a> {
    source: &'a dyn VectorSource,
    calculator: &'a ForceCalculator,
    engine: &'a AnalysisEngine,
    sink: &'a dyn EventSink,
}

impl<'a> Inspector<'a> {
    pub fn new(
        source: &'a dyn VectorSource,
        calculator: &'a ForceCalculator,
        engine: &'a AnalysisEngine,
        sink: &'a dyn EventSink,
    ) -> Self {
        Self {
            source,
            calculator,
            engine,
            sink,
        }
    }

    /// Recomputes the force matrix and publishes it.
    pub fn force_matrix(&self, metric: MetricKind) -> Result<Vec<ForceEdge>> {
        let edges = self
            .calculator
            .compute_force_matrix(self.source.vectors(), metric)?;
        self.sink.emit(&VectoEvent::ForceMatrixUpdated {
            metric,
            edges: edges.clone(),
        });
        Ok(edges)
    }

    /// Forces from the input vector to every vector; empty when no input
    /// vector is set.
    pub fn probe_forces(&self, metric: MetricKind) -> Result<Vec<ProbeForce>> {
        match self.source.input_vector() {
            Some(probe) => self
                .calculator
                .compute_probe_forces(self.source.vectors(), probe, metric),
            None => Ok(Vec::new()),
        }
    }

    pub fn statistics(&self, id: u64) -> Result<VectorStatistics> {
        let vector = self.source.get(id).ok_or(VectoError::MissingId(id))?;
        Ok(vector_statistics(&vector.components))
    }

    pub fn input_statistics(&self) -> Option<VectorStatistics> {
        self.source
            .input_vector()
            .map(|v| vector_statistics(&v.components))
    }

    pub fn analyze(&self, kind: AnalysisKind, options: &AnalysisOptions) -> Result<AnalysisResult> {
        self.engine
            .perform_analysis(kind, self.source.vectors(), options)
    }

    /// Neural-mode activations; empty when no input vector is set.
    pub fn neural_response(
        &self,
        metric: MetricKind,
        activation: ActivationKind,
        leaky_slope: f64,
    ) -> Result<Vec<NeuronActivation>> {
        match self.source.input_vector() {
            Some(probe) => NeuralLayer::new(self.calculator.clone(), metric, activation)
                .leaky_slope(leaky_slope)
                .respond(self.source.vectors(), probe),
            None => Ok(Vec::new()),
        }
    }

    pub fn count_vectors(&self) -> usize {
        self.source.count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::events::CollectingSink;
    use crate::space::VectorSpace;
    use crate::vector::Vector;
    use ndarray::array;

    fn space() -> VectorSpace {
        let mut space = VectorSpace::new(2).unwrap();
        space.push(array![1.0, 0.0]).unwrap();
        space.push(array![0.0, 1.0]).unwrap();
        space.push(array![1.0, 1.0]).unwrap();
        space
    }

    #[test]
    fn test_force_matrix_is_published() {
        let space = space();
        let calculator = ForceCalculator::new();
        let engine = AnalysisEngine::new(AnalysisConfig::default());
        let sink = CollectingSink::new();
        let inspector = Inspector::new(&space, &calculator, &engine, &sink);

        let edges = inspector.force_matrix(MetricKind::Cosine).unwrap();
        assert_eq!(edges.len(), 3);
        match &sink.events()[0] {
            VectoEvent::ForceMatrixUpdated { metric, edges: published } => {
                assert_eq!(*metric, MetricKind::Cosine);
                assert_eq!(published, &edges);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_probe_paths_without_input() {
        let space = space();
        let calculator = ForceCalculator::new();
        let engine = AnalysisEngine::default();
        let sink = CollectingSink::new();
        let inspector = Inspector::new(&space, &calculator, &engine, &sink);

        assert!(inspector.probe_forces(MetricKind::Cosine).unwrap().is_empty());
        assert!(inspector
            .neural_response(MetricKind::Cosine, ActivationKind::Softmax, 0.01)
            .unwrap()
            .is_empty());
        assert!(inspector.input_statistics().is_none());
    }

    #[test]
    fn test_probe_paths_with_input() {
        let mut space = space();
        space
            .set_input_vector(Vector::from_vec(100, vec![1.0, 0.0]))
            .unwrap();
        let calculator = ForceCalculator::new();
        let engine = AnalysisEngine::default();
        let sink = CollectingSink::new();
        let inspector = Inspector::new(&space, &calculator, &engine, &sink);

        let forces = inspector.probe_forces(MetricKind::Cosine).unwrap();
        assert_eq!(forces.len(), 3);
        let neurons = inspector
            .neural_response(MetricKind::Cosine, ActivationKind::Sigmoid, 0.01)
            .unwrap();
        assert_eq!(neurons.len(), 3);
        assert!(inspector.input_statistics().is_some());
    }

    #[test]
    fn test_statistics_and_analysis() {
        let space = space();
        let calculator = ForceCalculator::new();
        let engine = AnalysisEngine::default();
        let sink = CollectingSink::new();
        let inspector = Inspector::new(&space, &calculator, &engine, &sink);

        assert_eq!(inspector.statistics(0).unwrap().magnitude, 1.0);
        assert!(matches!(inspector.statistics(42), Err(VectoError::MissingId(42))));
        assert_eq!(inspector.count_vectors(), 3);

        let result = inspector
            .analyze(AnalysisKind::Pca, &AnalysisOptions::new())
            .unwrap();
        assert_eq!(result.kind(), AnalysisKind::Pca);
    }
}
