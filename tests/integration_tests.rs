use ndarray::{array, Array1};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use vectoverse::{
    activation::ActivationKind,
    analysis::{AnalysisEngine, AnalysisKind, AnalysisOptions, AnalysisResult, AnalysisState},
    config::VectoConfig,
    events::{CollectingSink, VectoEvent},
    export::ExportPayload,
    force::{ForceCalculator, MetricKind},
    information::{quantum_decomposition, shannon_entropy, Charge},
    inspector::Inspector,
    metrics::magnitude,
    space::{VectorSource, VectorSpace},
    vector::Vector,
    VectoError,
};

fn seeded_space(dimensions: usize, count: usize, seed: u64) -> VectorSpace {
    let mut space = VectorSpace::new(dimensions).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    space.regenerate(count, &mut rng).unwrap();
    space
}

#[test]
fn test_end_to_end_session() {
    let config = VectoConfig::from_json_str(
        r#"{ "force": { "metric": "cosine" }, "analysis": { "seed": 99, "kmeans_k": 2 } }"#,
    )
    .unwrap();

    let mut space = seeded_space(6, 12, 1);
    space
        .set_input_vector(Vector::from_vec(1000, vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0]))
        .unwrap();

    let calculator = ForceCalculator::from_config(&config.force).unwrap();
    let sink = Arc::new(CollectingSink::new());
    let engine = AnalysisEngine::with_sink(config.analysis.clone(), sink.clone());
    let inspector = Inspector::new(&space, &calculator, &engine, sink.as_ref());

    let edges = inspector.force_matrix(config.force.metric).unwrap();
    assert_eq!(edges.len(), 12 * 11 / 2);
    assert!(edges.iter().all(|e| (0.0..=1.0 + 1e-12).contains(&e.value)));

    let pca = inspector
        .analyze(AnalysisKind::Pca, &AnalysisOptions::new())
        .unwrap();
    let kmeans = inspector
        .analyze(AnalysisKind::KMeans, &AnalysisOptions::new())
        .unwrap();
    let tsne = inspector
        .analyze(AnalysisKind::Tsne, &AnalysisOptions::new())
        .unwrap();

    match (&pca, &kmeans, &tsne) {
        (AnalysisResult::Pca(p), AnalysisResult::KMeans(k), AnalysisResult::Tsne(t)) => {
            assert_eq!(p.components.len(), 2);
            assert_eq!(k.k, 2);
            assert_eq!(k.assignments.len(), 12);
            assert_eq!(t.embedding.len(), 12);
        }
        _ => panic!("unexpected result kinds"),
    }
    assert_eq!(engine.state(), AnalysisState::Completed(AnalysisKind::Tsne));

    let neurons = inspector
        .neural_response(MetricKind::Cosine, ActivationKind::Softmax, 0.01)
        .unwrap();
    assert_eq!(neurons.len(), 12);

    assert_eq!(
        sink.event_types(),
        vec![
            "ForceMatrixUpdated",
            "AnalysisStarted",
            "AnalysisCompleted",
            "AnalysisStarted",
            "AnalysisCompleted",
            "AnalysisStarted",
            "AnalysisCompleted",
        ]
    );
}

#[test]
fn test_cosine_scenario() {
    let vectors = vec![
        Vector::from_vec(0, vec![1.0, 0.0]),
        Vector::from_vec(1, vec![0.0, 1.0]),
        Vector::from_vec(2, vec![1.0, 1.0]),
    ];
    let edges = ForceCalculator::new()
        .compute_force_matrix(&vectors, MetricKind::Cosine)
        .unwrap();

    let values: Vec<f64> = edges.iter().map(|e| e.value).collect();
    assert!(values[0].abs() < 1e-9);
    assert!((values[1] - 0.7071).abs() < 1e-4);
    assert!((values[2] - 0.7071).abs() < 1e-4);
    assert_eq!(edges[2].source_id, 1);
    assert_eq!(edges[2].target_id, 2);
}

#[test]
fn test_small_scenarios() {
    assert_eq!(magnitude(&array![3.0, 4.0]), 5.0);

    let q = quantum_decomposition(&array![2.0, -1.0, 3.0, -4.0]);
    assert_eq!((q.excitatory, q.inhibitory), (5.0, 5.0));
    assert_eq!(q.charge(), Charge::Neutral);

    assert_eq!(shannon_entropy(&array![0.0, 7.0, 0.0]), 0.0);
    assert!((shannon_entropy(&Array1::from_elem(5, 0.3)) - 5.0f64.log2()).abs() < 1e-12);
}

#[test]
fn test_negating_all_vectors_keeps_sign_invariant_metrics() {
    let space = seeded_space(5, 8, 7);
    let negated: Vec<Vector> = space.vectors().iter().map(Vector::negated).collect();
    let calculator = ForceCalculator::new();

    for metric in [MetricKind::Resonance, MetricKind::Cosine, MetricKind::Gravity] {
        let before = calculator.compute_force_matrix(space.vectors(), metric).unwrap();
        let after = calculator.compute_force_matrix(&negated, metric).unwrap();
        for (a, b) in before.iter().zip(&after) {
            assert!(
                (a.value - b.value).abs() <= 1e-12 * a.value.abs().max(1.0),
                "{metric} changed: {} vs {}",
                a.value,
                b.value
            );
        }
    }
}

#[test]
fn test_kmeans_singletons_through_engine() {
    let space = seeded_space(3, 6, 21);
    let engine = AnalysisEngine::default();
    let result = engine
        .perform_analysis(
            AnalysisKind::KMeans,
            space.vectors(),
            &AnalysisOptions::new().k(6).seed(4),
        )
        .unwrap();

    let AnalysisResult::KMeans(kmeans) = result else {
        panic!("expected k-means result");
    };
    assert!(kmeans.converged);
    assert!(kmeans.clusters.iter().all(|c| c.members.len() == 1));
    assert!(kmeans.clusters.iter().all(|c| c.within_variance == 0.0));
}

#[test]
fn test_pca_requires_two_vectors() {
    let space = seeded_space(4, 1, 3);
    let sink = Arc::new(CollectingSink::new());
    let engine = AnalysisEngine::with_sink(Default::default(), sink.clone());

    let err = engine
        .perform_analysis(AnalysisKind::Pca, space.vectors(), &AnalysisOptions::new())
        .unwrap_err();
    assert!(matches!(
        err,
        VectoError::InsufficientData {
            required: 2,
            actual: 1
        }
    ));

    let events = sink.events();
    match events.last() {
        Some(VectoEvent::AnalysisFailed { kind, error }) => {
            assert_eq!(*kind, AnalysisKind::Pca);
            assert!(error.contains("at least 2"));
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[test]
fn test_threads_share_one_engine() {
    let engine = Arc::new(AnalysisEngine::default());
    let vectors: Vec<Vector> = seeded_space(4, 20, 5).vectors().to_vec();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let vectors = vectors.clone();
            std::thread::spawn(move || {
                engine.perform_analysis(AnalysisKind::Pca, &vectors, &AnalysisOptions::new())
            })
        })
        .collect();

    let mut completed = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(result) => {
                assert_eq!(result.kind(), AnalysisKind::Pca);
                completed += 1;
            }
            Err(VectoError::AnalysisInProgress) => {}
            Err(other) => panic!("unexpected error {other}"),
        }
    }
    // Whoever held the slot finished, so a rejection implies a success
    assert!(completed >= 1);
    assert!(!engine.is_running());
    assert_eq!(engine.state(), AnalysisState::Completed(AnalysisKind::Pca));
}

#[test]
fn test_export_payload_from_space() {
    let space = seeded_space(3, 4, 8);
    let payload =
        ExportPayload::build(&space, &ForceCalculator::new(), MetricKind::Manhattan).unwrap();
    assert_eq!(payload.dimensions, 3);
    assert_eq!(payload.edges.len(), 6);

    let json = payload.to_json().unwrap();
    assert!(json.contains("\"metric\": \"manhattan\""));
}

#[test]
fn test_dimension_coercion_keeps_forces_computable() {
    let mut space = seeded_space(4, 5, 2);
    space.coerce_dimensions(7).unwrap();
    assert!(space.vectors().iter().all(|v| v.dimension() == 7));

    let edges = ForceCalculator::new()
        .compute_force_matrix(space.vectors(), MetricKind::Correlation)
        .unwrap();
    assert_eq!(edges.len(), 10);
}
