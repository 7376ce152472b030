use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use vectoverse::{
    activation::ActivationKind,
    analysis::{AnalysisEngine, AnalysisKind, AnalysisOptions, AnalysisResult},
    config::VectoConfig,
    events::TracingSink,
    export::ExportPayload,
    force::{strongest_edges, ForceCalculator, MetricKind},
    inspector::Inspector,
    neural::strongest_neuron,
    space::VectorSpace,
    vector::Vector,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("🌌 Vectoverse Demo");
    println!("==================\n");

    let config = VectoConfig::default();
    config.validate()?;

    // Build a small random space
    println!("📊 Generating 12 random 8-dimensional vectors...");
    let mut space = VectorSpace::with_limits(8, config.limits.clone())?;
    let mut rng = StdRng::seed_from_u64(2024);
    space.regenerate(12, &mut rng)?;
    space.set_input_vector(Vector::from_vec(
        1000,
        vec![1.0, 0.5, 0.0, 0.0, -0.5, 0.0, 0.0, 0.25],
    ))?;

    let calculator = ForceCalculator::from_config(&config.force)?;
    let sink = Arc::new(TracingSink);
    let engine = AnalysisEngine::with_sink(config.analysis.clone(), sink.clone());
    let inspector = Inspector::new(&space, &calculator, &engine, sink.as_ref());

    // Forces between every pair
    println!("\n🧲 Strongest resonance edges:");
    let edges = inspector.force_matrix(MetricKind::Resonance)?;
    for (i, edge) in strongest_edges(&edges, 5).iter().enumerate() {
        println!(
            "  {}. Vector {} ↔ Vector {} - Force: {:.4}",
            i + 1,
            edge.source_id,
            edge.target_id,
            edge.value
        );
    }

    // Per-vector statistics
    println!("\n🔬 Statistics for vector 0:");
    let stats = inspector.statistics(0)?;
    println!("  Magnitude: {:.4}", stats.magnitude);
    println!("  Entropy: {:.4} bits", stats.entropy);
    println!(
        "  Quantum: +{:.3} / -{:.3} ({:?})",
        stats.quantum.excitatory, stats.quantum.inhibitory, stats.charge
    );

    // Analyses
    println!("\n📉 Running analyses...");
    if let AnalysisResult::Pca(result) =
        inspector.analyze(AnalysisKind::Pca, &AnalysisOptions::new())?
    {
        for (i, ratio) in result.explained_variance.iter().enumerate() {
            println!("  PC{}: {:.1}% of variance", i + 1, ratio * 100.0);
        }
    }
    if let AnalysisResult::KMeans(result) =
        inspector.analyze(AnalysisKind::KMeans, &AnalysisOptions::new().k(3).seed(7))?
    {
        for (i, cluster) in result.clusters.iter().enumerate() {
            println!("  Cluster {}: {:?}", i, cluster.member_ids);
        }
        println!(
            "  Converged: {} after {} iterations",
            result.converged, result.iterations
        );
    }

    // Neural mode
    println!("\n🧠 Neural response (cosine → softmax):");
    let neurons = inspector.neural_response(
        MetricKind::Cosine,
        ActivationKind::Softmax,
        config.activation.leaky_slope,
    )?;
    if let Some(winner) = strongest_neuron(&neurons) {
        println!(
            "  Most active neuron: vector {} ({:.4})",
            winner.id, winner.activation
        );
    }

    // Export
    println!("\n💾 Exporting payload...");
    let temp_path = std::env::temp_dir().join("vectoverse_demo.json");
    let payload = ExportPayload::build(&space, &calculator, MetricKind::Resonance)?;
    payload.write_json(&temp_path)?;
    println!("  Wrote {} vectors to {:?}", payload.vectors.len(), temp_path);

    std::fs::remove_file(&temp_path)?;
    println!("\n🧹 Cleaned up temporary files");

    println!("\n✅ Demo completed successfully!");
    Ok(())
}
