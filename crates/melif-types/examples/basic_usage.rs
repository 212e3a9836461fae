use melif_types::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("MeLiF Basic Usage Example");

    let config = SearchConfig::new(["vdm", "fit_criterion", "symmetric_uncertainty", "spearman"])
        .with_delta(0.1)
        .with_workers(4)
        .with_budget(StopBudget::NoImprovement(20));
    config.validate()?;
    println!("Configured {} measures, delta {}", config.dimension(), config.delta);

    // Raw weights are normalized on construction
    let start = Point::new(vec![2.0, 1.0, 1.0, 0.0])?;
    println!("Starting point: {}", start);

    let neighbours = start.neighbours(config.delta);
    println!("{} neighbours at delta {}", neighbours.len(), config.delta);

    let stats = RunStats::new("basic_usage", &config);
    for (i, point) in neighbours.into_iter().enumerate() {
        // Stand-in score: prefer weight on the first measure
        let score = point.coordinates()[0];
        let improved = stats.update_best_result(&SelectionResult::new(point, score, vec![i]));
        if improved {
            println!("New best score {:.3}", score);
        }
    }
    stats.record_stop(StopReason::Converged);
    stats.mark_finished();

    println!("{}", serde_json::to_string_pretty(&stats.summary())?);
    Ok(())
}
