//! Example: Organizing Colors on a Kohonen Map
//!
//! Demonstrates how to:
//! 1. Configure a self-organizing map through `NetworkConfig`
//! 2. Train it on RGB colors
//! 3. Print which cell each color lands on

use anyhow::{Context, Result};
use neuronet::{
    NetworkConfig, NeuralNetwork, Pattern, PatternSet, SelfOrganizingNetwork, SonParams,
    TrainOptions,
};
use tracing_subscriber::EnvFilter;

const COLORS: [(&str, [f64; 3]); 8] = [
    ("red", [1.0, 0.0, 0.0]),
    ("green", [0.0, 1.0, 0.0]),
    ("blue", [0.0, 0.0, 1.0]),
    ("yellow", [1.0, 1.0, 0.0]),
    ("cyan", [0.0, 1.0, 1.0]),
    ("magenta", [1.0, 0.0, 1.0]),
    ("white", [1.0, 1.0, 1.0]),
    ("black", [0.0, 0.0, 0.0]),
];

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Kohonen Map Example ===\n");

    let config = NetworkConfig::SelfOrganizing {
        params: SonParams {
            inputs: 3,
            rows: 8,
            cols: 8,
            initial_learning_rate: 0.6,
            final_learning_rate: 0.01,
            initial_neighborhood: 4,
            neighborhood_reduce_interval: 100,
            training_iterations: 500,
        },
        seed: 7,
    };
    println!("Configuration:\n{}\n", config.to_json()?);

    let mut built = config.build()?;
    let map = built
        .as_any_mut()
        .downcast_mut::<SelfOrganizingNetwork>()
        .context("config built a different network type")?;

    let mut colors = PatternSet::new();
    for (_, rgb) in COLORS {
        colors.push(Pattern::new(rgb.to_vec(), vec![]))?;
    }

    let report = map.train_with(&colors, &TrainOptions::new().with_progress_interval(100))?;
    println!("✓ Trained for {} epochs", report.sweeps);
    println!(
        "  final learning rate {:.3}, neighborhood {}\n",
        map.learning_rate(),
        map.current_neighborhood()
    );

    let mut grid = vec![vec!['.'; map.cols()]; map.rows()];
    for (name, rgb) in COLORS {
        map.set_pattern(&Pattern::new(rgb.to_vec(), vec![]))?;
        map.run();
        let (row, col) = map.winning_cell();
        grid[row][col] = name.chars().next().unwrap_or('?');
        println!("  {:<8} -> cell ({}, {})", name, row, col);
    }

    println!();
    for row in grid {
        println!("  {}", row.into_iter().collect::<String>());
    }

    Ok(())
}
