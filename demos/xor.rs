//! Example: Learning XOR with Backpropagation
//!
//! Demonstrates how to:
//! 1. Build a 2-3-1 sigmoid network
//! 2. Train it on the XOR truth table with a sweep budget
//! 3. Compare the online, epoch and RPROP update policies
//!
//! Run with `RUST_LOG=neuronet=info` to see training progress.

use anyhow::Result;
use neuronet::{BackPropNetwork, NeuralNetwork, Pattern, PatternSet, TrainOptions};
use tracing_subscriber::EnvFilter;

fn xor_patterns() -> Result<PatternSet> {
    let mut set = PatternSet::new();
    for (a, b) in [(0.0, 0.0), (0.0, 1.0), (1.0, 0.0), (1.0, 1.0)] {
        let target = if a != b { 1.0 } else { 0.0 };
        set.push(Pattern::new(vec![a, b], vec![target]))?;
    }
    Ok(set)
}

fn report(name: &str, net: &mut BackPropNetwork, patterns: &PatternSet) -> Result<()> {
    for pattern in patterns {
        let out = net.compute(pattern.input())?;
        println!(
            "  [{}] {:?} -> {:.3} (target {})",
            name,
            pattern.input(),
            out[0],
            pattern.output()[0]
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== XOR Example ===\n");

    let patterns = xor_patterns()?;
    let options = TrainOptions::new()
        .with_max_sweeps(50_000)
        .with_progress_interval(5_000);

    let networks = [
        ("online", BackPropNetwork::new(&[2, 3, 1], 0.55, 0.6, 1)?),
        ("epoch", BackPropNetwork::new_epoch(&[2, 3, 1], 0.9, 0.6, 1)?),
        ("rprop", BackPropNetwork::new_rprop(&[2, 3, 1], 1)?),
    ];

    for (name, mut net) in networks {
        let result = net.train_with(&patterns, &options)?;
        if result.converged {
            println!("✓ {} converged after {} sweeps", name, result.sweeps);
        } else {
            println!(
                "✗ {} stopped after {} sweeps with {}/{} patterns good",
                name,
                result.sweeps,
                result.last_good,
                patterns.len()
            );
        }
        report(name, &mut net, &patterns)?;
        println!();
    }

    Ok(())
}
