//! Example: Save and Load Trained Networks
//!
//! Demonstrates how to:
//! 1. Train a network and save its weights to a file
//! 2. Restore it with `load_network`, which reads the type tag
//! 3. Resume training from the restored state
//! 4. Stop a long training run from another thread

use anyhow::{Context, Result};
use neuronet::{
    load_network_from_file, BackPropNetwork, NeuralNetwork, Pattern, PatternSet, StopFlag,
    TrainOptions,
};
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn parity_patterns() -> Result<PatternSet> {
    let mut set = PatternSet::new();
    for bits in 0..8u32 {
        let input: Vec<f64> = (0..3).map(|i| ((bits >> i) & 1) as f64).collect();
        let target = (bits.count_ones() % 2) as f64;
        set.push(Pattern::new(input, vec![target]))?;
    }
    Ok(set)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Network Save/Load Example ===\n");

    let patterns = parity_patterns()?;
    let path = std::env::temp_dir().join("neuronet_parity.net");

    // Part 1: short training run, then save
    let mut net = BackPropNetwork::new_rprop(&[3, 6, 1], 42)?;
    let first = net.train_with(&patterns, &TrainOptions::new().with_max_sweeps(200))?;
    net.save_to_file(&path)?;
    println!(
        "✓ Trained {} sweeps ({} / {} good), saved to {}",
        first.sweeps,
        first.last_good,
        patterns.len(),
        path.display()
    );

    // Part 2: restore without knowing the type up front
    let mut restored = load_network_from_file(&path)?;
    println!(
        "✓ Loaded {:?} network with {} inputs",
        restored.network_type(),
        restored.input_count()
    );

    // Part 3: resume with a stop flag raised from a watchdog thread
    let stop = StopFlag::new();
    let watchdog = {
        let stop = stop.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_secs(5));
            stop.raise();
        })
    };

    let options = TrainOptions::new()
        .with_stop_flag(stop.clone())
        .with_progress_interval(1_000);
    let resumed = restored.train_with(&patterns, &options)?;
    stop.raise();
    watchdog
        .join()
        .map_err(|_| anyhow::anyhow!("watchdog thread panicked"))?;

    if resumed.stopped {
        println!("✗ Stopped by watchdog after {} more sweeps", resumed.sweeps);
    } else {
        println!("✓ Converged after {} more sweeps", resumed.sweeps);
    }

    let net = restored
        .as_any_mut()
        .downcast_mut::<BackPropNetwork>()
        .context("restored network is not a backprop network")?;
    for pattern in &patterns {
        let out = net.compute(pattern.input())?;
        println!("  {:?} -> {:.3} (target {})", pattern.input(), out[0], pattern.output()[0]);
    }

    std::fs::remove_file(&path)?;
    Ok(())
}
