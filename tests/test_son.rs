//! Integration tests for SelfOrganizingNetwork.
//!
//! Tests the Kohonen map end to end:
//! - Learning rate and neighborhood schedules over a full training run
//! - Separation of distinct clusters onto distinct cells
//! - Resuming an interrupted training run

use approx::assert_relative_eq;
use neuronet::{
    NeuralNetwork, Pattern, PatternSet, Result, SelfOrganizingNetwork, SonParams, StopFlag,
    TrainOptions,
};

fn params() -> SonParams {
    SonParams {
        inputs: 2,
        rows: 4,
        cols: 4,
        initial_learning_rate: 0.5,
        final_learning_rate: 0.01,
        initial_neighborhood: 2,
        neighborhood_reduce_interval: 10,
        training_iterations: 50,
    }
}

fn two_clusters() -> PatternSet {
    let mut set = PatternSet::new();
    set.push(Pattern::new(vec![0.1, 0.9], vec![])).unwrap();
    set.push(Pattern::new(vec![0.9, 0.1], vec![])).unwrap();
    set
}

fn winner_for(map: &mut SelfOrganizingNetwork, input: &[f64]) -> Result<(usize, usize)> {
    map.set_pattern(&Pattern::new(input.to_vec(), vec![]))?;
    map.run();
    Ok(map.winning_cell())
}

#[test]
fn test_schedules_reach_final_values() -> Result<()> {
    let mut map = SelfOrganizingNetwork::new(params(), 7)?;
    assert_eq!(map.current_neighborhood(), 2);
    assert_relative_eq!(map.learning_rate(), 0.5);

    let report = map.train(&two_clusters())?;

    assert!(report.converged);
    assert_eq!(report.sweeps, 50);
    assert_eq!(map.current_iteration(), 50);
    assert_eq!(map.current_neighborhood(), 0);
    assert_relative_eq!(map.learning_rate(), 0.01, epsilon = 1e-12);
    Ok(())
}

#[test]
fn test_neighborhood_shrinks_every_interval() -> Result<()> {
    let mut p = params();
    p.initial_neighborhood = 5;
    p.neighborhood_reduce_interval = 3;
    let mut map = SelfOrganizingNetwork::new(p, 0)?;

    // Reductions after epochs 2, 5 and 8
    let mut seen = Vec::new();
    for _ in 0..9 {
        map.epoch(0);
        seen.push(map.current_neighborhood());
    }
    assert_eq!(seen, vec![5, 4, 4, 4, 3, 3, 3, 2, 2]);
    Ok(())
}

#[test]
fn test_learning_rate_decays_linearly() -> Result<()> {
    let mut map = SelfOrganizingNetwork::new(params(), 0)?;
    let mut previous = map.learning_rate();
    for i in 1..=50u64 {
        map.epoch(0);
        assert!(map.learning_rate() < previous);
        assert_relative_eq!(
            map.learning_rate(),
            0.5 - (i as f64 / 50.0) * 0.49,
            epsilon = 1e-12
        );
        previous = map.learning_rate();
    }
    Ok(())
}

#[test]
fn test_clusters_map_to_distinct_cells() -> Result<()> {
    for seed in 0..5 {
        let mut map = SelfOrganizingNetwork::new(params(), seed)?;
        map.train(&two_clusters())?;

        let a = winner_for(&mut map, &[0.1, 0.9])?;
        let b = winner_for(&mut map, &[0.9, 0.1])?;
        assert_ne!(a, b, "seed {}", seed);

        // Each winner has moved onto its cluster
        for (cell, target) in [(a, [0.1, 0.9]), (b, [0.9, 0.1])] {
            let weights = map.cell_weights(cell.0, cell.1)?;
            for (w, t) in weights.iter().zip(target) {
                assert!((w - t).abs() < 0.01, "seed {}: {:?} vs {:?}", seed, weights, target);
            }
        }
    }
    Ok(())
}

#[test]
fn test_training_resumes() -> Result<()> {
    let data = two_clusters();
    let mut whole = SelfOrganizingNetwork::new(params(), 3)?;
    let mut split = whole.clone();

    whole.train(&data)?;

    let first = split.train_with(&data, &TrainOptions::new().with_max_sweeps(20))?;
    assert!(!first.converged);
    assert_eq!(split.current_iteration(), 20);
    let second = split.train(&data)?;
    assert!(second.converged);
    assert_eq!(second.sweeps, 30);

    assert_eq!(whole, split);
    Ok(())
}

#[test]
fn test_trained_map_does_not_train_further() -> Result<()> {
    let data = two_clusters();
    let mut map = SelfOrganizingNetwork::new(params(), 1)?;
    map.train(&data)?;
    let trained = map.clone();

    let report = map.train(&data)?;
    assert_eq!(report.sweeps, 0);
    assert!(report.converged);
    assert_eq!(map, trained);
    Ok(())
}

#[test]
fn test_stop_flag_interrupts() -> Result<()> {
    let stop = StopFlag::new();
    stop.raise();
    let mut map = SelfOrganizingNetwork::new(params(), 1)?;
    let report = map.train_with(&two_clusters(), &TrainOptions::new().with_stop_flag(stop))?;

    assert!(report.stopped);
    assert_eq!(map.current_iteration(), 0);
    Ok(())
}

#[test]
fn test_rejects_wrong_input_size() -> Result<()> {
    let mut map = SelfOrganizingNetwork::new(params(), 0)?;
    let mut set = PatternSet::new();
    set.push(Pattern::new(vec![0.1, 0.2, 0.3], vec![]))?;
    assert!(map.train(&set).is_err());
    assert!(map.set_input(2, 0.0).is_err());
    assert_eq!(map.output_count(), 0);
    Ok(())
}
