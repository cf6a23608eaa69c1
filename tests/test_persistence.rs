//! Persistence tests for every network type.
//!
//! Tests the binary format end to end:
//! - Save then load reproduces weights and training state
//! - Tag-dispatched loading through `load_network`
//! - Loading a mismatched or broken stream leaves the target untouched
//! - Pattern set files

use neuronet::{
    load_network, AdalineNetwork, BackPropFlavor, BackPropNetwork, BamNetwork, BamSystem,
    NetworkType, NeuralNetwork, NeuroError, Pattern, PatternSet, Result, SelfOrganizingNetwork,
    SonParams, TrainOptions,
};
use proptest::prelude::*;
use std::path::PathBuf;

fn bytes_of(net: &dyn NeuralNetwork) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    net.save(&mut bytes)?;
    Ok(bytes)
}

/// Save, reload through tag dispatch and downcast back to `T`.
fn reload<T: Clone + 'static>(net: &dyn NeuralNetwork) -> Result<T> {
    let bytes = bytes_of(net)?;
    let loaded = load_network(&mut &bytes[..])?;
    assert_eq!(loaded.network_type(), net.network_type());
    Ok(loaded
        .as_any()
        .downcast_ref::<T>()
        .expect("loaded network has the saved type")
        .clone())
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("neuronet-{}-{}", std::process::id(), name))
}

fn follow_first_patterns() -> PatternSet {
    let mut set = PatternSet::new();
    for (a, b) in [(-1.0, -1.0), (-1.0, 1.0), (1.0, -1.0), (1.0, 1.0)] {
        let t = if a > 0.0 { 1.0 } else { 0.0 };
        set.push(Pattern::new(vec![a, b], vec![t])).unwrap();
    }
    set
}

fn son_params() -> SonParams {
    SonParams {
        inputs: 3,
        rows: 3,
        cols: 2,
        initial_learning_rate: 0.4,
        final_learning_rate: 0.05,
        initial_neighborhood: 2,
        neighborhood_reduce_interval: 5,
        training_iterations: 40,
    }
}

#[test]
fn test_stream_starts_with_tag_and_counts() -> Result<()> {
    let net = AdalineNetwork::new(2, 0.1, 0)?;
    let bytes = bytes_of(&net)?;

    // tag 0, 4 nodes (2 inputs, bias, adaline), 3 links
    assert_eq!(&bytes[0..4], &0i32.to_le_bytes());
    assert_eq!(&bytes[4..8], &4i32.to_le_bytes());
    assert_eq!(&bytes[8..12], &3i32.to_le_bytes());
    Ok(())
}

#[test]
fn test_tags() {
    let expected = [
        (NetworkType::Adaline, 0),
        (NetworkType::BackProp, 1),
        (NetworkType::SelfOrganizing, 2),
        (NetworkType::Bam, 3),
        (NetworkType::BamSystem, 4),
        (NetworkType::EpochBackProp, 5),
        (NetworkType::RpropBackProp, 6),
    ];
    for (network_type, tag) in expected {
        assert_eq!(network_type.tag(), tag);
        assert_eq!(NetworkType::from_tag(tag).unwrap(), network_type);
    }
    assert!(NetworkType::from_tag(7).is_err());
}

#[test]
fn test_adaline_roundtrip() -> Result<()> {
    let mut net = AdalineNetwork::new(3, 0.25, 4)?;
    net.compute(&[1.0, -1.0, 1.0])?;

    let loaded: AdalineNetwork = reload(&net)?;
    assert_eq!(loaded, net);
    assert_eq!(loaded.learning_rate(), 0.25);
    Ok(())
}

#[test]
fn test_backprop_roundtrip_all_flavors() -> Result<()> {
    let patterns = follow_first_patterns();
    let options = TrainOptions::new().with_max_sweeps(25);

    for flavor in [BackPropFlavor::Online, BackPropFlavor::Epoch, BackPropFlavor::Rprop] {
        let mut net = BackPropNetwork::with_flavor(&[2, 3, 1], 0.45, 0.3, flavor, 12)?;
        net.train_with(&patterns, &options)?;

        let mut loaded: BackPropNetwork = reload(&net)?;
        assert_eq!(loaded.graph(), net.graph(), "{:?}", flavor);
        assert_eq!(loaded.network_type(), flavor.network_type());

        // Training continues identically from the restored state
        net.train_with(&patterns, &options)?;
        loaded.train_with(&patterns, &options)?;
        assert_eq!(loaded.graph(), net.graph(), "{:?}", flavor);
    }
    Ok(())
}

#[test]
fn test_rprop_state_survives_reload() -> Result<()> {
    let mut net = BackPropNetwork::new_rprop(&[2, 2, 1], 5)?;
    net.train_with(&follow_first_patterns(), &TrainOptions::new().with_max_sweeps(4))?;

    let loaded: BackPropNetwork = reload(&net)?;
    for (a, b) in net.graph().links().iter().zip(loaded.graph().links()) {
        assert_eq!(a.eta(), b.eta());
        assert_eq!(a.previous_delta(), b.previous_delta());
        assert_eq!(a.kind(), b.kind());
    }
    Ok(())
}

#[test]
fn test_son_roundtrip_keeps_schedule() -> Result<()> {
    let mut data = PatternSet::new();
    data.push(Pattern::new(vec![0.2, 0.4, 0.6], vec![]))?;
    data.push(Pattern::new(vec![0.9, 0.1, 0.3], vec![]))?;

    let mut map = SelfOrganizingNetwork::new(son_params(), 8)?;
    map.train_with(&data, &TrainOptions::new().with_max_sweeps(13))?;

    let mut loaded: SelfOrganizingNetwork = reload(&map)?;
    assert_eq!(loaded.graph(), map.graph());
    assert_eq!(loaded.params(), map.params());
    assert_eq!(loaded.current_iteration(), 13);
    assert_eq!(loaded.current_neighborhood(), map.current_neighborhood());
    assert_eq!(loaded.learning_rate(), map.learning_rate());

    // Both finish the remaining schedule the same way
    map.train(&data)?;
    loaded.train(&data)?;
    assert_eq!(loaded.graph(), map.graph());
    assert_eq!(loaded.current_iteration(), 40);
    Ok(())
}

#[test]
fn test_bam_roundtrip() -> Result<()> {
    let mut bam = BamNetwork::new(4, 3)?;
    bam.set_pattern(&Pattern::new(vec![1.0, -1.0, -1.0, 1.0], vec![-1.0, 1.0, 1.0]))?;
    bam.learn();

    let loaded: BamNetwork = reload(&bam)?;
    assert_eq!(loaded.graph(), bam.graph());
    assert_eq!(loaded.input_count(), 4);
    assert_eq!(loaded.output_count(), 3);
    Ok(())
}

#[test]
fn test_bam_system_roundtrip() -> Result<()> {
    let h = [
        [1.0, 1.0, 1.0, 1.0],
        [1.0, -1.0, 1.0, -1.0],
        [1.0, 1.0, -1.0, -1.0],
        [1.0, -1.0, -1.0, 1.0],
    ];
    let mut patterns = PatternSet::new();
    for k in 0..4 {
        patterns.push(Pattern::new(h[k].to_vec(), h[(k + 1) % 4].to_vec()))?;
    }
    patterns.push(Pattern::new(vec![1.0, 1.0, 1.0, -1.0], h[0].to_vec()))?;

    let mut system = BamSystem::new(4, 4)?;
    system.train(&patterns)?;
    assert_eq!(system.network_count(), 2);

    let mut loaded: BamSystem = reload(&system)?;
    assert_eq!(loaded.networks(), system.networks());

    // The loaded system recalls what the original learned
    for pattern in &patterns {
        loaded.set_pattern(pattern)?;
        loaded.run();
        assert_eq!(loaded.best_error(), 0.0);
        for (j, &y) in pattern.output().iter().enumerate() {
            assert_eq!(loaded.output(j)?, y);
        }
    }
    Ok(())
}

#[test]
fn test_empty_bam_system_roundtrip() -> Result<()> {
    let system = BamSystem::new(5, 2)?;
    let loaded: BamSystem = reload(&system)?;
    assert_eq!(loaded.network_count(), 0);
    assert_eq!(loaded.input_count(), 5);
    assert_eq!(loaded.output_count(), 2);
    Ok(())
}

#[test]
fn test_mismatched_tag_leaves_target_untouched() -> Result<()> {
    let source = BamNetwork::new(2, 2)?;
    let bytes = bytes_of(&source)?;

    let mut target = AdalineNetwork::new(2, 0.1, 1)?;
    let before = target.clone();
    let err = target.load(&mut &bytes[..]).unwrap_err();

    assert!(matches!(
        err,
        NeuroError::FormatMismatch {
            expected: NetworkType::Adaline,
            found: NetworkType::Bam,
        }
    ));
    assert_eq!(target, before);
    Ok(())
}

#[test]
fn test_backprop_flavors_do_not_cross_load() -> Result<()> {
    let rprop = BackPropNetwork::new_rprop(&[2, 1], 0)?;
    let bytes = bytes_of(&rprop)?;

    let mut online = BackPropNetwork::new(&[2, 1], 0.5, 0.5, 0)?;
    let before = online.clone();
    assert!(matches!(
        online.load(&mut &bytes[..]),
        Err(NeuroError::FormatMismatch { .. })
    ));
    assert_eq!(online, before);
    Ok(())
}

#[test]
fn test_truncated_stream_leaves_target_untouched() -> Result<()> {
    let source = BackPropNetwork::new(&[3, 2, 2], 0.5, 0.1, 2)?;
    let bytes = bytes_of(&source)?;

    let mut target = BackPropNetwork::new(&[3, 2, 2], 0.5, 0.1, 9)?;
    let before = target.clone();
    assert!(target.load(&mut &bytes[..bytes.len() - 3]).is_err());
    assert_eq!(target, before);

    assert!(load_network(&mut &bytes[..10]).is_err());
    Ok(())
}

#[test]
fn test_inconsistent_counts_rejected() -> Result<()> {
    let source = AdalineNetwork::new(2, 0.1, 0)?;
    let mut bytes = bytes_of(&source)?;
    // Claim an extra link
    bytes[8..12].copy_from_slice(&4i32.to_le_bytes());

    assert!(matches!(
        load_network(&mut &bytes[..]),
        Err(NeuroError::InvalidFormat(_))
    ));
    Ok(())
}

/// Little-endian stream of `int32` words.
fn words(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn son_prefix(nodes: i32, links: i32, rows: i32, cols: i32) -> Vec<u8> {
    let mut bytes = words(&[NetworkType::SelfOrganizing.tag(), nodes, links]);
    bytes.extend(0.5f64.to_le_bytes());
    bytes.extend(0.1f64.to_le_bytes());
    bytes.extend(words(&[1, 1]));
    bytes.extend(10i64.to_le_bytes());
    bytes.extend(words(&[rows, cols]));
    bytes
}

#[test]
fn test_oversized_prefix_rejected_before_allocation() -> Result<()> {
    let max = i32::MAX;
    let mut target = BackPropNetwork::new(&[2, 2, 1], 0.5, 0.1, 3)?;
    let before = target.clone();

    // Layer sizes disagree with the stored counts
    let bytes = words(&[NetworkType::BackProp.tag(), 6, 9, 2, max, max]);
    assert!(matches!(
        target.load(&mut &bytes[..]),
        Err(NeuroError::InvalidFormat(_))
    ));
    assert_eq!(target, before);

    // Counts agree with a 1 x (max - 1) topology, but no payload follows
    let bytes = words(&[NetworkType::BackProp.tag(), max, max - 1, 2, 1, max - 1]);
    assert!(matches!(
        target.load(&mut &bytes[..]),
        Err(NeuroError::InvalidFormat(_))
    ));
    assert_eq!(target, before);

    let bytes = son_prefix(max, max, 46340, 23170);
    assert!(matches!(
        load_network(&mut &bytes[..]),
        Err(NeuroError::InvalidFormat(_))
    ));
    let bytes = son_prefix(max, max - 1, 1, 1);
    assert!(matches!(
        load_network(&mut &bytes[..]),
        Err(NeuroError::InvalidFormat(_))
    ));

    let bytes = words(&[NetworkType::Bam.tag(), 2 * 46340, max, 46340, 46340]);
    assert!(matches!(
        load_network(&mut &bytes[..]),
        Err(NeuroError::InvalidFormat(_))
    ));

    let bytes = words(&[NetworkType::Adaline.tag(), max, max - 1]);
    assert!(matches!(
        load_network(&mut &bytes[..]),
        Err(NeuroError::InvalidFormat(_))
    ));
    Ok(())
}

#[test]
fn test_empty_bam_system_with_large_shape_loads_lazily() -> Result<()> {
    let max = i32::MAX;
    let bytes = words(&[NetworkType::BamSystem.tag(), 0, 0, max, max, 0]);
    let loaded = load_network(&mut &bytes[..])?;
    assert_eq!(loaded.input_count(), max as usize);
    assert_eq!(loaded.output_count(), max as usize);

    let system = loaded
        .as_any()
        .downcast_ref::<BamSystem>()
        .expect("tag 4 loads a BAM system");
    assert_eq!(system.network_count(), 0);
    assert!(system.data().input().is_empty());
    Ok(())
}

#[test]
fn test_unknown_tag_rejected() {
    let bytes = 42i32.to_le_bytes();
    assert!(matches!(
        load_network(&mut &bytes[..]),
        Err(NeuroError::InvalidFormat(_))
    ));
}

#[test]
fn test_network_file_roundtrip() -> Result<()> {
    let path = temp_path("adaline.net");
    let net = AdalineNetwork::new(6, 0.05, 21)?;
    net.save_to_file(&path)?;

    let mut loaded = AdalineNetwork::new(1, 0.5, 0)?;
    loaded.load_from_file(&path)?;
    assert_eq!(loaded, net);

    let any = neuronet::load_network_from_file(&path)?;
    assert_eq!(any.network_type(), NetworkType::Adaline);
    assert_eq!(any.input_count(), 6);

    std::fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn test_pattern_set_file_roundtrip() -> Result<()> {
    let path = temp_path("patterns.bin");
    let patterns = follow_first_patterns();
    patterns.save_to_file(&path)?;

    let loaded = PatternSet::load_from_file(&path)?;
    assert_eq!(loaded, patterns);
    assert_eq!(loaded.input_len(), Some(2));
    assert_eq!(loaded.output_len(), Some(1));

    std::fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn test_missing_file_is_io_error() {
    let path = temp_path("does-not-exist.net");
    assert!(matches!(
        neuronet::load_network_from_file(&path),
        Err(NeuroError::Io(_))
    ));
}

fn flavor_strategy() -> impl Strategy<Value = BackPropFlavor> {
    prop_oneof![
        Just(BackPropFlavor::Online),
        Just(BackPropFlavor::Epoch),
        Just(BackPropFlavor::Rprop),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_backprop_reload_computes_same_outputs(
        layers in prop::collection::vec(1usize..5, 2..5),
        flavor in flavor_strategy(),
        seed in any::<u64>(),
        input in prop::collection::vec(-1.0f64..1.0, 4),
    ) {
        let mut net = BackPropNetwork::with_flavor(&layers, 0.3, 0.2, flavor, seed).unwrap();
        let mut bytes = Vec::new();
        net.save(&mut bytes).unwrap();
        let mut loaded = BackPropNetwork::from_reader(&mut &bytes[..], flavor).unwrap();

        prop_assert_eq!(loaded.graph(), net.graph());
        let input = &input[..layers[0]];
        prop_assert_eq!(loaded.compute(input).unwrap(), net.compute(input).unwrap());
    }
}
