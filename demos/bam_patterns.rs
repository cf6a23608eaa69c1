//! Example: Associative Recall with a BAM System
//!
//! Demonstrates how to:
//! 1. Store letter-like bitmaps and their codes in a BAM system
//! 2. Watch the system allocate extra memories when one fills up
//! 3. Recall a code from a noisy bitmap

use anyhow::Result;
use neuronet::{BamSystem, NeuralNetwork, Pattern, PatternSet};
use tracing_subscriber::EnvFilter;

const WIDTH: usize = 5;

/// 5x5 glyphs, `#` is +1 and `.` is -1.
const GLYPHS: [(&str, [f64; 3]); 5] = [
    ("#...##...##...##...######", [-1.0, -1.0, 1.0]), // L
    ("#####..#....#....#....#..", [-1.0, 1.0, -1.0]), // T
    ("#...##...#######...##...#", [-1.0, 1.0, 1.0]),  // H
    ("#####....#####.....######", [1.0, -1.0, -1.0]), // E
    ("#...#.#.#...#...#.#.#...#", [1.0, -1.0, 1.0]),  // X
];

fn bitmap(glyph: &str) -> Vec<f64> {
    glyph
        .chars()
        .map(|c| if c == '#' { 1.0 } else { -1.0 })
        .collect()
}

fn render(values: &[f64]) -> String {
    values
        .chunks(WIDTH)
        .map(|row| {
            row.iter()
                .map(|&v| if v > 0.0 { '#' } else { '.' })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== BAM System Example ===\n");

    let mut patterns = PatternSet::new();
    for (glyph, code) in GLYPHS {
        patterns.push(Pattern::new(bitmap(glyph), code.to_vec()))?;
    }

    let mut system = BamSystem::new(WIDTH * WIDTH, 3)?;
    system.train(&patterns)?;
    println!(
        "✓ Stored {} associations in {} memories",
        patterns.len(),
        system.network_count()
    );

    for (glyph, code) in GLYPHS {
        // Flip two pixels and leave the code unknown
        let mut noisy = bitmap(glyph);
        noisy[0] = -noisy[0];
        noisy[12] = -noisy[12];

        system.set_pattern(&Pattern::new(noisy.clone(), vec![1.0; 3]))?;
        system.run();
        let recalled: Vec<f64> = (0..3).map(|j| system.output(j)).collect::<Result<_, _>>()?;

        println!("\n{}", render(&noisy));
        println!(
            "  recalled {:?} (stored {:?}, error {})",
            recalled,
            code,
            system.best_error()
        );
    }

    Ok(())
}
