//! NeuralNetwork - the capability interface every architecture implements.
//!
//! The trait mirrors the lifecycle of a network:
//!
//! 1. **Present**: [`set_input`](NeuralNetwork::set_input),
//!    [`set_target`](NeuralNetwork::set_target) or
//!    [`set_pattern`](NeuralNetwork::set_pattern)
//! 2. **Run**: forward pass, weights untouched
//! 3. **Learn**: single-pattern weight adjustment after a Run on the same pattern
//! 4. **Epoch**: commit deferred updates (no-op for online architectures)
//! 5. **Train**: sweep a [`PatternSet`] until the convergence rule holds
//! 6. **Save/Load**: full state round-trip through the binary format
//!
//! The trait is object-safe so heterogeneous networks can be held as
//! `Box<dyn NeuralNetwork>`, which is what [`config`](crate::config) hands out.

use crate::codec::NetworkType;
use crate::error::{NeuroError, Result};
use crate::pattern::{Pattern, PatternSet};
use crate::training::{TrainOptions, TrainReport};
use std::any::Any;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

pub trait NeuralNetwork {
    /// Type tag written at the head of the persisted form.
    fn network_type(&self) -> NetworkType;

    fn input_count(&self) -> usize;

    fn output_count(&self) -> usize;

    fn set_input(&mut self, index: usize, value: f64) -> Result<()>;

    /// Value of an output node after the last Run.
    fn output(&self, index: usize) -> Result<f64>;

    /// Store a training target. Architectures without targets ignore it
    /// after the bounds check.
    fn set_target(&mut self, index: usize, _value: f64) -> Result<()> {
        if index >= self.output_count() {
            return Err(NeuroError::index("output", index, self.output_count()));
        }
        Ok(())
    }

    /// Present a whole pattern.
    fn set_pattern(&mut self, pattern: &Pattern) -> Result<()>;

    /// Forward pass.
    fn run(&mut self);

    /// Weight adjustment for the currently presented pattern.
    fn learn(&mut self);

    /// Commit deferred updates accumulated over `pattern_count` patterns.
    fn epoch(&mut self, _pattern_count: usize) {}

    /// Train with explicit options.
    fn train_with(&mut self, patterns: &PatternSet, options: &TrainOptions)
        -> Result<TrainReport>;

    /// Train until convergence with default options.
    fn train(&mut self, patterns: &PatternSet) -> Result<TrainReport> {
        self.train_with(patterns, &TrainOptions::default())
    }

    /// Write the full network state.
    fn save(&self, writer: &mut dyn Write) -> Result<()>;

    /// Replace this network's state with a persisted one.
    ///
    /// The type tag is checked before anything else is read. On any error
    /// the network is left untouched.
    fn load(&mut self, reader: &mut dyn Read) -> Result<()>;

    fn save_to_file(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.save(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    fn load_from_file(&mut self, path: &Path) -> Result<()> {
        let mut reader = BufReader::new(File::open(path)?);
        self.load(&mut reader)
    }

    /// Set all inputs, run, and collect all outputs.
    fn compute(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        if input.len() != self.input_count() {
            return Err(NeuroError::InvalidInputSize {
                expected: self.input_count(),
                actual: input.len(),
            });
        }
        for (i, &v) in input.iter().enumerate() {
            self.set_input(i, v)?;
        }
        self.run();
        (0..self.output_count()).map(|i| self.output(i)).collect()
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Fail with `InvalidInputSize` unless every pattern in `patterns` has
/// `inputs` inputs and `outputs` outputs.
pub(crate) fn check_shape(patterns: &PatternSet, inputs: usize, outputs: usize) -> Result<()> {
    if let Some(actual) = patterns.input_len() {
        if actual != inputs {
            return Err(NeuroError::InvalidInputSize {
                expected: inputs,
                actual,
            });
        }
    }
    if let Some(actual) = patterns.output_len() {
        if actual != outputs {
            return Err(NeuroError::InvalidInputSize {
                expected: outputs,
                actual,
            });
        }
    }
    Ok(())
}

/// Fail with `InvalidInputSize` unless `pattern` has the given shape.
pub(crate) fn check_pattern(pattern: &Pattern, inputs: usize, outputs: usize) -> Result<()> {
    if pattern.input_len() != inputs {
        return Err(NeuroError::InvalidInputSize {
            expected: inputs,
            actual: pattern.input_len(),
        });
    }
    if pattern.output_len() != outputs {
        return Err(NeuroError::InvalidInputSize {
            expected: outputs,
            actual: pattern.output_len(),
        });
    }
    Ok(())
}
