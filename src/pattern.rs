//! Training and inference data: `Pattern` and `PatternSet`.
//!
//! A `Pattern` is one labeled example, a fixed-length input vector plus a
//! fixed-length expected output vector. Lengths are fixed at construction;
//! values stay mutable. A `PatternSet` is an ordered collection of patterns
//! that all share one shape.
//!
//! # Examples
//!
//! ```
//! use neuronet::{Pattern, PatternSet};
//!
//! let mut xor = PatternSet::new();
//! xor.push(Pattern::new(vec![0.0, 0.0], vec![0.0])).unwrap();
//! xor.push(Pattern::new(vec![0.0, 1.0], vec![1.0])).unwrap();
//! xor.push(Pattern::new(vec![1.0, 0.0], vec![1.0])).unwrap();
//! xor.push(Pattern::new(vec![1.0, 1.0], vec![0.0])).unwrap();
//!
//! assert_eq!(xor.len(), 4);
//! assert_eq!(xor.input_len(), Some(2));
//! ```

use crate::codec::{Decoder, Encoder};
use crate::error::{NeuroError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::ops::Index;
use std::path::Path;

/// One labeled example: input vector and expected output vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    input: Vec<f64>,
    output: Vec<f64>,
}

impl Pattern {
    /// Create a pattern from its input and output vectors.
    pub fn new(input: Vec<f64>, output: Vec<f64>) -> Self {
        Self { input, output }
    }

    /// Create a zero-filled pattern of the given shape.
    pub fn zeros(inputs: usize, outputs: usize) -> Self {
        Self {
            input: vec![0.0; inputs],
            output: vec![0.0; outputs],
        }
    }

    #[inline]
    pub fn input(&self) -> &[f64] {
        &self.input
    }

    #[inline]
    pub fn output(&self) -> &[f64] {
        &self.output
    }

    /// Mutable access to the input values (length is fixed).
    #[inline]
    pub fn input_mut(&mut self) -> &mut [f64] {
        &mut self.input
    }

    /// Mutable access to the output values (length is fixed).
    #[inline]
    pub fn output_mut(&mut self) -> &mut [f64] {
        &mut self.output
    }

    #[inline]
    pub fn input_len(&self) -> usize {
        self.input.len()
    }

    #[inline]
    pub fn output_len(&self) -> usize {
        self.output.len()
    }

    pub(crate) fn encode(&self, enc: &mut Encoder<'_>) -> Result<()> {
        enc.write_count(self.input.len())?;
        enc.write_count(self.output.len())?;
        for &v in &self.input {
            enc.write_f64(v)?;
        }
        for &v in &self.output {
            enc.write_f64(v)?;
        }
        Ok(())
    }

    pub(crate) fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        let inputs = dec.read_count("pattern input count")?;
        let outputs = dec.read_count("pattern output count")?;
        let mut pattern = Pattern::zeros(inputs, outputs);
        for v in pattern.input.iter_mut() {
            *v = dec.read_f64()?;
        }
        for v in pattern.output.iter_mut() {
            *v = dec.read_f64()?;
        }
        Ok(pattern)
    }
}

/// Ordered collection of equally shaped patterns.
///
/// Every pattern pushed into a set must have the same input and output
/// lengths as the first one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `count` zero-filled patterns of the given shape.
    pub fn with_shape(count: usize, inputs: usize, outputs: usize) -> Self {
        Self {
            patterns: (0..count).map(|_| Pattern::zeros(inputs, outputs)).collect(),
        }
    }

    /// Append a pattern.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInputSize` if the pattern's shape differs from the
    /// patterns already in the set.
    pub fn push(&mut self, pattern: Pattern) -> Result<()> {
        if let Some(first) = self.patterns.first() {
            if first.input_len() != pattern.input_len() {
                return Err(NeuroError::InvalidInputSize {
                    expected: first.input_len(),
                    actual: pattern.input_len(),
                });
            }
            if first.output_len() != pattern.output_len() {
                return Err(NeuroError::InvalidInputSize {
                    expected: first.output_len(),
                    actual: pattern.output_len(),
                });
            }
        }
        self.patterns.push(pattern);
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Input length shared by all patterns, `None` for an empty set.
    pub fn input_len(&self) -> Option<usize> {
        self.patterns.first().map(Pattern::input_len)
    }

    /// Output length shared by all patterns, `None` for an empty set.
    pub fn output_len(&self) -> Option<usize> {
        self.patterns.first().map(Pattern::output_len)
    }

    pub fn get(&self, index: usize) -> Option<&Pattern> {
        self.patterns.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Pattern> {
        self.patterns.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Pattern> {
        self.patterns.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Pattern> {
        self.patterns.iter_mut()
    }

    /// Write the set in the binary pattern format.
    pub fn save(&self, writer: &mut dyn Write) -> Result<()> {
        let mut enc = Encoder::new(writer);
        enc.write_count(self.patterns.len())?;
        for pattern in &self.patterns {
            pattern.encode(&mut enc)?;
        }
        Ok(())
    }

    /// Read a set written by [`PatternSet::save`].
    pub fn load(reader: &mut dyn Read) -> Result<Self> {
        let mut dec = Decoder::new(reader);
        let count = dec.read_count("pattern count")?;
        let mut set = PatternSet::new();
        for _ in 0..count {
            set.push(Pattern::decode(&mut dec)?)?;
        }
        Ok(set)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.save(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        Self::load(&mut reader)
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON string.
    ///
    /// Shapes are re-validated as if every pattern had been pushed.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: PatternSet = serde_json::from_str(json)?;
        let mut set = PatternSet::new();
        for pattern in raw.patterns {
            set.push(pattern)?;
        }
        Ok(set)
    }
}

impl Index<usize> for PatternSet {
    type Output = Pattern;

    fn index(&self, index: usize) -> &Pattern {
        &self.patterns[index]
    }
}

impl<'a> IntoIterator for &'a PatternSet {
    type Item = &'a Pattern;
    type IntoIter = std::slice::Iter<'a, Pattern>;

    fn into_iter(self) -> Self::IntoIter {
        self.patterns.iter()
    }
}

impl FromIterator<Pattern> for PatternSet {
    /// Collects without shape validation; prefer [`PatternSet::push`] for
    /// untrusted data.
    fn from_iter<I: IntoIterator<Item = Pattern>>(iter: I) -> Self {
        Self {
            patterns: iter.into_iter().collect(),
        }
    }
}
