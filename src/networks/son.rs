//! SelfOrganizingNetwork - a Kohonen map.
//!
//! A `rows x cols` grid of distance nodes, each connected to every input.
//! A cell's value is the euclidean distance between the input vector and the
//! cell's weight vector, so the winner of a Run is the cell with the smallest
//! value. Learn pulls the winner and every cell inside a square window around
//! it toward the input. Both the window half-width and the learning rate
//! decay as training advances:
//!
//! - learning rate interpolates linearly from the initial to the final rate
//!   over `training_iterations` epochs
//! - the neighborhood shrinks by one every `neighborhood_reduce_interval`
//!   epochs, never below zero
//!
//! Training is not error driven; it runs until `training_iterations` epochs
//! have elapsed.
//!
//! # Examples
//!
//! ```
//! use neuronet::networks::{SelfOrganizingNetwork, SonParams};
//! use neuronet::{NeuralNetwork, Pattern, PatternSet};
//!
//! let params = SonParams {
//!     inputs: 2,
//!     rows: 4,
//!     cols: 4,
//!     initial_learning_rate: 0.5,
//!     final_learning_rate: 0.01,
//!     initial_neighborhood: 2,
//!     neighborhood_reduce_interval: 10,
//!     training_iterations: 50,
//! };
//! let mut map = SelfOrganizingNetwork::new(params, 3).unwrap();
//!
//! let mut data = PatternSet::new();
//! data.push(Pattern::new(vec![0.1, 0.9], vec![])).unwrap();
//! data.push(Pattern::new(vec![0.9, 0.1], vec![])).unwrap();
//!
//! let report = map.train(&data).unwrap();
//! assert_eq!(report.sweeps, 50);
//! assert_eq!(map.current_iteration(), 50);
//! ```

use crate::codec::{Decoder, Encoder, NetworkType};
use crate::error::{NeuroError, Result};
use crate::graph::{Graph, Layout};
use crate::link::LinkKind;
use crate::network::NeuralNetwork;
use crate::node::{Node, NodeKind};
use crate::pattern::{Pattern, PatternSet};
use crate::training::{SweepTracker, TrainOptions, TrainReport};
use crate::utils::{random_weight, window};
use itertools::iproduct;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::io::{Read, Write};
use tracing::debug;

/// Construction parameters of a Kohonen map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SonParams {
    /// Input vector length
    pub inputs: usize,
    /// Grid rows
    pub rows: usize,
    /// Grid columns
    pub cols: usize,
    pub initial_learning_rate: f64,
    pub final_learning_rate: f64,
    /// Initial half-width of the learning window
    pub initial_neighborhood: usize,
    /// Epochs between neighborhood reductions
    pub neighborhood_reduce_interval: usize,
    /// Total epochs of a full training run
    pub training_iterations: u64,
}

impl SonParams {
    fn validate(&self) -> Result<()> {
        if self.inputs == 0 {
            return Err(NeuroError::InvalidParameter(
                "self-organizing network needs at least one input".into(),
            ));
        }
        if self.rows == 0 || self.cols == 0 {
            return Err(NeuroError::InvalidParameter(format!(
                "grid must be non-empty, got {}x{}",
                self.rows, self.cols
            )));
        }
        if self.neighborhood_reduce_interval == 0 {
            return Err(NeuroError::InvalidParameter(
                "neighborhood reduce interval must be positive".into(),
            ));
        }
        if self.training_iterations == 0 {
            return Err(NeuroError::InvalidParameter(
                "training iterations must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelfOrganizingNetwork {
    graph: Graph,
    params: SonParams,
    current_iteration: u64,
    current_neighborhood: usize,
    learning_rate: f64,
    winning_row: usize,
    winning_col: usize,
}

impl SelfOrganizingNetwork {
    /// Create a map with random weights in `[-1, 1)` seeded by `seed`.
    pub fn new(params: SonParams, seed: u64) -> Result<Self> {
        params.validate()?;
        let mut rng = StdRng::seed_from_u64(seed);
        let net = Self::build(params, || random_weight(&mut rng, -1.0, 1.0));
        debug!(
            inputs = params.inputs,
            rows = params.rows,
            cols = params.cols,
            training_iterations = params.training_iterations,
            "self-organizing network created"
        );
        Ok(net)
    }

    fn build<F: FnMut() -> f64>(params: SonParams, mut weight: F) -> Self {
        let cells = params.rows * params.cols;
        let mut graph = Graph::with_capacity(params.inputs + cells, params.inputs * cells);
        for _ in 0..params.inputs {
            graph.add_node(Node::new(NodeKind::Input));
        }
        for _ in 0..cells {
            let cell = graph.add_node(Node::new(NodeKind::SelfOrganizing {
                learning_rate: params.initial_learning_rate,
            }));
            for i in 0..params.inputs {
                graph.link_to(i, cell, weight(), LinkKind::Plain);
            }
        }
        Self {
            graph,
            params,
            current_iteration: 0,
            current_neighborhood: params.initial_neighborhood,
            learning_rate: params.initial_learning_rate,
            winning_row: 0,
            winning_col: 0,
        }
    }

    #[inline]
    fn cell_index(&self, row: usize, col: usize) -> usize {
        self.params.inputs + row * self.params.cols + col
    }

    pub fn params(&self) -> &SonParams {
        &self.params
    }

    pub fn rows(&self) -> usize {
        self.params.rows
    }

    pub fn cols(&self) -> usize {
        self.params.cols
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// `(row, col)` of the cell closest to the input of the last Run.
    pub fn winning_cell(&self) -> (usize, usize) {
        (self.winning_row, self.winning_col)
    }

    pub fn current_neighborhood(&self) -> usize {
        self.current_neighborhood
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Epochs elapsed since creation.
    pub fn current_iteration(&self) -> u64 {
        self.current_iteration
    }

    pub fn input_node(&self, index: usize) -> Result<&Node> {
        if index >= self.params.inputs {
            return Err(NeuroError::index("input", index, self.params.inputs));
        }
        Ok(self.graph.node(index))
    }

    pub fn cell(&self, row: usize, col: usize) -> Result<&Node> {
        if row >= self.params.rows {
            return Err(NeuroError::index("row", row, self.params.rows));
        }
        if col >= self.params.cols {
            return Err(NeuroError::index("column", col, self.params.cols));
        }
        Ok(self.graph.node(self.cell_index(row, col)))
    }

    /// Weight vector of a cell, one entry per input.
    pub fn cell_weights(&self, row: usize, col: usize) -> Result<Vec<f64>> {
        Ok(self
            .cell(row, col)?
            .in_links()
            .iter()
            .map(|&l| self.graph.link(l).weight())
            .collect())
    }

    pub fn from_reader(reader: &mut dyn Read) -> Result<Self> {
        let mut dec = Decoder::new(reader);
        dec.expect_network_type(NetworkType::SelfOrganizing)?;
        Self::decode_body(&mut dec)
    }

    pub(crate) fn decode_body(dec: &mut Decoder<'_>) -> Result<Self> {
        let nodes = dec.read_count("node count")?;
        let links = dec.read_count("link count")?;
        let initial_learning_rate = dec.read_f64()?;
        let final_learning_rate = dec.read_f64()?;
        let initial_neighborhood = dec.read_count("initial neighborhood")?;
        let neighborhood_reduce_interval = dec.read_count("neighborhood reduce interval")?;
        let training_iterations = read_u64(dec, "training iterations")?;
        let rows = dec.read_count("row count")?;
        let cols = dec.read_count("column count")?;

        let cells = rows
            .checked_mul(cols)
            .ok_or_else(|| NeuroError::InvalidFormat(format!("{}x{} grid overflows", rows, cols)))?;
        if cells > nodes {
            return Err(NeuroError::InvalidFormat(format!(
                "{}x{} grid does not fit in {} nodes",
                rows, cols, nodes
            )));
        }
        let params = SonParams {
            inputs: nodes - cells,
            rows,
            cols,
            initial_learning_rate,
            final_learning_rate,
            initial_neighborhood,
            neighborhood_reduce_interval,
            training_iterations,
        };
        params
            .validate()
            .map_err(|e| NeuroError::InvalidFormat(e.to_string()))?;

        let cell = NodeKind::SelfOrganizing { learning_rate: 0.0 };
        let layout = Layout::default()
            .with_nodes(params.inputs, &NodeKind::Input)
            .and_then(|l| l.with_nodes(cells, &cell))
            .and_then(|l| l.with_links(params.inputs.checked_mul(cells)?, &LinkKind::Plain));
        let payloads = Layout::read_payloads(layout, nodes, links, dec)?;

        let mut net = Self::build(params, || 0.0);
        net.graph.decode_payloads(&payloads)?;
        net.current_iteration = read_u64(dec, "current iteration")?;
        net.current_neighborhood = dec.read_count("current neighborhood")?;
        net.learning_rate = dec.read_f64()?;
        Ok(net)
    }
}

fn read_u64(dec: &mut Decoder<'_>, what: &str) -> Result<u64> {
    let value = dec.read_i64()?;
    u64::try_from(value).map_err(|_| NeuroError::InvalidFormat(format!("negative {} ({})", what, value)))
}

fn write_u64(enc: &mut Encoder<'_>, value: u64) -> Result<()> {
    let value = i64::try_from(value).map_err(|_| {
        NeuroError::InvalidParameter(format!("{} does not fit in int64", value))
    })?;
    enc.write_i64(value)
}

impl NeuralNetwork for SelfOrganizingNetwork {
    fn network_type(&self) -> NetworkType {
        NetworkType::SelfOrganizing
    }

    fn input_count(&self) -> usize {
        self.params.inputs
    }

    /// A map has no output layer; read [`winning_cell`](Self::winning_cell).
    fn output_count(&self) -> usize {
        0
    }

    fn set_input(&mut self, index: usize, value: f64) -> Result<()> {
        if index >= self.params.inputs {
            return Err(NeuroError::index("input", index, self.params.inputs));
        }
        self.graph.node_mut(index).set_value(value);
        Ok(())
    }

    fn output(&self, index: usize) -> Result<f64> {
        Err(NeuroError::index("output", index, 0))
    }

    /// Only the input half of the pattern is used.
    fn set_pattern(&mut self, pattern: &Pattern) -> Result<()> {
        if pattern.input_len() != self.params.inputs {
            return Err(NeuroError::InvalidInputSize {
                expected: self.params.inputs,
                actual: pattern.input_len(),
            });
        }
        for (i, &v) in pattern.input().iter().enumerate() {
            self.graph.node_mut(i).set_value(v);
        }
        Ok(())
    }

    fn run(&mut self) {
        let mut min_value = f64::INFINITY;
        for (row, col) in iproduct!(0..self.params.rows, 0..self.params.cols) {
            let index = self.cell_index(row, col);
            self.graph.run_node(index);
            let value = self.graph.node(index).value();
            if value < min_value {
                min_value = value;
                self.winning_row = row;
                self.winning_col = col;
            }
        }
    }

    fn learn(&mut self) {
        let rows = window(self.winning_row, self.current_neighborhood, self.params.rows);
        let cols = window(self.winning_col, self.current_neighborhood, self.params.cols);
        for (row, col) in iproduct!(rows, cols) {
            let index = self.cell_index(row, col);
            self.graph.node_mut(index).set_learning_rate(self.learning_rate);
            self.graph.learn_node(index);
        }
    }

    /// Advance the decay schedules by one iteration.
    fn epoch(&mut self, _pattern_count: usize) {
        self.current_iteration += 1;
        let progress = self.current_iteration as f64 / self.params.training_iterations as f64;
        self.learning_rate = self.params.initial_learning_rate
            - progress * (self.params.initial_learning_rate - self.params.final_learning_rate);
        let interval = self.params.neighborhood_reduce_interval as u64;
        if (self.current_iteration + 1) % interval == 0 && self.current_neighborhood > 0 {
            self.current_neighborhood -= 1;
        }
    }

    fn train_with(&mut self, patterns: &PatternSet, options: &TrainOptions) -> Result<TrainReport> {
        if let Some(actual) = patterns.input_len() {
            if actual != self.params.inputs {
                return Err(NeuroError::InvalidInputSize {
                    expected: self.params.inputs,
                    actual,
                });
            }
        }
        let mut tracker = SweepTracker::new(options, NetworkType::SelfOrganizing, patterns.len());
        while self.current_iteration < self.params.training_iterations {
            if !tracker.begin_sweep() {
                return Ok(tracker.finish(false));
            }
            for pattern in patterns {
                self.set_pattern(pattern)?;
                self.run();
                self.learn();
            }
            self.epoch(patterns.len());
            tracker.end_sweep(patterns.len());
        }
        Ok(tracker.finish(true))
    }

    fn save(&self, writer: &mut dyn Write) -> Result<()> {
        let mut enc = Encoder::new(writer);
        enc.write_network_type(NetworkType::SelfOrganizing)?;
        self.graph.encode_counts(&mut enc)?;
        enc.write_f64(self.params.initial_learning_rate)?;
        enc.write_f64(self.params.final_learning_rate)?;
        enc.write_count(self.params.initial_neighborhood)?;
        enc.write_count(self.params.neighborhood_reduce_interval)?;
        write_u64(&mut enc, self.params.training_iterations)?;
        enc.write_count(self.params.rows)?;
        enc.write_count(self.params.cols)?;
        self.graph.encode_payloads(&mut enc)?;
        write_u64(&mut enc, self.current_iteration)?;
        enc.write_count(self.current_neighborhood)?;
        enc.write_f64(self.learning_rate)?;
        debug!(
            rows = self.params.rows,
            cols = self.params.cols,
            iteration = self.current_iteration,
            "self-organizing network saved"
        );
        Ok(())
    }

    fn load(&mut self, reader: &mut dyn Read) -> Result<()> {
        *self = Self::from_reader(reader)?;
        debug!(
            rows = self.params.rows,
            cols = self.params.cols,
            iteration = self.current_iteration,
            "self-organizing network loaded"
        );
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn params() -> SonParams {
        SonParams {
            inputs: 3,
            rows: 2,
            cols: 4,
            initial_learning_rate: 0.5,
            final_learning_rate: 0.1,
            initial_neighborhood: 3,
            neighborhood_reduce_interval: 4,
            training_iterations: 20,
        }
    }

    #[test]
    fn test_layout() {
        let map = SelfOrganizingNetwork::new(params(), 0).unwrap();
        assert_eq!(map.graph().node_count(), 3 + 8);
        assert_eq!(map.graph().link_count(), 3 * 8);
        // Cell (1, 2) is the 7th cell, fed by links 18..21
        let cell = map.cell(1, 2).unwrap();
        assert_eq!(cell.in_links(), &[18, 19, 20]);
        assert_eq!(map.cell_weights(1, 2).unwrap().len(), 3);
        assert!(map.cell(2, 0).is_err());
        assert!(map.cell(0, 4).is_err());
    }

    #[test]
    fn test_invalid_params() {
        let mut p = params();
        p.neighborhood_reduce_interval = 0;
        assert!(SelfOrganizingNetwork::new(p, 0).is_err());
        let mut p = params();
        p.rows = 0;
        assert!(SelfOrganizingNetwork::new(p, 0).is_err());
    }

    #[test]
    fn test_winner_is_closest_cell() {
        let mut map = SelfOrganizingNetwork::new(params(), 5).unwrap();
        let target = map.cell_weights(1, 3).unwrap();
        for (i, &w) in target.iter().enumerate() {
            map.set_input(i, w).unwrap();
        }
        map.run();
        assert_eq!(map.winning_cell(), (1, 3));
        assert_eq!(map.cell(1, 3).unwrap().value(), 0.0);
    }

    #[test]
    fn test_learn_only_inside_window() {
        let mut p = params();
        p.initial_neighborhood = 1;
        let mut map = SelfOrganizingNetwork::new(p, 9).unwrap();
        for l in 0..map.graph.link_count() {
            let weight = if l < 3 { 1.0 } else { 0.0 };
            map.graph.link_mut(l).set_weight(weight);
        }
        for i in 0..3 {
            map.set_input(i, 1.0).unwrap();
        }
        map.run();
        assert_eq!(map.winning_cell(), (0, 0));

        map.learn();
        assert_eq!(map.cell_weights(0, 0).unwrap(), vec![1.0; 3]);
        assert_eq!(map.cell_weights(1, 1).unwrap(), vec![0.5; 3]);
        assert_eq!(map.cell_weights(0, 3).unwrap(), vec![0.0; 3]);
        assert_eq!(map.cell_weights(1, 2).unwrap(), vec![0.0; 3]);
    }

    #[test]
    fn test_epoch_schedule() {
        let mut map = SelfOrganizingNetwork::new(params(), 0).unwrap();
        for _ in 0..4 {
            map.epoch(0);
        }
        assert_eq!(map.current_neighborhood(), 2);
        assert_relative_eq!(map.learning_rate(), 0.5 - (4.0 / 20.0) * 0.4);
    }

    #[test]
    fn test_output_always_out_of_range() {
        let map = SelfOrganizingNetwork::new(params(), 0).unwrap();
        assert!(matches!(
            map.output(0),
            Err(NeuroError::IndexOutOfRange { count: 0, .. })
        ));
    }
}
