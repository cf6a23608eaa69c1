//! AdalineNetwork - a single linear threshold unit.
//!
//! Inputs and a constant bias node feed one Adaline node whose output is
//! `-1` or `1`. Training follows the Widrow-Hoff style rule: on the first
//! misclassified pattern of a sweep the node learns and the sweep restarts.
//! Training converges only on linearly separable data; bound it with
//! [`TrainOptions::with_max_sweeps`] otherwise.
//!
//! # Layout
//!
//! Nodes: `inputs` input nodes, one bias node (value 1), one Adaline node.
//! Links: every input and the bias feed the Adaline node, weights drawn
//! uniformly from `[-1, 1)`.
//!
//! # Examples
//!
//! ```
//! use neuronet::networks::AdalineNetwork;
//! use neuronet::{NeuralNetwork, Pattern, PatternSet};
//!
//! let mut and = PatternSet::new();
//! and.push(Pattern::new(vec![-1.0, -1.0], vec![-1.0])).unwrap();
//! and.push(Pattern::new(vec![1.0, -1.0], vec![-1.0])).unwrap();
//! and.push(Pattern::new(vec![-1.0, 1.0], vec![-1.0])).unwrap();
//! and.push(Pattern::new(vec![1.0, 1.0], vec![1.0])).unwrap();
//!
//! let mut net = AdalineNetwork::new(2, 0.1, 42).unwrap();
//! let report = net.train(&and).unwrap();
//! assert!(report.converged);
//! assert_eq!(net.compute(&[1.0, 1.0]).unwrap(), vec![1.0]);
//! ```

use crate::codec::{Decoder, Encoder, NetworkType};
use crate::error::{NeuroError, Result};
use crate::graph::{Graph, Layout};
use crate::link::LinkKind;
use crate::network::{check_pattern, check_shape, NeuralNetwork};
use crate::node::{Node, NodeKind};
use crate::pattern::{Pattern, PatternSet};
use crate::training::{SweepTracker, TrainOptions, TrainReport};
use crate::utils::random_weight;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::any::Any;
use std::io::{Read, Write};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct AdalineNetwork {
    graph: Graph,
    inputs: usize,
    learning_rate: f64,
}

impl AdalineNetwork {
    /// Create a network with `inputs` inputs and random weights seeded by `seed`.
    pub fn new(inputs: usize, learning_rate: f64, seed: u64) -> Result<Self> {
        if inputs == 0 {
            return Err(NeuroError::InvalidParameter(
                "adaline network needs at least one input".into(),
            ));
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let graph = Self::build(inputs, learning_rate, || random_weight(&mut rng, -1.0, 1.0));
        debug!(inputs, learning_rate, links = graph.link_count(), "adaline network created");
        Ok(Self {
            graph,
            inputs,
            learning_rate,
        })
    }

    fn build<F: FnMut() -> f64>(inputs: usize, learning_rate: f64, mut weight: F) -> Graph {
        let mut graph = Graph::with_capacity(inputs + 2, inputs + 1);
        for _ in 0..inputs {
            graph.add_node(Node::new(NodeKind::Input));
        }
        graph.add_node(Node::bias(1.0));
        let adaline = graph.add_node(Node::new(NodeKind::Adaline { learning_rate }));
        for i in 0..=inputs {
            graph.link_to(i, adaline, weight(), LinkKind::Plain);
        }
        graph
    }

    #[inline]
    fn adaline_index(&self) -> usize {
        self.inputs + 1
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn set_learning_rate(&mut self, learning_rate: f64) {
        self.learning_rate = learning_rate;
        let index = self.adaline_index();
        self.graph.node_mut(index).set_learning_rate(learning_rate);
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn input_node(&self, index: usize) -> Result<&Node> {
        if index >= self.inputs {
            return Err(NeuroError::index("input", index, self.inputs));
        }
        Ok(self.graph.node(index))
    }

    /// The Adaline node; only index 0 exists.
    pub fn output_node(&self, index: usize) -> Result<&Node> {
        if index >= 1 {
            return Err(NeuroError::index("output", index, 1));
        }
        Ok(self.graph.node(self.adaline_index()))
    }

    /// Read a persisted network.
    pub fn from_reader(reader: &mut dyn Read) -> Result<Self> {
        let mut dec = Decoder::new(reader);
        dec.expect_network_type(NetworkType::Adaline)?;
        Self::decode_body(&mut dec)
    }

    /// Everything after the type tag.
    pub(crate) fn decode_body(dec: &mut Decoder<'_>) -> Result<Self> {
        let nodes = dec.read_count("node count")?;
        let links = dec.read_count("link count")?;
        if nodes < 3 {
            return Err(NeuroError::InvalidFormat(format!(
                "adaline network needs at least 3 nodes, found {}",
                nodes
            )));
        }
        let inputs = nodes - 2;
        let layout = Layout::default()
            .with_nodes(inputs, &NodeKind::Input)
            .and_then(|l| l.with_nodes(1, &NodeKind::Bias))
            .and_then(|l| l.with_nodes(1, &NodeKind::Adaline { learning_rate: 0.0 }))
            .and_then(|l| l.with_links(inputs + 1, &LinkKind::Plain));
        let payloads = Layout::read_payloads(layout, nodes, links, dec)?;

        let mut graph = Self::build(inputs, 0.0, || 0.0);
        graph.decode_payloads(&payloads)?;
        let learning_rate = dec.read_f64()?;
        graph.node_mut(inputs + 1).set_learning_rate(learning_rate);
        Ok(Self {
            graph,
            inputs,
            learning_rate,
        })
    }
}

impl NeuralNetwork for AdalineNetwork {
    fn network_type(&self) -> NetworkType {
        NetworkType::Adaline
    }

    fn input_count(&self) -> usize {
        self.inputs
    }

    fn output_count(&self) -> usize {
        1
    }

    fn set_input(&mut self, index: usize, value: f64) -> Result<()> {
        if index >= self.inputs {
            return Err(NeuroError::index("input", index, self.inputs));
        }
        self.graph.node_mut(index).set_value(value);
        Ok(())
    }

    fn output(&self, index: usize) -> Result<f64> {
        Ok(self.output_node(index)?.value())
    }

    fn set_pattern(&mut self, pattern: &Pattern) -> Result<()> {
        check_pattern(pattern, self.inputs, 1)?;
        for (i, &v) in pattern.input().iter().enumerate() {
            self.graph.node_mut(i).set_value(v);
        }
        Ok(())
    }

    fn run(&mut self) {
        let index = self.adaline_index();
        self.graph.run_node(index);
    }

    fn learn(&mut self) {
        let index = self.adaline_index();
        self.graph.learn_node(index);
    }

    fn train_with(&mut self, patterns: &PatternSet, options: &TrainOptions) -> Result<TrainReport> {
        check_shape(patterns, self.inputs, 1)?;
        let mut tracker = SweepTracker::new(options, NetworkType::Adaline, patterns.len());
        let mut good = 0;
        while good < patterns.len() {
            if !tracker.begin_sweep() {
                return Ok(tracker.finish(false));
            }
            good = 0;
            for pattern in patterns {
                self.set_pattern(pattern)?;
                self.run();
                if self.graph.node(self.adaline_index()).value() != pattern.output()[0] {
                    self.learn();
                    break;
                }
                good += 1;
            }
            tracker.end_sweep(good);
        }
        Ok(tracker.finish(true))
    }

    fn save(&self, writer: &mut dyn Write) -> Result<()> {
        let mut enc = Encoder::new(writer);
        enc.write_network_type(NetworkType::Adaline)?;
        self.graph.encode_counts(&mut enc)?;
        self.graph.encode_payloads(&mut enc)?;
        enc.write_f64(self.learning_rate)?;
        debug!(inputs = self.inputs, "adaline network saved");
        Ok(())
    }

    fn load(&mut self, reader: &mut dyn Read) -> Result<()> {
        *self = Self::from_reader(reader)?;
        debug!(inputs = self.inputs, "adaline network loaded");
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

    #[test]
    fn test_layout() {
        let net = AdalineNetwork::new(3, 0.1, 0).unwrap();
        assert_eq!(net.graph().node_count(), 5);
        assert_eq!(net.graph().link_count(), 4);
        assert_eq!(net.graph().node(3).value(), 1.0);
        assert!(net
            .graph()
            .links()
            .iter()
            .all(|l| l.out_node() == 4 && (-1.0..1.0).contains(&l.weight())));
    }

    #[test]
    fn test_zero_inputs_rejected() {
        assert!(matches!(
            AdalineNetwork::new(0, 0.1, 0),
            Err(NeuroError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_bounds() {
        let mut net = AdalineNetwork::new(2, 0.1, 0).unwrap();
        assert!(matches!(
            net.set_input(2, 1.0),
            Err(NeuroError::IndexOutOfRange {
                kind: "input",
                index: 2,
                count: 2
            })
        ));
        assert!(net.output(1).is_err());
        assert!(net.output_node(0).is_ok());
    }

    #[test]
    fn test_learn_moves_toward_negated_output() {
        let mut net = AdalineNetwork::new(1, 0.5, 3).unwrap();
        net.set_input(0, 1.0).unwrap();
        net.run();
        let before = net.output(0).unwrap();
        let w0 = net.graph().link(0).weight();
        net.learn();
        // delta = lr * in * (-2 * out)
        let expected = w0 + 0.5 * 1.0 * (-2.0 * before);
        assert_eq!(net.graph().link(0).weight(), expected);
    }

    #[test]
    fn test_learning_rate_reaches_node() {
        let mut net = AdalineNetwork::new(2, 0.1, 0).unwrap();
        net.set_learning_rate(0.3);
        assert_eq!(net.output_node(0).unwrap().learning_rate(), Some(0.3));
    }
}
