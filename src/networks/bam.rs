//! Bidirectional Associative Memory.
//!
//! [`BamNetwork`] is a two-layer network of bipolar threshold nodes with
//! symmetric weights. Learning is a Hebbian outer product: presenting the pair
//! `(x, y)` adds `x_i * y_j` to every link `i -> j`. Running relaxes the two
//! layers against each other until a full pass changes nothing, which
//! recalls the stored pair closest to the presented one.
//!
//! A single BAM stores only a handful of associations reliably.
//! [`BamSystem`] works around that by sharding associations across as many
//! networks as it needs: a pattern is offered to each existing network in
//! turn and kept by the first one that can hold it without disturbing what it
//! already knows, otherwise a new network is allocated.
//!
//! # Examples
//!
//! ```
//! use neuronet::networks::BamNetwork;
//! use neuronet::{NeuralNetwork, Pattern};
//!
//! let mut bam = BamNetwork::new(4, 2).unwrap();
//! let pair = Pattern::new(vec![1.0, -1.0, 1.0, -1.0], vec![1.0, -1.0]);
//! bam.set_pattern(&pair).unwrap();
//! bam.learn();
//!
//! // Recall from a corrupted input
//! bam.set_pattern(&Pattern::new(vec![1.0, 1.0, 1.0, -1.0], vec![1.0, 1.0])).unwrap();
//! bam.run();
//! assert_eq!(bam.output(0).unwrap(), 1.0);
//! assert_eq!(bam.output(1).unwrap(), -1.0);
//! ```

use crate::codec::{Decoder, Encoder, NetworkType};
use crate::error::{NeuroError, Result};
use crate::graph::{Graph, Layout};
use crate::link::LinkKind;
use crate::network::{check_pattern, check_shape, NeuralNetwork};
use crate::node::{Node, NodeKind};
use crate::pattern::{Pattern, PatternSet};
use crate::training::{SweepTracker, TrainOptions, TrainReport};
use std::any::Any;
use std::io::{Read, Write};
use std::iter;
use tracing::{debug, info, trace};

fn check_dimensions(inputs: usize, outputs: usize) -> Result<()> {
    if inputs == 0 || outputs == 0 {
        return Err(NeuroError::InvalidParameter(format!(
            "BAM needs at least one input and one output node, got {}x{}",
            inputs, outputs
        )));
    }
    Ok(())
}

/// A single bidirectional associative memory.
#[derive(Debug, Clone, PartialEq)]
pub struct BamNetwork {
    graph: Graph,
    inputs: usize,
    outputs: usize,
    iterations: usize,
}

impl BamNetwork {
    /// Create an empty memory; all weights start at zero.
    pub fn new(inputs: usize, outputs: usize) -> Result<Self> {
        check_dimensions(inputs, outputs)?;
        let net = Self::build(inputs, outputs);
        debug!(inputs, outputs, "BAM network created");
        Ok(net)
    }

    fn build(inputs: usize, outputs: usize) -> Self {
        let mut graph = Graph::with_capacity(inputs + outputs, inputs * outputs);
        for _ in 0..inputs {
            graph.add_node(Node::new(NodeKind::BamInput { last_value: 0.0 }));
        }
        for _ in 0..outputs {
            graph.add_node(Node::new(NodeKind::BamOutput { last_value: 0.0 }));
        }
        for i in 0..inputs {
            for j in inputs..inputs + outputs {
                graph.link_to(i, j, 0.0, LinkKind::Plain);
            }
        }
        Self {
            graph,
            inputs,
            outputs,
            iterations: 0,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Relaxation passes performed by the last Run.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn input_node(&self, index: usize) -> Result<&Node> {
        if index >= self.inputs {
            return Err(NeuroError::index("input", index, self.inputs));
        }
        Ok(self.graph.node(index))
    }

    pub fn output_node(&self, index: usize) -> Result<&Node> {
        if index >= self.outputs {
            return Err(NeuroError::index("output", index, self.outputs));
        }
        Ok(self.graph.node(self.inputs + index))
    }

    /// Set a node by its arena index, inputs first then outputs.
    pub fn set_value(&mut self, index: usize, value: f64) -> Result<()> {
        let count = self.inputs + self.outputs;
        if index >= count {
            return Err(NeuroError::index("BAM", index, count));
        }
        self.graph.node_mut(index).set_value(value);
        Ok(())
    }

    /// Erase the currently presented association.
    ///
    /// Output values are negated and Learn runs again, which subtracts the
    /// outer product that Learn added.
    pub fn unlearn(&mut self) {
        for i in self.inputs..self.inputs + self.outputs {
            let node = self.graph.node_mut(i);
            let value = node.value();
            node.set_value(-value);
        }
        self.learn();
    }

    /// Reconstruction error of the current state.
    ///
    /// Compares the energy of the current values with the energy of the
    /// presented input (kept in the input nodes' error field). Equal energies
    /// give `|energy - n*m|`, which is zero for a perfectly recalled pair;
    /// anything else is `+inf`.
    pub fn error(&self) -> f64 {
        let mut by_value = 0.0;
        let mut by_error = 0.0;
        for j in self.inputs..self.inputs + self.outputs {
            let out = self.graph.node(j);
            for &l in out.in_links() {
                let link = self.graph.link(l);
                let input = self.graph.node(link.in_node());
                by_value += input.value() * link.weight() * out.value();
                by_error += input.error() * link.weight() * out.value();
            }
        }
        if by_value == by_error {
            (-((self.inputs * self.outputs) as f64) + by_value).abs()
        } else {
            f64::INFINITY
        }
    }

    fn is_stable(&self) -> bool {
        self.graph
            .nodes()
            .iter()
            .all(|node| node.last_value() == Some(node.value()))
    }

    /// Copy `data` into both layers; values it lacks read as zero.
    fn present(&mut self, data: &Pattern) {
        let values = data
            .input()
            .iter()
            .chain(data.output())
            .copied()
            .chain(iter::repeat(0.0));
        for (i, v) in (0..self.inputs + self.outputs).zip(values) {
            self.graph.node_mut(i).set_value(v);
        }
    }

    pub fn from_reader(reader: &mut dyn Read) -> Result<Self> {
        let mut dec = Decoder::new(reader);
        dec.expect_network_type(NetworkType::Bam)?;
        Self::decode_body(&mut dec)
    }

    pub(crate) fn decode_body(dec: &mut Decoder<'_>) -> Result<Self> {
        let nodes = dec.read_count("node count")?;
        let links = dec.read_count("link count")?;
        let inputs = dec.read_count("input count")?;
        let outputs = dec.read_count("output count")?;
        check_dimensions(inputs, outputs).map_err(|e| NeuroError::InvalidFormat(e.to_string()))?;
        let layout = Layout::default()
            .with_nodes(inputs, &NodeKind::BamInput { last_value: 0.0 })
            .and_then(|l| l.with_nodes(outputs, &NodeKind::BamOutput { last_value: 0.0 }))
            .and_then(|l| l.with_links(inputs.checked_mul(outputs)?, &LinkKind::Plain));
        let payloads = Layout::read_payloads(layout, nodes, links, dec)?;

        let mut net = Self::build(inputs, outputs);
        net.graph.decode_payloads(&payloads)?;
        Ok(net)
    }

    pub(crate) fn encode(&self, enc: &mut Encoder<'_>) -> Result<()> {
        enc.write_network_type(NetworkType::Bam)?;
        self.graph.encode_counts(enc)?;
        enc.write_count(self.inputs)?;
        enc.write_count(self.outputs)?;
        self.graph.encode_payloads(enc)
    }
}

impl NeuralNetwork for BamNetwork {
    fn network_type(&self) -> NetworkType {
        NetworkType::Bam
    }

    fn input_count(&self) -> usize {
        self.inputs
    }

    fn output_count(&self) -> usize {
        self.outputs
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

    /// Both layers take the pattern's values.
    fn set_pattern(&mut self, pattern: &Pattern) -> Result<()> {
        check_pattern(pattern, self.inputs, self.outputs)?;
        self.present(pattern);
        Ok(())
    }

    /// Relax until a full pass leaves every node unchanged.
    ///
    /// The first pass never counts as stable, so at least two passes run.
    fn run(&mut self) {
        let count = self.inputs + self.outputs;
        self.iterations = 0;
        loop {
            self.iterations += 1;
            for i in (0..count).rev() {
                self.graph.run_node(i);
            }
            if self.iterations > 1 && self.is_stable() {
                break;
            }
        }
        trace!(iterations = self.iterations, "BAM relaxed");
    }

    fn learn(&mut self) {
        for i in self.inputs..self.inputs + self.outputs {
            self.graph.learn_node(i);
        }
    }

    /// One pass: every pattern is learned once.
    fn train_with(&mut self, patterns: &PatternSet, options: &TrainOptions) -> Result<TrainReport> {
        check_shape(patterns, self.inputs, self.outputs)?;
        let mut tracker = SweepTracker::new(options, NetworkType::Bam, patterns.len());
        if !tracker.begin_sweep() {
            return Ok(tracker.finish(false));
        }
        for pattern in patterns {
            self.set_pattern(pattern)?;
            self.learn();
        }
        tracker.end_sweep(patterns.len());
        Ok(tracker.finish(true))
    }

    fn save(&self, writer: &mut dyn Write) -> Result<()> {
        let mut enc = Encoder::new(writer);
        self.encode(&mut enc)?;
        debug!(inputs = self.inputs, outputs = self.outputs, "BAM network saved");
        Ok(())
    }

    fn load(&mut self, reader: &mut dyn Read) -> Result<()> {
        *self = Self::from_reader(reader)?;
        debug!(inputs = self.inputs, outputs = self.outputs, "BAM network loaded");
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A growable ensemble of BAM networks.
#[derive(Debug, Clone, PartialEq)]
pub struct BamSystem {
    inputs: usize,
    outputs: usize,
    data: Pattern,
    networks: Vec<BamNetwork>,
    best: Option<usize>,
    best_error: f64,
}

impl BamSystem {
    pub fn new(inputs: usize, outputs: usize) -> Result<Self> {
        check_dimensions(inputs, outputs)?;
        debug!(inputs, outputs, "BAM system created");
        Ok(Self::empty(inputs, outputs))
    }

    fn empty(inputs: usize, outputs: usize) -> Self {
        Self {
            inputs,
            outputs,
            data: Pattern::new(Vec::new(), Vec::new()),
            networks: Vec::new(),
            best: None,
            best_error: f64::INFINITY,
        }
    }

    pub fn networks(&self) -> &[BamNetwork] {
        &self.networks
    }

    pub fn network_count(&self) -> usize {
        self.networks.len()
    }

    /// Lowest error found by the last Run (`+inf` before any Run).
    pub fn best_error(&self) -> f64 {
        self.best_error
    }

    /// Network selected by the last Run.
    pub fn best_network(&self) -> Option<&BamNetwork> {
        self.best.map(|i| &self.networks[i])
    }

    /// The pattern currently presented to the system; empty until the
    /// first `set_input` or `set_pattern`.
    pub fn data(&self) -> &Pattern {
        &self.data
    }

    fn data_mut(&mut self) -> &mut Pattern {
        if self.data.input_len() != self.inputs {
            self.data = Pattern::zeros(self.inputs, self.outputs);
        }
        &mut self.data
    }

    pub fn output_node(&self, index: usize) -> Result<&Node> {
        if index >= self.outputs {
            return Err(NeuroError::index("output", index, self.outputs));
        }
        self.best_network()
            .ok_or(NeuroError::NoNetworks)?
            .output_node(index)
    }

    pub fn from_reader(reader: &mut dyn Read) -> Result<Self> {
        let mut dec = Decoder::new(reader);
        dec.expect_network_type(NetworkType::BamSystem)?;
        Self::decode_body(&mut dec)
    }

    pub(crate) fn decode_body(dec: &mut Decoder<'_>) -> Result<Self> {
        let nodes = dec.read_count("node count")?;
        let links = dec.read_count("link count")?;
        if nodes != 0 || links != 0 {
            return Err(NeuroError::InvalidFormat(format!(
                "BAM system stores no nodes or links, found {} and {}",
                nodes, links
            )));
        }
        let inputs = dec.read_count("input count")?;
        let outputs = dec.read_count("output count")?;
        check_dimensions(inputs, outputs).map_err(|e| NeuroError::InvalidFormat(e.to_string()))?;
        let count = dec.read_count("network count")?;

        let mut system = Self::empty(inputs, outputs);
        for _ in 0..count {
            dec.expect_network_type(NetworkType::Bam)?;
            let net = BamNetwork::decode_body(dec)?;
            if net.inputs != inputs || net.outputs != outputs {
                return Err(NeuroError::InvalidFormat(format!(
                    "member network is {}x{}, system is {}x{}",
                    net.inputs, net.outputs, inputs, outputs
                )));
            }
            system.networks.push(net);
        }
        Ok(system)
    }
}

impl NeuralNetwork for BamSystem {
    fn network_type(&self) -> NetworkType {
        NetworkType::BamSystem
    }

    fn input_count(&self) -> usize {
        self.inputs
    }

    fn output_count(&self) -> usize {
        self.outputs
    }

    fn set_input(&mut self, index: usize, value: f64) -> Result<()> {
        if index >= self.inputs {
            return Err(NeuroError::index("input", index, self.inputs));
        }
        self.data_mut().input_mut()[index] = value;
        Ok(())
    }

    /// Output of the best network of the last Run.
    ///
    /// Fails with `NoNetworks` before the first Run.
    fn output(&self, index: usize) -> Result<f64> {
        Ok(self.output_node(index)?.value())
    }

    fn set_pattern(&mut self, pattern: &Pattern) -> Result<()> {
        check_pattern(pattern, self.inputs, self.outputs)?;
        let data = self.data_mut();
        data.input_mut().copy_from_slice(pattern.input());
        data.output_mut().copy_from_slice(pattern.output());
        Ok(())
    }

    /// Run every member and keep the one with the lowest error; ties go to
    /// the later network.
    fn run(&mut self) {
        self.best = None;
        self.best_error = f64::INFINITY;
        for (i, net) in self.networks.iter_mut().enumerate() {
            net.present(&self.data);
            net.run();
            let error = net.error();
            if error <= self.best_error {
                self.best_error = error;
                self.best = Some(i);
            }
        }
        trace!(best = ?self.best, error = self.best_error, "BAM system run");
    }

    /// Store the presented association in the first network that holds it
    /// without error, allocating a new network if none does.
    fn learn(&mut self) {
        for net in self.networks.iter_mut() {
            net.present(&self.data);
            net.learn();
            if net.error() != 0.0 {
                net.unlearn();
            } else {
                return;
            }
        }
        let mut net = BamNetwork::build(self.inputs, self.outputs);
        net.present(&self.data);
        net.learn();
        self.networks.push(net);
        info!(networks = self.networks.len(), "BAM system allocated a new network");
    }

    fn train_with(&mut self, patterns: &PatternSet, options: &TrainOptions) -> Result<TrainReport> {
        check_shape(patterns, self.inputs, self.outputs)?;
        let mut tracker = SweepTracker::new(options, NetworkType::BamSystem, patterns.len());
        if !tracker.begin_sweep() {
            return Ok(tracker.finish(false));
        }
        for pattern in patterns {
            self.set_pattern(pattern)?;
            self.learn();
        }
        tracker.end_sweep(patterns.len());
        Ok(tracker.finish(true))
    }

    fn save(&self, writer: &mut dyn Write) -> Result<()> {
        let mut enc = Encoder::new(writer);
        enc.write_network_type(NetworkType::BamSystem)?;
        enc.write_count(0)?;
        enc.write_count(0)?;
        enc.write_count(self.inputs)?;
        enc.write_count(self.outputs)?;
        enc.write_count(self.networks.len())?;
        for net in &self.networks {
            net.encode(&mut enc)?;
        }
        debug!(networks = self.networks.len(), "BAM system saved");
        Ok(())
    }

    fn load(&mut self, reader: &mut dyn Read) -> Result<()> {
        *self = Self::from_reader(reader)?;
        debug!(networks = self.networks.len(), "BAM system loaded");
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
