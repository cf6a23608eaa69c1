//! BackPropNetwork - layered sigmoid network trained by backpropagation.
//!
//! Layer sizes are declared up front. Nodes are stored input layer first,
//! then every hidden layer, then the output layer, and each layer is fully
//! connected to the next. Run visits the nodes in storage order, Learn in
//! reverse, so every hidden node reads downstream errors that are already
//! computed.
//!
//! Three flavors share that structure and differ only in their links:
//!
//! | flavor | links | weights change |
//! |---|---|---|
//! | [`BackPropFlavor::Online`] | momentum | after every pattern |
//! | [`BackPropFlavor::Epoch`] | epoch | once per sweep, averaged, with momentum |
//! | [`BackPropFlavor::Rprop`] | RPROP | once per sweep, by adaptive per-link steps |
//!
//! A pattern counts as good when every output is within the tolerance of its
//! target. For the deferred flavors that check uses the weights from before
//! the sweep's commit.
//!
//! # Examples
//!
//! ```
//! use neuronet::networks::BackPropNetwork;
//! use neuronet::NeuralNetwork;
//!
//! let mut net = BackPropNetwork::new(&[2, 3, 1], 0.55, 0.6, 7).unwrap();
//! let out = net.compute(&[1.0, 0.0]).unwrap();
//! assert!(out[0] > 0.0 && out[0] < 1.0);
//! assert_eq!(net.middle_count(), 3);
//! ```

use crate::codec::{Decoder, Encoder, NetworkType};
use crate::error::{NeuroError, Result};
use crate::graph::{Graph, Layout};
use crate::link::{LinkKind, RpropParams, RpropState};
use crate::network::{check_pattern, check_shape, NeuralNetwork};
use crate::node::{Node, NodeKind};
use crate::pattern::{Pattern, PatternSet};
use crate::training::{SweepTracker, TrainOptions, TrainReport};
use crate::utils::random_weight;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::io::{Read, Write};
use tracing::debug;

/// Weight update policy of a backprop network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackPropFlavor {
    Online,
    Epoch,
    Rprop,
}

impl BackPropFlavor {
    pub fn network_type(self) -> NetworkType {
        match self {
            BackPropFlavor::Online => NetworkType::BackProp,
            BackPropFlavor::Epoch => NetworkType::EpochBackProp,
            BackPropFlavor::Rprop => NetworkType::RpropBackProp,
        }
    }

    pub fn from_network_type(network_type: NetworkType) -> Option<Self> {
        match network_type {
            NetworkType::BackProp => Some(BackPropFlavor::Online),
            NetworkType::EpochBackProp => Some(BackPropFlavor::Epoch),
            NetworkType::RpropBackProp => Some(BackPropFlavor::Rprop),
            _ => None,
        }
    }

    fn link_kind(self) -> LinkKind {
        match self {
            BackPropFlavor::Online => LinkKind::Momentum { delta: 0.0 },
            BackPropFlavor::Epoch => LinkKind::Epoch {
                delta: 0.0,
                accumulator: 0.0,
            },
            BackPropFlavor::Rprop => LinkKind::Rprop(RpropState::new(RpropParams::default())),
        }
    }

    /// Whether weight changes wait for [`NeuralNetwork::epoch`].
    pub fn is_deferred(self) -> bool {
        !matches!(self, BackPropFlavor::Online)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackPropNetwork {
    graph: Graph,
    layers: Vec<usize>,
    flavor: BackPropFlavor,
    learning_rate: f64,
    momentum: f64,
    targets: Vec<f64>,
    first_middle: usize,
    first_output: usize,
}

impl BackPropNetwork {
    /// Online network with momentum links.
    pub fn new(layers: &[usize], learning_rate: f64, momentum: f64, seed: u64) -> Result<Self> {
        Self::with_flavor(layers, learning_rate, momentum, BackPropFlavor::Online, seed)
    }

    /// Batch network: weights change once per sweep.
    pub fn new_epoch(
        layers: &[usize],
        learning_rate: f64,
        momentum: f64,
        seed: u64,
    ) -> Result<Self> {
        Self::with_flavor(layers, learning_rate, momentum, BackPropFlavor::Epoch, seed)
    }

    /// Resilient propagation network. Learning rate is fixed at 1 and
    /// momentum at 0; every link adapts its own step.
    pub fn new_rprop(layers: &[usize], seed: u64) -> Result<Self> {
        Self::with_flavor(layers, 1.0, 0.0, BackPropFlavor::Rprop, seed)
    }

    pub fn with_flavor(
        layers: &[usize],
        learning_rate: f64,
        momentum: f64,
        flavor: BackPropFlavor,
        seed: u64,
    ) -> Result<Self> {
        Self::check_layers(layers)?;
        let mut rng = StdRng::seed_from_u64(seed);
        let net = Self::build(layers, learning_rate, momentum, flavor, || {
            random_weight(&mut rng, -1.0, 1.0)
        });
        debug!(
            ?layers,
            ?flavor,
            learning_rate,
            momentum,
            links = net.graph.link_count(),
            "backprop network created"
        );
        Ok(net)
    }

    fn check_layers(layers: &[usize]) -> Result<()> {
        if layers.len() < 2 {
            return Err(NeuroError::InvalidParameter(format!(
                "backprop network needs at least 2 layers, got {}",
                layers.len()
            )));
        }
        if let Some(i) = layers.iter().position(|&n| n == 0) {
            return Err(NeuroError::InvalidParameter(format!(
                "layer {} has no nodes",
                i
            )));
        }
        Ok(())
    }

    /// Stored layout of a topology, or `None` if its sizes overflow.
    fn layout(layers: &[usize], flavor: BackPropFlavor) -> Option<Layout> {
        let sigmoid = NodeKind::BackPropMiddle {
            learning_rate: 0.0,
            momentum: 0.0,
        };
        let link_kind = flavor.link_kind();
        let mut layout = Layout::default().with_nodes(layers[0], &NodeKind::Input)?;
        for &size in &layers[1..] {
            layout = layout.with_nodes(size, &sigmoid)?;
        }
        for pair in layers.windows(2) {
            layout = layout.with_links(pair[0].checked_mul(pair[1])?, &link_kind)?;
        }
        Some(layout)
    }

    fn build<F: FnMut() -> f64>(
        layers: &[usize],
        learning_rate: f64,
        momentum: f64,
        flavor: BackPropFlavor,
        mut weight: F,
    ) -> Self {
        let node_count: usize = layers.iter().sum();
        let link_count: usize = layers.windows(2).map(|w| w[0] * w[1]).sum();
        let mut graph = Graph::with_capacity(node_count, link_count);

        let inputs = layers[0];
        let outputs = layers[layers.len() - 1];
        for _ in 0..inputs {
            graph.add_node(Node::new(NodeKind::Input));
        }
        let first_middle = graph.node_count();
        for &size in &layers[1..layers.len() - 1] {
            for _ in 0..size {
                graph.add_node(Node::new(NodeKind::BackPropMiddle {
                    learning_rate,
                    momentum,
                }));
            }
        }
        let first_output = graph.node_count();
        for _ in 0..outputs {
            graph.add_node(Node::new(NodeKind::BackPropOutput {
                learning_rate,
                momentum,
            }));
        }

        let link_kind = flavor.link_kind();
        let mut from_layer = 0;
        let mut to_layer = first_middle;
        for pair in layers.windows(2) {
            for j in 0..pair[1] {
                for k in 0..pair[0] {
                    graph.link_to(from_layer + k, to_layer + j, weight(), link_kind);
                }
            }
            from_layer = to_layer;
            to_layer += pair[1];
        }

        Self {
            graph,
            layers: layers.to_vec(),
            flavor,
            learning_rate,
            momentum,
            targets: vec![0.0; outputs],
            first_middle,
            first_output,
        }
    }

    pub fn flavor(&self) -> BackPropFlavor {
        self.flavor
    }

    /// Declared layer sizes, input layer first.
    pub fn layers(&self) -> &[usize] {
        &self.layers
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn momentum(&self) -> f64 {
        self.momentum
    }

    /// Set the learning rate of every hidden and output node.
    pub fn set_learning_rate(&mut self, learning_rate: f64) {
        self.learning_rate = learning_rate;
        for i in self.first_middle..self.graph.node_count() {
            self.graph.node_mut(i).set_learning_rate(learning_rate);
        }
    }

    /// Set the momentum of every hidden and output node.
    pub fn set_momentum(&mut self, momentum: f64) {
        self.momentum = momentum;
        for i in self.first_middle..self.graph.node_count() {
            if let NodeKind::BackPropMiddle { momentum: m, .. }
            | NodeKind::BackPropOutput { momentum: m, .. } = &mut self.graph.node_mut(i).kind
            {
                *m = momentum;
            }
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Number of nodes across all hidden layers.
    pub fn middle_count(&self) -> usize {
        self.first_output - self.first_middle
    }

    pub fn input_node(&self, index: usize) -> Result<&Node> {
        if index >= self.layers[0] {
            return Err(NeuroError::index("input", index, self.layers[0]));
        }
        Ok(self.graph.node(index))
    }

    pub fn middle_node(&self, index: usize) -> Result<&Node> {
        if index >= self.middle_count() {
            return Err(NeuroError::index("middle", index, self.middle_count()));
        }
        Ok(self.graph.node(self.first_middle + index))
    }

    pub fn output_node(&self, index: usize) -> Result<&Node> {
        if index >= self.targets.len() {
            return Err(NeuroError::index("output", index, self.targets.len()));
        }
        Ok(self.graph.node(self.first_output + index))
    }

    /// Read a persisted network of the given flavor.
    pub fn from_reader(reader: &mut dyn Read, flavor: BackPropFlavor) -> Result<Self> {
        let mut dec = Decoder::new(reader);
        dec.expect_network_type(flavor.network_type())?;
        Self::decode_body(&mut dec, flavor)
    }

    pub(crate) fn decode_body(dec: &mut Decoder<'_>, flavor: BackPropFlavor) -> Result<Self> {
        let nodes = dec.read_count("node count")?;
        let links = dec.read_count("link count")?;
        let layer_count = dec.read_count("layer count")?;
        let mut layers = Vec::new();
        for _ in 0..layer_count {
            layers.push(dec.read_count("layer size")?);
        }
        Self::check_layers(&layers).map_err(|e| NeuroError::InvalidFormat(e.to_string()))?;

        let payloads = Layout::read_payloads(Self::layout(&layers, flavor), nodes, links, dec)?;

        let mut net = Self::build(&layers, 0.0, 0.0, flavor, || 0.0);
        net.graph.decode_payloads(&payloads)?;

        let first = net.graph.node(net.first_middle);
        net.learning_rate = first.learning_rate().unwrap_or_default();
        net.momentum = first.momentum();
        Ok(net)
    }
}

impl NeuralNetwork for BackPropNetwork {
    fn network_type(&self) -> NetworkType {
        self.flavor.network_type()
    }

    fn input_count(&self) -> usize {
        self.layers[0]
    }

    fn output_count(&self) -> usize {
        self.targets.len()
    }

    fn set_input(&mut self, index: usize, value: f64) -> Result<()> {
        if index >= self.layers[0] {
            return Err(NeuroError::index("input", index, self.layers[0]));
        }
        self.graph.node_mut(index).set_value(value);
        Ok(())
    }

    fn output(&self, index: usize) -> Result<f64> {
        Ok(self.output_node(index)?.value())
    }

    fn set_target(&mut self, index: usize, value: f64) -> Result<()> {
        let count = self.targets.len();
        let target = self
            .targets
            .get_mut(index)
            .ok_or_else(|| NeuroError::index("output", index, count))?;
        *target = value;
        Ok(())
    }

    /// Inputs go to the input layer, outputs become the targets.
    fn set_pattern(&mut self, pattern: &Pattern) -> Result<()> {
        check_pattern(pattern, self.layers[0], self.targets.len())?;
        for (i, &v) in pattern.input().iter().enumerate() {
            self.graph.node_mut(i).set_value(v);
        }
        self.targets.copy_from_slice(pattern.output());
        Ok(())
    }

    fn run(&mut self) {
        for i in self.first_middle..self.graph.node_count() {
            self.graph.run_node(i);
        }
    }

    fn learn(&mut self) {
        for (k, &target) in self.targets.iter().enumerate() {
            self.graph.node_mut(self.first_output + k).set_error(target);
        }
        for i in (self.first_middle..self.graph.node_count()).rev() {
            self.graph.learn_node(i);
        }
    }

    fn epoch(&mut self, pattern_count: usize) {
        self.graph.epoch(pattern_count);
    }

    fn train_with(&mut self, patterns: &PatternSet, options: &TrainOptions) -> Result<TrainReport> {
        check_shape(patterns, self.layers[0], self.targets.len())?;
        let tolerance = options.tolerance;
        let mut tracker = SweepTracker::new(options, self.network_type(), patterns.len());
        let mut good = 0;
        while good < patterns.len() {
            if !tracker.begin_sweep() {
                return Ok(tracker.finish(false));
            }
            good = 0;
            for pattern in patterns {
                self.set_pattern(pattern)?;
                self.run();
                self.learn();
                let first_output = self.first_output;
                let in_range = pattern.output().iter().enumerate().all(|(k, &target)| {
                    (self.graph.node(first_output + k).value() - target).abs() < tolerance
                });
                if in_range {
                    good += 1;
                }
            }
            if self.flavor.is_deferred() {
                self.epoch(patterns.len());
            }
            tracker.end_sweep(good);
        }
        Ok(tracker.finish(true))
    }

    fn save(&self, writer: &mut dyn Write) -> Result<()> {
        let mut enc = Encoder::new(writer);
        enc.write_network_type(self.network_type())?;
        self.graph.encode_counts(&mut enc)?;
        enc.write_count(self.layers.len())?;
        for &size in &self.layers {
            enc.write_count(size)?;
        }
        self.graph.encode_payloads(&mut enc)?;
        debug!(layers = ?self.layers, flavor = ?self.flavor, "backprop network saved");
        Ok(())
    }

    fn load(&mut self, reader: &mut dyn Read) -> Result<()> {
        *self = Self::from_reader(reader, self.flavor)?;
        debug!(layers = ?self.layers, flavor = ?self.flavor, "backprop network loaded");
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
