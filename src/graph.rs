//! Graph - the node/link arena shared by every network architecture.
//!
//! Nodes and links live in two flat arrays owned by the graph. A link stores
//! the indices of the nodes it connects, and each node stores the indices of
//! its incoming and outgoing links, so the two views of an edge always agree.
//! Arrays are filled once during topology construction and never shrink.
//!
//! Run and Learn are dispatched here rather than on `Node` because both read
//! neighboring nodes and write link weights.
//!
//! # Examples
//!
//! ```
//! use neuronet::graph::Graph;
//! use neuronet::link::LinkKind;
//! use neuronet::node::{Node, NodeKind};
//!
//! let mut graph = Graph::new();
//! let a = graph.add_node(Node::new(NodeKind::Input));
//! let b = graph.add_node(Node::new(NodeKind::Adaline { learning_rate: 0.1 }));
//! let link = graph.link_to(a, b, 0.5, LinkKind::Plain);
//!
//! graph.node_mut(a).set_value(-1.0);
//! graph.run_node(b);
//! assert_eq!(graph.node(b).value(), -1.0);
//! assert_eq!(graph.link(link).in_node(), a);
//! ```

use crate::codec::{Decoder, Encoder};
use crate::error::{NeuroError, Result};
use crate::link::{Link, LinkKind};
use crate::node::{Node, NodeKind};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    nodes: Vec<Node>,
    links: Vec<Link>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(nodes: usize, links: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(nodes),
            links: Vec::with_capacity(links),
        }
    }

    /// Append a node and return its index.
    pub fn add_node(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Wire a new link `from -> to` and return its index.
    ///
    /// # Panics
    ///
    /// Panics if either node index is out of bounds. Topology builders only
    /// pass indices they just created.
    pub fn link_to(&mut self, from: usize, to: usize, weight: f64, kind: LinkKind) -> usize {
        let index = self.links.len();
        self.links.push(Link::new(from, to, weight, kind));
        self.nodes[from].out_links.push(index);
        self.nodes[to].in_links.push(index);
        index
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[inline]
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    #[inline]
    pub fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    #[inline]
    pub fn node_mut(&mut self, index: usize) -> &mut Node {
        &mut self.nodes[index]
    }

    #[inline]
    pub fn link(&self, index: usize) -> &Link {
        &self.links[index]
    }

    #[inline]
    pub fn link_mut(&mut self, index: usize) -> &mut Link {
        &mut self.links[index]
    }

    /// Weighted sum of upstream values over the node's incoming links.
    fn weighted_in_value(&self, index: usize) -> f64 {
        self.nodes[index]
            .in_links
            .iter()
            .map(|&l| {
                let link = &self.links[l];
                link.weight * self.nodes[link.in_node].value
            })
            .sum()
    }

    /// Weighted sum of downstream values over the node's outgoing links.
    fn weighted_out_value(&self, index: usize) -> f64 {
        self.nodes[index]
            .out_links
            .iter()
            .map(|&l| {
                let link = &self.links[l];
                link.weight * self.nodes[link.out_node].value
            })
            .sum()
    }

    /// Weighted sum of downstream errors over the node's outgoing links.
    fn weighted_out_error(&self, index: usize) -> f64 {
        self.nodes[index]
            .out_links
            .iter()
            .map(|&l| {
                let link = &self.links[l];
                link.weight * self.nodes[link.out_node].error
            })
            .sum()
    }

    /// Forward step of a single node.
    pub fn run_node(&mut self, index: usize) {
        let kind = self.nodes[index].kind;
        match kind {
            NodeKind::Input | NodeKind::Bias => {}
            NodeKind::Adaline { .. }
            | NodeKind::BackPropOutput { .. }
            | NodeKind::BackPropMiddle { .. } => {
                let total = self.weighted_in_value(index);
                self.nodes[index].value = kind.transfer(total);
            }
            NodeKind::BamOutput { .. } => {
                let total = self.weighted_in_value(index);
                let node = &mut self.nodes[index];
                node.remember_value();
                node.set_value(kind.transfer(total));
            }
            NodeKind::BamInput { .. } => {
                // Runs backwards; error keeps the presented pattern.
                let total = self.weighted_out_value(index);
                let node = &mut self.nodes[index];
                node.remember_value();
                node.value = kind.transfer(total);
            }
            NodeKind::SelfOrganizing { .. } => {
                let total: f64 = self.nodes[index]
                    .in_links
                    .iter()
                    .map(|&l| {
                        let link = &self.links[l];
                        let d = self.nodes[link.in_node].value - link.weight;
                        d * d
                    })
                    .sum();
                self.nodes[index].value = total.sqrt();
            }
        }
    }

    /// Local learning rule of a single node.
    pub fn learn_node(&mut self, index: usize) {
        match self.nodes[index].kind {
            NodeKind::Input | NodeKind::Bias | NodeKind::BamInput { .. } => {}
            NodeKind::Adaline { learning_rate } => {
                let error = self.nodes[index].value * -2.0;
                self.nodes[index].error = error;
                self.update_in_links(index, |input, _| learning_rate * input * error);
            }
            NodeKind::BackPropOutput { learning_rate, .. } => {
                let node = &mut self.nodes[index];
                let v = node.value;
                let error = v * (1.0 - v) * (node.error - v);
                node.error = error;
                self.update_in_links(index, |input, _| learning_rate * error * input);
            }
            NodeKind::BackPropMiddle { learning_rate, .. } => {
                let v = self.nodes[index].value;
                let error = v * (1.0 - v) * self.weighted_out_error(index);
                self.nodes[index].error = error;
                self.update_in_links(index, |input, _| learning_rate * error * input);
            }
            NodeKind::SelfOrganizing { learning_rate } => {
                self.update_in_links(index, |input, weight| learning_rate * (input - weight));
            }
            NodeKind::BamOutput { .. } => {
                let out = self.nodes[index].value;
                self.update_in_links(index, |input, _| input * out);
            }
        }
    }

    /// Apply `delta(in_value, weight)` to every incoming link of `index`.
    fn update_in_links<F>(&mut self, index: usize, delta: F)
    where
        F: Fn(f64, f64) -> f64,
    {
        let momentum = self.nodes[index].momentum();
        for k in 0..self.nodes[index].in_links.len() {
            let l = self.nodes[index].in_links[k];
            let input = self.nodes[self.links[l].in_node].value;
            let d = delta(input, self.links[l].weight);
            self.links[l].update_weight(d, momentum);
        }
    }

    /// Commit accumulated deltas on every link.
    pub fn epoch(&mut self, pattern_count: usize) {
        let Self { nodes, links } = self;
        for link in links.iter_mut() {
            let momentum = nodes[link.out_node].momentum();
            link.epoch(pattern_count, momentum);
        }
    }

    /// Write `nodesCount`, `linksCount`.
    pub(crate) fn encode_counts(&self, enc: &mut Encoder<'_>) -> Result<()> {
        enc.write_count(self.nodes.len())?;
        enc.write_count(self.links.len())
    }

    /// Write every node payload, then every link payload.
    pub(crate) fn encode_payloads(&self, enc: &mut Encoder<'_>) -> Result<()> {
        for node in &self.nodes {
            node.encode(enc)?;
        }
        for link in &self.links {
            link.encode(enc)?;
        }
        Ok(())
    }

    /// Read payloads into the existing topology, in construction order.
    pub(crate) fn decode_payloads(&mut self, block: &[u8]) -> Result<()> {
        let mut reader = block;
        let mut dec = Decoder::new(&mut reader);
        for node in self.nodes.iter_mut() {
            node.decode(&mut dec)?;
        }
        for link in self.links.iter_mut() {
            link.decode(&mut dec)?;
        }
        Ok(())
    }
}

/// Node and link totals a stored prefix implies, with the size of their
/// payloads. Built with checked arithmetic so a corrupt prefix is caught
/// before any topology is allocated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Layout {
    nodes: usize,
    links: usize,
    bytes: usize,
}

impl Layout {
    /// Add `count` nodes of `kind`; `None` on overflow.
    pub(crate) fn with_nodes(self, count: usize, kind: &NodeKind) -> Option<Self> {
        Some(Self {
            nodes: self.nodes.checked_add(count)?,
            bytes: self
                .bytes
                .checked_add(count.checked_mul(kind.payload_len())?)?,
            ..self
        })
    }

    /// Add `count` links of `kind`; `None` on overflow.
    pub(crate) fn with_links(self, count: usize, kind: &LinkKind) -> Option<Self> {
        Some(Self {
            links: self.links.checked_add(count)?,
            bytes: self
                .bytes
                .checked_add(count.checked_mul(kind.payload_len())?)?,
            ..self
        })
    }

    /// Check the stored counts against this layout, then read the payload
    /// block they describe. `layout` is `None` when the prefix overflowed.
    pub(crate) fn read_payloads(
        layout: Option<Self>,
        nodes: usize,
        links: usize,
        dec: &mut Decoder<'_>,
    ) -> Result<Vec<u8>> {
        let layout = layout.ok_or_else(|| {
            NeuroError::InvalidFormat("stored topology sizes overflow".into())
        })?;
        if nodes != layout.nodes || links != layout.links {
            return Err(NeuroError::InvalidFormat(format!(
                "stored counts ({} nodes, {} links) do not match topology ({} nodes, {} links)",
                nodes, links, layout.nodes, layout.links
            )));
        }
        dec.read_block(layout.bytes)
    }
}
