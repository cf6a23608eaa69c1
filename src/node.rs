//! Node - a vertex of the network graph.
//!
//! A node holds a scalar `value` and a scalar `error` plus index lists into
//! its owning [`Graph`](crate::graph::Graph)'s link array for incoming and
//! outgoing edges. What a node does on Run and Learn is decided by its
//! [`NodeKind`], a closed set of variants dispatched by the graph.
//!
//! # Variants
//!
//! - `Input` - value is set by the caller, Run is a no-op
//! - `Bias` - constant value, external writes are ignored
//! - `Adaline` - hard threshold activation, Widrow-Hoff style learning
//! - `BackPropOutput` / `BackPropMiddle` - sigmoid activation, backpropagation
//! - `SelfOrganizing` - euclidean distance to the weight vector
//! - `BamInput` / `BamOutput` - bistable threshold nodes of a BAM network

use crate::codec::{Decoder, Encoder};
use crate::error::Result;

/// Closed set of node behaviors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeKind {
    Input,
    Bias,
    Adaline {
        learning_rate: f64,
    },
    BackPropOutput {
        learning_rate: f64,
        momentum: f64,
    },
    BackPropMiddle {
        learning_rate: f64,
        momentum: f64,
    },
    SelfOrganizing {
        learning_rate: f64,
    },
    /// Input side of a BAM. Runs backwards through its outgoing links.
    BamInput {
        last_value: f64,
    },
    BamOutput {
        last_value: f64,
    },
}

impl NodeKind {
    /// Activation applied to the weighted input sum.
    #[inline]
    pub fn transfer(&self, x: f64) -> f64 {
        match self {
            NodeKind::Adaline { .. } | NodeKind::BamInput { .. } | NodeKind::BamOutput { .. } => {
                threshold(x)
            }
            NodeKind::BackPropOutput { .. } | NodeKind::BackPropMiddle { .. } => sigmoid(x),
            NodeKind::Input | NodeKind::Bias | NodeKind::SelfOrganizing { .. } => x,
        }
    }

    /// Bytes a node of this kind occupies in a saved stream.
    pub(crate) fn payload_len(&self) -> usize {
        let extra = match self {
            NodeKind::BackPropOutput { .. } | NodeKind::BackPropMiddle { .. } => 2,
            NodeKind::BamInput { .. } | NodeKind::BamOutput { .. } => 1,
            _ => 0,
        };
        8 * (2 + extra)
    }
}

/// Hard threshold: -1 below zero, 1 otherwise.
#[inline]
pub fn threshold(x: f64) -> f64 {
    if x < 0.0 {
        -1.0
    } else {
        1.0
    }
}

#[inline]
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// A graph vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) value: f64,
    pub(crate) error: f64,
    pub(crate) in_links: Vec<usize>,
    pub(crate) out_links: Vec<usize>,
    pub(crate) kind: NodeKind,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            value: 0.0,
            error: 0.0,
            in_links: Vec::new(),
            out_links: Vec::new(),
            kind,
        }
    }

    /// A bias node pinned to `value`.
    pub fn bias(value: f64) -> Self {
        Self {
            value,
            ..Self::new(NodeKind::Bias)
        }
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    #[inline]
    pub fn error(&self) -> f64 {
        self.error
    }

    #[inline]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Indices of incoming links in the owning graph.
    #[inline]
    pub fn in_links(&self) -> &[usize] {
        &self.in_links
    }

    /// Indices of outgoing links in the owning graph.
    #[inline]
    pub fn out_links(&self) -> &[usize] {
        &self.out_links
    }

    /// Set the node value.
    ///
    /// Bias nodes ignore the write. BAM nodes mirror the value into `error`,
    /// which is how a BAM remembers the pattern it was presented with.
    pub fn set_value(&mut self, value: f64) {
        match self.kind {
            NodeKind::Bias => {}
            NodeKind::BamInput { .. } | NodeKind::BamOutput { .. } => {
                self.value = value;
                self.error = value;
            }
            _ => self.value = value,
        }
    }

    #[inline]
    pub fn set_error(&mut self, error: f64) {
        self.error = error;
    }

    /// Learning rate for kinds that carry one.
    pub fn learning_rate(&self) -> Option<f64> {
        match self.kind {
            NodeKind::Adaline { learning_rate }
            | NodeKind::SelfOrganizing { learning_rate }
            | NodeKind::BackPropOutput { learning_rate, .. }
            | NodeKind::BackPropMiddle { learning_rate, .. } => Some(learning_rate),
            _ => None,
        }
    }

    pub fn set_learning_rate(&mut self, rate: f64) {
        match &mut self.kind {
            NodeKind::Adaline { learning_rate }
            | NodeKind::SelfOrganizing { learning_rate }
            | NodeKind::BackPropOutput { learning_rate, .. }
            | NodeKind::BackPropMiddle { learning_rate, .. } => *learning_rate = rate,
            _ => {}
        }
    }

    /// Momentum applied by links feeding this node (0 for non-backprop kinds).
    pub fn momentum(&self) -> f64 {
        match self.kind {
            NodeKind::BackPropOutput { momentum, .. } | NodeKind::BackPropMiddle { momentum, .. } => {
                momentum
            }
            _ => 0.0,
        }
    }

    /// Value before the most recent Run (BAM nodes only).
    pub fn last_value(&self) -> Option<f64> {
        match self.kind {
            NodeKind::BamInput { last_value } | NodeKind::BamOutput { last_value } => {
                Some(last_value)
            }
            _ => None,
        }
    }

    pub(crate) fn remember_value(&mut self) {
        let current = self.value;
        if let NodeKind::BamInput { last_value } | NodeKind::BamOutput { last_value } =
            &mut self.kind
        {
            *last_value = current;
        }
    }

    pub(crate) fn encode(&self, enc: &mut Encoder<'_>) -> Result<()> {
        enc.write_f64(self.value)?;
        enc.write_f64(self.error)?;
        match self.kind {
            NodeKind::BackPropOutput {
                learning_rate,
                momentum,
            }
            | NodeKind::BackPropMiddle {
                learning_rate,
                momentum,
            } => {
                enc.write_f64(momentum)?;
                enc.write_f64(learning_rate)?;
            }
            NodeKind::BamInput { last_value } | NodeKind::BamOutput { last_value } => {
                enc.write_f64(last_value)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Read this node's payload; the kind itself comes from the topology.
    pub(crate) fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        self.value = dec.read_f64()?;
        self.error = dec.read_f64()?;
        match &mut self.kind {
            NodeKind::BackPropOutput {
                learning_rate,
                momentum,
            }
            | NodeKind::BackPropMiddle {
                learning_rate,
                momentum,
            } => {
                *momentum = dec.read_f64()?;
                *learning_rate = dec.read_f64()?;
            }
            NodeKind::BamInput { last_value } | NodeKind::BamOutput { last_value } => {
                *last_value = dec.read_f64()?;
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bias_rejects_writes() {
        let mut node = Node::bias(1.0);
        node.set_value(0.25);
        assert_eq!(node.value(), 1.0);
    }

    #[test]
    fn test_bam_value_mirrors_error() {
        let mut node = Node::new(NodeKind::BamOutput { last_value: 0.0 });
        node.set_value(-1.0);
        assert_eq!(node.error(), -1.0);

        node.remember_value();
        node.set_value(1.0);
        assert_eq!(node.last_value(), Some(-1.0));
    }

    #[test]
    fn test_transfer() {
        let adaline = NodeKind::Adaline { learning_rate: 0.1 };
        assert_eq!(adaline.transfer(-0.5), -1.0);
        assert_eq!(adaline.transfer(0.0), 1.0);

        let sig = NodeKind::BackPropOutput {
            learning_rate: 0.5,
            momentum: 0.0,
        };
        assert_eq!(sig.transfer(0.0), 0.5);
        assert!(sig.transfer(10.0) > 0.99);
    }

    #[test]
    fn test_learning_rate_access() {
        let mut node = Node::new(NodeKind::SelfOrganizing { learning_rate: 0.5 });
        node.set_learning_rate(0.1);
        assert_eq!(node.learning_rate(), Some(0.1));
        assert_eq!(Node::new(NodeKind::Input).learning_rate(), None);
    }
}
