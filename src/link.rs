//! Link - a weighted directed edge between two nodes.
//!
//! Links store the indices of the nodes they connect; both are fixed when the
//! graph wires the link and never change afterwards. The [`LinkKind`] decides
//! how a weight delta proposed by a node's Learn is applied:
//!
//! - `Plain` - `weight += delta` immediately
//! - `Momentum` - `weight += delta + momentum * previous_delta`
//! - `Epoch` - deltas accumulate; `epoch(n)` applies the average with momentum
//! - `Rprop` - deltas accumulate; `epoch(n)` moves the weight by a per-link
//!   adaptive step driven only by the sign of the averaged delta

use crate::codec::{Decoder, Encoder};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Resilient propagation constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RpropParams {
    /// Initial step size
    pub eta_init: f64,
    /// Growth factor on consecutive same-sign deltas
    pub eta_plus: f64,
    /// Shrink factor on a sign reversal
    pub eta_minus: f64,
    /// Lower step bound
    pub eta_min: f64,
    /// Upper step bound
    pub eta_max: f64,
    /// Weight decay subtracted from the stored delta
    pub decay: f64,
}

impl Default for RpropParams {
    fn default() -> Self {
        Self {
            eta_init: 0.05,
            eta_plus: 1.2,
            eta_minus: 0.5,
            eta_min: 1.0e-6,
            eta_max: 50.0,
            decay: 0.0,
        }
    }
}

/// Per-link RPROP state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RpropState {
    pub delta: f64,
    pub accumulator: f64,
    pub eta: f64,
    pub params: RpropParams,
}

impl RpropState {
    pub fn new(params: RpropParams) -> Self {
        Self {
            delta: 0.0,
            accumulator: 0.0,
            eta: params.eta_init,
            params,
        }
    }
}

/// Closed set of weight update policies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LinkKind {
    Plain,
    Momentum { delta: f64 },
    Epoch { delta: f64, accumulator: f64 },
    Rprop(RpropState),
}

impl LinkKind {
    /// Bytes a link of this kind occupies in a saved stream.
    pub(crate) fn payload_len(&self) -> usize {
        let extra = match self {
            LinkKind::Plain => 0,
            LinkKind::Momentum { .. } => 1,
            LinkKind::Epoch { .. } => 2,
            LinkKind::Rprop(_) => 8,
        };
        8 * (1 + extra)
    }
}

/// A weighted edge `in_node -> out_node`.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub(crate) weight: f64,
    pub(crate) in_node: usize,
    pub(crate) out_node: usize,
    pub(crate) kind: LinkKind,
}

/// Sign of `x`, with zero mapping to zero.
#[inline]
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

impl Link {
    pub(crate) fn new(in_node: usize, out_node: usize, weight: f64, kind: LinkKind) -> Self {
        Self {
            weight,
            in_node,
            out_node,
            kind,
        }
    }

    #[inline]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    #[inline]
    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    #[inline]
    pub fn in_node(&self) -> usize {
        self.in_node
    }

    #[inline]
    pub fn out_node(&self) -> usize {
        self.out_node
    }

    #[inline]
    pub fn kind(&self) -> &LinkKind {
        &self.kind
    }

    /// Delta applied by the previous update (0 for plain links).
    pub fn previous_delta(&self) -> f64 {
        match self.kind {
            LinkKind::Plain => 0.0,
            LinkKind::Momentum { delta } | LinkKind::Epoch { delta, .. } => delta,
            LinkKind::Rprop(state) => state.delta,
        }
    }

    /// Pending accumulated delta of epoch-style links.
    pub fn accumulator(&self) -> f64 {
        match self.kind {
            LinkKind::Epoch { accumulator, .. } => accumulator,
            LinkKind::Rprop(state) => state.accumulator,
            _ => 0.0,
        }
    }

    /// Current RPROP step size.
    pub fn eta(&self) -> Option<f64> {
        match self.kind {
            LinkKind::Rprop(state) => Some(state.eta),
            _ => None,
        }
    }

    /// Apply (or, for epoch-style links, accumulate) a weight delta.
    ///
    /// `momentum` is the momentum of the node this link feeds.
    pub fn update_weight(&mut self, delta: f64, momentum: f64) {
        match &mut self.kind {
            LinkKind::Plain => self.weight += delta,
            LinkKind::Momentum { delta: previous } => {
                self.weight = self.weight + delta + momentum * *previous;
                *previous = delta;
            }
            LinkKind::Epoch { accumulator, .. } => *accumulator += delta,
            LinkKind::Rprop(state) => state.accumulator += delta,
        }
    }

    /// Commit the deltas accumulated over `pattern_count` patterns.
    ///
    /// A no-op for links that apply deltas immediately, and for an empty epoch.
    pub fn epoch(&mut self, pattern_count: usize, momentum: f64) {
        if pattern_count == 0 {
            return;
        }
        let n = pattern_count as f64;
        match &mut self.kind {
            LinkKind::Plain | LinkKind::Momentum { .. } => {}
            LinkKind::Epoch {
                delta: previous,
                accumulator,
            } => {
                let delta = *accumulator / n;
                self.weight = self.weight + delta + momentum * *previous;
                *previous = delta;
                *accumulator = 0.0;
            }
            LinkKind::Rprop(state) => {
                let mut delta = -state.accumulator / n;
                let product = state.delta * delta;
                let direction = sign(delta);
                delta -= state.params.decay * self.weight;
                if product >= 0.0 {
                    if product > 0.0 {
                        state.eta = (state.eta * state.params.eta_plus).min(state.params.eta_max);
                    }
                    self.weight -= direction * state.eta;
                    state.delta = delta;
                } else if product < 0.0 {
                    state.eta = (state.eta * state.params.eta_minus).max(state.params.eta_min);
                    state.delta = 0.0;
                }
                state.accumulator = 0.0;
            }
        }
    }

    pub(crate) fn encode(&self, enc: &mut Encoder<'_>) -> Result<()> {
        enc.write_f64(self.weight)?;
        match self.kind {
            LinkKind::Plain => {}
            LinkKind::Momentum { delta } => enc.write_f64(delta)?,
            LinkKind::Epoch { delta, accumulator } => {
                enc.write_f64(delta)?;
                enc.write_f64(accumulator)?;
            }
            LinkKind::Rprop(state) => {
                enc.write_f64(state.delta)?;
                enc.write_f64(state.accumulator)?;
                enc.write_f64(state.eta)?;
                enc.write_f64(state.params.eta_plus)?;
                enc.write_f64(state.params.eta_minus)?;
                enc.write_f64(state.params.eta_min)?;
                enc.write_f64(state.params.eta_max)?;
                enc.write_f64(state.params.decay)?;
            }
        }
        Ok(())
    }

    pub(crate) fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        self.weight = dec.read_f64()?;
        match &mut self.kind {
            LinkKind::Plain => {}
            LinkKind::Momentum { delta } => *delta = dec.read_f64()?,
            LinkKind::Epoch { delta, accumulator } => {
                *delta = dec.read_f64()?;
                *accumulator = dec.read_f64()?;
            }
            LinkKind::Rprop(state) => {
                state.delta = dec.read_f64()?;
                state.accumulator = dec.read_f64()?;
                state.eta = dec.read_f64()?;
                state.params.eta_plus = dec.read_f64()?;
                state.params.eta_minus = dec.read_f64()?;
                state.params.eta_min = dec.read_f64()?;
                state.params.eta_max = dec.read_f64()?;
                state.params.decay = dec.read_f64()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rprop_link(weight: f64) -> Link {
        Link::new(0, 1, weight, LinkKind::Rprop(RpropState::new(RpropParams::default())))
    }

    #[test]
    fn test_plain_update() {
        let mut link = Link::new(0, 1, 0.5, LinkKind::Plain);
        link.update_weight(0.25, 0.9);
        assert_eq!(link.weight(), 0.75);
    }

    #[test]
    fn test_momentum_update() {
        let mut link = Link::new(0, 1, 0.0, LinkKind::Momentum { delta: 0.0 });
        link.update_weight(0.1, 0.5);
        assert_relative_eq!(link.weight(), 0.1);
        link.update_weight(0.2, 0.5);
        // 0.1 + 0.2 + 0.5 * 0.1
        assert_relative_eq!(link.weight(), 0.35);
        assert_eq!(link.previous_delta(), 0.2);
    }

    #[test]
    fn test_epoch_defers_weight_change() {
        let mut link = Link::new(
            0,
            1,
            1.0,
            LinkKind::Epoch {
                delta: 0.0,
                accumulator: 0.0,
            },
        );
        link.update_weight(0.2, 0.5);
        link.update_weight(0.4, 0.5);
        assert_eq!(link.weight(), 1.0);
        assert_relative_eq!(link.accumulator(), 0.6);

        link.epoch(2, 0.5);
        assert_relative_eq!(link.weight(), 1.3);
        assert_relative_eq!(link.previous_delta(), 0.3);
        assert_eq!(link.accumulator(), 0.0);

        link.update_weight(0.1, 0.5);
        link.epoch(1, 0.5);
        // 1.3 + 0.1 + 0.5 * 0.3
        assert_relative_eq!(link.weight(), 1.55);
    }

    #[test]
    fn test_empty_epoch_is_noop() {
        let mut link = Link::new(
            0,
            1,
            1.0,
            LinkKind::Epoch {
                delta: 0.0,
                accumulator: 0.5,
            },
        );
        link.epoch(0, 0.0);
        assert_eq!(link.weight(), 1.0);
        assert_eq!(link.accumulator(), 0.5);
    }

    #[test]
    fn test_rprop_first_step_moves_without_growth() {
        let mut link = rprop_link(0.0);
        link.update_weight(1.0, 0.0);
        link.epoch(1, 0.0);

        // delta = -1, sign -1: weight -= -1 * 0.05
        assert_relative_eq!(link.weight(), 0.05);
        assert_relative_eq!(link.eta().unwrap(), 0.05);
        assert_eq!(link.previous_delta(), -1.0);
        assert_eq!(link.accumulator(), 0.0);
    }

    #[test]
    fn test_rprop_same_sign_grows_step() {
        let mut link = rprop_link(0.0);
        link.update_weight(1.0, 0.0);
        link.epoch(1, 0.0);
        let eta_before = link.eta().unwrap();

        link.update_weight(2.0, 0.0);
        link.epoch(1, 0.0);
        let eta_after = link.eta().unwrap();
        assert!(eta_after > eta_before);
        assert_relative_eq!(eta_after, 0.06);
        assert_relative_eq!(link.weight(), 0.11);
    }

    #[test]
    fn test_rprop_reversal_shrinks_step_and_holds_weight() {
        let mut link = rprop_link(0.0);
        link.update_weight(1.0, 0.0);
        link.epoch(1, 0.0);
        let weight_before = link.weight();
        let eta_before = link.eta().unwrap();

        link.update_weight(-1.0, 0.0);
        link.epoch(1, 0.0);
        assert!(link.eta().unwrap() < eta_before);
        assert_relative_eq!(link.eta().unwrap(), 0.025);
        assert_eq!(link.weight(), weight_before);
        assert_eq!(link.previous_delta(), 0.0);
    }

    #[test]
    fn test_rprop_step_bounds() {
        let params = RpropParams {
            eta_init: 40.0,
            ..RpropParams::default()
        };
        let mut link = Link::new(0, 1, 0.0, LinkKind::Rprop(RpropState::new(params)));
        for _ in 0..5 {
            link.update_weight(1.0, 0.0);
            link.epoch(1, 0.0);
        }
        assert_eq!(link.eta().unwrap(), 50.0);

        let params = RpropParams {
            eta_init: 2.0e-6,
            ..RpropParams::default()
        };
        let mut link = Link::new(0, 1, 0.0, LinkKind::Rprop(RpropState::new(params)));
        let mut sign = 1.0;
        for _ in 0..6 {
            link.update_weight(sign, 0.0);
            link.epoch(1, 0.0);
            sign = -sign;
        }
        assert_eq!(link.eta().unwrap(), 1.0e-6);
    }
}
