//! Concrete network architectures.
//!
//! Every architecture owns a [`Graph`](crate::graph::Graph) arena and
//! implements [`NeuralNetwork`](crate::NeuralNetwork):
//!
//! - [`AdalineNetwork`] - single threshold unit, Widrow-Hoff learning
//! - [`BackPropNetwork`] - layered sigmoid network, online / epoch / RPROP
//! - [`BamNetwork`] and [`BamSystem`] - bidirectional associative memories
//! - [`SelfOrganizingNetwork`] - Kohonen map
//!
//! # Examples
//!
//! ```
//! use neuronet::networks::BackPropNetwork;
//! use neuronet::NeuralNetwork;
//!
//! let net = BackPropNetwork::new_rprop(&[4, 6, 2], 0).unwrap();
//! assert_eq!(net.input_count(), 4);
//! assert_eq!(net.output_count(), 2);
//! ```

pub mod adaline;
pub mod backprop;
pub mod bam;
pub mod son;

pub use adaline::AdalineNetwork;
pub use backprop::{BackPropFlavor, BackPropNetwork};
pub use bam::{BamNetwork, BamSystem};
pub use son::{SelfOrganizingNetwork, SonParams};
