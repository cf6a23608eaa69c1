//! Neuronet - Classical Neural Network Engine
//!
//! Neuronet implements the textbook neural network architectures as an
//! explicit node-and-link computational graph with per-node local update
//! rules. There is no tensor layer and no automatic differentiation; every
//! weight change is the result of a node's own learning rule applied to its
//! incoming links.
//!
//! # Architectures
//!
//! - **Adaline**: single linear threshold unit trained with the Widrow-Hoff rule
//! - **Backpropagation**: layered sigmoid network, trained per pattern with
//!   momentum, per sweep (epoch), or with resilient propagation (RPROP)
//! - **BAM**: bidirectional associative memory, plus a BAM system that shards
//!   associations across as many memories as it needs
//! - **Self-Organizing Map**: Kohonen grid with a shrinking neighborhood
//!
//! # Architecture
//!
//! - **Graph**: flat node and link arrays, links address nodes by index
//! - **Node / Link**: closed variant sets deciding activation, learning and
//!   weight update policy
//! - **NeuralNetwork**: the capability trait every architecture implements
//!   (run, learn, epoch, train, save, load)
//! - **Pattern / PatternSet**: the training and inference data contract
//! - **Persistence**: a flat little-endian binary format led by a type tag
//!
//! # Examples
//!
//! ## Training XOR with backpropagation
//!
//! ```
//! use neuronet::networks::BackPropNetwork;
//! use neuronet::{NeuralNetwork, Pattern, PatternSet, TrainOptions};
//!
//! let mut xor = PatternSet::new();
//! for (a, b) in [(0.0, 0.0), (0.0, 1.0), (1.0, 0.0), (1.0, 1.0)] {
//!     let target = if a != b { 1.0 } else { 0.0 };
//!     xor.push(Pattern::new(vec![a, b], vec![target])).unwrap();
//! }
//!
//! let mut net = BackPropNetwork::new(&[2, 3, 1], 0.55, 0.6, 1).unwrap();
//! let options = TrainOptions::new().with_max_sweeps(100);
//! let report = net.train_with(&xor, &options).unwrap();
//! assert!(report.sweeps <= 100);
//! ```
//!
//! ## Saving and loading
//!
//! ```
//! use neuronet::networks::AdalineNetwork;
//! use neuronet::{config, NeuralNetwork};
//!
//! let net = AdalineNetwork::new(4, 0.1, 42).unwrap();
//! let mut bytes = Vec::new();
//! net.save(&mut bytes).unwrap();
//!
//! let restored = config::load_network(&mut &bytes[..]).unwrap();
//! assert_eq!(restored.input_count(), 4);
//! ```
//!
//! # Logging
//!
//! The engine reports construction, persistence and training progress through
//! `tracing`. It never installs a subscriber; that is up to the application.

pub mod codec;
pub mod config;
pub mod error;
pub mod graph;
pub mod link;
pub mod network;
pub mod networks;
pub mod node;
pub mod pattern;
pub mod training;
pub mod utils;

// Re-exports for convenient access
pub use codec::NetworkType;
pub use config::{load_network, load_network_from_file, NetworkConfig};
pub use error::{NeuroError, Result};
pub use graph::Graph;
pub use link::{Link, LinkKind, RpropParams};
pub use network::NeuralNetwork;
pub use node::{Node, NodeKind};
pub use pattern::{Pattern, PatternSet};
pub use training::{StopFlag, TrainOptions, TrainReport};

pub use networks::{
    AdalineNetwork, BackPropFlavor, BackPropNetwork, BamNetwork, BamSystem, SelfOrganizingNetwork,
    SonParams,
};
