//! Network configuration and tag-dispatching load.
//!
//! [`NetworkConfig`] captures every constructor parameter needed to create a
//! network, seed included, so a configuration always builds the same initial
//! weights. Configurations serialize to JSON (readable, hand-editable) or to
//! bincode (compact).
//!
//! [`load_network`] reads a persisted network of any type: it inspects the
//! leading type tag and decodes the matching architecture.
//!
//! # Example
//!
//! ```
//! use neuronet::config::NetworkConfig;
//! use neuronet::networks::BackPropFlavor;
//!
//! let config = NetworkConfig::BackProp {
//!     layers: vec![2, 3, 1],
//!     learning_rate: 0.55,
//!     momentum: 0.6,
//!     flavor: BackPropFlavor::Online,
//!     seed: 0,
//! };
//! let json = config.to_json().unwrap();
//! assert_eq!(NetworkConfig::from_json(&json).unwrap(), config);
//!
//! let net = config.build().unwrap();
//! assert_eq!(net.input_count(), 2);
//! ```

use crate::codec::{Decoder, NetworkType};
use crate::error::Result;
use crate::network::NeuralNetwork;
use crate::networks::{
    AdalineNetwork, BackPropFlavor, BackPropNetwork, BamNetwork, BamSystem, SelfOrganizingNetwork,
    SonParams,
};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Constructor parameters of one network.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum NetworkConfig {
    Adaline {
        inputs: usize,
        learning_rate: f64,
        seed: u64,
    },

    /// Any backprop flavor; RPROP ignores `learning_rate` and `momentum`.
    BackProp {
        layers: Vec<usize>,
        learning_rate: f64,
        momentum: f64,
        flavor: BackPropFlavor,
        seed: u64,
    },

    SelfOrganizing {
        params: SonParams,
        seed: u64,
    },

    /// BAM weights start at zero, no seed needed.
    Bam { inputs: usize, outputs: usize },

    BamSystem { inputs: usize, outputs: usize },
}

impl NetworkConfig {
    /// Type tag of the network this configuration builds.
    pub fn network_type(&self) -> NetworkType {
        match self {
            NetworkConfig::Adaline { .. } => NetworkType::Adaline,
            NetworkConfig::BackProp { flavor, .. } => flavor.network_type(),
            NetworkConfig::SelfOrganizing { .. } => NetworkType::SelfOrganizing,
            NetworkConfig::Bam { .. } => NetworkType::Bam,
            NetworkConfig::BamSystem { .. } => NetworkType::BamSystem,
        }
    }

    /// Create the configured network.
    pub fn build(&self) -> Result<Box<dyn NeuralNetwork>> {
        debug!(network = ?self.network_type(), "building network from config");
        let network: Box<dyn NeuralNetwork> = match self {
            NetworkConfig::Adaline {
                inputs,
                learning_rate,
                seed,
            } => Box::new(AdalineNetwork::new(*inputs, *learning_rate, *seed)?),
            NetworkConfig::BackProp {
                layers,
                learning_rate,
                momentum,
                flavor,
                seed,
            } => {
                let net = match flavor {
                    BackPropFlavor::Rprop => BackPropNetwork::new_rprop(layers, *seed)?,
                    _ => BackPropNetwork::with_flavor(
                        layers,
                        *learning_rate,
                        *momentum,
                        *flavor,
                        *seed,
                    )?,
                };
                Box::new(net)
            }
            NetworkConfig::SelfOrganizing { params, seed } => {
                Box::new(SelfOrganizingNetwork::new(*params, *seed)?)
            }
            NetworkConfig::Bam { inputs, outputs } => Box::new(BamNetwork::new(*inputs, *outputs)?),
            NetworkConfig::BamSystem { inputs, outputs } => {
                Box::new(BamSystem::new(*inputs, *outputs)?)
            }
        };
        Ok(network)
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to binary (bincode).
    pub fn to_binary(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from binary (bincode).
    pub fn from_binary(data: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(data)?)
    }
}

/// Read a persisted network of whatever type its tag names.
pub fn load_network(reader: &mut dyn Read) -> Result<Box<dyn NeuralNetwork>> {
    let mut dec = Decoder::new(reader);
    let network_type = dec.read_network_type()?;
    let network: Box<dyn NeuralNetwork> = match network_type {
        NetworkType::Adaline => Box::new(AdalineNetwork::decode_body(&mut dec)?),
        NetworkType::BackProp => {
            Box::new(BackPropNetwork::decode_body(&mut dec, BackPropFlavor::Online)?)
        }
        NetworkType::EpochBackProp => {
            Box::new(BackPropNetwork::decode_body(&mut dec, BackPropFlavor::Epoch)?)
        }
        NetworkType::RpropBackProp => {
            Box::new(BackPropNetwork::decode_body(&mut dec, BackPropFlavor::Rprop)?)
        }
        NetworkType::SelfOrganizing => Box::new(SelfOrganizingNetwork::decode_body(&mut dec)?),
        NetworkType::Bam => Box::new(BamNetwork::decode_body(&mut dec)?),
        NetworkType::BamSystem => Box::new(BamSystem::decode_body(&mut dec)?),
    };
    debug!(?network_type, "network loaded");
    Ok(network)
}

pub fn load_network_from_file(path: &Path) -> Result<Box<dyn NeuralNetwork>> {
    let mut reader = BufReader::new(File::open(path)?);
    load_network(&mut reader)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_type() {
        let config = NetworkConfig::BackProp {
            layers: vec![2, 1],
            learning_rate: 0.5,
            momentum: 0.0,
            flavor: BackPropFlavor::Epoch,
            seed: 0,
        };
        assert_eq!(config.network_type(), NetworkType::EpochBackProp);
        assert_eq!(config.build().unwrap().network_type(), NetworkType::EpochBackProp);
    }

    #[test]
    fn test_binary_roundtrip() {
        let config = NetworkConfig::Bam {
            inputs: 6,
            outputs: 3,
        };
        let bytes = config.to_binary().unwrap();
        assert_eq!(NetworkConfig::from_binary(&bytes).unwrap(), config);
    }

    #[test]
    fn test_invalid_config_fails_to_build() {
        let config = NetworkConfig::Adaline {
            inputs: 0,
            learning_rate: 0.1,
            seed: 0,
        };
        assert!(config.build().is_err());
    }
}
