// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! YAML-backed simulation configuration, with documented defaults for
//! every field so a partial (or missing) config file is never fatal.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::network::NetworkConfig;

fn default_num_nodes() -> usize {
    4
}
fn default_max_blocks() -> u64 {
    5
}
fn default_min_delay() -> f64 {
    0.01
}
fn default_max_delay() -> f64 {
    0.1
}
fn default_gossip_k() -> usize {
    3
}

/// `simulation:` section: run-length and base network timing.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SimulationSection {
    /// Number of validator nodes to run.
    #[serde(default = "default_num_nodes")]
    pub num_nodes: usize,
    /// Stop the run once any node has finalized this many blocks.
    #[serde(default = "default_max_blocks")]
    pub max_blocks: u64,
    /// Minimum one-hop delivery delay.
    #[serde(default = "default_min_delay")]
    pub min_delay: f64,
    /// Maximum one-hop delivery delay.
    #[serde(default = "default_max_delay")]
    pub max_delay: f64,
    /// Reserved for a simulation-scoped drop rate; the network layer's
    /// own `network.drop_prob` governs actual message loss.
    #[serde(default)]
    pub drop_prob: f64,
    /// Reserved for a simulation-scoped duplication rate; the network
    /// layer's own `network.dup_prob` governs actual duplication.
    #[serde(default)]
    pub dup_prob: f64,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            num_nodes: default_num_nodes(),
            max_blocks: default_max_blocks(),
            min_delay: default_min_delay(),
            max_delay: default_max_delay(),
            drop_prob: 0.0,
            dup_prob: 0.0,
        }
    }
}

/// `network:` section: gossip fan-out and stochastic delivery behavior.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NetworkSection {
    /// Number of peers each gossip fan-out reaches.
    #[serde(default = "default_gossip_k")]
    pub gossip_k: usize,
    /// Minimum spacing enforced between two sends from the same node.
    #[serde(default)]
    pub min_send_interval: f64,
    /// Probability a send is dropped outright.
    #[serde(default)]
    pub drop_prob: f64,
    /// Probability a send is additionally duplicated.
    #[serde(default)]
    pub dup_prob: f64,
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            gossip_k: default_gossip_k(),
            min_send_interval: 0.0,
            drop_prob: 0.0,
            dup_prob: 0.0,
        }
    }
}

/// The full simulation configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SimConfig {
    /// Run-length and base timing parameters.
    #[serde(default)]
    pub simulation: SimulationSection,
    /// Gossip and stochastic delivery parameters.
    #[serde(default)]
    pub network: NetworkSection,
}

impl SimConfig {
    /// Load configuration from `path`. If the file does not exist, fall
    /// back to [`SimConfig::default()`] and let the caller log a warning.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Build the [`NetworkConfig`] the discrete-event network runs with,
    /// merging this config's `simulation` (timing) and `network` (gossip,
    /// loss) sections.
    pub fn network_config(&self) -> NetworkConfig {
        NetworkConfig {
            min_delay: self.simulation.min_delay,
            max_delay: self.simulation.max_delay,
            drop_prob: self.network.drop_prob,
            dup_prob: self.network.dup_prob,
            min_send_interval: self.network.min_send_interval,
            gossip_k: self.network.gossip_k,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_defaults() {
        let config = SimConfig::default();
        assert_eq!(config.simulation.num_nodes, 4);
        assert_eq!(config.simulation.max_blocks, 5);
        assert_eq!(config.network.gossip_k, 3);
    }

    #[test]
    fn partial_yaml_fills_in_missing_fields_with_defaults() {
        let yaml = "simulation:\n  num_nodes: 8\n";
        let config: SimConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.simulation.num_nodes, 8);
        assert_eq!(config.simulation.max_blocks, 5);
        assert_eq!(config.network.gossip_k, 3);
    }

    #[test]
    fn missing_file_surfaces_as_error_for_caller_to_fall_back_on() {
        let result = SimConfig::load(Path::new("/nonexistent/path/to/config.yaml"));
        assert!(result.is_err());
    }
}
