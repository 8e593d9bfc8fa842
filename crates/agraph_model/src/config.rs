// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph description and tree configuration.
//!
//! Configuration is stored as RON, matching the editor project files.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of graph shared by a root and all of its subgraphs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphDesc {
    /// Edges have a tail and a head
    pub directed: bool,
    /// At most one edge per endpoint pair
    pub strict: bool,
    /// Reject edges from a node to itself
    pub no_loop: bool,
}

impl GraphDesc {
    /// Directed, non-strict graph
    pub const DIRECTED: Self = Self {
        directed: true,
        strict: false,
        no_loop: false,
    };

    /// Undirected, non-strict graph
    pub const UNDIRECTED: Self = Self {
        directed: false,
        strict: false,
        no_loop: false,
    };

    /// Make the description strict
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Disallow self-loops
    pub fn no_loop(mut self) -> Self {
        self.no_loop = true;
        self
    }
}

impl Default for GraphDesc {
    fn default() -> Self {
        Self::DIRECTED
    }
}

/// Settings used when opening a tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Description shared by every graph in the tree
    pub desc: GraphDesc,
    /// Whether lifecycle events reach disciplines immediately
    pub callbacks_enabled: bool,
    /// Whether unnamed objects get ids from the default namespace
    pub anonymous_ids: bool,
}

impl TreeConfig {
    /// Config with the given description and default flags
    pub fn new(desc: GraphDesc) -> Self {
        Self {
            desc,
            ..Self::default()
        }
    }

    /// Parse a config from RON
    pub fn from_ron_str(s: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(s)?)
    }

    /// Serialize the config as pretty RON
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            desc: GraphDesc::default(),
            callbacks_enabled: true,
            anonymous_ids: true,
        }
    }
}

/// Error loading or saving a config
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Malformed RON input
    #[error("Config parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Serialization failure
    #[error("Config serialization error: {0}")]
    Serialize(#[from] ron::Error),
}
