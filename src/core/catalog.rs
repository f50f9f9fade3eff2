//! Discovery snapshot model.
//!
//! These types describe what the discovery collaborator hands over for one
//! build pass. They are plain serde structures so snapshots can be captured
//! to disk and replayed through the builder.
use serde::{Deserialize, Serialize};

/// One eligible service together with its discovered instances.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogUpdate {
    pub service: ServiceUpdate,
    /// Instances in discovery order. The position of an instance in this list
    /// is its ordinal for server naming.
    #[serde(default)]
    pub instances: Vec<Instance>,
}

impl CatalogUpdate {
    pub fn new(service: ServiceUpdate, instances: Vec<Instance>) -> Self {
        Self { service, instances }
    }
}

/// Service-level view of a catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceUpdate {
    pub name: String,
    /// Flattened service-level tags (`key=value` or bare `key`).
    #[serde(default)]
    pub attributes: Vec<String>,
}

impl ServiceUpdate {
    pub fn new(name: impl Into<String>, attributes: Vec<String>) -> Self {
        Self {
            name: name.into(),
            attributes,
        }
    }
}

/// The node (agent) that registered an instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
}

/// One running endpoint of a service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Address registered with the instance itself; may be empty.
    #[serde(default)]
    pub address: String,
    pub port: u16,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub node: Node,
}

impl Instance {
    pub fn new(address: impl Into<String>, port: u16, tags: Vec<String>) -> Self {
        Self {
            address: address.into(),
            port,
            tags,
            node: Node::default(),
        }
    }

    pub fn with_node(mut self, name: impl Into<String>, address: impl Into<String>) -> Self {
        self.node = Node {
            name: name.into(),
            address: address.into(),
        };
        self
    }

    /// Address the proxy should dial: the instance's own address when set,
    /// otherwise the hosting node's.
    pub fn backend_address(&self) -> &str {
        if self.address.is_empty() {
            &self.node.address
        } else {
            &self.address
        }
    }
}
