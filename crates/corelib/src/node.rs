//! Node identity types.
//!
//! A node is identified by a compact `NodeId` assigned by the coordinator at
//! registration time, paired with the UDP address the node receives on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;

/// Compact identifier for a node in the ring.
///
/// Newtype over `u64` so comparisons and hashing are cheap. Ids are assigned
/// monotonically by the membership directory and never reused, even after
/// the node leaves.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered node: its assigned id and receive address.
///
/// Immutable once assigned; removed from the directory on leave or teardown.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct NodeIdentity {
    pub id: NodeId,
    pub address: SocketAddr,
}

impl NodeIdentity {
    pub fn new(id: NodeId, address: SocketAddr) -> Self {
        Self { id, address }
    }
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node {} at {}", self.id, self.address)
    }
}
