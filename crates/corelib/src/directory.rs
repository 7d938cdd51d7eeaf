//! Membership directory and ring computation.
//!
//! The directory is the single source of truth for the ring. It lives inside
//! the coordinator behind one lock; nodes only ever see derived state in the
//! form of `SetSuccessor` messages.

use crate::node::{NodeId, NodeIdentity};
use std::collections::BTreeMap;
use std::net::SocketAddr;

/// One node's place in the ring: its identity plus the address of the next
/// node in ascending-id order, wrapping from the maximum id to the minimum.
///
/// Derived entirely from the directory; recomputed on every membership
/// change, never persisted on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingEntry {
    pub identity: NodeIdentity,
    pub successor_address: SocketAddr,
}

/// Registered membership: id → identity, plus the id counter.
///
/// Ids start at 1 and are never reused, even after a leave, so a departed
/// node can never collide with one that joins later. Duplicate registrations
/// from the same address are distinct nodes; the directory does not
/// deduplicate by address.
#[derive(Debug)]
pub struct Directory {
    members: BTreeMap<NodeId, NodeIdentity>,
    next_id: u64,
}

impl Directory {
    pub fn new() -> Self {
        Self {
            members: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Registers a node and returns its assigned id.
    pub fn register(&mut self, address: SocketAddr) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.members.insert(id, NodeIdentity::new(id, address));
        id
    }

    /// Removes a node. Returns `false` for an absent id, which tolerates
    /// late or duplicate `Leave` messages.
    pub fn deregister(&mut self, id: NodeId) -> bool {
        self.members.remove(&id).is_some()
    }

    /// Drops every member. The id counter keeps running.
    pub fn clear(&mut self) {
        self.members.clear();
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeIdentity> {
        self.members.get(&id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Current identities, ascending by id.
    pub fn identities(&self) -> Vec<NodeIdentity> {
        self.members.values().copied().collect()
    }

    /// Computes the ring: each node paired with the next one's address,
    /// the last wrapping to the first. A single node is its own successor;
    /// an empty directory yields an empty ring.
    pub fn compute_ring(&self) -> Vec<RingEntry> {
        let identities = self.identities();
        let n = identities.len();
        identities
            .iter()
            .enumerate()
            .map(|(i, identity)| RingEntry {
                identity: *identity,
                successor_address: identities[(i + 1) % n].address,
            })
            .collect()
    }
}

impl Default for Directory {
    fn default() -> Self {
        Self::new()
    }
}
