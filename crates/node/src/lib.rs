//! Ring node: stores its partition of the records and answers or forwards
//! point queries around the ring.

pub mod service;

use corelib::node::NodeIdentity;
use corelib::record::{Partition, Record};
use corelib::wire::{Envelope, Message};
use std::net::SocketAddr;
use tracing::{info, warn};

/// Where the node is in its life.
///
/// Unregistered is the time before construction: the service only builds a
/// `Node` once the coordinator has answered `Register` with an id. Both
/// `leave` and `Teardown` land in `Terminated`, which is terminal — a
/// terminated node emits no further traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Registered with the coordinator, successor not yet known.
    Registered,
    /// Successor received; full ring participant.
    RingMember,
    /// Left or torn down.
    Terminated,
}

/// Node state machine.
///
/// Like the coordinator, every operation returns the datagrams to send
/// rather than writing to a socket. The service serializes all access —
/// inbound messages and console commands — behind one lock, since a `Store`
/// and a locally issued `query` share the partition.
pub struct Node {
    identity: NodeIdentity,
    coordinator: SocketAddr,
    successor: Option<SocketAddr>,
    partition: Partition,
    lifecycle: Lifecycle,
}

impl Node {
    pub fn new(identity: NodeIdentity, coordinator: SocketAddr) -> Self {
        Self {
            identity,
            coordinator,
            successor: None,
            partition: Partition::new(),
            lifecycle: Lifecycle::Registered,
        }
    }

    pub fn identity(&self) -> NodeIdentity {
        self.identity
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_terminated(&self) -> bool {
        self.lifecycle == Lifecycle::Terminated
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// Dispatches one inbound datagram.
    pub fn handle_message(&mut self, message: Message, from: SocketAddr) -> Vec<Envelope> {
        if self.is_terminated() {
            return Vec::new();
        }
        match message {
            Message::SetSuccessor { next_address } => {
                info!(node = %self.identity, successor = %next_address, "successor updated");
                self.successor = Some(next_address);
                self.lifecycle = Lifecycle::RingMember;
                Vec::new()
            }
            Message::Store { key, attributes } => self.handle_store(key, attributes),
            Message::FindEvent {
                key,
                originator_address,
                hop_count,
            } => self.handle_find(key, originator_address, hop_count),
            Message::Found { key, attributes } => {
                info!(node = %self.identity, %key, ?attributes, "record found");
                Vec::new()
            }
            Message::NotFound { key } => {
                info!(node = %self.identity, %key, "record not found in ring");
                Vec::new()
            }
            Message::Teardown => {
                info!(node = %self.identity, "teardown received, halting");
                self.lifecycle = Lifecycle::Terminated;
                Vec::new()
            }
            // A duplicate ack from registration; the id is already set.
            Message::RegisterAck { .. } => Vec::new(),
            other => {
                warn!(node = %self.identity, ?other, %from, "unexpected message at node");
                Vec::new()
            }
        }
    }

    /// Idempotent insert into the local partition, acknowledged to the
    /// coordinator.
    fn handle_store(
        &mut self,
        key: String,
        attributes: std::collections::BTreeMap<String, String>,
    ) -> Vec<Envelope> {
        info!(node = %self.identity, %key, "storing record");
        self.partition.insert(Record::new(key.clone(), attributes));
        vec![Envelope::new(self.coordinator, Message::StoreAck { key })]
    }

    /// One hop of a ring query.
    ///
    /// A local hit replies `Found` straight to the originator. Otherwise, a
    /// query that has come back around to its originator with hops behind it
    /// has traversed the whole ring without a hit, so it terminates as
    /// `NotFound` — the bound comes from the payload's originator address,
    /// not from any node-local idea of the ring size, which may be stale.
    fn handle_find(
        &self,
        key: String,
        originator_address: SocketAddr,
        hop_count: u32,
    ) -> Vec<Envelope> {
        if let Some(record) = self.partition.get(&key) {
            return vec![Envelope::new(
                originator_address,
                Message::Found {
                    key,
                    attributes: record.attributes.clone(),
                },
            )];
        }
        if originator_address == self.identity.address && hop_count > 0 {
            return vec![Envelope::new(originator_address, Message::NotFound { key })];
        }
        match self.successor {
            Some(next) => {
                info!(node = %self.identity, %key, hop_count, successor = %next, "forwarding query");
                vec![Envelope::new(
                    next,
                    Message::FindEvent {
                        key,
                        originator_address,
                        hop_count: hop_count + 1,
                    },
                )]
            }
            None => {
                // Not yet a ring member; nowhere to forward.
                warn!(node = %self.identity, %key, "no successor set, query ends here");
                vec![Envelope::new(originator_address, Message::NotFound { key })]
            }
        }
    }

    /// Locally initiated query: this node is its own originator at hop 0.
    pub fn query(&mut self, key: &str) -> Vec<Envelope> {
        self.handle_message(
            Message::FindEvent {
                key: key.to_string(),
                originator_address: self.identity.address,
                hop_count: 0,
            },
            self.identity.address,
        )
    }

    /// Notifies the coordinator of departure and stops participating. Does
    /// not wait for acknowledgment; the abandoned partition stays abandoned.
    pub fn leave(&mut self) -> Vec<Envelope> {
        if self.is_terminated() {
            return Vec::new();
        }
        info!(node = %self.identity, "leaving the ring");
        self.lifecycle = Lifecycle::Terminated;
        vec![Envelope::new(
            self.coordinator,
            Message::Leave {
                id: self.identity.id,
            },
        )]
    }
}
