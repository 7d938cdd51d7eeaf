//! Coordinator for the ring-distributed record store.
//!
//! The coordinator is the single process holding authoritative membership
//! state. It registers nodes, propagates ring topology, distributes records
//! to their owners, and tears the ring down. All sends are fire-and-forget
//! over the unreliable datagram channel; nothing here retries or waits for
//! acknowledgment.

pub mod service;
pub mod source;

use corelib::directory::Directory;
use corelib::node::NodeId;
use corelib::partitioner::owner_of;
use corelib::record::Record;
use corelib::wire::{Envelope, Message};
use std::net::SocketAddr;
use tracing::{info, warn};

/// Coordinator state machine: the membership directory plus the records to
/// distribute.
///
/// Every operation returns the datagrams it wants sent instead of touching
/// a socket. The service layer runs each operation under one lock, so a
/// ring is always computed against either pre- or post-change membership,
/// never a torn intermediate state.
pub struct Coordinator {
    directory: Directory,
    records: Vec<Record>,
}

impl Coordinator {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            directory: Directory::new(),
            records,
        }
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Dispatches one inbound datagram.
    pub fn handle_message(&mut self, message: Message, from: SocketAddr) -> Vec<Envelope> {
        match message {
            Message::Register { from_address } => {
                let id = self.directory.register(from_address);
                info!(%id, address = %from_address, "registered node");
                vec![Envelope::new(
                    from_address,
                    Message::RegisterAck { assigned_id: id },
                )]
            }
            Message::StoreAck { key } => {
                info!(%key, %from, "store acknowledged");
                Vec::new()
            }
            Message::Leave { id } => self.on_leave(id),
            other => {
                warn!(?other, %from, "unexpected message at coordinator");
                Vec::new()
            }
        }
    }

    /// Propagates the current ring: one `SetSuccessor` per registered node.
    /// No directory side effects; an empty directory produces no traffic.
    pub fn setup(&self) -> Vec<Envelope> {
        let ring = self.directory.compute_ring();
        if ring.is_empty() {
            warn!("setup requested with no registered nodes");
            return Vec::new();
        }
        ring.iter()
            .map(|entry| {
                info!(
                    node = %entry.identity,
                    successor = %entry.successor_address,
                    "set successor"
                );
                Envelope::new(
                    entry.identity.address,
                    Message::SetSuccessor {
                        next_address: entry.successor_address,
                    },
                )
            })
            .collect()
    }

    /// Sends every record to its owner under the current membership.
    ///
    /// Fire-and-forget: `StoreAck` replies are logged for observability but
    /// their absence is not a failure.
    pub fn distribute(&self) -> Vec<Envelope> {
        let identities = self.directory.identities();
        if identities.is_empty() {
            warn!("distribute requested with no registered nodes");
            return Vec::new();
        }
        let envelopes: Vec<Envelope> = self
            .records
            .iter()
            .filter_map(|record| {
                owner_of(&record.key, &identities).map(|owner| {
                    Envelope::new(
                        owner.address,
                        Message::Store {
                            key: record.key.clone(),
                            attributes: record.attributes.clone(),
                        },
                    )
                })
            })
            .collect();
        info!(
            records = envelopes.len(),
            nodes = identities.len(),
            "distributing records"
        );
        envelopes
    }

    /// Removes a departed node and re-propagates the ring to the survivors.
    /// The departed node's partition is abandoned; recovering it is an
    /// operator-level action (re-run `distribute`), not something done here.
    pub fn on_leave(&mut self, id: NodeId) -> Vec<Envelope> {
        if !self.directory.deregister(id) {
            warn!(%id, "leave for unknown node ignored");
            return Vec::new();
        }
        info!(%id, remaining = self.directory.len(), "node left, updating ring");
        self.setup()
    }

    /// Sends `Teardown` to every member, then forgets them all. No
    /// acknowledgment is awaited.
    pub fn teardown(&mut self) -> Vec<Envelope> {
        let envelopes: Vec<Envelope> = self
            .directory
            .identities()
            .iter()
            .map(|identity| Envelope::new(identity.address, Message::Teardown))
            .collect();
        info!(nodes = envelopes.len(), "tearing down ring");
        self.directory.clear();
        envelopes
    }
}
