//! Wire protocol for coordinator/node communication.
//!
//! Every message is one self-contained datagram: a tagged JSON object
//! carrying all fields needed to process it without external lookup. The
//! transport is an unreliable datagram channel, so no kind assumes delivery
//! or ordering; each is safe to receive late or twice.

use crate::error::{Error, Result};
use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;

/// Receive-buffer size for one datagram.
pub const MAX_DATAGRAM: usize = 4096;

/// All message kinds exchanged between the coordinator and nodes.
///
/// Dispatch is an explicit `match` on the variant; the wire form is an
/// internally tagged JSON object, e.g.
/// `{"command":"find_event","key":"10","originator_address":"127.0.0.1:6001","hop_count":0}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Message {
    /// Node → coordinator: request membership. Carries the node's own
    /// receive address so the reply and all later traffic have a target.
    Register { from_address: SocketAddr },
    /// Coordinator → node: registration reply with the assigned id.
    RegisterAck { assigned_id: NodeId },
    /// Coordinator → node: this node's successor in the current ring.
    SetSuccessor { next_address: SocketAddr },
    /// Coordinator → owning node: store one record.
    Store {
        key: String,
        attributes: BTreeMap<String, String>,
    },
    /// Node → coordinator: the record was stored (observability only).
    StoreAck { key: String },
    /// Node → node: a query traversing the ring.
    FindEvent {
        key: String,
        originator_address: SocketAddr,
        hop_count: u32,
    },
    /// Terminal query reply to the originator: the record was found.
    Found {
        key: String,
        attributes: BTreeMap<String, String>,
    },
    /// Terminal query reply to the originator: full traversal, no record.
    NotFound { key: String },
    /// Node → coordinator: this node is departing the ring.
    Leave { id: NodeId },
    /// Coordinator → node: halt all processing.
    Teardown,
}

impl Message {
    /// Encodes the message as one datagram payload.
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(Error::Encode)
    }

    /// Decodes a datagram payload. Malformed input is an error for the
    /// caller to log and drop, never a panic.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(Error::Decode)
    }
}

/// An outgoing message paired with its destination.
///
/// State machines return envelopes instead of writing to a socket, which
/// keeps them pure and testable; the service layer does the actual send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub to: SocketAddr,
    pub message: Message,
}

impl Envelope {
    pub fn new(to: SocketAddr, message: Message) -> Self {
        Self { to, message }
    }
}
