//! Core library for the ring-distributed record store.
//!
//! This crate provides the transport-free building blocks shared by the
//! coordinator and node binaries:
//! - Wire protocol messages and their datagram encoding
//! - Key-to-owner partitioning
//! - Membership directory and ring computation
//! - Node identity types
//! - Records and per-node partitions

pub mod directory;
pub mod error;
pub mod node;
pub mod partitioner;
pub mod record;
pub mod wire;

pub use directory::{Directory, RingEntry};
pub use error::{Error, Result};
pub use node::{NodeId, NodeIdentity};
pub use record::{Partition, Record};
pub use wire::{Envelope, Message};
