//! UDP runtime around the node state machine.
//!
//! Registration is the one request/response exchange: the service sends
//! `Register` and waits (bounded) for the `RegisterAck` before the node
//! exists at all. After that, the inbound receive loop and the operator
//! console share the node behind one mutex, with envelopes sent after the
//! lock is dropped.

use crate::Node;
use corelib::node::NodeIdentity;
use corelib::wire::{Envelope, Message, MAX_DATAGRAM};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UdpSocket;
use tracing::{info, warn};

const REGISTER_TIMEOUT: Duration = Duration::from_secs(5);

pub struct NodeService {
    socket: Arc<UdpSocket>,
    state: Arc<Mutex<Node>>,
}

impl NodeService {
    /// Binds the socket, registers with the coordinator, and waits for the
    /// assigned id. Fails if the coordinator does not answer in time.
    pub async fn register(listen: SocketAddr, coordinator: SocketAddr) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind(listen).await?;
        let local = socket.local_addr()?;

        let register = Message::Register {
            from_address: local,
        };
        socket.send_to(&register.encode()?, coordinator).await?;
        info!(address = %local, %coordinator, "registering");

        let identity = tokio::time::timeout(REGISTER_TIMEOUT, await_ack(&socket, local))
            .await
            .map_err(|_| anyhow::anyhow!("no registration reply from {coordinator}"))??;
        info!(node = %identity, "registered");

        Ok(Self {
            socket: Arc::new(socket),
            state: Arc::new(Mutex::new(Node::new(identity, coordinator))),
        })
    }

    /// Runs the receive loop and the operator console until the node leaves,
    /// is torn down, or the operator exits.
    pub async fn run(self) -> anyhow::Result<()> {
        let mut receiver = {
            let socket = Arc::clone(&self.socket);
            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                receive_loop(socket, state).await;
            })
        };

        let mut console = {
            let socket = Arc::clone(&self.socket);
            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                if let Err(err) = console_loop(socket, state).await {
                    warn!(%err, "console failed");
                }
            })
        };

        // Either the ring tears the node down (receive loop ends) or the
        // operator leaves/exits (console ends).
        tokio::select! {
            _ = &mut receiver => {}
            _ = &mut console => {}
        }
        receiver.abort();
        console.abort();
        Ok(())
    }
}

async fn await_ack(socket: &UdpSocket, local: SocketAddr) -> anyhow::Result<NodeIdentity> {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    loop {
        let (len, from) = socket.recv_from(&mut buf).await?;
        match Message::decode(&buf[..len]) {
            Ok(Message::RegisterAck { assigned_id }) => {
                return Ok(NodeIdentity::new(assigned_id, local));
            }
            Ok(other) => warn!(?other, %from, "ignoring message while registering"),
            Err(err) => warn!(%from, %err, "dropping malformed datagram"),
        }
    }
}

async fn receive_loop(socket: Arc<UdpSocket>, state: Arc<Mutex<Node>>) {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    loop {
        let (len, from) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(err) => {
                warn!(%err, "receive failed");
                continue;
            }
        };
        let message = match Message::decode(&buf[..len]) {
            Ok(message) => message,
            Err(err) => {
                warn!(%from, %err, "dropping malformed datagram");
                continue;
            }
        };
        let (envelopes, terminated) = {
            let mut node = state.lock();
            (node.handle_message(message, from), node.is_terminated())
        };
        send_all(&socket, envelopes).await;
        if terminated {
            return;
        }
    }
}

/// Operator console: `query <key>`, `leave`, `exit`.
///
/// `exit` ends the process without telling anyone, which is deliberately
/// distinct from `leave`.
async fn console_loop(socket: Arc<UdpSocket>, state: Arc<Mutex<Node>>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    info!("commands: query <key> | leave | exit");
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line == "exit" {
            return Ok(());
        } else if line == "leave" {
            let envelopes = state.lock().leave();
            send_all(&socket, envelopes).await;
            return Ok(());
        } else if let Some(key) = line.strip_prefix("query ") {
            let envelopes = state.lock().query(key.trim());
            send_all(&socket, envelopes).await;
        } else if !line.is_empty() {
            warn!(command = line, "unknown command");
        }
    }
    Ok(())
}

async fn send_all(socket: &UdpSocket, envelopes: Vec<Envelope>) {
    for envelope in envelopes {
        let bytes = match envelope.message.encode() {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(%err, "failed to encode outgoing message");
                continue;
            }
        };
        if let Err(err) = socket.send_to(&bytes, envelope.to).await {
            warn!(to = %envelope.to, %err, "send failed");
        }
    }
}
