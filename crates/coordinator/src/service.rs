//! UDP runtime around the coordinator state machine.
//!
//! Two concurrent activities share the state behind one mutex: the inbound
//! receive loop and the operator console. Handlers run under the lock and
//! return envelopes; the lock is dropped before anything is sent, so it is
//! never held across an await.

use crate::Coordinator;
use corelib::wire::{Envelope, Message, MAX_DATAGRAM};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UdpSocket;
use tracing::{info, warn};

pub struct CoordinatorService {
    socket: Arc<UdpSocket>,
    state: Arc<Mutex<Coordinator>>,
}

impl CoordinatorService {
    pub async fn bind(listen: SocketAddr, coordinator: Coordinator) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind(listen).await?;
        info!(address = %socket.local_addr()?, "coordinator listening");
        Ok(Self {
            socket: Arc::new(socket),
            state: Arc::new(Mutex::new(coordinator)),
        })
    }

    /// Runs the receive loop and the operator console until the operator
    /// issues `teardown`.
    pub async fn run(self) -> anyhow::Result<()> {
        let receiver = {
            let socket = Arc::clone(&self.socket);
            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                receive_loop(socket, state).await;
            })
        };

        self.console_loop().await?;
        receiver.abort();
        Ok(())
    }

    /// Operator console: `setup`, `distribute`, `teardown`.
    async fn console_loop(&self) -> anyhow::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        info!("commands: setup | distribute | teardown");
        while let Some(line) = lines.next_line().await? {
            match line.trim() {
                "" => {}
                "setup" => {
                    let envelopes = self.state.lock().setup();
                    send_all(&self.socket, envelopes).await;
                }
                "distribute" => {
                    let envelopes = self.state.lock().distribute();
                    send_all(&self.socket, envelopes).await;
                }
                "teardown" => {
                    let envelopes = self.state.lock().teardown();
                    send_all(&self.socket, envelopes).await;
                    info!("teardown complete, exiting");
                    return Ok(());
                }
                other => warn!(command = other, "unknown command"),
            }
        }
        Ok(())
    }
}

async fn receive_loop(socket: Arc<UdpSocket>, state: Arc<Mutex<Coordinator>>) {
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
        let envelopes = state.lock().handle_message(message, from);
        send_all(&socket, envelopes).await;
    }
}

/// Fire-and-forget: a failed send is logged and otherwise ignored, the same
/// as a datagram lost in transit.
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
