// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Trap/inform listener: binds a UDP socket, decodes incoming datagrams
//! with a fixed set of credentials, and hands each decoded PDU to a
//! user-supplied callback from a background task.

use std::{net::SocketAddr, sync::Arc};

use tokio::net::UdpSocket;
use tracing::warn;

use crate::{client::model::Credentials, error::Result, mpm::Mpm, pdu::model::Pdu};

/// A bound trap socket, not yet listening.
pub struct TrapListener {
    socket: Arc<UdpSocket>,
}

impl TrapListener {
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(addr).await.map_err(|e| crate::error::SnmpClientError::Timeout(e.to_string()))?;
        Ok(Self { socket: Arc::new(socket) })
    }

    /// Spawns the receive loop as a background task. `credentials` verifies
    /// (and, for v3, decrypts) every incoming datagram; datagrams that fail
    /// to decode are logged and dropped rather than killing the listener.
    /// `handler` runs once per successfully decoded PDU.
    pub fn spawn<F>(self, credentials: Credentials, handler: F) -> tokio::task::JoinHandle<()>
    where
        F: Fn(Pdu, SocketAddr) + Send + Sync + 'static,
    {
        let mpm = Mpm::for_credentials(&credentials);
        let socket = self.socket;
        tokio::spawn(async move {
            let mut buf = vec![0u8; 65535];
            loop {
                let (n, peer) = match socket.recv_from(&mut buf).await {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!(error = %e, "trap socket recv failed");
                        continue;
                    },
                };
                match mpm.decode(&buf[..n], &credentials) {
                    Ok(decoded) => handler(decoded.pdu, peer),
                    Err(e) => warn!(%peer, error = %e, "failed to decode trap datagram"),
                }
            }
        })
    }
}
