// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Default transport: one UDP socket per request. Bind, send, await a
//! response under a deadline, retry up to `retries` times, surface final
//! failure as `Timeout`.

use std::{future::Future, net::SocketAddr, pin::Pin, time::Duration};

use bytes::Bytes;
use tokio::net::UdpSocket;
use tracing::{debug, warn};

use crate::{
    error::{Result, SnmpClientError},
    transport::Transport,
};

/// Binds an ephemeral local port per call, matching the connectionless
/// nature of SNMP-over-UDP (one socket per in-flight request).
#[derive(Debug, Clone, Copy, Default)]
pub struct UdpTransport;

impl UdpTransport {
    pub fn new() -> Self {
        Self
    }

    async fn attempt(
        endpoint: SocketAddr,
        payload: &[u8],
        deadline: Duration,
    ) -> std::io::Result<Bytes> {
        let bind_addr: SocketAddr = if endpoint.is_ipv6() { "[::]:0" } else { "0.0.0.0:0" }.parse().expect("static bind address");
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(endpoint).await?;
        socket.send(payload).await?;

        let mut buf = vec![0u8; 65535];
        let n = tokio::time::timeout(deadline, socket.recv(&mut buf))
            .await
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "recv timed out"))??;
        buf.truncate(n);
        Ok(Bytes::from(buf))
    }
}

impl Transport for UdpTransport {
    fn send<'a>(
        &'a self,
        endpoint: SocketAddr,
        payload: &'a [u8],
        timeout: Duration,
        retries: u32,
    ) -> Pin<Box<dyn Future<Output = Result<Bytes>> + Send + 'a>> {
        Box::pin(async move {
            let mut last_err = None;
            for attempt in 0..=retries {
                match Self::attempt(endpoint, payload, timeout).await {
                    Ok(bytes) => return Ok(bytes),
                    Err(e) => {
                        warn!(%endpoint, attempt, error = %e, "snmp transport attempt failed");
                        last_err = Some(e);
                    },
                }
            }
            debug!(%endpoint, retries, "snmp transport exhausted retries");
            Err(SnmpClientError::Timeout(
                last_err.map(|e| e.to_string()).unwrap_or_else(|| "no attempts made".to_string()),
            ))
        })
    }
}
