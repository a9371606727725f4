// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Pluggable transport abstraction: `send(endpoint, payload, timeout,
//! retries) -> bytes`, with no response correlation of its own — just
//! datagram-level request/response pairing.

pub mod mock;
pub mod udp;

use std::{future::Future, net::SocketAddr, pin::Pin, time::Duration};

use bytes::Bytes;

use crate::error::Result;

pub use udp::UdpTransport;

/// Object-safe so tests can substitute an in-memory mock for the default
/// UDP implementation.
pub trait Transport: Send + Sync {
    fn send<'a>(
        &'a self,
        endpoint: SocketAddr,
        payload: &'a [u8],
        timeout: Duration,
        retries: u32,
    ) -> Pin<Box<dyn Future<Output = Result<Bytes>> + Send + 'a>>;
}
