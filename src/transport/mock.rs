// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! In-memory transport for exercising the client façade and walk engine
//! without a real socket (scenario tests S1-S6).

use std::{collections::VecDeque, future::Future, net::SocketAddr, pin::Pin, sync::Mutex, time::Duration};

use bytes::Bytes;

use crate::{
    error::{Result, SnmpClientError},
    transport::Transport,
};

/// Replays a fixed queue of responses, one per `send` call, and records
/// every payload it was asked to send for later assertions.
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Bytes>>,
    sent: Mutex<Vec<Bytes>>,
}

impl MockTransport {
    pub fn new(responses: Vec<Bytes>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<Bytes> {
        self.sent.lock().expect("mock transport mutex poisoned").clone()
    }
}

impl Transport for MockTransport {
    fn send<'a>(
        &'a self,
        _endpoint: SocketAddr,
        payload: &'a [u8],
        _timeout: Duration,
        _retries: u32,
    ) -> Pin<Box<dyn Future<Output = Result<Bytes>> + Send + 'a>> {
        Box::pin(async move {
            self.sent
                .lock()
                .expect("mock transport mutex poisoned")
                .push(Bytes::copy_from_slice(payload));

            self.responses
                .lock()
                .expect("mock transport mutex poisoned")
                .pop_front()
                .ok_or_else(|| {
                    SnmpClientError::Timeout("mock transport ran out of canned responses".to_string())
                })
        })
    }
}
