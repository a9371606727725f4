// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The public SNMP client façade: one request/response round trip per
//! call, lazy engine discovery, and the `get`/`set`/`bulk`/`walk`/`table`
//! operations built on top of it.

use std::{future::Future, net::SocketAddr, pin::Pin, sync::Arc};

use futures::stream::Stream;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    client::{
        model::{BulkResult, ClientConfig, Context, Credentials},
        table::{self, Table},
        walk::{self, Fetcher, WalkErrors},
    },
    error::{ErrorStatus, Result, SnmpClientError, UsmErrorKind},
    mpm::{EngineState, Mpm},
    oid::ObjectIdentifier,
    pdu::model::{Pdu, PduContent},
    security::{discovery::{discover, DiscoveryChannel}, Lcd},
    transport::Transport,
    utils::next_request_id,
    value::Value,
    varbind::VarBind,
};

/// One logical SNMP peer. Cheap to clone: the transport and mutable state
/// both live behind `Arc`.
#[derive(Clone)]
pub struct Client<T: Transport> {
    inner: Arc<Inner<T>>,
}

struct Inner<T: Transport> {
    transport: T,
    endpoint: SocketAddr,
    state: Mutex<State>,
}

struct State {
    config: ClientConfig,
    mpm: Mpm,
}

/// Restores a snapshot taken by `reconfigure` if it is ever dropped while
/// still armed, i.e. on every exit path that isn't the inline restore on
/// normal return: unwinding through a panic, or the enclosing future
/// being dropped mid-poll on cancellation. `tokio::sync::Mutex` can't be
/// locked synchronously from `Drop`, so the restore is handed to a
/// detached task; the client is briefly left on the override after the
/// drop and consistent again once that task is scheduled.
struct RestoreGuard<T: Transport + 'static> {
    inner: Arc<Inner<T>>,
    previous: Option<(ClientConfig, Mpm)>,
}

impl<T: Transport + 'static> Drop for RestoreGuard<T> {
    fn drop(&mut self) {
        if let Some((config, mpm)) = self.previous.take() {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move {
                let mut guard = inner.state.lock().await;
                guard.config = config;
                guard.mpm = mpm;
            });
        }
    }
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T, endpoint: SocketAddr, config: ClientConfig) -> Self {
        let mpm = Mpm::for_credentials(&config.credentials);
        Self {
            inner: Arc::new(Inner {
                transport,
                endpoint,
                state: Mutex::new(State { config, mpm }),
            }),
        }
    }

    /// Like `new`, but shares `lcd` instead of the private one `config`
    /// carries: useful when several clients target hosts behind the same
    /// authoritative engine and should reuse one cached boots/time.
    pub fn with_lcd(transport: T, endpoint: SocketAddr, mut config: ClientConfig, lcd: Lcd) -> Self {
        config.lcd = lcd;
        Self::new(transport, endpoint, config)
    }

    /// Runs `f` against a temporary override of this client's credentials
    /// and context, restoring the previous config on every exit path
    /// (normal return, panic unwinding, or the returned future being
    /// dropped mid-poll on cancellation) via an RAII guard rather than
    /// straight-line code after `f().await`.
    pub async fn reconfigure<F, Fut, R>(&self, credentials: Credentials, context: Context, f: F) -> Result<R>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = R>,
        T: 'static,
    {
        credentials.validate()?;
        let overrides = ClientConfig::new(credentials, context, self.timeout().await, self.retries().await)?;

        let (previous_config, previous_mpm) = {
            let mut guard = self.inner.state.lock().await;
            let previous_config = std::mem::replace(&mut guard.config, overrides);
            let previous_mpm = guard.mpm;
            guard.mpm = Mpm::for_credentials(&guard.config.credentials);
            (previous_config, previous_mpm)
        };
        let mut restore = RestoreGuard { inner: Arc::clone(&self.inner), previous: Some((previous_config, previous_mpm)) };

        let result = f().await;

        // Reached only on normal completion; restore inline and disarm the
        // guard so its `Drop` doesn't also spawn a redundant restore.
        if let Some((config, mpm)) = restore.previous.take() {
            let mut guard = self.inner.state.lock().await;
            guard.config = config;
            guard.mpm = mpm;
        }

        Ok(result)
    }

    async fn timeout(&self) -> std::time::Duration {
        self.inner.state.lock().await.config.timeout
    }

    async fn retries(&self) -> u32 {
        self.inner.state.lock().await.config.retries
    }

    /// Core round trip: encode, send, decode, correlate. Performs lazy
    /// engine discovery on first use of a v3 target, and re-syncs exactly
    /// once on `Report` before giving up.
    async fn round_trip(&self, pdu: Pdu) -> Result<Pdu> {
        self.round_trip_inner(pdu, false).await
    }

    fn round_trip_inner<'a>(&'a self, pdu: Pdu, retried: bool) -> Pin<Box<dyn Future<Output = Result<Pdu>> + Send + 'a>> {
        Box::pin(async move {
            let request_id = pdu.request_id();
            let mut guard = self.inner.state.lock().await;

            if guard.config.credentials.is_v3() {
                self.ensure_engine_discovered(&mut guard).await?;
            }

            let engine_id = guard.config.context.engine_id.clone();
            let engine = if guard.config.credentials.is_v3() {
                let cached = guard.config.lcd.get(&engine_id).await.ok_or_else(|| {
                    SnmpClientError::FaultySnmpImplementation(
                        "engine state missing immediately after discovery".to_string(),
                    )
                })?;
                Some(EngineState {
                    engine_id: &engine_id,
                    engine_boots: cached.engine_boots,
                    engine_time: cached.estimate_now(),
                })
            } else {
                None
            };

            let bytes = guard.mpm.encode(request_id, &guard.config.credentials, &guard.config.context, engine, pdu.clone())?;
            let raw = self
                .inner
                .transport
                .send(self.inner.endpoint, &bytes, guard.config.timeout, guard.config.retries)
                .await?;
            let decoded = guard.mpm.decode(&raw, &guard.config.credentials)?;

            if let Some(refreshed) = &decoded.refreshed_engine {
                guard.config.lcd.update(&refreshed.engine_id, refreshed.engine_boots, refreshed.engine_time).await;
            }

            if let Pdu::Report(_) = &decoded.pdu {
                if retried {
                    return Err(SnmpClientError::Usm(UsmErrorKind::NotInTimeWindow));
                }
                drop(guard);
                debug!("re-syncing engine timeliness after Report, retrying once");
                return self.round_trip_inner(pdu, true).await;
            }

            let response_id = decoded.pdu.request_id();
            if response_id != request_id {
                return Err(SnmpClientError::RequestIdMismatch { expected: request_id, actual: response_id });
            }

            Ok(decoded.pdu)
        })
    }

    async fn ensure_engine_discovered(&self, guard: &mut tokio::sync::MutexGuard<'_, State>) -> Result<()> {
        let known = if guard.config.context.engine_id.is_empty() {
            None
        } else {
            guard.config.lcd.get(&guard.config.context.engine_id).await
        };
        if known.is_some() {
            return Ok(());
        }

        let channel = TransportDiscoveryChannel {
            transport: &self.inner.transport,
            endpoint: self.inner.endpoint,
            timeout: guard.config.timeout,
            retries: guard.config.retries,
        };
        let msg_id = next_request_id();
        let disco = discover(&channel, msg_id).await?;
        guard.config.context.engine_id = disco.engine_id.clone();
        guard.config.lcd.update(&disco.engine_id, disco.engine_boots, disco.engine_time).await;
        Ok(())
    }

    /// Fetches a single scalar value.
    pub async fn get(&self, oid: ObjectIdentifier) -> Result<Value> {
        let mut values = self.multiget(vec![oid]).await?;
        values.pop().ok_or_else(|| SnmpClientError::CardinalityMismatch { expected: 1, actual: 0 })
    }

    /// Fetches several scalars in one request.
    pub async fn multiget(&self, oids: Vec<ObjectIdentifier>) -> Result<Vec<Value>> {
        let request_id = next_request_id();
        let varbinds = oids.iter().cloned().map(|oid| VarBind::new(oid, Value::Null)).collect();
        let pdu = Pdu::Get(PduContent::request(request_id, varbinds));

        let content = expect_response(self.round_trip(pdu).await?)?;
        check_error_status(&content, &oids)?;
        if content.varbinds.len() != oids.len() {
            return Err(SnmpClientError::CardinalityMismatch { expected: oids.len(), actual: content.varbinds.len() });
        }

        let mut values = Vec::with_capacity(oids.len());
        for (oid, vb) in oids.iter().zip(content.varbinds) {
            if vb.value.is_exception() {
                return Err(SnmpClientError::NoSuchOid(oid.clone()));
            }
            values.push(vb.value);
        }
        Ok(values)
    }

    /// Fetches the varbind lexicographically following `oid`.
    pub async fn getnext(&self, oid: ObjectIdentifier) -> Result<VarBind> {
        let mut results = self.multigetnext(vec![oid]).await?;
        results.pop().ok_or_else(|| SnmpClientError::CardinalityMismatch { expected: 1, actual: 0 })
    }

    /// Fetches the varbinds lexicographically following each of `oids`.
    /// Trailing `EndOfMibView` entries are dropped from the result.
    pub async fn multigetnext(&self, oids: Vec<ObjectIdentifier>) -> Result<Vec<VarBind>> {
        let request_id = next_request_id();
        let varbinds = oids.iter().cloned().map(|oid| VarBind::new(oid, Value::Null)).collect();
        let pdu = Pdu::GetNext(PduContent::request(request_id, varbinds));

        let content = expect_response(self.round_trip(pdu).await?)?;
        check_error_status(&content, &oids)?;
        if content.varbinds.len() != oids.len() {
            return Err(SnmpClientError::CardinalityMismatch { expected: oids.len(), actual: content.varbinds.len() });
        }

        let mut out = Vec::with_capacity(oids.len());
        for (req_oid, vb) in oids.iter().zip(content.varbinds) {
            if !matches!(vb.value, Value::EndOfMibView) && vb.oid <= *req_oid {
                return Err(SnmpClientError::FaultySnmpImplementation(format!(
                    "getnext returned {} which is not strictly greater than requested {req_oid}",
                    vb.oid
                )));
            }
            out.push(vb);
        }
        while matches!(out.last(), Some(vb) if matches!(vb.value, Value::EndOfMibView)) {
            out.pop();
        }
        Ok(out)
    }

    /// Sets a single value, returning the agent's committed value.
    pub async fn set(&self, oid: ObjectIdentifier, value: Value) -> Result<Value> {
        let mut result = self.multiset(vec![(oid, value)]).await?;
        result.pop().map(|(_, v)| v).ok_or_else(|| SnmpClientError::CardinalityMismatch { expected: 1, actual: 0 })
    }

    /// Sets several values in one request.
    ///
    /// The outgoing PDU and the response it is matched against always
    /// share one request id, generated exactly once below: `round_trip`
    /// uses `pdu.request_id()` both to stamp the message and to validate
    /// the response, so there is no second id-generation call that could
    /// drift out of sync with the first.
    pub async fn multiset(&self, entries: Vec<(ObjectIdentifier, Value)>) -> Result<Vec<(ObjectIdentifier, Value)>> {
        for (_, value) in &entries {
            if matches!(value, Value::Null) {
                return Err(SnmpClientError::TypeError("set value is untyped (Value::Null)".to_string()));
            }
        }

        let request_id = next_request_id();
        let oids: Vec<ObjectIdentifier> = entries.iter().map(|(oid, _)| oid.clone()).collect();
        let varbinds = entries.into_iter().map(|(oid, value)| VarBind::new(oid, value)).collect();
        let pdu = Pdu::Set(PduContent::request(request_id, varbinds));

        let content = expect_response(self.round_trip(pdu).await?)?;
        check_error_status(&content, &oids)?;
        if content.varbinds.len() != oids.len() {
            return Err(SnmpClientError::CardinalityMismatch { expected: oids.len(), actual: content.varbinds.len() });
        }
        Ok(content.varbinds.into_iter().map(|vb| (vb.oid, vb.value)).collect())
    }

    /// One `GetBulk` request: `non_repeaters` scalars plus up to
    /// `max_repetitions` rows for each of `repeaters`, per RFC 3416 §4.2.3.
    /// The `non_repeaters + repeaters.len() * max_repetitions` bound is a
    /// ceiling only; the agent may return fewer.
    pub async fn bulkget(
        &self,
        non_repeaters: Vec<ObjectIdentifier>,
        repeaters: Vec<ObjectIdentifier>,
        max_repetitions: u32,
    ) -> Result<BulkResult> {
        let request_id = next_request_id();
        let n = non_repeaters.len() as u32;
        let m = repeaters.len();
        let mut oids = non_repeaters;
        oids.extend(repeaters);
        let pdu = Pdu::bulk_get(request_id, n, max_repetitions, oids);

        let content = expect_response(self.round_trip(pdu).await?)?;
        check_error_status(&content, &[])?;

        let ceiling = n as usize + m * max_repetitions as usize;
        if content.varbinds.len() > ceiling {
            return Err(SnmpClientError::FaultySnmpImplementation(format!(
                "bulk response carried {} varbinds, exceeding the ceiling of {ceiling}",
                content.varbinds.len()
            )));
        }

        let mut result = BulkResult::default();
        for (idx, vb) in content.varbinds.into_iter().enumerate() {
            if (idx as u32) < n {
                result.scalars.insert(vb.oid, vb.value);
            } else {
                result.listing.push((vb.oid, vb.value));
            }
        }
        Ok(result)
    }

    /// Walks one or more OID subtrees using repeated `GetNext` requests.
    /// `cancel` lets a caller stop the walk early (e.g. on a user-driven
    /// abort or an enclosing timeout); the stream simply ends once it
    /// fires, rather than yielding an error.
    pub fn walk(
        &self,
        roots: Vec<ObjectIdentifier>,
        errors: WalkErrors,
        cancel: CancellationToken,
    ) -> impl Stream<Item = Result<VarBind>> + '_ {
        let fetcher: Fetcher<'_> = Box::new(move |probes| Box::pin(self.multigetnext(probes)));
        walk::walk_with_fetcher(roots, errors, fetcher, cancel)
    }

    /// Walks one or more OID subtrees using `GetBulk` batches instead of
    /// single-step `GetNext`.
    pub fn bulkwalk(
        &self,
        roots: Vec<ObjectIdentifier>,
        max_repetitions: u32,
        errors: WalkErrors,
        cancel: CancellationToken,
    ) -> impl Stream<Item = Result<VarBind>> + '_ {
        let fetcher: Fetcher<'_> = Box::new(move |probes| {
            Box::pin(async move {
                let result = self.bulkget(vec![], probes, max_repetitions).await?;
                Ok(result.listing.into_iter().map(|(oid, value)| VarBind::new(oid, value)).collect())
            })
        });
        walk::walk_with_fetcher(roots, errors, fetcher, cancel)
    }

    /// Assembles a conceptual table rooted at `base` from a plain walk.
    pub async fn table(&self, base: ObjectIdentifier) -> Result<Table> {
        use futures::StreamExt;
        let rows: Vec<VarBind> = self
            .walk(vec![base.clone()], WalkErrors::Strict, CancellationToken::new())
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<Result<Vec<_>>>()?;
        table::assemble(&base, rows)
    }

    /// Assembles a conceptual table rooted at `base` from a bulk walk.
    pub async fn bulktable(&self, base: ObjectIdentifier, max_repetitions: u32) -> Result<Table> {
        use futures::StreamExt;
        let rows: Vec<VarBind> = self
            .bulkwalk(vec![base.clone()], max_repetitions, WalkErrors::Strict, CancellationToken::new())
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<Result<Vec<_>>>()?;
        table::assemble(&base, rows)
    }
}

/// Discovers a target's authoritative `engineID`, independent of any
/// credentials. A v3 config with no pre-shared `ContextEngineId` needs this
/// before it can localize passphrases into keys, since localization (RFC
/// 3414 appendix A.2) is engine-specific and must use the real engine ID.
pub async fn discover_engine_id<T: Transport>(
    transport: &T,
    endpoint: SocketAddr,
    timeout: std::time::Duration,
    retries: u32,
) -> Result<Vec<u8>> {
    let channel = TransportDiscoveryChannel { transport, endpoint, timeout, retries };
    let disco = discover(&channel, next_request_id()).await?;
    Ok(disco.engine_id)
}

fn expect_response(pdu: Pdu) -> Result<PduContent> {
    match pdu {
        Pdu::Response(content) => Ok(content),
        other => Err(SnmpClientError::decoding(format!("expected a Response PDU, got {other:?}"))),
    }
}

/// Maps a non-zero `error-status` to `SnmpError`, naming the offending OID
/// when `error-index` points inside the request varbind list.
fn check_error_status(content: &PduContent, request_oids: &[ObjectIdentifier]) -> Result<()> {
    if content.error_status == 0 {
        return Ok(());
    }
    let oid = usize::try_from(content.error_index)
        .ok()
        .and_then(|idx| idx.checked_sub(1))
        .and_then(|idx| request_oids.get(idx))
        .cloned();
    Err(SnmpClientError::SnmpError {
        status: ErrorStatus::from(content.error_status),
        error_index: content.error_index,
        oid,
    })
}

struct TransportDiscoveryChannel<'a, T: Transport> {
    transport: &'a T,
    endpoint: SocketAddr,
    timeout: std::time::Duration,
    retries: u32,
}

impl<'a, T: Transport> DiscoveryChannel for TransportDiscoveryChannel<'a, T> {
    fn round_trip<'b>(&'b self, request: &'b [u8]) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'b>> {
        Box::pin(async move {
            let bytes = self.transport.send(self.endpoint, request, self.timeout, self.retries).await?;
            Ok(bytes.to_vec())
        })
    }
}
