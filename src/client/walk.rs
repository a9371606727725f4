// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The walk state machine: fetches successive batches of varbinds across
//! one or more parallel OID roots, dedups, and yields a lazy stream.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    future::Future,
    pin::Pin,
};

use futures::stream::{self, Stream};
use tokio_util::sync::CancellationToken;

use crate::{
    error::{Result, SnmpClientError},
    oid::ObjectIdentifier,
    value::Value,
    varbind::VarBind,
};

/// Whether a `FaultySNMPImplementation` terminates the walk cleanly or
/// propagates to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkErrors {
    Strict,
    Warn,
}

/// Fetches the next batch of varbinds for a set of probe OIDs. Implemented
/// by `multigetnext` for plain walks, or by a closure over `bulkget` for
/// bulk walks.
pub type Fetcher<'a> =
    Box<dyn Fn(Vec<ObjectIdentifier>) -> Pin<Box<dyn Future<Output = Result<Vec<VarBind>>> + Send + 'a>> + Send + Sync + 'a>;

struct WalkState<'a> {
    fetcher: Fetcher<'a>,
    roots: Vec<ObjectIdentifier>,
    /// `root -> last probe sent for it`; absence means the root is either
    /// not yet started or already finished.
    unfinished: HashMap<ObjectIdentifier, ObjectIdentifier>,
    yielded: HashSet<ObjectIdentifier>,
    queue: VecDeque<VarBind>,
    started: bool,
    done: bool,
    errors: WalkErrors,
    cancel: CancellationToken,
}

/// Drives the walk loop described in the client façade's walk state
/// machine: call the fetcher with the current probes, assign results back
/// to the root that produced them, dedup, and mark roots unfinished while
/// their last returned OID keeps climbing inside the root's subtree.
///
/// `cancel` is raced against each fetch with `tokio::select!`; once
/// cancelled the stream ends cleanly (as if the walk had simply finished)
/// rather than yielding an error, since cancellation is a caller decision,
/// not a protocol fault.
pub fn walk_with_fetcher<'a>(
    roots: Vec<ObjectIdentifier>,
    errors: WalkErrors,
    fetcher: Fetcher<'a>,
    cancel: CancellationToken,
) -> impl Stream<Item = Result<VarBind>> + 'a {
    let state = WalkState {
        fetcher,
        roots,
        unfinished: HashMap::new(),
        yielded: HashSet::new(),
        queue: VecDeque::new(),
        started: false,
        done: false,
        errors,
        cancel,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(vb) = state.queue.pop_front() {
                return Some((Ok(vb), state));
            }
            if state.done || state.cancel.is_cancelled() {
                return None;
            }

            let probes: Vec<ObjectIdentifier> = if !state.started {
                state.started = true;
                state.roots.clone()
            } else if state.unfinished.is_empty() {
                state.done = true;
                continue;
            } else {
                state
                    .roots
                    .iter()
                    .filter_map(|r| state.unfinished.get(r).cloned())
                    .collect()
            };

            if probes.is_empty() {
                state.done = true;
                continue;
            }

            let fetched = tokio::select! {
                biased;
                () = state.cancel.cancelled() => {
                    state.done = true;
                    continue;
                },
                result = (state.fetcher)(probes.clone()) => result,
            };
            let fetched = match fetched {
                Ok(v) => v,
                Err(SnmpClientError::NoSuchOid(_)) => {
                    state.done = true;
                    continue;
                },
                Err(SnmpClientError::FaultySnmpImplementation(_)) if state.errors == WalkErrors::Warn => {
                    state.done = true;
                    continue;
                },
                Err(e) => return Some((Err(e), state)),
            };

            apply_batch(&mut state, &probes, fetched);
        }
    })
}

/// Assigns each returned varbind to the root whose probe preceded it
/// (columns cycle through the active probes in wire order for bulk
/// fetches, and 1:1 for plain getnext fetches), dedups, and recomputes
/// which roots remain unfinished.
fn apply_batch(state: &mut WalkState<'_>, probes: &[ObjectIdentifier], fetched: Vec<VarBind>) {
    let mut by_root: Vec<(ObjectIdentifier, VarBind)> = Vec::with_capacity(fetched.len());
    for (i, vb) in fetched.into_iter().enumerate() {
        let probe = &probes[i % probes.len()];
        let owner = state.roots.iter().find(|r| {
            let active_probe = state.unfinished.get(*r).unwrap_or(r);
            active_probe == probe
        });
        if let Some(owner) = owner {
            by_root.push((owner.clone(), vb));
        }
    }

    let mut sorted = by_root;
    sorted.sort_by(|a, b| a.1.oid.cmp(&b.1.oid));

    let mut last_per_root: HashMap<ObjectIdentifier, ObjectIdentifier> = HashMap::new();
    for (root, vb) in sorted {
        let in_subtree = root.contains(&vb.oid);
        if in_subtree && !state.yielded.contains(&vb.oid) {
            state.yielded.insert(vb.oid.clone());
            state.queue.push_back(vb.clone());
        }
        if in_subtree && !matches!(vb.value, Value::EndOfMibView) {
            last_per_root.insert(root, vb.oid);
        }
    }

    let roots = state.roots.clone();
    for root in &roots {
        let previous_probe = state.unfinished.get(root).cloned().unwrap_or_else(|| root.clone());
        match last_per_root.get(root) {
            Some(last_oid) if *last_oid > previous_probe && root.contains(last_oid) => {
                state.unfinished.insert(root.clone(), last_oid.clone());
            },
            _ => {
                state.unfinished.remove(root);
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn oid(s: &str) -> ObjectIdentifier {
        ObjectIdentifier::from_str_dotted(s).unwrap()
    }

    #[tokio::test]
    async fn walk_terminates_when_fetch_leaves_the_root() {
        let root = oid("1.3.6.1.2.1.1");
        let calls = std::sync::atomic::AtomicUsize::new(0);
        let fetcher: Fetcher<'_> = Box::new(move |probes| {
            let call = calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Box::pin(async move {
                if call == 0 {
                    Ok(vec![VarBind::new(oid("1.3.6.1.2.1.1.1.0"), Value::Integer(1))])
                } else {
                    let _ = probes;
                    Ok(vec![VarBind::new(oid("1.3.6.1.2.1.2.0"), Value::Integer(2))])
                }
            })
        });

        let stream = walk_with_fetcher(vec![root], WalkErrors::Strict, fetcher, CancellationToken::new());
        let results: Vec<_> = stream.collect().await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].as_ref().unwrap().oid, oid("1.3.6.1.2.1.1.1.0"));
    }

    #[tokio::test]
    async fn walk_dedups_overlapping_groups() {
        let root = oid("1.3.6.1.2.1.1");
        let calls = std::sync::atomic::AtomicUsize::new(0);
        let fetcher: Fetcher<'_> = Box::new(move |_probes| {
            let call = calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Box::pin(async move {
                if call == 0 {
                    Ok(vec![VarBind::new(oid("1.3.6.1.2.1.1.1.0"), Value::Integer(1))])
                } else {
                    Ok(vec![VarBind::new(oid("1.3.6.1.2.1.2.0"), Value::Integer(2))])
                }
            })
        });

        let stream = walk_with_fetcher(vec![root], WalkErrors::Strict, fetcher, CancellationToken::new());
        let results: Vec<_> = stream.collect().await;
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn faulty_implementation_warn_mode_terminates_cleanly() {
        let root = oid("1.3.6.1.2.1.1.5");
        let fetcher: Fetcher<'_> = Box::new(move |_probes| {
            Box::pin(async move {
                Err(SnmpClientError::FaultySnmpImplementation(
                    "getnext did not advance".to_string(),
                ))
            })
        });

        let stream = walk_with_fetcher(vec![root], WalkErrors::Warn, fetcher, CancellationToken::new());
        let results: Vec<_> = stream.collect().await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn faulty_implementation_strict_mode_propagates() {
        let root = oid("1.3.6.1.2.1.1.5");
        let fetcher: Fetcher<'_> = Box::new(move |_probes| {
            Box::pin(async move {
                Err(SnmpClientError::FaultySnmpImplementation(
                    "getnext did not advance".to_string(),
                ))
            })
        });

        let stream = walk_with_fetcher(vec![root], WalkErrors::Strict, fetcher, CancellationToken::new());
        let results: Vec<_> = stream.collect().await;
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }
}
