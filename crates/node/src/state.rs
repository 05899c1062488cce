// Copyright 2026 Printer Mutex Authors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-node aggregate state: the Ricart-Agrawala state machine, the
//! current request tuple, and the set of peers still owed a grant for the
//! in-flight attempt. Exactly one [`NodeState`] exists per logical node;
//! tests construct several in the same process to exercise the protocol
//! without a real network (spec.md §9: "NodeState is deliberately
//! per-instance, not process-global").

use std::collections::HashSet;
use std::fmt;

use parking_lot::Mutex;
use printmutex_clock::LamportClock;
use tokio::sync::Notify;

use crate::error::{InvariantViolation, NodeError};

/// A configured peer this node calls `RequestAccess`/`ReleaseAccess` on.
#[derive(Debug, Clone)]
pub struct PeerConfig {
    pub node_id: u32,
    pub addr: String,
}

/// The three states of the Ricart-Agrawala state machine (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaState {
    Released,
    Wanted,
    Held,
}

impl fmt::Display for RaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RaState::Released => "RELEASED",
            RaState::Wanted => "WANTED",
            RaState::Held => "HELD",
        };
        write!(f, "{s}")
    }
}

/// The `(timestamp, node_id)` priority tuple. Smaller is higher priority;
/// ties are impossible across distinct nodes because `node_id` is unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestKey {
    pub ts: u64,
    pub node_id: u32,
}

/// A locally originated critical-section attempt's full identity. Carries
/// `request_number` only for logging/correlation (spec.md §9): it must
/// never participate in ordering decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTuple {
    pub ts: u64,
    pub node_id: u32,
    pub request_number: u64,
}

impl RequestTuple {
    pub fn key(&self) -> RequestKey {
        RequestKey {
            ts: self.ts,
            node_id: self.node_id,
        }
    }
}

struct Inner {
    ra_state: RaState,
    request_number: u64,
    my_request: Option<RequestTuple>,
    outstanding_grants: HashSet<u32>,
}

/// Shared, per-node aggregate. Cheap to construct, meant to live behind an
/// `Arc` shared between the RPC server, the broadcaster, the driver and the
/// workload generator.
pub struct NodeState {
    pub node_id: u32,
    pub peers: Vec<PeerConfig>,
    pub clock: LamportClock,
    inner: Mutex<Inner>,
    /// Woken on every transition out of HELD or out of WANTED (aborted or
    /// completed), per spec.md §5. Guard is always dropped before awaiting
    /// this, so the lock is never held across a suspension point.
    notify: Notify,
}

impl NodeState {
    pub fn new(node_id: u32, peers: Vec<PeerConfig>) -> Self {
        Self {
            node_id,
            peers,
            clock: LamportClock::new(),
            inner: Mutex::new(Inner {
                ra_state: RaState::Released,
                request_number: 0,
                my_request: None,
                outstanding_grants: HashSet::new(),
            }),
            notify: Notify::new(),
        }
    }

    pub fn ra_state(&self) -> RaState {
        self.inner.lock().ra_state
    }

    pub fn my_request(&self) -> Option<RequestTuple> {
        self.inner.lock().my_request
    }

    /// RELEASED -> WANTED: stamps a fresh request tuple and resets the
    /// outstanding-grants set to the full peer set (spec.md §4.2).
    pub fn enter_wanted(&self) -> RequestTuple {
        let mut inner = self.inner.lock();
        debug_assert_eq!(inner.ra_state, RaState::Released);
        inner.request_number += 1;
        let ts = self.clock.tick();
        let request = RequestTuple {
            ts,
            node_id: self.node_id,
            request_number: inner.request_number,
        };
        inner.ra_state = RaState::Wanted;
        inner.my_request = Some(request);
        inner.outstanding_grants = self.peers.iter().map(|p| p.node_id).collect();
        request
    }

    /// Removes `peer_id` from the outstanding-grants set for the current
    /// attempt. Returns `true` if that drained the set to empty.
    pub fn record_grant(&self, peer_id: u32) -> bool {
        let mut inner = self.inner.lock();
        inner.outstanding_grants.remove(&peer_id);
        inner.outstanding_grants.is_empty()
    }

    /// WANTED -> HELD, once the broadcaster has observed the grant-drain
    /// signal. No notification: becoming HELD only ever makes inbound
    /// deferral *more* restrictive, so nothing blocked on `notify` could
    /// newly unblock because of it.
    pub fn enter_held(&self) {
        let mut inner = self.inner.lock();
        if inner.ra_state != RaState::Wanted {
            crate::error::fatal(InvariantViolation::HeldWithoutRequest);
        }
        inner.ra_state = RaState::Held;
    }

    /// HELD -> RELEASED: clears `my_request` and wakes every inbound
    /// handler parked on the deferral predicate (spec.md §4.2).
    pub fn exit_held(&self) {
        {
            let mut inner = self.inner.lock();
            debug_assert_eq!(inner.ra_state, RaState::Held);
            inner.ra_state = RaState::Released;
            inner.my_request = None;
            inner.outstanding_grants.clear();
        }
        self.notify.notify_waiters();
    }

    /// WANTED -> RELEASED: the grant-drain deadline elapsed. Aborts the
    /// attempt cleanly (spec.md §4.5 step 2) and wakes deferred handlers,
    /// since this node is no longer WANTED and may have been the reason
    /// they were waiting.
    pub fn abort_wanted(&self) {
        {
            let mut inner = self.inner.lock();
            debug_assert_eq!(inner.ra_state, RaState::Wanted);
            inner.ra_state = RaState::Released;
            inner.my_request = None;
            inner.outstanding_grants.clear();
        }
        self.notify.notify_waiters();
    }

    /// Evaluates the inbound `RequestAccess` deferral predicate
    /// (spec.md §4.3 step 3) and, if it doesn't yet hold, awaits the next
    /// state transition before re-checking. Never holds the state lock
    /// across the await.
    pub async fn wait_until_grantable(&self, their_key: RequestKey) {
        loop {
            let notified = {
                let inner = self.inner.lock();
                if Self::grantable(&inner, their_key) {
                    return;
                }
                // Register interest before dropping the guard so a
                // transition landing between the check and the await is
                // never missed.
                self.notify.notified()
            };
            notified.await;
        }
    }

    fn grantable(inner: &Inner, their_key: RequestKey) -> bool {
        match inner.ra_state {
            RaState::Released => true,
            RaState::Held => false,
            RaState::Wanted => {
                let my_key = inner
                    .my_request
                    .expect("my_request is set whenever ra_state != Released")
                    .key();
                my_key > their_key
            }
        }
    }
}

/// Maps an [`NodeError::Transport`] for a named target, used by both the
/// broadcaster and the critical-section driver's printer call.
pub fn transport_error(target: impl Into<String>, source: tonic::Status) -> NodeError {
    NodeError::Transport {
        target: target.into(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peers(ids: &[u32]) -> Vec<PeerConfig> {
        ids.iter()
            .map(|&id| PeerConfig {
                node_id: id,
                addr: format!("127.0.0.1:{id}"),
            })
            .collect()
    }

    #[test]
    fn released_grants_immediately() {
        let node = NodeState::new(1, peers(&[2, 3]));
        let inner = node.inner.lock();
        assert!(NodeState::grantable(&inner, RequestKey { ts: 1, node_id: 99 }));
    }

    #[test]
    fn held_always_defers() {
        let node = NodeState::new(1, peers(&[2]));
        node.enter_wanted();
        node.enter_held();
        let inner = node.inner.lock();
        assert!(!NodeState::grantable(
            &inner,
            RequestKey { ts: 0, node_id: 0 }
        ));
    }

    #[test]
    fn wanted_grants_only_to_higher_priority() {
        let node = NodeState::new(5, peers(&[2]));
        let mine = node.enter_wanted(); // ts=1, node_id=5 -> key (1,5)
        let inner = node.inner.lock();
        assert!(NodeState::grantable(&inner, RequestKey { ts: 0, node_id: 1 }));
        assert!(!NodeState::grantable(
            &inner,
            RequestKey {
                ts: mine.ts,
                node_id: 9,
            }
        ));
    }

    #[test]
    fn enter_wanted_resets_outstanding_to_full_peer_set() {
        let node = NodeState::new(1, peers(&[2, 3, 4]));
        node.enter_wanted();
        let inner = node.inner.lock();
        assert_eq!(inner.outstanding_grants.len(), 3);
    }

    #[test]
    fn record_grant_drains_to_empty() {
        let node = NodeState::new(1, peers(&[2, 3]));
        node.enter_wanted();
        assert!(!node.record_grant(2));
        assert!(node.record_grant(3));
    }
}
