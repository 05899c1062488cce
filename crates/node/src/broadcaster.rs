// Copyright 2026 Printer Mutex Authors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fans `RequestAccess`/`ReleaseAccess` out to every peer in parallel
//! (spec.md §4.4). A crashed or unreachable peer is treated as having
//! granted — the known didactic safety/liveness tradeoff documented in
//! spec.md §9 and `DESIGN.md`.

use std::sync::Arc;
use std::time::Duration;

use printmutex_proto::mutex::mutual_exclusion_service_client::MutualExclusionServiceClient;
use printmutex_proto::mutex::{AccessRelease, AccessRequest};
use tonic::transport::{Channel, Endpoint};
use tracing::warn;

use crate::state::{NodeState, PeerConfig, RequestTuple};

#[derive(Clone)]
struct PeerClient {
    config: PeerConfig,
    client: MutualExclusionServiceClient<Channel>,
}

/// Holds one lazily-connecting channel per peer so broadcasts don't pay
/// connection setup cost on every attempt.
#[derive(Clone)]
pub struct RequestBroadcaster {
    state: Arc<NodeState>,
    peers: Vec<PeerClient>,
}

impl RequestBroadcaster {
    pub fn new(state: Arc<NodeState>) -> anyhow::Result<Self> {
        let mut peers = Vec::with_capacity(state.peers.len());
        for config in &state.peers {
            let endpoint = Endpoint::from_shared(format!("http://{}", config.addr))?;
            let client = MutualExclusionServiceClient::new(endpoint.connect_lazy());
            peers.push(PeerClient {
                config: config.clone(),
                client,
            });
        }
        Ok(Self { state, peers })
    }

    /// Sends `RequestAccess` to every peer concurrently, each bounded by
    /// `ack_timeout`. Blocks until every peer has either replied or its
    /// call has terminated (success or failure) — the grant-drain
    /// condition in spec.md §4.4.
    pub async fn broadcast_request(&self, request: RequestTuple, ack_timeout: Duration) {
        if self.peers.is_empty() {
            return;
        }

        let mut set = tokio::task::JoinSet::new();
        for peer in self.peers.clone() {
            let state = Arc::clone(&self.state);
            let req = AccessRequest {
                client_id: request.node_id,
                lamport_timestamp: request.ts,
                request_number: request.request_number,
            };
            set.spawn(async move {
                let mut client = peer.client;
                let call = client.request_access(tonic::Request::new(req));
                match tokio::time::timeout(ack_timeout, call).await {
                    Ok(Ok(resp)) => {
                        let resp = resp.into_inner();
                        state.clock.observe(resp.lamport_timestamp);
                    }
                    Ok(Err(status)) => {
                        warn!(
                            peer = %peer.config.addr,
                            error = %status,
                            "RequestAccess failed, treating as granted"
                        );
                    }
                    Err(_) => {
                        warn!(
                            peer = %peer.config.addr,
                            timeout_s = ack_timeout.as_secs_f64(),
                            "RequestAccess timed out, treating as granted"
                        );
                    }
                }
                state.record_grant(peer.config.node_id);
            });
        }

        while set.join_next().await.is_some() {}
    }

    /// Sends `ReleaseAccess` to every peer concurrently; failures are
    /// logged and otherwise ignored (spec.md §4.5 step 6).
    pub async fn broadcast_release(&self, release: RequestTuple, release_timeout: Duration) {
        if self.peers.is_empty() {
            return;
        }

        let mut set = tokio::task::JoinSet::new();
        for peer in self.peers.clone() {
            let rel = AccessRelease {
                client_id: release.node_id,
                lamport_timestamp: release.ts,
                request_number: release.request_number,
            };
            set.spawn(async move {
                let mut client = peer.client;
                let call = client.release_access(tonic::Request::new(rel));
                match tokio::time::timeout(release_timeout, call).await {
                    Ok(Ok(_)) => {}
                    Ok(Err(status)) => {
                        warn!(peer = %peer.config.addr, error = %status, "ReleaseAccess failed");
                    }
                    Err(_) => {
                        warn!(
                            peer = %peer.config.addr,
                            timeout_s = release_timeout.as_secs_f64(),
                            "ReleaseAccess timed out"
                        );
                    }
                }
            });
        }

        while set.join_next().await.is_some() {}
    }
}
