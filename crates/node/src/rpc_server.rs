// Copyright 2026 Printer Mutex Authors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The peer-facing half of `MutualExclusionService`: handles inbound
//! `RequestAccess`/`ReleaseAccess` from other nodes and applies the
//! deferral policy (spec.md §4.3). Every request here runs concurrently
//! with every other inbound request and with the local driver; the only
//! shared state is the [`NodeState`] passed in.

use std::sync::Arc;

use printmutex_proto::mutex::mutual_exclusion_service_server::MutualExclusionService;
use printmutex_proto::mutex::{AccessRelease, AccessRequest, AccessResponse, Empty};
use tonic::{Request, Response, Status};
use tracing::{debug, info};

use crate::state::{NodeState, RequestKey};

/// Server-side implementation of `MutualExclusionService`, shared behind an
/// `Arc` with the driver and broadcaster that also read/write `NodeState`.
#[derive(Clone)]
pub struct PeerServer {
    state: Arc<NodeState>,
}

impl PeerServer {
    pub fn new(state: Arc<NodeState>) -> Self {
        Self { state }
    }
}

#[tonic::async_trait]
impl MutualExclusionService for PeerServer {
    async fn request_access(
        &self,
        request: Request<AccessRequest>,
    ) -> Result<Response<AccessResponse>, Status> {
        let req = request.into_inner();
        self.state.clock.observe(req.lamport_timestamp);

        let their_key = RequestKey {
            ts: req.lamport_timestamp,
            node_id: req.client_id,
        };

        debug!(
            node_id = self.state.node_id,
            from = req.client_id,
            their_ts = req.lamport_timestamp,
            their_request_number = req.request_number,
            "received RequestAccess, checking deferral predicate"
        );

        // Eventually grants; may hold the reply open until our own state
        // permits it. This is the "long-held unary reply" the deferral
        // policy depends on (spec.md §4.3).
        self.state.wait_until_grantable(their_key).await;

        let ts = self.state.clock.tick();
        info!(
            node_id = self.state.node_id,
            grant_to = req.client_id,
            ts,
            "granting RequestAccess"
        );

        Ok(Response::new(AccessResponse {
            access_granted: true,
            lamport_timestamp: ts,
        }))
    }

    async fn release_access(
        &self,
        request: Request<AccessRelease>,
    ) -> Result<Response<Empty>, Status> {
        let rel = request.into_inner();
        self.state.clock.observe(rel.lamport_timestamp);
        debug!(
            node_id = self.state.node_id,
            from = rel.client_id,
            their_ts = rel.lamport_timestamp,
            "received ReleaseAccess (advisory, clock-only)"
        );
        Ok(Response::new(Empty {}))
    }
}
