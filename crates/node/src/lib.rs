// Copyright 2026 Printer Mutex Authors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ricart-Agrawala distributed mutual exclusion, layered on Lamport logical
//! clocks, for a shared single-threaded printer resource. See `SPEC_FULL.md`
//! at the workspace root for the full design.

pub mod broadcaster;
pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod rpc_server;
pub mod state;
pub mod workload;

use std::net::SocketAddr;
use std::sync::Arc;

use printmutex_proto::mutex::mutual_exclusion_service_server::MutualExclusionServiceServer;
use tonic::transport::Server;

use broadcaster::RequestBroadcaster;
use config::NodeConfig;
use driver::CriticalSectionDriver;
use rpc_server::PeerServer;
use state::NodeState;
use workload::WorkloadGenerator;

/// A fully wired node: shared state plus the driver used to run attempts.
/// Constructing one does not bind any sockets or start any background
/// tasks — callers combine [`Node::rpc_server`], [`serve_rpc`] and
/// [`Node::workload_generator`] as needed, which is what lets integration
/// tests spin up several nodes in one process (spec.md §9).
pub struct Node {
    pub state: Arc<NodeState>,
    pub driver: Arc<CriticalSectionDriver>,
    pub listen: SocketAddr,
}

impl Node {
    pub fn new(config: NodeConfig) -> anyhow::Result<Self> {
        if let Err(violation) = config.validate() {
            error::fatal(violation);
        }

        let state = Arc::new(NodeState::new(config.node_id, config.peers.clone()));
        let broadcaster = RequestBroadcaster::new(Arc::clone(&state))?;
        let driver = Arc::new(CriticalSectionDriver::new(
            Arc::clone(&state),
            broadcaster,
            &config.printer_addr,
            config.ack_timeout,
            config.release_timeout,
            config.drain_slack,
        )?);

        Ok(Self {
            state,
            driver,
            listen: config.listen,
        })
    }

    pub fn rpc_server(&self) -> PeerServer {
        PeerServer::new(Arc::clone(&self.state))
    }

    pub fn workload_generator(
        &self,
        min_wait: std::time::Duration,
        max_wait: std::time::Duration,
    ) -> WorkloadGenerator {
        WorkloadGenerator::new(Arc::clone(&self.driver), self.state.node_id, min_wait, max_wait)
    }
}

/// Serves `MutualExclusionService` on `listen` until the future is dropped
/// or the server errors. Intended to be spawned as its own task.
pub async fn serve_rpc(listen: SocketAddr, server: PeerServer) -> anyhow::Result<()> {
    Server::builder()
        .add_service(MutualExclusionServiceServer::new(server))
        .serve(listen)
        .await?;
    Ok(())
}
