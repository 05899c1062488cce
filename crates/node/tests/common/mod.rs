// Copyright 2026 Printer Mutex Authors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Spins up several in-process nodes plus an in-process printer on
//! OS-assigned loopback ports, so the protocol scenarios in
//! `scenarios.rs` can run without touching a real network
//! (spec.md §9: "tests must be able to run multiple logical nodes
//! in-process").

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use printmutex_node::config::NodeConfig;
use printmutex_node::state::PeerConfig;
use printmutex_node::Node;
use printmutex_proto::printing::printing_service_server::{PrintingService, PrintingServiceServer};
use printmutex_proto::printing::{PrintRequest, PrintResponse};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::{Request, Response, Status};

pub async fn bind_loopback() -> (SocketAddr, TcpListener) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (addr, listener)
}

/// Starts the dumb printer on a fast, fixed simulated delay so tests don't
/// spend wall-clock time on it.
pub async fn start_test_printer() -> SocketAddr {
    let (addr, listener) = bind_loopback().await;
    let printer =
        printmutex_printer::DumbPrinter::new(Duration::from_millis(1), Duration::from_millis(2));
    tokio::spawn(async move {
        tonic::transport::Server::builder()
            .add_service(PrintingServiceServer::new(printer))
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
            .unwrap();
    });
    addr
}

/// One observed `SendToPrinter` call: who made it, and the wall-clock
/// interval the printer held it for. Since every HELD section ends in
/// exactly one printer call (`driver::run_critical_section`), non-overlap
/// of these intervals across nodes is a direct, externally observable
/// witness of mutual exclusion.
pub type PrintLog = Arc<Mutex<Vec<(u32, Instant, Instant)>>>;

#[derive(Clone)]
struct RecordingPrinter {
    delay: Duration,
    log: PrintLog,
}

#[tonic::async_trait]
impl PrintingService for RecordingPrinter {
    async fn send_to_printer(
        &self,
        request: Request<PrintRequest>,
    ) -> Result<Response<PrintResponse>, Status> {
        let req = request.into_inner();
        let start = Instant::now();
        tokio::time::sleep(self.delay).await;
        let end = Instant::now();
        self.log.lock().push((req.client_id, start, end));

        Ok(Response::new(PrintResponse {
            success: true,
            confirmation_message: format!("printed for client {}", req.client_id),
            lamport_timestamp: req.lamport_timestamp,
        }))
    }
}

/// Like [`start_test_printer`], but records every call's start/end instant
/// so scenario tests can assert non-overlap directly instead of inferring
/// it from timing.
pub async fn start_recording_printer() -> (SocketAddr, PrintLog) {
    let (addr, listener) = bind_loopback().await;
    let log: PrintLog = Arc::new(Mutex::new(Vec::new()));
    let printer = RecordingPrinter {
        delay: Duration::from_millis(20),
        log: Arc::clone(&log),
    };
    tokio::spawn(async move {
        tonic::transport::Server::builder()
            .add_service(PrintingServiceServer::new(printer))
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
            .unwrap();
    });
    (addr, log)
}

/// Asserts that no two recorded intervals overlap, i.e. that the printer
/// was never entered by two clients at once.
pub fn assert_non_overlapping(log: &PrintLog) {
    let mut entries = log.lock().clone();
    entries.sort_by_key(|(_, start, _)| *start);
    for pair in entries.windows(2) {
        let (prev_id, _, prev_end) = pair[0];
        let (next_id, next_start, _) = pair[1];
        assert!(
            prev_end <= next_start,
            "client {next_id}'s print overlapped client {prev_id}'s print"
        );
    }
}

/// A running node under test: its `Node` handle (state + driver), the
/// address peers reach its RPC server on, and the spawned server task so
/// tests can simulate a crash by aborting it.
pub struct TestNode {
    pub node: Node,
    pub addr: SocketAddr,
    pub server: JoinHandle<()>,
}

/// Binds `count` peer RPC listeners up front (so every node can be told
/// every other node's real address), then constructs and serves each
/// `Node`.
pub async fn start_cluster(count: u32, printer_addr: SocketAddr) -> Vec<TestNode> {
    let mut listeners = Vec::new();
    for _ in 0..count {
        listeners.push(bind_loopback().await);
    }
    let addrs: Vec<SocketAddr> = listeners.iter().map(|(addr, _)| *addr).collect();

    let mut nodes = Vec::new();
    for (i, (addr, listener)) in listeners.into_iter().enumerate() {
        let node_id = (i + 1) as u32;
        let peers: Vec<PeerConfig> = addrs
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(j, a)| PeerConfig {
                node_id: (j + 1) as u32,
                addr: a.to_string(),
            })
            .collect();

        let config = NodeConfig {
            node_id,
            listen: addr,
            peers,
            printer_addr: printer_addr.to_string(),
            min_wait: Duration::from_secs(3),
            max_wait: Duration::from_secs(7),
            ack_timeout: Duration::from_millis(500),
            release_timeout: Duration::from_millis(200),
            drain_slack: Duration::from_millis(200),
        };

        let node = Node::new(config).unwrap();
        let server = node.rpc_server();
        let server_handle = tokio::spawn(async move {
            tonic::transport::Server::builder()
                .add_service(
                    printmutex_proto::mutex::mutual_exclusion_service_server::MutualExclusionServiceServer::new(
                        server,
                    ),
                )
                .serve_with_incoming(TcpListenerStream::new(listener))
                .await
                .unwrap();
        });

        nodes.push(TestNode {
            node,
            addr,
            server: server_handle,
        });
    }

    // Give the listeners a moment to start accepting before returning.
    tokio::time::sleep(Duration::from_millis(20)).await;
    nodes
}
