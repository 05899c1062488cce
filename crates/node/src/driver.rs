// Copyright 2026 Printer Mutex Authors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The critical-section driver: the single entry point that takes a node
//! from RELEASED through WANTED and HELD back to RELEASED around one call
//! to the external printing service (spec.md §4.5).

use std::sync::Arc;
use std::time::Duration;

use printmutex_proto::printing::printing_service_client::PrintingServiceClient;
use printmutex_proto::printing::PrintRequest;
use tonic::transport::{Channel, Endpoint};
use tracing::{error, info};

use crate::broadcaster::RequestBroadcaster;
use crate::state::{NodeState, RequestTuple};

/// Outcome of one `request_and_run` attempt, returned to the workload
/// generator (or any other caller).
pub struct AttemptOutcome {
    pub ok: bool,
    pub info: String,
}

pub struct CriticalSectionDriver {
    state: Arc<NodeState>,
    broadcaster: RequestBroadcaster,
    printer: PrintingServiceClient<Channel>,
    ack_timeout: Duration,
    release_timeout: Duration,
    drain_slack: Duration,
}

impl CriticalSectionDriver {
    pub fn new(
        state: Arc<NodeState>,
        broadcaster: RequestBroadcaster,
        printer_addr: &str,
        ack_timeout: Duration,
        release_timeout: Duration,
        drain_slack: Duration,
    ) -> anyhow::Result<Self> {
        let endpoint = Endpoint::from_shared(format!("http://{printer_addr}"))?;
        let printer = PrintingServiceClient::new(endpoint.connect_lazy());
        Ok(Self {
            state,
            broadcaster,
            printer,
            ack_timeout,
            release_timeout,
            drain_slack,
        })
    }

    /// Runs one full attempt: WANTED -> (HELD -> print) -> RELEASED, or
    /// WANTED -> RELEASED on grant-drain timeout. Errors from the printer
    /// call do not skip the release step (spec.md §4.5 step 4 / §7).
    pub async fn request_and_run(&self, payload: String) -> AttemptOutcome {
        let request = self.state.enter_wanted();
        info!(
            node_id = self.state.node_id,
            ts = request.ts,
            request_number = request.request_number,
            "entering WANTED"
        );

        let drain = self
            .broadcaster
            .broadcast_request(request, self.ack_timeout);
        let drain_deadline = self.ack_timeout + self.drain_slack;

        if tokio::time::timeout(drain_deadline, drain).await.is_err() {
            error!(
                node_id = self.state.node_id,
                request_number = request.request_number,
                "grant-drain timed out, aborting attempt"
            );
            self.state.abort_wanted();
            self.broadcaster
                .broadcast_release(self.release_tuple(request), self.release_timeout)
                .await;
            return AttemptOutcome {
                ok: false,
                info: "timeout".to_string(),
            };
        }

        self.state.enter_held();
        info!(
            node_id = self.state.node_id,
            request_number = request.request_number,
            "entered HELD"
        );

        let outcome = self.run_critical_section(request, &payload).await;

        self.state.exit_held();
        info!(
            node_id = self.state.node_id,
            request_number = request.request_number,
            "released"
        );
        self.broadcaster
            .broadcast_release(self.release_tuple(request), self.release_timeout)
            .await;

        outcome
    }

    /// `broadcast_release` must carry a fresh timestamp, not the stale one
    /// captured when the attempt entered WANTED: the critical section's own
    /// printer round trip has already ticked/observed the clock forward by
    /// the time release is broadcast, and every outbound message's
    /// timestamp must be strictly increasing (spec.md §8).
    fn release_tuple(&self, request: RequestTuple) -> RequestTuple {
        RequestTuple {
            ts: self.state.clock.tick(),
            ..request
        }
    }

    async fn run_critical_section(
        &self,
        request: crate::state::RequestTuple,
        payload: &str,
    ) -> AttemptOutcome {
        let ts = self.state.clock.tick();
        let req = PrintRequest {
            client_id: self.state.node_id,
            message_content: payload.to_string(),
            lamport_timestamp: ts,
            request_number: request.request_number,
        };

        match self.printer.clone().send_to_printer(req).await {
            Ok(resp) => {
                let resp = resp.into_inner();
                self.state.clock.observe(resp.lamport_timestamp);
                AttemptOutcome {
                    ok: resp.success,
                    info: resp.confirmation_message,
                }
            }
            Err(status) => {
                error!(node_id = self.state.node_id, error = %status, "printer call failed");
                AttemptOutcome {
                    ok: false,
                    info: status.to_string(),
                }
            }
        }
    }
}
