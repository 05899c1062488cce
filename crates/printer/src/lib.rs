// Copyright 2026 Printer Mutex Authors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The "dumb" print server. It has no concept of mutual exclusion: it
//! accepts whatever [`PrintRequest`] arrives, holds it for a randomized
//! delay to simulate a physical printer's single-job-at-a-time pace, and
//! acknowledges it. Serializing access across clients is entirely the
//! mutual-exclusion protocol's job, not this service's.

use std::ops::RangeInclusive;
use std::time::Duration;

use printmutex_proto::printing::printing_service_server::PrintingService;
use printmutex_proto::printing::{PrintRequest, PrintResponse};
use rand::Rng;
use tonic::{Request, Response, Status};
use tracing::info;

/// Server-side implementation of `PrintingService`.
#[derive(Debug, Clone)]
pub struct DumbPrinter {
    delay: RangeInclusive<Duration>,
}

impl DumbPrinter {
    pub fn new(min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            delay: min_delay..=max_delay,
        }
    }
}

#[tonic::async_trait]
impl PrintingService for DumbPrinter {
    async fn send_to_printer(
        &self,
        request: Request<PrintRequest>,
    ) -> Result<Response<PrintResponse>, Status> {
        let req = request.into_inner();
        let delay = {
            let mut rng = rand::thread_rng();
            rng.gen_range(*self.delay.start()..=*self.delay.end())
        };

        info!(
            client_id = req.client_id,
            ts = req.lamport_timestamp,
            request_number = req.request_number,
            message = %req.message_content,
            "printing job"
        );
        tokio::time::sleep(delay).await;

        Ok(Response::new(PrintResponse {
            success: true,
            confirmation_message: format!(
                "printed for client {} in {:.2}s",
                req.client_id,
                delay.as_secs_f64()
            ),
            lamport_timestamp: req.lamport_timestamp,
        }))
    }
}
