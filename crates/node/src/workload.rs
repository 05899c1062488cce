// Copyright 2026 Printer Mutex Authors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodically synthesizes print jobs and drives them through the
//! critical-section driver (spec.md §4.6). Independent of protocol
//! correctness — it only exists to exercise the system.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::info;

use crate::driver::CriticalSectionDriver;

pub struct WorkloadGenerator {
    driver: Arc<CriticalSectionDriver>,
    node_id: u32,
    min_wait: Duration,
    max_wait: Duration,
}

impl WorkloadGenerator {
    pub fn new(
        driver: Arc<CriticalSectionDriver>,
        node_id: u32,
        min_wait: Duration,
        max_wait: Duration,
    ) -> Self {
        Self {
            driver,
            node_id,
            min_wait,
            max_wait,
        }
    }

    /// A uniformly random interval in `[min_wait, max_wait]`, or `min_wait`
    /// itself if the range is empty/inverted.
    fn next_wait(&self) -> Duration {
        if self.min_wait < self.max_wait {
            rand::thread_rng().gen_range(self.min_wait..=self.max_wait)
        } else {
            self.min_wait
        }
    }

    /// Runs forever, sleeping a uniformly random interval in
    /// `[min_wait, max_wait]` between jobs (default ~3-7s per
    /// `original_source/client_node.py`'s `run_workload`).
    pub async fn run(&self) -> ! {
        let mut job_number: u64 = 0;
        loop {
            let wait = self.next_wait();
            tokio::time::sleep(wait).await;

            job_number += 1;
            let payload = format!("hello from client {} (job {job_number})", self.node_id);
            info!(node_id = self.node_id, job_number, "requesting CS entry");

            let outcome = self.driver.request_and_run(payload).await;
            info!(
                node_id = self.node_id,
                job_number,
                ok = outcome.ok,
                info = %outcome.info,
                "job complete"
            );
        }
    }
}
