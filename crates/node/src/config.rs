// Copyright 2026 Printer Mutex Authors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime configuration. Deliberately CLI-flag only: spec.md §6 states the
//! system has "no environment variables, no persisted state", so there is
//! no config-file layer here even though the ambient stack otherwise
//! carries one (see `SPEC_FULL.md` §6.2).

use std::net::SocketAddr;
use std::time::Duration;

use crate::state::PeerConfig;

/// Default per-peer deadline for `RequestAccess` broadcasts (spec.md §4.4).
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(120);
/// Default per-peer deadline for `ReleaseAccess` broadcasts (spec.md §4.5).
pub const DEFAULT_RELEASE_TIMEOUT: Duration = Duration::from_secs(5);
/// Extra slack the driver allows beyond `ack_timeout` before declaring the
/// grant-drain wait itself timed out (spec.md §4.5 step 2).
pub const DEFAULT_DRAIN_SLACK: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub node_id: u32,
    pub listen: SocketAddr,
    pub peers: Vec<PeerConfig>,
    pub printer_addr: String,
    pub min_wait: Duration,
    pub max_wait: Duration,
    pub ack_timeout: Duration,
    pub release_timeout: Duration,
    pub drain_slack: Duration,
}

impl NodeConfig {
    /// Fails loudly rather than silently if the peer set contains this
    /// node's own id twice or contains `node_id` itself, matching
    /// spec.md §7's `InvariantViolation::DuplicateNodeId`.
    pub fn validate(&self) -> Result<(), crate::error::InvariantViolation> {
        use crate::error::InvariantViolation;
        use std::collections::HashSet;

        let mut seen = HashSet::new();
        seen.insert(self.node_id);
        for peer in &self.peers {
            if !seen.insert(peer.node_id) {
                return Err(InvariantViolation::DuplicateNodeId(peer.node_id));
            }
        }
        Ok(())
    }
}
