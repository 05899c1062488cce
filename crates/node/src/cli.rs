// Copyright 2026 Printer Mutex Authors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line surface for the node binary (spec.md §6). All duration
//! flags parse via `humantime`, matching the teacher's convention of
//! human-readable duration inputs.

use std::net::SocketAddr;

use clap::Parser;

use crate::config::{NodeConfig, DEFAULT_DRAIN_SLACK};
use crate::state::PeerConfig;

/// A peer-coordinating node in the distributed printer mutex.
#[derive(Parser, Debug)]
#[command(name = "printmutex-node", version, about)]
pub struct Args {
    /// This node's id. Must be unique across the whole peer set.
    #[arg(long)]
    pub id: u32,

    /// Address this node's peer RPC server binds.
    #[arg(long)]
    pub listen: SocketAddr,

    /// A peer's `id=host:port`. Repeatable, one per peer.
    #[arg(long = "peer", value_parser = parse_peer)]
    pub peers: Vec<PeerConfig>,

    /// The dumb print server's address.
    #[arg(long)]
    pub printer: String,

    /// Workload interval lower bound.
    #[arg(long, default_value = "3s")]
    pub min_wait: humantime::Duration,

    /// Workload interval upper bound.
    #[arg(long, default_value = "7s")]
    pub max_wait: humantime::Duration,

    /// Per-peer `RequestAccess` deadline.
    #[arg(long, default_value = "120s")]
    pub ack_timeout: humantime::Duration,

    /// Per-peer `ReleaseAccess` deadline.
    #[arg(long, default_value = "5s")]
    pub release_timeout: humantime::Duration,

    /// tracing-subscriber EnvFilter directive.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

fn parse_peer(s: &str) -> Result<PeerConfig, String> {
    let (id, addr) = s
        .split_once('=')
        .ok_or_else(|| format!("expected `id=host:port`, got `{s}`"))?;
    let node_id: u32 = id
        .parse()
        .map_err(|_| format!("invalid peer id `{id}` in `{s}`"))?;
    Ok(PeerConfig {
        node_id,
        addr: addr.to_string(),
    })
}

impl From<Args> for NodeConfig {
    fn from(args: Args) -> Self {
        NodeConfig {
            node_id: args.id,
            listen: args.listen,
            peers: args.peers,
            printer_addr: args.printer,
            min_wait: args.min_wait.into(),
            max_wait: args.max_wait.into(),
            ack_timeout: args.ack_timeout.into(),
            release_timeout: args.release_timeout.into(),
            drain_slack: DEFAULT_DRAIN_SLACK,
        }
    }
}
