// Copyright 2026 Printer Mutex Authors
// SPDX-License-Identifier: MIT OR Apache-2.0

use clap::Parser;
use printmutex_node::cli::Args;
use printmutex_node::config::NodeConfig;
use printmutex_node::{serve_rpc, Node};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&args.log_level))
        .init();

    let min_wait: std::time::Duration = args.min_wait.into();
    let max_wait: std::time::Duration = args.max_wait.into();
    let listen = args.listen;
    let node_id = args.id;

    let config: NodeConfig = args.into();
    let node = Node::new(config)?;

    info!(node_id, %listen, "starting peer RPC server");
    let rpc_server = node.rpc_server();
    let rpc_task = tokio::spawn(async move { serve_rpc(listen, rpc_server).await });

    let workload = node.workload_generator(min_wait, max_wait);
    tokio::spawn(async move { workload.run().await });

    tokio::select! {
        res = rpc_task => {
            res??;
        }
        _ = tokio::signal::ctrl_c() => {
            info!(node_id, "received interrupt, shutting down");
        }
    }

    Ok(())
}
