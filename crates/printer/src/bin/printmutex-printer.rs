// Copyright 2026 Printer Mutex Authors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use printmutex_printer::DumbPrinter;
use printmutex_proto::printing::printing_service_server::PrintingServiceServer;
use tonic::transport::Server;
use tracing::info;

/// The dumb print server: a single external collaborator print clients
/// serialize access to via the Ricart-Agrawala protocol.
#[derive(Parser, Debug)]
#[command(name = "printmutex-printer", version, about)]
struct Args {
    /// Address this server binds its PrintingService RPC endpoint on.
    #[arg(long, default_value = "0.0.0.0:50051")]
    listen: SocketAddr,

    /// Lower bound of the simulated printing delay.
    #[arg(long, default_value = "2s")]
    min_delay: humantime::Duration,

    /// Upper bound of the simulated printing delay.
    #[arg(long, default_value = "3s")]
    max_delay: humantime::Duration,

    /// tracing-subscriber EnvFilter directive, e.g. "info" or "printmutex=debug".
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&args.log_level))
        .init();

    let min_delay: Duration = args.min_delay.into();
    let max_delay: Duration = args.max_delay.into();
    let printer = DumbPrinter::new(min_delay, max_delay);

    info!(addr = %args.listen, "dumb print server starting");
    Server::builder()
        .add_service(PrintingServiceServer::new(printer))
        .serve(args.listen)
        .await?;

    Ok(())
}
