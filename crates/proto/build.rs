// Copyright 2026 Printer Mutex Authors
// SPDX-License-Identifier: MIT OR Apache-2.0

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tonic_build::configure().compile_protos(
        &["proto/mutual_exclusion.proto", "proto/printing.proto"],
        &["proto"],
    )?;
    Ok(())
}
