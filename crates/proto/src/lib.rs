// Copyright 2026 Printer Mutex Authors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generated gRPC types shared between every node binary. Field names match
//! the wire schema documented in the specification: `client_id`,
//! `lamport_timestamp`, `request_number`, `access_granted`.

pub mod mutex {
    tonic::include_proto!("printmutex.mutex.v1");
}

pub mod printing {
    tonic::include_proto!("printmutex.printing.v1");
}
