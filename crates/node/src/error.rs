// Copyright 2026 Printer Mutex Authors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt;

/// Errors surfaced by a single critical-section attempt. `Transport` and
/// `ProtocolTimeout` are recoverable from the driver's point of view (the
/// attempt is aborted and reported to the caller); `Invariant` is fatal.
#[derive(thiserror::Error, Debug)]
pub enum NodeError {
    /// An RPC to a peer or to the printer failed at the transport layer.
    /// On `RequestAccess` broadcasts this is swallowed and treated as an
    /// implicit grant; it is surfaced here only for `SendToPrinter` and for
    /// logging.
    #[error("transport error contacting {target}: {source}")]
    Transport {
        target: String,
        #[source]
        source: tonic::Status,
    },

    /// The grant-drain deadline elapsed before every peer replied or failed.
    #[error("timed out waiting for grants from all peers")]
    ProtocolTimeout,

    /// A protocol invariant was violated. Always fatal: the process must
    /// not continue operating once its local state is known to be wrong.
    #[error("invariant violated: {0}")]
    Invariant(InvariantViolation),
}

/// A named, fatal invariant breach (spec.md §3 / §7).
#[derive(Debug)]
pub enum InvariantViolation {
    /// `ra_state == Held` but `my_request` is absent.
    HeldWithoutRequest,
    /// Two distinct peers were configured with the same `node_id`.
    DuplicateNodeId(u32),
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::HeldWithoutRequest => {
                write!(f, "node is HELD but my_request is null")
            }
            InvariantViolation::DuplicateNodeId(id) => {
                write!(f, "node id {id} is not unique in the peer set")
            }
        }
    }
}

/// Aborts the process after logging. Called only for [`InvariantViolation`]s,
/// which by definition mean local state can no longer be trusted.
pub fn fatal(violation: InvariantViolation) -> ! {
    tracing::error!(error = %violation, "fatal invariant violation, aborting");
    std::process::exit(1);
}
