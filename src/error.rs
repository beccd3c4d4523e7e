//! The crate's single error surface.
//!
//! Everything except a transport failure is a diagnostic, not a failure:
//! invariant violations and protocol-size mismatches are
//! logged through [`crate::logging`] and execution continues. Only a
//! transport-layer failure is fatal, which is why [`Error`] has exactly one
//! variant.

use crate::topology::Rank;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("transport failure exchanging with rank {peer} in direction {direction}: {reason}")]
    Transport {
        peer: Rank,
        direction: usize,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
