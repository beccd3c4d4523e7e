//! Production transport backed by the `mpi` crate.
//!
//! Grounded on `src/sweep/communicator.rs` (see DESIGN.md; a
//! `SystemCommunicator`-wrapping struct implementing a small send/recv
//! trait), simplified here to blocking point-to-point calls since the
//! even/odd schedule already guarantees no two ranks are ever both trying
//! to send to each other at once, unlike that sweep communicator,
//! this transport never needs immediate/non-blocking requests.

use mpi::topology::SystemCommunicator;
use mpi::traits::Communicator;
use mpi::traits::Destination;
use mpi::traits::Source;

use super::Channel;
use crate::error::Error;
use crate::error::Result;
use crate::topology::Rank;

pub struct MpiChannel {
    world: SystemCommunicator,
}

impl MpiChannel {
    pub fn new(world: SystemCommunicator) -> Self {
        Self { world }
    }
}

impl Channel for MpiChannel {
    fn rank(&self) -> Rank {
        self.world.rank()
    }

    fn send_bytes(&mut self, peer: Rank, tag: i32, bytes: &[u8]) -> Result<()> {
        self.world.process_at_rank(peer).send_with_tag(bytes, tag);
        Ok(())
    }

    fn recv_bytes(&mut self, peer: Rank, tag: i32) -> Result<Vec<u8>> {
        let (bytes, status) = self.world.process_at_rank(peer).receive_vec_with_tag::<u8>(tag);
        if status.source_rank() != peer {
            return Err(Error::Transport {
                peer,
                direction: 0,
                reason: format!("received from rank {} while expecting rank {peer}", status.source_rank()),
            });
        }
        Ok(bytes)
    }

    fn barrier(&mut self) {
        self.world.barrier();
    }
}
