//! Pairwise even/odd send/recv primitive.
//!
//! Grounded on `send_particles`/`send_ghosts`/`send_posforce` in
//! `original_source/ghosts.c`, which all share exactly this shape: check
//! for a self-neighbor, then run the two-iteration even/odd schedule.
//! Grounded on the `communication` module's (`mod.rs`, see DESIGN.md)
//! idea of swapping the whole backend behind a type alias depending on
//! a feature flag: here expressed as the [`Channel`] trait with an
//! [`mpi_channel::MpiChannel`] production impl and a
//! [`local_channel::LocalChannel`] test impl, the same split as the
//! `#[cfg(feature = "local")]` vs. `mpi_world` backends.

pub mod local_channel;
pub mod mpi_channel;

use crate::error::Error;
use crate::error::Result;
use crate::topology::Direction;
use crate::topology::Rank;
use crate::topology::Topology;

/// Point-to-point byte messaging between this rank and a named peer.
/// Implementations are blocking: a call returns once the bytes have been
/// handed to the transport (send) or fully received (recv).
pub trait Channel {
    fn rank(&self) -> Rank;
    fn send_bytes(&mut self, peer: Rank, tag: i32, bytes: &[u8]) -> Result<()>;
    fn recv_bytes(&mut self, peer: Rank, tag: i32) -> Result<Vec<u8>>;
    /// Rank-wide synchronization point. Not required for correctness but
    /// used at the end of every direction for diagnostic determinism.
    fn barrier(&mut self);
}

/// Tags used to keep the header and the (up to two) body messages of one
/// direction's exchange from crossing on the wire. `dir` is folded in so
/// distinct directions never share a tag either, even though in practice
/// they're always awaited before the next one starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Header,
    BodyA,
    BodyB,
}

pub fn tag_for(dir: Direction, kind: MessageKind) -> i32 {
    let kind = match kind {
        MessageKind::Header => 0,
        MessageKind::BodyA => 1,
        MessageKind::BodyB => 2,
    };
    (dir as i32) * 8 + kind
}

pub struct Transport<C> {
    channel: C,
}

impl<C: Channel> Transport<C> {
    pub fn new(channel: C) -> Self {
        Self { channel }
    }

    pub fn rank(&self) -> Rank {
        self.channel.rank()
    }

    /// Runs one even/odd-scheduled message exchange for direction `dir`:
    /// sends `send` to `neighbors[dir]` and receives from
    /// `neighbors[opposite(dir)]`, exactly mirroring `send_particles`'s
    /// two-peer, two-iteration shape. Callers are responsible for checking
    /// [`Topology::is_self_neighbor`] first and taking the buffer-swap fast
    /// path themselves instead of calling this.
    pub fn exchange(&mut self, topo: &Topology, dir: Direction, tag: i32, send: &[u8]) -> Result<Vec<u8>> {
        debug_assert!(!topo.is_self_neighbor(dir), "self-neighbor must take the buffer-swap fast path");
        let send_peer = topo.neighbor(dir);
        let recv_peer = topo.neighbor(crate::topology::opposite(dir));
        let mut recv_data = Vec::new();
        for iteration in 0..2u8 {
            if topo.sends_on_iteration(dir, iteration) {
                self.channel.send_bytes(send_peer, tag, send).map_err(|e| wrap(send_peer, dir, e))?;
            } else {
                recv_data = self.channel.recv_bytes(recv_peer, tag).map_err(|e| wrap(recv_peer, dir, e))?;
            }
        }
        Ok(recv_data)
    }

    pub fn barrier(&mut self) {
        self.channel.barrier();
    }
}

fn wrap(peer: Rank, dir: Direction, err: Error) -> Error {
    match err {
        Error::Transport { reason, .. } => Error::Transport { peer, direction: dir, reason },
    }
}

#[cfg(test)]
mod tests {
    use super::local_channel::local_channels;
    use super::*;
    use crate::topology::ProcessGrid;

    #[test]
    fn exchange_delivers_in_both_directions_on_a_two_rank_line() {
        let grid = ProcessGrid::new([2, 1, 1]);
        let topo0 = Topology::new(grid, 0, [2.0, 1.0, 1.0], [false, false, false]);
        let topo1 = Topology::new(grid, 1, [2.0, 1.0, 1.0], [false, false, false]);
        let mut channels = local_channels(2);
        let mut t1 = Transport::new(channels.pop().unwrap());
        let mut t0 = Transport::new(channels.remove(0));

        // Direction 1 (+x): both ranks call exchange for the same direction.
        // Rank 0 (even pe_pos) sends to neighbor[1]=1 on iteration 0 and
        // receives from neighbor[0]=1 on iteration 1; rank 1 (odd) does the
        // mirror image, so the two calls round-trip each other.
        let tag = tag_for(1, MessageKind::Header);
        let send0 = vec![9u8, 9, 9];
        let send1 = vec![4u8, 4];
        let handle0 = std::thread::spawn(move || t0.exchange(&topo0, 1, tag, &send0));
        let got1 = t1.exchange(&topo1, 1, tag, &send1).unwrap();
        let got0 = handle0.join().unwrap().unwrap();
        assert_eq!(got0, send1);
        assert_eq!(got1, send0);
    }
}
