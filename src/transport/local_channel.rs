//! In-process transport for running several ranks inside one test binary
//! without an MPI runtime.
//!
//! Grounded on `communication::local` / `local_app_building::
//! get_senders_and_receivers` (see DESIGN.md), which wires one
//! `std::sync::mpsc` channel per ordered rank pair and hands each simulated
//! rank its own sender/receiver set. Real `mpsc` channels (rather than a
//! shared mailbox) mean each rank can run on its own OS thread and block on
//! `recv`, so callers don't need to special-case call order the way a
//! synchronous shared-memory stub would.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::mpsc;

use super::Channel;
use crate::error::Error;
use crate::error::Result;
use crate::topology::Rank;

type Envelope = (i32, Vec<u8>);

pub struct LocalChannel {
    rank: Rank,
    senders: HashMap<Rank, mpsc::Sender<Envelope>>,
    receivers: HashMap<Rank, mpsc::Receiver<Envelope>>,
    /// Messages read off a peer's receiver whose tag didn't match what was
    /// asked for yet; replayed before blocking on the channel again.
    stash: HashMap<(Rank, i32), VecDeque<Vec<u8>>>,
}

impl Channel for LocalChannel {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn send_bytes(&mut self, peer: Rank, tag: i32, bytes: &[u8]) -> Result<()> {
        let sender = self.senders.get(&peer).ok_or_else(|| no_route(peer))?;
        sender.send((tag, bytes.to_vec())).map_err(|_| Error::Transport {
            peer,
            direction: 0,
            reason: "peer channel closed".to_string(),
        })
    }

    fn recv_bytes(&mut self, peer: Rank, tag: i32) -> Result<Vec<u8>> {
        if let Some(queued) = self.stash.get_mut(&(peer, tag)) {
            if let Some(bytes) = queued.pop_front() {
                return Ok(bytes);
            }
        }
        let receiver = self.receivers.get(&peer).ok_or_else(|| no_route(peer))?;
        loop {
            let (got_tag, bytes) = receiver.recv().map_err(|_| Error::Transport {
                peer,
                direction: 0,
                reason: "peer channel closed before sending".to_string(),
            })?;
            if got_tag == tag {
                return Ok(bytes);
            }
            self.stash.entry((peer, got_tag)).or_default().push_back(bytes);
        }
    }

    fn barrier(&mut self) {}
}

fn no_route(peer: Rank) -> Error {
    Error::Transport {
        peer,
        direction: 0,
        reason: "no local channel to this peer".to_string(),
    }
}

/// Builds a full mesh of `mpsc` channels for `num_ranks` simulated ranks and
/// returns one [`LocalChannel`] per rank, indexed by rank.
pub fn local_channels(num_ranks: i32) -> Vec<LocalChannel> {
    let mut senders: HashMap<(Rank, Rank), mpsc::Sender<Envelope>> = HashMap::new();
    let mut receivers: HashMap<(Rank, Rank), mpsc::Receiver<Envelope>> = HashMap::new();
    for from in 0..num_ranks {
        for to in 0..num_ranks {
            if from == to {
                continue;
            }
            let (tx, rx) = mpsc::channel();
            senders.insert((from, to), tx);
            receivers.insert((from, to), rx);
        }
    }

    (0..num_ranks)
        .map(|rank| {
            let mut my_senders = HashMap::new();
            let mut my_receivers = HashMap::new();
            for other in 0..num_ranks {
                if other == rank {
                    continue;
                }
                my_senders.insert(other, senders.remove(&(rank, other)).unwrap());
                my_receivers.insert(other, receivers.remove(&(other, rank)).unwrap());
            }
            LocalChannel {
                rank,
                senders: my_senders,
                receivers: my_receivers,
                stash: HashMap::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_order_tags_are_stashed_and_replayed() {
        let mut chans = local_channels(2);
        let mut c1 = chans.pop().unwrap();
        let mut c0 = chans.remove(0);
        c0.send_bytes(1, 7, &[1, 2]).unwrap();
        c0.send_bytes(1, 3, &[9]).unwrap();
        // Ask for tag 3 first even though tag 7 arrived first on the wire.
        assert_eq!(c1.recv_bytes(0, 3).unwrap(), vec![9]);
        assert_eq!(c1.recv_bytes(0, 7).unwrap(), vec![1, 2]);
    }
}
