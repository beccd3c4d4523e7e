//! Owned-particle array with identity→slot lookup, dynamic growth, and O(1)
//! removal via swap-with-last.
//!
//! Grounded on `move_to_p_buf`/`append_particles` in
//! `original_source/ghosts.c` for the swap-with-last/identity-map
//! choreography, re-architected so that rather than mutate a C `for`
//! loop's cursor, [`ParticleStore::remove`] reports whether the caller must
//! re-examine the slot it just filled, and callers use a `while` loop that
//! only advances when told to.

use crate::particle::Ghost;
use crate::particle::Particle;
use crate::particle::ParticleId;

const NO_SLOT: i64 = -1;

/// `particles[0..n_owned)` are owned; `particles[n_owned..n_owned+n_ghosts)`
/// are ghost images, never mixed. `local_index` maps every resident
/// identity to its slot, with `-1` meaning "not resident".
#[derive(Debug, Default)]
pub struct ParticleStore {
    particles: Vec<Particle>,
    n_owned: usize,
    local_index: std::collections::HashMap<ParticleId, i64>,
}

/// Outcome of [`ParticleStore::remove`]: whether the slot now holds a
/// particle moved in from the end of the owned range (so the caller's scan
/// must re-examine it) or the owned range simply shrank past it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalEffect {
    SlotRefilled,
    RangeShrunk,
}

impl ParticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn n_owned(&self) -> usize {
        self.n_owned
    }

    pub fn n_ghosts(&self) -> usize {
        self.particles.len() - self.n_owned
    }

    pub fn owned(&self) -> &[Particle] {
        &self.particles[..self.n_owned]
    }

    pub fn owned_mut(&mut self) -> &mut [Particle] {
        &mut self.particles[..self.n_owned]
    }

    pub fn particle(&self, slot: usize) -> &Particle {
        &self.particles[slot]
    }

    pub fn particle_mut(&mut self, slot: usize) -> &mut Particle {
        &mut self.particles[slot]
    }

    /// Slot of `id` if resident (owned or ghost), else `None` (Invariant 2).
    pub fn slot_of(&self, id: ParticleId) -> Option<usize> {
        self.local_index
            .get(&id)
            .copied()
            .filter(|&s| s != NO_SLOT)
            .map(|s| s as usize)
    }

    /// Appends one owned particle, taking ownership of it.
    pub fn add_owned(&mut self, particle: Particle) {
        let slot = self.n_owned;
        if slot < self.particles.len() {
            self.particles[slot] = particle;
            // shift anything sitting past the owned range is impossible:
            // ghosts are dropped before migration/append ever runs.
        } else {
            self.particles.push(particle);
        }
        self.local_index.insert(self.particles[slot].identity, slot as i64);
        self.n_owned += 1;
    }

    /// Appends a batch of owned particles received from a neighbor
    /// (`append_particles` in the original).
    pub fn add_from_buffer(&mut self, batch: Vec<Particle>) {
        for p in batch {
            self.add_owned(p);
        }
    }

    /// Removes the owned particle at `slot` by overwriting it with the last
    /// owned particle and decrementing `n_owned` (`move_to_p_buf`'s
    /// swap-with-last). Returns the particle removed plus whether the
    /// caller must re-examine `slot`.
    pub fn remove(&mut self, slot: usize) -> (Particle, RemovalEffect) {
        assert!(slot < self.n_owned, "remove() called on a non-owned slot");
        let last = self.n_owned - 1;
        let removed = self.particles[slot].clone();
        self.local_index.remove(&removed.identity);
        self.n_owned -= 1;
        if slot == last {
            return (removed, RemovalEffect::RangeShrunk);
        }
        self.particles.swap(slot, last);
        self.local_index.insert(self.particles[slot].identity, slot as i64);
        (removed, RemovalEffect::SlotRefilled)
    }

    /// Reserves `n_owned + count` capacity and returns the starting slot for
    /// `count` ghost records about to be installed (`realloc_particles` plus
    /// the bookkeeping in `exchange_ghost`'s recv loop).
    pub fn install_ghosts(&mut self, count: usize) -> usize {
        let start = self.n_owned + self.n_ghosts();
        let needed = self.n_owned + self.n_ghosts() + count;
        if self.particles.len() < needed {
            self.particles.resize_with(needed, || Particle::new(0, [0.0; 3]));
        }
        start
    }

    pub fn set_ghost(&mut self, slot: usize, ghost: Ghost) {
        let mut p = Particle::new(ghost.identity, ghost.pos);
        p.type_tag = ghost.type_tag;
        p.charge = ghost.charge;
        self.particles[slot] = p;
        self.local_index.insert(ghost.identity, slot as i64);
    }

    /// Clears ghost identity-map entries and truncates ghost slots back to
    /// zero (run at the start of every `GhostBuilder` pass).
    pub fn drop_ghosts(&mut self) {
        for slot in self.n_owned..self.particles.len() {
            self.local_index.remove(&self.particles[slot].identity);
        }
        self.particles.truncate(self.n_owned);
    }
}
