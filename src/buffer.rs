//! Byte-typed growable send/recv buffers and the `Buffer` descriptor used
//! by [`crate::transport`] for the self-neighbor swap.
//!
//! Grounded on the `p_send_buf`/`p_recv_buf`/`g_send_buf`/`g_recv_buf`/
//! `send_buf`/`recv_buf` globals and their `realloc`-on-demand growth in
//! `original_source/ghosts.c`, re-architected around the "global mutable
//! module state" problem as fields of an explicit value rather than module
//! statics, and around the "self-neighbor pointer swap" idea: a single
//! `Buffer::swap_with` exchanges data *and* capacity together.

/// A growable typed buffer, `Vec<T>`-backed. `len()`/`capacity()` already
/// track "current count" vs. "capacity" the way the original's paired
/// `n_*_buf`/`max_*_buf` globals did; growth is monotonic (`reserve_exact`
/// never shrinks what's already allocated).
#[derive(Debug, Clone, Default)]
pub struct Buffer<T> {
    data: Vec<T>,
}

impl<T: Clone + Default> Buffer<T> {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn push(&mut self, value: T) {
        self.data.push(value);
    }

    pub fn extend(&mut self, values: impl IntoIterator<Item = T>) {
        self.data.extend(values);
    }

    pub fn set_from(&mut self, values: Vec<T>) {
        self.data = values;
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Grows capacity to at least `count` without shrinking it (the recv-side
    /// "declared count exceeds current capacity" reallocation).
    pub fn reserve_at_least(&mut self, count: usize) {
        if self.data.capacity() < count {
            self.data.reserve_exact(count - self.data.len());
        }
    }

    /// Exchanges this buffer's contents with `other`'s wholesale: the
    /// self-neighbor fast path, which must move both the data and its
    /// capacity atomically so the next sweep's "recv buffer" holds what the
    /// previous sweep's "send buffer" held.
    pub fn swap_with(&mut self, other: &mut Self) {
        std::mem::swap(&mut self.data, &mut other.data);
    }
}

/// The four typed buffers for one endpoint (send, or recv), bundled so
/// `BufferPool` can hold one `Endpoint` per side.
#[derive(Debug, Default)]
pub struct Endpoint {
    pub particles: Buffer<u8>,
    pub bond_ints: Buffer<u8>,
    pub ghosts: Buffer<u8>,
    pub posforce: Buffer<f64>,
}

impl Endpoint {
    pub fn swap_with(&mut self, other: &mut Self) {
        self.particles.swap_with(&mut other.particles);
        self.bond_ints.swap_with(&mut other.bond_ints);
        self.ghosts.swap_with(&mut other.ghosts);
        self.posforce.swap_with(&mut other.posforce);
    }
}

#[derive(Debug, Default)]
pub struct BufferPool {
    pub send: Endpoint,
    pub recv: Endpoint,
}

impl BufferPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unifies the position/force buffer capacity (`max_send = max_recv =
    /// max(both)`) the way `exchange_ghost` does right before returning, so
    /// `GhostRefresh` never needs to size it again.
    pub fn unify_posforce_capacity(&mut self) {
        let target = self.send.posforce.capacity().max(self.recv.posforce.capacity());
        self.send.posforce.reserve_at_least(target);
        self.recv.posforce.reserve_at_least(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_moves_data_and_capacity_together() {
        let mut send: Buffer<u8> = Buffer::new();
        send.extend([1, 2, 3]);
        let mut recv: Buffer<u8> = Buffer::new();
        recv.reserve_at_least(64);
        let recv_cap_before = recv.capacity();

        send.swap_with(&mut recv);

        assert_eq!(recv.as_slice(), &[1, 2, 3]);
        assert!(send.capacity() >= recv_cap_before);
        assert!(send.is_empty());
    }

    #[test]
    fn unify_posforce_capacity_takes_the_max() {
        let mut pool = BufferPool::new();
        pool.send.posforce.reserve_at_least(10);
        pool.recv.posforce.reserve_at_least(40);
        pool.unify_posforce_capacity();
        assert!(pool.send.posforce.capacity() >= 40);
        assert!(pool.recv.posforce.capacity() >= 40);
    }
}
