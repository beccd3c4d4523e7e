//! Six sweeps constructing the one-cell halo.
//!
//! Grounded on `exchange_ghost` in `original_source/ghosts.c`: the
//! per-send-cell occupancy header, the cell-major packing order, the
//! periodic-boundary shift applied on the sender side only, and installing
//! received ghosts into the matching `recv_cells` in order. Halo cells are
//! dropped and fully rebuilt every call rather than incrementally patched.

use crate::buffer::BufferPool;
use crate::cell_grid::Cell;
use crate::cell_grid::CellGrid;
use crate::error::Result;
use crate::particle::Ghost;
use crate::particle_store::ParticleStore;
use crate::topology::axis_of;
use crate::topology::Topology;
use crate::topology::NUM_DIRECTIONS;
use crate::transport::tag_for;
use crate::transport::Channel;
use crate::transport::MessageKind;
use crate::transport::Transport;
use crate::wire;

/// Per-direction ghost counts recorded by [`build`], reused by
/// `GhostRefresh` so it never has to recompute cell occupancy.
#[derive(Debug, Clone, Copy, Default)]
pub struct GhostSizes {
    pub send: [usize; NUM_DIRECTIONS],
    pub recv: [usize; NUM_DIRECTIONS],
}

/// Rebuilds the halo from scratch: drops every existing ghost, then runs
/// the six-direction sweep that (re)populates them.
pub fn build<C: Channel>(
    cells: &mut [Cell],
    cell_grid: &CellGrid,
    store: &mut ParticleStore,
    topo: &Topology,
    pool: &mut BufferPool,
    transport: &mut Transport<C>,
) -> Result<GhostSizes> {
    store.drop_ghosts();
    let mut sizes = GhostSizes::default();

    for dir in 0..NUM_DIRECTIONS {
        let (sent, received) = build_one_direction(cells, cell_grid, store, topo, pool, transport, dir)?;
        sizes.send[dir] = sent;
        sizes.recv[dir] = received;
    }

    pool.unify_posforce_capacity();
    Ok(sizes)
}

fn build_one_direction<C: Channel>(
    cells: &mut [Cell],
    cell_grid: &CellGrid,
    store: &mut ParticleStore,
    topo: &Topology,
    pool: &mut BufferPool,
    transport: &mut Transport<C>,
    dir: usize,
) -> Result<(usize, usize)> {
    let send_ids = cell_grid.send_cells(dir).to_vec();
    let shift = topo.boundary_shift(dir);
    let axis = axis_of(dir);

    let mut counts = vec![0u32; cell_grid.max_send_cells + 1];
    let mut body = Vec::new();
    for (i, &cell_id) in send_ids.iter().enumerate() {
        counts[i] = cells[cell_id].n_particles() as u32;
        for &slot in &cells[cell_id].particles {
            let mut g = Ghost::from(store.particle(slot));
            if shift != 0.0 {
                g.pos[axis] += shift;
            }
            wire::encode_ghost(&g, &mut body);
        }
    }
    let total_sent: u32 = counts[..send_ids.len()].iter().sum();
    counts[cell_grid.max_send_cells] = total_sent;
    pool.send.ghosts.set_from(body);

    let recv_counts;
    if topo.is_self_neighbor(dir) {
        recv_counts = counts.clone();
        pool.send.swap_with(&mut pool.recv);
    } else {
        let header = wire::encode_u32_header(&counts);
        let recv_header = transport.exchange(topo, dir, tag_for(dir, MessageKind::Header), &header)?;
        recv_counts = wire::decode_u32_header(&recv_header);
        let recv_body = transport.exchange(topo, dir, tag_for(dir, MessageKind::BodyA), pool.send.ghosts.as_slice())?;
        pool.recv.ghosts.set_from(recv_body);
    }

    let total_recv = recv_counts[cell_grid.max_send_cells] as usize;
    let recv_ids = cell_grid.recv_cells(dir).to_vec();
    let start = store.install_ghosts(total_recv);
    let mut offset = 0;
    let mut cursor = start;
    let ghost_bytes = pool.recv.ghosts.as_slice();
    for (i, &cell_id) in recv_ids.iter().enumerate() {
        let count = recv_counts[i] as usize;
        let mut slots = Vec::with_capacity(count);
        for _ in 0..count {
            let (ghost, consumed) = wire::decode_ghost(&ghost_bytes[offset..]);
            store.set_ghost(cursor, ghost);
            slots.push(cursor);
            cursor += 1;
            offset += consumed;
        }
        cells[cell_id].particles = slots;
    }

    transport.barrier();
    Ok((total_sent as usize, total_recv))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::Particle;
    use crate::topology::ProcessGrid;
    use crate::transport::local_channel::local_channels;

    #[test]
    fn single_rank_periodic_builds_a_self_referential_halo() {
        let grid = ProcessGrid::new([1, 1, 1]);
        let topo = Topology::new(grid, 0, [4.0, 4.0, 4.0], [true, true, true]);
        let cell_grid = CellGrid::new([2, 2, 2]);
        let mut cells = vec![Cell::default(); cell_grid.n_cells()];
        let mut store = ParticleStore::new();
        store.add_owned(Particle::new(1, [0.5, 0.5, 0.5]));
        // Place the particle's slot into a cell adjacent to the -x face.
        let boundary_cell = cell_grid.send_cells(0)[0];
        cells[boundary_cell].particles.push(0);

        let mut pool = BufferPool::new();
        let mut channels = local_channels(1);
        let mut transport = Transport::new(channels.pop().unwrap());

        let sizes = build(&mut cells, &cell_grid, &mut store, &topo, &mut pool, &mut transport).unwrap();
        assert_eq!(sizes.send[0], 1);
        assert_eq!(sizes.recv[0], 1);
        assert_eq!(store.n_ghosts(), 1);
    }

    #[test]
    fn empty_send_cells_produce_no_ghosts() {
        let grid = ProcessGrid::new([1, 1, 1]);
        let topo = Topology::new(grid, 0, [4.0, 4.0, 4.0], [true, true, true]);
        let cell_grid = CellGrid::new([2, 2, 2]);
        let mut cells = vec![Cell::default(); cell_grid.n_cells()];
        let mut store = ParticleStore::new();
        let mut pool = BufferPool::new();
        let mut channels = local_channels(1);
        let mut transport = Transport::new(channels.pop().unwrap());
        let sizes = build(&mut cells, &cell_grid, &mut store, &topo, &mut pool, &mut transport).unwrap();
        assert_eq!(sizes.send, [0; NUM_DIRECTIONS]);
        assert_eq!(store.n_ghosts(), 0);
    }
}
