//! Forward position push and reverse (Newton's-third-law) force reduction,
//! reusing the counts [`crate::ghost_builder::build`] recorded.
//!
//! Grounded on `update_ghost_pos`/`collect_ghost_forces` in
//! `original_source/ghosts.c`: positions stream forward in direction order
//! 0..6 with the same per-cell iteration order `exchange_ghost` used to
//! build the halo, so no identities need to travel; forces stream back in
//! reverse order 5..0 so a ghost that is itself ghosted further (an
//! edge/corner cell) is fully reduced into its real owner before its own
//! contribution is forwarded along the next axis.

use crate::buffer::BufferPool;
use crate::cell_grid::Cell;
use crate::cell_grid::CellGrid;
use crate::error::Result;
use crate::ghost_builder::GhostSizes;
use crate::particle_store::ParticleStore;
use crate::topology::axis_of;
use crate::topology::Topology;
use crate::topology::NUM_DIRECTIONS;
use crate::transport::tag_for;
use crate::transport::Channel;
use crate::transport::MessageKind;
use crate::transport::Transport;
use crate::wire;

/// Streams current owned positions into every ghost slot, in direction
/// order `0..6`.
pub fn push_positions<C: Channel>(
    cells: &[Cell],
    cell_grid: &CellGrid,
    store: &mut ParticleStore,
    topo: &Topology,
    sizes: &GhostSizes,
    pool: &mut BufferPool,
    transport: &mut Transport<C>,
) -> Result<()> {
    for dir in 0..NUM_DIRECTIONS {
        push_one_direction(cells, cell_grid, store, topo, sizes, pool, transport, dir)?;
    }
    Ok(())
}

fn push_one_direction<C: Channel>(
    cells: &[Cell],
    cell_grid: &CellGrid,
    store: &mut ParticleStore,
    topo: &Topology,
    sizes: &GhostSizes,
    pool: &mut BufferPool,
    transport: &mut Transport<C>,
    dir: usize,
) -> Result<()> {
    let axis = axis_of(dir);
    let shift = topo.boundary_shift(dir);

    let mut values = Vec::with_capacity(sizes.send[dir] * 3);
    for &cell_id in cell_grid.send_cells(dir) {
        for &slot in &cells[cell_id].particles {
            let mut pos = store.particle(slot).pos;
            if shift != 0.0 {
                pos[axis] += shift;
            }
            values.extend_from_slice(&pos);
        }
    }
    pool.send.posforce.set_from(values);

    if topo.is_self_neighbor(dir) {
        pool.send.swap_with(&mut pool.recv);
    } else {
        let bytes = wire::encode_f64_stream(pool.send.posforce.as_slice());
        let recv_bytes = transport.exchange(topo, dir, tag_for(dir, MessageKind::BodyA), &bytes)?;
        pool.recv.posforce.set_from(wire::decode_f64_stream(&recv_bytes));
    }

    let values = pool.recv.posforce.as_slice();
    let mut idx = 0;
    for &cell_id in cell_grid.recv_cells(dir) {
        for &slot in &cells[cell_id].particles {
            if idx + 3 > values.len() {
                break;
            }
            store.particle_mut(slot).pos = [values[idx], values[idx + 1], values[idx + 2]];
            idx += 3;
        }
    }

    transport.barrier();
    Ok(())
}

/// Streams ghost-accumulated forces back to their real owners, in reverse
/// direction order `5..0`, adding into (not overwriting) each owner's
/// force.
pub fn collect_forces<C: Channel>(
    cells: &[Cell],
    cell_grid: &CellGrid,
    store: &mut ParticleStore,
    topo: &Topology,
    sizes: &GhostSizes,
    pool: &mut BufferPool,
    transport: &mut Transport<C>,
) -> Result<()> {
    for dir in (0..NUM_DIRECTIONS).rev() {
        collect_one_direction(cells, cell_grid, store, topo, sizes, pool, transport, dir)?;
    }
    Ok(())
}

fn collect_one_direction<C: Channel>(
    cells: &[Cell],
    cell_grid: &CellGrid,
    store: &mut ParticleStore,
    topo: &Topology,
    sizes: &GhostSizes,
    pool: &mut BufferPool,
    transport: &mut Transport<C>,
    dir: usize,
) -> Result<()> {
    let mut values = Vec::with_capacity(sizes.recv[dir] * 3);
    for &cell_id in cell_grid.recv_cells(dir) {
        for &slot in &cells[cell_id].particles {
            values.extend_from_slice(&store.particle(slot).force);
        }
    }
    pool.send.posforce.set_from(values);

    if topo.is_self_neighbor(dir) {
        pool.send.swap_with(&mut pool.recv);
    } else {
        let bytes = wire::encode_f64_stream(pool.send.posforce.as_slice());
        let recv_bytes = transport.exchange(topo, dir, tag_for(dir, MessageKind::BodyA), &bytes)?;
        pool.recv.posforce.set_from(wire::decode_f64_stream(&recv_bytes));
    }

    let values = pool.recv.posforce.as_slice();
    let mut idx = 0;
    for &cell_id in cell_grid.send_cells(dir) {
        for &slot in &cells[cell_id].particles {
            if idx + 3 > values.len() {
                break;
            }
            let force = &mut store.particle_mut(slot).force;
            force[0] += values[idx];
            force[1] += values[idx + 1];
            force[2] += values[idx + 2];
            idx += 3;
        }
    }

    transport.barrier();
    Ok(())
}
