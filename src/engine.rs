//! The facade a driver calls: owns every piece of rank-local state and
//! exposes exactly the six operations collaborators use.
//!
//! Re-architected around a "global mutable module state" problem: the
//! original kept `particles`/`cells`/buffers as C file-scope statics
//! mutated in place by free functions; here they are fields of `Engine`
//! and every operation is a method taking `&mut self`.

use crate::buffer::BufferPool;
use crate::cell_grid::Cell;
use crate::cell_grid::CellGrid;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::ghost_builder;
use crate::ghost_builder::GhostSizes;
use crate::ghost_refresh;
use crate::migration;
use crate::particle_store::ParticleStore;
use crate::topology::ProcessGrid;
use crate::topology::Topology;
use crate::transport::Channel;
use crate::transport::Transport;

pub struct Engine<C: Channel> {
    topology: Topology,
    cell_grid: CellGrid,
    cells: Vec<Cell>,
    store: ParticleStore,
    pool: BufferPool,
    transport: Transport<C>,
    box_l: [f64; 3],
    sizes: GhostSizes,
}

impl<C: Channel> Engine<C> {
    /// One-time setup of topology, cell-index lists, and buffers
    /// (`ghost_init`'s role, minus the force-kernel-specific parts that are
    /// out of scope here).
    pub fn init(config: &EngineConfig, channel: C) -> Self {
        let grid = ProcessGrid::new(config.process_grid);
        let topology = Topology::new(grid, config.this_rank, config.box_l, config.periodic);
        let cell_grid = CellGrid::new(config.cell_grid);
        let cells = vec![Cell::default(); cell_grid.n_cells()];
        log::info!(
            "engine init: rank {} at {:?}, cell grid {:?}",
            config.this_rank,
            topology.pe_pos,
            config.cell_grid
        );
        Self {
            topology,
            cell_grid,
            cells,
            store: ParticleStore::new(),
            pool: BufferPool::new(),
            transport: Transport::new(channel),
            box_l: config.box_l,
            sizes: GhostSizes::default(),
        }
    }

    /// Tears down the engine. Buffers and cell state are simply dropped;
    /// this exists as an explicit counterpart to `ghost_exit` for callers
    /// that want a log line marking the end of a run.
    pub fn exit(self) {
        log::info!("engine exit: rank {}", self.topology.this_rank);
    }

    pub fn exchange_particles(&mut self) -> Result<()> {
        migration::exchange_particles(&mut self.store, &self.topology, &mut self.pool, &mut self.transport, self.box_l)
    }

    pub fn exchange_ghosts(&mut self) -> Result<()> {
        self.sizes = ghost_builder::build(
            &mut self.cells,
            &self.cell_grid,
            &mut self.store,
            &self.topology,
            &mut self.pool,
            &mut self.transport,
        )?;
        Ok(())
    }

    pub fn update_ghost_positions(&mut self) -> Result<()> {
        ghost_refresh::push_positions(
            &self.cells,
            &self.cell_grid,
            &mut self.store,
            &self.topology,
            &self.sizes,
            &mut self.pool,
            &mut self.transport,
        )
    }

    pub fn collect_ghost_forces(&mut self) -> Result<()> {
        ghost_refresh::collect_forces(
            &self.cells,
            &self.cell_grid,
            &mut self.store,
            &self.topology,
            &self.sizes,
            &mut self.pool,
            &mut self.transport,
        )
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn cell_grid(&self) -> &CellGrid {
        &self.cell_grid
    }

    /// Mutable access to a single cell, for the external driver's
    /// particle-to-cell sort (cells are consumed from collaborators, not
    /// computed here).
    pub fn cell_mut(&mut self, index: usize) -> &mut Cell {
        &mut self.cells[index]
    }

    pub fn cell(&self, index: usize) -> &Cell {
        &self.cells[index]
    }

    pub fn store(&self) -> &ParticleStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ParticleStore {
        &mut self.store
    }

    pub fn ghost_sizes(&self) -> &GhostSizes {
        &self.sizes
    }
}
