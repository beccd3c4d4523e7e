//! Maps 3D cell coordinates to linear indices and enumerates the per-direction
//! send/recv cell lists used by [`crate::ghost_builder`] and
//! [`crate::ghost_refresh`].
//!
//! Grounded directly on `ghost_init`'s direction loop and `sub_grid_indices`
//! in `original_source/ghosts.c`; the `Cell` shape is grounded on
//! `src/grid/cell.rs` (see DESIGN.md; a cell as a list of slot indices
//! plus lattice-derived metadata), simplified to drop the face/neighbour
//! machinery that belongs to the excluded force kernels.

use crate::topology::Direction;
use crate::topology::NUM_DIRECTIONS;

/// One lattice cell: either interior (owns real particles) or halo (owns
/// ghost copies), never both.
#[derive(Debug, Clone, Default)]
pub struct Cell {
    pub particles: Vec<usize>,
}

impl Cell {
    pub fn n_particles(&self) -> usize {
        self.particles.len()
    }
}

/// Result of [`sub_grid_indices`]: a linear index list, an out-of-range
/// bound (empty box), or the preallocated-capacity overflow the original C
/// array bookkeeping could hit (kept for fidelity and for
/// [`SubGridIndices::is_overflow`] based tests; a `Vec`-backed port never
/// actually needs to reject a list on this account).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubGridIndices {
    Indices(Vec<usize>),
    OutOfRange,
    Overflow,
}

impl SubGridIndices {
    pub fn len(&self) -> usize {
        match self {
            SubGridIndices::Indices(v) => v.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_overflow(&self) -> bool {
        matches!(self, SubGridIndices::Overflow)
    }

    pub fn into_vec(self) -> Vec<usize> {
        match self {
            SubGridIndices::Indices(v) => v,
            _ => Vec::new(),
        }
    }
}

/// Linear index of cell `(p0, p1, p2)` in a `gs`-shaped lattice, row-major
/// with `p0` outermost.
pub fn get_linear_index(p0: i32, p1: i32, p2: i32, gs: [i32; 3]) -> usize {
    ((p0 * gs[1] + p1) * gs[2] + p2) as usize
}

/// Linear indices of the axis-aligned box `[lc, hc]` (inclusive) within a
/// `gs`-shaped lattice, enumerated in `(p0, p1, p2)` row-major order
/// (outer loop `p0`). `max_len` mirrors the original's preallocated-array
/// capacity check.
pub fn sub_grid_indices(lc: [i32; 3], hc: [i32; 3], gs: [i32; 3], max_len: usize) -> SubGridIndices {
    for i in 0..3 {
        if lc[i] < 0 || lc[i] >= gs[i] {
            return SubGridIndices::OutOfRange;
        }
        if hc[i] < 0 || hc[i] >= gs[i] {
            return SubGridIndices::OutOfRange;
        }
        if lc[i] > hc[i] {
            return SubGridIndices::OutOfRange;
        }
    }
    let size = (hc[0] + 1 - lc[0]) as usize * (hc[1] + 1 - lc[1]) as usize * (hc[2] + 1 - lc[2]) as usize;
    if size > max_len {
        return SubGridIndices::Overflow;
    }
    let mut list = Vec::with_capacity(size);
    for p0 in lc[0]..=hc[0] {
        for p1 in lc[1]..=hc[1] {
            for p2 in lc[2]..=hc[2] {
                list.push(get_linear_index(p0, p1, p2, gs));
            }
        }
    }
    SubGridIndices::Indices(list)
}

/// The per-direction send/recv cell-index lists, built once at init and
/// immutable until teardown.
#[derive(Debug, Clone)]
pub struct DirectionLists {
    pub send_cells: Vec<usize>,
    pub recv_cells: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct CellGrid {
    /// Shape of the owned region.
    pub cell_grid: [i32; 3],
    /// `cell_grid + 2`: the stored lattice, with one halo layer each side.
    pub ghost_cell_grid: [i32; 3],
    pub directions: [DirectionLists; NUM_DIRECTIONS],
    /// Cardinality of the largest single-direction send-cell plane; used to
    /// size the ghost-count header (`max_send_cells + 1` ints).
    pub max_send_cells: usize,
}

impl CellGrid {
    pub fn new(cell_grid: [i32; 3]) -> Self {
        let ghost_cell_grid = [cell_grid[0] + 2, cell_grid[1] + 2, cell_grid[2] + 2];
        let directions = build_direction_lists(cell_grid, ghost_cell_grid);
        let max_send_cells = directions
            .iter()
            .map(|d| d.send_cells.len())
            .max()
            .unwrap_or(0);
        Self {
            cell_grid,
            ghost_cell_grid,
            directions,
            max_send_cells,
        }
    }

    pub fn n_cells(&self) -> usize {
        (self.ghost_cell_grid[0] * self.ghost_cell_grid[1] * self.ghost_cell_grid[2]) as usize
    }

    pub fn send_cells(&self, dir: Direction) -> &[usize] {
        &self.directions[dir].send_cells
    }

    pub fn recv_cells(&self, dir: Direction) -> &[usize] {
        &self.directions[dir].recv_cells
    }
}

/// Builds the six directions' send/recv cell-index lists following a
/// progressively-widening-bounds schedule: after axis `i` has been
/// processed, the transverse extent along `i` grows by one cell on each
/// side for every later axis, so corner/edge halo cells become eligible
/// send cells in subsequent sweeps.
fn build_direction_lists(cg: [i32; 3], gcg: [i32; 3]) -> [DirectionLists; NUM_DIRECTIONS] {
    let huge = usize::MAX;
    let mut send: [Vec<usize>; 6] = Default::default();
    let mut recv: [Vec<usize>; 6] = Default::default();
    let mut done = [0i32; 3];

    for i in 0..3 {
        let j = (i + 1) % 3;
        let k = (i + 2) % 3;
        let mut lc = [0i32; 3];
        let mut hc = [0i32; 3];
        lc[j] = 1 - done[j];
        hc[j] = cg[j] + done[j];
        lc[k] = 1 - done[k];
        hc[k] = cg[k] + done[k];

        // Send to the negative face (toward lower coordinate).
        lc[i] = 1;
        hc[i] = 1;
        send[2 * i] = sub_grid_indices(lc, hc, gcg, huge).into_vec();
        // Receive from the positive face (opposite neighbor's send).
        lc[i] = 0;
        hc[i] = 0;
        recv[2 * i + 1] = sub_grid_indices(lc, hc, gcg, huge).into_vec();

        // Send to the positive face.
        lc[i] = cg[i];
        hc[i] = cg[i];
        send[2 * i + 1] = sub_grid_indices(lc, hc, gcg, huge).into_vec();
        // Receive from the negative face.
        lc[i] = cg[i] + 1;
        hc[i] = cg[i] + 1;
        recv[2 * i] = sub_grid_indices(lc, hc, gcg, huge).into_vec();

        done[i] = 1;
    }

    let mut out: [DirectionLists; 6] = [
        DirectionLists { send_cells: vec![], recv_cells: vec![] },
        DirectionLists { send_cells: vec![], recv_cells: vec![] },
        DirectionLists { send_cells: vec![], recv_cells: vec![] },
        DirectionLists { send_cells: vec![], recv_cells: vec![] },
        DirectionLists { send_cells: vec![], recv_cells: vec![] },
        DirectionLists { send_cells: vec![], recv_cells: vec![] },
    ];
    for d in 0..6 {
        out[d] = DirectionLists {
            send_cells: std::mem::take(&mut send[d]),
            recv_cells: std::mem::take(&mut recv[d]),
        };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_index_is_row_major() {
        let gs = [3, 4, 5];
        assert_eq!(get_linear_index(0, 0, 0, gs), 0);
        assert_eq!(get_linear_index(0, 0, 1, gs), 1);
        assert_eq!(get_linear_index(0, 1, 0, gs), 5);
        assert_eq!(get_linear_index(1, 0, 0, gs), 20);
    }

    #[test]
    fn sub_grid_indices_out_of_range() {
        let gs = [3, 3, 3];
        assert_eq!(
            sub_grid_indices([0, 0, 0], [3, 0, 0], gs, 100),
            SubGridIndices::OutOfRange
        );
        assert_eq!(
            sub_grid_indices([1, 0, 0], [0, 0, 0], gs, 100),
            SubGridIndices::OutOfRange
        );
    }

    #[test]
    fn sub_grid_indices_overflow() {
        let gs = [3, 3, 3];
        assert!(sub_grid_indices([0, 0, 0], [2, 2, 2], gs, 2).is_overflow());
    }

    #[test]
    fn direction_plane_sizes_match_face_area() {
        let grid = CellGrid::new([2, 3, 4]);
        // -x/+x faces: one plane of 3*4 owned cells.
        assert_eq!(grid.send_cells(0).len(), 3 * 4);
        assert_eq!(grid.send_cells(1).len(), 3 * 4);
        // -y/+y faces widen by one cell in x because axis 0 was already done.
        assert_eq!(grid.send_cells(2).len(), (2 + 2) * 4);
        assert_eq!(grid.send_cells(3).len(), (2 + 2) * 4);
        // -z/+z faces widen in both x and y.
        assert_eq!(grid.send_cells(4).len(), (2 + 2) * (3 + 2));
        assert_eq!(grid.send_cells(5).len(), (2 + 2) * (3 + 2));
    }

    #[test]
    fn recv_cells_mirror_send_cells_cardinality() {
        let grid = CellGrid::new([2, 2, 2]);
        for d in 0..NUM_DIRECTIONS {
            let opp = d ^ 1;
            assert_eq!(grid.recv_cells(opp).len(), grid.send_cells(d).len());
        }
    }
}
