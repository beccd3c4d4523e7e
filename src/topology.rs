//! Process grid, per-rank neighbor ids, and periodic boundary shifts.
//!
//! Grounded on `src/sweep/communicator.rs` and `src/domain/decomposition.rs`
//! (see DESIGN.md) for the "rank-indexed neighbor table" shape, and on
//! `ghost_init`'s `calc_neighbors` in `original_source/ghosts.c` for the
//! exact neighbor/boundary semantics.

pub type Rank = mpi::Rank;

/// One of the six axis-aligned half-axes, indexed as `2*axis + sign`.
///
/// `0`/`1` = -x/+x, `2`/`3` = -y/+y, `4`/`5` = -z/+z.
pub type Direction = usize;

pub const NUM_DIRECTIONS: usize = 6;

pub fn axis_of(dir: Direction) -> usize {
    dir / 2
}

pub fn sign_of(dir: Direction) -> usize {
    dir & 1
}

/// The anti-parallel direction: the direction along which a neighbor
/// receiving dir's send would itself send back.
pub fn opposite(dir: Direction) -> Direction {
    dir ^ 1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessGrid {
    pub dims: [i32; 3],
}

impl ProcessGrid {
    pub fn new(dims: [i32; 3]) -> Self {
        assert!(dims.iter().all(|&d| d > 0), "process grid dims must be positive");
        Self { dims }
    }

    pub fn num_ranks(&self) -> i32 {
        self.dims[0] * self.dims[1] * self.dims[2]
    }

    /// Row-major position of `rank` in the grid (axis 0 is outermost).
    pub fn position_of(&self, rank: Rank) -> [i32; 3] {
        let [nx, ny, nz] = self.dims;
        let z = rank % nz;
        let y = (rank / nz) % ny;
        let x = rank / (nz * ny);
        let _ = nx;
        [x, y, z]
    }

    pub fn rank_at(&self, pos: [i32; 3]) -> Rank {
        let [nx, ny, nz] = self.dims;
        let wrap = |v: i32, n: i32| v.rem_euclid(n);
        let [x, y, z] = [wrap(pos[0], nx), wrap(pos[1], ny), wrap(pos[2], nz)];
        (x * ny + y) * nz + z
    }
}

/// Topology state for one rank: position in the process grid, its six
/// directional neighbors, and the periodic coordinate shift (if any)
/// applied to particles/ghosts that cross a periodic face in that direction.
#[derive(Debug, Clone)]
pub struct Topology {
    pub this_rank: Rank,
    pub pe_pos: [i32; 3],
    pub neighbors: [Rank; NUM_DIRECTIONS],
    pub boundary: [f64; NUM_DIRECTIONS],
    /// This rank's sub-box extents, assuming a uniform rectangular split of
    /// `box_l` across the process grid (non-rectangular decompositions are
    /// out of scope).
    pub my_left: [f64; 3],
    pub my_right: [f64; 3],
    grid: ProcessGrid,
}

impl Topology {
    /// Builds the topology for `this_rank` in a `grid`-shaped process
    /// lattice with box lengths `box_l` and per-axis periodicity flags.
    pub fn new(grid: ProcessGrid, this_rank: Rank, box_l: [f64; 3], periodic: [bool; 3]) -> Self {
        let pe_pos = grid.position_of(this_rank);
        let mut neighbors = [this_rank; NUM_DIRECTIONS];
        let mut boundary = [0.0; NUM_DIRECTIONS];
        let mut my_left = [0.0; 3];
        let mut my_right = [0.0; 3];
        for axis in 0..3 {
            let span = box_l[axis] / grid.dims[axis] as f64;
            my_left[axis] = span * pe_pos[axis] as f64;
            my_right[axis] = span * (pe_pos[axis] as f64 + 1.0);
        }
        for axis in 0..3 {
            let mut lower = pe_pos;
            lower[axis] -= 1;
            let mut upper = pe_pos;
            upper[axis] += 1;
            neighbors[2 * axis] = grid.rank_at(lower);
            neighbors[2 * axis + 1] = grid.rank_at(upper);

            if periodic[axis] {
                if pe_pos[axis] == 0 {
                    boundary[2 * axis] = box_l[axis];
                }
                if pe_pos[axis] == grid.dims[axis] - 1 {
                    boundary[2 * axis + 1] = -box_l[axis];
                }
            }
        }
        Self {
            this_rank,
            pe_pos,
            neighbors,
            boundary,
            my_left,
            my_right,
            grid,
        }
    }

    pub fn grid(&self) -> ProcessGrid {
        self.grid
    }

    /// True when `dir`'s neighbor is this rank itself: Transport must take
    /// the self-neighbor fast path rather than sending a message.
    pub fn is_self_neighbor(&self, dir: Direction) -> bool {
        self.neighbors[dir] == self.this_rank
    }

    pub fn neighbor(&self, dir: Direction) -> Rank {
        self.neighbors[dir]
    }

    pub fn boundary_shift(&self, dir: Direction) -> f64 {
        self.boundary[dir]
    }

    /// Parity used by the even/odd messaging schedule: a rank sends on
    /// iteration `e` when `(pe_pos[axis] + e)` is even.
    pub fn sends_on_iteration(&self, dir: Direction, iteration: u8) -> bool {
        let axis = axis_of(dir);
        (self.pe_pos[axis] + iteration as i32) % 2 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_rank_axis_is_self_neighbor() {
        let grid = ProcessGrid::new([1, 1, 1]);
        let topo = Topology::new(grid, 0, [10.0, 10.0, 10.0], [true, true, true]);
        for d in 0..NUM_DIRECTIONS {
            assert!(topo.is_self_neighbor(d));
        }
        // A single rank that is periodic on every axis sees the full box
        // length as its own boundary shift in both directions of each axis.
        assert_eq!(topo.boundary[0], 10.0);
        assert_eq!(topo.boundary[1], -10.0);
    }

    #[test]
    fn two_by_one_by_one_neighbors_wrap() {
        let grid = ProcessGrid::new([2, 1, 1]);
        let topo0 = Topology::new(grid, 0, [2.0, 1.0, 1.0], [true, false, false]);
        let topo1 = Topology::new(grid, 1, [2.0, 1.0, 1.0], [true, false, false]);
        // Rank 0's low-x neighbor wraps around to rank 1 (periodic), and its
        // high-x neighbor is rank 1 directly.
        assert_eq!(topo0.neighbor(0), 1);
        assert_eq!(topo0.neighbor(1), 1);
        assert_eq!(topo0.boundary[0], 2.0);
        assert_eq!(topo0.boundary[1], 0.0);

        assert_eq!(topo1.neighbor(0), 0);
        assert_eq!(topo1.neighbor(1), 0);
        assert_eq!(topo1.boundary[1], -2.0);
    }

    #[test]
    fn sub_box_extents_split_the_box_evenly_per_axis() {
        let grid = ProcessGrid::new([2, 1, 1]);
        let topo0 = Topology::new(grid, 0, [10.0, 5.0, 5.0], [false, false, false]);
        let topo1 = Topology::new(grid, 1, [10.0, 5.0, 5.0], [false, false, false]);
        assert_eq!(topo0.my_left[0], 0.0);
        assert_eq!(topo0.my_right[0], 5.0);
        assert_eq!(topo1.my_left[0], 5.0);
        assert_eq!(topo1.my_right[0], 10.0);
        assert_eq!(topo0.my_right[1], 5.0);
    }

    #[test]
    fn even_odd_schedule_covers_exactly_one_send_and_recv() {
        let grid = ProcessGrid::new([2, 1, 1]);
        let topo0 = Topology::new(grid, 0, [2.0, 1.0, 1.0], [false, false, false]);
        let topo1 = Topology::new(grid, 1, [2.0, 1.0, 1.0], [false, false, false]);
        // Rank 0 has even pe_pos[0]=0, so it sends at e=0 and recvs at e=1.
        assert!(topo0.sends_on_iteration(0, 0));
        assert!(!topo0.sends_on_iteration(0, 1));
        // Rank 1 is the opposite.
        assert!(!topo1.sends_on_iteration(0, 0));
        assert!(topo1.sends_on_iteration(0, 1));
    }
}
