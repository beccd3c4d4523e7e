//! The single configuration surface `Engine::init` consumes.
//!
//! Grounded on the `#[raxiom_parameters]` structs
//! (`src/sweep/parameters.rs`, `src/simulation_box.rs`; see DESIGN.md): a plain
//! `serde::Deserialize` struct describing run geometry, no ambient global
//! state read anywhere else in the crate.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Shape of the rank lattice, e.g. `[2, 2, 1]` for four ranks.
    pub process_grid: [i32; 3],
    pub this_rank: i32,
    pub box_l: [f64; 3],
    pub periodic: [bool; 3],
    /// Shape of this rank's owned cell lattice (uniform across ranks,
    /// Non-goal: non-rectangular decompositions).
    pub cell_grid: [i32; 3],
    #[serde(default)]
    pub verbosity: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_from_a_compact_literal() {
        let json = r#"{
            "process_grid": [2, 1, 1],
            "this_rank": 0,
            "box_l": [10.0, 10.0, 10.0],
            "periodic": [true, true, true],
            "cell_grid": [5, 5, 5]
        }"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.process_grid, [2, 1, 1]);
        assert_eq!(config.cell_grid, [5, 5, 5]);
        assert_eq!(config.verbosity, 0);
    }
}
