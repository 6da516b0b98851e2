//! agent-2048: expectimax move selection for 2048
//!
//! - `grid`: the board, its tiles and the `{ size, cells }` snapshot format
//! - `engine`: `Brain`, which slides and merges tiles on a private grid
//! - `heuristic`: the static evaluation used at the search frontier
//! - `expectimax`: the search itself, sequential and one-thread-per-move
//!
//! ```
//! use agent_2048::engine::Move;
//! use agent_2048::expectimax::{Expectimax, ExpectimaxConfig, MovePolicy};
//! use agent_2048::grid::{Grid, GridSnapshot};
//!
//! let grid = Grid::from_snapshot(&GridSnapshot::from_rows(&[
//!     [2, 4, 8, 16],
//!     [0, 0, 0, 0],
//!     [0, 0, 0, 0],
//!     [0, 0, 0, 0],
//! ]));
//! let agent = Expectimax::with_config(ExpectimaxConfig { depth: 2 });
//! assert_eq!(agent.select_move(&grid), Some(Move::Down));
//! ```

pub mod engine;
pub mod error;
pub mod expectimax;
pub mod grid;
pub mod heuristic;
pub mod wasm;
