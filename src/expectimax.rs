use crate::engine::{Brain, Move};
use crate::error::ConfigError;
use crate::grid::{Grid, Tile};
use crate::heuristic::Evaluator;
use serde::{Deserialize, Serialize};
use std::panic;
use std::thread;

// Two kinds of node alternate down the tree:
//  - max nodes pick the best of the legal moves
//  - chance nodes average over every spawn the game could make next
//
// Depth counts plies, so every node of either kind consumes one unit. A depth
// 4 search therefore looks at two moves and two spawns below the root move.
// Worst case node count is roughly 4^(max plies) * (2 * empty cells)^(chance plies).

pub const DEFAULT_DEPTH: u32 = 4;
pub const MAX_DEPTH: u32 = 8;

const SPAWN_TWO_PROBABILITY: f64 = 0.9;
const SPAWN_FOUR_PROBABILITY: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Max,
    Chance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpectimaxConfig {
    /// Plies searched below each root move.
    pub depth: u32,
}

impl Default for ExpectimaxConfig {
    fn default() -> Self {
        ExpectimaxConfig {
            depth: DEFAULT_DEPTH,
        }
    }
}

impl ExpectimaxConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.depth > MAX_DEPTH {
            return Err(ConfigError::DepthTooLarge {
                depth: self.depth,
                max: MAX_DEPTH,
            });
        }
        Ok(())
    }
}

/// Result of one root search. `best_move` is `None` when no direction changes
/// the board; `value` is then the static evaluation of the board itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOutcome {
    pub best_move: Option<Move>,
    pub value: f64,
    pub nodes: u64,
}

pub trait MovePolicy {
    fn search(&self, grid: &Grid) -> SearchOutcome;

    fn select_move(&self, grid: &Grid) -> Option<Move> {
        self.search(grid).best_move
    }
}

/// Directions that change the board, in code order.
pub fn legal_moves(brain: &Brain) -> Vec<Move> {
    let mut probe = brain.fork();
    let mut moves = Vec::new();
    for &direction in &Move::ALL {
        if probe.shift(direction) {
            moves.push(direction);
        }
        probe.reset();
    }
    moves
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Expectimax {
    config: ExpectimaxConfig,
    evaluator: Evaluator,
}

impl Expectimax {
    pub fn new() -> Self {
        Expectimax::default()
    }

    /// Panics if the config does not pass `ExpectimaxConfig::validate`.
    pub fn with_config(config: ExpectimaxConfig) -> Self {
        if let Err(e) = config.validate() {
            panic!("invalid expectimax config: {}", e);
        }
        Expectimax {
            config,
            evaluator: Evaluator::default(),
        }
    }

    pub fn with_evaluator(mut self, evaluator: Evaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn config(&self) -> ExpectimaxConfig {
        self.config
    }

    /// Value of `brain` as a node of the given kind with `depth` plies left.
    pub fn expectimax(&self, brain: &Brain, node: Node, depth: u32, nodes: &mut u64) -> f64 {
        *nodes += 1;
        let moves = legal_moves(brain);
        if depth == 0 || moves.is_empty() {
            return self.evaluator.evaluate_grid(brain.grid());
        }
        match node {
            Node::Max => self.evaluate_max(brain, &moves, depth, nodes),
            Node::Chance => self.evaluate_chance(brain, depth, nodes),
        }
    }

    fn evaluate_max(&self, brain: &Brain, moves: &[Move], depth: u32, nodes: &mut u64) -> f64 {
        let mut best_score = f64::NEG_INFINITY;
        for &direction in moves {
            let mut child = brain.fork();
            child.shift(direction);
            let score = self.expectimax(&child, Node::Chance, depth - 1, nodes);
            if score > best_score {
                best_score = score;
            }
        }
        best_score
    }

    fn evaluate_chance(&self, brain: &Brain, depth: u32, nodes: &mut u64) -> f64 {
        let empty_cells = brain.grid().available_cells();
        if empty_cells.is_empty() {
            return self.evaluator.evaluate_grid(brain.grid());
        }

        let mut score = 0.;
        for &cell in &empty_cells {
            let mut child = brain.fork();
            child.grid_mut().insert_tile(Tile::new(cell, 2));
            score += SPAWN_TWO_PROBABILITY * self.expectimax(&child, Node::Max, depth - 1, nodes);

            let mut child = brain.fork();
            child.grid_mut().insert_tile(Tile::new(cell, 4));
            score += SPAWN_FOUR_PROBABILITY * self.expectimax(&child, Node::Max, depth - 1, nodes);
        }
        score / empty_cells.len() as f64
    }

    /// Value of playing `direction` from `brain`; `None` if the move is illegal.
    fn evaluate_root_move(&self, brain: &mut Brain, direction: Move, nodes: &mut u64) -> Option<f64> {
        let moved = brain.shift(direction);
        let score = if moved {
            Some(self.expectimax(brain, Node::Chance, self.config.depth, nodes))
        } else {
            None
        };
        brain.reset();
        score
    }
}

impl MovePolicy for Expectimax {
    fn search(&self, grid: &Grid) -> SearchOutcome {
        let mut brain = Brain::from_grid(grid);
        let mut nodes = 0;
        let candidates: Vec<(Move, f64)> = legal_moves(&brain)
            .into_iter()
            .filter_map(|direction| {
                self.evaluate_root_move(&mut brain, direction, &mut nodes)
                    .map(|score| (direction, score))
            })
            .collect();
        pick_best(grid, &self.evaluator, candidates, nodes, self.config.depth)
    }
}

/// Same search as `Expectimax`, with each root move searched on its own thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpectimaxMultithread {
    inner: Expectimax,
}

impl ExpectimaxMultithread {
    pub fn new() -> Self {
        ExpectimaxMultithread::default()
    }

    pub fn with_config(config: ExpectimaxConfig) -> Self {
        ExpectimaxMultithread {
            inner: Expectimax::with_config(config),
        }
    }

    pub fn with_evaluator(self, evaluator: Evaluator) -> Self {
        ExpectimaxMultithread {
            inner: self.inner.with_evaluator(evaluator),
        }
    }
}

impl MovePolicy for ExpectimaxMultithread {
    fn search(&self, grid: &Grid) -> SearchOutcome {
        let root = Brain::from_grid(grid);
        let moves = legal_moves(&root);

        let mut threads = vec![];
        for direction in moves {
            threads.push(spawn_move_computation(self.inner, root.fork(), direction));
        }

        let mut nodes = 0;
        let mut candidates = Vec::with_capacity(threads.len());
        for thread in threads {
            let (direction, score, thread_nodes) = thread
                .join()
                .unwrap_or_else(|payload| panic::resume_unwind(payload));
            nodes += thread_nodes;
            if let Some(score) = score {
                candidates.push((direction, score));
            }
        }
        pick_best(grid, &self.inner.evaluator, candidates, nodes, self.inner.config.depth)
    }
}

fn spawn_move_computation(
    search: Expectimax,
    mut brain: Brain,
    direction: Move,
) -> thread::JoinHandle<(Move, Option<f64>, u64)> {
    thread::spawn(move || {
        let mut nodes = 0;
        let score = search.evaluate_root_move(&mut brain, direction, &mut nodes);
        (direction, score, nodes)
    })
}

/// Highest scoring candidate; on a tie the earliest one wins.
fn pick_best(
    grid: &Grid,
    evaluator: &Evaluator,
    candidates: Vec<(Move, f64)>,
    nodes: u64,
    depth: u32,
) -> SearchOutcome {
    let mut best_score = f64::NEG_INFINITY;
    let mut best_move = None;
    for (direction, score) in candidates {
        log::trace!("candidate {} scored {:.6}", direction, score);
        if best_move.is_none() || score > best_score {
            best_score = score;
            best_move = Some(direction);
        }
    }

    match best_move {
        Some(direction) => {
            log::debug!(
                "selected {} (value {:.6}, {} nodes, depth {})",
                direction,
                best_score,
                nodes,
                depth
            );
            SearchOutcome {
                best_move,
                value: best_score,
                nodes,
            }
        }
        None => {
            log::warn!("no legal move from this board");
            SearchOutcome {
                best_move: None,
                value: evaluator.evaluate_grid(grid),
                nodes,
            }
        }
    }
}
