use crate::grid::Grid;

/// Positional weights indexed `[x][y]`, highest in the top-left corner and
/// snaking down through the board. Tuned for 4x4.
pub const SNAKE_WEIGHTS: [[f64; 4]; 4] = [
    [0.135759, 0.121925, 0.102812, 0.099937],
    [0.0724143, 0.076711, 0.0888405, 0.0997992],
    [0.060654, 0.0562579, 0.037116, 0.0161889],
    [0.00335193, 0.00575871, 0.00992495, 0.0125498],
];

pub const SMOOTHNESS_PENALTY: f64 = 0.002;

/// Static board evaluation used at the search frontier.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator {
    weights: &'static [[f64; 4]; 4],
    penalty_factor: f64,
}

impl Default for Evaluator {
    fn default() -> Self {
        Evaluator::new(&SNAKE_WEIGHTS, SMOOTHNESS_PENALTY)
    }
}

impl Evaluator {
    pub const fn new(weights: &'static [[f64; 4]; 4], penalty_factor: f64) -> Self {
        Evaluator {
            weights,
            penalty_factor,
        }
    }

    pub fn evaluate_grid(&self, grid: &Grid) -> f64 {
        self.positional_score(grid) - self.smoothness_penalty(grid) * self.penalty_factor
    }

    /// Sum of tile value times the weight of its cell. Cells outside the weight
    /// table count for nothing.
    pub fn positional_score(&self, grid: &Grid) -> f64 {
        grid.tiles().fold(0., |score, tile| {
            score + tile.value as f64 * self.weight(tile.x, tile.y)
        })
    }

    /// For each occupied cell off the last row and column, the absolute
    /// difference to the cell below and to the cell on the right (empty is 0).
    pub fn smoothness_penalty(&self, grid: &Grid) -> f64 {
        let size = grid.size();
        let mut penalty = 0.;
        for x in 0..size.saturating_sub(1) {
            for y in 0..size.saturating_sub(1) {
                let value = grid.value_at(x, y);
                if value == 0 {
                    continue;
                }
                let value = value as f64;
                penalty += (grid.value_at(x, y + 1) as f64 - value).abs();
                penalty += (grid.value_at(x + 1, y) as f64 - value).abs();
            }
        }
        penalty
    }

    fn weight(&self, x: usize, y: usize) -> f64 {
        self.weights
            .get(x)
            .and_then(|column| column.get(y))
            .copied()
            .unwrap_or(0.)
    }
}

pub fn evaluate_grid(grid: &Grid) -> f64 {
    Evaluator::default().evaluate_grid(grid)
}
