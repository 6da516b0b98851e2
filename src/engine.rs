use crate::grid::{Cell, Grid, GridSnapshot, Tile};
use rand::Rng;
use std::fmt;

/// Direction codes follow the game loop's convention: 0 up, 1 right, 2 down, 3 left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    Up,
    Right,
    Down,
    Left,
}

impl Move {
    pub const ALL: [Move; 4] = [Move::Up, Move::Right, Move::Down, Move::Left];

    pub fn code(self) -> u8 {
        match self {
            Move::Up => 0,
            Move::Right => 1,
            Move::Down => 2,
            Move::Left => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Move> {
        Move::ALL.get(code as usize).copied()
    }

    /// Unit vector as `(dx, dy)`, with `y` growing downwards.
    pub fn vector(self) -> (isize, isize) {
        match self {
            Move::Up => (0, -1),
            Move::Right => (1, 0),
            Move::Down => (0, 1),
            Move::Left => (-1, 0),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Move::Up => "up",
            Move::Right => "right",
            Move::Down => "down",
            Move::Left => "left",
        };
        f.write_str(name)
    }
}

pub type Score = u64;

/// Move simulator over a private grid. Keeps the snapshot it was built from so
/// `reset` can throw away speculative moves.
#[derive(Debug, Clone)]
pub struct Brain {
    grid: Grid,
    score: Score,
    previous_state: GridSnapshot,
}

impl Brain {
    pub fn new(snapshot: GridSnapshot) -> Self {
        let grid = Grid::from_snapshot(&snapshot);
        Brain {
            grid,
            score: 0,
            previous_state: snapshot,
        }
    }

    pub fn from_grid(grid: &Grid) -> Self {
        Brain {
            grid: grid.clone(),
            score: 0,
            previous_state: grid.serialize(),
        }
    }

    /// Independent copy whose reset point is this brain's current grid.
    pub fn fork(&self) -> Brain {
        Brain::from_grid(&self.grid)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    /// Points gained from merges since the last reset.
    pub fn score(&self) -> Score {
        self.score
    }

    pub fn reset(&mut self) {
        self.score = 0;
        self.grid = Grid::from_trusted_snapshot(&self.previous_state);
    }

    /// Spawns a 2 (90%) or a 4 (10%) in a random empty cell.
    pub fn add_random_tile<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Tile> {
        let cell = self.grid.random_available_cell(rng)?;
        let value = if rng.gen_range(0..10) < 9 { 2 } else { 4 };
        let tile = Tile::new(cell, value);
        self.grid.insert_tile(tile);
        Some(tile)
    }

    /// Live game step: shift, then spawn a random tile if anything moved.
    pub fn make_move<R: Rng + ?Sized>(&mut self, direction: Move, rng: &mut R) -> bool {
        let moved = self.shift(direction);
        if moved {
            self.add_random_tile(rng);
        }
        moved
    }

    pub fn is_game_over(&self) -> bool {
        let mut probe = self.fork();
        for &direction in &Move::ALL {
            if probe.shift(direction) {
                return false;
            }
        }
        true
    }

    /// Slides and merges every tile towards `direction`. Returns whether any
    /// tile changed cell.
    pub fn shift(&mut self, direction: Move) -> bool {
        let size = self.grid.size();
        let vector = direction.vector();
        let (xs, ys) = build_traversals(size, vector);
        // Cells holding a tile produced by a merge during this call.
        let mut merged = vec![false; size * size];
        let mut moved = false;

        for &x in &xs {
            for &y in &ys {
                let cell = Cell::new(x, y);
                let mut tile = match self.grid.cell_content(cell) {
                    Some(tile) => tile,
                    None => continue,
                };
                let (farthest, next) = self.find_farthest_position(cell, vector);
                let target = next.and_then(|next| self.grid.cell_content(next));

                match target {
                    // Tiles whose double would not fit in a u32 never merge.
                    Some(other)
                        if other.value == tile.value
                            && !merged[other.x * size + other.y]
                            && tile.value.checked_mul(2).is_some() =>
                    {
                        let joined = Tile::new(other.cell(), tile.value * 2);
                        self.grid.remove_tile(&other);
                        self.grid.remove_tile(&tile);
                        self.grid.insert_tile(joined);
                        merged[joined.x * size + joined.y] = true;
                        self.score += joined.value as Score;
                        tile.update_position(joined.cell());
                    }
                    _ => self.move_tile(&mut tile, farthest),
                }

                if tile.cell() != cell {
                    moved = true;
                }
            }
        }
        moved
    }

    fn move_tile(&mut self, tile: &mut Tile, cell: Cell) {
        if tile.cell() == cell {
            return;
        }
        self.grid.remove_tile(tile);
        tile.update_position(cell);
        self.grid.insert_tile(*tile);
    }

    /// Walks from `cell` along `vector` over empty cells. Returns the last empty
    /// cell reached and the in-bounds cell that stopped the walk, if any.
    fn find_farthest_position(&self, cell: Cell, vector: (isize, isize)) -> (Cell, Option<Cell>) {
        let mut farthest = cell;
        loop {
            match farthest.step(vector) {
                Some(next) if self.grid.cell_available(next) => farthest = next,
                Some(next) if self.grid.within_bounds(next) => return (farthest, Some(next)),
                _ => return (farthest, None),
            }
        }
    }
}

/// Axis orders for a shift: tiles nearest the destination edge come first.
fn build_traversals(size: usize, (dx, dy): (isize, isize)) -> (Vec<usize>, Vec<usize>) {
    let mut xs: Vec<usize> = (0..size).collect();
    let mut ys: Vec<usize> = (0..size).collect();
    if dx == 1 {
        xs.reverse();
    }
    if dy == 1 {
        ys.reverse();
    }
    (xs, ys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn brain(rows: &[[u32; 4]]) -> Brain {
        Brain::new(GridSnapshot::from_rows(rows))
    }

    fn rows(brain: &Brain) -> Vec<Vec<u32>> {
        let grid = brain.grid();
        (0..grid.size())
            .map(|y| (0..grid.size()).map(|x| grid.value_at(x, y)).collect())
            .collect()
    }

    #[test]
    fn it_codes_directions() {
        for &direction in &Move::ALL {
            assert_eq!(Move::from_code(direction.code()), Some(direction));
        }
        assert_eq!(Move::from_code(4), None);
        assert_eq!(Move::Right.code(), 1);
    }

    #[test]
    fn it_merges_once_per_tile() {
        let mut b = brain(&[[2, 2, 4, 0], [0; 4], [0; 4], [0; 4]]);
        assert!(b.shift(Move::Left));
        assert_eq!(rows(&b)[0], vec![4, 4, 0, 0]);
        assert_eq!(b.score(), 4);

        let mut b = brain(&[[0, 4, 2, 2], [0; 4], [0; 4], [0; 4]]);
        assert!(b.shift(Move::Right));
        assert_eq!(rows(&b)[0], vec![0, 0, 4, 4]);
        assert_eq!(b.score(), 4);
    }

    #[test]
    fn it_shifts_left() {
        let mut b = brain(&[[2, 4, 8, 16], [2, 8, 8, 4], [4, 0, 0, 4], [2, 0, 0, 4]]);
        assert!(b.shift(Move::Left));
        assert_eq!(
            rows(&b),
            vec![
                vec![2, 4, 8, 16],
                vec![2, 16, 4, 0],
                vec![8, 0, 0, 0],
                vec![2, 4, 0, 0]
            ]
        );
        assert_eq!(b.score(), 16 + 8);
    }

    #[test]
    fn it_shifts_right() {
        let mut b = brain(&[[2, 4, 8, 16], [2, 8, 8, 4], [4, 0, 0, 4], [2, 0, 0, 4]]);
        assert!(b.shift(Move::Right));
        assert_eq!(
            rows(&b),
            vec![
                vec![2, 4, 8, 16],
                vec![0, 2, 16, 4],
                vec![0, 0, 0, 8],
                vec![0, 0, 2, 4]
            ]
        );
    }

    #[test]
    fn it_shifts_up_and_down() {
        let start = [[2, 2, 2, 4], [4, 2, 0, 0], [8, 8, 0, 0], [16, 4, 4, 4]];
        let mut b = brain(&start);
        assert!(b.shift(Move::Up));
        assert_eq!(
            rows(&b),
            vec![
                vec![2, 4, 2, 8],
                vec![4, 8, 4, 0],
                vec![8, 4, 0, 0],
                vec![16, 0, 0, 0]
            ]
        );

        let mut b = brain(&start);
        assert!(b.shift(Move::Down));
        assert_eq!(
            rows(&b),
            vec![
                vec![2, 0, 0, 0],
                vec![4, 4, 0, 0],
                vec![8, 8, 2, 0],
                vec![16, 4, 4, 8]
            ]
        );
    }

    #[test]
    fn it_chains_fours() {
        let mut b = brain(&[[2, 2, 2, 2], [0; 4], [0; 4], [0; 4]]);
        assert!(b.shift(Move::Left));
        assert_eq!(rows(&b)[0], vec![4, 4, 0, 0]);
        assert!(b.shift(Move::Left));
        assert_eq!(rows(&b)[0], vec![8, 0, 0, 0]);
        assert_eq!(b.score(), 16);
    }

    #[test]
    fn it_leaves_largest_tiles_unmerged() {
        let mut grid = Grid::new(4);
        grid.insert_tile(Tile::new(Cell::new(0, 0), 1 << 30));
        grid.insert_tile(Tile::new(Cell::new(1, 0), 1 << 30));
        let mut b = Brain::from_grid(&grid);
        assert!(b.shift(Move::Left));
        assert_eq!(rows(&b)[0], vec![1 << 31, 0, 0, 0]);

        b.grid_mut().insert_tile(Tile::new(Cell::new(1, 0), 1 << 31));
        assert!(!b.shift(Move::Left));
        assert_eq!(rows(&b)[0], vec![1 << 31, 1 << 31, 0, 0]);
        assert!(b.shift(Move::Right));
        assert_eq!(rows(&b)[0], vec![0, 0, 1 << 31, 1 << 31]);
    }

    #[test]
    fn it_reports_no_move() {
        let mut b = brain(&[[2, 4, 8, 16], [0; 4], [0; 4], [0; 4]]);
        assert!(!b.shift(Move::Up));
        assert!(!b.shift(Move::Left));
        assert!(!b.shift(Move::Right));
        assert!(b.shift(Move::Down));
    }

    #[test]
    fn it_resets_to_snapshot() {
        let start = [[2, 2, 4, 0], [0, 8, 0, 0], [0; 4], [4, 0, 0, 4]];
        let mut b = brain(&start);
        let before = b.grid().serialize();
        assert!(b.shift(Move::Left));
        assert!(b.score() > 0);
        b.reset();
        assert_eq!(b.grid().serialize(), before);
        assert_eq!(b.score(), 0);
    }

    #[test]
    fn it_forks_without_aliasing() {
        let b = brain(&[[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]);
        let mut child = b.fork();
        assert!(child.shift(Move::Left));
        assert_eq!(rows(&b)[0], vec![2, 2, 0, 0]);
        assert_eq!(rows(&child)[0], vec![4, 0, 0, 0]);
        child.reset();
        assert_eq!(rows(&child)[0], vec![2, 2, 0, 0]);
    }

    #[test]
    fn it_detects_game_over() {
        let stuck = brain(&[[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
        assert!(stuck.is_game_over());
        let open = brain(&[[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 4]]);
        assert!(!open.is_game_over());
    }

    #[test]
    fn it_adds_random_tiles_until_full() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut b = Brain::new(Grid::new(4).serialize());
        for _ in 0..16 {
            let tile = b.add_random_tile(&mut rng).unwrap();
            assert!(tile.value == 2 || tile.value == 4);
        }
        assert!(!b.grid().cells_available());
        assert_eq!(b.add_random_tile(&mut rng), None);
    }

    #[test]
    fn it_spawns_after_a_move() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut b = brain(&[[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]]);
        assert!(!b.make_move(Move::Left, &mut rng));
        assert_eq!(b.grid().tiles().count(), 1);
        assert!(b.make_move(Move::Right, &mut rng));
        assert_eq!(b.grid().tiles().count(), 2);
    }
}
