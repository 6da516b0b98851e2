use crate::error::SnapshotError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A slot coordinate. `x` is the column, `y` the row, both counted from the top left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

impl Cell {
    pub fn new(x: usize, y: usize) -> Self {
        Cell { x, y }
    }

    /// One step along `(dx, dy)`. Returns `None` when the step would leave the
    /// non-negative quadrant; the upper bound is checked by `Grid::within_bounds`.
    pub fn step(self, (dx, dy): (isize, isize)) -> Option<Cell> {
        Some(Cell {
            x: self.x.checked_add_signed(dx)?,
            y: self.y.checked_add_signed(dy)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub x: usize,
    pub y: usize,
    pub value: u32,
}

impl Tile {
    pub fn new(cell: Cell, value: u32) -> Self {
        assert!(is_tile_value(value), "invalid tile value {}", value);
        Tile {
            x: cell.x,
            y: cell.y,
            value,
        }
    }

    pub fn cell(&self) -> Cell {
        Cell::new(self.x, self.y)
    }

    pub fn update_position(&mut self, cell: Cell) {
        self.x = cell.x;
        self.y = cell.y;
    }
}

/// Largest tile value accepted from outside the engine. Two of them still
/// merge into a value that fits in a `u32`.
pub const MAX_TILE_VALUE: u32 = 1 << 30;

fn is_tile_value(value: u32) -> bool {
    value >= 2 && value.is_power_of_two()
}

/// Plain-data form of a tile as exchanged with the game loop. The position is
/// optional since the slot already determines it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Cell>,
    pub value: u32,
}

/// `{ size, cells }` where `cells[x][y]` is `null` or a tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub size: usize,
    pub cells: Vec<Vec<Option<TileSnapshot>>>,
}

impl GridSnapshot {
    /// Parses and validates a snapshot coming from outside the engine.
    pub fn from_json(json: &str) -> Result<GridSnapshot, SnapshotError> {
        let snapshot: GridSnapshot = serde_json::from_str(json)?;
        snapshot.validate()?;
        snapshot.check_value_range()?;
        Ok(snapshot)
    }

    fn check_value_range(&self) -> Result<(), SnapshotError> {
        for (x, column) in self.cells.iter().enumerate() {
            for (y, slot) in column.iter().enumerate() {
                match slot {
                    Some(tile) if tile.value > MAX_TILE_VALUE => {
                        return Err(SnapshotError::ValueTooLarge {
                            x,
                            y,
                            value: tile.value,
                            max: MAX_TILE_VALUE,
                        })
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Builds a snapshot from rows of tile values, `0` meaning empty.
    /// `rows[y][x]` reads the way a board is printed.
    pub fn from_rows<const N: usize>(rows: &[[u32; N]]) -> GridSnapshot {
        assert_eq!(rows.len(), N, "rows must form a square");
        let size = N;
        let cells = (0..size)
            .map(|x| {
                (0..size)
                    .map(|y| match rows[y][x] {
                        0 => None,
                        value => Some(TileSnapshot {
                            position: Some(Cell::new(x, y)),
                            value,
                        }),
                    })
                    .collect()
            })
            .collect();
        GridSnapshot { size, cells }
    }

    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.size == 0 {
            return Err(SnapshotError::EmptyGrid);
        }
        if self.cells.len() != self.size {
            return Err(SnapshotError::ColumnCount {
                size: self.size,
                found: self.cells.len(),
            });
        }
        for (x, column) in self.cells.iter().enumerate() {
            if column.len() != self.size {
                return Err(SnapshotError::ColumnLength {
                    x,
                    size: self.size,
                    found: column.len(),
                });
            }
            for (y, slot) in column.iter().enumerate() {
                let tile = match slot {
                    Some(tile) => tile,
                    None => continue,
                };
                if !is_tile_value(tile.value) {
                    return Err(SnapshotError::InvalidValue {
                        x,
                        y,
                        value: tile.value,
                    });
                }
                if let Some(pos) = tile.position {
                    if pos != Cell::new(x, y) {
                        return Err(SnapshotError::PositionMismatch {
                            x,
                            y,
                            px: pos.x,
                            py: pos.y,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// Square board of optional tiles, stored column-major in one flat vector so
/// that cloning a grid is a single allocation and copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    cells: Vec<Option<Tile>>,
}

impl Grid {
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "grid size must be at least 1");
        Grid {
            size,
            cells: vec![None; size * size],
        }
    }

    /// Deep-copies tile values out of a snapshot. Panics on a malformed
    /// snapshot; validate untrusted input with `GridSnapshot::validate` first.
    pub fn from_snapshot(snapshot: &GridSnapshot) -> Self {
        if let Err(e) = snapshot.validate() {
            panic!("malformed grid snapshot: {}", e);
        }
        Grid::from_trusted_snapshot(snapshot)
    }

    /// Rebuilds a grid from a snapshot this crate produced with `serialize`.
    pub(crate) fn from_trusted_snapshot(snapshot: &GridSnapshot) -> Self {
        let mut grid = Grid::new(snapshot.size);
        for (x, column) in snapshot.cells.iter().enumerate() {
            for (y, slot) in column.iter().enumerate() {
                if let Some(tile) = slot {
                    grid.insert_tile(Tile::new(Cell::new(x, y), tile.value));
                }
            }
        }
        grid
    }

    pub fn serialize(&self) -> GridSnapshot {
        let cells = (0..self.size)
            .map(|x| {
                (0..self.size)
                    .map(|y| {
                        self.cells[self.index(Cell::new(x, y))].map(|tile| TileSnapshot {
                            position: Some(tile.cell()),
                            value: tile.value,
                        })
                    })
                    .collect()
            })
            .collect();
        GridSnapshot {
            size: self.size,
            cells,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn index(&self, cell: Cell) -> usize {
        assert!(
            self.within_bounds(cell),
            "cell ({}, {}) outside {}x{} grid",
            cell.x,
            cell.y,
            self.size,
            self.size
        );
        cell.x * self.size + cell.y
    }

    /// Empty slots, scanned column by column.
    pub fn available_cells(&self) -> Vec<Cell> {
        let mut cells = Vec::new();
        for x in 0..self.size {
            for y in 0..self.size {
                let cell = Cell::new(x, y);
                if self.cell_available(cell) {
                    cells.push(cell);
                }
            }
        }
        cells
    }

    pub fn cells_available(&self) -> bool {
        self.cells.iter().any(Option::is_none)
    }

    pub fn random_available_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Cell> {
        let cells = self.available_cells();
        if cells.is_empty() {
            return None;
        }
        Some(cells[rng.gen_range(0..cells.len())])
    }

    pub fn insert_tile(&mut self, tile: Tile) {
        let idx = self.index(tile.cell());
        assert!(
            self.cells[idx].is_none(),
            "cell ({}, {}) is already occupied",
            tile.x,
            tile.y
        );
        self.cells[idx] = Some(tile);
    }

    pub fn remove_tile(&mut self, tile: &Tile) {
        let idx = self.index(tile.cell());
        debug_assert_eq!(
            self.cells[idx],
            Some(*tile),
            "cell ({}, {}) does not hold the removed tile",
            tile.x,
            tile.y
        );
        self.cells[idx] = None;
    }

    pub fn within_bounds(&self, cell: Cell) -> bool {
        cell.x < self.size && cell.y < self.size
    }

    /// True for an empty in-bounds slot.
    pub fn cell_available(&self, cell: Cell) -> bool {
        self.within_bounds(cell) && self.cells[self.index(cell)].is_none()
    }

    /// The tile in `cell`, or `None` for an empty or out-of-bounds cell.
    pub fn cell_content(&self, cell: Cell) -> Option<Tile> {
        if self.within_bounds(cell) {
            self.cells[self.index(cell)]
        } else {
            None
        }
    }

    /// Tile value at `(x, y)`, 0 when empty.
    pub fn value_at(&self, x: usize, y: usize) -> u32 {
        self.cell_content(Cell::new(x, y)).map_or(0, |tile| tile.value)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.cells.iter().flatten()
    }

    pub fn max_tile_value(&self) -> u32 {
        self.tiles().map(|tile| tile.value).max().unwrap_or(0)
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let divider = "-".repeat(8 * self.size);
        for y in 0..self.size {
            if y > 0 {
                writeln!(f, "{}", divider)?;
            }
            let row: Vec<String> = (0..self.size)
                .map(|x| format_val(self.value_at(x, y)))
                .collect();
            writeln!(f, "{}", row.join("|"))?;
        }
        Ok(())
    }
}

fn format_val(val: u32) -> String {
    match val {
        0 => String::from("       "),
        x => format!("{:^7}", x),
    }
}
