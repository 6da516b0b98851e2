/// Reasons a board snapshot handed in from outside cannot be turned into a grid.
#[derive(thiserror::Error, Debug)]
pub enum SnapshotError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("grid size must be at least 1")]
    EmptyGrid,
    #[error("expected {size} columns, found {found}")]
    ColumnCount { size: usize, found: usize },
    #[error("column {x} has {found} cells, expected {size}")]
    ColumnLength { x: usize, size: usize, found: usize },
    #[error("tile at ({x}, {y}) has invalid value {value}")]
    InvalidValue { x: usize, y: usize, value: u32 },
    #[error("tile at ({x}, {y}) has value {value}, above the maximum of {max}")]
    ValueTooLarge {
        x: usize,
        y: usize,
        value: u32,
        max: u32,
    },
    #[error("tile in slot ({x}, {y}) claims position ({px}, {py})")]
    PositionMismatch {
        x: usize,
        y: usize,
        px: usize,
        py: usize,
    },
}

/// Rejected search configuration.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("depth {depth} exceeds the maximum of {max}")]
    DepthTooLarge { depth: u32, max: u32 },
}
