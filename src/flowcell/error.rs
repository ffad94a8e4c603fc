use thiserror::Error;

use crate::flowcell::GridConfig;

#[derive(Error, Debug)]
pub enum FlowCellError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read or write dump records: {0}")]
    Csv(#[from] csv::Error),

    #[error("Output file already exists and overwrite is disabled: {0}")]
    OutputExists(String),

    #[error("Line {line}: expected {expected} columns, found {found}")]
    ColumnCount {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("Line {line}: could not parse column '{column}' from value '{value}'")]
    ParseField {
        line: u64,
        column: &'static str,
        value: String,
    },

    #[error("Line {line}: header '#{key}' appears after data rows")]
    HeaderAfterData { line: u64, key: String },

    #[error(
        "Line {line}: micro-tile rectangle mismatch for lane {lane} tile {tile}: dump has {found:?}, grid gives {expected:?}. The x/y size used to produce the dump differs from the current grid"
    )]
    RectangleMismatch {
        line: u64,
        lane: u32,
        tile: u32,
        expected: [u32; 4],
        found: [u32; 4],
    },

    #[error("Invalid grid {x_size}x{y_size}: micro-tile sizes must be at least 1")]
    InvalidGrid { x_size: u32, y_size: u32 },

    #[error("Cannot merge flow cells built on different grids: {left} vs {right}")]
    GridMismatch { left: GridConfig, right: GridConfig },
}
