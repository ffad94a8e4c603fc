use std::fmt::Display;

use getset::CopyGetters;
use serde::{Deserialize, Serialize};

use crate::flowcell::FlowCellError;

pub const DEFAULT_X_SIZE: u32 = 500;
pub const DEFAULT_Y_SIZE: u32 = 500;
pub const DEFAULT_MIN_POLY_G: usize = 25;

/// Micro-tile geometry shared by every node of one flow cell.
///
/// It is fixed when a [`FlowCell`](crate::flowcell::FlowCell) is created;
/// cells bucketed under one grid must never be merged into another except
/// through an explicit re-bucketing such as widening. Both sizes are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, CopyGetters)]
#[serde(try_from = "RawGridConfig")]
#[getset(get_copy = "pub")]
pub struct GridConfig {
    x_size: u32,
    y_size: u32,
    /// Shortest run of consecutive G bases counted as a poly-G read.
    min_poly_g: usize,
}

#[derive(Deserialize)]
struct RawGridConfig {
    x_size: u32,
    y_size: u32,
    #[serde(default = "default_min_poly_g")]
    min_poly_g: usize,
}

fn default_min_poly_g() -> usize {
    DEFAULT_MIN_POLY_G
}

impl TryFrom<RawGridConfig> for GridConfig {
    type Error = FlowCellError;

    fn try_from(raw: RawGridConfig) -> Result<Self, Self::Error> {
        Ok(GridConfig::try_new(raw.x_size, raw.y_size)?.with_min_poly_g(raw.min_poly_g))
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            x_size: DEFAULT_X_SIZE,
            y_size: DEFAULT_Y_SIZE,
            min_poly_g: DEFAULT_MIN_POLY_G,
        }
    }
}

impl GridConfig {
    /// Grid with the given sizes; a zero size is raised to 1.
    pub fn new(x_size: u32, y_size: u32) -> Self {
        GridConfig {
            x_size: x_size.max(1),
            y_size: y_size.max(1),
            ..Default::default()
        }
    }

    /// Grid with the given sizes, rejecting zero.
    pub fn try_new(x_size: u32, y_size: u32) -> Result<Self, FlowCellError> {
        if x_size == 0 || y_size == 0 {
            return Err(FlowCellError::InvalidGrid { x_size, y_size });
        }
        Ok(GridConfig::new(x_size, y_size))
    }

    pub fn with_min_poly_g(mut self, min_poly_g: usize) -> Self {
        self.min_poly_g = min_poly_g;
        self
    }

    /// Coarse cell index holding `(x, y)`.
    pub fn cell_of(&self, x: u32, y: u32) -> (usize, usize) {
        ((x / self.x_size) as usize, (y / self.y_size) as usize)
    }

    /// Bounds `[x1, x2, y1, y2]` of a coarse cell.
    pub fn cell_rect(&self, xi: usize, yi: usize) -> [u32; 4] {
        let x1 = (xi as u32).saturating_mul(self.x_size);
        let y1 = (yi as u32).saturating_mul(self.y_size);
        [
            x1,
            x1.saturating_add(self.x_size - 1),
            y1,
            y1.saturating_add(self.y_size - 1),
        ]
    }

    pub fn area(&self) -> u64 {
        self.x_size as u64 * self.y_size as u64
    }

    /// Same bucketing as `other`; `min_poly_g` is not part of the geometry.
    pub fn same_geometry(&self, other: &GridConfig) -> bool {
        self.x_size == other.x_size && self.y_size == other.y_size
    }

    /// The next coarser grid: the smaller dimension doubles, `y` on ties.
    /// `None` once doubling would overflow.
    pub fn widened(&self) -> Option<GridConfig> {
        let mut next = *self;
        if self.x_size < self.y_size {
            next.x_size = self.x_size.checked_mul(2)?;
        } else {
            next.y_size = self.y_size.checked_mul(2)?;
        }
        Some(next)
    }
}

impl Display for GridConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.x_size, self.y_size)
    }
}
