//! Solid-cell boundary mask.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Per-cell solid flags, values in {0, 1}. Immutable once a domain is built.
///
/// Cells flagged 1 are excluded from the normal collide-stream update and
/// handled by bounce-back reflection instead.
///
/// Deserialization goes through [`BoundaryMask::from_cells`], so a mask
/// loaded from JSON is subject to the same length and value checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawMask")]
pub struct BoundaryMask {
    shape: Vec<usize>,
    cells: Vec<u8>,
}

#[derive(Deserialize)]
struct RawMask {
    shape: Vec<usize>,
    cells: Vec<u8>,
}

impl TryFrom<RawMask> for BoundaryMask {
    type Error = ConfigError;

    fn try_from(raw: RawMask) -> Result<Self, ConfigError> {
        Self::from_cells(&raw.shape, raw.cells)
    }
}

impl BoundaryMask {
    /// All-fluid mask (fully periodic domain).
    pub fn empty(shape: &[usize]) -> Self {
        let len = shape.iter().product();
        Self {
            shape: shape.to_vec(),
            cells: vec![0; len],
        }
    }

    /// Build a mask from raw cell flags. Length must match the grid and all
    /// values must be exactly 0 or 1.
    pub fn from_cells(shape: &[usize], cells: Vec<u8>) -> Result<Self, ConfigError> {
        let expected: usize = shape.iter().product();
        if cells.len() != expected {
            return Err(ConfigError::MaskLengthMismatch {
                expected,
                got: cells.len(),
            });
        }
        if let Some((index, &value)) = cells.iter().enumerate().find(|&(_, &v)| v > 1) {
            return Err(ConfigError::InvalidMaskValue { index, value });
        }
        Ok(Self {
            shape: shape.to_vec(),
            cells,
        })
    }

    /// Flag or clear a single cell. `coords` is [x, y] or [x, y, z].
    ///
    /// Panics if `coords` does not match the mask dimensionality or is out
    /// of range.
    pub fn set(&mut self, coords: &[usize], solid: bool) {
        let idx = self.offset(coords);
        self.cells[idx] = solid as u8;
    }

    /// Whether the cell at `coords` is solid.
    pub fn is_solid(&self, coords: &[usize]) -> bool {
        self.cells[self.offset(coords)] != 0
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    fn offset(&self, coords: &[usize]) -> usize {
        assert_eq!(coords.len(), self.shape.len(), "coordinate rank mismatch");
        let width = self.shape[0];
        let height = self.shape.get(1).copied().unwrap_or(1);
        for (c, &extent) in coords.iter().zip(self.shape.iter()) {
            assert!(*c < extent, "coordinate out of range");
        }
        let z = coords.get(2).copied().unwrap_or(0);
        (z * height + coords[1]) * width + coords[0]
    }
}
