//! 3x3 pattern grid state.

use crate::error::{LockerError, Result};

/// Number of cells in the grid.
pub const GRID_CELLS: usize = 9;

/// Cells per row.
pub const GRID_COLUMNS: usize = 3;

/// Click-ordered selection on a 3x3 grid.
///
/// Owned by the overlay or setup form that renders it; never shared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternGrid {
    selected: [bool; GRID_CELLS],
    sequence: Vec<u8>,
}

impl PatternGrid {
    /// Empty grid.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Click a cell.
    ///
    /// Returns `Ok(false)` when the cell was already selected (inert click).
    pub fn select(&mut self, index: usize) -> Result<bool> {
        let cell = self
            .selected
            .get_mut(index)
            .ok_or(LockerError::CellOutOfRange(index))?;
        if *cell {
            return Ok(false);
        }
        *cell = true;
        // index < GRID_CELLS, fits in u8
        #[allow(clippy::cast_possible_truncation)]
        self.sequence.push(index as u8);
        Ok(true)
    }

    /// Whether a cell is currently selected.
    #[must_use]
    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.get(index).copied().unwrap_or(false)
    }

    /// Selected cell indices in click order.
    #[must_use]
    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Canonical credential string: comma-joined indices in click order.
    #[must_use]
    pub fn canonical(&self) -> String {
        self.sequence
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Deselect every cell and drop the sequence.
    pub fn clear(&mut self) {
        self.selected = [false; GRID_CELLS];
        self.sequence.clear();
    }
}
