//! Where each named field lives on a price sheet

use serde::{Deserialize, Serialize};

use super::cell::{parse_column, CellRef};
use super::sheet::Sheet;
use crate::types::*;

/// Layout as written in configuration: column letters and 1-based row numbers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Model names; the first empty cell ends the data
    pub model_column: String,
    /// Unit price in the reference currency; the fixed row holds the exchange rate
    pub price_reference_column: String,
    /// Unit price in the local currency (written)
    pub price_local_column: String,
    pub weight_column: String,
    /// Weighted share of the residual (written)
    pub share_column: String,
    /// Adjusted local value; the fixed row holds the local target
    pub adjusted_local_column: String,
    /// Adjusted reference value; the fixed row receives the reference target
    pub adjusted_reference_column: String,
    /// Row of the date, exchange rate and target cells
    pub fixed_row: u32,
    /// First data row
    pub start_row: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            model_column: "B".to_string(),
            price_reference_column: "C".to_string(),
            price_local_column: "D".to_string(),
            weight_column: "E".to_string(),
            share_column: "F".to_string(),
            adjusted_local_column: "G".to_string(),
            adjusted_reference_column: "H".to_string(),
            fixed_row: 3,
            start_row: 6,
        }
    }
}

/// Validated layout with 0-based typed addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetLayout {
    pub model: u16,
    pub price_reference: u16,
    pub price_local: u16,
    pub weight: u16,
    pub share: u16,
    pub adjusted_local: u16,
    pub adjusted_reference: u16,
    pub fixed_row: u32,
    pub start_row: u32,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            model: 1,
            price_reference: 2,
            price_local: 3,
            weight: 4,
            share: 5,
            adjusted_local: 6,
            adjusted_reference: 7,
            fixed_row: 2,
            start_row: 5,
        }
    }
}

impl TryFrom<&LayoutConfig> for SheetLayout {
    type Error = ReconcileError;

    fn try_from(config: &LayoutConfig) -> ReconcileResult<Self> {
        let column = |name: &str, letters: &str| {
            parse_column(letters).map_err(|_| {
                ReconcileError::Config(format!("{} '{}' is not a column", name, letters))
            })
        };

        if config.fixed_row == 0 {
            return Err(ReconcileError::Config("fixed_row is 1-based".to_string()));
        }
        if config.start_row <= config.fixed_row {
            return Err(ReconcileError::Config(format!(
                "start_row {} must lie below fixed_row {}",
                config.start_row, config.fixed_row
            )));
        }

        let layout = Self {
            model: column("model_column", &config.model_column)?,
            price_reference: column("price_reference_column", &config.price_reference_column)?,
            price_local: column("price_local_column", &config.price_local_column)?,
            weight: column("weight_column", &config.weight_column)?,
            share: column("share_column", &config.share_column)?,
            adjusted_local: column("adjusted_local_column", &config.adjusted_local_column)?,
            adjusted_reference: column(
                "adjusted_reference_column",
                &config.adjusted_reference_column,
            )?,
            fixed_row: config.fixed_row - 1,
            start_row: config.start_row - 1,
        };

        let mut columns = layout.columns().to_vec();
        columns.sort_unstable();
        columns.dedup();
        if columns.len() != layout.columns().len() {
            return Err(ReconcileError::Config(
                "layout columns must be distinct".to_string(),
            ));
        }
        Ok(layout)
    }
}

impl SheetLayout {
    pub fn columns(&self) -> [u16; 7] {
        [
            self.model,
            self.price_reference,
            self.price_local,
            self.weight,
            self.share,
            self.adjusted_local,
            self.adjusted_reference,
        ]
    }

    pub fn date_cell(&self) -> CellRef {
        CellRef::new(self.fixed_row, self.model)
    }

    pub fn exchange_rate_cell(&self) -> CellRef {
        CellRef::new(self.fixed_row, self.price_reference)
    }

    pub fn target_local_cell(&self) -> CellRef {
        CellRef::new(self.fixed_row, self.adjusted_local)
    }

    pub fn target_reference_cell(&self) -> CellRef {
        CellRef::new(self.fixed_row, self.adjusted_reference)
    }

    /// Sheet row of the data row at `index`
    pub fn data_row(&self, index: usize) -> u32 {
        self.start_row + index as u32
    }

    /// Cell of data row `index` in `column`
    pub fn data_cell(&self, index: usize, column: u16) -> CellRef {
        CellRef::new(self.data_row(index), column)
    }

    /// Row right after `rows` data rows, receiving the achieved totals
    pub fn summary_row(&self, rows: usize) -> u32 {
        self.data_row(rows)
    }

    /// Leftmost and rightmost columns of the framed table
    pub fn frame_columns(&self) -> (u16, u16) {
        let columns = self.columns();
        let first = columns.iter().copied().min().unwrap_or(self.model);
        let last = columns.iter().copied().max().unwrap_or(self.model);
        (first, last)
    }

    /// Number of data rows: everything from the start row up to the first empty model cell
    pub fn count_rows(&self, sheet: &Sheet) -> usize {
        (0..)
            .take_while(|&index| {
                sheet
                    .get(self.data_cell(index, self.model))
                    .is_some_and(|value| !value.is_blank())
            })
            .count()
    }
}
