//! In-memory workbook model shared by the xlsx and in-memory stores

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::cell::CellRef;

/// Value held by one cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Bool(bool),
    /// Formula without the leading `=`, with its last computed number
    Formula { expression: String, cached: f64 },
}

impl CellValue {
    /// Numeric content, using the cached result for formulas
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(value) => Some(*value),
            CellValue::Formula { cached, .. } => Some(*cached),
            CellValue::Text(_) | CellValue::Bool(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Whether the cell counts as empty for row-range discovery
    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Text(text) if text.trim().is_empty())
    }
}

/// Weight of one border edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BorderWeight {
    Thin,
    Thick,
}

/// Visual attributes of one cell; unset fields keep the default look
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellStyle {
    /// Solid fill as `0xRRGGBB`
    pub fill: Option<u32>,
    pub border_left: Option<BorderWeight>,
    pub border_right: Option<BorderWeight>,
    pub border_bottom: Option<BorderWeight>,
    /// Excel number format code, e.g. `dd.mm.yyyy`
    pub number_format: Option<String>,
}

impl CellStyle {
    pub fn is_plain(&self) -> bool {
        *self == CellStyle::default()
    }
}

/// One worksheet: sparse cells plus per-cell styles
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub cells: BTreeMap<CellRef, CellValue>,
    pub styles: BTreeMap<CellRef, CellStyle>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn get(&self, cell: CellRef) -> Option<&CellValue> {
        self.cells.get(&cell)
    }

    pub fn set(&mut self, cell: CellRef, value: CellValue) {
        self.cells.insert(cell, value);
    }

    pub fn set_number(&mut self, cell: CellRef, value: f64) {
        self.set(cell, CellValue::Number(value));
    }

    pub fn set_text(&mut self, cell: CellRef, value: impl Into<String>) {
        self.set(cell, CellValue::Text(value.into()));
    }

    pub fn set_formula(&mut self, cell: CellRef, expression: impl Into<String>, cached: f64) {
        self.set(
            cell,
            CellValue::Formula {
                expression: expression.into(),
                cached,
            },
        );
    }

    pub fn style(&self, cell: CellRef) -> Option<&CellStyle> {
        self.styles.get(&cell)
    }

    /// Style of `cell` for in-place modification, created on first use
    pub fn style_mut(&mut self, cell: CellRef) -> &mut CellStyle {
        self.styles.entry(cell).or_default()
    }

    /// Last row holding a value, if any
    pub fn max_row(&self) -> Option<u32> {
        self.cells.keys().map(|cell| cell.row).max()
    }
}

/// A workbook: ordered sheets and the index of the one processed
#[derive(Debug, Clone, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
    pub active: usize,
}

impl Workbook {
    pub fn new() -> Self {
        Self {
            sheets: vec![Sheet::new("Sheet1")],
            active: 0,
        }
    }

    pub fn from_sheet(sheet: Sheet) -> Self {
        Self {
            sheets: vec![sheet],
            active: 0,
        }
    }

    pub fn active_sheet(&self) -> Option<&Sheet> {
        self.sheets.get(self.active)
    }

    pub fn active_sheet_mut(&mut self) -> Option<&mut Sheet> {
        self.sheets.get_mut(self.active)
    }
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}
