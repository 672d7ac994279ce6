//! Typed `(column, row)` cell addressing
//!
//! Rows and columns are 0-based internally; A1 notation is only used at the boundary
//! (configuration, formulas, log messages).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::*;

/// Largest column index accepted by the xlsx format (`XFD`)
pub const MAX_COLUMN: u16 = 16_383;
/// Largest row index accepted by the xlsx format
pub const MAX_ROW: u32 = 1_048_575;

/// Address of one cell; ordered row-major
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellRef {
    pub row: u32,
    pub column: u16,
}

impl CellRef {
    pub fn new(row: u32, column: u16) -> Self {
        Self { row, column }
    }

    /// Absolute-reference form used in formulas, e.g. `$C$3`
    pub fn absolute(&self) -> String {
        format!("${}${}", column_name(self.column), self.row + 1)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_name(self.column), self.row + 1)
    }
}

impl FromStr for CellRef {
    type Err = ReconcileError;

    /// Parse A1 notation, e.g. `G3`
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        let split = text
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| ReconcileError::InvalidInput(format!("'{}' has no row number", text)))?;
        let (letters, digits) = text.split_at(split);
        let column = parse_column(letters)?;
        let row: u32 = digits
            .parse()
            .map_err(|_| ReconcileError::InvalidInput(format!("'{}' has an invalid row", text)))?;
        if row == 0 || row - 1 > MAX_ROW {
            return Err(ReconcileError::InvalidInput(format!(
                "row {} of '{}' is out of range",
                row, text
            )));
        }
        Ok(Self::new(row - 1, column))
    }
}

/// Parse column letters (`A`, `H`, `AB`) into a 0-based column index
pub fn parse_column(letters: &str) -> ReconcileResult<u16> {
    let letters = letters.trim();
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ReconcileError::InvalidInput(format!(
            "'{}' is not a column name",
            letters
        )));
    }

    let mut number: u32 = 0;
    for c in letters.chars() {
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as u32 + 1;
        number = number * 26 + digit;
        if number > MAX_COLUMN as u32 + 1 {
            return Err(ReconcileError::InvalidInput(format!(
                "column '{}' is out of range",
                letters
            )));
        }
    }
    Ok((number - 1) as u16)
}

/// Column letters for a 0-based column index
pub fn column_name(column: u16) -> String {
    let mut number = column as u32 + 1;
    let mut letters = Vec::new();
    while number > 0 {
        let remainder = (number - 1) % 26;
        letters.push(b'A' + remainder as u8);
        number = (number - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}
