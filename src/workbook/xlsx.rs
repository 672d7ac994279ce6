//! Directory of xlsx files as a [`DocumentStore`]
//!
//! Files are read with calamine and rewritten in full with rust_xlsxwriter, so only
//! values, formulas, fills, borders and date formats survive a save.

use calamine::{open_workbook, Data, ExcelDateTime, Reader, Xlsx};
use rust_xlsxwriter::{Color, Format, FormatBorder, Formula, Workbook as XlsxWorkbook};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::cell::CellRef;
use super::error::WorkbookError;
use super::sheet::{BorderWeight, CellStyle, CellValue, Sheet, Workbook};
use crate::traits::DocumentStore;
use crate::types::*;

/// Prefix of the lock files Office leaves next to open workbooks
const LOCK_FILE_PREFIX: &str = "~$";

/// Formats given back to date cells; calamine reports that a cell is a date, not its format
pub const DATE_FORMAT: &str = "dd.mm.yyyy";
pub const DATE_TIME_FORMAT: &str = "dd.mm.yyyy hh:mm";
pub const DURATION_FORMAT: &str = "[h]:mm:ss";

/// Every `*.xlsx` file directly inside one directory is a document
#[derive(Debug, Clone)]
pub struct XlsxStore {
    dir: PathBuf,
}

impl XlsxStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, id: &DocumentId) -> PathBuf {
        self.dir.join(id.as_str())
    }
}

impl DocumentStore for XlsxStore {
    fn list_documents(&self) -> ReconcileResult<Vec<DocumentId>> {
        let entries = fs::read_dir(&self.dir).map_err(WorkbookError::from)?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(WorkbookError::from)?;
            if !entry.file_type().map_err(WorkbookError::from)?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_workbook_name(&name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names.into_iter().map(DocumentId::new).collect())
    }

    fn load_workbook(&self, id: &DocumentId) -> ReconcileResult<Workbook> {
        Ok(load_xlsx(&self.path_of(id))?)
    }

    fn save_workbook(&mut self, id: &DocumentId, workbook: &Workbook) -> ReconcileResult<()> {
        Ok(save_xlsx(workbook, &self.path_of(id))?)
    }
}

fn is_workbook_name(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".xlsx") && !name.starts_with(LOCK_FILE_PREFIX)
}

/// Read every sheet of an xlsx file; formula cells keep their cached result
pub fn load_xlsx(path: &Path) -> Result<Workbook, WorkbookError> {
    let mut xlsx: Xlsx<_> = open_workbook(path)?;
    let sheet_names = xlsx.sheet_names().to_vec();

    if sheet_names.is_empty() {
        return Err(WorkbookError::InvalidFormat(
            "Workbook contains no sheets".to_string(),
        ));
    }

    let mut sheets = Vec::with_capacity(sheet_names.len());
    for sheet_name in &sheet_names {
        let range = xlsx.worksheet_range(sheet_name)?;
        let formulas = xlsx.worksheet_formula(sheet_name)?;

        let mut expressions = BTreeMap::new();
        let (formula_row, formula_column) = formulas.start().unwrap_or((0, 0));
        for (row, column, expression) in formulas.used_cells() {
            let cell = cell_at(formula_row + row as u32, formula_column + column as u32)?;
            expressions.insert(cell, expression.clone());
        }

        let mut sheet = Sheet::new(sheet_name.clone());
        let (start_row, start_column) = range.start().unwrap_or((0, 0));
        for (row, column, data) in range.used_cells() {
            let cell = cell_at(start_row + row as u32, start_column + column as u32)?;
            if let Data::DateTime(date) = data {
                sheet.style_mut(cell).number_format = Some(date_format(date).to_string());
            }
            let value = match data {
                Data::Empty => continue,
                Data::String(text) => CellValue::Text(text.clone()),
                Data::Float(number) => CellValue::Number(*number),
                Data::Int(number) => CellValue::Number(*number as f64),
                Data::Bool(flag) => CellValue::Bool(*flag),
                Data::DateTime(date) => CellValue::Number(date.as_f64()),
                Data::DateTimeIso(text) | Data::DurationIso(text) => CellValue::Text(text.clone()),
                Data::Error(error) => CellValue::Text(format!("#{:?}", error)),
            };
            let value = match (expressions.remove(&cell), value.as_number()) {
                (Some(expression), Some(cached)) => CellValue::Formula { expression, cached },
                _ => value,
            };
            sheet.set(cell, value);
        }
        sheets.push(sheet);
    }

    Ok(Workbook { sheets, active: 0 })
}

fn date_format(date: &ExcelDateTime) -> &'static str {
    if date.is_duration() {
        DURATION_FORMAT
    } else if date.as_f64().fract() == 0.0 {
        DATE_FORMAT
    } else {
        DATE_TIME_FORMAT
    }
}

fn cell_at(row: u32, column: u32) -> Result<CellRef, WorkbookError> {
    let column = u16::try_from(column)
        .map_err(|_| WorkbookError::InvalidFormat(format!("column {} out of range", column)))?;
    Ok(CellRef::new(row, column))
}

/// Write `workbook` to `path`, replacing the file
pub fn save_xlsx(workbook: &Workbook, path: &Path) -> Result<(), WorkbookError> {
    let mut xlsx = XlsxWorkbook::new();

    for sheet in &workbook.sheets {
        let worksheet = xlsx.add_worksheet();
        worksheet.set_name(&sheet.name)?;

        for (cell, value) in &sheet.cells {
            let format = sheet
                .style(*cell)
                .filter(|style| !style.is_plain())
                .map(convert_style_to_format)
                .unwrap_or_default();
            let (row, column) = (cell.row, cell.column);

            match value {
                CellValue::Number(number) => {
                    worksheet.write_number_with_format(row, column, *number, &format)?;
                }
                CellValue::Text(text) => {
                    worksheet.write_string_with_format(row, column, text, &format)?;
                }
                CellValue::Bool(flag) => {
                    worksheet.write_boolean_with_format(row, column, *flag, &format)?;
                }
                CellValue::Formula { expression, cached } => {
                    let formula = Formula::new(expression.as_str()).set_result(cached.to_string());
                    worksheet.write_formula_with_format(row, column, formula, &format)?;
                }
            }
        }

        // Borders and fills on cells without a value
        for (cell, style) in &sheet.styles {
            if sheet.cells.contains_key(cell) || style.is_plain() {
                continue;
            }
            worksheet.write_blank(cell.row, cell.column, &convert_style_to_format(style))?;
        }
    }

    xlsx.save(path)?;
    Ok(())
}

fn convert_style_to_format(style: &CellStyle) -> Format {
    let mut format = Format::new();

    if let Some(rgb) = style.fill {
        format = format.set_background_color(Color::RGB(rgb));
    }
    if let Some(weight) = style.border_left {
        format = format.set_border_left(border(weight));
    }
    if let Some(weight) = style.border_right {
        format = format.set_border_right(border(weight));
    }
    if let Some(weight) = style.border_bottom {
        format = format.set_border_bottom(border(weight));
    }
    if let Some(number_format) = &style.number_format {
        format = format.set_num_format(number_format);
    }

    format
}

fn border(weight: BorderWeight) -> FormatBorder {
    match weight {
        BorderWeight::Thin => FormatBorder::Thin,
        BorderWeight::Thick => FormatBorder::Thick,
    }
}
