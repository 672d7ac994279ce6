//! Extraction of a [`PriceDocument`] from a sheet and write-back of the results

use bigdecimal::BigDecimal;
use chrono::{Days, NaiveDate};
use std::str::FromStr;

use super::cell::{column_name, CellRef};
use super::layout::SheetLayout;
use super::sheet::{CellValue, Sheet};
use crate::allocation::Targets;
use crate::money::{decimal_from_f64, decimal_to_f64, Rounding};
use crate::types::*;
use crate::utils::validation::validate_model_name;

/// Text date formats accepted in the date cell
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"];

/// Read the fixed cells and the data rows of `sheet`.
///
/// The date is optional; a missing or unreadable date is not an error.
pub fn read_document(
    id: DocumentId,
    sheet: &Sheet,
    layout: &SheetLayout,
) -> ReconcileResult<PriceDocument> {
    let exchange_rate = number_at(sheet, layout.exchange_rate_cell(), "exchange rate")?;
    let target_sum_local = number_at(sheet, layout.target_local_cell(), "target sum")?;
    let date = sheet.get(layout.date_cell()).and_then(date_from_cell);

    let rows = (0..layout.count_rows(sheet))
        .map(|index| {
            let model_cell = layout.data_cell(index, layout.model);
            let model = sheet
                .get(model_cell)
                .map(text_of)
                .unwrap_or_default();
            validate_model_name(&model)?;
            Ok(SourceRow {
                index,
                model,
                unit_price_reference: number_at(
                    sheet,
                    layout.data_cell(index, layout.price_reference),
                    "unit price",
                )?,
                weight: number_at(sheet, layout.data_cell(index, layout.weight), "weight")?,
            })
        })
        .collect::<ReconcileResult<Vec<_>>>()?;

    Ok(PriceDocument {
        id,
        date,
        exchange_rate,
        target_sum_local,
        rows,
    })
}

/// How results are written back
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteOptions {
    /// Keep full precision instead of rounding written values
    pub manual: bool,
    /// Write summary and reference cells as formulas
    pub cross_check_formulas: bool,
    pub rounding: Rounding,
}

/// Totals of the values actually written to the summary row
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenTotals {
    pub local: BigDecimal,
    pub reference: BigDecimal,
}

/// Write the reference target, the per-row derived values and the summary row.
///
/// `items` must be in data-row order. The summary totals are summed from the values
/// written here, after any reconciliation.
pub fn write_results(
    sheet: &mut Sheet,
    layout: &SheetLayout,
    items: &[LineItem],
    targets: &Targets,
    options: &WriteOptions,
) -> WrittenTotals {
    let finish = |value: &BigDecimal| {
        if options.manual {
            value.clone()
        } else {
            options.rounding.round(value)
        }
    };

    sheet.set_number(
        layout.target_reference_cell(),
        decimal_to_f64(&finish(&targets.target_sum_reference)),
    );

    let rate_cell = layout.exchange_rate_cell().absolute();
    let mut total_local = BigDecimal::from(0);
    let mut total_reference = BigDecimal::from(0);

    for (position, item) in items.iter().enumerate() {
        let price_local = finish(&item.price_local);
        let share = finish(&item.weighted_share_local);
        let value_local = finish(&item.value_local);
        let value_reference = finish(&item.value_reference);

        sheet.set_number(
            layout.data_cell(position, layout.price_local),
            decimal_to_f64(&price_local),
        );
        sheet.set_number(
            layout.data_cell(position, layout.share),
            decimal_to_f64(&share),
        );
        let local_cell = layout.data_cell(position, layout.adjusted_local);
        sheet.set_number(local_cell, decimal_to_f64(&value_local));

        let reference_cell = layout.data_cell(position, layout.adjusted_reference);
        if options.cross_check_formulas {
            let quotient = format!("{}/{}", local_cell, rate_cell);
            let expression = if options.manual {
                quotient
            } else {
                format!("ROUND({},{})", quotient, options.rounding.scale)
            };
            sheet.set_formula(reference_cell, expression, decimal_to_f64(&value_reference));
        } else {
            sheet.set_number(reference_cell, decimal_to_f64(&value_reference));
        }

        total_local += value_local;
        total_reference += value_reference;
    }

    let summary_row = layout.summary_row(items.len());
    for (column, total) in [
        (layout.adjusted_local, &total_local),
        (layout.adjusted_reference, &total_reference),
    ] {
        let cell = CellRef::new(summary_row, column);
        if options.cross_check_formulas && !items.is_empty() {
            let letters = column_name(column);
            let expression = format!(
                "SUM({}{}:{}{})",
                letters,
                layout.start_row + 1,
                letters,
                summary_row
            );
            sheet.set_formula(cell, expression, decimal_to_f64(total));
        } else {
            sheet.set_number(cell, decimal_to_f64(total));
        }
    }

    WrittenTotals {
        local: total_local,
        reference: total_reference,
    }
}

fn number_at(sheet: &Sheet, cell: CellRef, what: &str) -> ReconcileResult<BigDecimal> {
    let value = sheet
        .get(cell)
        .ok_or_else(|| ReconcileError::InvalidInput(format!("{} cell {} is empty", what, cell)))?;

    let number = match value {
        CellValue::Text(text) => BigDecimal::from_str(text.trim()).ok(),
        CellValue::Bool(_) => None,
        other => other.as_number().and_then(decimal_from_f64),
    };
    number.ok_or_else(|| {
        ReconcileError::InvalidInput(format!("{} cell {} is not a number", what, cell))
    })
}

fn text_of(value: &CellValue) -> String {
    match value {
        CellValue::Text(text) => text.trim().to_string(),
        CellValue::Bool(flag) => flag.to_string(),
        other => other
            .as_number()
            .and_then(decimal_from_f64)
            .map(|number| number.to_string())
            .unwrap_or_default(),
    }
}

fn date_from_cell(value: &CellValue) -> Option<NaiveDate> {
    match value {
        CellValue::Text(text) => DATE_FORMATS.iter().find_map(|format| {
            NaiveDate::parse_from_str(text.trim(), format).ok()
        }),
        CellValue::Bool(_) => None,
        other => other.as_number().and_then(date_from_serial),
    }
}

/// Convert an Excel serial day number (1900 date system) into a date
fn date_from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.trunc() as u64))
}
