//! Batch run over in-memory workbooks

use price_reconciler::utils::MemoryStore;
use price_reconciler::workbook::{CellRef, CellValue, Sheet, SheetLayout};
use price_reconciler::{
    init_tracing, DocumentId, DocumentProcessor, DocumentStatus, LogOptions, ProcessorConfig,
    Workbook,
};

fn price_workbook(rate: f64, target: f64, rows: &[(&str, f64, f64)]) -> Workbook {
    let layout = SheetLayout::default();
    let mut sheet = Sheet::new("Sheet1");
    sheet.set_text(layout.date_cell(), "2024-03-01");
    sheet.set_number(layout.exchange_rate_cell(), rate);
    sheet.set_number(layout.target_local_cell(), target);
    for (index, (model, price, weight)) in rows.iter().enumerate() {
        sheet.set_text(layout.data_cell(index, layout.model), *model);
        sheet.set_number(layout.data_cell(index, layout.price_reference), *price);
        sheet.set_number(layout.data_cell(index, layout.weight), *weight);
    }
    Workbook::from_sheet(sheet)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing(&LogOptions::default())?;

    let store = MemoryStore::new();
    store.insert(
        DocumentId::new("march.xlsx"),
        price_workbook(
            7.5,
            350.0,
            &[("A-100", 10.0, 50.0), ("B-200", 20.0, 30.0), ("C-300", 15.0, 20.0)],
        ),
    )?;
    store.insert(
        DocumentId::new("april.xlsx"),
        price_workbook(
            6.93,
            1250.0,
            &[
                ("K-1", 12.4, 25.0),
                ("K-2", 31.15, 25.0),
                ("K-3", 8.99, 40.0),
                ("K-4", 57.3, 10.0),
            ],
        ),
    )?;
    // weights add up to 101
    store.insert(
        DocumentId::new("broken.xlsx"),
        price_workbook(7.0, 100.0, &[("X", 1.0, 50.0), ("Y", 2.0, 51.0)]),
    )?;

    let mut processor = DocumentProcessor::new(store.clone(), &ProcessorConfig::default())?;
    let report = processor.process_batch()?;

    let layout = SheetLayout::default();
    for document in &report.documents {
        match &document.status {
            DocumentStatus::Completed => println!(
                "{}: {} rows, {} nudges, totals {} / {}",
                document.document,
                document.rows,
                document.nudges,
                document.total_local.clone().unwrap_or_default(),
                document.total_reference.clone().unwrap_or_default()
            ),
            DocumentStatus::Incomplete { discrepancy } => {
                println!("{}: incomplete, {}", document.document, discrepancy)
            }
            DocumentStatus::Failed { error } => {
                println!("{}: failed, {}", document.document, error);
                continue;
            }
        }

        for adjustment in &document.adjusted_rows {
            println!(
                "  row {} {:?}: {} -> {}",
                adjustment.index, adjustment.kind, adjustment.original_local, adjustment.final_local
            );
        }

        if let Some(workbook) = store.get(&document.document)? {
            let sheet = workbook.active_sheet().ok_or("workbook has no sheet")?;
            for row in 0..document.rows {
                let cell: CellRef = layout.data_cell(row, layout.adjusted_local);
                if let Some(value) = sheet.get(cell).and_then(CellValue::as_number) {
                    println!("  {} = {:.2}", cell, value);
                }
            }
        }
    }

    println!(
        "{} completed, {} incomplete, {} failed",
        report.completed(),
        report.incomplete(),
        report.failed()
    );
    Ok(())
}
