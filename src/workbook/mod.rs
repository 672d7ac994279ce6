//! Tabular store boundary: typed cell addresses, in-memory sheets, price-sheet layout,
//! extraction and write-back, markers, and the xlsx-backed store

pub mod cell;
pub mod document;
pub mod error;
pub mod layout;
pub mod sheet;
pub mod styling;
pub mod xlsx;

pub use cell::{column_name, parse_column, CellRef};
pub use document::{read_document, write_results, WriteOptions, WrittenTotals};
pub use error::WorkbookError;
pub use layout::{LayoutConfig, SheetLayout};
pub use sheet::{BorderWeight, CellStyle, CellValue, Sheet, Workbook};
pub use styling::{apply_frame, apply_markers, Marker};
pub use xlsx::{load_xlsx, save_xlsx, XlsxStore, DATE_FORMAT, DATE_TIME_FORMAT, DURATION_FORMAT};
