//! # Price Reconciler
//!
//! Weighted allocation of a declared total across price rows, with exact rounding
//! reconciliation in two currencies linked by a fixed exchange rate.
//!
//! ## Features
//!
//! - **Allocation**: spreads the residual between the declared total and the row prices by weight
//! - **Reconciliation**: nudges selected rows until the rounded totals match in both currencies
//! - **Deterministic selection**: rows are ranked by the fraction digits of their reference value
//! - **Workbook boundary**: typed cell addressing, xlsx read/write, change markers
//! - **Storage abstraction**: the pipeline runs against any [`DocumentStore`]
//!
//! ## Quick Start
//!
//! ```rust
//! use price_reconciler::{Allocation, DocumentId, PriceDocument, ReconciliationEngine, SourceRow};
//! use bigdecimal::BigDecimal;
//!
//! let rows = [(10, 50), (20, 30), (15, 20)]
//!     .into_iter()
//!     .enumerate()
//!     .map(|(index, (price, weight))| SourceRow {
//!         index,
//!         model: format!("M{index}"),
//!         unit_price_reference: BigDecimal::from(price),
//!         weight: BigDecimal::from(weight),
//!     })
//!     .collect();
//! let document = PriceDocument {
//!     id: DocumentId::new("prices.xlsx"),
//!     date: None,
//!     exchange_rate: "7.5".parse().unwrap(),
//!     target_sum_local: BigDecimal::from(350),
//!     rows,
//! };
//!
//! let mut allocation = Allocation::allocate(&document).unwrap();
//! let outcome = ReconciliationEngine::default()
//!     .reconcile(&mut allocation.items, &allocation.targets)
//!     .unwrap();
//! assert!(outcome.is_converged());
//! ```

pub mod allocation;
pub mod config;
pub mod logging;
pub mod money;
pub mod processor;
pub mod reconciliation;
pub mod traits;
pub mod types;
pub mod utils;
pub mod workbook;

// Re-export commonly used types
pub use allocation::*;
pub use config::ProcessorConfig;
pub use logging::{init_tracing, LogOptions};
pub use money::*;
pub use processor::DocumentProcessor;
pub use reconciliation::*;
pub use traits::*;
pub use types::*;
pub use workbook::{Workbook, XlsxStore};
