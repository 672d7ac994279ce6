//! Rounding reconciliation across line items in a local and a reference currency
//!
//! The [`SelectionSequencer`] decides which line item takes the next unit of rounding
//! error; the [`ReconciliationEngine`] drives it until both displayed totals match.

pub mod engine;
pub mod sequencer;

pub use engine::*;
pub use sequencer::*;
