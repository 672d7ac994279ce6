//! Core types and data structures for price allocation and reconciliation

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::reconciliation::{Cursor, RowAdjustment};

/// Identity of one document (one workbook) inside a store
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One data row as read from the source table, before any allocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRow {
    /// 0-based position in the data region
    pub index: usize,
    /// Model name; its presence is what marks a row as data
    pub model: String,
    /// Unit price in the reference currency (EUR)
    pub unit_price_reference: BigDecimal,
    /// Weight percent in `[0, 100]`
    pub weight: BigDecimal,
}

/// Everything the allocation step needs from one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceDocument {
    pub id: DocumentId,
    /// Optional document date from the fixed-cell row
    pub date: Option<NaiveDate>,
    /// Local (HRN) units per one reference (EUR) unit
    pub exchange_rate: BigDecimal,
    /// Declared total in local currency
    pub target_sum_local: BigDecimal,
    pub rows: Vec<SourceRow>,
}

impl PriceDocument {
    /// Sum of all row weights
    pub fn total_weight(&self) -> BigDecimal {
        self.rows.iter().map(|row| &row.weight).sum()
    }

    /// Sum of the original per-row reference prices
    pub fn total_unit_price_reference(&self) -> BigDecimal {
        self.rows.iter().map(|row| &row.unit_price_reference).sum()
    }
}

/// One line item after allocation; mutated in place by the reconciliation engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Stable identity (position in the source sequence); never changes
    pub index: usize,
    pub model: String,
    pub unit_price_reference: BigDecimal,
    pub weight: BigDecimal,
    /// `unit_price_reference * exchange_rate`
    pub price_local: BigDecimal,
    /// This row's share of the residual, in local currency
    pub weighted_share_local: BigDecimal,
    /// Adjusted value in local currency
    pub value_local: BigDecimal,
    /// Adjusted value in reference currency, always `value_local / exchange_rate`
    pub value_reference: BigDecimal,
}

impl LineItem {
    /// Replace the local value and re-derive the reference value from it
    pub fn set_value_local(&mut self, value_local: BigDecimal, exchange_rate: &BigDecimal) {
        self.value_reference = &value_local / exchange_rate;
        self.value_local = value_local;
    }
}

/// Expected vs. achieved totals in both currencies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discrepancy {
    pub expected_local: BigDecimal,
    pub actual_local: BigDecimal,
    pub expected_reference: BigDecimal,
    pub actual_reference: BigDecimal,
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "expected local {}, calculated {}; expected reference {}, calculated {}",
            self.expected_local, self.actual_local, self.expected_reference, self.actual_reference
        )
    }
}

/// Final state of one document in a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Both totals match their targets
    Completed,
    /// Best-effort values were written but the totals still differ
    Incomplete { discrepancy: Discrepancy },
    /// Nothing usable was written for this document
    Failed { error: String },
}

/// Per-document entry of a batch report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentReport {
    pub document: DocumentId,
    pub status: DocumentStatus,
    pub date: Option<NaiveDate>,
    pub rows: usize,
    pub iterations: usize,
    pub nudges: usize,
    pub total_local: Option<BigDecimal>,
    pub total_reference: Option<BigDecimal>,
    pub adjusted_rows: Vec<RowAdjustment>,
    pub processed_at: NaiveDateTime,
}

impl DocumentReport {
    /// Report for a document that failed before anything was written
    pub fn failed(document: DocumentId, error: &ReconcileError) -> Self {
        Self {
            document,
            status: DocumentStatus::Failed {
                error: error.to_string(),
            },
            date: None,
            rows: 0,
            iterations: 0,
            nudges: 0,
            total_local: None,
            total_reference: None,
            adjusted_rows: Vec::new(),
            processed_at: chrono::Utc::now().naive_utc(),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.status, DocumentStatus::Completed)
    }
}

/// Summary of one batch run over a store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub started_at: NaiveDateTime,
    pub finished_at: NaiveDateTime,
    pub documents: Vec<DocumentReport>,
}

impl BatchReport {
    pub fn completed(&self) -> usize {
        self.count(|status| matches!(status, DocumentStatus::Completed))
    }

    pub fn incomplete(&self) -> usize {
        self.count(|status| matches!(status, DocumentStatus::Incomplete { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|status| matches!(status, DocumentStatus::Failed { .. }))
    }

    fn count(&self, predicate: impl Fn(&DocumentStatus) -> bool) -> usize {
        self.documents
            .iter()
            .filter(|report| predicate(&report.status))
            .count()
    }
}

/// Errors that can occur while processing a document
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Weights must total exactly 100, found {total}")]
    WeightSumInvalid { total: BigDecimal },
    #[error("Reconciliation incomplete: {0}")]
    ReconciliationIncomplete(Box<Discrepancy>),
    #[error("Selection cursor {cursor:?} ran past the end of {len} line items")]
    ExhaustedSequence { cursor: Cursor, len: usize },
    #[error("No line item with index {0}")]
    UnknownLineItem(usize),
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for reconciliation operations
pub type ReconcileResult<T> = Result<T, ReconcileError>;
