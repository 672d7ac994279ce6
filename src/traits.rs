//! Traits for storage abstraction and extensibility

use bigdecimal::BigDecimal;

use crate::types::*;
use crate::utils::validation::{validate_exchange_rate, validate_model_name, validate_weights};
use crate::workbook::Workbook;

/// Storage abstraction for price documents
///
/// This trait allows the processor to work with any backend holding workbooks
/// (a directory of xlsx files, an in-memory map, ...) by implementing these methods.
pub trait DocumentStore: Send + Sync {
    /// List the documents to process, in processing order
    fn list_documents(&self) -> ReconcileResult<Vec<DocumentId>>;

    /// Load a document's workbook
    fn load_workbook(&self, id: &DocumentId) -> ReconcileResult<Workbook>;

    /// Persist a document's workbook, replacing the stored one
    fn save_workbook(&mut self, id: &DocumentId, workbook: &Workbook) -> ReconcileResult<()>;
}

/// Trait for implementing custom document validation rules
pub trait DocumentValidator: Send + Sync {
    /// Validate a document after extraction, before allocation
    fn validate_document(&self, document: &PriceDocument) -> ReconcileResult<()>;
}

/// Default document validator: positive rate, named rows, weights totalling 100
pub struct DefaultDocumentValidator;

impl DocumentValidator for DefaultDocumentValidator {
    fn validate_document(&self, document: &PriceDocument) -> ReconcileResult<()> {
        validate_exchange_rate(&document.exchange_rate)?;

        if document.rows.is_empty() {
            return Err(ReconcileError::InvalidInput(format!(
                "Document {} has no data rows",
                document.id
            )));
        }
        for row in &document.rows {
            validate_model_name(&row.model)?;
        }

        validate_weights(document.rows.iter().map(|row| &row.weight))
    }
}

/// Stricter validator that also rejects negative unit prices and a non-positive target
pub struct StrictDocumentValidator;

impl DocumentValidator for StrictDocumentValidator {
    fn validate_document(&self, document: &PriceDocument) -> ReconcileResult<()> {
        DefaultDocumentValidator.validate_document(document)?;

        let zero = BigDecimal::from(0);
        if document.target_sum_local <= zero {
            return Err(ReconcileError::InvalidInput(format!(
                "Target sum of {} must be positive, got {}",
                document.id, document.target_sum_local
            )));
        }
        if let Some(row) = document
            .rows
            .iter()
            .find(|row| row.unit_price_reference < zero)
        {
            return Err(ReconcileError::InvalidInput(format!(
                "Row {} ({}) of {} has a negative unit price",
                row.index + 1,
                row.model,
                document.id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn document(weights: &[&str], prices: &[&str], target: &str) -> PriceDocument {
        PriceDocument {
            id: DocumentId::new("doc.xlsx"),
            date: None,
            exchange_rate: BigDecimal::from_str("7.5").unwrap(),
            target_sum_local: BigDecimal::from_str(target).unwrap(),
            rows: weights
                .iter()
                .zip(prices)
                .enumerate()
                .map(|(index, (weight, price))| SourceRow {
                    index,
                    model: format!("M{index}"),
                    unit_price_reference: BigDecimal::from_str(price).unwrap(),
                    weight: BigDecimal::from_str(weight).unwrap(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_default_validator() {
        let validator = DefaultDocumentValidator;
        assert!(validator
            .validate_document(&document(&["60", "40"], &["1", "2"], "100"))
            .is_ok());
        assert!(matches!(
            validator.validate_document(&document(&["60", "41"], &["1", "2"], "100")),
            Err(ReconcileError::WeightSumInvalid { .. })
        ));
        assert!(matches!(
            validator.validate_document(&document(&[], &[], "100")),
            Err(ReconcileError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_strict_validator() {
        let validator = StrictDocumentValidator;
        assert!(validator
            .validate_document(&document(&["60", "40"], &["1", "2"], "100"))
            .is_ok());
        assert!(validator
            .validate_document(&document(&["60", "40"], &["-1", "2"], "100"))
            .is_err());
        assert!(validator
            .validate_document(&document(&["60", "40"], &["1", "2"], "0"))
            .is_err());
    }
}
