//! Per-document pipeline and batch driver
//!
//! load → extract → validate → allocate → reconcile → write back → mark → save.
//! Every failure is scoped to its document; a batch always runs to the end.

use chrono::Utc;
use uuid::Uuid;

use crate::allocation::{Allocation, Targets};
use crate::config::ProcessorConfig;
use crate::reconciliation::{CompletionStatus, ReconcileOutcome, ReconciliationEngine};
use crate::traits::*;
use crate::types::*;
use crate::workbook::{
    apply_frame, apply_markers, read_document, write_results, SheetLayout, WriteOptions,
    WrittenTotals,
};

/// Runs documents of a store through allocation and reconciliation
pub struct DocumentProcessor<S: DocumentStore> {
    store: S,
    engine: ReconciliationEngine,
    layout: SheetLayout,
    write_options: WriteOptions,
    validator: Box<dyn DocumentValidator>,
}

impl<S: DocumentStore> DocumentProcessor<S> {
    /// Create a processor with the default document validator
    pub fn new(store: S, config: &ProcessorConfig) -> ReconcileResult<Self> {
        Self::with_validator(store, config, Box::new(DefaultDocumentValidator))
    }

    /// Create a processor with a custom document validator
    pub fn with_validator(
        store: S,
        config: &ProcessorConfig,
        validator: Box<dyn DocumentValidator>,
    ) -> ReconcileResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            engine: ReconciliationEngine::new(config.engine_settings()?),
            layout: config.sheet_layout()?,
            write_options: config.write_options(),
            validator,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Process one document and save it back.
    ///
    /// An incomplete reconciliation still writes best-effort values and is reported
    /// in the returned status. Errors leave the stored document untouched.
    pub fn process_document(&mut self, id: &DocumentId) -> ReconcileResult<DocumentReport> {
        let span = tracing::info_span!("document", document = %id);
        let _guard = span.enter();

        let mut workbook = self.store.load_workbook(id)?;
        let sheet = workbook.active_sheet_mut().ok_or_else(|| {
            ReconcileError::InvalidInput(format!("Document {} has no worksheet", id))
        })?;

        let document = read_document(id.clone(), sheet, &self.layout)?;
        if let Some(date) = document.date {
            tracing::info!(%date, rows = document.rows.len(), "document read");
        } else {
            tracing::info!(rows = document.rows.len(), "document read");
        }
        self.validator.validate_document(&document)?;

        let mut allocation = Allocation::allocate(&document)?;
        let outcome = if self.write_options.manual {
            tracing::info!("manual mode, reconciliation skipped");
            None
        } else {
            Some(
                self.engine
                    .reconcile(&mut allocation.items, &allocation.targets)?,
            )
        };

        let rows = allocation.items.len();
        let adjustments = outcome
            .as_ref()
            .map(|outcome| outcome.adjustments.clone())
            .unwrap_or_default();
        let totals = write_results(
            sheet,
            &self.layout,
            &allocation.items,
            &allocation.targets,
            &self.write_options,
        );
        apply_markers(sheet, &self.layout, rows, &adjustments);
        apply_frame(sheet, &self.layout, rows);

        self.store.save_workbook(id, &workbook)?;

        let status = match self.discrepancy(outcome.as_ref(), &allocation.targets, &totals) {
            None => {
                tracing::info!(
                    total_local = %totals.local,
                    total_reference = %totals.reference,
                    "document processed"
                );
                DocumentStatus::Completed
            }
            Some(discrepancy) => {
                tracing::error!(
                    expected_local = %discrepancy.expected_local,
                    actual_local = %discrepancy.actual_local,
                    expected_reference = %discrepancy.expected_reference,
                    actual_reference = %discrepancy.actual_reference,
                    "could not reach the required accuracy, best-effort values written"
                );
                DocumentStatus::Incomplete { discrepancy }
            }
        };

        Ok(DocumentReport {
            document: id.clone(),
            status,
            date: document.date,
            rows,
            iterations: outcome.as_ref().map_or(0, |outcome| outcome.iterations),
            nudges: outcome.as_ref().map_or(0, |outcome| outcome.nudges),
            total_local: Some(totals.local),
            total_reference: Some(totals.reference),
            adjusted_rows: adjustments,
            processed_at: Utc::now().naive_utc(),
        })
    }

    /// Process every document of the store in listing order
    pub fn process_batch(&mut self) -> ReconcileResult<BatchReport> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("batch", %run_id);
        let _guard = span.enter();

        let started_at = Utc::now().naive_utc();
        let ids = self.store.list_documents()?;
        tracing::info!(documents = ids.len(), "batch started");

        let mut documents = Vec::with_capacity(ids.len());
        for id in ids {
            let report = match self.process_document(&id) {
                Ok(report) => report,
                Err(error) => {
                    tracing::error!(document = %id, %error, "document skipped");
                    DocumentReport::failed(id, &error)
                }
            };
            documents.push(report);
        }

        let report = BatchReport {
            run_id,
            started_at,
            finished_at: Utc::now().naive_utc(),
            documents,
        };
        tracing::info!(
            completed = report.completed(),
            incomplete = report.incomplete(),
            failed = report.failed(),
            "batch finished"
        );
        Ok(report)
    }

    /// Difference between the written totals and the targets, if any
    fn discrepancy(
        &self,
        outcome: Option<&ReconcileOutcome>,
        targets: &Targets,
        totals: &WrittenTotals,
    ) -> Option<Discrepancy> {
        if let Some(ReconcileOutcome {
            status: CompletionStatus::IncompleteWithBestEffort { discrepancy },
            ..
        }) = outcome
        {
            return Some(discrepancy.clone());
        }

        let rounding = &self.write_options.rounding;
        let local_matches = rounding.same(&totals.local, &targets.target_sum_local);
        let reference_matches = rounding.same(&totals.reference, &targets.target_sum_reference);
        if local_matches && reference_matches {
            return None;
        }
        Some(Discrepancy {
            expected_local: rounding.round(&targets.target_sum_local),
            actual_local: rounding.round(&totals.local),
            expected_reference: rounding.round(&targets.target_sum_reference),
            actual_reference: rounding.round(&totals.reference),
        })
    }
}
