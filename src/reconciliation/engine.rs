//! Iterative correction of rounding error across line items in two currencies

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::allocation::Targets;
use crate::money::Rounding;
use crate::reconciliation::sequencer::{Cursor, SelectionSequencer};
use crate::types::*;

/// Default bound on item selections per reconciliation pass
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

/// Tunables of the reconciliation engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Size of one nudge in local currency
    pub accuracy: BigDecimal,
    /// Maximum number of item selections before giving up
    pub max_iterations: usize,
    pub rounding: Rounding,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            accuracy: BigDecimal::new(1.into(), 2),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            rounding: Rounding::money(),
        }
    }
}

/// How a line item's value came to change during reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    /// Nudged so that the reference-currency total matches
    CrossCurrencyNudge,
    /// Absorbed leftover local difference without changing its reference value
    Leftover,
    /// Absorbed leftover local difference and its reference value moved with it
    ForcedLeftover,
}

/// Net change applied to one line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowAdjustment {
    pub index: usize,
    pub kind: AdjustmentKind,
    pub original_local: BigDecimal,
    pub final_local: BigDecimal,
}

/// Typed completion status of one pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompletionStatus {
    Converged,
    IncompleteWithBestEffort { discrepancy: Discrepancy },
}

/// Result of one reconciliation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    pub status: CompletionStatus,
    /// Σ rounded local values after the pass
    pub total_local: BigDecimal,
    /// Σ rounded reference values after the pass
    pub total_reference: BigDecimal,
    /// Item selections made
    pub iterations: usize,
    /// Individual value changes committed
    pub nudges: usize,
    /// One entry per changed line item, ordered by index
    pub adjustments: Vec<RowAdjustment>,
}

impl ReconcileOutcome {
    pub fn is_converged(&self) -> bool {
        matches!(self.status, CompletionStatus::Converged)
    }

    /// Turn an incomplete pass into a [`ReconcileError::ReconciliationIncomplete`]
    pub fn into_result(self) -> ReconcileResult<Self> {
        match self.status {
            CompletionStatus::Converged => Ok(self),
            CompletionStatus::IncompleteWithBestEffort { discrepancy } => Err(
                ReconcileError::ReconciliationIncomplete(Box::new(discrepancy)),
            ),
        }
    }
}

/// Pushes per-row rounding error onto selected line items until the rounded totals of
/// both currencies equal their rounded targets.
///
/// Each round ranks the items by the fraction digit-sum of their reference values. The
/// reference total is fixed first, one reference unit per selected item, walking in from
/// the low or high end depending on the sign of the reference difference. Whatever local
/// difference is left is then absorbed from the opposite end by items whose reference
/// value can take it without moving.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationEngine {
    settings: EngineSettings,
}

impl ReconciliationEngine {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Reconcile `items` in place against `targets`.
    ///
    /// Items must be indexed `0..items.len()` in order. Errors leave `items` untouched.
    pub fn reconcile(
        &self,
        items: &mut [LineItem],
        targets: &Targets,
    ) -> ReconcileResult<ReconcileOutcome> {
        if items.is_empty() {
            return Err(ReconcileError::InvalidInput(
                "nothing to reconcile: no line items".to_string(),
            ));
        }
        if let Some(item) = items
            .iter()
            .enumerate()
            .find_map(|(position, item)| (item.index != position).then_some(item))
        {
            return Err(ReconcileError::UnknownLineItem(item.index));
        }
        if self.settings.accuracy <= BigDecimal::from(0) {
            return Err(ReconcileError::InvalidInput(format!(
                "accuracy must be positive, got {}",
                self.settings.accuracy
            )));
        }

        let values: Vec<BigDecimal> = items.iter().map(|item| item.value_local.clone()).collect();
        let mut pass = Pass::new(&self.settings, targets, values);
        let status = pass.run()?;

        for (item, value) in items.iter_mut().zip(&pass.values) {
            if item.value_local != *value {
                item.set_value_local(value.clone(), &targets.exchange_rate);
            }
        }

        Ok(ReconcileOutcome {
            status,
            total_local: pass.balance.sum_local.clone(),
            total_reference: pass.balance.sum_reference.clone(),
            iterations: pass.iterations,
            nudges: pass.nudges,
            adjustments: pass.adjustments.into_values().collect(),
        })
    }
}

/// Displayed totals against rounded targets
#[derive(Debug, Clone)]
struct Balance {
    target_local: BigDecimal,
    target_reference: BigDecimal,
    sum_local: BigDecimal,
    sum_reference: BigDecimal,
}

impl Balance {
    fn diff_local(&self) -> BigDecimal {
        &self.target_local - &self.sum_local
    }

    fn diff_reference(&self) -> BigDecimal {
        &self.target_reference - &self.sum_reference
    }

    fn apply(&mut self, change: &Change) {
        self.sum_local += &change.local;
        self.sum_reference += &change.reference;
    }

    fn discrepancy(&self) -> Discrepancy {
        Discrepancy {
            expected_local: self.target_local.clone(),
            actual_local: self.sum_local.clone(),
            expected_reference: self.target_reference.clone(),
            actual_reference: self.sum_reference.clone(),
        }
    }
}

/// Effect of a proposed value on the displayed totals
struct Change {
    value: BigDecimal,
    local: BigDecimal,
    reference: BigDecimal,
}

enum RoundEnd {
    Settled,
    OutOfIterations,
    /// No remaining item could move the displayed reference total by one unit
    Stalled,
}

/// State of one reconciliation pass over one document
struct Pass<'a> {
    settings: &'a EngineSettings,
    exchange_rate: &'a BigDecimal,
    /// Local values by original index; the sequencer owns them during a round
    values: Vec<BigDecimal>,
    balance: Balance,
    iterations: usize,
    nudges: usize,
    adjustments: BTreeMap<usize, RowAdjustment>,
}

impl<'a> Pass<'a> {
    fn new(settings: &'a EngineSettings, targets: &'a Targets, values: Vec<BigDecimal>) -> Self {
        let rounding = &settings.rounding;
        let mut pass = Self {
            settings,
            exchange_rate: &targets.exchange_rate,
            values,
            balance: Balance {
                target_local: rounding.round(&targets.target_sum_local),
                target_reference: rounding.round(&targets.target_sum_reference),
                sum_local: BigDecimal::from(0),
                sum_reference: BigDecimal::from(0),
            },
            iterations: 0,
            nudges: 0,
            adjustments: BTreeMap::new(),
        };
        pass.balance.sum_local = pass.values.iter().map(|value| pass.shown_local(value)).sum();
        pass.balance.sum_reference = pass
            .values
            .iter()
            .map(|value| pass.shown_reference(value))
            .sum();
        pass
    }

    fn shown_local(&self, value: &BigDecimal) -> BigDecimal {
        self.settings.rounding.round(value)
    }

    fn shown_reference(&self, value: &BigDecimal) -> BigDecimal {
        self.settings.rounding.round(&(value / self.exchange_rate))
    }

    fn converged(&self) -> bool {
        self.balance.diff_local() == BigDecimal::from(0)
            && self.balance.diff_reference() == BigDecimal::from(0)
    }

    fn run(&mut self) -> ReconcileResult<CompletionStatus> {
        loop {
            if self.converged() {
                tracing::debug!(
                    iterations = self.iterations,
                    nudges = self.nudges,
                    "reconciliation converged"
                );
                return Ok(CompletionStatus::Converged);
            }
            if self.iterations >= self.settings.max_iterations {
                return Ok(self.incomplete());
            }

            let ascending = self.balance.diff_local() > BigDecimal::from(0);
            let values = std::mem::take(&mut self.values);
            let mut sequencer =
                SelectionSequencer::by_reference_fraction(values, self.exchange_rate, ascending);
            let round = self.run_round(&mut sequencer);
            self.values = sequencer.into_values();

            match round? {
                RoundEnd::Settled => {}
                RoundEnd::OutOfIterations if self.converged() => {
                    return Ok(CompletionStatus::Converged);
                }
                RoundEnd::OutOfIterations => return Ok(self.incomplete()),
                RoundEnd::Stalled => return Ok(self.stalled()),
            }
        }
    }

    fn incomplete(&self) -> CompletionStatus {
        let discrepancy = self.balance.discrepancy();
        tracing::warn!(
            iterations = self.iterations,
            max_iterations = self.settings.max_iterations,
            %discrepancy,
            "reconciliation stopped at the iteration bound"
        );
        CompletionStatus::IncompleteWithBestEffort { discrepancy }
    }

    fn stalled(&self) -> CompletionStatus {
        let discrepancy = self.balance.discrepancy();
        tracing::warn!(
            iterations = self.iterations,
            accuracy = %self.settings.accuracy,
            exchange_rate = %self.exchange_rate,
            %discrepancy,
            "no line item can take a one-unit reference nudge at this accuracy"
        );
        CompletionStatus::IncompleteWithBestEffort { discrepancy }
    }

    /// Spend one iteration on a selection, or report that the bound was reached
    fn take_iteration(&mut self) -> bool {
        if self.iterations >= self.settings.max_iterations {
            return false;
        }
        self.iterations += 1;
        true
    }

    fn run_round(&mut self, sequencer: &mut SelectionSequencer) -> ReconcileResult<RoundEnd> {
        let zero = BigDecimal::from(0);

        let mut reference_cursor = None;
        let mut last_selected = None;
        while self.balance.diff_reference() != zero {
            let cursor = if self.balance.diff_reference() > zero {
                Cursor::Low
            } else {
                Cursor::High
            };
            if sequencer.remaining(cursor) == 0 {
                return Ok(RoundEnd::Stalled);
            }
            if !self.take_iteration() {
                return Ok(RoundEnd::OutOfIterations);
            }
            let index = sequencer.next_from(cursor)?.index;
            self.absorb_reference_unit(sequencer, index)?;
            reference_cursor = Some(cursor);
            last_selected = Some(index);
        }

        let leftover_cursor = reference_cursor.map_or(Cursor::Low, Cursor::opposite);
        while self.balance.diff_local() != zero {
            if sequencer.remaining(leftover_cursor) == 0 {
                let index = last_selected.ok_or(ReconcileError::ExhaustedSequence {
                    cursor: leftover_cursor,
                    len: sequencer.len(),
                })?;
                self.force_leftover(sequencer, index)?;
                break;
            }
            if !self.take_iteration() {
                return Ok(RoundEnd::OutOfIterations);
            }
            let index = sequencer.next_from(leftover_cursor)?.index;
            last_selected = Some(index);
            if !self.absorb_whole_leftover(sequencer, index)? {
                self.absorb_leftover_steps(sequencer, index)?;
            }
        }

        Ok(RoundEnd::Settled)
    }

    /// What committing `value` for item `index` would do to the displayed totals
    fn propose(
        &self,
        sequencer: &SelectionSequencer,
        index: usize,
        value: BigDecimal,
    ) -> ReconcileResult<Change> {
        let current = sequencer.value_at_index(index)?;
        let local = self.shown_local(&value) - self.shown_local(current);
        let reference = self.shown_reference(&value) - self.shown_reference(current);
        Ok(Change {
            value,
            local,
            reference,
        })
    }

    fn commit(
        &mut self,
        sequencer: &mut SelectionSequencer,
        index: usize,
        change: Change,
        kind: AdjustmentKind,
    ) -> ReconcileResult<()> {
        let original = sequencer.value_at_index(index)?.clone();
        self.balance.apply(&change);
        self.adjustments
            .entry(index)
            .and_modify(|adjustment| {
                adjustment.kind = adjustment.kind.max(kind);
                adjustment.final_local = change.value.clone();
            })
            .or_insert_with(|| RowAdjustment {
                index,
                kind,
                original_local: original,
                final_local: change.value.clone(),
            });
        sequencer.set_value_at_index(index, change.value)?;
        self.nudges += 1;
        Ok(())
    }

    fn step_towards(&self, difference: &BigDecimal) -> BigDecimal {
        if *difference > BigDecimal::from(0) {
            self.settings.accuracy.clone()
        } else {
            -self.settings.accuracy.clone()
        }
    }

    /// Nudge one item until its displayed reference value moves one unit towards the
    /// reference target. A step whose reference move would not shrink the reference
    /// difference is never committed.
    fn absorb_reference_unit(
        &mut self,
        sequencer: &mut SelectionSequencer,
        index: usize,
    ) -> ReconcileResult<()> {
        let zero = BigDecimal::from(0);
        let step = self.step_towards(&self.balance.diff_reference());
        loop {
            let proposed = sequencer.value_at_index(index)? + &step;
            let change = self.propose(sequencer, index, proposed)?;
            let moved = change.reference != zero;
            if moved {
                let before = self.balance.diff_reference().abs();
                let after = (self.balance.diff_reference() - &change.reference).abs();
                if after >= before {
                    tracing::debug!(index, "reference nudge would overshoot");
                    return Ok(());
                }
            }
            self.commit(sequencer, index, change, AdjustmentKind::CrossCurrencyNudge)?;
            if moved {
                return Ok(());
            }
        }
    }

    /// Put the whole local difference on one item if its displayed reference value
    /// stays where it is
    fn absorb_whole_leftover(
        &mut self,
        sequencer: &mut SelectionSequencer,
        index: usize,
    ) -> ReconcileResult<bool> {
        let proposed = sequencer.value_at_index(index)? + self.balance.diff_local();
        let change = self.propose(sequencer, index, proposed)?;
        if change.reference != BigDecimal::from(0) {
            return Ok(false);
        }
        self.commit(sequencer, index, change, AdjustmentKind::Leftover)?;
        Ok(true)
    }

    /// Nudge one item towards the local target for as long as its displayed reference
    /// value holds and the local difference does not grow
    fn absorb_leftover_steps(
        &mut self,
        sequencer: &mut SelectionSequencer,
        index: usize,
    ) -> ReconcileResult<()> {
        let zero = BigDecimal::from(0);
        let step = self.step_towards(&self.balance.diff_local());
        while self.balance.diff_local() != zero {
            let proposed = sequencer.value_at_index(index)? + &step;
            let change = self.propose(sequencer, index, proposed)?;
            let before = self.balance.diff_local().abs();
            let after = (self.balance.diff_local() - &change.local).abs();
            if change.reference != zero || after > before {
                break;
            }
            self.commit(sequencer, index, change, AdjustmentKind::Leftover)?;
        }
        Ok(())
    }

    /// Put the remaining local difference on `index` even though its reference value moves
    fn force_leftover(
        &mut self,
        sequencer: &mut SelectionSequencer,
        index: usize,
    ) -> ReconcileResult<()> {
        let proposed = sequencer.value_at_index(index)? + self.balance.diff_local();
        let change = self.propose(sequencer, index, proposed)?;
        tracing::warn!(
            index,
            leftover = %self.balance.diff_local(),
            reference_shift = %change.reference,
            "no item could absorb the leftover without moving its reference value"
        );
        self.commit(sequencer, index, change, AdjustmentKind::ForcedLeftover)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::Allocation;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn dec(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    fn allocate(
        prices: &[BigDecimal],
        weights: &[BigDecimal],
        rate: &BigDecimal,
        target: &BigDecimal,
    ) -> Allocation {
        let document = PriceDocument {
            id: DocumentId::new("test"),
            date: None,
            exchange_rate: rate.clone(),
            target_sum_local: target.clone(),
            rows: prices
                .iter()
                .zip(weights)
                .enumerate()
                .map(|(index, (price, weight))| SourceRow {
                    index,
                    model: format!("M{index}"),
                    unit_price_reference: price.clone(),
                    weight: weight.clone(),
                })
                .collect(),
        };
        Allocation::allocate(&document).unwrap()
    }

    fn decs(values: &[&str]) -> Vec<BigDecimal> {
        values.iter().map(|value| dec(value)).collect()
    }

    fn shown_totals(items: &[LineItem]) -> (BigDecimal, BigDecimal) {
        let rounding = Rounding::money();
        let local = items.iter().map(|item| rounding.round(&item.value_local)).sum();
        let reference = items
            .iter()
            .map(|item| rounding.round(&item.value_reference))
            .sum();
        (local, reference)
    }

    fn item(index: usize, value_local: &str, rate: &str) -> LineItem {
        let value_local = dec(value_local);
        LineItem {
            index,
            model: format!("M{index}"),
            unit_price_reference: BigDecimal::from(0),
            weight: BigDecimal::from(0),
            price_local: BigDecimal::from(0),
            weighted_share_local: BigDecimal::from(0),
            value_reference: &value_local / dec(rate),
            value_local,
        }
    }

    #[test]
    fn test_three_item_scenario_reconciles_both_currencies() {
        let mut allocation = allocate(
            &decs(&["10.00", "20.00", "15.00"]),
            &decs(&["50", "30", "20"]),
            &dec("7.5"),
            &dec("350.00"),
        );
        let engine = ReconciliationEngine::default();
        let outcome = engine
            .reconcile(&mut allocation.items, &allocation.targets)
            .unwrap();

        assert!(outcome.is_converged());
        assert_eq!(outcome.total_local, dec("350.00"));
        assert_eq!(outcome.total_reference, dec("46.67"));

        let (local, reference) = shown_totals(&allocation.items);
        assert_eq!(local, dec("350.00"));
        assert_eq!(reference, dec("46.67"));

        // the first-ranked row takes the reference cent, the last-ranked one the local leftover
        let rounding = Rounding::money();
        let shown: Vec<_> = allocation
            .items
            .iter()
            .map(|item| rounding.round(&item.value_local))
            .collect();
        assert_eq!(shown, decs(&["81.27", "153.73", "115.00"]));

        let kinds: Vec<_> = outcome
            .adjustments
            .iter()
            .map(|adjustment| (adjustment.index, adjustment.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (0, AdjustmentKind::CrossCurrencyNudge),
                (1, AdjustmentKind::Leftover)
            ]
        );
        assert_eq!(outcome.iterations, 2);
        assert_eq!(outcome.nudges, 3);
    }

    #[test]
    fn test_already_balanced_input_is_left_alone() {
        let mut items = vec![item(0, "15", "2"), item(1, "25", "2")];
        let targets = Targets::new(dec("2"), dec("40")).unwrap();
        let before = items.clone();

        let outcome = ReconciliationEngine::default()
            .reconcile(&mut items, &targets)
            .unwrap();

        assert!(outcome.is_converged());
        assert_eq!(outcome.nudges, 0);
        assert_eq!(outcome.iterations, 0);
        assert!(outcome.adjustments.is_empty());
        assert_eq!(items, before);
    }

    #[test]
    fn test_sub_unit_difference_needs_no_nudge() {
        let mut items = vec![item(0, "15", "2"), item(1, "25", "2")];
        let targets = Targets::new(dec("2"), dec("40.004")).unwrap();

        let outcome = ReconciliationEngine::default()
            .reconcile(&mut items, &targets)
            .unwrap();

        assert!(outcome.is_converged());
        assert_eq!(outcome.nudges, 0);
    }

    #[test]
    fn test_local_only_difference_goes_to_one_item() {
        // the reference target stays at 10.00, so 0.01 local fits inside one item
        let mut items = vec![item(0, "20", "4"), item(1, "20", "4")];
        let targets = Targets::new(dec("4"), dec("40.01")).unwrap();

        let outcome = ReconciliationEngine::default()
            .reconcile(&mut items, &targets)
            .unwrap();

        assert!(outcome.is_converged());
        assert_eq!(outcome.nudges, 1);
        assert_eq!(outcome.adjustments.len(), 1);
        assert_eq!(outcome.adjustments[0].kind, AdjustmentKind::Leftover);
        let (local, reference) = shown_totals(&items);
        assert_eq!(outcome.adjustments[0].index, 0);
        assert_eq!(local, dec("40.01"));
        assert_eq!(reference, dec("10.00"));
    }

    #[test]
    fn test_reference_and_local_differences_land_on_different_items() {
        let mut items = vec![item(0, "3.00", "3"), item(1, "3.00", "3"), item(2, "3.00", "3")];
        let targets = Targets::new(dec("3"), dec("9.03")).unwrap();

        let outcome = ReconciliationEngine::default()
            .reconcile(&mut items, &targets)
            .unwrap();

        assert!(outcome.is_converged());
        let (local, reference) = shown_totals(&items);
        assert_eq!(local, dec("9.03"));
        assert_eq!(reference, dec("3.01"));
    }

    #[test]
    fn test_iteration_bound_reports_best_effort() {
        let mut allocation = allocate(
            &decs(&["10.00", "20.00", "15.00"]),
            &decs(&["50", "30", "20"]),
            &dec("7.5"),
            &dec("350.00"),
        );
        let engine = ReconciliationEngine::new(EngineSettings {
            max_iterations: 0,
            ..EngineSettings::default()
        });
        let outcome = engine
            .reconcile(&mut allocation.items, &allocation.targets)
            .unwrap();

        match &outcome.status {
            CompletionStatus::IncompleteWithBestEffort { discrepancy } => {
                assert_eq!(discrepancy.expected_local, dec("350.00"));
                assert_eq!(discrepancy.expected_reference, dec("46.67"));
                assert_eq!(discrepancy.actual_reference, dec("46.66"));
            }
            other => panic!("expected incomplete, got {other:?}"),
        }
        assert!(matches!(
            outcome.into_result(),
            Err(ReconcileError::ReconciliationIncomplete(_))
        ));
    }

    #[test]
    fn test_rejects_empty_and_misindexed_items() {
        let targets = Targets::new(dec("2"), dec("40")).unwrap();
        let engine = ReconciliationEngine::default();

        assert!(matches!(
            engine.reconcile(&mut [], &targets),
            Err(ReconcileError::InvalidInput(_))
        ));

        let mut items = vec![item(1, "15", "2")];
        assert!(matches!(
            engine.reconcile(&mut items, &targets),
            Err(ReconcileError::UnknownLineItem(1))
        ));
    }

    #[test]
    fn test_coarse_accuracy_for_a_small_rate_reports_best_effort() {
        // at rate 0.71 one 0.01 nudge can move a displayed reference value by two cents
        let mut allocation = allocate(
            &decs(&["1.10", "17.59", "37.89"]),
            &decs(&["33", "33", "34"]),
            &dec("0.71"),
            &dec("38.97"),
        );
        let outcome = ReconciliationEngine::default()
            .reconcile(&mut allocation.items, &allocation.targets)
            .unwrap();

        assert_eq!(
            outcome.status,
            CompletionStatus::IncompleteWithBestEffort {
                discrepancy: Discrepancy {
                    expected_local: dec("38.97"),
                    actual_local: dec("38.96"),
                    expected_reference: dec("54.89"),
                    actual_reference: dec("54.88"),
                }
            }
        );
        assert_eq!(outcome.iterations, 3);
        assert_eq!(outcome.nudges, 0);
        assert!(outcome.adjustments.is_empty());
    }

    #[test]
    fn test_finer_accuracy_converges() {
        let mut allocation = allocate(
            &decs(&["10.00", "20.00", "15.00"]),
            &decs(&["50", "30", "20"]),
            &dec("7.5"),
            &dec("350.00"),
        );
        let engine = ReconciliationEngine::new(EngineSettings {
            accuracy: dec("0.001"),
            ..EngineSettings::default()
        });
        let outcome = engine
            .reconcile(&mut allocation.items, &allocation.targets)
            .unwrap();

        assert!(outcome.is_converged());
        let (local, reference) = shown_totals(&allocation.items);
        assert_eq!(local, dec("350.00"));
        assert_eq!(reference, dec("46.67"));
    }

    type DocumentCase = (Vec<BigDecimal>, Vec<BigDecimal>, BigDecimal, BigDecimal);

    fn document_strategy() -> impl Strategy<Value = DocumentCase> {
        (3usize..=12)
            .prop_flat_map(|n| {
                (
                    proptest::collection::vec(100i64..200_000, n),
                    proptest::collection::vec(1i64..=8, n),
                    600i64..=4500,
                    95i64..=120,
                )
            })
            .prop_map(|(cents, raw_weights, rate_cents, percent)| {
                let prices: Vec<BigDecimal> = cents
                    .iter()
                    .map(|&c| BigDecimal::new(c.into(), 2))
                    .collect();
                let mut weights: Vec<i64> = raw_weights;
                let assigned: i64 = weights.iter().take(weights.len() - 1).sum();
                let last = weights.len() - 1;
                weights[last] = 100 - assigned;
                let weights = weights.into_iter().map(BigDecimal::from).collect();
                let rate = BigDecimal::new(rate_cents.into(), 2);
                let base: BigDecimal = prices.iter().map(|price| price * &rate).sum();
                let scaled = base * BigDecimal::from(percent) / BigDecimal::from(100);
                let target = Rounding::money().round(&scaled);
                (prices, weights, rate, target)
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn prop_totals_match_unless_reported_incomplete(
            (prices, weights, rate, target) in document_strategy()
        ) {
            let mut allocation = allocate(&prices, &weights, &rate, &target);
            let outcome = ReconciliationEngine::default()
                .reconcile(&mut allocation.items, &allocation.targets)
                .unwrap();

            let (local, reference) = shown_totals(&allocation.items);
            prop_assert_eq!(&local, &outcome.total_local);
            prop_assert_eq!(&reference, &outcome.total_reference);
            if outcome.is_converged() {
                let targets = &allocation.targets;
                let rounding = Rounding::money();
                prop_assert_eq!(local, rounding.round(&targets.target_sum_local));
                prop_assert_eq!(reference, rounding.round(&targets.target_sum_reference));
            }
        }
    }
}
