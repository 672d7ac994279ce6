//! Weighted allocation of the residual between a declared total and the per-row prices

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::types::*;
use crate::utils::validation::{validate_exchange_rate, validate_weights};

/// Target totals for one document, in both currencies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Targets {
    /// Local units per reference unit; strictly positive
    pub exchange_rate: BigDecimal,
    pub target_sum_local: BigDecimal,
    /// `target_sum_local / exchange_rate`, unrounded
    pub target_sum_reference: BigDecimal,
}

impl Targets {
    /// Derive the reference target from the local target and the exchange rate
    pub fn new(exchange_rate: BigDecimal, target_sum_local: BigDecimal) -> ReconcileResult<Self> {
        validate_exchange_rate(&exchange_rate)?;
        let target_sum_reference = &target_sum_local / &exchange_rate;
        Ok(Self {
            exchange_rate,
            target_sum_local,
            target_sum_reference,
        })
    }

    /// Reference value of a local amount
    pub fn to_reference(&self, value_local: &BigDecimal) -> BigDecimal {
        value_local / &self.exchange_rate
    }
}

/// Starting point handed to the reconciliation engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub targets: Targets,
    /// `target_sum_reference - Σ unit_price_reference`, from the original prices
    pub residual_reference: BigDecimal,
    pub items: Vec<LineItem>,
}

impl Allocation {
    /// Spread the residual over the rows of `document` in proportion to their weights.
    ///
    /// Each row gets `price_local = unit_price_reference * rate` plus a share of
    /// `residual * rate * weight / 100`; the reference value is the adjusted local
    /// value divided back by the rate.
    pub fn allocate(document: &PriceDocument) -> ReconcileResult<Self> {
        if document.rows.is_empty() {
            return Err(ReconcileError::InvalidInput(format!(
                "document {} has no data rows",
                document.id
            )));
        }
        validate_weights(document.rows.iter().map(|row| &row.weight))?;

        let targets = Targets::new(
            document.exchange_rate.clone(),
            document.target_sum_local.clone(),
        )?;
        let residual_reference =
            &targets.target_sum_reference - document.total_unit_price_reference();
        let residual_local = &residual_reference * &targets.exchange_rate;
        let hundred = BigDecimal::from(100);

        let items = document
            .rows
            .iter()
            .map(|row| {
                let price_local = &row.unit_price_reference * &targets.exchange_rate;
                let weighted_share_local = &residual_local * &row.weight / &hundred;
                let value_local = &price_local + &weighted_share_local;
                let value_reference = targets.to_reference(&value_local);
                LineItem {
                    index: row.index,
                    model: row.model.clone(),
                    unit_price_reference: row.unit_price_reference.clone(),
                    weight: row.weight.clone(),
                    price_local,
                    weighted_share_local,
                    value_local,
                    value_reference,
                }
            })
            .collect();

        Ok(Self {
            targets,
            residual_reference,
            items,
        })
    }

    /// Σ adjusted local values, unrounded
    pub fn total_local(&self) -> BigDecimal {
        self.items.iter().map(|item| &item.value_local).sum()
    }
}
