//! Validation utilities

use bigdecimal::BigDecimal;

use crate::types::*;

/// Validate that an exchange rate is strictly positive
pub fn validate_exchange_rate(rate: &BigDecimal) -> ReconcileResult<()> {
    if *rate <= BigDecimal::from(0) {
        Err(ReconcileError::InvalidInput(format!(
            "Exchange rate must be positive, got {}",
            rate
        )))
    } else {
        Ok(())
    }
}

/// Validate that every weight lies in `[0, 100]` and that they total exactly 100
pub fn validate_weights<'a>(weights: impl Iterator<Item = &'a BigDecimal>) -> ReconcileResult<()> {
    let zero = BigDecimal::from(0);
    let hundred = BigDecimal::from(100);

    let mut total = BigDecimal::from(0);
    for weight in weights {
        if *weight < zero || *weight > hundred {
            return Err(ReconcileError::InvalidInput(format!(
                "Weight {} is outside 0..=100",
                weight
            )));
        }
        total += weight;
    }

    if total != hundred {
        return Err(ReconcileError::WeightSumInvalid { total });
    }
    Ok(())
}

/// Validate a reconciliation step size.
///
/// Must be positive, no coarser than one display unit and no finer than `1e-6`.
pub fn validate_accuracy(accuracy: &BigDecimal, display_unit: &BigDecimal) -> ReconcileResult<()> {
    if *accuracy <= BigDecimal::from(0) {
        return Err(ReconcileError::Config(format!(
            "accuracy must be positive, got {}",
            accuracy
        )));
    }
    if accuracy > display_unit {
        return Err(ReconcileError::Config(format!(
            "accuracy {} is coarser than the display unit {}",
            accuracy, display_unit
        )));
    }
    if *accuracy < BigDecimal::new(1.into(), 6) {
        return Err(ReconcileError::Config(format!(
            "accuracy {} is finer than 0.000001",
            accuracy
        )));
    }
    Ok(())
}

/// Validate that a model name is usable as a row label
pub fn validate_model_name(model: &str) -> ReconcileResult<()> {
    if model.trim().is_empty() {
        return Err(ReconcileError::InvalidInput(
            "Model name cannot be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    #[test]
    fn test_exchange_rate() {
        assert!(validate_exchange_rate(&dec("7.5")).is_ok());
        assert!(validate_exchange_rate(&dec("0")).is_err());
        assert!(validate_exchange_rate(&dec("-1")).is_err());
    }

    #[test]
    fn test_weights_must_total_hundred() {
        let good = [dec("50"), dec("30"), dec("20")];
        assert!(validate_weights(good.iter()).is_ok());

        let decimal = [dec("33.3"), dec("33.3"), dec("33.4")];
        assert!(validate_weights(decimal.iter()).is_ok());

        let over = [dec("40"), dec("40"), dec("21")];
        match validate_weights(over.iter()) {
            Err(ReconcileError::WeightSumInvalid { total }) => assert_eq!(total, dec("101")),
            other => panic!("unexpected result: {other:?}"),
        }

        let none: [BigDecimal; 0] = [];
        assert!(matches!(
            validate_weights(none.iter()),
            Err(ReconcileError::WeightSumInvalid { .. })
        ));
    }

    #[test]
    fn test_weight_out_of_range() {
        let weights = [dec("120"), dec("-20")];
        assert!(matches!(
            validate_weights(weights.iter()),
            Err(ReconcileError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_accuracy_bounds() {
        let unit = dec("0.01");
        assert!(validate_accuracy(&dec("0.01"), &unit).is_ok());
        assert!(validate_accuracy(&dec("0.001"), &unit).is_ok());
        assert!(validate_accuracy(&dec("0"), &unit).is_err());
        assert!(validate_accuracy(&dec("0.1"), &unit).is_err());
        assert!(validate_accuracy(&dec("0.0000001"), &unit).is_err());
    }

    #[test]
    fn test_model_name() {
        assert!(validate_model_name("A-100").is_ok());
        assert!(validate_model_name("   ").is_err());
    }
}
