//! Processor configuration: JSON file with defaults, overridden from the command line

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::money::{decimal_from_f64, Rounding};
use crate::reconciliation::{EngineSettings, DEFAULT_MAX_ITERATIONS};
use crate::types::*;
use crate::utils::validation::validate_accuracy;
use crate::workbook::{LayoutConfig, SheetLayout, WriteOptions};

/// Settings of one processing run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Nudge size in local currency
    pub accuracy: f64,
    /// Bound on item selections per document
    pub max_iterations: usize,
    /// Extra digits rounded away one at a time before the 2-digit rounding
    pub rounding_guard_digits: i64,
    /// Skip reconciliation and keep full precision in written values
    pub manual: bool,
    /// Write summary and reference cells as formulas
    pub cross_check_formulas: bool,
    pub layout: LayoutConfig,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            accuracy: 0.01,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            rounding_guard_digits: 0,
            manual: false,
            cross_check_formulas: false,
            layout: LayoutConfig::default(),
        }
    }
}

impl ProcessorConfig {
    /// Load a JSON configuration file; missing keys take their defaults
    pub fn load(path: &Path) -> ReconcileResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            ReconcileError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
            .map_err(|e| ReconcileError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_json(text: &str) -> ReconcileResult<Self> {
        serde_json::from_str(text).map_err(|e| ReconcileError::Config(e.to_string()))
    }

    pub fn rounding(&self) -> Rounding {
        Rounding::money().with_guard_digits(self.rounding_guard_digits)
    }

    /// Check every setting, reporting the first problem
    pub fn validate(&self) -> ReconcileResult<()> {
        self.engine_settings()?;
        self.sheet_layout()?;
        if self.max_iterations == 0 {
            return Err(ReconcileError::Config(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if !(0..=6).contains(&self.rounding_guard_digits) {
            return Err(ReconcileError::Config(format!(
                "rounding_guard_digits must be within 0..=6, got {}",
                self.rounding_guard_digits
            )));
        }
        Ok(())
    }

    pub fn engine_settings(&self) -> ReconcileResult<EngineSettings> {
        let accuracy = decimal_from_f64(self.accuracy).ok_or_else(|| {
            ReconcileError::Config(format!("accuracy {} is not a finite number", self.accuracy))
        })?;
        let rounding = self.rounding();
        validate_accuracy(&accuracy, &rounding.unit())?;

        Ok(EngineSettings {
            accuracy,
            max_iterations: self.max_iterations,
            rounding,
        })
    }

    pub fn sheet_layout(&self) -> ReconcileResult<SheetLayout> {
        SheetLayout::try_from(&self.layout)
    }

    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            manual: self.manual,
            cross_check_formulas: self.cross_check_formulas,
            rounding: self.rounding(),
        }
    }
}
