//! Decimal money helpers

pub mod rounding;

pub use rounding::*;
