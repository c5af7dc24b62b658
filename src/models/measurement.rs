//! Measurement model

use serde::{Deserialize, Serialize};

/// A single physical quantity as reported by FMI
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Measurement {
    pub value: f64,
    pub unit: String,
}

impl Measurement {
    #[must_use]
    pub fn new<S: Into<String>>(value: f64, unit: S) -> Self {
        Self {
            value,
            unit: unit.into(),
        }
    }
}
