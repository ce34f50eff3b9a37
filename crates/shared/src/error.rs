use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::FormField;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Missing,
    NotNumeric,
    BelowMinimum(f64),
    AboveMaximum(f64),
}

#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{field}: {}", describe(.kind))]
pub struct ConstraintViolation {
    pub field: FormField,
    pub kind: ViolationKind,
}

impl ConstraintViolation {
    pub fn new(field: FormField, kind: ViolationKind) -> Self {
        Self { field, kind }
    }
}

fn describe(kind: &ViolationKind) -> String {
    match kind {
        ViolationKind::Missing => "is required".to_string(),
        ViolationKind::NotNumeric => "must be a number".to_string(),
        ViolationKind::BelowMinimum(min) => format!("must be at least {min}"),
        ViolationKind::AboveMaximum(max) => format!("must be at most {max}"),
    }
}
