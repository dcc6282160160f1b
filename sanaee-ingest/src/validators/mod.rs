//! Validation gate for new worker records

pub mod form_rules;

pub use form_rules::{
    validate, FieldFailure, FieldRule, FormField, ValidationReport, WorkerForm, DEFAULT_RULES,
};
