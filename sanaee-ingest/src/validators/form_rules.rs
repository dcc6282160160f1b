//! Declarative field rules for the "add worker" form
//!
//! Each rule pairs a field with a predicate over that field's raw text and
//! a message. The runner visits every rule so all invalid fields are
//! reported in one pass; the first failure in rule order is the focus
//! target.

use once_cell::sync::Lazy;
use regex::Regex;
use sanaee_common::models::strip_phone_separators;
use sanaee_common::Specialty;
use serde::Serialize;
use std::fmt;

/// Local mobile number (`01` + carrier digit + 8 digits) or a generic
/// 7-15 digit number
static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(01[0125][0-9]{8}|[0-9]{7,15})$").expect("phone pattern is valid")
});

/// Raw form input, before any normalization
#[derive(Debug, Clone, Default)]
pub struct WorkerForm {
    pub name: String,
    pub specialty: String,
    pub area: String,
    pub phone: String,
    pub rating: i64,
}

/// Form fields covered by rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    Name,
    Specialty,
    Area,
    Phone,
}

impl FormField {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::Name => "name",
            FormField::Specialty => "specialty",
            FormField::Area => "area",
            FormField::Phone => "phone",
        }
    }

    /// Raw value of this field in `form`
    pub fn value<'a>(&self, form: &'a WorkerForm) -> &'a str {
        match self {
            FormField::Name => &form.name,
            FormField::Specialty => &form.specialty,
            FormField::Area => &form.area,
            FormField::Phone => &form.phone,
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declarative rule
#[derive(Clone, Copy)]
pub struct FieldRule {
    pub field: FormField,
    pub check: fn(&str) -> bool,
    pub message: &'static str,
}

impl fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRule")
            .field("field", &self.field)
            .field("message", &self.message)
            .finish()
    }
}

/// Rules applied to every new worker, in focus order
pub const DEFAULT_RULES: &[FieldRule] = &[
    FieldRule {
        field: FormField::Name,
        check: name_is_valid,
        message: "Name must be at least 3 characters",
    },
    FieldRule {
        field: FormField::Specialty,
        check: specialty_is_valid,
        message: "Please choose a specialty",
    },
    FieldRule {
        field: FormField::Area,
        check: area_is_valid,
        message: "Please enter an area (at least 2 characters)",
    },
    FieldRule {
        field: FormField::Phone,
        check: phone_is_valid,
        message: "Invalid phone number (example: 01012345678)",
    },
];

pub fn name_is_valid(value: &str) -> bool {
    value.trim().chars().count() >= 3
}

pub fn specialty_is_valid(value: &str) -> bool {
    !value.is_empty() && Specialty::parse(value).is_some()
}

pub fn area_is_valid(value: &str) -> bool {
    value.trim().chars().count() >= 2
}

pub fn phone_is_valid(value: &str) -> bool {
    PHONE_PATTERN.is_match(&strip_phone_separators(value))
}

/// A failed rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldFailure {
    pub field: FormField,
    pub message: String,
}

/// Outcome of running a rule set over a form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    failures: Vec<FieldFailure>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    /// Every failure, in rule order
    pub fn failures(&self) -> &[FieldFailure] {
        &self.failures
    }

    /// Field that should receive focus
    pub fn first_failure(&self) -> Option<&FieldFailure> {
        self.failures.first()
    }

    pub fn message_for(&self, field: FormField) -> Option<&str> {
        self.failures
            .iter()
            .find(|f| f.field == field)
            .map(|f| f.message.as_str())
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self
            .failures
            .iter()
            .map(|failure| format!("{}: {}", failure.field, failure.message))
            .collect();
        f.write_str(&messages.join("; "))
    }
}

/// Run every rule in `rules` against `form`
pub fn validate(rules: &[FieldRule], form: &WorkerForm) -> ValidationReport {
    let failures = rules
        .iter()
        .filter(|rule| !(rule.check)(rule.field.value(form)))
        .map(|rule| FieldFailure {
            field: rule.field,
            message: rule.message.to_string(),
        })
        .collect();

    ValidationReport { failures }
}
