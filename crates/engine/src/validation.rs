//! Field-level validation errors.
//!
//! Input problems are collected per field so that a caller gets every
//! message for a request at once instead of failing on the first one.

use std::{collections::BTreeMap, fmt};

use serde::Serialize;

/// Key used for problems that do not belong to a single field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

pub(crate) const REQUIRED: &str = "This field is required.";
pub(crate) const BLANK: &str = "This field may not be blank.";

/// Ordered map of field name to the messages raised for it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an error set holding a single message.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for `field`, empty if none.
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

pub(crate) fn invalid_choice(value: &str) -> String {
    format!("\"{value}\" is not a valid choice.")
}

/// Trims a required text field, recording `required`/`blank`/length errors.
pub(crate) fn required_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
    max_chars: usize,
) -> Option<String> {
    let Some(value) = value else {
        errors.add(field, REQUIRED);
        return None;
    };
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, BLANK);
        return None;
    }
    if trimmed.chars().count() > max_chars {
        errors.add(
            field,
            format!("Ensure this field has no more than {max_chars} characters."),
        );
        return None;
    }
    Some(trimmed.to_string())
}
