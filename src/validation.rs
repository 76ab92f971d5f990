//! Field-level input constraints shared by the request payloads.
//!
//! Payload structs derive `validator::Validate`; this module holds the custom
//! rules and flattens `ValidationErrors` into the list of human-readable messages
//! returned to clients.

use std::borrow::Cow;
use validator::{Validate, ValidationError, ValidationErrors};

pub const TITLE_MAX_CHARS: usize = 200;
pub const TITLE_REQUIRED: &str = "Title is required";
pub const TITLE_TOO_LONG: &str = "Title must be less than 200 characters";

fn error_with_message(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Title must be non-empty and at most 200 characters.
///
/// Only one rule can fire for a given title: an empty title has length zero.
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.is_empty() {
        return Err(error_with_message("required", TITLE_REQUIRED));
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(error_with_message("length", TITLE_TOO_LONG));
    }
    Ok(())
}

/// Runs every constraint on a task payload and returns all violations at once.
/// An empty vector means the payload is valid.
pub fn validate_task_input<T: Validate>(input: &T) -> Vec<String> {
    match input.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => collect_messages(&errors),
    }
}

/// Flattens `ValidationErrors` into messages, sorted by field name so responses
/// are stable. Errors without an explicit message fall back to `"<field> is invalid"`.
/// Repeated messages are reported once.
pub fn collect_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);

    let mut messages: Vec<String> = fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect();
    messages.dedup();
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskInput, TaskUpdate};
    use pretty_assertions::assert_eq;

    fn create_input(title: Option<&str>) -> TaskInput {
        TaskInput {
            title: title.map(str::to_string),
            description: None,
            completed: None,
        }
    }

    #[test]
    fn test_valid_title_passes() {
        assert!(validate_task_input(&create_input(Some("buy milk"))).is_empty());
        let exact = "x".repeat(TITLE_MAX_CHARS);
        assert!(validate_task_input(&create_input(Some(&exact))).is_empty());
    }

    #[test]
    fn test_missing_title_is_required() {
        assert_eq!(
            validate_task_input(&create_input(None)),
            vec![TITLE_REQUIRED.to_string()]
        );
    }

    #[test]
    fn test_empty_title_is_required() {
        assert_eq!(
            validate_task_input(&create_input(Some(""))),
            vec![TITLE_REQUIRED.to_string()]
        );
    }

    #[test]
    fn test_long_title_reports_only_length() {
        let long = "x".repeat(TITLE_MAX_CHARS + 1);
        assert_eq!(
            validate_task_input(&create_input(Some(&long))),
            vec![TITLE_TOO_LONG.to_string()]
        );
    }

    #[test]
    fn test_title_length_counts_characters_not_bytes() {
        let wide = "é".repeat(TITLE_MAX_CHARS);
        assert!(validate_title(&wide).is_ok());
    }

    #[test]
    fn test_update_without_title_is_valid() {
        let update = TaskUpdate {
            title: None,
            description: Some("new".into()),
            completed: Some(true),
        };
        assert!(validate_task_input(&update).is_empty());
    }

    #[test]
    fn test_update_with_empty_title_is_rejected() {
        let update = TaskUpdate {
            title: Some(String::new()),
            description: None,
            completed: None,
        };
        assert_eq!(
            validate_task_input(&update),
            vec![TITLE_REQUIRED.to_string()]
        );
    }
}
