use warta_core::{DomainError, DomainResult};

pub(crate) const MAX_SHORT_LEN: usize = 255;

/// Trimmed, non-empty, at most `max` characters.
pub(crate) fn required(field: &str, value: &str, max: Option<usize>) -> DomainResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    if let Some(max) = max {
        if value.chars().count() > max {
            return Err(DomainError::validation(format!(
                "{field} must be at most {max} characters"
            )));
        }
    }
    Ok(value.to_string())
}

/// Blank optional text collapses to `None`.
pub(crate) fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}
