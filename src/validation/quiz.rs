use crate::error::{AppError, Result};
use crate::models::question::Choice;

/// Parses an option letter, accepting lower case and surrounding whitespace.
pub fn parse_choice(raw: &str) -> Result<Choice> {
    Choice::parse(raw).ok_or_else(|| {
        AppError::InvalidInput(format!(
            "Invalid option '{}'. Valid options are: A, B, C, D",
            raw.trim()
        ))
    })
}

/// Trims and validates a student display name.
pub fn normalize_student(raw: &str) -> Result<String> {
    let name = raw.trim();

    if name.is_empty() {
        return Err(AppError::InvalidInput(
            "Missing student name".to_string(),
        ));
    }

    if name.len() > 255 {
        return Err(AppError::InvalidInput(
            "Student name must be at most 255 characters".to_string(),
        ));
    }

    Ok(name.to_string())
}

/// Validates a question-set id.
pub fn validate_set_id(raw: &str) -> Result<()> {
    if raw.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Missing question set id".to_string(),
        ));
    }
    Ok(())
}
