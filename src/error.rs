use thiserror::Error;

/// Failures callers are expected to handle; anything else travels as a plain
/// `anyhow::Error`.
#[derive(Debug, Error)]
pub enum BlogError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
}

impl BlogError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}

/// Rejects values longer than `max` characters (not bytes).
pub fn check_length(field: &'static str, value: &str, max: usize) -> Result<(), BlogError> {
    let len = value.chars().count();
    if len > max {
        return Err(BlogError::validation(
            field,
            format!("must be at most {} characters (got {})", max, len),
        ));
    }
    Ok(())
}

/// Rejects empty or whitespace-only values, then applies `check_length`.
pub fn check_required(field: &'static str, value: &str, max: usize) -> Result<(), BlogError> {
    if value.trim().is_empty() {
        return Err(BlogError::validation(field, "is required"));
    }
    check_length(field, value, max)
}
