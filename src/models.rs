pub mod auth;
pub mod client;
pub mod invoice;
pub mod project;

use validator::ValidationError;

// ---
// Helpers compartilhados pelos payloads
// ---

/// `length(min = 1)` aceita "   ", por isso a validação própria.
pub(crate) fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("This field is required.".into());
        return Err(err);
    }
    Ok(())
}

/// Formulários mandam "" para campos opcionais vazios; no banco isso é NULL.
pub(crate) fn blank_to_none(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
    })
}
