/// Checks applied to staged documents before they are uploaded.
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("document is not a JSON object")]
    NotAnObject,
    #[error("document id is required")]
    MissingId,
    #[error("document lang is required")]
    MissingLang,
    #[error("document id cannot be empty")]
    EmptyId,
    #[error("document lang cannot be empty")]
    EmptyLang,
}

/// Validate that a raw document carries a usable `id` and `lang`.
pub fn validate_document(raw: &Value) -> Result<(), ValidationError> {
    let object = raw.as_object().ok_or(ValidationError::NotAnObject)?;
    validate_document_fields(
        object.get("id").and_then(Value::as_str),
        object.get("lang").and_then(Value::as_str),
    )
}

/// Validate that a document has the minimum required fields.
pub fn validate_document_fields(id: Option<&str>, lang: Option<&str>) -> Result<(), ValidationError> {
    match id {
        None => return Err(ValidationError::MissingId),
        Some(id) if id.trim().is_empty() => return Err(ValidationError::EmptyId),
        _ => {}
    }
    match lang {
        None => return Err(ValidationError::MissingLang),
        Some(lang) if lang.trim().is_empty() => return Err(ValidationError::EmptyLang),
        _ => {}
    }
    Ok(())
}
