//! Error types for scene validation and mutation.

use crate::elements::ElementId;
use thiserror::Error;

/// A request or element failed structural validation.
///
/// Validation happens before any mutation, so a scene is never left
/// half-modified when one of these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("field `{0}` must be a finite number")]
    NonFinite(&'static str),
    #[error("field `{field}` must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },
    #[error("field `{field}` must be greater than zero (got {value})")]
    NotPositive { field: &'static str, value: f64 },
    #[error("field `{field}` must be a whole number of pixels (got {value})")]
    NotInteger { field: &'static str, value: f64 },
    #[error("path must contain at least one point")]
    EmptyPath,
    #[error("text must not be empty")]
    EmptyText,
    #[error("image url must not be empty")]
    EmptyUrl,
    #[error("canvas name must not be empty")]
    EmptyName,
    #[error("invalid color `{0}`")]
    InvalidColor(String),
    #[error("unknown shape type `{0}`")]
    UnknownShapeType(String),
    #[error("expected request type `{expected}`, got `{found}`")]
    UnexpectedType { expected: &'static str, found: String },
    #[error("{kind} elements cannot be patched")]
    UnsupportedPatch { kind: &'static str },
    #[error("invalid props: {0}")]
    InvalidProps(String),
    #[error("duplicate element id {0}")]
    DuplicateElementId(ElementId),
    #[error("element ids exhausted for this scene")]
    IdsExhausted,
}

/// Failure of a scene mutation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("element not found: {0}")]
    ElementNotFound(ElementId),
}

/// Reject NaN and infinities for a named field.
pub(crate) fn finite(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::NonFinite(field))
    }
}

/// A finite value that is `>= 0`.
pub(crate) fn non_negative(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    let value = finite(field, value)?;
    if value < 0.0 {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(value)
}

/// A finite value that is `> 0`.
pub(crate) fn positive(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    let value = finite(field, value)?;
    if value <= 0.0 {
        return Err(ValidationError::NotPositive { field, value });
    }
    Ok(value)
}
