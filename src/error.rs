//! Crate-wide error taxonomy.
//!
//! Every failure in the core surfaces as a typed error; nothing is swallowed
//! into a degraded-but-silent result (e.g. a blank tile). The
//! [`Error::classify`] split mirrors the HTTP-equivalent status mapping used
//! by callers: client errors for bad addresses, missing entities, payload
//! problems and edit conflicts; server errors for renderer failures.

use std::fmt;

use thiserror::Error;

use crate::coord::{BBox, CoordError};
use crate::style::StyleId;

/// Rough client/server split of the error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Caller mistake (HTTP 4xx equivalent)
    Client,
    /// Internal failure (HTTP 5xx equivalent)
    Server,
}

/// Top-level error type for all core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or out-of-range z/x/y address
    #[error(transparent)]
    InvalidTileAddress(#[from] CoordError),

    /// Referenced style or layer does not exist
    #[error("{what} {id} not found")]
    NotFound { what: &'static str, id: u64 },

    /// Type tag has no entry in the style registry.
    ///
    /// `stale` records the origin: false for bad user input (a client
    /// error), true for a persisted tag the registry no longer knows — a
    /// server integrity problem, logged at error level where detected.
    #[error("unknown style type '{type_tag}'")]
    UnknownStyleType { type_tag: String, stale: bool },

    /// The subtype refuses the target layer
    #[error("style type '{type_tag}' does not support layer {layer_id}")]
    UnsupportedForLayer { type_tag: String, layer_id: u64 },

    /// Malformed payload; every offending field is enumerated
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Concrete renderer failed
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Concurrent edit collision detected by the entity store
    #[error("conflicting update of style {style_id}: expected version {expected}, found {found}")]
    Conflict {
        style_id: StyleId,
        expected: u64,
        found: u64,
    },
}

impl Error {
    /// Classifies the error for HTTP-equivalent status mapping.
    pub fn classify(&self) -> ErrorClass {
        match self {
            Error::Render(_) => ErrorClass::Server,
            Error::UnknownStyleType { stale: true, .. } => ErrorClass::Server,
            _ => ErrorClass::Client,
        }
    }

    /// True if the caller may retry the whole operation (edit conflicts only).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }
}

/// A single invalid field within a payload.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Payload validation failure listing every offending field.
///
/// Validation collects all problems before failing so a caller can show a
/// complete field-level error list, not just the first hit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationError {
    errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    /// A validation failure with exactly one offending field.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut err = Self::new();
        err.push(field, message);
        err
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// `Ok(())` when no field errors were collected, `Err(self)` otherwise.
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// True if some collected error names the given field.
    pub fn mentions(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed:")?;
        for err in &self.errors {
            write!(f, " [{}: {}]", err.field, err.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Rendering failure, carrying enough context for diagnosis.
#[derive(Debug, Clone, Error)]
#[error("render failed for style {style_id:?} ({type_tag}) bbox={bbox:?} zoom={zoom:?}: {message}")]
pub struct RenderError {
    pub style_id: Option<StyleId>,
    pub type_tag: String,
    pub bbox: BBox,
    pub zoom: Option<u8>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_lists_all_fields() {
        let mut err = ValidationError::new();
        err.push("band", "must be a positive integer");
        err.push("extra", "unrecognized field");

        assert_eq!(err.errors().len(), 2);
        assert!(err.mentions("band"));
        assert!(err.mentions("extra"));

        let text = err.to_string();
        assert!(text.contains("band"));
        assert!(text.contains("extra"));
    }

    #[test]
    fn test_into_result() {
        assert!(ValidationError::new().into_result().is_ok());
        assert!(ValidationError::single("f", "bad").into_result().is_err());
    }

    #[test]
    fn test_classify() {
        let client = Error::NotFound { what: "style", id: 9 };
        assert_eq!(client.classify(), ErrorClass::Client);

        let server = Error::Render(RenderError {
            style_id: Some(9),
            type_tag: "raster".into(),
            bbox: BBox::new(0.0, 0.0, 1.0, 1.0),
            zoom: Some(4),
            message: "source unreachable".into(),
        });
        assert_eq!(server.classify(), ErrorClass::Server);
    }

    #[test]
    fn test_unknown_style_type_classifies_by_origin() {
        // Bad user input on the create path is the caller's mistake
        let from_input = Error::UnknownStyleType {
            type_tag: "heatmap".into(),
            stale: false,
        };
        assert_eq!(from_input.classify(), ErrorClass::Client);

        // A persisted tag the registry no longer knows is an integrity error
        let from_store = Error::UnknownStyleType {
            type_tag: "retired".into(),
            stale: true,
        };
        assert_eq!(from_store.classify(), ErrorClass::Server);
    }

    #[test]
    fn test_conflict_is_retryable() {
        let err = Error::Conflict {
            style_id: 42,
            expected: 3,
            found: 4,
        };
        assert!(err.is_retryable());
        assert!(!Error::NotFound { what: "layer", id: 1 }.is_retryable());
    }

    #[test]
    fn test_render_error_display_carries_context() {
        let err = RenderError {
            style_id: Some(42),
            type_tag: "vector".into(),
            bbox: BBox::new(-1.0, -2.0, 3.0, 4.0),
            zoom: Some(7),
            message: "backend down".into(),
        };
        let text = err.to_string();
        assert!(text.contains("42"));
        assert!(text.contains("vector"));
        assert!(text.contains("zoom=Some(7)"));
        assert!(text.contains("backend down"));
    }
}
