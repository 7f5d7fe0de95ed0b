//! Domain validation errors.

use thiserror::Error;

/// Missing or malformed required input, detected before any write.
///
/// Fields are checked in a fixed order so the reported field is
/// deterministic for a given payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required top-level field is absent (or present but empty).
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// A required shipping sub-field is absent (or present but empty).
    #[error("Missing required shipping field: {0}")]
    MissingShippingField(&'static str),

    /// The interaction event type is not one of the accepted values.
    #[error("Invalid eventType. Must be one of: product-view, add-to-cart, purchase")]
    InvalidEventType(String),
}
