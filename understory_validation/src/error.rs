// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The default validation error record.

use alloc::string::String;
use core::fmt;

/// A validation error: an optional machine-readable kind plus a message.
///
/// Validation errors are data, not control flow. They are stored in a
/// [`ValidationTree`](crate::ValidationTree) and queried by path.
///
/// # Example
///
/// ```rust
/// use understory_validation::ValidationError;
///
/// let required = ValidationError::with_kind("required", "email is required");
/// assert_eq!(required.kind(), Some("required"));
/// assert_eq!(required.message(), "email is required");
///
/// let plain: ValidationError = "too short".into();
/// assert_eq!(plain.kind(), None);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ValidationError {
    kind: Option<String>,
    message: String,
}

impl ValidationError {
    /// Creates an error with only a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: None,
            message: message.into(),
        }
    }

    /// Creates an error with a kind (for example `"required"`) and a message.
    #[must_use]
    pub fn with_kind(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            message: message.into(),
        }
    }

    /// Returns the kind of this error, if any.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Some(kind) => write!(f, "{kind}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl core::error::Error for ValidationError {}

impl From<&str> for ValidationError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for ValidationError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}
