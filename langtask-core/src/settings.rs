//! Validation settings.
//!
//! This module provides the `ValidationSettings` type shared by the schema
//! compiler, the output validator and the error classifier.

use serde::{Deserialize, Serialize};

/// Maximum number of nested `object` levels a schema may declare.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 4;

/// Number of characters of an offending text value shown in diagnostics.
pub const DEFAULT_PREVIEW_LIMIT: usize = 100;

/// Settings for schema compilation and output validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    /// Maximum object nesting depth, measured from the schema root.
    pub max_nesting_depth: usize,

    /// Characters of a textual value kept in diagnostic previews.
    pub preview_limit: usize,

    /// Whether input keys may match field names regardless of case.
    pub case_insensitive_keys: bool,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            preview_limit: DEFAULT_PREVIEW_LIMIT,
            case_insensitive_keys: true,
        }
    }
}

impl ValidationSettings {
    /// Create settings with the default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum nesting depth.
    #[must_use]
    pub fn max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Set the preview limit.
    #[must_use]
    pub fn preview_limit(mut self, limit: usize) -> Self {
        self.preview_limit = limit;
        self
    }

    /// Enable or disable case-insensitive key matching.
    #[must_use]
    pub fn case_insensitive_keys(mut self, enabled: bool) -> Self {
        self.case_insensitive_keys = enabled;
        self
    }
}
