//! Document configuration.

/// Default separator between path segments.
pub const DEFAULT_PATH_SEPARATOR: char = '.';

/// Default nesting limit for built and deserialized documents.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Configuration for a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentConfig {
    /// Apply every field of an update document instead of stopping after
    /// the first field that changed.
    pub apply_all_fields: bool,

    /// Separator between path segments.
    pub path_separator: char,

    /// Maximum container nesting accepted when building or deserializing.
    pub max_depth: usize,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            apply_all_fields: false,
            path_separator: DEFAULT_PATH_SEPARATOR,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl DocumentConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether updates apply every field.
    #[must_use]
    pub const fn apply_all_fields(mut self, value: bool) -> Self {
        self.apply_all_fields = value;
        self
    }

    /// Sets the path segment separator.
    #[must_use]
    pub const fn path_separator(mut self, separator: char) -> Self {
        self.path_separator = separator;
        self
    }

    /// Sets the maximum nesting depth.
    #[must_use]
    pub const fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}
