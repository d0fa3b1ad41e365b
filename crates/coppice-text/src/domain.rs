//! Domain types for coppice-text.

use crate::TextError;

/// Maximum length of an experiment name, in bytes.
const MAX_NAME_LEN: usize = 64;

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]{1,64}`. Every artifact the pipeline writes is
/// prefixed with this name, so it has to be safe in a filename on any
/// platform.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::InvalidExperimentName`] if the name is empty,
    /// longer than 64 characters, or contains characters outside
    /// `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, TextError> {
        if name.is_empty()
            || name.len() > MAX_NAME_LEN
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(TextError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// Return the experiment name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
