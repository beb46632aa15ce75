use std::fmt;

use crate::error::RefError;

/// A validated reference name (`HEAD`, `refs/heads/main`, `refs/tags/v1.0`, ...).
///
/// Validation matches C git's `check_refname_format` loosely: no empty
/// components, no leading dot, no `..`, no control characters, no trailing
/// `.lock`, no trailing slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefName(String);

impl RefName {
    pub fn new(name: impl Into<String>) -> Result<Self, RefError> {
        let name = name.into();
        validate(&name)?;
        Ok(RefName(name))
    }

    /// Build a `RefName` without validation. Only for literals known to be valid.
    pub fn new_unchecked(name: impl Into<String>) -> Self {
        RefName(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate(name: &str) -> Result<(), RefError> {
    if name.is_empty() {
        return Err(RefError::InvalidName(name.to_string()));
    }
    if name == "HEAD" {
        return Ok(());
    }
    if name.starts_with('/') || name.ends_with('/') {
        return Err(RefError::InvalidName(name.to_string()));
    }
    for component in name.split('/') {
        if component.is_empty()
            || component == "."
            || component == ".."
            || component.starts_with('.')
            || component.ends_with(".lock")
            || component.contains("..")
        {
            return Err(RefError::InvalidName(name.to_string()));
        }
        if component.bytes().any(|b| b < 0x20 || b == 0x7f) {
            return Err(RefError::InvalidName(name.to_string()));
        }
    }
    Ok(())
}

impl fmt::Display for RefName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RefName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
