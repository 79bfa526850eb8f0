//! Allowed part names.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::error::{RenderError, Result};

/// Normalizes a part name or file stem: trimmed and lowercased.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// The set of part names that may be rendered.
///
/// Loaded from a comma-separated text file. Entries are normalized with
/// [`normalize_name`] and empty entries are dropped.
///
/// # Example
///
/// ```
/// use render_scene::Whitelist;
///
/// let whitelist = Whitelist::parse("Brick2x4, Plate1x1,\n");
/// assert_eq!(whitelist.len(), 2);
/// assert!(whitelist.allows("brick2x4"));
/// assert!(whitelist.allows(" PLATE1X1 "));
/// assert!(!whitelist.allows("wheel16"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Whitelist {
    names: BTreeSet<String>,
}

impl Whitelist {
    /// Parses comma-separated names.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let names = text
            .split(',')
            .map(normalize_name)
            .filter(|name| !name.is_empty())
            .collect();
        Self { names }
    }

    /// Reads and parses a whitelist file.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Whitelist`] if the file cannot be read.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| RenderError::Whitelist {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    /// Returns `true` if the normalized `name` is listed.
    #[must_use]
    pub fn allows(&self, name: &str) -> bool {
        self.names.contains(&normalize_name(name))
    }

    /// Number of distinct names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if nothing is allowed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_collapse() {
        let whitelist = Whitelist::parse("3001,3001 , 3001\n");
        assert_eq!(whitelist.iter().collect::<Vec<_>>(), ["3001"]);
    }

    #[test]
    fn empty_entries_dropped() {
        let whitelist = Whitelist::parse(" , ,,");
        assert!(whitelist.is_empty());
    }

    #[test]
    fn newlines_are_whitespace() {
        let whitelist = Whitelist::parse("3001,\n3020,\r\n3024\n");
        assert!(whitelist.allows("3020"));
        assert!(whitelist.allows("3024"));
    }

    #[test]
    fn load_missing_file() {
        let err = Whitelist::load(Path::new("/no/such/whitelist_parts.txt")).unwrap_err();
        assert!(matches!(err, RenderError::Whitelist { .. }));
    }
}
