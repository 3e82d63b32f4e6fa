//! Country calling code table consumed by the phone handle path.

use serde::{Deserialize, Serialize};

/// One selectable calling code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryCode {
    /// Calling code including the leading `+`, e.g. `+44`.
    pub code: String,
    pub name: String,
}

impl CountryCode {
    /// Builds one entry. The code is taken as given; `DirectoryConfig::validate`
    /// checks its shape.
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// Immutable, ordered set of calling codes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CountryCodeTable {
    entries: Vec<CountryCode>,
}

impl CountryCodeTable {
    /// Wraps entries in display order.
    pub fn new(entries: Vec<CountryCode>) -> Self {
        Self { entries }
    }

    /// Whether `code` is selectable. Surrounding whitespace is ignored.
    pub fn contains(&self, code: &str) -> bool {
        self.lookup(code).is_some()
    }

    /// Entry for `code`, ignoring surrounding whitespace.
    pub fn lookup(&self, code: &str) -> Option<&CountryCode> {
        let normalized = code.trim();
        self.entries.iter().find(|entry| entry.code == normalized)
    }

    /// Longest known code that `number` starts with.
    ///
    /// # Contract
    /// - Leading whitespace in `number` is ignored.
    /// - `+44` wins over `+4` when both are listed.
    pub fn match_prefix(&self, number: &str) -> Option<&CountryCode> {
        let number = number.trim_start();
        self.entries
            .iter()
            .filter(|entry| number.starts_with(entry.code.as_str()))
            .max_by_key(|entry| entry.code.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{CountryCode, CountryCodeTable};

    #[test]
    fn lookup_trims_input() {
        let table = CountryCodeTable::new(vec![
            CountryCode::new("+1", "United States/Canada"),
            CountryCode::new("+44", "United Kingdom"),
        ]);
        assert_eq!(
            table.lookup(" +44 ").map(|entry| entry.name.as_str()),
            Some("United Kingdom")
        );
        assert!(!table.contains("+999"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn match_prefix_prefers_longest_code() {
        let table = CountryCodeTable::new(vec![
            CountryCode::new("+3", "Short"),
            CountryCode::new("+353", "Ireland"),
            CountryCode::new("+44", "United Kingdom"),
        ]);
        assert_eq!(
            table.match_prefix(" +353 85 123 4567").map(|entry| entry.code.as_str()),
            Some("+353")
        );
        assert_eq!(
            table.match_prefix("+447700900123").map(|entry| entry.code.as_str()),
            Some("+44")
        );
        assert!(table.match_prefix("+999 123").is_none());
        assert!(table.match_prefix("7700 900123").is_none());
    }
}
