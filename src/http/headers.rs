//! HTTP header map with case-insensitive name lookup.
//!
//! Header names are case-insensitive per RFC 9110 §5. Repeated fields with the
//! same name are folded into one comma-separated value in arrival order.

use std::fmt;

/// A case-insensitive HTTP header map.
///
/// Preserves insertion order. Inserting a name that is already present folds
/// the new value onto the stored one, so `X-Dup: a` followed by `X-Dup: b`
/// reads back as `a,b`.
///
/// # Examples
///
/// ```
/// use platter::http::Headers;
///
/// let mut headers = Headers::new();
/// headers.insert("Content-Type", "text/html; charset=utf-8");
/// headers.insert("X-Custom", "first");
/// headers.insert("X-Custom", "second");
///
/// assert_eq!(headers.get("content-type"), Some("text/html; charset=utf-8"));
/// assert_eq!(headers.get("X-CUSTOM"), Some("first,second"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Headers {
    inner: Vec<(String, String)>,
}

impl Headers {
    /// Creates an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a header map with pre-allocated capacity for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Vec::with_capacity(capacity),
        }
    }

    /// Inserts a header entry, folding onto an existing entry with the same
    /// name (case-insensitive) as `existing,new`.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entry_mut(&name) {
            Some(existing) => {
                existing.push(',');
                existing.push_str(&value);
            }
            None => self.inner.push((name, value)),
        }
    }

    /// Replaces any existing entry with the given name, or inserts a fresh one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entry_mut(&name) {
            Some(existing) => *existing = value,
            None => self.inner.push((name, value)),
        }
    }

    /// Returns the value for the given header name (case-insensitive), or `None`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Removes the entry with the given header name (case-insensitive).
    ///
    /// Returns `true` if an entry was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.inner.len();
        self.inner.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.inner.len() < before
    }

    /// Returns `true` if the map contains an entry with the given name.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    /// Returns the number of distinct header names stored.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if there are no header entries.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns an iterator over all `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn entry_mut(&mut self, name: &str) -> Option<&mut String> {
        self.inner
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.inner {
            write!(f, "{name}: {value}\r\n")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive_get() {
        let mut h = Headers::new();
        h.insert("Content-Type", "text/plain");
        assert_eq!(h.get("content-type"), Some("text/plain"));
        assert_eq!(h.get("CONTENT-TYPE"), Some("text/plain"));
        assert_eq!(h.get("Content-Type"), Some("text/plain"));
    }

    #[test]
    fn duplicate_names_fold_in_arrival_order() {
        let mut h = Headers::new();
        h.insert("X-Example-Dup", "val1");
        h.insert("x-example-dup", "val2");
        h.insert("X-EXAMPLE-DUP", "val3");
        assert_eq!(h.get("X-Example-Dup"), Some("val1,val2,val3"));
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn set_replaces_instead_of_folding() {
        let mut h = Headers::new();
        h.insert("Connection", "keep-alive");
        h.set("connection", "close");
        assert_eq!(h.get("Connection"), Some("close"));
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn remove() {
        let mut h = Headers::new();
        h.insert("X-Foo", "bar");
        assert!(h.remove("x-foo"));
        assert!(h.is_empty());
        assert!(!h.remove("x-foo")); // already gone
    }

    #[test]
    fn contains() {
        let mut h = Headers::new();
        h.insert("Authorization", "Bearer token");
        assert!(h.contains("authorization"));
        assert!(!h.contains("x-missing"));
    }

    #[test]
    fn display_writes_wire_format() {
        let mut h = Headers::new();
        h.insert("Host", "localhost");
        h.insert("Agent", "me");
        assert_eq!(h.to_string(), "Host: localhost\r\nAgent: me\r\n");
    }
}
