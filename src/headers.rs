use std::fmt;

/// Ordered, single-valued header collection with case-insensitive names.
///
/// Setting a header that already exists (in any casing) replaces its value
/// and keeps the original spelling and position, so rendering order follows
/// first insertion.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, replacing any existing value. Last write wins.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(index) => self.entries[index].1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name)
            .map(|index| self.entries[index].1.as_str())
    }

    /// Removes `name` and returns its previous value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.position(name)
            .map(|index| self.entries.remove(index).1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Iterates `(name, value)` pairs in serialization order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(existing, _)| existing.eq_ignore_ascii_case(name))
    }
}

// Authorization values may carry credentials.
impl fmt::Debug for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(name, value)| {
                if name.eq_ignore_ascii_case("authorization") {
                    (name, "<redacted>")
                } else {
                    (name, value)
                }
            }))
            .finish()
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Headers;

    #[test]
    fn insert_is_case_insensitive_and_last_write_wins() {
        let mut headers = Headers::new();
        headers.insert("Accept", "text/plain");
        headers.insert("X-Trace", "1");
        headers.insert("ACCEPT", "application/json");

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("accept"), Some("application/json"));
        let names: Vec<&str> = headers.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Accept", "X-Trace"]);
    }

    #[test]
    fn debug_redacts_authorization_value() {
        let headers = Headers::from([
            ("AUTHORIZATION", "Bearer secret-token"),
            ("Prefer", "respond-async"),
        ]);
        let debug = format!("{headers:?}");

        assert!(debug.contains("\"AUTHORIZATION\": \"<redacted>\""));
        assert!(debug.contains("respond-async"));
        assert!(!debug.contains("secret-token"));
    }

    #[test]
    fn remove_ignores_case() {
        let mut headers = Headers::from([("Content-Length", "12")]);
        assert_eq!(headers.remove("content-length"), Some("12".to_owned()));
        assert!(headers.is_empty());
        assert!(!headers.contains("Content-Length"));
    }
}
