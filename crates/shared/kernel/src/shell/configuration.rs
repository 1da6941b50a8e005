use mhost_domain::constants::KEY_SEPARATOR;
use mhost_domain::shell::ShellSettings;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

/// Read-only per-shell configuration view.
///
/// Keys are `Parent:Child` paths compared case-insensitively. A [`section`](Self::section)
/// is a view over the keys below a prefix, with the prefix stripped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellConfiguration {
    entries: Arc<BTreeMap<String, String>>,
}

impl ShellConfiguration {
    #[must_use]
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let entries =
            entries.into_iter().map(|(key, value)| (normalize(key.as_ref()), value.into())).collect();
        Self { entries: Arc::new(entries) }
    }

    #[must_use]
    pub fn from_settings(settings: &ShellSettings) -> Self {
        Self::new(settings.configuration())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(&normalize(key)).map(String::as_str)
    }

    /// Parses the value at `key`; `None` if it is missing or does not parse.
    #[must_use]
    pub fn get_as<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key)?.parse().ok()
    }

    #[must_use]
    pub fn section(&self, prefix: &str) -> Self {
        let mut prefix = normalize(prefix);
        prefix.push(KEY_SEPARATOR);
        let entries = self
            .entries
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .map(|(key, value)| (key[prefix.len()..].to_owned(), value.clone()))
            .collect();
        Self { entries: Arc::new(entries) }
    }

    /// Entries with normalized (lowercase) keys, in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize(key: &str) -> String {
    key.trim().to_lowercase()
}
