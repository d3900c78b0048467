use std::collections::BTreeMap;

/// Flat set of environment variables.
///
/// Used both for the process environment captured at start and for the variables parsed
/// from the remote env file. Names are case-sensitive and never empty.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnvironmentMap(BTreeMap<String, String>);

impl EnvironmentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures the current process environment. Entries that are not valid unicode are
    /// skipped.
    pub fn from_process_env() -> Self {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }

    /// Inserts a variable, returning the previous value. Empty names are ignored.
    pub fn insert<K, V>(&mut self, name: K, value: V) -> Option<String>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let name = name.into();
        if name.is_empty() {
            return None;
        }
        self.0.insert(name, value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Returns the value only when it is set to something other than an empty string.
    pub fn get_non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| !v.is_empty())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates entries sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Layers `self` on top of `lower`: every variable present in `self` keeps its value,
    /// variables only present in `lower` are added.
    pub fn overlay(self, lower: EnvironmentMap) -> EnvironmentMap {
        let mut merged = lower.0;
        merged.extend(self.0);
        EnvironmentMap(merged)
    }
}

impl<K, V> FromIterator<(K, V)> for EnvironmentMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut env = EnvironmentMap::new();
        iter.into_iter().for_each(|(k, v)| {
            env.insert(k, v);
        });
        env
    }
}

impl IntoIterator for EnvironmentMap {
    type Item = (String, String);
    type IntoIter = std::collections::btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
