//! Caller-supplied request arguments.
//!
//! Arguments keep the caller's insertion order so the built request URL is
//! stable, while lookups by name can be made case-insensitively to follow the
//! KVP convention of WFS/WCS.

use std::fmt;

/// A single argument value. Lists are sent as repeated keys.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Single(String),
    List(Vec<String>),
}

impl ArgValue {
    /// An argument counts as absent when it carries no non-empty value.
    pub fn is_empty(&self) -> bool {
        match self {
            ArgValue::Single(s) => s.is_empty(),
            ArgValue::List(items) => items.iter().all(|s| s.is_empty()),
        }
    }

    /// Every value, one per wire occurrence.
    pub fn values(&self) -> Vec<&str> {
        match self {
            ArgValue::Single(s) => vec![s.as_str()],
            ArgValue::List(items) => items.iter().map(String::as_str).collect(),
        }
    }

    /// The value when it is a single string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::Single(s) => Some(s),
            ArgValue::List(_) => None,
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Single(s) => write!(f, "{}", s),
            ArgValue::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

impl From<&str> for ArgValue {
    fn from(s: &str) -> Self {
        ArgValue::Single(s.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(s: String) -> Self {
        ArgValue::Single(s)
    }
}

impl From<&String> for ArgValue {
    fn from(s: &String) -> Self {
        ArgValue::Single(s.clone())
    }
}

impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        ArgValue::Single(v.to_string())
    }
}

impl From<u32> for ArgValue {
    fn from(v: u32) -> Self {
        ArgValue::Single(v.to_string())
    }
}

impl From<f64> for ArgValue {
    fn from(v: f64) -> Self {
        ArgValue::Single(v.to_string())
    }
}

impl From<Vec<String>> for ArgValue {
    fn from(items: Vec<String>) -> Self {
        ArgValue::List(items)
    }
}

impl From<Vec<&str>> for ArgValue {
    fn from(items: Vec<&str>) -> Self {
        ArgValue::List(items.into_iter().map(str::to_string).collect())
    }
}

/// Ordered name → value bag of request arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryArgs {
    entries: Vec<(String, ArgValue)>,
}

impl QueryArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an argument (builder pattern).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert an argument, replacing any previous value with the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ArgValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Exact-name lookup.
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Case-insensitive lookup.
    pub fn get_ignore_case(&self, name: &str) -> Option<&ArgValue> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// True when a non-empty value is supplied under `name` (any case).
    pub fn has_value(&self, name: &str) -> bool {
        self.get_ignore_case(name).map_or(false, |v| !v.is_empty())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for QueryArgs
where
    K: Into<String>,
    V: Into<ArgValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut args = QueryArgs::new();
        for (k, v) in iter {
            args.insert(k, v);
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_and_keeps_order() {
        let args = QueryArgs::new()
            .with("typeNames", "gn:NamedPlace")
            .with("srsName", "EPSG:25830")
            .with("typeNames", "au:AdministrativeUnit");

        let names: Vec<&str> = args.names().collect();
        assert_eq!(names, vec!["typeNames", "srsName"]);
        assert_eq!(
            args.get("typeNames").and_then(ArgValue::as_str),
            Some("au:AdministrativeUnit")
        );
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let args = QueryArgs::new().with("RESX", 0.5).with("width", "");
        assert!(args.has_value("resx"));
        assert!(!args.has_value("WIDTH"));
        assert!(!args.has_value("height"));
    }

    #[test]
    fn test_list_values() {
        let value = ArgValue::from(vec!["x(1,2)", "y(3,4)"]);
        assert_eq!(value.values(), vec!["x(1,2)", "y(3,4)"]);
        assert!(!value.is_empty());
        assert!(ArgValue::List(vec![String::new()]).is_empty());
    }
}
