//! Blueprints: the attribute text passed to allocate, update and friends.
//!
//! A blueprint is anything that renders to the server's template syntax:
//!
//! ```text
//! NAME = "web-01"
//! MEMORY = "2048"
//! DISK = [
//!   IMAGE_ID = "7",
//!   SIZE = "10240" ]
//! ```
//!
//! Plain strings pass through untouched; [`Template`] builds the text
//! from typed pairs.

use std::fmt;

use crate::error::{ClientError, Result};

/// Something that renders to template text.
pub trait Blueprint {
    fn render(&self) -> Result<String>;
}

impl Blueprint for str {
    fn render(&self) -> Result<String> {
        Ok(self.to_string())
    }
}

impl Blueprint for String {
    fn render(&self) -> Result<String> {
        Ok(self.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    Single(String, String),
    Vector(String, Vec<(String, String)>),
}

/// Ordered template builder.
///
/// Keys must match `[A-Za-z0-9_]+`; rendering fails otherwise. Keys are
/// upper-cased, values are quoted with `"` and `\` escaped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template {
    entries: Vec<Entry>,
}

impl Template {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a single attribute.
    pub fn set(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.entries.push(Entry::Single(key.into(), value.to_string()));
        self
    }

    /// Append a vector attribute such as `DISK` or `NIC`.
    pub fn vector<K, V, I>(mut self, key: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let pairs = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.to_string()))
            .collect();
        self.entries.push(Entry::Vector(key.into(), pairs));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Blueprint for Template {
    fn render(&self) -> Result<String> {
        let mut lines = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            match entry {
                Entry::Single(key, value) => {
                    lines.push(format!("{} = \"{}\"", checked_key(key)?, quote(value)));
                }
                Entry::Vector(key, pairs) => {
                    let key = checked_key(key)?;
                    if pairs.is_empty() {
                        return Err(ClientError::Render(format!(
                            "vector attribute {} has no entries",
                            key
                        )));
                    }
                    let inner = pairs
                        .iter()
                        .map(|(k, v)| Ok(format!("  {} = \"{}\"", checked_key(k)?, quote(v))))
                        .collect::<Result<Vec<_>>>()?;
                    lines.push(format!("{} = [\n{} ]", key, inner.join(",\n")));
                }
            }
        }
        Ok(lines.join("\n"))
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.render() {
            Ok(text) => f.write_str(&text),
            Err(_) => Err(fmt::Error),
        }
    }
}

fn checked_key(key: &str) -> Result<String> {
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ClientError::Render(format!("invalid attribute name '{}'", key)));
    }
    Ok(key.to_ascii_uppercase())
}

fn quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
