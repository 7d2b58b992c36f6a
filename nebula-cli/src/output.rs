//! Rendering of command results as aligned tables or JSON.

use serde_json::{Map, Value};

/// What a command produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// One row per object.
    Table(Table),
    /// Field/value pairs of a single object.
    Details(Vec<(&'static str, String)>),
    /// A one-line confirmation.
    Message(String),
}

impl Output {
    /// Render for the terminal, or as a JSON document when `json` is set.
    pub fn render(&self, json: bool) -> String {
        if json {
            return self.to_json().to_string();
        }
        match self {
            Output::Table(table) => table.render(),
            Output::Details(fields) => {
                let width = fields.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
                fields
                    .iter()
                    .map(|(key, value)| format!("{:<width$}  {}", key, value, width = width))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            Output::Message(message) => message.clone(),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Output::Table(table) => table.to_json(),
            Output::Details(fields) => object(fields.iter().map(|(k, v)| (*k, v.as_str()))),
            Output::Message(message) => {
                let mut map = Map::new();
                map.insert("message".to_string(), Value::String(message.clone()));
                Value::Object(map)
            }
        }
    }
}

/// Column-aligned table with a header row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&'static str]) -> Self {
        Self {
            headers: headers.to_vec(),
            rows: Vec::new(),
        }
    }

    /// Append a row; missing cells are padded, extra cells dropped.
    pub fn push(&mut self, mut row: Vec<String>) {
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.len()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut lines = vec![pad(&self.headers, &widths)];
        for row in &self.rows {
            let cells: Vec<&str> = row.iter().map(String::as_str).collect();
            lines.push(pad(&cells, &widths));
        }
        lines.join("\n")
    }

    /// Array of objects keyed by lowercase header.
    pub fn to_json(&self) -> Value {
        let keys: Vec<String> = self.headers.iter().map(|h| h.to_lowercase()).collect();
        Value::Array(
            self.rows
                .iter()
                .map(|row| object(keys.iter().map(String::as_str).zip(row.iter().map(String::as_str))))
                .collect(),
        )
    }
}

fn pad(cells: &[&str], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

fn object<'a>(fields: impl Iterator<Item = (&'a str, &'a str)>) -> Value {
    let mut map = Map::new();
    for (key, value) in fields {
        map.insert(key.to_string(), Value::String(value.to_string()));
    }
    Value::Object(map)
}
