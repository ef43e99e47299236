//! Object filter expressions understood by the remote API.
//!
//! A filter is a nested JSON object whose leaves are `{"operation": ...}`
//! maps. [`FilterBuilder`] assembles nested paths and [`query_filter`]
//! translates human friendly query strings into leaf operations.

use serde_json::{Map, Value, json};

/// Operators recognised at the start of a query string.
const KNOWN_OPERATIONS: [&str; 10] = ["<=", ">=", "<", ">", "~", "!~", "*=", "^=", "$=", "_="];

/// Builds the leaf operation for a query string.
///
/// Integers become numeric operations. Strings keep an explicit operator
/// when one is present, and leading or trailing `*` wildcards map to the
/// contains, ends-with and starts-with operators. Everything else is an
/// exact, case-insensitive match (`_=`).
#[must_use]
pub fn query_filter(query: &str) -> Value {
    let trimmed = query.trim();
    if let Ok(number) = trimmed.parse::<i64>() {
        return json!({ "operation": number });
    }

    for operation in KNOWN_OPERATIONS {
        if let Some(rest) = trimmed.strip_prefix(operation) {
            return json!({ "operation": format!("{operation} {}", rest.trim()) });
        }
    }

    let starts = trimmed.starts_with('*');
    let ends = trimmed.ends_with('*');
    let bare = trimmed.trim_matches('*');
    let expression = match (starts, ends) {
        (true, true) => format!("*= {bare}"),
        (true, false) => format!("$= {bare}"),
        (false, true) => format!("^= {bare}"),
        (false, false) => format!("_= {trimmed}"),
    };
    json!({ "operation": expression })
}

/// Builds the leaf operation for a numeric comparison.
#[must_use]
pub fn numeric_filter(value: u64) -> Value {
    json!({ "operation": value })
}

/// Builds an `in` filter matching any of `values` in the `data` option.
#[must_use]
pub fn in_filter<I, S>(values: I) -> Value
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let values: Vec<Value> = values
        .into_iter()
        .map(|value| Value::String(value.into()))
        .collect();
    json!({
        "operation": "in",
        "options": [{ "name": "data", "value": values }],
    })
}

/// Incrementally assembles a nested filter object.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterBuilder {
    root: Map<String, Value>,
}

impl FilterBuilder {
    /// Creates an empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `leaf` at the nested `path`, creating intermediate objects as
    /// needed. An empty path leaves the filter unchanged.
    #[must_use]
    pub fn set(mut self, path: &[&str], leaf: Value) -> Self {
        if let Some((last, parents)) = path.split_last() {
            insert_at(&mut self.root, parents, last, leaf);
        }
        self
    }

    /// Sets `leaf` at `path` only when a value is present.
    #[must_use]
    pub fn set_some(self, path: &[&str], leaf: Option<Value>) -> Self {
        match leaf {
            Some(value) => self.set(path, value),
            None => self,
        }
    }

    /// Returns `true` when no leaf has been set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Finishes the filter as a JSON value.
    #[must_use]
    pub fn build(self) -> Value {
        Value::Object(self.root)
    }
}

fn insert_at(node: &mut Map<String, Value>, parents: &[&str], last: &str, leaf: Value) {
    let Some((head, rest)) = parents.split_first() else {
        node.insert(last.to_owned(), leaf);
        return;
    };
    let entry = node
        .entry((*head).to_owned())
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    if let Value::Object(child) = entry {
        insert_at(child, rest, last, leaf);
    }
}
