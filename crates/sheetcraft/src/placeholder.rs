//! `{{key}}` / `${key}` substitution for form templates

use std::borrow::Cow;
use std::collections::HashMap;

use crate::materialize::Value;

/// Values for form placeholders, keyed by name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Placeholders {
    values: HashMap<String, Value>,
}

impl Placeholders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<K: Into<String>, V: Into<Value>>(&mut self, key: K, value: V) {
        self.values.insert(key.into(), value.into());
    }

    pub fn extend<I, K, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (key, value) in entries {
            self.set(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

const DELIMITERS: [(&str, &str); 2] = [("{{", "}}"), ("${", "}")];

/// Earliest opener in `text`: (offset, opener, closer)
fn next_opener(text: &str) -> Option<(usize, &'static str, &'static str)> {
    DELIMITERS
        .iter()
        .filter_map(|&(open, close)| text.find(open).map(|at| (at, open, close)))
        .min_by_key(|&(at, _, _)| at)
}

/// Replace every `{{key}}` and `${key}` in one left-to-right pass.
///
/// Keys are trimmed. Unknown keys become the empty string. An opener with
/// no closer, or whose key would contain `{`, stays as literal text.
pub fn substitute<'a>(text: &'a str, values: &Placeholders) -> Cow<'a, str> {
    let Some(first) = next_opener(text) else {
        return Cow::Borrowed(text);
    };

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut found = Some(first);
    while let Some((at, open, close)) = found {
        let body_start = at + open.len();
        let body = &rest[body_start..];
        match body.find(close) {
            Some(end) if !body[..end].contains('{') => {
                out.push_str(&rest[..at]);
                if let Some(value) = values.get(body[..end].trim()) {
                    out.push_str(&value.to_string());
                }
                rest = &body[end + close.len()..];
            }
            _ => {
                out.push_str(&rest[..body_start]);
                rest = body;
            }
        }
        found = next_opener(rest);
    }
    out.push_str(rest);
    Cow::Owned(out)
}
