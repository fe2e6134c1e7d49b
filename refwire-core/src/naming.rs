//! Key-name conversion between the wire and host naming conventions.
//!
//! Conversion splits a key into words according to the source convention
//! and joins them according to the target one. A converted key is only
//! used when converting it back yields the original key; otherwise the key
//! is passed through verbatim. Keys such as `address_1`, `a__b` or
//! `_private` therefore keep their wire spelling instead of being mangled.
//! Keys starting with `$` are markers and are never converted.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyCase {
    /// `first_name`
    #[default]
    SnakeCase,
    /// `firstName`
    CamelCase,
    /// `first-name`
    KebabCase,
    /// Keys are left untouched.
    Verbatim,
}

impl KeyCase {
    fn split(self, key: &str) -> Vec<String> {
        match self {
            KeyCase::SnakeCase => key.split('_').map(str::to_string).collect(),
            KeyCase::KebabCase => key.split('-').map(str::to_string).collect(),
            KeyCase::CamelCase => {
                let mut words = Vec::new();
                let mut current = String::new();
                for ch in key.chars() {
                    if ch.is_uppercase() {
                        if !current.is_empty() {
                            words.push(std::mem::take(&mut current));
                        }
                        current.extend(ch.to_lowercase());
                    } else {
                        current.push(ch);
                    }
                }
                words.push(current);
                words
            }
            KeyCase::Verbatim => vec![key.to_string()],
        }
    }

    fn join(self, words: &[String]) -> String {
        match self {
            KeyCase::SnakeCase => words.join("_"),
            KeyCase::KebabCase => words.join("-"),
            KeyCase::CamelCase => {
                let mut out = String::new();
                for (i, word) in words.iter().enumerate() {
                    if i == 0 {
                        out.push_str(word);
                        continue;
                    }
                    let mut chars = word.chars();
                    if let Some(first) = chars.next() {
                        out.extend(first.to_uppercase());
                        out.push_str(chars.as_str());
                    }
                }
                out
            }
            KeyCase::Verbatim => words.concat(),
        }
    }

    /// Converts `key` from this convention to `target`, returning `None`
    /// when the conversion would not round-trip.
    pub fn convert(self, key: &str, target: KeyCase) -> Option<String> {
        if self == target || key.starts_with('$') {
            return Some(key.to_string());
        }
        let converted = target.join(&self.split(key));
        let back = self.join(&target.split(&converted));
        (back == key).then_some(converted)
    }
}

/// A pair of conventions used to rename keys in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NamingConvention {
    pub wire: KeyCase,
    pub host: KeyCase,
}

impl NamingConvention {
    pub fn new(wire: KeyCase, host: KeyCase) -> Self {
        Self { wire, host }
    }

    /// Wire and host spellings are identical.
    pub fn verbatim() -> Self {
        Self::new(KeyCase::Verbatim, KeyCase::Verbatim)
    }

    pub fn to_host<'a>(&self, key: &'a str) -> Cow<'a, str> {
        rename(key, self.wire, self.host)
    }

    pub fn to_wire<'a>(&self, key: &'a str) -> Cow<'a, str> {
        rename(key, self.host, self.wire)
    }
}

fn rename(key: &str, from: KeyCase, to: KeyCase) -> Cow<'_, str> {
    if from == to {
        return Cow::Borrowed(key);
    }
    match from.convert(key, to) {
        Some(converted) if converted == key => Cow::Borrowed(key),
        Some(converted) => Cow::Owned(converted),
        None => {
            debug!(key, ?from, ?to, "key does not round-trip, passing through verbatim");
            Cow::Borrowed(key)
        }
    }
}
