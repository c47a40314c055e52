//! Localized text fields for build metadata.
//!
//! Titles and descriptions arrive either as a plain string or as a
//! per-language mapping, so the field is a union resolved against a
//! preferred language with a fixed fallback order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Fallback language used when the requested language is absent.
pub const DEFAULT_LANGUAGE: &str = "en";

/// A text field that is either a single string or a per-language mapping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum LocalizedText {
    Plain(String),
    Localized(BTreeMap<String, String>),
}

impl LocalizedText {
    /// Resolve the text for a preferred language.
    ///
    /// Fallback order: requested language, then [`DEFAULT_LANGUAGE`], then
    /// the first available language. Returns `None` only for an empty
    /// mapping.
    pub fn resolve(&self, lang: &str) -> Option<&str> {
        match self {
            LocalizedText::Plain(text) => Some(text),
            LocalizedText::Localized(map) => map
                .get(lang)
                .or_else(|| map.get(DEFAULT_LANGUAGE))
                .or_else(|| map.values().next())
                .map(String::as_str),
        }
    }
}
