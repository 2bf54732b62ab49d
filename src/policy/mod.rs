//! The directive-level CSP model every other component mutates.
//!
//! A policy is a mapping of directive name to value string. Parsing is
//! forgiving (duplicate names overwrite, empty segments are skipped) and
//! reconstruction emits a canonical directive order so successive policy
//! generations diff cleanly. The CSP spec itself treats order as irrelevant.

pub mod hashes;
pub mod merge;
pub mod strict;
pub mod validate;

use std::collections::BTreeMap;

pub use hashes::{merge_inline_hashes, InlineHashes};
pub use merge::{apply_modifications, merge_catalog, ModAction, Modification};
pub use strict::StrictTemplate;
pub use validate::{validate, Severity, ValidationResult, ValidationWarning};

/// Canonical output order for common directives. Anything not listed is
/// appended afterwards in lexicographic order.
pub const CANONICAL_ORDER: [&str; 11] = [
    "default-src",
    "script-src",
    "style-src",
    "img-src",
    "font-src",
    "connect-src",
    "frame-src",
    "frame-ancestors",
    "object-src",
    "base-uri",
    "form-action",
];

/// A parsed CSP header: directive name → space-separated source list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Policy {
    directives: BTreeMap<String, String>,
}

impl Policy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a CSP header string. Segments split on `;`, each segment split
    /// at the first whitespace into name/value; a bare directive gets an
    /// empty value; later duplicates overwrite earlier ones.
    pub fn parse(header: &str) -> Self {
        let mut directives = BTreeMap::new();

        for segment in header.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            match segment.split_once(char::is_whitespace) {
                Some((name, value)) => {
                    directives.insert(name.to_string(), value.trim().to_string());
                }
                None => {
                    directives.insert(segment.to_string(), String::new());
                }
            }
        }

        Self { directives }
    }

    /// Reconstruct a header string: canonical directives first, leftovers
    /// after, joined with `"; "`. A directive with an empty value renders
    /// bare (e.g. `upgrade-insecure-requests`).
    pub fn header(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(self.directives.len());

        for name in CANONICAL_ORDER {
            if let Some(value) = self.directives.get(name) {
                parts.push(render_directive(name, value));
            }
        }

        for (name, value) in &self.directives {
            if !CANONICAL_ORDER.contains(&name.as_str()) {
                parts.push(render_directive(name, value));
            }
        }

        parts.join("; ")
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.directives.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.directives.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.directives.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.directives.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn directives(&self) -> impl Iterator<Item = (&str, &str)> {
        self.directives.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Union new tokens into a directive's value, preserving existing token
    /// order and skipping tokens already present. Creates the directive if
    /// absent and `tokens` is non-empty.
    pub fn append_tokens<S: AsRef<str>>(&mut self, name: &str, tokens: &[S]) {
        if tokens.is_empty() {
            return;
        }
        let existing = self.directives.get(name).map(String::as_str).unwrap_or("");
        let merged = union_tokens(existing, tokens);
        self.directives.insert(name.to_string(), merged);
    }
}

fn render_directive(name: &str, value: &str) -> String {
    if value.is_empty() {
        name.to_string()
    } else {
        format!("{name} {value}")
    }
}

/// Join an existing source list with new tokens, order-preserving and
/// duplicate-free.
pub(crate) fn union_tokens<S: AsRef<str>>(existing: &str, add: &[S]) -> String {
    let mut seen = std::collections::HashSet::new();
    let mut out: Vec<&str> = Vec::new();

    for token in existing.split_whitespace() {
        if seen.insert(token) {
            out.push(token);
        }
    }
    for token in add {
        let token = token.as_ref();
        if !token.is_empty() && seen.insert(token) {
            out.push(token);
        }
    }

    out.join(" ")
}
