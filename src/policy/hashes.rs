//! Hash injection into `script-src` / `style-src`.

use serde::{Deserialize, Serialize};

use super::Policy;

const UNSAFE_HASHES: &str = "'unsafe-hashes'";

/// Hash tokens collected from inline content, grouped by where they apply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InlineHashes {
    /// Inline `<script>` bodies and event-handler attribute values.
    pub scripts: Vec<String>,
    /// Inline `<style>` tag bodies.
    pub style_tags: Vec<String>,
    /// `style="..."` attribute values.
    pub style_attrs: Vec<String>,
    /// Whether any script hash came from an event-handler attribute.
    pub has_event_handlers: bool,
}

impl InlineHashes {
    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
            && self.style_tags.is_empty()
            && self.style_attrs.is_empty()
            && !self.has_event_handlers
    }
}

/// Merge inline-content hashes into a policy.
///
/// Script hashes go to `script-src`, style-tag hashes to `style-src`, and
/// style-attribute hashes to `style-src-attr` when that directive already
/// exists, else `style-src`. `'unsafe-hashes'` is appended when event
/// handlers were seen or any style-attribute hash exists, because browsers
/// ignore hashes on those surfaces without it. Directives are created on
/// demand but never fabricated empty.
pub fn merge_inline_hashes(policy: &mut Policy, hashes: &InlineHashes) {
    if !hashes.scripts.is_empty() || hashes.has_event_handlers {
        policy.append_tokens("script-src", &hashes.scripts);
        if hashes.has_event_handlers {
            append_unsafe_hashes(policy, "script-src");
        }
    }

    if !hashes.style_tags.is_empty() {
        policy.append_tokens("style-src", &hashes.style_tags);
    }

    if !hashes.style_attrs.is_empty() {
        let directive = if policy.contains("style-src-attr") {
            "style-src-attr"
        } else {
            "style-src"
        };
        policy.append_tokens(directive, &hashes.style_attrs);
        append_unsafe_hashes(policy, directive);
    }
}

fn append_unsafe_hashes(policy: &mut Policy, directive: &str) {
    let already = policy
        .get(directive)
        .map(|v| v.split_whitespace().any(|t| t == UNSAFE_HASHES))
        .unwrap_or(false);
    if !already {
        policy.append_tokens(directive, &[UNSAFE_HASHES]);
    }
}
