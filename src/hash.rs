//! CSP hash tokens for inline content.
//!
//! Tokens are computed over the exact content bytes, with no whitespace
//! normalization, because browsers hash the literal element body.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha384, Sha512};

/// Supported CSP hash algorithms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sha256" | "sha-256" => Some(Self::Sha256),
            "sha384" | "sha-384" => Some(Self::Sha384),
            "sha512" | "sha-512" => Some(Self::Sha512),
            _ => None,
        }
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sha256 => write!(f, "sha256"),
            Self::Sha384 => write!(f, "sha384"),
            Self::Sha512 => write!(f, "sha512"),
        }
    }
}

/// Compute a CSP source expression of the form `'<algo>-<base64 digest>'`.
pub fn hash_token(content: &str, algo: HashAlgorithm) -> String {
    let encoded = match algo {
        HashAlgorithm::Sha256 => STANDARD.encode(Sha256::digest(content.as_bytes())),
        HashAlgorithm::Sha384 => STANDARD.encode(Sha384::digest(content.as_bytes())),
        HashAlgorithm::Sha512 => STANDARD.encode(Sha512::digest(content.as_bytes())),
    };
    format!("'{algo}-{encoded}'")
}

/// Remove duplicate tokens while preserving first-seen order.
///
/// Hash lists from multiple documents are concatenated before merging into
/// a policy; identical inline content must yield a single token.
pub fn dedup_tokens(tokens: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tokens.into_iter().filter(|t| seen.insert(t.clone())).collect()
}
