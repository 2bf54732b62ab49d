use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::hash::HashAlgorithm;
use crate::policy::StrictTemplate;

/// Top-level configuration from `.cspforge.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub strict: StrictTemplate,
}

/// Defaults for the scan pipeline; each can be overridden per invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub hash_algorithm: HashAlgorithm,
    pub include_external: bool,
    pub heuristics: bool,
    pub validate: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            hash_algorithm: HashAlgorithm::Sha256,
            include_external: false,
            heuristics: false,
            validate: true,
        }
    }
}

impl Config {
    /// Load config from a TOML file. Returns default if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Generate a starter config file.
    pub fn starter_toml() -> &'static str {
        r#"# csp-forge configuration

[scan]
# Hash algorithm for inline content (sha256, sha384, sha512).
hash_algorithm = "sha256"

# Collect external resource references and add their origins to the policy.
include_external = false

# Infer additional origins a page will need at runtime (fonts loaded by
# stylesheets, analytics collectors, payment iframes).
heuristics = false

# Validate the resulting policy and report warnings on stderr.
validate = true

# Strict baseline template; uncomment to loosen individual directives.
# [strict]
# script_src = ["'self'", "https://cdn.example.com"]
# frame_src = ["'none'"]
# require_trusted_types = false
"#
    }
}
