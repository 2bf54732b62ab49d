//! Strict baseline policy template.

use serde::{Deserialize, Serialize};

use super::Policy;

/// A from-scratch policy template whose fields are per-directive allow-lists.
///
/// The default is maximally restrictive: everything falls back to
/// `default-src 'none'`, each concrete surface gets `'self'`, and framing
/// and plugins are shut off entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrictTemplate {
    pub default_src: Vec<String>,
    pub script_src: Vec<String>,
    pub style_src: Vec<String>,
    pub img_src: Vec<String>,
    pub font_src: Vec<String>,
    pub connect_src: Vec<String>,
    pub manifest_src: Vec<String>,
    pub worker_src: Vec<String>,
    pub frame_src: Vec<String>,
    pub object_src: Vec<String>,
    pub media_src: Vec<String>,
    pub base_uri: Vec<String>,
    pub form_action: Vec<String>,
    pub frame_ancestors: Vec<String>,
    pub upgrade_insecure_requests: bool,
    pub require_trusted_types: bool,
}

impl Default for StrictTemplate {
    fn default() -> Self {
        let self_only = || vec!["'self'".to_string()];
        let none = || vec!["'none'".to_string()];
        Self {
            default_src: none(),
            script_src: self_only(),
            style_src: self_only(),
            img_src: self_only(),
            font_src: self_only(),
            connect_src: self_only(),
            manifest_src: self_only(),
            worker_src: self_only(),
            frame_src: none(),
            object_src: none(),
            media_src: self_only(),
            base_uri: self_only(),
            form_action: self_only(),
            frame_ancestors: none(),
            upgrade_insecure_requests: true,
            require_trusted_types: false,
        }
    }
}

impl StrictTemplate {
    /// Materialize the template as a `Policy`. Empty allow-lists produce no
    /// directive at all.
    pub fn policy(&self) -> Policy {
        let mut policy = Policy::new();

        let fields: [(&str, &[String]); 14] = [
            ("default-src", &self.default_src),
            ("script-src", &self.script_src),
            ("style-src", &self.style_src),
            ("img-src", &self.img_src),
            ("font-src", &self.font_src),
            ("connect-src", &self.connect_src),
            ("manifest-src", &self.manifest_src),
            ("worker-src", &self.worker_src),
            ("frame-src", &self.frame_src),
            ("object-src", &self.object_src),
            ("media-src", &self.media_src),
            ("base-uri", &self.base_uri),
            ("form-action", &self.form_action),
            ("frame-ancestors", &self.frame_ancestors),
        ];

        for (name, sources) in fields {
            if !sources.is_empty() {
                policy.set(name, sources.join(" "));
            }
        }

        if self.upgrade_insecure_requests {
            policy.set("upgrade-insecure-requests", "");
        }
        if self.require_trusted_types {
            policy.set("require-trusted-types-for", "'script'");
        }

        policy
    }

    pub fn header(&self) -> String {
        self.policy().header()
    }
}
