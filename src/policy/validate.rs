//! Read-only policy analysis.
//!
//! The validator never blocks: apart from the structurally-empty case every
//! header is "valid", and each independent check contributes advisory
//! warnings. Callers decide whether a warning halts their pipeline.

use serde::{Deserialize, Serialize};

use super::Policy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub severity: Severity,
    pub message: String,
    pub fix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_clean(&self) -> bool {
        self.valid && self.warnings.is_empty()
    }
}

const HASH_PREFIXES: [&str; 3] = ["'sha256-", "'sha384-", "'sha512-"];

/// Validate a CSP header and report misconfigurations.
///
/// An empty header is the only structurally invalid input. All checks run
/// unconditionally; warnings accumulate and never short-circuit.
pub fn validate(header: &str) -> ValidationResult {
    if header.trim().is_empty() {
        return ValidationResult {
            valid: false,
            warnings: vec![ValidationWarning {
                severity: Severity::Error,
                message: "CSP header is empty".into(),
                fix: "Provide a valid CSP header string".into(),
            }],
        };
    }

    let policy = Policy::parse(header);
    let mut warnings = Vec::new();

    check_unsafe_inline_with_hashes(&policy, &mut warnings);
    check_unsafe_eval(&policy, &mut warnings);
    check_missing_default_src(&policy, &mut warnings);
    check_overly_permissive(&policy, &mut warnings);
    check_deprecated_directives(&policy, &mut warnings);
    check_orphaned_attr_directives(&policy, &mut warnings);

    ValidationResult {
        valid: true,
        warnings,
    }
}

fn check_unsafe_inline_with_hashes(policy: &Policy, warnings: &mut Vec<ValidationWarning>) {
    for directive in ["script-src", "style-src"] {
        let Some(value) = policy.get(directive) else {
            continue;
        };
        let has_unsafe_inline = value.contains("'unsafe-inline'");
        let has_hashes = HASH_PREFIXES.iter().any(|p| value.contains(p));
        if has_unsafe_inline && has_hashes {
            warnings.push(ValidationWarning {
                severity: Severity::Warning,
                message: format!("{directive} contains both 'unsafe-inline' and hash values"),
                fix: format!(
                    "Remove 'unsafe-inline' from {directive} - hashes are ignored when \
                     'unsafe-inline' is present"
                ),
            });
        }
    }
}

fn check_unsafe_eval(policy: &Policy, warnings: &mut Vec<ValidationWarning>) {
    if let Some(value) = policy.get("script-src") {
        if value.contains("'unsafe-eval'") {
            warnings.push(ValidationWarning {
                severity: Severity::Warning,
                message: "script-src contains 'unsafe-eval' which allows dangerous eval() usage"
                    .into(),
                fix: "Remove 'unsafe-eval' if possible and refactor code to avoid eval(), \
                      Function(), setTimeout(string), etc."
                    .into(),
            });
        }
    }
}

fn check_missing_default_src(policy: &Policy, warnings: &mut Vec<ValidationWarning>) {
    if !policy.contains("default-src") {
        warnings.push(ValidationWarning {
            severity: Severity::Warning,
            message: "Missing 'default-src' directive".into(),
            fix: "Add 'default-src' as a fallback for other directives \
                  (recommended: default-src 'self')"
                .into(),
        });
    }
}

fn check_overly_permissive(policy: &Policy, warnings: &mut Vec<ValidationWarning>) {
    for directive in [
        "default-src",
        "script-src",
        "style-src",
        "img-src",
        "connect-src",
    ] {
        let Some(value) = policy.get(directive) else {
            continue;
        };

        // scheme-qualified https://* is tolerated; a bare * is not
        if value.contains('*') && !value.contains("https://*") {
            warnings.push(ValidationWarning {
                severity: Severity::Warning,
                message: format!(
                    "{directive} contains wildcard '*' which allows resources from any origin"
                ),
                fix: format!("Restrict {directive} to specific domains or use 'self'"),
            });
        }

        if directive == "script-src" && value.contains("data:") {
            warnings.push(ValidationWarning {
                severity: Severity::Warning,
                message: "script-src allows 'data:' URIs which can be exploited".into(),
                fix: "Remove 'data:' from script-src if not absolutely necessary".into(),
            });
        }
    }
}

fn check_deprecated_directives(policy: &Policy, warnings: &mut Vec<ValidationWarning>) {
    let deprecated = [
        (
            "block-all-mixed-content",
            "Use 'upgrade-insecure-requests' instead, or handle via HTTPS",
        ),
        (
            "plugin-types",
            "Deprecated - plugins are no longer supported in modern browsers",
        ),
        ("referrer", "Use the Referrer-Policy header instead"),
    ];

    for (directive, suggestion) in deprecated {
        if policy.contains(directive) {
            warnings.push(ValidationWarning {
                severity: Severity::Warning,
                message: format!("'{directive}' is deprecated"),
                fix: suggestion.into(),
            });
        }
    }
}

fn check_orphaned_attr_directives(policy: &Policy, warnings: &mut Vec<ValidationWarning>) {
    for (attr, base) in [
        ("style-src-attr", "style-src"),
        ("script-src-attr", "script-src"),
    ] {
        if policy.contains(attr) && !policy.contains(base) {
            warnings.push(ValidationWarning {
                severity: Severity::Warning,
                message: format!("'{attr}' is defined but '{base}' is not"),
                fix: format!("Consider adding '{base}' as it acts as fallback for '{attr}'"),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_header_is_invalid() {
        let result = validate("");
        assert!(!result.valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].severity, Severity::Error);
    }

    #[test]
    fn clean_policy_has_no_warnings() {
        let result = validate("default-src 'self'; object-src 'none'");
        assert!(result.valid);
        assert!(result.warnings.is_empty());
        assert!(result.is_clean());
    }

    #[test]
    fn unsafe_inline_with_hashes_plus_missing_default_src() {
        let result = validate("script-src 'self' 'unsafe-inline' 'sha256-abc'");
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 2);
        assert!(result.warnings[0]
            .message
            .contains("both 'unsafe-inline' and hash values"));
        assert!(result.warnings[1].message.contains("Missing 'default-src'"));
    }

    #[test]
    fn unsafe_inline_without_hashes_not_flagged() {
        let result = validate("default-src 'self'; script-src 'self' 'unsafe-inline'");
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn unsafe_eval_flagged() {
        let result = validate("default-src 'self'; script-src 'self' 'unsafe-eval'");
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].message.contains("'unsafe-eval'"));
    }

    #[test]
    fn bare_wildcard_flagged() {
        let result = validate("default-src *");
        let wildcard = result
            .warnings
            .iter()
            .filter(|w| w.message.contains("wildcard"))
            .count();
        assert_eq!(wildcard, 1);
    }

    #[test]
    fn https_scheme_wildcard_exempt() {
        let result = validate("default-src https://*.example.com https://*");
        assert!(result.warnings.iter().all(|w| !w.message.contains("wildcard")));
    }

    #[test]
    fn data_in_script_src_flagged() {
        let result = validate("default-src 'self'; script-src data:");
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].message.contains("'data:'"));
    }

    #[test]
    fn data_in_img_src_not_flagged() {
        let result = validate("default-src 'self'; img-src data:");
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn deprecated_directives_flagged() {
        let result = validate("default-src 'self'; block-all-mixed-content; plugin-types app/x");
        assert_eq!(result.warnings.len(), 2);
        assert!(result.warnings.iter().all(|w| w.message.contains("deprecated")));
    }

    #[test]
    fn orphaned_attr_directive_flagged() {
        let result = validate("default-src 'self'; style-src-attr 'unsafe-hashes'");
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].message.contains("'style-src-attr'"));
    }

    #[test]
    fn attr_directive_with_base_not_flagged() {
        let result =
            validate("default-src 'self'; style-src 'self'; style-src-attr 'unsafe-hashes'");
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn warnings_accumulate_across_checks() {
        let result = validate("script-src * 'unsafe-eval' data:; referrer origin");
        // wildcard + unsafe-eval + data: + missing default-src + deprecated
        assert_eq!(result.warnings.len(), 5);
        assert!(result.valid);
    }
}
