//! Domain injection from a resource catalog and explicit add/remove
//! modifications.

use serde::{Deserialize, Serialize};

use super::{union_tokens, Policy};
use crate::error::{CspError, Result};
use crate::resources::{ResourceCatalog, ResourceKind};

/// Union a catalog's per-kind domain sets into the matching directives.
///
/// A directive absent from the policy is seeded from `default-src` when one
/// exists, so the new origins extend the fallback rather than replacing it.
/// When data: URLs were recorded for images or fonts, the `data:` token is
/// guaranteed in `img-src`/`font-src`.
pub fn merge_catalog(policy: &mut Policy, catalog: &ResourceCatalog) {
    if catalog.data_uris.images {
        merge_into_directive(policy, "img-src", &["data:".to_string()]);
    }
    if catalog.data_uris.fonts {
        merge_into_directive(policy, "font-src", &["data:".to_string()]);
    }

    // `Other` covers the connect kind as well; both feed connect-src.
    for kind in [
        ResourceKind::Script,
        ResourceKind::Stylesheet,
        ResourceKind::Image,
        ResourceKind::Font,
        ResourceKind::Frame,
        ResourceKind::Other,
    ] {
        let domains = catalog.domains_for(kind);
        merge_into_directive(policy, kind.directive(), &domains);
    }
}

fn merge_into_directive(policy: &mut Policy, directive: &str, domains: &[String]) {
    if domains.is_empty() {
        return;
    }
    if policy.contains(directive) {
        policy.append_tokens(directive, domains);
    } else if let Some(fallback) = policy.get("default-src").map(str::to_string) {
        policy.set(directive, union_tokens(&fallback, domains));
    } else {
        policy.set(directive, union_tokens("", domains));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModAction {
    Add,
    Remove,
}

/// One explicit directive edit. Modifications apply strictly in the order
/// given; interleaving adds and removes of the same token is meaningful.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modification {
    pub action: ModAction,
    pub directive: String,
    pub value: String,
}

impl Modification {
    /// Parse the CLI shorthand `add:<directive>:<value>` /
    /// `remove:<directive>:<value>`. The value may itself contain colons.
    pub fn parse(spec: &str) -> Result<Self> {
        let mut parts = spec.splitn(3, ':');
        let action = match parts.next() {
            Some("add") => ModAction::Add,
            Some("remove") => ModAction::Remove,
            _ => return Err(CspError::Modification(spec.to_string())),
        };
        let directive = parts
            .next()
            .filter(|d| !d.is_empty())
            .ok_or_else(|| CspError::Modification(spec.to_string()))?;
        let value = parts
            .next()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| CspError::Modification(spec.to_string()))?;

        Ok(Self {
            action,
            directive: directive.to_string(),
            value: value.to_string(),
        })
    }
}

/// Apply an ordered list of add/remove token edits.
///
/// Adding an already-present token is a no-op; removing the last remaining
/// token deletes the directive entirely rather than leaving it empty.
pub fn apply_modifications(policy: &mut Policy, modifications: &[Modification]) {
    for modification in modifications {
        match modification.action {
            ModAction::Add => {
                policy.append_tokens(&modification.directive, &[modification.value.as_str()]);
            }
            ModAction::Remove => {
                let Some(existing) = policy.get(&modification.directive) else {
                    continue;
                };
                let remaining: Vec<&str> = existing
                    .split_whitespace()
                    .filter(|t| *t != modification.value)
                    .collect();
                if remaining.is_empty() {
                    policy.remove(&modification.directive);
                } else {
                    policy.set(&modification.directive, remaining.join(" "));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::ExternalResource;
    use pretty_assertions::assert_eq;

    fn catalog_with(kind: ResourceKind, urls: &[&str]) -> ResourceCatalog {
        let mut catalog = ResourceCatalog::default();
        for url in urls {
            catalog.push(ExternalResource::new(kind, *url));
        }
        catalog
    }

    #[test]
    fn domains_append_to_existing_directive() {
        let mut policy = Policy::parse("script-src 'self'");
        let catalog = catalog_with(ResourceKind::Script, &["https://cdn.example.com/a.js"]);
        merge_catalog(&mut policy, &catalog);
        assert_eq!(
            policy.get("script-src"),
            Some("'self' https://cdn.example.com")
        );
    }

    #[test]
    fn missing_directive_seeded_from_default_src() {
        let mut policy = Policy::parse("default-src 'self'");
        let catalog = catalog_with(ResourceKind::Image, &["https://img.example.com/x.png"]);
        merge_catalog(&mut policy, &catalog);
        assert_eq!(policy.get("img-src"), Some("'self' https://img.example.com"));
        assert_eq!(policy.get("default-src"), Some("'self'"));
    }

    #[test]
    fn missing_directive_without_default_src_created_bare() {
        let mut policy = Policy::new();
        let catalog = catalog_with(ResourceKind::Font, &["https://fonts.gstatic.com/f.woff2"]);
        merge_catalog(&mut policy, &catalog);
        assert_eq!(policy.get("font-src"), Some("https://fonts.gstatic.com"));
    }

    #[test]
    fn other_domains_feed_connect_src() {
        let mut policy = Policy::new();
        let catalog = catalog_with(ResourceKind::Other, &["https://api.example.com/v1"]);
        merge_catalog(&mut policy, &catalog);
        assert_eq!(policy.get("connect-src"), Some("https://api.example.com"));
    }

    #[test]
    fn data_uri_flags_force_data_token() {
        let mut policy = Policy::parse("default-src 'self'; img-src 'self'");
        let mut catalog = ResourceCatalog::default();
        catalog.mark_data_uri(ResourceKind::Image);
        catalog.mark_data_uri(ResourceKind::Font);
        merge_catalog(&mut policy, &catalog);
        assert_eq!(policy.get("img-src"), Some("'self' data:"));
        // font-src seeded from default-src
        assert_eq!(policy.get("font-src"), Some("'self' data:"));
    }

    #[test]
    fn data_token_not_duplicated() {
        let mut policy = Policy::parse("img-src data:");
        let mut catalog = ResourceCatalog::default();
        catalog.mark_data_uri(ResourceKind::Image);
        merge_catalog(&mut policy, &catalog);
        assert_eq!(policy.get("img-src"), Some("data:"));
    }

    #[test]
    fn duplicate_domains_merge_once() {
        let mut policy = Policy::parse("script-src https://cdn.example.com");
        let catalog = catalog_with(
            ResourceKind::Script,
            &[
                "https://cdn.example.com/a.js",
                "https://cdn.example.com/b.js",
            ],
        );
        merge_catalog(&mut policy, &catalog);
        assert_eq!(policy.get("script-src"), Some("https://cdn.example.com"));
    }

    #[test]
    fn modification_parse_accepts_colons_in_value() {
        let m = Modification::parse("add:img-src:data:").unwrap();
        assert_eq!(m.action, ModAction::Add);
        assert_eq!(m.directive, "img-src");
        assert_eq!(m.value, "data:");
    }

    #[test]
    fn modification_parse_rejects_garbage() {
        assert!(Modification::parse("frobnicate:script-src:'self'").is_err());
        assert!(Modification::parse("add:script-src").is_err());
        assert!(Modification::parse("add::x").is_err());
    }

    #[test]
    fn add_then_remove_applies_in_order() {
        let mut policy = Policy::parse("script-src 'self'");
        apply_modifications(
            &mut policy,
            &[
                Modification {
                    action: ModAction::Add,
                    directive: "script-src".into(),
                    value: "https://example.com".into(),
                },
                Modification {
                    action: ModAction::Remove,
                    directive: "script-src".into(),
                    value: "'self'".into(),
                },
            ],
        );
        assert_eq!(policy.get("script-src"), Some("https://example.com"));
    }

    #[test]
    fn add_duplicate_is_noop() {
        let mut policy = Policy::parse("script-src 'self'");
        apply_modifications(
            &mut policy,
            &[Modification {
                action: ModAction::Add,
                directive: "script-src".into(),
                value: "'self'".into(),
            }],
        );
        assert_eq!(policy.get("script-src"), Some("'self'"));
    }

    #[test]
    fn remove_missing_value_is_noop() {
        let mut policy = Policy::parse("script-src 'self'");
        apply_modifications(
            &mut policy,
            &[Modification {
                action: ModAction::Remove,
                directive: "script-src".into(),
                value: "https://example.com".into(),
            }],
        );
        assert_eq!(policy.get("script-src"), Some("'self'"));
    }

    #[test]
    fn removing_last_value_deletes_directive() {
        let mut policy = Policy::parse("script-src 'self'");
        apply_modifications(
            &mut policy,
            &[Modification {
                action: ModAction::Remove,
                directive: "script-src".into(),
                value: "'self'".into(),
            }],
        );
        assert!(!policy.contains("script-src"));
        assert_eq!(policy.header(), "");
    }
}
