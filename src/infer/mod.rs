//! Heuristic inference of resources a page will need at runtime.
//!
//! Rules operate on partial, ambiguous string evidence: a stylesheet named
//! `fonts-awesome.css` very likely loads font files, a Stripe script will
//! open an API connection and an iframe. Each rule family is an ordered,
//! closed table; extending the engine means appending entries, never
//! reordering evaluation. Inferences are hints for policy generation, not a
//! security boundary.

mod any;
mod image;
mod script;
mod stylesheet;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::resources::{extract_domain, ExternalResource, ResourceCatalog, ResourceKind};

/// How certain a rule is about its inference. Static per rule: vendor
/// relationships (Google Fonts → fonts.gstatic.com) are high, naming
/// conventions (a CSS framework may bundle fonts) are medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// One inferred resource, never mutated after creation. The triggering
/// resource is recorded for auditability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inference {
    /// Inferred origin or URL (scheme may be absent for vendor domains).
    pub url: String,
    pub kind: ResourceKind,
    pub confidence: Confidence,
    pub reason: String,
    pub source_url: String,
    pub source_kind: ResourceKind,
}

impl Inference {
    /// Convert into a catalog entry, defaulting the scheme to https.
    pub fn to_resource(&self) -> ExternalResource {
        let url = if self.url.starts_with("http://") || self.url.starts_with("https://") {
            self.url.clone()
        } else {
            format!("https://{}", self.url)
        };
        ExternalResource::new(self.kind, url)
    }
}

/// Dedup context threaded through one `apply` invocation.
///
/// Keyed on inferred-domain plus rule identity, so two stylesheets both
/// pointing at Google Fonts yield the fonts.gstatic.com inference exactly
/// once, while different rules may still claim the same domain.
#[derive(Debug, Default)]
pub(crate) struct InferenceContext {
    seen: HashSet<String>,
}

impl InferenceContext {
    /// Returns true the first time a (domain, rule) pair is claimed.
    pub(crate) fn claim(&mut self, domain: &str, rule: &str) -> bool {
        self.seen.insert(format!("{domain}|{rule}"))
    }
}

/// Lower-cased URL plus extracted origin, computed once per resource.
pub(crate) struct RuleInput<'a> {
    pub resource: &'a ExternalResource,
    pub url: String,
    pub domain: String,
}

impl<'a> RuleInput<'a> {
    fn new(resource: &'a ExternalResource) -> Self {
        Self {
            resource,
            url: resource.url.to_lowercase(),
            domain: extract_domain(&resource.url),
        }
    }

    pub(crate) fn emit(
        &self,
        url: impl Into<String>,
        kind: ResourceKind,
        confidence: Confidence,
        reason: impl Into<String>,
    ) -> Inference {
        Inference {
            url: url.into(),
            kind,
            confidence,
            reason: reason.into(),
            source_url: self.resource.url.clone(),
            source_kind: self.resource.kind,
        }
    }
}

/// Run every rule family over the resources in input order and return the
/// deduplicated inference list. Idempotent: re-running over a catalog that
/// already contains the converted inferences produces the same set.
pub fn apply(resources: &[ExternalResource]) -> Vec<Inference> {
    let mut ctx = InferenceContext::default();
    let mut out = Vec::new();

    for resource in resources {
        let input = RuleInput::new(resource);
        stylesheet::infer(&input, &mut ctx, &mut out);
        script::infer(&input, &mut ctx, &mut out);
        image::infer(&input, &mut ctx, &mut out);
        any::infer(&input, &mut ctx, &mut out);
    }

    out
}

/// Convert inferences back into catalog entries.
pub fn merge_into(catalog: &mut ResourceCatalog, inferences: &[Inference]) {
    for inference in inferences {
        catalog.push(inference.to_resource());
    }
}

/// Counts for reporting.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub by_kind: std::collections::BTreeMap<String, usize>,
}

pub fn summarize(inferences: &[Inference]) -> Summary {
    let mut summary = Summary {
        total: inferences.len(),
        ..Default::default()
    };
    for inference in inferences {
        match inference.confidence {
            Confidence::High => summary.high += 1,
            Confidence::Medium => summary.medium += 1,
            Confidence::Low => summary.low += 1,
        }
        *summary.by_kind.entry(inference.kind.to_string()).or_default() += 1;
    }
    summary
}

/// Static description of one rule, for `list-rules` output.
#[derive(Debug, Clone, Serialize)]
pub struct RuleInfo {
    pub id: &'static str,
    pub family: &'static str,
    pub confidence: Confidence,
    pub description: &'static str,
}

/// The closed rule inventory, in evaluation order.
pub fn rule_catalog() -> Vec<RuleInfo> {
    let mut rules = Vec::new();
    rules.extend_from_slice(stylesheet::RULES);
    rules.extend_from_slice(script::RULES);
    rules.extend_from_slice(image::RULES);
    rules.extend_from_slice(any::RULES);
    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stylesheet(url: &str) -> ExternalResource {
        ExternalResource::new(ResourceKind::Stylesheet, url)
    }

    fn script(url: &str) -> ExternalResource {
        ExternalResource::new(ResourceKind::Script, url)
    }

    #[test]
    fn google_fonts_inferred_once_across_two_stylesheets() {
        let resources = vec![
            stylesheet("https://fonts.googleapis.com/css?family=Roboto"),
            stylesheet("https://fonts.googleapis.com/css2?family=Inter"),
        ];
        let inferred = apply(&resources);
        let gstatic: Vec<_> = inferred
            .iter()
            .filter(|i| i.url == "https://fonts.gstatic.com")
            .collect();
        assert_eq!(gstatic.len(), 1);
        assert_eq!(gstatic[0].kind, ResourceKind::Font);
        assert_eq!(gstatic[0].confidence, Confidence::High);
        assert_eq!(
            gstatic[0].source_url,
            "https://fonts.googleapis.com/css?family=Roboto"
        );
    }

    #[test]
    fn font_named_stylesheet_infers_font_origin() {
        let inferred = apply(&[stylesheet("https://example.com/css/fonts-awesome.css")]);
        assert!(inferred
            .iter()
            .any(|i| i.kind == ResourceKind::Font && i.url == "https://example.com"));
    }

    #[test]
    fn payment_script_infers_connect_and_frame() {
        let inferred = apply(&[script("https://js.stripe.com/v3/stripe.js")]);
        let kinds: Vec<ResourceKind> = inferred
            .iter()
            .filter(|i| i.url == "stripe.com")
            .map(|i| i.kind)
            .collect();
        assert!(kinds.contains(&ResourceKind::Connect));
        assert!(kinds.contains(&ResourceKind::Frame));
    }

    #[test]
    fn framework_css_is_medium_confidence() {
        let inferred = apply(&[stylesheet(
            "https://cdn.jsdelivr.net/npm/bootstrap@5.1.3/dist/css/bootstrap.min.css",
        )]);
        let font = inferred
            .iter()
            .find(|i| i.kind == ResourceKind::Font)
            .expect("framework css should infer a font origin");
        assert_eq!(font.confidence, Confidence::Medium);
        assert!(font.reason.contains("bootstrap"));
    }

    #[test]
    fn analytics_script_infers_connect() {
        let inferred = apply(&[script("https://www.googletagmanager.com/gtag/js?id=G-1")]);
        assert!(inferred
            .iter()
            .any(|i| i.kind == ResourceKind::Connect && i.url == "google-analytics.com"));
    }

    #[test]
    fn reapplication_adds_no_new_inferences() {
        let resources = vec![
            stylesheet("https://fonts.googleapis.com/css?family=Roboto"),
            script("https://js.stripe.com/v3/stripe.js"),
            script("https://api.example.com/sdk.js"),
        ];
        let first = apply(&resources);

        let mut extended = resources.clone();
        extended.extend(first.iter().map(Inference::to_resource));
        let second = apply(&extended);

        assert_eq!(first, second);
    }

    #[test]
    fn non_matching_resources_infer_nothing() {
        let inferred = apply(&[
            stylesheet("https://example.com/site.css"),
            script("https://example.com/app.js"),
        ]);
        assert!(inferred.is_empty());
    }

    #[test]
    fn summary_counts_by_confidence_and_kind() {
        let resources = vec![
            stylesheet("https://fonts.googleapis.com/css?family=Roboto"),
            stylesheet("https://cdn.example.com/bootstrap.min.css"),
        ];
        // the Google Fonts URL triggers both the font-keyword rule and the
        // fonts.gstatic.com vendor rule
        let summary = summarize(&apply(&resources));
        assert_eq!(summary.total, 3);
        assert_eq!(summary.high, 2);
        assert_eq!(summary.medium, 1);
        assert_eq!(summary.by_kind.get("font"), Some(&3));
    }

    #[test]
    fn rule_catalog_is_nonempty_and_unique() {
        let rules = rule_catalog();
        assert!(rules.len() >= 14);
        let ids: HashSet<&str> = rules.iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), rules.len());
    }

    #[test]
    fn conversion_defaults_scheme_to_https() {
        let inference = Inference {
            url: "google-analytics.com".into(),
            kind: ResourceKind::Connect,
            confidence: Confidence::High,
            reason: "test".into(),
            source_url: "https://a.com/x.js".into(),
            source_kind: ResourceKind::Script,
        };
        let resource = inference.to_resource();
        assert_eq!(resource.url, "https://google-analytics.com");
        assert_eq!(resource.domain, "https://google-analytics.com");
    }
}
