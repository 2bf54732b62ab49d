//! Inference rules for script resources.

use super::{Confidence, Inference, InferenceContext, RuleInfo, RuleInput};
use crate::resources::ResourceKind;

pub(super) const RULES: &[RuleInfo] = &[
    RuleInfo {
        id: "js-analytics",
        family: "script",
        confidence: Confidence::High,
        description: "Analytics/tracking script sends data back to its collector",
    },
    RuleInfo {
        id: "js-chunks",
        family: "script",
        confidence: Confidence::High,
        description: "JavaScript framework bundle lazy-loads additional chunks",
    },
    RuleInfo {
        id: "js-payment-connect",
        family: "script",
        confidence: Confidence::High,
        description: "Payment processor SDK opens an API connection",
    },
    RuleInfo {
        id: "js-payment-frame",
        family: "script",
        confidence: Confidence::High,
        description: "Payment processor SDK embeds iframes",
    },
    RuleInfo {
        id: "js-social",
        family: "script",
        confidence: Confidence::High,
        description: "Social media widget needs API access to its platform",
    },
    RuleInfo {
        id: "js-polyfill",
        family: "script",
        confidence: Confidence::Medium,
        description: "Polyfill service serves different files per user agent",
    },
];

/// Pattern → connect origin. `None` means the source's own origin.
/// Ordered most-specific first; the first match wins.
const ANALYTICS: &[(&str, Option<&str>)] = &[
    ("google-analytics.com", Some("google-analytics.com")),
    ("googletagmanager.com", Some("google-analytics.com")),
    ("gtag/js", Some("google-analytics.com")),
    ("ga.js", Some("google-analytics.com")),
    ("analytics.js", None),
    ("analytics", None),
];

const BUNDLER_KEYWORDS: &[&str] = &["react", "vue", "angular", "chunk", "bundle"];

/// Domain pattern → API/iframe origin for the processor.
const PAYMENT_PROCESSORS: &[(&str, &str)] = &[
    ("stripe.com", "stripe.com"),
    ("paypal.com", "paypal.com"),
    ("square.com", "square.com"),
    ("braintree.com", "braintreegateway.com"),
];

/// Domain keyword → origins the widget talks to.
const SOCIAL_WIDGETS: &[(&str, &[&str])] = &[
    ("facebook", &["connect.facebook.net", "facebook.com"]),
    ("twitter", &["platform.twitter.com", "twitter.com"]),
    ("linkedin", &["platform.linkedin.com", "linkedin.com"]),
    ("instagram", &["instagram.com"]),
    ("youtube", &["youtube.com"]),
];

pub(super) fn infer(input: &RuleInput, ctx: &mut InferenceContext, out: &mut Vec<Inference>) {
    if input.resource.kind != ResourceKind::Script {
        return;
    }

    if let Some((_, target)) = ANALYTICS.iter().find(|(p, _)| input.url.contains(p)) {
        let origin = target.map(String::from).unwrap_or_else(|| input.domain.clone());
        if ctx.claim(&origin, "js-analytics") {
            out.push(input.emit(
                origin,
                ResourceKind::Connect,
                Confidence::High,
                "Analytics/tracking script needs to send data",
            ));
        }
    }

    if BUNDLER_KEYWORDS.iter().any(|p| input.url.contains(p))
        && ctx.claim(&input.domain, "js-chunks")
    {
        out.push(input.emit(
            input.domain.clone(),
            ResourceKind::Script,
            Confidence::High,
            "JavaScript framework may lazy-load additional chunks",
        ));
    }

    if let Some((_, vendor)) = PAYMENT_PROCESSORS
        .iter()
        .find(|(p, _)| input.domain.contains(p))
    {
        if ctx.claim(vendor, "js-payment-connect") {
            out.push(input.emit(
                *vendor,
                ResourceKind::Connect,
                Confidence::High,
                "Payment processor needs API connection",
            ));
        }
        if ctx.claim(vendor, "js-payment-frame") {
            out.push(input.emit(
                *vendor,
                ResourceKind::Frame,
                Confidence::High,
                "Payment processor may use iframes",
            ));
        }
    }

    if let Some((_, origins)) = SOCIAL_WIDGETS
        .iter()
        .find(|(p, _)| input.domain.contains(p))
    {
        for origin in *origins {
            if ctx.claim(origin, "js-social") {
                out.push(input.emit(
                    *origin,
                    ResourceKind::Connect,
                    Confidence::High,
                    "Social media widget needs API access",
                ));
            }
        }
    }

    if input.url.contains("polyfill") && ctx.claim(&input.domain, "js-polyfill") {
        out.push(input.emit(
            input.domain.clone(),
            ResourceKind::Script,
            Confidence::Medium,
            "Polyfill service may serve different files based on user agent",
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::super::apply;
    use super::*;
    use crate::resources::ExternalResource;
    use pretty_assertions::assert_eq;

    fn script(url: &str) -> ExternalResource {
        ExternalResource::new(ResourceKind::Script, url)
    }

    #[test]
    fn gtag_maps_to_google_analytics() {
        let inferred = apply(&[script("https://www.googletagmanager.com/gtag/js?id=G-X")]);
        let connect: Vec<_> = inferred
            .iter()
            .filter(|i| i.kind == ResourceKind::Connect)
            .collect();
        assert_eq!(connect.len(), 1);
        assert_eq!(connect[0].url, "google-analytics.com");
    }

    #[test]
    fn generic_analytics_keeps_source_origin() {
        let inferred = apply(&[script("https://metrics.example.com/analytics.min.js")]);
        assert!(inferred
            .iter()
            .any(|i| i.kind == ResourceKind::Connect && i.url == "https://metrics.example.com"));
    }

    #[test]
    fn bundle_keyword_infers_chunk_origin() {
        let inferred = apply(&[script("https://cdn.example.com/static/main.bundle.js")]);
        assert!(inferred
            .iter()
            .any(|i| i.kind == ResourceKind::Script && i.url == "https://cdn.example.com"));
    }

    #[test]
    fn braintree_maps_to_gateway_domain() {
        let inferred = apply(&[script("https://js.braintree.com/v3/client.js")]);
        assert!(inferred
            .iter()
            .any(|i| i.url == "braintreegateway.com" && i.kind == ResourceKind::Connect));
    }

    #[test]
    fn social_widget_emits_all_platform_origins() {
        let inferred = apply(&[script("https://connect.facebook.net/en_US/sdk.js")]);
        let urls: Vec<&str> = inferred.iter().map(|i| i.url.as_str()).collect();
        assert!(urls.contains(&"connect.facebook.net"));
        assert!(urls.contains(&"facebook.com"));
    }

    #[test]
    fn polyfill_is_medium_confidence() {
        let inferred = apply(&[script("https://polyfill.io/v3/polyfill.min.js")]);
        let hit = inferred.iter().find(|i| i.url == "https://polyfill.io").unwrap();
        assert_eq!(hit.confidence, Confidence::Medium);
    }

    #[test]
    fn analytics_table_first_match_wins() {
        // url matches both googletagmanager.com and the generic "analytics"
        // fallback would not fire a second time for the same rule anyway
        let inferred = apply(&[script(
            "https://www.googletagmanager.com/analytics/gtag/js",
        )]);
        let connect_count = inferred
            .iter()
            .filter(|i| i.kind == ResourceKind::Connect)
            .count();
        assert_eq!(connect_count, 1);
    }
}
