//! Inference rules for image resources.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Confidence, Inference, InferenceContext, RuleInfo, RuleInput};
use crate::resources::ResourceKind;

pub(super) const RULES: &[RuleInfo] = &[
    RuleInfo {
        id: "img-cdn",
        family: "image",
        confidence: Confidence::High,
        description: "Image CDN origin likely serves further images",
    },
    RuleInfo {
        id: "img-responsive",
        family: "image",
        confidence: Confidence::High,
        description: "Responsive-variant naming implies sibling image files",
    },
    RuleInfo {
        id: "img-ugc",
        family: "image",
        confidence: Confidence::Medium,
        description: "Avatar/profile paths imply user-generated image content",
    },
];

const IMAGE_CDNS: &[&str] = &[
    "cloudinary",
    "imgix",
    "cloudflare",
    "fastly",
    "akamai",
    "cloudfront",
];

static RESPONSIVE_VARIANT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[-_@](xs|sm|md|lg|xl|[0-9]+x|2x|3x|retina)|@[0-9]x").unwrap()
});

const UGC_PATHS: &[&str] = &["/avatar", "/profile", "/user", "/photo"];

pub(super) fn infer(input: &RuleInput, ctx: &mut InferenceContext, out: &mut Vec<Inference>) {
    if input.resource.kind != ResourceKind::Image {
        return;
    }

    if IMAGE_CDNS.iter().any(|p| input.domain.contains(p)) && ctx.claim(&input.domain, "img-cdn") {
        out.push(input.emit(
            input.domain.clone(),
            ResourceKind::Image,
            Confidence::High,
            "CDN domain likely serves multiple images",
        ));
    }

    if RESPONSIVE_VARIANT.is_match(&input.url) && ctx.claim(&input.domain, "img-responsive") {
        out.push(input.emit(
            input.domain.clone(),
            ResourceKind::Image,
            Confidence::High,
            "Responsive image pattern detected, likely has multiple variants",
        ));
    }

    if UGC_PATHS.iter().any(|p| input.url.contains(p)) && ctx.claim(&input.domain, "img-ugc") {
        out.push(input.emit(
            input.domain.clone(),
            ResourceKind::Image,
            Confidence::Medium,
            "User-generated content pattern detected",
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::super::apply;
    use super::*;
    use crate::resources::ExternalResource;
    use pretty_assertions::assert_eq;

    fn image(url: &str) -> ExternalResource {
        ExternalResource::new(ResourceKind::Image, url)
    }

    #[test]
    fn image_cdn_infers_image_origin() {
        let inferred = apply(&[image("https://res.cloudinary.com/demo/image/upload/x.jpg")]);
        assert_eq!(inferred.len(), 1);
        assert_eq!(inferred[0].url, "https://res.cloudinary.com");
        assert_eq!(inferred[0].kind, ResourceKind::Image);
    }

    #[test]
    fn responsive_variants_detected() {
        for url in [
            "https://example.com/hero-2x.png",
            "https://example.com/hero@3x.png",
            "https://example.com/banner_lg.jpg",
        ] {
            let inferred = apply(&[image(url)]);
            assert!(
                inferred.iter().any(|i| i.reason.contains("Responsive")),
                "expected responsive inference for {url}"
            );
        }
    }

    #[test]
    fn plain_image_name_is_not_responsive() {
        let inferred = apply(&[image("https://example.com/logo.png")]);
        assert!(inferred.is_empty());
    }

    #[test]
    fn avatar_path_is_medium_confidence() {
        let inferred = apply(&[image("https://example.com/avatars/42.png")]);
        assert_eq!(inferred.len(), 1);
        assert_eq!(inferred[0].confidence, Confidence::Medium);
    }

    #[test]
    fn same_cdn_claimed_once() {
        let inferred = apply(&[
            image("https://d1.cloudfront.net/a-2x.png"),
            image("https://d1.cloudfront.net/b-2x.png"),
        ]);
        let cdn_count = inferred.iter().filter(|i| i.reason.contains("CDN")).count();
        assert_eq!(cdn_count, 1);
    }
}
