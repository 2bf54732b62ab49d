//! Type-agnostic inference rules, applied to every resource.

use super::{Confidence, Inference, InferenceContext, RuleInfo, RuleInput};
use crate::resources::ResourceKind;

pub(super) const RULES: &[RuleInfo] = &[RuleInfo {
    id: "any-api",
    family: "any",
    confidence: Confidence::High,
    description: "API-looking URL implies a connect-src origin",
}];

const API_PATTERNS: &[&str] = &["api.", "/api/", "graphql", "rest"];

pub(super) fn infer(input: &RuleInput, ctx: &mut InferenceContext, out: &mut Vec<Inference>) {
    let looks_like_api = API_PATTERNS.iter().any(|p| input.url.contains(p))
        || input.domain.contains("api.");

    if looks_like_api && ctx.claim(&input.domain, "any-api") {
        out.push(input.emit(
            input.domain.clone(),
            ResourceKind::Connect,
            Confidence::High,
            "API endpoint detected",
        ));
    }
}
