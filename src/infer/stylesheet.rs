//! Inference rules for stylesheet resources.

use super::{Confidence, Inference, InferenceContext, RuleInfo, RuleInput};
use crate::resources::ResourceKind;

pub(super) const RULES: &[RuleInfo] = &[
    RuleInfo {
        id: "css-font-name",
        family: "stylesheet",
        confidence: Confidence::High,
        description: "Stylesheet with 'font' in its name loads fonts from its origin",
    },
    RuleInfo {
        id: "css-google-fonts",
        family: "stylesheet",
        confidence: Confidence::High,
        description: "Google Fonts CSS always loads font files from fonts.gstatic.com",
    },
    RuleInfo {
        id: "css-icon-font",
        family: "stylesheet",
        confidence: Confidence::High,
        description: "Icon font library CSS loads fonts from its origin",
    },
    RuleInfo {
        id: "css-framework-fonts",
        family: "stylesheet",
        confidence: Confidence::Medium,
        description: "CSS framework may bundle custom fonts",
    },
    RuleInfo {
        id: "css-cdn-connect",
        family: "stylesheet",
        confidence: Confidence::Medium,
        description: "CDN-hosted CSS may dynamically load additional resources",
    },
];

const GOOGLE_FONTS_STATIC: &str = "https://fonts.gstatic.com";

const ICON_FONT_LIBS: &[&str] = &[
    "fontawesome",
    "font-awesome",
    "material-icons",
    "icomoon",
    "glyphicons",
];

const CSS_FRAMEWORKS: &[&str] = &["bootstrap", "foundation", "bulma", "tailwind"];

const STYLE_CDNS: &[&str] = &["cdn.jsdelivr.net", "unpkg.com", "cdnjs.cloudflare.com"];

pub(super) fn infer(input: &RuleInput, ctx: &mut InferenceContext, out: &mut Vec<Inference>) {
    if input.resource.kind != ResourceKind::Stylesheet {
        return;
    }

    if input.url.contains("font") && ctx.claim(&input.domain, "css-font-name") {
        out.push(input.emit(
            input.domain.clone(),
            ResourceKind::Font,
            Confidence::High,
            "Stylesheet name contains 'font' keyword",
        ));
    }

    if input.domain.contains("fonts.googleapis.com")
        && ctx.claim(GOOGLE_FONTS_STATIC, "css-google-fonts")
    {
        out.push(input.emit(
            GOOGLE_FONTS_STATIC,
            ResourceKind::Font,
            Confidence::High,
            "Google Fonts CSS always loads from fonts.gstatic.com",
        ));
    }

    if let Some(lib) = ICON_FONT_LIBS.iter().find(|p| input.url.contains(**p)) {
        if ctx.claim(&input.domain, "css-icon-font") {
            out.push(input.emit(
                input.domain.clone(),
                ResourceKind::Font,
                Confidence::High,
                format!("Icon font library detected ({lib})"),
            ));
        }
    }

    if let Some(framework) = CSS_FRAMEWORKS.iter().find(|p| input.url.contains(**p)) {
        if ctx.claim(&input.domain, "css-framework-fonts") {
            out.push(input.emit(
                input.domain.clone(),
                ResourceKind::Font,
                Confidence::Medium,
                format!("CSS framework may include custom fonts ({framework})"),
            ));
        }
    }

    if STYLE_CDNS.iter().any(|p| input.domain.contains(p)) && ctx.claim(&input.domain, "css-cdn-connect")
    {
        out.push(input.emit(
            input.domain.clone(),
            ResourceKind::Connect,
            Confidence::Medium,
            "CDN may dynamically load additional resources",
        ));
    }
}
