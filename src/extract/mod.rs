//! HTML/CSS extraction: inline executable/style content and typed external
//! resource references.
//!
//! Extraction is deliberately literal. Inline bodies are captured byte for
//! byte because the hashing collaborator must see the exact content the
//! browser will hash; no whitespace normalization happens here.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::Result;
use crate::resources::{ExternalResource, ResourceCatalog, ResourceKind};

/// Which inline content classes to collect.
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    pub scripts: bool,
    pub styles: bool,
    pub style_attrs: bool,
    pub event_handlers: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            scripts: true,
            styles: true,
            style_attrs: true,
            event_handlers: true,
        }
    }
}

/// Inline content pulled out of one document.
#[derive(Debug, Clone, Default)]
pub struct InlineContent {
    /// `<script>` bodies without a `src`, plus event-handler attribute values.
    pub scripts: Vec<String>,
    /// `<style>` tag bodies.
    pub style_tags: Vec<String>,
    /// `style="..."` attribute values.
    pub style_attrs: Vec<String>,
    pub has_event_handlers: bool,
}

/// Event-handler attributes captured as script content. Hashing them only
/// helps together with `'unsafe-hashes'`, which the policy merger adds.
const EVENT_HANDLER_ATTRS: &[&str] = &[
    "onclick", "ondblclick", "onmousedown", "onmouseup", "onmouseover",
    "onmousemove", "onmouseout", "onmouseenter", "onmouseleave",
    "onload", "onunload", "onbeforeunload",
    "onchange", "onsubmit", "onreset", "oninput", "oninvalid",
    "onfocus", "onblur", "onfocusin", "onfocusout",
    "onkeydown", "onkeyup", "onkeypress",
    "onerror", "onabort",
    "onscroll", "onresize",
    "oncontextmenu",
    "ondrag", "ondragstart", "ondragend", "ondragenter", "ondragleave",
    "ondragover", "ondrop",
    "onwheel",
    "ontouchstart", "ontouchmove", "ontouchend", "ontouchcancel",
    "onplay", "onpause", "onended", "onvolumechange",
    "oncanplay", "oncanplaythrough", "ondurationchange", "onloadeddata",
    "onloadedmetadata", "onprogress", "onseeked", "onseeking", "onstalled",
    "onsuspend", "ontimeupdate", "onwaiting",
    "onanimationstart", "onanimationend", "onanimationiteration",
    "ontransitionend",
];

fn is_event_handler(attr: &str) -> bool {
    let lower = attr.to_lowercase();
    EVENT_HANDLER_ATTRS.contains(&lower.as_str())
}

static ALL_ELEMENTS: Lazy<Selector> = Lazy::new(|| Selector::parse("*").unwrap());
static SCRIPT_TAGS: Lazy<Selector> = Lazy::new(|| Selector::parse("script").unwrap());
static STYLE_TAGS: Lazy<Selector> = Lazy::new(|| Selector::parse("style").unwrap());
static IMG_TAGS: Lazy<Selector> = Lazy::new(|| Selector::parse("img[src]").unwrap());
static LINK_TAGS: Lazy<Selector> = Lazy::new(|| Selector::parse("link[href]").unwrap());
static FRAME_TAGS: Lazy<Selector> = Lazy::new(|| Selector::parse("iframe[src], frame[src]").unwrap());
static EMBED_TAGS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("object[data], embed[src], source[src]").unwrap());

/// `url(...)` occurrences inside CSS text.
static CSS_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"url\(\s*['"]?([^'")]+?)['"]?\s*\)"#).unwrap());

/// `@import "..."` / `@import url(...)` occurrences.
static CSS_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"@import\s+(?:url\(\s*)?['"]?([^'")\s;]+)"#).unwrap());

/// Extract inline content from an HTML document.
pub fn extract_inline(html: &str, opts: &ExtractOptions) -> InlineContent {
    let document = Html::parse_document(html);
    let mut content = InlineContent::default();

    if opts.scripts {
        for element in document.select(&SCRIPT_TAGS) {
            if element.value().attr("src").is_none() {
                content.scripts.push(element.text().collect());
            }
        }
    }

    if opts.styles {
        for element in document.select(&STYLE_TAGS) {
            content.style_tags.push(element.text().collect());
        }
    }

    for element in document.select(&ALL_ELEMENTS) {
        for (name, value) in element.value().attrs() {
            if opts.event_handlers && is_event_handler(name) {
                content.scripts.push(value.to_string());
                content.has_event_handlers = true;
            } else if opts.style_attrs && name.eq_ignore_ascii_case("style") {
                content.style_attrs.push(value.to_string());
            }
        }
    }

    content
}

/// Extract typed external resource references from an HTML document,
/// including `url()`/`@import` targets inside inline CSS.
pub fn extract_resources(html: &str) -> ResourceCatalog {
    let document = Html::parse_document(html);
    let mut catalog = ResourceCatalog::default();

    for element in document.select(&SCRIPT_TAGS) {
        if let Some(src) = element.value().attr("src") {
            record(&mut catalog, ResourceKind::Script, src);
        }
    }

    for element in document.select(&LINK_TAGS) {
        let href = element.value().attr("href").unwrap_or("");
        record(&mut catalog, classify_link(&element), href);
    }

    for element in document.select(&IMG_TAGS) {
        if let Some(src) = element.value().attr("src") {
            record(&mut catalog, ResourceKind::Image, src);
        }
        if let Some(srcset) = element.value().attr("srcset") {
            for candidate in srcset.split(',') {
                if let Some(url) = candidate.trim().split_whitespace().next() {
                    record(&mut catalog, ResourceKind::Image, url);
                }
            }
        }
    }

    for element in document.select(&FRAME_TAGS) {
        if let Some(src) = element.value().attr("src") {
            record(&mut catalog, ResourceKind::Frame, src);
        }
    }

    for element in document.select(&EMBED_TAGS) {
        let value = element.value();
        if let Some(url) = value.attr("data").or_else(|| value.attr("src")) {
            record(&mut catalog, ResourceKind::Other, url);
        }
    }

    for element in document.select(&STYLE_TAGS) {
        let css: String = element.text().collect();
        scan_css(&mut catalog, &css);
    }
    for element in document.select(&ALL_ELEMENTS) {
        if let Some(style) = element.value().attr("style") {
            scan_css(&mut catalog, style);
        }
    }

    catalog
}

/// Read a file and extract both inline content and resources.
pub fn extract_file(path: &Path, opts: &ExtractOptions) -> Result<(InlineContent, ResourceCatalog)> {
    let html = std::fs::read_to_string(path)?;
    let inline = extract_inline(&html, opts);
    let catalog = extract_resources(&html);
    tracing::debug!(
        file = %path.display(),
        scripts = inline.scripts.len(),
        style_tags = inline.style_tags.len(),
        style_attrs = inline.style_attrs.len(),
        resources = catalog.len(),
        "extracted document"
    );
    Ok((inline, catalog))
}

fn classify_link(element: &ElementRef) -> ResourceKind {
    let rel = element.value().attr("rel").unwrap_or("").to_lowercase();
    let as_attr = element.value().attr("as").unwrap_or("").to_lowercase();

    if rel.contains("stylesheet") || as_attr == "style" {
        ResourceKind::Stylesheet
    } else if as_attr == "font" {
        ResourceKind::Font
    } else if as_attr == "script" {
        ResourceKind::Script
    } else if rel.contains("icon") || as_attr == "image" {
        ResourceKind::Image
    } else {
        ResourceKind::Other
    }
}

fn record(catalog: &mut ResourceCatalog, kind: ResourceKind, url: &str) {
    let url = url.trim();
    if url.is_empty() {
        return;
    }
    if url.starts_with("data:") {
        catalog.mark_data_uri(data_uri_class(url, kind));
        return;
    }
    catalog.push(ExternalResource::new(kind, url));
}

fn scan_css(catalog: &mut ResourceCatalog, css: &str) {
    for capture in CSS_IMPORT.captures_iter(css) {
        record(catalog, ResourceKind::Stylesheet, &capture[1]);
    }
    for capture in CSS_URL.captures_iter(css) {
        let url = capture[1].trim();
        // @import url(...) is already recorded as a stylesheet
        if CSS_IMPORT
            .captures_iter(css)
            .any(|import| &import[1] == url)
        {
            continue;
        }
        record(catalog, classify_css_url(url), url);
    }
}

fn classify_css_url(url: &str) -> ResourceKind {
    if url.starts_with("data:") {
        return if url[5..].split(&[';', ','][..]).next().unwrap_or("").contains("font") {
            ResourceKind::Font
        } else {
            ResourceKind::Image
        };
    }
    let path = url.split(&['?', '#'][..]).next().unwrap_or(url).to_lowercase();
    const FONT_EXTENSIONS: &[&str] = &[".woff2", ".woff", ".ttf", ".otf", ".eot"];
    if FONT_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        ResourceKind::Font
    } else {
        ResourceKind::Image
    }
}

fn data_uri_class(url: &str, fallback: ResourceKind) -> ResourceKind {
    let mime = url[5..].split(&[';', ','][..]).next().unwrap_or("");
    if mime.contains("font") {
        ResourceKind::Font
    } else if mime.starts_with("image/") {
        ResourceKind::Image
    } else {
        fallback
    }
}
