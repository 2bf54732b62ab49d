//! External resource taxonomy and the origin extractor.
//!
//! The catalog is filled by the HTML/CSS extractor and augmented by the
//! inference engine; the policy merger only ever sees its domain queries,
//! which are sorted and deduplicated regardless of insertion order.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use url::Url;

/// Classification of a discovered external reference.
///
/// `Connect` is the kind produced by inference rules for XHR/fetch targets;
/// it shares the catalog's `other` list, and both feed `connect-src`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Script,
    Stylesheet,
    Image,
    Font,
    Frame,
    Connect,
    Other,
}

impl ResourceKind {
    /// The CSP directive this kind of resource is allowed through.
    pub fn directive(&self) -> &'static str {
        match self {
            Self::Script => "script-src",
            Self::Stylesheet => "style-src",
            Self::Image => "img-src",
            Self::Font => "font-src",
            Self::Frame => "frame-src",
            Self::Connect | Self::Other => "connect-src",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Script => write!(f, "script"),
            Self::Stylesheet => write!(f, "stylesheet"),
            Self::Image => write!(f, "image"),
            Self::Font => write!(f, "font"),
            Self::Frame => write!(f, "frame"),
            Self::Connect => write!(f, "connect"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// A single external reference discovered in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalResource {
    pub kind: ResourceKind,
    pub url: String,
    /// Normalized origin, empty when the URL is not externally addressable.
    pub domain: String,
}

impl ExternalResource {
    pub fn new(kind: ResourceKind, url: impl Into<String>) -> Self {
        let url = url.into();
        let domain = extract_domain(&url);
        Self { kind, url, domain }
    }
}

/// Data-URI usage flags per resource class.
///
/// Only the image and font classes matter to the merger: they decide whether
/// the `data:` token is forced into `img-src`/`font-src`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataUriUsage {
    pub images: bool,
    pub fonts: bool,
}

/// Typed container of discovered external resources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceCatalog {
    pub scripts: Vec<ExternalResource>,
    pub stylesheets: Vec<ExternalResource>,
    pub images: Vec<ExternalResource>,
    pub fonts: Vec<ExternalResource>,
    pub frames: Vec<ExternalResource>,
    pub other: Vec<ExternalResource>,
    pub data_uris: DataUriUsage,
}

impl ResourceCatalog {
    pub fn push(&mut self, resource: ExternalResource) {
        match resource.kind {
            ResourceKind::Script => self.scripts.push(resource),
            ResourceKind::Stylesheet => self.stylesheets.push(resource),
            ResourceKind::Image => self.images.push(resource),
            ResourceKind::Font => self.fonts.push(resource),
            ResourceKind::Frame => self.frames.push(resource),
            ResourceKind::Connect | ResourceKind::Other => self.other.push(resource),
        }
    }

    /// Record that a data: URL was seen for the given resource class.
    pub fn mark_data_uri(&mut self, kind: ResourceKind) {
        match kind {
            ResourceKind::Image => self.data_uris.images = true,
            ResourceKind::Font => self.data_uris.fonts = true,
            _ => {}
        }
    }

    /// Concatenate another catalog into this one (multi-document input).
    /// Deduplication happens at query time, so duplicate-laden merges are fine.
    pub fn merge(&mut self, other: ResourceCatalog) {
        self.scripts.extend(other.scripts);
        self.stylesheets.extend(other.stylesheets);
        self.images.extend(other.images);
        self.fonts.extend(other.fonts);
        self.frames.extend(other.frames);
        self.other.extend(other.other);
        self.data_uris.images |= other.data_uris.images;
        self.data_uris.fonts |= other.data_uris.fonts;
    }

    /// All resources across every class, in class order then insertion order.
    pub fn all(&self) -> impl Iterator<Item = &ExternalResource> {
        self.scripts
            .iter()
            .chain(&self.stylesheets)
            .chain(&self.images)
            .chain(&self.fonts)
            .chain(&self.frames)
            .chain(&self.other)
    }

    pub fn len(&self) -> usize {
        self.all().count()
    }

    pub fn is_empty(&self) -> bool {
        self.all().next().is_none()
    }

    /// Sorted, deduplicated origins across all resource classes.
    pub fn unique_domains(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .all()
            .filter(|r| !r.domain.is_empty())
            .map(|r| r.domain.as_str())
            .collect();
        set.into_iter().map(String::from).collect()
    }

    /// Sorted, deduplicated origins for one resource class.
    pub fn domains_for(&self, kind: ResourceKind) -> Vec<String> {
        let list = match kind {
            ResourceKind::Script => &self.scripts,
            ResourceKind::Stylesheet => &self.stylesheets,
            ResourceKind::Image => &self.images,
            ResourceKind::Font => &self.fonts,
            ResourceKind::Frame => &self.frames,
            ResourceKind::Connect | ResourceKind::Other => &self.other,
        };
        let set: BTreeSet<&str> = list
            .iter()
            .filter(|r| !r.domain.is_empty())
            .map(|r| r.domain.as_str())
            .collect();
        set.into_iter().map(String::from).collect()
    }
}

/// Normalize a URL into an origin string (`scheme://host[:port]`).
///
/// Returns an empty string for anything not externally addressable:
/// data: URIs, relative paths, and unparsable input. Never panics.
pub fn extract_domain(raw: &str) -> String {
    if raw.starts_with("data:") {
        return String::new();
    }

    // Protocol-relative URLs resolve against https in practice.
    let absolute;
    let raw = if raw.starts_with("//") {
        absolute = format!("https:{raw}");
        absolute.as_str()
    } else {
        raw
    };

    if !raw.starts_with("http://") && !raw.starts_with("https://") {
        return String::new();
    }

    match Url::parse(raw) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) if !host.is_empty() => match parsed.port() {
                Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
                None => format!("{}://{}", parsed.scheme(), host),
            },
            _ => String::new(),
        },
        Err(_) => String::new(),
    }
}
