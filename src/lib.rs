//! csp-forge: Content-Security-Policy generator for static HTML.
//!
//! Hashes inline scripts and styles, catalogs external resource references,
//! infers the origins a page will need at runtime, and folds everything into
//! a policy header that is as restrictive as possible while still permitting
//! what the site actually uses.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::PathBuf;
//! use cspforge::{build, BuildOptions};
//!
//! let options = BuildOptions::default();
//! let report = build(&[PathBuf::from("index.html")], &options).unwrap();
//! println!("{}", report.header);
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod hash;
pub mod infer;
pub mod output;
pub mod policy;
pub mod resources;

use std::path::{Path, PathBuf};

use serde::Serialize;

use config::Config;
use error::{CspError, Result};
use extract::ExtractOptions;
use hash::{dedup_tokens, hash_token, HashAlgorithm};
use infer::Inference;
use output::OutputFormat;
use policy::{
    apply_modifications, merge_catalog, merge_inline_hashes, validate, InlineHashes,
    Modification, Policy, ValidationResult,
};
use resources::{ExternalResource, ResourceCatalog};

/// Options for one policy build. `None` fields fall back to `.cspforge.toml`.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Path to config file (defaults to `.cspforge.toml` in the working dir).
    pub config_path: Option<PathBuf>,
    /// Existing CSP header to extend; absent means generate from the strict
    /// template, the safe default.
    pub csp: Option<String>,
    pub hash_algorithm: Option<HashAlgorithm>,
    pub include_external: Option<bool>,
    pub heuristics: Option<bool>,
    pub validate: Option<bool>,
    /// Add `require-trusted-types-for 'script'` to the strict template.
    pub require_trusted_types: bool,
    /// Explicit directive edits, applied last and in order.
    pub modifications: Vec<Modification>,
    pub extract: ExtractOptions,
}

/// Everything one build produced, for rendering and for callers that want
/// the intermediate evidence rather than just the header.
#[derive(Debug, Serialize)]
pub struct BuildReport {
    pub header: String,
    pub files: Vec<PathBuf>,
    pub hashes: InlineHashes,
    /// Present when external resources were collected.
    pub catalog: Option<ResourceCatalog>,
    pub inferences: Vec<Inference>,
    /// Present unless validation was disabled.
    pub validation: Option<ValidationResult>,
}

/// Run a complete build: extract, hash, infer, merge, validate.
pub fn build(paths: &[PathBuf], options: &BuildOptions) -> Result<BuildReport> {
    let config_path = options
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(".cspforge.toml"));
    let config = Config::load(&config_path)?;

    let algorithm = options.hash_algorithm.unwrap_or(config.scan.hash_algorithm);
    let heuristics = options.heuristics.unwrap_or(config.scan.heuristics);
    // Inference consumes the catalog, so asking for heuristics implies
    // collecting external resources.
    let include_external =
        options.include_external.unwrap_or(config.scan.include_external) || heuristics;
    let run_validation = options.validate.unwrap_or(config.scan.validate);

    let files = collect_html_files(paths)?;

    let mut hashes = InlineHashes::default();
    let mut catalog = ResourceCatalog::default();

    for file in &files {
        let (inline, resources) = extract::extract_file(file, &options.extract)?;

        hashes.has_event_handlers |= inline.has_event_handlers;
        hashes
            .scripts
            .extend(inline.scripts.iter().map(|s| hash_token(s, algorithm)));
        hashes
            .style_tags
            .extend(inline.style_tags.iter().map(|s| hash_token(s, algorithm)));
        hashes
            .style_attrs
            .extend(inline.style_attrs.iter().map(|s| hash_token(s, algorithm)));

        if include_external {
            catalog.merge(resources);
        }
    }

    hashes.scripts = dedup_tokens(std::mem::take(&mut hashes.scripts));
    hashes.style_tags = dedup_tokens(std::mem::take(&mut hashes.style_tags));
    hashes.style_attrs = dedup_tokens(std::mem::take(&mut hashes.style_attrs));

    let mut inferences: Vec<Inference> = Vec::new();
    if heuristics {
        let flat: Vec<ExternalResource> = catalog.all().cloned().collect();
        inferences = infer::apply(&flat);
        infer::merge_into(&mut catalog, &inferences);
    }

    let mut policy = match &options.csp {
        Some(header) => Policy::parse(header),
        None => {
            tracing::debug!("no CSP provided, generating from strict template");
            let mut template = config.strict.clone();
            template.require_trusted_types |= options.require_trusted_types;
            template.policy()
        }
    };

    merge_inline_hashes(&mut policy, &hashes);
    if include_external {
        merge_catalog(&mut policy, &catalog);
    }
    apply_modifications(&mut policy, &options.modifications);

    let header = policy.header();
    let validation = run_validation.then(|| validate(&header));

    Ok(BuildReport {
        header,
        files,
        hashes,
        catalog: include_external.then_some(catalog),
        inferences,
        validation,
    })
}

/// Render a build report in the specified format.
pub fn render_report(report: &BuildReport, format: OutputFormat) -> Result<String> {
    output::render(report, format)
}

/// Expand the given paths into a list of HTML files; directories are walked
/// recursively.
fn collect_html_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            for entry in walkdir::WalkDir::new(path)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                if entry.file_type().is_file() && is_html(entry.path()) {
                    files.push(entry.path().to_path_buf());
                }
            }
        } else if is_html(path) {
            files.push(path.clone());
        } else {
            tracing::warn!(file = %path.display(), "skipping non-HTML input");
        }
    }

    if files.is_empty() {
        let described = paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(CspError::NoInput(described));
    }

    Ok(files)
}

fn is_html(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm")
    )
}
