use crate::policy::Severity;
use crate::BuildReport;

/// Render a build report as plain console text: the header first (the part
/// meant for copy-paste), then the evidence behind it.
pub fn render(report: &BuildReport) -> String {
    let mut out = String::new();

    out.push_str(&report.header);
    out.push('\n');

    out.push_str(&format!(
        "\n  {} file(s): {} script hash(es), {} style-tag hash(es), {} style-attr hash(es)\n",
        report.files.len(),
        report.hashes.scripts.len(),
        report.hashes.style_tags.len(),
        report.hashes.style_attrs.len(),
    ));
    if report.hashes.has_event_handlers {
        out.push_str("  Event handlers found; 'unsafe-hashes' added to script-src\n");
    }

    if let Some(catalog) = &report.catalog {
        let domains = catalog.unique_domains();
        out.push_str(&format!("\n  External origins ({}):\n", domains.len()));
        for domain in &domains {
            out.push_str(&format!("    {domain}\n"));
        }
    }

    if !report.inferences.is_empty() {
        out.push_str("\n  Inferred resources:\n");
        for inference in &report.inferences {
            out.push_str(&format!(
                "    [{}] {} ({})\n",
                inference.confidence.to_string().to_uppercase(),
                inference.url,
                inference.kind,
            ));
            out.push_str(&format!("        {}\n", inference.reason));
            out.push_str(&format!(
                "        source: {} ({})\n",
                inference.source_url, inference.source_kind
            ));
        }
        let summary = crate::infer::summarize(&report.inferences);
        out.push_str(&format!(
            "  Total inferred: {} (high={}, medium={}, low={})\n",
            summary.total, summary.high, summary.medium, summary.low
        ));
    }

    if let Some(validation) = &report.validation {
        if validation.is_clean() {
            out.push_str("\n  Validation passed with no warnings\n");
        } else {
            out.push_str(&format!(
                "\n  Validation: {} warning(s)\n",
                validation.warnings.len()
            ));
            for warning in &validation.warnings {
                let tag = match warning.severity {
                    Severity::Error => "[ERROR]  ",
                    Severity::Warning => "[WARNING]",
                };
                out.push_str(&format!("    {} {}\n", tag, warning.message));
                out.push_str(&format!("              fix: {}\n", warning.fix));
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{InlineHashes, ValidationResult};

    fn minimal_report() -> BuildReport {
        BuildReport {
            header: "default-src 'self'".into(),
            files: vec!["index.html".into()],
            hashes: InlineHashes::default(),
            catalog: None,
            inferences: vec![],
            validation: Some(ValidationResult {
                valid: true,
                warnings: vec![],
            }),
        }
    }

    #[test]
    fn header_comes_first() {
        let rendered = render(&minimal_report());
        assert!(rendered.starts_with("default-src 'self'\n"));
    }

    #[test]
    fn clean_validation_reported() {
        let rendered = render(&minimal_report());
        assert!(rendered.contains("Validation passed with no warnings"));
    }

    #[test]
    fn warnings_rendered_with_fix() {
        let mut report = minimal_report();
        report.validation = Some(crate::policy::validate("script-src 'unsafe-eval'"));
        let rendered = render(&report);
        assert!(rendered.contains("[WARNING]"));
        assert!(rendered.contains("fix:"));
    }
}
