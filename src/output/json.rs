use crate::error::Result;
use crate::BuildReport;

/// Render a build report as pretty-printed JSON.
pub fn render(report: &BuildReport) -> Result<String> {
    let mut rendered = serde_json::to_string_pretty(report)?;
    rendered.push('\n');
    Ok(rendered)
}
