//! Rendering of a cut result on stdout.

use autocut::{CutResult, Disposition};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct JsonOutput<'a> {
    disposition: Disposition,
    description: &'static str,
    issue_url: &'a str,
}

/// `"{description}: {url}"`, or a JSON object when `json` is set.
pub fn render(result: &CutResult, json: bool) -> Result<String, serde_json::Error> {
    if json {
        serde_json::to_string(&JsonOutput {
            disposition: result.disposition,
            description: result.disposition.description(),
            issue_url: &result.issue_url,
        })
    } else {
        Ok(format!(
            "{}: {}",
            result.disposition.description(),
            result.issue_url
        ))
    }
}
