//! Per-tool outcomes and the aggregate report of a run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::spec::ToolName;

/// Outcome of running one collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionResult {
    pub tool: ToolName,
    #[serde(rename = "js_urls")]
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub duration_ms: u64,
}

impl CollectionResult {
    /// A successful collection.
    #[must_use]
    pub const fn succeeded(tool: ToolName, urls: Vec<String>, duration_ms: u64) -> Self {
        Self {
            tool,
            urls,
            error: None,
            duration_ms,
        }
    }

    /// A failed collection. Failed results never carry URLs.
    #[must_use]
    pub fn failed(tool: ToolName, error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            tool,
            urls: Vec::new(),
            error: Some(error.into()),
            duration_ms,
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Every collector outcome of one run, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateReport {
    results: Vec<CollectionResult>,
}

impl AggregateReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one collector outcome.
    pub fn push(&mut self, result: CollectionResult) {
        self.results.push(result);
    }

    #[must_use]
    pub fn results(&self) -> &[CollectionResult] {
        &self.results
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// True once one result per launched collector has arrived.
    #[must_use]
    pub fn is_complete(&self, launched: usize) -> bool {
        self.results.len() == launched
    }

    /// Look up the result for a tool.
    #[must_use]
    pub fn get(&self, tool: ToolName) -> Option<&CollectionResult> {
        self.results.iter().find(|r| r.tool == tool)
    }

    pub fn successes(&self) -> impl Iterator<Item = &CollectionResult> {
        self.results.iter().filter(|r| r.is_success())
    }

    pub fn failures(&self) -> impl Iterator<Item = &CollectionResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    /// All discovered URLs across tools, de-duplicated and sorted.
    #[must_use]
    pub fn unique_urls(&self) -> BTreeSet<&str> {
        self.results
            .iter()
            .flat_map(|r| r.urls.iter().map(String::as_str))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_result_has_no_urls() {
        let result = CollectionResult::failed(ToolName::GetJs, "boom", 3);
        assert!(!result.is_success());
        assert!(result.urls.is_empty());
    }

    #[test]
    fn test_unique_urls_merges_tools() {
        let mut report = AggregateReport::new();
        report.push(CollectionResult::succeeded(
            ToolName::GetJs,
            vec!["http://a.com/1.js".into(), "http://a.com/2.js".into()],
            1,
        ));
        report.push(CollectionResult::succeeded(
            ToolName::SubJs,
            vec!["http://a.com/2.js".into()],
            1,
        ));
        report.push(CollectionResult::failed(ToolName::JsFinder, "nope", 1));

        assert!(report.is_complete(3));
        assert!(report.has_failures());
        assert_eq!(report.successes().count(), 2);
        let urls: Vec<_> = report.unique_urls().into_iter().collect();
        assert_eq!(urls, ["http://a.com/1.js", "http://a.com/2.js"]);
    }

    #[test]
    fn test_json_field_names() {
        let result = CollectionResult::succeeded(ToolName::UrlFinder, vec!["a.js".into()], 7);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["tool"], "URLFinder");
        assert_eq!(json["js_urls"][0], "a.js");
        assert!(json.get("error").is_none());
    }
}
