//! Line selection for tool output.

use jscol_core::ToolName;

/// Decides which output lines of a tool count as discovered URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineFilter {
    /// Lines ending in `.js`.
    JsSuffix,
    /// Lines starting with `http` and ending in `.js`.
    HttpJs,
    /// Every non-blank line.
    NonBlank,
}

impl LineFilter {
    /// The filter applied to `tool`'s output.
    #[must_use]
    pub const fn for_tool(tool: ToolName) -> Self {
        match tool {
            ToolName::JsFinder => Self::HttpJs,
            ToolName::UrlFinder | ToolName::GetJs => Self::JsSuffix,
            ToolName::SubJs => Self::NonBlank,
        }
    }

    /// Return the trimmed line if it is selected.
    ///
    /// Matching happens after trimming, so `x.js\r` from CRLF output counts.
    #[must_use]
    pub fn select(self, line: &str) -> Option<&str> {
        let line = line.trim();
        let keep = match self {
            Self::JsSuffix => line.ends_with(".js"),
            Self::HttpJs => line.starts_with("http") && line.ends_with(".js"),
            Self::NonBlank => !line.is_empty(),
        };
        keep.then_some(line)
    }

    /// Apply the filter to a whole block of output.
    #[must_use]
    pub fn select_all(self, output: &str) -> Vec<String> {
        output
            .lines()
            .filter_map(|line| self.select(line))
            .map(str::to_string)
            .collect()
    }
}
