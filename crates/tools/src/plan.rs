//! Where each tool comes from.
//!
//! The built-in table knows one source per tool and platform. A configured
//! [`SourceOverride`](jscol_core::SourceOverride) takes precedence over it.

use jscol_core::{AcquisitionStrategy, Error, Os, Platform, Result, ToolName, ToolSpec};

const URLFINDER_RELEASE: &str = "https://github.com/pingc0y/URLFinder/releases/download/2023.9.9";

/// How to obtain one tool executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionPlan {
    pub strategy: AcquisitionStrategy,
    pub url: String,
}

impl AcquisitionPlan {
    #[must_use]
    pub fn new(strategy: AcquisitionStrategy, url: impl Into<String>) -> Self {
        Self {
            strategy,
            url: url.into(),
        }
    }

    /// Resolve the plan for `spec` on `platform`.
    ///
    /// This is a pure lookup and touches neither the filesystem nor the
    /// network.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the tool has no source for `platform`.
    pub fn resolve(spec: &ToolSpec, platform: Platform) -> Result<Self> {
        if let Some(source) = spec.source() {
            return Ok(Self::new(source.strategy, source.url.clone()));
        }
        Self::builtin(spec.name(), platform)
    }

    /// Look up the built-in source for `tool` on `platform`.
    ///
    /// # Errors
    ///
    /// See [`AcquisitionPlan::resolve`].
    pub fn builtin(tool: ToolName, platform: Platform) -> Result<Self> {
        let plan = match tool {
            ToolName::UrlFinder => {
                let asset = match platform.os {
                    Os::Windows => "URLFinder_Windows_x86_64.zip",
                    Os::Linux => "URLFinder_Linux_x86_64.tar.gz",
                    Os::Darwin => "URLFinder_Darwin_x86_64.tar.gz",
                    Os::Other => {
                        return Err(Error::configuration_with_help(
                            format!("no {tool} release is published for {platform}"),
                            "Add a \"source\" entry for urlfinder to the config",
                        ));
                    }
                };
                Self::new(
                    AcquisitionStrategy::Archive,
                    format!("{URLFINDER_RELEASE}/{asset}"),
                )
            }
            ToolName::GetJs => Self::new(
                AcquisitionStrategy::Build,
                "https://github.com/003random/getJS",
            ),
            ToolName::SubJs => {
                Self::new(AcquisitionStrategy::Build, "https://github.com/lc/subjs")
            }
            ToolName::JsFinder => Self::new(
                AcquisitionStrategy::Build,
                "https://github.com/kacakb/jsfinder",
            ),
        };
        Ok(plan)
    }

    /// Final URL path segment, used as the scratch file name for downloads.
    ///
    /// Query strings and fragments are not part of the name.
    #[must_use]
    pub fn file_name(&self) -> &str {
        let path = self.url.split(['?', '#']).next().unwrap_or_default();
        path.rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or("download")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jscol_core::SourceOverride;

    #[test]
    fn test_urlfinder_archive_per_os() {
        let linux = Platform::new(Os::Linux);
        let plan = AcquisitionPlan::builtin(ToolName::UrlFinder, linux).unwrap();
        assert_eq!(plan.strategy, AcquisitionStrategy::Archive);
        assert_eq!(plan.file_name(), "URLFinder_Linux_x86_64.tar.gz");

        let windows = Platform::new(Os::Windows);
        let plan = AcquisitionPlan::builtin(ToolName::UrlFinder, windows).unwrap();
        assert!(plan.url.ends_with("URLFinder_Windows_x86_64.zip"));
    }

    #[test]
    fn test_source_builds_are_platform_independent() {
        let other = Platform::new(Os::Other);
        for tool in [ToolName::GetJs, ToolName::SubJs, ToolName::JsFinder] {
            let plan = AcquisitionPlan::builtin(tool, other).unwrap();
            assert_eq!(plan.strategy, AcquisitionStrategy::Build);
            assert!(plan.url.starts_with("https://github.com/"));
        }
    }

    #[test]
    fn test_unsupported_pair_is_configuration_error() {
        let other = Platform::new(Os::Other);
        let err = AcquisitionPlan::builtin(ToolName::UrlFinder, other).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_override_wins() {
        let spec = ToolSpec::new(ToolName::UrlFinder, "tools/URLFinder", vec![])
            .unwrap()
            .with_source(Some(SourceOverride {
                strategy: AcquisitionStrategy::Direct,
                url: "https://mirror.example/URLFinder".into(),
            }));
        let other = Platform::new(Os::Other);
        let plan = AcquisitionPlan::resolve(&spec, other).unwrap();
        assert_eq!(plan.strategy, AcquisitionStrategy::Direct);
        assert_eq!(plan.file_name(), "URLFinder");
    }

    #[test]
    fn test_file_name_ignores_query_and_fragment() {
        let plan = AcquisitionPlan::new(
            AcquisitionStrategy::Archive,
            "https://mirror.example/dl/tool.zip?raw=1",
        );
        assert_eq!(plan.file_name(), "tool.zip");

        let plan = AcquisitionPlan::new(
            AcquisitionStrategy::Archive,
            "https://mirror.example/dl/tool.tar.gz#sha=abc/def",
        );
        assert_eq!(plan.file_name(), "tool.tar.gz");

        let plan = AcquisitionPlan::new(AcquisitionStrategy::Direct, "https://mirror.example/");
        assert_eq!(plan.file_name(), "mirror.example");
    }
}
