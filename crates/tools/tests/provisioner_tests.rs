//! Provisioner behaviour against a recording fetcher, no network involved.

use async_trait::async_trait;
use flate2::Compression;
use flate2::write::GzEncoder;
use jscol_core::{
    AcquisitionStrategy, Error, Os, Platform, Result, SourceOverride, ToolName, ToolSpec,
};
use jscol_tools::{Fetcher, ProvisionOutcome, Provisioner};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const LINUX: Platform = Platform::new(Os::Linux);

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    File(String),
    Source(String, String),
}

/// Serves canned bytes for downloads and fake binaries for builds.
#[derive(Default)]
struct RecordingFetcher {
    calls: Mutex<Vec<Call>>,
    file_body: Vec<u8>,
    fail: bool,
}

impl RecordingFetcher {
    fn serving(body: Vec<u8>) -> Self {
        Self {
            file_body: body,
            ..Self::default()
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for RecordingFetcher {
    async fn fetch_file(&self, url: &str, dest: &Path) -> Result<()> {
        self.calls.lock().unwrap().push(Call::File(url.to_string()));
        if self.fail {
            return Err(Error::download(url, "HTTP 404 Not Found"));
        }
        std::fs::write(dest, &self.file_body)?;
        Ok(())
    }

    async fn fetch_source(
        &self,
        url: &str,
        checkout: &Path,
        binary_name: &str,
    ) -> Result<PathBuf> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Source(url.to_string(), binary_name.to_string()));
        let binary = checkout.parent().unwrap().join(binary_name);
        std::fs::write(&binary, b"built")?;
        Ok(binary)
    }
}

fn urlfinder_tarball() -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (name, content) in [
        ("URLFinder_Linux_x86_64/README.md", b"readme".as_slice()),
        ("URLFinder_Linux_x86_64/URLFinder", b"urlfinder binary".as_slice()),
    ] {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        builder.append_data(&mut header, name, content).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

fn spec(tool: ToolName, path: &Path) -> ToolSpec {
    ToolSpec::new(tool, path, vec![]).unwrap()
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_existing_executable_is_left_alone() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("tools/getJS");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, b"already here").unwrap();

    let fetcher = Arc::new(RecordingFetcher::default());
    let provisioner = Provisioner::new(fetcher.clone(), LINUX);

    let first = provisioner.ensure(&spec(ToolName::GetJs, &path)).await.unwrap();
    let second = provisioner.ensure(&spec(ToolName::GetJs, &path)).await.unwrap();

    assert_eq!(first, ProvisionOutcome::AlreadyPresent(path.clone()));
    assert_eq!(first, second);
    assert!(fetcher.calls().is_empty());
    assert_eq!(std::fs::read(&path).unwrap(), b"already here");
}

#[tokio::test]
async fn test_unsupported_platform_fails_before_any_action() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("tools/URLFinder");

    let fetcher = Arc::new(RecordingFetcher::default());
    let provisioner = Provisioner::new(fetcher.clone(), Platform::new(Os::Other));

    let err = provisioner
        .ensure(&spec(ToolName::UrlFinder, &path))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Configuration { .. }));
    assert!(fetcher.calls().is_empty());
    assert!(!temp.path().join("tools").exists());
}

#[tokio::test]
async fn test_archive_strategy_installs_matching_file() {
    let temp = TempDir::new().unwrap();
    let tools = temp.path().join("tools");
    let path = tools.join("URLFinder");

    let fetcher = Arc::new(RecordingFetcher::serving(urlfinder_tarball()));
    let provisioner = Provisioner::new(fetcher.clone(), LINUX);

    let outcome = provisioner
        .ensure(&spec(ToolName::UrlFinder, &path))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ProvisionOutcome::Acquired {
            path: path.clone(),
            strategy: AcquisitionStrategy::Archive,
        }
    );
    assert_eq!(std::fs::read(&path).unwrap(), b"urlfinder binary");
    assert_eq!(
        fetcher.calls(),
        [Call::File(
            "https://github.com/pingc0y/URLFinder/releases/download/2023.9.9/URLFinder_Linux_x86_64.tar.gz"
                .to_string()
        )]
    );
    // scratch directory is gone
    assert_eq!(entries(&tools), ["URLFinder"]);
}

#[tokio::test]
async fn test_archive_lookup_uses_tool_name_for_renamed_target() {
    let temp = TempDir::new().unwrap();
    let tools = temp.path().join("tools");
    let path = tools.join("urlfinder");

    let fetcher = Arc::new(RecordingFetcher::serving(urlfinder_tarball()));
    let provisioner = Provisioner::new(fetcher.clone(), LINUX);

    let outcome = provisioner
        .ensure(&spec(ToolName::UrlFinder, &path))
        .await
        .unwrap();

    assert_eq!(outcome.path(), path);
    assert_eq!(std::fs::read(&path).unwrap(), b"urlfinder binary");
    assert_eq!(entries(&tools), ["urlfinder"]);
}

#[tokio::test]
async fn test_build_names_binary_after_tool() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("bin/subjs-latest");

    let fetcher = Arc::new(RecordingFetcher::default());
    let provisioner = Provisioner::new(fetcher.clone(), LINUX);

    provisioner.ensure(&spec(ToolName::SubJs, &path)).await.unwrap();

    assert_eq!(
        fetcher.calls(),
        [Call::Source(
            "https://github.com/lc/subjs".to_string(),
            "subjs".to_string()
        )]
    );
    assert_eq!(entries(&temp.path().join("bin")), ["subjs-latest"]);
}

#[tokio::test]
async fn test_build_strategy_uses_executable_name() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("bin/subjs");

    let fetcher = Arc::new(RecordingFetcher::default());
    let provisioner = Provisioner::new(fetcher.clone(), LINUX);

    let outcome = provisioner.ensure(&spec(ToolName::SubJs, &path)).await.unwrap();

    assert_eq!(outcome.path(), path);
    assert_eq!(std::fs::read(&path).unwrap(), b"built");
    assert_eq!(
        fetcher.calls(),
        [Call::Source(
            "https://github.com/lc/subjs".to_string(),
            "subjs".to_string()
        )]
    );
    assert_eq!(entries(&temp.path().join("bin")), ["subjs"]);
}

#[tokio::test]
async fn test_windows_target_gets_exe_suffix() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("tools/getJS");

    let fetcher = Arc::new(RecordingFetcher::default());
    let provisioner = Provisioner::new(fetcher.clone(), Platform::new(Os::Windows));

    let outcome = provisioner.ensure(&spec(ToolName::GetJs, &path)).await.unwrap();

    assert_eq!(outcome.path(), temp.path().join("tools/getJS.exe"));
    assert_eq!(
        fetcher.calls(),
        [Call::Source(
            "https://github.com/003random/getJS".to_string(),
            "getJS.exe".to_string()
        )]
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_direct_override_sets_exec_bit() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let path = temp.path().join("tools/jsfinder");
    let spec = spec(ToolName::JsFinder, &path).with_source(Some(SourceOverride {
        strategy: AcquisitionStrategy::Direct,
        url: "https://mirror.example/jsfinder".to_string(),
    }));

    let fetcher = Arc::new(RecordingFetcher::serving(b"#!/bin/sh\n".to_vec()));
    let provisioner = Provisioner::new(fetcher.clone(), LINUX);
    provisioner.ensure(&spec).await.unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o755);
    assert_eq!(
        fetcher.calls(),
        [Call::File("https://mirror.example/jsfinder".to_string())]
    );
}

#[tokio::test]
async fn test_download_failure_is_provisioning_error() {
    let temp = TempDir::new().unwrap();
    let tools = temp.path().join("tools");
    let path = tools.join("URLFinder");

    let provisioner = Provisioner::new(Arc::new(RecordingFetcher::failing()), LINUX);
    let err = provisioner
        .ensure(&spec(ToolName::UrlFinder, &path))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Provisioning { ref tool, .. } if tool == "URLFinder"));
    assert!(err.to_string().contains("404"));
    assert!(entries(&tools).is_empty());
}

#[tokio::test]
async fn test_ensure_all_stops_at_first_failure() {
    let temp = TempDir::new().unwrap();
    let getjs = temp.path().join("tools/getJS");
    let urlfinder = temp.path().join("tools/URLFinder");
    let subjs = temp.path().join("tools/subjs");

    let fetcher = Arc::new(RecordingFetcher::default());
    let provisioner = Provisioner::new(fetcher.clone(), Platform::new(Os::Other));

    let specs = [
        spec(ToolName::GetJs, &getjs),
        spec(ToolName::UrlFinder, &urlfinder),
        spec(ToolName::SubJs, &subjs),
    ];
    let err = provisioner.ensure_all(&specs).await.unwrap_err();

    assert!(matches!(err, Error::Configuration { .. }));
    assert!(getjs.exists());
    assert!(!subjs.exists());
    assert_eq!(fetcher.calls().len(), 1);
}
