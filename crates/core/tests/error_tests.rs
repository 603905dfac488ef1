//! Tests for error types

use jscol_core::{Error, ErrorCategory};
use std::path::Path;

#[test]
fn test_configuration_error() {
    let error = Error::configuration("config is invalid");
    assert_eq!(error.to_string(), "Configuration error: config is invalid");
    assert_eq!(error.category(), ErrorCategory::Configuration);

    let error = Error::configuration_with_help("unsupported platform", "use linux");
    assert!(matches!(
        error,
        Error::Configuration { help: Some(ref h), .. } if h == "use linux"
    ));
}

#[test]
fn test_provisioning_errors() {
    let error = Error::provisioning("getJS", "go not found");
    assert_eq!(error.to_string(), "Failed to provision getJS: go not found");
    assert_eq!(error.category(), ErrorCategory::Provisioning);

    let error = Error::download("https://example.com/x", "HTTP 404 Not Found");
    assert_eq!(
        error.to_string(),
        "Download of https://example.com/x failed: HTTP 404 Not Found"
    );
    assert_eq!(error.category(), ErrorCategory::Provisioning);

    let error = Error::extraction(Path::new("/tmp/a.zip"), "bad header");
    assert_eq!(error.to_string(), "Failed to extract /tmp/a.zip: bad header");
    assert_eq!(error.category(), ErrorCategory::Provisioning);

    let error = Error::build("git clone", "repository not found");
    assert_eq!(error.to_string(), "git clone failed: repository not found");
    assert_eq!(error.category(), ErrorCategory::Provisioning);
}

#[test]
fn test_collection_errors() {
    let error = Error::collection("subjs", "exit status: 1");
    assert_eq!(error.to_string(), "Collector subjs failed: exit status: 1");
    assert_eq!(error.category(), ErrorCategory::Collection);

    let error = Error::Timeout { seconds: 30 };
    assert_eq!(error.to_string(), "Timeout after 30 seconds");
    assert_eq!(error.category(), ErrorCategory::Collection);
}

#[test]
fn test_io_error_conversion() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let error: Error = io.into();
    assert!(matches!(error, Error::Io { path: None, .. }));

    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let error = Error::io(io, Path::new("/results"), "create results directory");
    assert_eq!(
        error.to_string(),
        "I/O error during create results directory: denied"
    );
}
