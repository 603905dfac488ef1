//! Host platform identification.
//!
//! Provisioning picks release assets by operating system and decides whether
//! executables carry an `.exe` suffix, so the platform is modelled explicitly
//! instead of being read from `cfg!` at every call site.

use std::path::{Path, PathBuf};

/// The platform tools are provisioned for.
///
/// Every published release asset is x86_64 and the other tools are built
/// from source, so only the operating system matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
    pub os: Os,
}

impl Platform {
    #[must_use]
    pub const fn new(os: Os) -> Self {
        Self { os }
    }

    /// Get the current platform.
    #[must_use]
    pub fn current() -> Self {
        Self::new(Os::current())
    }

    /// Suffix appended to executable file names on this platform.
    #[must_use]
    pub const fn executable_suffix(&self) -> &'static str {
        match self.os {
            Os::Windows => ".exe",
            Os::Darwin | Os::Linux | Os::Other => "",
        }
    }

    /// Apply the platform's executable suffix to a configured tool path.
    #[must_use]
    pub fn executable_path(&self, path: &Path) -> PathBuf {
        let suffix = self.executable_suffix();
        if suffix.is_empty() {
            return path.to_path_buf();
        }
        let mut name = path.as_os_str().to_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }

    /// Whether files need an explicit execute bit after being written.
    #[must_use]
    pub const fn needs_exec_bit(&self) -> bool {
        !matches!(self.os, Os::Windows)
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.os.fmt(f)
    }
}

/// Operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    Darwin,
    Linux,
    Windows,
    /// Any other Unix-like host. Source builds still work there.
    Other,
}

impl Os {
    /// Get the current OS.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::Darwin
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else {
            Self::Other
        }
    }
}

impl std::fmt::Display for Os {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Darwin => write!(f, "darwin"),
            Self::Linux => write!(f, "linux"),
            Self::Windows => write!(f, "windows"),
            Self::Other => write!(f, "other ({})", std::env::consts::OS),
        }
    }
}
