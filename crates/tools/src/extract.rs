//! Archive extraction for downloaded release assets.
//!
//! Supports zip and gzip-compressed tarballs. Entry names are resolved below
//! the destination directory and rejected if they would escape it, and the
//! total amount of extracted data is bounded by [`ExtractLimits`].

use flate2::read::GzDecoder;
use jscol_core::{Error, Result};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};
use tar::Archive;
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Upper bounds applied while extracting a single archive.
#[derive(Debug, Clone, Copy)]
pub struct ExtractLimits {
    /// Maximum number of entries (files and directories).
    pub max_entries: usize,
    /// Maximum number of decompressed bytes written.
    pub max_total_bytes: u64,
}

impl Default for ExtractLimits {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            max_total_bytes: 1 << 30,
        }
    }
}

/// Archive formats understood by [`extract_archive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarGz,
}

impl ArchiveKind {
    /// Detect the archive format from the file name.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".zip") {
            Some(Self::Zip)
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Self::TarGz)
        } else {
            None
        }
    }
}

/// Extract `archive` into `dest` with the default limits.
///
/// # Errors
///
/// Returns an extraction error for unsupported formats, corrupt archives,
/// entries escaping `dest`, or archives exceeding the limits.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<()> {
    extract_archive_with_limits(archive, dest, ExtractLimits::default())
}

/// Extract `archive` into `dest`, enforcing `limits`.
///
/// # Errors
///
/// See [`extract_archive`].
pub fn extract_archive_with_limits(
    archive: &Path,
    dest: &Path,
    limits: ExtractLimits,
) -> Result<()> {
    let kind = ArchiveKind::from_path(archive)
        .ok_or_else(|| Error::extraction(archive, "unsupported archive format"))?;

    debug!(archive = %archive.display(), dest = %dest.display(), ?kind, "Extracting archive");
    std::fs::create_dir_all(dest).map_err(|e| Error::io(e, dest, "create extraction directory"))?;

    let mut budget = Budget::new(archive, limits);
    match kind {
        ArchiveKind::Zip => extract_zip(archive, dest, &mut budget),
        ArchiveKind::TarGz => extract_tar_gz(archive, dest, &mut budget),
    }
}

fn extract_zip(archive: &Path, dest: &Path, budget: &mut Budget<'_>) -> Result<()> {
    let file = File::open(archive).map_err(|e| Error::io(e, archive, "open archive"))?;
    let mut zip = zip::ZipArchive::new(file)
        .map_err(|e| Error::extraction(archive, format!("Failed to open zip: {e}")))?;

    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| Error::extraction(archive, format!("Failed to read zip entry: {e}")))?;
        budget.admit_entry()?;

        let name = PathBuf::from(entry.name());
        let Some(outpath) = resolve_entry(archive, dest, &name)? else {
            continue;
        };
        trace!(entry = %name.display(), "Extracting zip entry");

        if entry.is_dir() {
            std::fs::create_dir_all(&outpath)
                .map_err(|e| Error::io(e, &outpath, "create directory"))?;
            continue;
        }

        let mode = entry.unix_mode();
        write_entry(&outpath, &mut entry, budget)?;
        if let Some(mode) = mode {
            set_mode(&outpath, mode)?;
        }
    }
    Ok(())
}

fn extract_tar_gz(archive: &Path, dest: &Path, budget: &mut Budget<'_>) -> Result<()> {
    let file = File::open(archive).map_err(|e| Error::io(e, archive, "open archive"))?;
    let mut tar = Archive::new(GzDecoder::new(file));

    let entries = tar
        .entries()
        .map_err(|e| Error::extraction(archive, format!("Failed to read tar: {e}")))?;
    for entry in entries {
        let mut entry = entry
            .map_err(|e| Error::extraction(archive, format!("Failed to read tar entry: {e}")))?;
        budget.admit_entry()?;

        let name = entry
            .path()
            .map_err(|e| Error::extraction(archive, format!("Invalid path in tar: {e}")))?
            .into_owned();
        let Some(outpath) = resolve_entry(archive, dest, &name)? else {
            continue;
        };

        let entry_type = entry.header().entry_type();
        if entry_type.is_dir() {
            if !outpath.exists() {
                std::fs::create_dir_all(&outpath)
                    .map_err(|e| Error::io(e, &outpath, "create directory"))?;
            }
        } else if entry_type.is_file() {
            let mode = entry.header().mode().ok();
            write_entry(&outpath, &mut entry, budget)?;
            if let Some(mode) = mode {
                set_mode(&outpath, mode)?;
            }
        } else {
            trace!(entry = %name.display(), ?entry_type, "Skipping non-regular tar entry");
        }
    }
    Ok(())
}

/// Resolve an archive entry name below `dest`.
///
/// Returns `Ok(None)` for entries naming the destination root itself (e.g. `./`).
fn resolve_entry(archive: &Path, dest: &Path, name: &Path) -> Result<Option<PathBuf>> {
    let mut out = dest.to_path_buf();
    let mut depth = 0usize;
    for component in name.components() {
        match component {
            Component::Normal(part) => {
                out.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(Error::extraction(
                    archive,
                    format!(
                        "entry '{}' escapes the destination directory",
                        name.display()
                    ),
                ));
            }
        }
    }
    Ok((depth > 0).then_some(out))
}

fn write_entry(outpath: &Path, reader: &mut impl Read, budget: &mut Budget<'_>) -> Result<()> {
    if let Some(parent) = outpath.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::io(e, parent, "create directory"))?;
    }
    let mut file = File::create(outpath).map_err(|e| Error::io(e, outpath, "create file"))?;
    budget.copy(reader, &mut file, outpath)?;
    file.flush().map_err(|e| Error::io(e, outpath, "write file"))
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode & 0o7777))
        .map_err(|e| Error::io(e, path, "set file mode"))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

/// Tracks how much of the extraction allowance has been used.
struct Budget<'a> {
    archive: &'a Path,
    limits: ExtractLimits,
    entries: usize,
    bytes: u64,
}

impl<'a> Budget<'a> {
    const fn new(archive: &'a Path, limits: ExtractLimits) -> Self {
        Self {
            archive,
            limits,
            entries: 0,
            bytes: 0,
        }
    }

    fn admit_entry(&mut self) -> Result<()> {
        self.entries += 1;
        if self.entries > self.limits.max_entries {
            return Err(Error::extraction(
                self.archive,
                format!("archive has more than {} entries", self.limits.max_entries),
            ));
        }
        Ok(())
    }

    fn copy(&mut self, reader: &mut impl Read, writer: &mut impl Write, outpath: &Path) -> Result<()> {
        let remaining = self.limits.max_total_bytes.saturating_sub(self.bytes);
        let written = std::io::copy(&mut reader.take(remaining.saturating_add(1)), writer)
            .map_err(|e| Error::io(e, outpath, "write extracted file"))?;
        if written > remaining {
            return Err(Error::extraction(
                self.archive,
                format!(
                    "archive expands beyond {} bytes",
                    self.limits.max_total_bytes
                ),
            ));
        }
        self.bytes += written;
        Ok(())
    }
}

/// Find an extracted file for `executable` below `dir`.
///
/// An exact file-name match wins; otherwise the first file whose path
/// relative to `dir` contains `executable` is returned.
///
/// # Errors
///
/// Returns an error if the directory cannot be walked.
pub fn find_executable(dir: &Path, executable: &str) -> Result<Option<PathBuf>> {
    let mut partial = None;
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::extraction(dir, format!("Failed to walk: {e}")))?;
        if entry.file_type().is_dir() {
            continue;
        }
        if entry.file_name().to_str() == Some(executable) {
            return Ok(Some(entry.into_path()));
        }
        let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        if partial.is_none() && relative.to_string_lossy().contains(executable) {
            partial = Some(entry.path().to_path_buf());
        }
    }
    Ok(partial)
}
