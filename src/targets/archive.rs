//! Zip package handling
//!
//! An archive is extracted into a fresh staging directory, stamped like any
//! other directory, and repacked only when at least one document changed.
//! The repacked archive is written next to the original and renamed over it,
//! so a failure while packing leaves the original package intact.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::{DirectoryReport, Stamper};

const STAGING_PREFIX: &str = "json-stamp-";

impl Stamper {
    /// Stamp the JSON documents inside a zip archive.
    pub fn process_archive(&self, archive: &Path) -> Result<DirectoryReport> {
        self.stamp_archive(archive, crate::is_shutdown_requested)
            .map(|(report, _)| report)
    }

    /// Returns the document counters and whether the archive was rewritten.
    /// Once `interrupted` reports true the package is left as it was, so it
    /// never ends up partially stamped.
    pub(crate) fn stamp_archive<F>(
        &self,
        archive: &Path,
        interrupted: F,
    ) -> Result<(DirectoryReport, bool)>
    where
        F: Fn() -> bool,
    {
        fs::create_dir_all(&self.temp_root).with_context(|| {
            format!("Failed to create temp directory {}", self.temp_root.display())
        })?;
        // Removed on drop, whatever happens below
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(&self.temp_root)
            .context("Failed to create staging directory")?;
        debug!("Staging {} in {}", archive.display(), staging.path().display());

        extract(archive, staging.path())?;
        let report = self.process_directory(staging.path())?;

        if !report.was_substituted() || self.dry_run {
            return Ok((report, false));
        }
        if interrupted() {
            warn!("Shutdown requested, leaving {} unchanged", archive.display());
            return Ok((report, false));
        }

        repack(staging.path(), archive)?;
        info!("Repacked {}", archive.display());
        Ok((report, true))
    }
}

/// Extract every entry of `archive` below `dest`.
pub fn extract(archive: &Path, dest: &Path) -> Result<()> {
    let file =
        File::open(archive).with_context(|| format!("Failed to open {}", archive.display()))?;
    let mut zip = ZipArchive::new(BufReader::new(file))
        .with_context(|| format!("Failed to read zip archive {}", archive.display()))?;
    zip.extract(dest)
        .with_context(|| format!("Failed to extract {}", archive.display()))?;
    Ok(())
}

/// Pack the contents of `source_dir` into `archive`, replacing it atomically.
pub fn repack(source_dir: &Path, archive: &Path) -> Result<()> {
    let parent = archive
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut packed = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temporary archive in {}", parent.display()))?;

    {
        let mut writer = ZipWriter::new(packed.as_file_mut());
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for entry in WalkDir::new(source_dir).min_depth(1).sort_by_file_name() {
            let entry = entry?;
            let name = entry_name(entry.path().strip_prefix(source_dir)?);
            if entry.file_type().is_dir() {
                writer.add_directory(name, options)?;
            } else if entry.file_type().is_file() {
                writer.start_file(name, options)?;
                let mut file = File::open(entry.path())
                    .with_context(|| format!("Failed to read {}", entry.path().display()))?;
                io::copy(&mut file, &mut writer)?;
            }
        }
        writer.finish().context("Failed to finish zip archive")?;
    }

    packed
        .persist(archive)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to replace {}", archive.display()))?;
    Ok(())
}

/// Zip entry names always use `/`.
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
