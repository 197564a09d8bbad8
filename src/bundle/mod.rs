//! Archive bundle extraction.
//!
//! A bundle is a zip archive holding the complete desired state of the
//! target bucket. Extraction materializes file contents into the staging
//! directory and records each entry's archive-recorded modification time,
//! which is the sole staleness signal for the diff.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use tracing::debug;

use crate::utils::errors::{Result, SyncError};

/// Manifest derived from a bundle: relative path -> last-modified timestamp.
///
/// The diff prunes entries from `files` as it decides they need no upload,
/// so the entries remaining afterwards form the upload set.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub files: HashMap<String, DateTime<Utc>>,
}

impl Manifest {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Extract a bundle into `dest_dir` and build its manifest.
///
/// Timestamps come from the archive's recorded modification times, not the
/// extraction wall clock; entries without one are pinned to the Unix epoch
/// so an existing remote copy wins over a blind re-upload.
pub fn extract_bundle(bundle_path: &Path, dest_dir: &Path) -> Result<Manifest> {
    let file = fs::File::open(bundle_path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| {
        SyncError::Bundle(format!("opening '{}' failed: {e}", bundle_path.display()))
    })?;

    let mut manifest = Manifest::default();

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| SyncError::Bundle(format!("reading entry {index} failed: {e}")))?;

        let Some(relative) = entry.enclosed_name() else {
            return Err(SyncError::Bundle(format!(
                "entry '{}' escapes the staging directory",
                entry.name()
            )));
        };
        let path = dest_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&path)?;
            continue;
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut dst = fs::File::create(&path)?;
        io::copy(&mut entry, &mut dst)?;

        let modified = entry
            .last_modified()
            .and_then(zip_datetime_to_utc)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

        debug!("Extracted {} (modified {})", entry.name(), modified);
        manifest.files.insert(entry.name().to_string(), modified);
    }

    Ok(manifest)
}

/// Convert a zip DOS timestamp to UTC. Returns None for out-of-range fields.
fn zip_datetime_to_utc(dt: zip::DateTime) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(
        i32::from(dt.year()),
        u32::from(dt.month()),
        u32::from(dt.day()),
        u32::from(dt.hour()),
        u32::from(dt.minute()),
        u32::from(dt.second()),
    )
    .single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn mtime(y: u16, mo: u8, d: u8, h: u8, mi: u8, s: u8) -> zip::DateTime {
        zip::DateTime::from_date_and_time(y, mo, d, h, mi, s).unwrap()
    }

    fn write_bundle(dir: &Path, entries: &[(&str, &[u8], zip::DateTime)]) -> PathBuf {
        let path = dir.join("bundle.zip");
        let file = fs::File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        for (name, contents, modified) in entries {
            let options = SimpleFileOptions::default().last_modified_time(*modified);
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents).unwrap();
        }
        writer.finish().unwrap();
        path
    }

    #[test]
    fn extracts_files_and_records_archive_mtimes() {
        let staging = TempDir::new().unwrap();
        let bundle = write_bundle(
            staging.path(),
            &[
                ("index.html", b"<html></html>", mtime(2024, 1, 15, 10, 30, 0)),
                ("assets/app.css", b"body {}", mtime(2024, 1, 16, 8, 0, 0)),
            ],
        );

        let manifest = extract_bundle(&bundle, staging.path()).unwrap();

        assert_eq!(manifest.len(), 2);
        assert_eq!(
            manifest.files["index.html"],
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
        );
        assert_eq!(
            manifest.files["assets/app.css"],
            Utc.with_ymd_and_hms(2024, 1, 16, 8, 0, 0).unwrap()
        );
        assert_eq!(
            fs::read_to_string(staging.path().join("assets/app.css")).unwrap(),
            "body {}"
        );
    }

    #[test]
    fn empty_bundle_yields_empty_manifest() {
        let staging = TempDir::new().unwrap();
        let bundle = write_bundle(staging.path(), &[]);

        let manifest = extract_bundle(&bundle, staging.path()).unwrap();

        assert!(manifest.is_empty());
    }

    #[test]
    fn directory_entries_are_created_but_not_listed() {
        let staging = TempDir::new().unwrap();
        let path = staging.path().join("bundle.zip");
        let file = fs::File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = || SimpleFileOptions::default().last_modified_time(mtime(2024, 2, 1, 0, 0, 0));
        writer.add_directory("assets", options()).unwrap();
        writer.start_file("assets/app.js", options()).unwrap();
        writer.write_all(b"console.log(1);").unwrap();
        writer.finish().unwrap();

        let manifest = extract_bundle(&path, staging.path()).unwrap();

        assert_eq!(manifest.len(), 1);
        assert!(manifest.files.contains_key("assets/app.js"));
        assert!(staging.path().join("assets").is_dir());
    }
}
