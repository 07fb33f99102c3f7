//! Scratch Workspace & Archive Assembler
//!
//! Files are staged in a per-build temporary directory, then packed from disk
//! into a ZIP. The ZIP is written beside its destination and renamed into
//! place only once finalized.

use chrono::{DateTime, Datelike, FixedOffset, Timelike};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::pipeline::BuildError;

const SCRATCH_PREFIX: &str = "watchface-";

/// Build-local staging directory, removed on drop.
#[derive(Debug)]
pub struct ScratchWorkspace {
    dir: TempDir,
}

impl ScratchWorkspace {
    /// Create under the system temp dir, or under `root` when given.
    pub fn create(root: Option<&Path>) -> Result<Self, BuildError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(SCRATCH_PREFIX);
        let dir = match root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|e| BuildError::io("failed to create scratch directory", e))?;
        debug!(path = %dir.path().display(), "created scratch workspace");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn entry_path(&self, entry: &str) -> PathBuf {
        self.dir.path().join(entry)
    }

    pub fn write(&self, entry: &str, contents: &[u8]) -> Result<(), BuildError> {
        let path = self.entry_path(entry);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| BuildError::io(format!("failed to create directory for {entry}"), e))?;
        }
        fs::write(&path, contents)
            .map_err(|e| BuildError::io(format!("failed to write file {entry}"), e))?;
        debug!(entry, bytes = contents.len(), "staged file");
        Ok(())
    }
}

fn entry_time(at: &DateTime<FixedOffset>) -> zip::DateTime {
    // ZIP timestamps cannot represent years before 1980; those fall back to the epoch.
    zip::DateTime::from_date_and_time(
        u16::try_from(at.year()).unwrap_or(0),
        at.month() as u8,
        at.day() as u8,
        at.hour() as u8,
        at.minute() as u8,
        at.second() as u8,
    )
    .unwrap_or_default()
}

/// Pack `entries` (paths relative to `source_dir`) into a ZIP at `destination`,
/// in the given order.
pub fn assemble(
    source_dir: &Path,
    entries: &[String],
    destination: &Path,
    modified: &DateTime<FixedOffset>,
) -> Result<(), BuildError> {
    let parent = destination
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let staged = NamedTempFile::new_in(parent)
        .map_err(|e| BuildError::io("failed to create archive file", e))?;

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(entry_time(modified))
        .unix_permissions(0o644);

    let mut zip = ZipWriter::new(staged.as_file());
    for entry in entries {
        let contents = fs::read(source_dir.join(entry))
            .map_err(|e| BuildError::io(format!("failed to read file {entry}"), e))?;
        zip.start_file(entry.as_str(), options)?;
        zip.write_all(&contents)
            .map_err(|e| BuildError::io(format!("failed to write zip entry {entry}"), e))?;
        debug!(entry = entry.as_str(), bytes = contents.len(), "archived entry");
    }
    zip.finish()?;

    staged
        .as_file()
        .sync_all()
        .map_err(|e| BuildError::io("failed to flush archive", e))?;
    staged
        .persist(destination)
        .map_err(|e| BuildError::io("failed to move archive into place", e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Read;

    fn at() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2025, 1, 21, 12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_scratch_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let path = {
            let scratch = ScratchWorkspace::create(Some(root.path())).unwrap();
            scratch.write("a.txt", b"a").unwrap();
            assert!(scratch.entry_path("a.txt").exists());
            scratch.path().to_path_buf()
        };
        assert!(!path.exists());
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_assemble_preserves_order_and_bytes() {
        let scratch = ScratchWorkspace::create(None).unwrap();
        scratch.write("b.css", b"body{}").unwrap();
        scratch.write("a.html", b"<p>").unwrap();
        let out = tempfile::tempdir().unwrap();
        let dest = out.path().join("pkg.zip");

        let entries = vec!["b.css".to_string(), "a.html".to_string()];
        assemble(scratch.path(), &entries, &dest, &at()).unwrap();

        let mut archive = zip::ZipArchive::new(fs::File::open(&dest).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);
        let mut first = archive.by_index(0).unwrap();
        assert_eq!(first.name(), "b.css");
        let mut body = String::new();
        first.read_to_string(&mut body).unwrap();
        assert_eq!(body, "body{}");
        drop(first);
        assert_eq!(archive.by_index(1).unwrap().name(), "a.html");
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_missing_source_leaves_no_archive() {
        let scratch = ScratchWorkspace::create(None).unwrap();
        let out = tempfile::tempdir().unwrap();
        let dest = out.path().join("pkg.zip");

        let err = assemble(scratch.path(), &["missing.js".to_string()], &dest, &at()).unwrap_err();
        assert!(err.is_io());
        assert!(err.to_string().contains("missing.js"));
        assert!(!dest.exists());
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_entry_time() {
        let t = entry_time(&at());
        assert_eq!((t.year(), t.month(), t.day(), t.hour()), (2025, 1, 21, 12));
    }
}
