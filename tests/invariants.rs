//! Contract Invariant Tests
//!
//! End-to-end builds checked by opening the produced archives.

use chrono::{FixedOffset, TimeZone};
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use watchface_builder::{
    templates, BuildError, BuildOptions, FixedClock, PreviewError, PreviewRenderer,
    PreviewStatus, TemplateKind, ValidationError, WatchfaceBuilder, ENTRYPOINT, MANIFEST_FILE,
    PREVIEW_FILE,
};

fn options(name: &str, template: &str, output: &Path) -> BuildOptions {
    BuildOptions {
        name: name.to_string(),
        template: template.to_string(),
        output_path: output.to_path_buf(),
        ..Default::default()
    }
}

fn fixed_clock() -> FixedClock {
    FixedClock(
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2025, 1, 21, 10, 20, 30)
            .unwrap(),
    )
}

fn read_entries(path: &Path) -> Vec<(String, Vec<u8>)> {
    let mut archive = zip::ZipArchive::new(fs::File::open(path).unwrap()).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut entry = archive.by_index(i).unwrap();
            let mut bytes = Vec::new();
            entry.read_to_end(&mut bytes).unwrap();
            (entry.name().to_string(), bytes)
        })
        .collect()
}

struct FailingPreview;

impl PreviewRenderer for FailingPreview {
    fn render(&self, _name: &str, _template: TemplateKind) -> Result<Vec<u8>, PreviewError> {
        Err(PreviewError::Io(io::Error::new(io::ErrorKind::Other, "no canvas")))
    }
}

#[test]
fn invariant_simple_build_contents() {
    let out = tempfile::tempdir().unwrap();
    let builder = WatchfaceBuilder::new();
    let opts = options("Test Clock", "simple", out.path());

    let result = builder.build(&opts).unwrap();

    assert!(result.success);
    assert!(result.error.is_none());
    assert_eq!(result.preview, PreviewStatus::NotRequested);
    assert_eq!(
        result.files,
        vec!["index.html", "style.css", "script.js", "manifest.json"]
    );
    assert_eq!(result.file_count, 4);

    let manifest: serde_json::Value = serde_json::from_str(&result.manifest).unwrap();
    assert_eq!(manifest["entrypoint"], ENTRYPOINT);
    assert_eq!(manifest["name"], "Test Clock");

    let expected = templates::produce(&builder.validate(&opts).unwrap());
    let entries = read_entries(&result.archive_path);
    let names: Vec<_> = entries.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, result.files);
    for (name, bytes) in &entries {
        if name == MANIFEST_FILE {
            assert_eq!(bytes, result.manifest.as_bytes());
        } else {
            assert_eq!(Some(std::str::from_utf8(bytes).unwrap()), expected.get(name));
        }
    }
}

#[test]
fn invariant_digest_and_size_match_archive() {
    let out = tempfile::tempdir().unwrap();
    let result = WatchfaceBuilder::new()
        .build(&options("Hash Me", "digital", out.path()))
        .unwrap();

    let bytes = fs::read(&result.archive_path).unwrap();
    assert_eq!(result.size, bytes.len() as u64);
    assert_eq!(result.file_hash, watchface_builder::sha256_hex(&bytes));
    assert_eq!(result.file_hash.len(), 64);
}

#[test]
fn invariant_file_name_sanitized() {
    let out = tempfile::tempdir().unwrap();
    let result = WatchfaceBuilder::new()
        .with_clock(fixed_clock())
        .build(&options("A/B:C", "analog", out.path()))
        .unwrap();

    let file_name = result.archive_path.file_name().unwrap().to_str().unwrap();
    assert_eq!(file_name, "ABC_v1.0.0_20250121_102030.zip");
    assert!(!file_name.contains(['/', '\\', ':', '*', '?', '"', '<', '>', '|', ' ']));
    assert_eq!(result.archive_path.parent().unwrap(), out.path());
}

#[test]
fn invariant_custom_html_only() {
    let out = tempfile::tempdir().unwrap();
    let builder = WatchfaceBuilder::new();
    let mut opts = options("Mine", "custom", out.path());
    opts.custom_html = "<h1>Hi</h1>".into();

    let files = templates::produce(&builder.validate(&opts).unwrap());
    assert_eq!(files.paths(), vec!["index.html"]);

    let result = builder.build(&opts).unwrap();
    assert_eq!(result.files, vec!["index.html", "manifest.json"]);
    let manifest: serde_json::Value = serde_json::from_str(&result.manifest).unwrap();
    assert_eq!(manifest["entrypoint"], "index.html");
}

#[test]
fn invariant_validation_rejects_before_work() {
    let out = tempfile::tempdir().unwrap();
    let target = out.path().join("never");
    let builder = WatchfaceBuilder::new();

    let err = builder.build(&options("", "simple", &target)).unwrap_err();
    assert!(matches!(err, BuildError::Validation(ValidationError::MissingName)));

    let err = builder.build(&options("x", "bogus", &target)).unwrap_err();
    assert!(matches!(
        err,
        BuildError::Validation(ValidationError::InvalidTemplate(ref t)) if t == "bogus"
    ));

    let err = builder.build(&options("x", "custom", &target)).unwrap_err();
    assert!(matches!(
        err,
        BuildError::Validation(ValidationError::MissingCustomContent)
    ));

    assert!(!target.exists());
}

#[test]
fn invariant_scratch_removed_after_success_and_failure() {
    let scratch_root = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let builder = WatchfaceBuilder::new().with_scratch_root(scratch_root.path());

    let mut opts = options("Clean", "simple", out.path());
    opts.generate_preview = true;
    builder.build(&opts).unwrap();
    assert_eq!(fs::read_dir(scratch_root.path()).unwrap().count(), 0);

    let blocker = out.path().join("not-a-dir");
    fs::write(&blocker, b"x").unwrap();
    let err = builder
        .build(&options("Clean", "simple", &blocker.join("nested")))
        .unwrap_err();
    assert!(err.is_io());
    assert!(err.to_string().contains("failed to create output directory"));
    assert_eq!(fs::read_dir(scratch_root.path()).unwrap().count(), 0);
}

#[test]
fn invariant_preview_included_before_manifest() {
    let out = tempfile::tempdir().unwrap();
    let mut opts = options("Preview", "digital", out.path());
    opts.generate_preview = true;

    let result = WatchfaceBuilder::new().build(&opts).unwrap();
    assert_eq!(result.preview, PreviewStatus::Included);
    assert_eq!(
        result.files,
        vec!["index.html", "style.css", "script.js", "preview.png", "manifest.json"]
    );

    let entries = read_entries(&result.archive_path);
    let (_, png) = entries.iter().find(|(n, _)| n == PREVIEW_FILE).unwrap();
    let image = image::load_from_memory(png).unwrap();
    assert_eq!((image.width(), image.height()), (512, 512));
}

#[test]
fn invariant_preview_failure_is_absorbed() {
    let out = tempfile::tempdir().unwrap();
    let mut opts = options("No Canvas", "analog", out.path());
    opts.generate_preview = true;

    let result = WatchfaceBuilder::new()
        .with_preview_renderer(FailingPreview)
        .build(&opts)
        .unwrap();

    assert!(result.success);
    assert!(matches!(result.preview, PreviewStatus::Failed(ref reason) if reason.contains("no canvas")));
    assert!(!result.files.iter().any(|f| f == PREVIEW_FILE));
    assert_eq!(read_entries(&result.archive_path).len(), 4);
}

#[test]
fn invariant_template_content_deterministic() {
    // The manifest timestamp differs between builds, so only the
    // template entries are compared here.
    let out_a = tempfile::tempdir().unwrap();
    let out_b = tempfile::tempdir().unwrap();
    let builder = WatchfaceBuilder::new();

    let a = builder.build(&options("Same", "analog", out_a.path())).unwrap();
    let b = builder.build(&options("Same", "analog", out_b.path())).unwrap();

    let entries_a = read_entries(&a.archive_path);
    let entries_b = read_entries(&b.archive_path);
    for ((name_a, bytes_a), (name_b, bytes_b)) in entries_a.iter().zip(&entries_b) {
        assert_eq!(name_a, name_b);
        if name_a != MANIFEST_FILE {
            assert_eq!(bytes_a, bytes_b);
        }
    }
}

#[test]
fn invariant_fixed_clock_reproducible() {
    let out_a = tempfile::tempdir().unwrap();
    let out_b = tempfile::tempdir().unwrap();
    let builder = WatchfaceBuilder::new().with_clock(fixed_clock());

    let a = builder.build(&options("Repro", "simple", out_a.path())).unwrap();
    let b = builder.build(&options("Repro", "simple", out_b.path())).unwrap();

    assert_eq!(a.manifest, b.manifest);
    assert_eq!(a.file_hash, b.file_hash);
    assert_ne!(a.build_id, b.build_id);
    assert!(a.manifest.contains("\"created_at\": \"2025-01-21T10:20:30+00:00\""));
}

#[test]
fn invariant_output_dir_created_not_wiped() {
    let out = tempfile::tempdir().unwrap();
    let existing = out.path().join("keep.txt");
    fs::write(&existing, b"keep").unwrap();
    let nested = out.path().join("a").join("b");

    let result = WatchfaceBuilder::new()
        .build(&options("Nested", "simple", &nested))
        .unwrap();

    assert!(result.archive_path.starts_with(&nested));
    assert!(result.archive_path.exists());
    assert_eq!(fs::read(&existing).unwrap(), b"keep");
}

#[test]
fn invariant_concurrent_builds_are_isolated() {
    let out = tempfile::tempdir().unwrap();
    let builder = Arc::new(WatchfaceBuilder::new());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let builder = Arc::clone(&builder);
            let opts = options(&format!("Face {i}"), "digital", out.path());
            std::thread::spawn(move || builder.build(&opts).unwrap())
        })
        .collect();

    for handle in handles {
        let result = handle.join().unwrap();
        assert_eq!(read_entries(&result.archive_path).len(), 4);
    }
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 4);
}
