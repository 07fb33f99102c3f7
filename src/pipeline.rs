//! Build Pipeline - Single Entry Point
//!
//! validate -> stage template files -> preview (advisory) -> manifest ->
//! prepare destination -> archive -> digest.
//!
//! The scratch workspace is owned by one `build` call and removed on every
//! exit path.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use crate::archive::{self, ScratchWorkspace};
use crate::clock::{Clock, SystemClock};
use crate::hashing::{archive_file_name, hash_file};
use crate::manifest::{self, MANIFEST_FILE};
use crate::preview::{GradientPreview, PreviewRenderer, PREVIEW_FILE};
use crate::templates;
use crate::BUILDER_VERSION;
use crate::validation::{ValidatedOptions, ValidationError, Validator, DEFAULT_AUTHOR, DEFAULT_VERSION};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BuildError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        BuildError::Io {
            context: context.into(),
            source,
        }
    }

    /// Filesystem or archive failure
    pub fn is_io(&self) -> bool {
        matches!(self, BuildError::Io { .. } | BuildError::Archive(_))
    }
}

/// Caller-supplied build input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    pub name: String,
    pub version: String,
    pub author: String,
    pub description: String,
    /// simple, analog, digital or custom
    pub template: String,
    pub tags: Vec<String>,
    pub custom_html: String,
    pub custom_css: String,
    pub custom_js: String,
    pub output_path: PathBuf,
    pub generate_preview: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            name: String::new(),
            version: DEFAULT_VERSION.to_string(),
            author: DEFAULT_AUTHOR.to_string(),
            description: String::new(),
            template: templates::TemplateKind::default().as_str().to_string(),
            tags: vec![],
            custom_html: String::new(),
            custom_css: String::new(),
            custom_js: String::new(),
            output_path: PathBuf::from("."),
            generate_preview: false,
        }
    }
}

/// What happened to the optional preview step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum PreviewStatus {
    NotRequested,
    Included,
    /// Rendering failed; the package was built without a preview
    Failed(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildResult {
    pub success: bool,
    #[serde(default)]
    pub build_id: String,
    #[serde(default)]
    pub archive_path: PathBuf,
    #[serde(default)]
    pub file_hash: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub file_count: usize,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub manifest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<FixedOffset>>,
    #[serde(default = "default_preview_status")]
    pub preview: PreviewStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn default_preview_status() -> PreviewStatus {
    PreviewStatus::NotRequested
}

impl BuildResult {
    /// Failure record for reporting; no package was produced.
    pub fn failure(error: &BuildError) -> Self {
        Self {
            success: false,
            build_id: String::new(),
            archive_path: PathBuf::new(),
            file_hash: String::new(),
            size: 0,
            file_count: 0,
            files: vec![],
            manifest: String::new(),
            created_at: None,
            preview: PreviewStatus::NotRequested,
            error: Some(error.to_string()),
        }
    }
}

/// The watchface builder. Stateless between builds and shareable across threads.
pub struct WatchfaceBuilder {
    validator: Validator,
    clock: Box<dyn Clock>,
    preview: Box<dyn PreviewRenderer>,
    scratch_root: Option<PathBuf>,
}

impl WatchfaceBuilder {
    pub fn new() -> Self {
        Self {
            validator: Validator::new(),
            clock: Box::new(SystemClock),
            preview: Box::new(GradientPreview),
            scratch_root: None,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_preview_renderer(mut self, renderer: impl PreviewRenderer + 'static) -> Self {
        self.preview = Box::new(renderer);
        self
    }

    /// Stage builds under `root` instead of the system temp directory
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    /// Validate options without building
    pub fn validate(&self, options: &BuildOptions) -> Result<ValidatedOptions, BuildError> {
        Ok(self.validator.validate(options)?)
    }

    /// Build a watchface package
    pub fn build(&self, options: &BuildOptions) -> Result<BuildResult, BuildError> {
        let build_id = Uuid::new_v4().to_string();
        let span = info_span!("build", id = %build_id, name = %options.name);
        let _guard = span.enter();

        let validated = self.validate(options)?;
        let created_at = self.clock.now();
        info!(
            template = %validated.template,
            version = %validated.options.version,
            builder = BUILDER_VERSION,
            "building watchface"
        );

        let scratch = ScratchWorkspace::create(self.scratch_root.as_deref())?;

        let files = templates::produce(&validated);
        let mut entries = Vec::with_capacity(files.len() + 2);
        for file in files.iter() {
            scratch.write(&file.path, file.content.as_bytes())?;
            entries.push(file.path.clone());
        }

        let preview = self.stage_preview(&scratch, &validated);
        if preview == PreviewStatus::Included {
            entries.push(PREVIEW_FILE.to_string());
        }

        let manifest_json = manifest::synthesize(&validated, created_at).to_json()?;
        scratch.write(MANIFEST_FILE, manifest_json.as_bytes())?;
        entries.push(MANIFEST_FILE.to_string());

        let output_dir = &validated.options.output_path;
        fs::create_dir_all(output_dir).map_err(|e| {
            BuildError::io(
                format!("failed to create output directory {}", output_dir.display()),
                e,
            )
        })?;
        let archive_path = output_dir.join(archive_file_name(
            &validated.options.name,
            &validated.options.version,
            &created_at,
        ));

        archive::assemble(scratch.path(), &entries, &archive_path, &created_at)?;

        let (file_hash, size) = digest(&archive_path)?;
        info!(path = %archive_path.display(), size, hash = %file_hash, "watchface package built");

        Ok(BuildResult {
            success: true,
            build_id,
            archive_path,
            file_hash,
            size,
            file_count: entries.len(),
            files: entries,
            manifest: manifest_json,
            created_at: Some(created_at),
            preview,
            error: None,
        })
    }

    fn stage_preview(&self, scratch: &ScratchWorkspace, options: &ValidatedOptions) -> PreviewStatus {
        if !options.options.generate_preview {
            return PreviewStatus::NotRequested;
        }
        let path = scratch.entry_path(PREVIEW_FILE);
        match self.preview.render_to(&path, &options.options.name, options.template) {
            Ok(()) => {
                debug!("staged preview");
                PreviewStatus::Included
            }
            Err(e) => {
                warn!(error = %e, "preview generation failed, continuing without it");
                // A half-written file must not be picked up later.
                let _ = fs::remove_file(&path);
                PreviewStatus::Failed(e.to_string())
            }
        }
    }
}

impl Default for WatchfaceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn digest(path: &Path) -> Result<(String, u64), BuildError> {
    let hash = hash_file(path).map_err(|e| BuildError::io("failed to calculate file hash", e))?;
    let size = fs::metadata(path)
        .map_err(|e| BuildError::io("failed to read archive metadata", e))?
        .len();
    Ok((hash, size))
}
