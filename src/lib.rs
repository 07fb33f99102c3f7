//! Watchface Builder - packages H5 watchfaces for WebView smartwatch hosts
//!
//! A build turns [`BuildOptions`] into a ZIP containing the template's
//! HTML/CSS/JS, an optional `preview.png` and a `manifest.json`, and reports
//! the archive's SHA-256 in a [`BuildResult`].

pub mod archive;
pub mod clock;
pub mod hashing;
pub mod manifest;
pub mod pipeline;
pub mod preview;
pub mod templates;
pub mod validation;

pub use clock::{Clock, FixedClock, SystemClock};
pub use hashing::{archive_file_name, hash_file, sanitize_file_name, sha256_hex};
pub use manifest::{ManifestData, ENTRYPOINT, MANIFEST_FILE};
pub use pipeline::{BuildError, BuildOptions, BuildResult, PreviewStatus, WatchfaceBuilder};
pub use preview::{GradientPreview, PreviewError, PreviewRenderer, PREVIEW_FILE};
pub use templates::{FileSet, GeneratedFile, TemplateKind};
pub use validation::{ValidatedOptions, ValidationError, Validator};

pub const BUILDER_VERSION: &str = env!("CARGO_PKG_VERSION");
