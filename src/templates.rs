//! Template System - Content Provider
//!
//! Each built-in kind ships three embedded files. Only the watchface name is
//! substituted, and only into the HTML title.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::validation::{ValidatedOptions, ValidationError};

pub const INDEX_HTML: &str = "index.html";
pub const STYLE_CSS: &str = "style.css";
pub const SCRIPT_JS: &str = "script.js";

const NAME_PLACEHOLDER: &str = "{{name}}";

struct Boilerplate {
    html: &'static str,
    css: &'static str,
    js: &'static str,
}

static SIMPLE: Boilerplate = Boilerplate {
    html: include_str!("../assets/templates/simple/index.html"),
    css: include_str!("../assets/templates/simple/style.css"),
    js: include_str!("../assets/templates/simple/script.js"),
};

static ANALOG: Boilerplate = Boilerplate {
    html: include_str!("../assets/templates/analog/index.html"),
    css: include_str!("../assets/templates/analog/style.css"),
    js: include_str!("../assets/templates/analog/script.js"),
};

static DIGITAL: Boilerplate = Boilerplate {
    html: include_str!("../assets/templates/digital/index.html"),
    css: include_str!("../assets/templates/digital/style.css"),
    js: include_str!("../assets/templates/digital/script.js"),
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    #[default]
    Simple,
    Analog,
    Digital,
    Custom,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 4] = [
        TemplateKind::Simple,
        TemplateKind::Analog,
        TemplateKind::Digital,
        TemplateKind::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::Simple => "simple",
            TemplateKind::Analog => "analog",
            TemplateKind::Digital => "digital",
            TemplateKind::Custom => "custom",
        }
    }

    /// Short display title used by template listings
    pub fn title(&self) -> &'static str {
        match self {
            TemplateKind::Simple => "Simple",
            TemplateKind::Analog => "Analog",
            TemplateKind::Digital => "Digital",
            TemplateKind::Custom => "Custom",
        }
    }

    pub fn summary(&self) -> &'static str {
        match self {
            TemplateKind::Simple => "Minimalist digital clock with gradient background",
            TemplateKind::Analog => "Classic analog clock with Canvas rendering",
            TemplateKind::Digital => "Tech-style digital clock with neon effects",
            TemplateKind::Custom => "Fully customizable with your own HTML/CSS/JS",
        }
    }

    fn boilerplate(&self) -> Option<&'static Boilerplate> {
        match self {
            TemplateKind::Simple => Some(&SIMPLE),
            TemplateKind::Analog => Some(&ANALOG),
            TemplateKind::Digital => Some(&DIGITAL),
            TemplateKind::Custom => None,
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateKind {
    type Err = ValidationError;

    /// An empty string selects the default kind. Matching is case-sensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "simple" => Ok(TemplateKind::Simple),
            "analog" => Ok(TemplateKind::Analog),
            "digital" => Ok(TemplateKind::Digital),
            "custom" => Ok(TemplateKind::Custom),
            other => Err(ValidationError::InvalidTemplate(other.to_string())),
        }
    }
}

/// One generated file, addressed by its archive-relative path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
}

/// Ordered set of generated files.
///
/// Iteration order is insertion order and becomes the archive entry order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSet {
    files: Vec<GeneratedFile>,
}

impl FileSet {
    fn push(&mut self, path: &str, content: impl Into<String>) {
        self.files.push(GeneratedFile {
            path: path.to_string(),
            content: content.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|f| f.path == path)
            .map(|f| f.content.as_str())
    }

    pub fn paths(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.path.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeneratedFile> {
        self.files.iter()
    }
}

/// Produce the file set for the validated options.
pub fn produce(options: &ValidatedOptions) -> FileSet {
    let mut files = FileSet::default();

    match options.template.boilerplate() {
        Some(boilerplate) => {
            files.push(
                INDEX_HTML,
                boilerplate.html.replace(NAME_PLACEHOLDER, &options.options.name),
            );
            files.push(STYLE_CSS, boilerplate.css);
            files.push(SCRIPT_JS, boilerplate.js);
        }
        None => {
            let opts = &options.options;
            for (path, content) in [
                (INDEX_HTML, &opts.custom_html),
                (STYLE_CSS, &opts.custom_css),
                (SCRIPT_JS, &opts.custom_js),
            ] {
                if !content.is_empty() {
                    files.push(path, content.as_str());
                }
            }
        }
    }

    files
}
