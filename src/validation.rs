//! Validation System - Rules Before Work
//!
//! Rules reject options before any filesystem work starts.
//! The first failing rule wins.

use thiserror::Error;
use tracing::{debug, warn};

use crate::pipeline::BuildOptions;
use crate::templates::TemplateKind;

pub const DEFAULT_VERSION: &str = "1.0.0";
pub const DEFAULT_AUTHOR: &str = "Anonymous";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("name is required")]
    MissingName,

    #[error("invalid template: {0}")]
    InvalidTemplate(String),

    #[error("custom template requires custom HTML content")]
    MissingCustomContent,
}

/// Options after defaults are applied and the template kind is resolved
#[derive(Debug, Clone)]
pub struct ValidatedOptions {
    pub options: BuildOptions,
    pub template: TemplateKind,
}

/// Validation rule trait - rejects options
pub trait ValidationRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn check(&self, options: &BuildOptions) -> Result<(), ValidationError>;
}

pub struct NameRule;

impl ValidationRule for NameRule {
    fn name(&self) -> &'static str { "name" }

    fn check(&self, options: &BuildOptions) -> Result<(), ValidationError> {
        if options.name.is_empty() {
            return Err(ValidationError::MissingName);
        }
        Ok(())
    }
}

pub struct TemplateRule;

impl ValidationRule for TemplateRule {
    fn name(&self) -> &'static str { "template" }

    fn check(&self, options: &BuildOptions) -> Result<(), ValidationError> {
        options.template.parse::<TemplateKind>().map(|_| ())
    }
}

pub struct CustomContentRule;

impl ValidationRule for CustomContentRule {
    fn name(&self) -> &'static str { "custom_content" }

    fn check(&self, options: &BuildOptions) -> Result<(), ValidationError> {
        if options.template == TemplateKind::Custom.as_str() && options.custom_html.is_empty() {
            return Err(ValidationError::MissingCustomContent);
        }
        Ok(())
    }
}

/// Validator runs rules in order, then fills defaults
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(NameRule),
                Box::new(TemplateRule),
                Box::new(CustomContentRule),
            ],
        }
    }

    pub fn validate(&self, options: &BuildOptions) -> Result<ValidatedOptions, ValidationError> {
        for rule in &self.rules {
            if let Err(e) = rule.check(options) {
                debug!(rule = rule.name(), error = %e, "validation failed");
                return Err(e);
            }
        }

        let template = options.template.parse::<TemplateKind>()?;
        let mut options = options.clone();
        if options.version.is_empty() {
            options.version = DEFAULT_VERSION.to_string();
        }
        if options.author.is_empty() {
            options.author = DEFAULT_AUTHOR.to_string();
        }
        options.template = template.as_str().to_string();

        // Hosts accept any version string; semver is only encouraged.
        if semver::Version::parse(&options.version).is_err() {
            warn!(version = %options.version, "version is not valid semver");
        }

        Ok(ValidatedOptions { options, template })
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
