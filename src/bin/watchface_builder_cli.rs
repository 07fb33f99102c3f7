//! Watchface Builder CLI
//!
//! Commands: templates, build
//! Outputs JSON to stdout, logs to stderr
//! Exit codes: 0 success, 1 usage or IO failure, 2 validation failure

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use watchface_builder::{BuildError, BuildOptions, BuildResult, TemplateKind, WatchfaceBuilder};

#[derive(Parser)]
#[command(name = "watchface-builder-cli")]
#[command(about = "Watchface Builder - quickly generate H5 watchface packages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available templates
    Templates,

    /// Build a watchface package
    Build(BuildArgs),
}

#[derive(clap::Args)]
struct BuildArgs {
    /// Watchface name
    #[arg(short, long, default_value = "")]
    name: String,

    /// Version number
    #[arg(short = 'v', long, default_value = "1.0.0")]
    version: String,

    /// Author name
    #[arg(short, long, default_value = "Anonymous")]
    author: String,

    /// Watchface description
    #[arg(short, long, default_value = "")]
    description: String,

    /// Template type: simple, analog, digital, custom
    #[arg(short, long, default_value = "simple")]
    template: String,

    /// Tags, comma-separated
    #[arg(long, default_value = "")]
    tags: String,

    /// Output directory
    #[arg(short, long, env = "WATCHFACE_OUTPUT", default_value = ".")]
    output: PathBuf,

    /// Do not generate preview image
    #[arg(long)]
    no_preview: bool,

    /// Custom HTML content
    #[arg(long, default_value = "")]
    custom_html: String,

    /// Custom CSS content
    #[arg(long, default_value = "")]
    custom_css: String,

    /// Custom JS content
    #[arg(long, default_value = "")]
    custom_js: String,

    /// Custom HTML file path
    #[arg(long)]
    custom_html_file: Option<PathBuf>,

    /// Custom CSS file path
    #[arg(long)]
    custom_css_file: Option<PathBuf>,

    /// Custom JS file path
    #[arg(long)]
    custom_js_file: Option<PathBuf>,

    /// Full JSON payload (BuildOptions); overrides all other flags
    #[arg(long)]
    options: Option<String>,
}

fn parse_tags(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return vec![];
    }
    raw.split(',').map(|t| t.trim().to_string()).collect()
}

fn read_or(inline: String, file: Option<&Path>) -> Result<String, BuildError> {
    match file {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| BuildError::io(format!("failed to read {}", path.display()), e)),
        None => Ok(inline),
    }
}

impl BuildArgs {
    fn into_options(self) -> Result<BuildOptions, BuildError> {
        if let Some(payload) = &self.options {
            return Ok(serde_json::from_str(payload)?);
        }
        Ok(BuildOptions {
            custom_html: read_or(self.custom_html, self.custom_html_file.as_deref())?,
            custom_css: read_or(self.custom_css, self.custom_css_file.as_deref())?,
            custom_js: read_or(self.custom_js, self.custom_js_file.as_deref())?,
            tags: parse_tags(&self.tags),
            name: self.name,
            version: self.version,
            author: self.author,
            description: self.description,
            template: self.template,
            output_path: self.output,
            generate_preview: !self.no_preview,
        })
    }
}

fn print_json(value: &impl serde::Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!(r#"{{"error": "failed to serialize output: {}"}}"#, e),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Templates => {
            let templates: Vec<_> = TemplateKind::ALL
                .iter()
                .map(|t| serde_json::json!({
                    "id": t,
                    "name": t.title(),
                    "description": t.summary(),
                }))
                .collect();
            print_json(&templates);
            ExitCode::SUCCESS
        }

        Commands::Build(args) => {
            let result = args
                .into_options()
                .and_then(|options| WatchfaceBuilder::new().build(&options));

            match result {
                Ok(result) => {
                    print_json(&result);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    print_json(&BuildResult::failure(&e));
                    match e {
                        BuildError::Validation(_) => ExitCode::from(2),
                        _ => ExitCode::FAILURE,
                    }
                }
            }
        }
    }
}
