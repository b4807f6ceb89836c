//! Identity Center Render CLI - Bridge interface for the reconciler
//!
//! Commands: render, validate, status
//! Outputs JSON (or YAML) to stdout, logs to stderr
//! Returns 2 on validation or render failure

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use idc_render_core::{RenderInput, RenderPipeline, RendererConfig};

#[derive(Parser)]
#[command(name = "idc-render-cli", version)]
#[command(about = "Identity Center Render CLI - declarative access topology compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Renderer configuration file (YAML or JSON)
    #[arg(short, long, env = "IDC_RENDER_CONFIG", default_value = "idc-render.yaml")]
    config: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    format: Format,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

#[derive(Subcommand)]
enum Commands {
    /// Render drafts and status for a composite
    Render {
        /// Input document ({metadata, spec, observed}); `-` reads stdin
        #[arg(short, long, default_value = "-")]
        input: PathBuf,
    },

    /// Validate a composite without rendering
    Validate {
        #[arg(short, long, default_value = "-")]
        input: PathBuf,
    },

    /// Show the status summary only
    Status {
        #[arg(short, long, default_value = "-")]
        input: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    let config = match RendererConfig::load_from_path(&cli.config) {
        Ok(c) => c,
        Err(e) => return fail(&format!("Failed to load config: {}", e)),
    };

    let pipeline = RenderPipeline::new(config);

    match cli.command {
        Commands::Render { input } => {
            let input = match read_input(&input) {
                Ok(i) => i,
                Err(e) => return fail(&e),
            };

            match pipeline.render(&input) {
                Ok(output) => emit(&output, cli.format),
                Err(e) => {
                    tracing::error!(error = %e, "Render failed");
                    fail_with(&e.to_string(), ExitCode::from(2))
                }
            }
        }

        Commands::Validate { input } => {
            let input = match read_input(&input) {
                Ok(i) => i,
                Err(e) => return fail(&e),
            };

            match pipeline.validate(&input) {
                Ok(result) => {
                    let code = emit(&result, cli.format);
                    if result.valid {
                        code
                    } else {
                        ExitCode::from(2)  // Validation failure
                    }
                }
                Err(e) => fail(&e.to_string()),
            }
        }

        Commands::Status { input } => {
            let input = match read_input(&input) {
                Ok(i) => i,
                Err(e) => return fail(&e),
            };
            emit(&pipeline.status(&input), cli.format)
        }
    }
}

fn read_input(path: &Path) -> Result<RenderInput, String> {
    let mut content = String::new();
    if path == Path::new("-") {
        std::io::stdin()
            .read_to_string(&mut content)
            .map_err(|e| format!("Failed to read stdin: {}", e))?;
    } else {
        content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    }

    // YAML is a superset of JSON, so one parser covers both.
    serde_yaml::from_str(&content).map_err(|e| format!("Invalid input document: {}", e))
}

fn emit<T: Serialize>(value: &T, format: Format) -> ExitCode {
    let rendered = match format {
        Format::Json => serde_json::to_string_pretty(value).map_err(|e| e.to_string()),
        Format::Yaml => serde_yaml::to_string(value).map_err(|e| e.to_string()),
    };

    match rendered {
        Ok(text) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&format!("Failed to serialize output: {}", e)),
    }
}

fn fail(message: &str) -> ExitCode {
    fail_with(message, ExitCode::FAILURE)
}

fn fail_with(message: &str, code: ExitCode) -> ExitCode {
    let output = serde_json::json!({
        "success": false,
        "error": message,
    });
    println!("{}", output);
    code
}
