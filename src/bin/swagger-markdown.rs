//! Swagger Markdown CLI
//!
//! Command-line interface for rendering and linting Markdown documents that
//! embed `:swg-def:` / `:swg-path:` directives.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use swagger_markdown::{lint_file, render_markdown, RenderOptions, Severity};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "swagger-markdown")]
#[command(about = "Render Swagger definitions and paths inside Markdown documents")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace directives with HTML tables and examples
    Render {
        /// Markdown document to render
        markdown: PathBuf,

        /// Schema document used by directives that name no file (path or URL)
        #[arg(long, default_value = "swagger.json")]
        file: String,

        /// URL prefix for links to definitions not rendered in this document
        #[arg(long, default_value = "")]
        definitions_url_root: String,

        /// Output file (stdout if not specified)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Check every directive without rendering
    Lint {
        /// Markdown document to lint
        markdown: PathBuf,

        /// Schema document used by directives that name no file (path or URL)
        #[arg(long, default_value = "swagger.json")]
        file: String,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Only show errors
        #[arg(long, short)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Render {
            markdown,
            file,
            definitions_url_root,
            output,
        } => {
            let options = RenderOptions::new()
                .file(file)
                .definitions_url_root(definitions_url_root);
            run_render(&markdown, &options, output)
        }
        Commands::Lint {
            markdown,
            file,
            format,
            strict,
            quiet,
        } => run_lint(&markdown, &RenderOptions::new().file(file), &format, strict, quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run_render(markdown: &Path, options: &RenderOptions, output: Option<PathBuf>) -> Result<(), u8> {
    let text = std::fs::read_to_string(markdown).map_err(|e| {
        eprintln!("Error reading {}: {}", markdown.display(), e);
        3u8
    })?;

    let rendered = render_markdown(&text, options).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &rendered).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            print!("{}", rendered);
        }
    }

    Ok(())
}

fn run_lint(
    markdown: &Path,
    options: &RenderOptions,
    format: &str,
    strict: bool,
    quiet: bool,
) -> Result<(), u8> {
    let result = lint_file(markdown, options);
    let passed = result.is_ok() && (!strict || result.warnings == 0);

    if format == "json" {
        let json = serde_json::to_string_pretty(&result).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", json);
    } else {
        if !quiet {
            println!("Linting {} ...\n", markdown.display());
        }

        for diag in &result.diagnostics {
            if quiet && diag.severity != Severity::Error {
                continue;
            }
            let (color, label) = match diag.severity {
                Severity::Error => ("\x1b[31m", "error"),
                Severity::Warning => ("\x1b[33m", "warning"),
            };
            println!(
                "  {}{}[{}]\x1b[0m: line {} {} - {}",
                color, label, diag.code, diag.line, diag.target, diag.message
            );
        }

        println!();
        if passed {
            println!(
                "\x1b[32m✓ {} directives checked, all passed\x1b[0m",
                result.directives_checked
            );
        } else {
            println!(
                "\x1b[31m✗ {} directives checked ({} errors, {} warnings)\x1b[0m",
                result.directives_checked, result.errors, result.warnings
            );
        }
    }

    if passed {
        Ok(())
    } else {
        Err(1)
    }
}
