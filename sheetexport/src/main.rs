use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use sheetexport_core::{ExportConfig, Notice, OfficeLauncher, Prompter, ReportExporter};
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod prompt;

use prompt::TerminalPrompter;

#[derive(Parser)]
#[command(name = "sheetexport")]
#[command(about = "Export the baseline report sheets of a workbook to PDF", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the Excel workbook (.xlsx/.xlsm). Prompts for one when omitted.
    #[arg(value_name = "WORKBOOK")]
    file: Option<PathBuf>,

    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Office binary used for the conversion (defaults to soffice on PATH)
    #[arg(long, value_name = "PATH")]
    office: Option<PathBuf>,

    /// Answer yes to every confirmation
    #[arg(short, long)]
    yes: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let mut config = load_config(cli.config.as_deref())?;
    config.validate().context("Invalid configuration")?;
    if let Some(office) = cli.office {
        config.office_binary = Some(office);
    }

    let workbook = match cli.file {
        Some(file) => file,
        None => {
            let cwd = std::env::current_dir()?;
            let selected =
                prompt::select_workbook(&cwd, &mut io::stdin().lock(), &mut io::stdout())?;
            match selected {
                Some(file) => file,
                None => {
                    println!("No file selected. Exiting.");
                    return Ok(());
                }
            }
        }
    };

    let mut prompter = TerminalPrompter::stdio(cli.yes);

    if !workbook.exists() {
        eprintln!(
            "{}",
            format!("ERROR: File not found: {}", workbook.display()).red()
        );
        prompter.notify(&Notice::error(
            "File Not Found",
            format!("Could not find file:\n{}", workbook.display()),
        ));
        return Ok(());
    }

    println!("Starting PDF export process...");
    println!("Workbook: {}", workbook.display());

    let launcher = match &config.office_binary {
        Some(binary) => OfficeLauncher::with_binary(binary.clone()),
        None => OfficeLauncher::new(),
    };
    let exporter = ReportExporter::with_config(launcher, config);
    let outcome = exporter.export(&workbook, &mut prompter);

    if outcome.is_success() {
        println!(
            "\n{}",
            "=== Export completed successfully ===".green().bold()
        );
    } else {
        println!("\n{}", "=== Export failed or was cancelled ===".red().bold());
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ExportConfig> {
    // Try to load default config from current directory if it exists
    let default_config_path = PathBuf::from("sheetexport.toml");
    let config_path = match path {
        Some(config_path) => config_path,
        None if default_config_path.exists() => default_config_path.as_path(),
        None => {
            info!("Using default configuration");
            return Ok(ExportConfig::default());
        }
    };

    let config = ExportConfig::from_file(config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    info!("Loaded configuration from {}", config_path.display());
    Ok(config)
}
