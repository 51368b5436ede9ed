use clap::{Parser, Subcommand};
use colored::Colorize;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use chatdbt_core::{Config, Diagnostic, LoadReport, Severity};
use chatdbt_project::{LoadError, ProjectLoader};

/// Config file picked up from the working directory when `--config` is not given
const DEFAULT_CONFIG: &str = "chatdbt.toml";

/// ChatDBT - turn a dbt project into text units for retrieval
#[derive(Parser)]
#[command(name = "chatdbt")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: chatdbt.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// dbt project root (overrides config and DBT_PROJECT_PATH)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the project and write every text unit to a file
    Load {
        /// Output file
        #[arg(short, long, default_value = "units.json")]
        output: PathBuf,

        /// Write one unit per line instead of a full report
        #[arg(long)]
        jsonl: bool,
    },

    /// Load the project and print unit counts and diagnostics
    Stats,

    /// Write a config file with the default settings
    InitConfig {
        /// Where to write the config
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // A missing .env is fine
    dotenvy::dotenv().ok();

    init_tracing(cli.verbose);

    if let Commands::InitConfig { output, force } = &cli.command {
        return init_config_command(output, *force);
    }

    let config = load_config(&cli)?;

    if cli.verbose {
        eprintln!("{} {}", "Project root:".cyan(), config.resolved_project_root().display());
        eprintln!("{} {}", "Compiled SQL:".cyan(), config.resolved_compiled_root().display());
        eprintln!("{} {}", "Manifest:".cyan(), config.resolved_manifest_path().display());
    }

    let loader = ProjectLoader::new(config);

    match cli.command {
        Commands::Load { output, jsonl } => load_command(&loader, &output, jsonl, cli.verbose),
        Commands::Stats => stats_command(&loader),
        Commands::InitConfig { .. } => Ok(()),
    }
}

/// Log to stderr; `RUST_LOG` wins over `--verbose`
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Config file, then environment, then command-line flags
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)
            .with_context(|| format!("Failed to load config {}", config_path.display()))?
    } else if Path::new(DEFAULT_CONFIG).exists() {
        Config::from_file(Path::new(DEFAULT_CONFIG))
            .with_context(|| format!("Failed to load config {}", DEFAULT_CONFIG))?
    } else {
        if cli.verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    config.apply_env();

    if let Some(project) = &cli.project {
        // Relative to where the command runs, not to the config file
        config.project_root = std::env::current_dir()?.join(project);
    }

    Ok(config)
}

/// Run the loader; an empty corpus is reported and exits with status 1
fn run_loader(loader: &ProjectLoader) -> LoadReport {
    match loader.load() {
        Ok(report) => report,
        Err(LoadError::EmptyCorpus { project_root, diagnostics }) => {
            eprintln!(
                "{} {}",
                "No documents found in".red().bold(),
                project_root.display()
            );
            eprintln!("Check the project path and run `dbt compile` before loading.");
            print_diagnostics(&diagnostics);
            std::process::exit(1);
        }
    }
}

/// Load command - write units to disk
fn load_command(loader: &ProjectLoader, output: &Path, jsonl: bool, verbose: bool) -> Result<()> {
    if verbose {
        eprintln!("{}", "Loading dbt project...".cyan());
    }

    let report = run_loader(loader);

    if jsonl {
        write_jsonl(&report, output)
            .with_context(|| format!("Failed to write {}", output.display()))?;
    } else {
        report
            .save_to_file(output)
            .with_context(|| format!("Failed to write {}", output.display()))?;
    }

    if verbose {
        eprintln!("{} {}", "Units saved to:".green(), output.display());
    }

    print_summary(&report);
    Ok(())
}

/// Stats command - summary only
fn stats_command(loader: &ProjectLoader) -> Result<()> {
    let report = run_loader(loader);
    print_summary(&report);
    Ok(())
}

/// Init-config command - write the default config
fn init_config_command(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite it",
            output.display()
        );
    }

    Config::default()
        .save_to_file(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("{} {}", "✓ Wrote".green(), output.display());
    Ok(())
}

fn write_jsonl(report: &LoadReport, output: &Path) -> Result<()> {
    let mut file = std::io::BufWriter::new(std::fs::File::create(output)?);
    for unit in &report.units {
        serde_json::to_writer(&mut file, unit)?;
        file.write_all(b"\n")?;
    }
    file.flush()?;
    Ok(())
}

/// Print report summary to stdout
fn print_summary(report: &LoadReport) {
    let summary = &report.summary;

    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "dbt Project Load Report".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("Timestamp: {}", report.generated_at);
    println!();

    println!("{}", "Units:".bold());
    println!("  Total:              {}", summary.total_units.to_string().green().bold());
    println!("  SQL models:         {}", summary.sql_models);
    println!("  Schema files:       {}", summary.schema_files);
    println!("  Manifest resources: {}", summary.manifest_resources);
    println!("  Manifest columns:   {}", summary.manifest_columns);
    println!();

    if report.skipped() > 0 {
        println!("  Skipped: {}", report.skipped().to_string().yellow());
    } else {
        println!("  Skipped: {}", "0".green());
    }
    println!();

    if report.diagnostics.is_empty() {
        println!("{}", "✓ Nothing skipped".green().bold());
    } else {
        print_diagnostics(&report.diagnostics);
    }
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    println!("{}", "Diagnostics:".bold());
    for diag in diagnostics {
        let severity = match diag.severity {
            Severity::Error => "ERROR".red().bold(),
            Severity::Warn => "WARN".yellow().bold(),
            Severity::Info => "INFO".cyan(),
        };

        println!("  [{}] {}: {}", severity, diag.code, diag.message);
        if let Some(path) = &diag.path {
            println!("    at {}", path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_load_flags() {
        let cli = Cli::parse_from(["chatdbt", "--project", "shop", "load", "--jsonl", "-o", "units.jsonl"]);

        assert_eq!(cli.project, Some(PathBuf::from("shop")));
        match cli.command {
            Commands::Load { output, jsonl } => {
                assert_eq!(output, PathBuf::from("units.jsonl"));
                assert!(jsonl);
            }
            _ => panic!("expected load"),
        }
    }

    #[test]
    fn init_config_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chatdbt.toml");
        std::fs::write(&path, "project_root = \"keep\"\n").unwrap();

        assert!(init_config_command(&path, false).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "project_root = \"keep\"\n");

        init_config_command(&path, true).unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.project_root, PathBuf::from("."));
    }
}
