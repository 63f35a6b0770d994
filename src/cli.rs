use crate::config::{load_config, load_config_from, VitalsConfig, CONFIG_FILE_NAME};
use crate::io::{self, create_writer, OutputFormat as WriterFormat};
use crate::pipeline::{AnalysisCoordinator, AnalysisOptions, DEFAULT_PER_FILE_TIMEOUT_MS};
use crate::progress::CliObserver;
use crate::security::BanditReportProvider;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "repo-vitals")]
#[command(about = "Repository health analyzer for Python codebases", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a repository and report its health metrics
    Analyze {
        /// Repository root
        path: PathBuf,

        /// Also analyze test_*.py and *_test.py files
        #[arg(long)]
        include_tests: bool,

        /// Analyze at most this many files, in path order
        #[arg(long)]
        max_files: Option<usize>,

        /// Per-file read and parse timeout in milliseconds
        #[arg(long = "timeout-ms", default_value_t = DEFAULT_PER_FILE_TIMEOUT_MS)]
        timeout_ms: u64,

        /// Extraction worker threads (0 = all cores)
        #[arg(short, long, env = "REPO_VITALS_JOBS")]
        jobs: Option<usize>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration file (defaults to the nearest .repo-vitals.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Bandit JSON report to take vulnerability counts from
        #[arg(long)]
        vulnerability_report: Option<PathBuf>,

        /// Suppress progress messages
        #[arg(short, long)]
        quiet: bool,

        /// Disable colored output
        #[arg(long)]
        plain: bool,
    },

    /// Write a configuration file with the default settings
    Init {
        /// Directory to write the configuration into
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Terminal,
}

impl From<OutputFormat> for WriterFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => WriterFormat::Json,
            OutputFormat::Terminal => WriterFormat::Terminal,
        }
    }
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Analyze {
            path,
            include_tests,
            max_files,
            timeout_ms,
            jobs,
            format,
            output,
            config,
            vulnerability_report,
            quiet,
            plain,
        } => {
            if plain {
                colored::control::set_override(false);
            }
            let config = resolve_config(&path, config.as_deref())?;
            let options = AnalysisOptions::default()
                .with_include_tests(include_tests)
                .with_max_files(max_files)
                .with_per_file_timeout_ms(timeout_ms)
                .with_jobs(jobs);

            let mut coordinator = AnalysisCoordinator::new(config)
                .with_observer(Arc::new(CliObserver::new(quiet)));
            if let Some(report) = vulnerability_report {
                coordinator =
                    coordinator.with_vulnerability_provider(Box::new(BanditReportProvider::new(report)));
            }

            let result = coordinator.analyze(&path, &options)?;

            let sink: Box<dyn std::io::Write> = match &output {
                Some(file) => Box::new(
                    std::fs::File::create(file)
                        .with_context(|| format!("Failed to create {}", file.display()))?,
                ),
                None => Box::new(std::io::stdout()),
            };
            create_writer(format.into(), sink).write_result(&result)?;
            Ok(())
        }
        Commands::Init { path, force } => init_config(&path, force),
    }
}

fn resolve_config(root: &Path, explicit: Option<&Path>) -> Result<VitalsConfig> {
    match explicit {
        Some(file) => load_config_from(file).map_err(anyhow::Error::msg),
        None => Ok(load_config(root)),
    }
}

pub fn init_config(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    let body = toml::to_string_pretty(&VitalsConfig::default())
        .context("Failed to render default configuration")?;
    let contents = format!("# repo-vitals configuration\n\n{body}");
    io::write_file(&config_path, &contents)?;
    println!("Created {}", config_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parses_analyze_flags() {
        let cli = Cli::try_parse_from([
            "repo-vitals",
            "analyze",
            "repo",
            "--include-tests",
            "--max-files",
            "10",
            "--timeout-ms",
            "250",
            "--format",
            "json",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbosity, 2);
        match cli.command {
            Commands::Analyze {
                path,
                include_tests,
                max_files,
                timeout_ms,
                format,
                ..
            } => {
                assert_eq!(path, PathBuf::from("repo"));
                assert!(include_tests);
                assert_eq!(max_files, Some(10));
                assert_eq!(timeout_ms, 250);
                assert_eq!(format, OutputFormat::Json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn init_writes_loadable_config() {
        let temp = TempDir::new().unwrap();
        init_config(temp.path(), false).unwrap();
        let loaded = load_config_from(&temp.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(loaded.limits, VitalsConfig::default().limits);
        assert!(init_config(temp.path(), false).is_err());
        assert!(init_config(temp.path(), true).is_ok());
    }
}
