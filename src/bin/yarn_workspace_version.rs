use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use semver::Version;
use std::path::PathBuf;
use std::process::ExitCode;
use yarn_workspace_version::{
    BumpType, CommandSpec, Formatter, PropagationReport, ToolConfig, VersionManager,
    WorkspaceScanner,
};

/// Keep package.json versions in step across a Yarn monorepo
#[derive(Parser, Debug)]
#[command(name = "yarn-workspace-version", version)]
struct Cli {
    /// Repository root containing the root package.json
    #[arg(long, env = "YWV_ROOT", default_value = ".", global = true)]
    root: PathBuf,

    /// Command that prints the workspace map as JSON
    #[arg(long, env = "YWV_LIST_COMMAND", global = true)]
    list_command: Option<CommandSpec>,

    /// Command run when the root manifest has a `pretty` script
    #[arg(long, env = "YWV_FORMAT_COMMAND", global = true)]
    format_command: Option<CommandSpec>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List workspaces by display name and location
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Set every manifest to VERSION
    SetVersion {
        #[arg(value_name = "VERSION")]
        new_version: Version,
        #[arg(long)]
        dry_run: bool,
    },
    /// Bump the root version and propagate it
    Bump {
        #[command(flatten)]
        bump: BumpArgs,
        #[arg(long)]
        dry_run: bool,
    },
    /// Report version drift and stale internal dependency pins
    Check,
    /// Run the format script if the root manifest declares one
    Format,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct BumpArgs {
    #[arg(long)]
    major: bool,
    #[arg(long)]
    minor: bool,
    #[arg(long)]
    patch: bool,
    #[arg(long)]
    prerelease: bool,
}

impl BumpArgs {
    fn bump_type(&self) -> BumpType {
        if self.major {
            BumpType::Major
        } else if self.minor {
            BumpType::Minor
        } else if self.patch {
            BumpType::Patch
        } else {
            BumpType::Prerelease
        }
    }
}

impl Cli {
    fn tool_config(&self) -> ToolConfig {
        let mut config = ToolConfig::default();
        if let Some(list_command) = &self.list_command {
            config.list_command = list_command.clone();
        }
        if let Some(format_command) = &self.format_command {
            config.format_command = format_command.clone();
        }
        config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = cli.tool_config();

    match &cli.command {
        Commands::List { json } => {
            let descriptors = WorkspaceScanner::new(&cli.root, config)
                .describe()
                .await
                .context("Failed to list workspaces")?;

            if *json {
                println!("{}", serde_json::to_string_pretty(&descriptors)?);
            } else if descriptors.is_empty() {
                println!("{} No workspaces found", "Info:".blue().bold());
            } else {
                for descriptor in &descriptors {
                    println!(
                        "{}  {}",
                        descriptor.name.bright_white().bold(),
                        descriptor.path.display().to_string().dimmed()
                    );
                }
            }
        }
        Commands::SetVersion {
            new_version,
            dry_run,
        } => {
            let report = VersionManager::new(&cli.root, config)
                .propagate(&new_version.to_string(), *dry_run)
                .await
                .with_context(|| format!("Failed to set version {}", new_version))?;
            print_propagation(&report, *dry_run);
        }
        Commands::Bump { bump, dry_run } => {
            let report = VersionManager::new(&cli.root, config)
                .bump(bump.bump_type(), *dry_run)
                .await
                .context("Failed to bump version")?;
            print_propagation(&report, *dry_run);
        }
        Commands::Check => {
            let report = VersionManager::new(&cli.root, config)
                .check_consistency()
                .await
                .context("Failed to check versions")?;

            if !report.has_issues() {
                println!(
                    "{} All versions are consistent ({} package(s) at {})",
                    "✓".green().bold(),
                    report.total_packages,
                    report.root_version.as_deref().unwrap_or("no version")
                );
                return Ok(ExitCode::SUCCESS);
            }

            if !report.drift.is_empty() {
                println!("{}", "Version Drift".yellow().bold());
                for drift in &report.drift {
                    println!(
                        "  {} is at {}, root is at {}",
                        drift.package,
                        drift.found.as_deref().unwrap_or("no version"),
                        drift.expected.as_deref().unwrap_or("no version")
                    );
                }
            }
            if !report.inconsistencies.is_empty() {
                println!("{}", "Dependency Inconsistencies".yellow().bold());
                for inc in &report.inconsistencies {
                    println!(
                        "  {} pins {} at {} in {}, expected {}",
                        inc.package,
                        inc.dependency,
                        inc.found,
                        inc.kind.as_str(),
                        inc.expected
                    );
                }
            }
            return Ok(ExitCode::FAILURE);
        }
        Commands::Format => {
            let ran = Formatter::new(&cli.root, config)
                .format_if_configured()
                .await
                .context("Failed to format repository")?;
            if !ran {
                println!("{} No format script configured", "Info:".blue().bold());
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_propagation(report: &PropagationReport, dry_run: bool) {
    if dry_run {
        println!("{}", "Dry run mode: no files were written".yellow().bold());
    }

    for change in &report.changes {
        let label = change.workspace.as_deref().unwrap_or("(root)");
        println!(
            "{} {} → {}",
            label.bright_white().bold(),
            change.old_version.as_deref().unwrap_or("none"),
            report.new_version.green()
        );
        for dep in &change.dependencies {
            println!(
                "    {} {} ({})",
                "•".dimmed(),
                dep.dependency,
                dep.kind.as_str().dimmed()
            );
        }
    }

    if report.formatted {
        println!("{} Formatted repository", "✓".green().bold());
    }
}
