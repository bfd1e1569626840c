//! petcontract CLI - contract checks for the pet resource API

mod logging;
mod storage;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use petcontract_core::verdict::generate_schema;
use petcontract_core::{ConfigResolver, DEFAULT_ENVIRONMENT, IdSource, VerdictStatus};
use petcontract_runner::{ContractRunner, harness};

#[derive(Parser)]
#[command(name = "petcontract")]
#[command(about = "Contract-validation harness for the pet resource API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "terminal")]
    output: OutputFormat,

    /// Directory holding `<env>.json` (or `.toml`) and `routes.json`
    #[arg(long, global = true, default_value = "config")]
    config_dir: PathBuf,

    /// Environment to test against (default: dev)
    #[arg(long, global = true, env = "PETCONTRACT_ENV")]
    env: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the contract suites and clean up after them
    Run {
        /// Only run groups whose name contains this text
        #[arg(short, long)]
        group: Option<String>,

        /// Draw pet ids at random instead of counting up from a random base
        #[arg(long)]
        random_ids: bool,

        /// Save report.json and summary.json under this directory
        #[arg(long)]
        report_dir: Option<PathBuf>,
    },

    /// Show groups and request counts without sending requests
    Plan {
        /// Only plan groups whose name contains this text
        #[arg(short, long)]
        group: Option<String>,
    },

    /// Write example config files into the config directory
    Init,

    /// List environments found in the config directory
    Envs,

    /// Export JSON Schema of the run report
    Schema,
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Terminal,
    Json,
    Silent,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init();

    match run(cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(3)),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(3)
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let resolver = ConfigResolver::new(&cli.config_dir);
    let env = cli.env.as_deref();

    match cli.command {
        Commands::Run {
            group,
            random_ids,
            report_dir,
        } => {
            let mut runner = ContractRunner::from_resolver(&resolver, env)
                .context("cannot set up run")?
                .with_filter(group);
            if random_ids {
                runner = runner.with_id_source(IdSource::Random);
            }

            let report = runner.run()?;
            let verdict = report.verdict();

            match cli.output {
                OutputFormat::Terminal => {
                    println!("{}", report.to_terminal());
                    println!("  Exit code: {}", verdict.exit_code);
                }
                OutputFormat::Json => {
                    let json_output = serde_json::json!({
                        "verdict": &verdict,
                        "report": &report,
                    });
                    println!("{}", serde_json::to_string_pretty(&json_output)?);
                }
                OutputFormat::Silent => {}
            }

            if let Some(dir) = report_dir {
                match storage::save_report(&dir, &report) {
                    Ok(path) => {
                        if cli.output != OutputFormat::Silent {
                            eprintln!("Report saved: {}", path.display());
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "failed to save report"),
                }
            }

            if verdict.status == VerdictStatus::Fail {
                tracing::info!(
                    exit_code = verdict.exit_code,
                    reason = %verdict.reason,
                    "run failed"
                );
            }
            Ok(verdict.exit_code)
        }

        Commands::Plan { group } => {
            let config = resolver.resolve(env).context("cannot set up plan")?;
            let plan = harness::plan(&config, group.as_deref());
            match cli.output {
                OutputFormat::Terminal => println!("{}", plan.to_terminal()),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
                OutputFormat::Silent => {}
            }
            Ok(if plan.has_errors() { 1 } else { 0 })
        }

        Commands::Init => init(resolver.dir(), env.unwrap_or(DEFAULT_ENVIRONMENT)),

        Commands::Envs => {
            let names = resolver.available();
            if names.is_empty() {
                eprintln!("No environments in {}", resolver.dir().display());
                return Ok(1);
            }
            for name in names {
                println!("{name}");
            }
            Ok(0)
        }

        Commands::Schema => {
            println!("{}", generate_schema());
            Ok(0)
        }
    }
}

fn init(dir: &Path, env: &str) -> Result<i32> {
    let env_path = dir.join(format!("{env}.json"));
    let routes_path = dir.join("routes.json");
    if env_path.exists() {
        eprintln!("{} already exists", env_path.display());
        return Ok(1);
    }

    std::fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;
    std::fs::write(&env_path, ConfigResolver::example_environment())?;
    println!("Created {}", env_path.display());
    if !routes_path.exists() {
        std::fs::write(&routes_path, ConfigResolver::example_routes())?;
        println!("Created {}", routes_path.display());
    }

    println!("\nEdit the files to configure:");
    println!("  - baseUrl: server to test");
    println!("  - env.api_key: key sent on create and update");
    println!("  - routes.json: path of the pet resource (v2.pet)");
    Ok(0)
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
    fn env_flag_and_group_filter_parse() {
        let cli = Cli::try_parse_from([
            "petcontract",
            "run",
            "--env",
            "staging",
            "--group",
            "update",
            "--output",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.env.as_deref(), Some("staging"));
        assert!(cli.output == OutputFormat::Json);
        assert!(matches!(
            cli.command,
            Commands::Run { group: Some(ref g), random_ids: false, .. } if g == "update"
        ));
    }

    #[test]
    fn init_writes_resolvable_config() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join("config");

        assert_eq!(init(&config_dir, "dev").unwrap(), 0);
        assert_eq!(init(&config_dir, "dev").unwrap(), 1);

        let config = ConfigResolver::new(&config_dir).resolve(None).unwrap();
        assert_eq!(
            config.resource_url(petcontract_core::PET_ROUTE).unwrap(),
            "https://petstore.swagger.io/v2/pet"
        );
    }
}
