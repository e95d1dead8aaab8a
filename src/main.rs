//! migration-guard CLI
//!
//! Entry point for the command-line tool.
//!
//! Exit codes:
//! - 0: Report stays below the configured `fail_on` status
//! - 1: Report reaches the `fail_on` status
//! - 2: Tool error (config error, invalid plan, I/O error, etc.)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use strum::IntoEnumIterator;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use migration_guard::config::Config;
use migration_guard::input::{FilePlanLoader, PlanLoader};
use migration_guard::output::{JsonReporter, Reporter, TextReporter};
use migration_guard::rules::{Rule, RuleId};
use migration_guard::sequencer::SequencingRule;
use migration_guard::{EngineKind, analyze};

/// Default config file name used when --config is not explicitly provided.
const DEFAULT_CONFIG_FILE: &str = "migration-guard.toml";

#[derive(Parser, Debug)]
#[command(name = "migration-guard")]
#[command(about = "Static safety analyzer for schema migration plans", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Plan files (.toml or .json), analyzed as one batch in the given order
    plans: Vec<PathBuf>,

    /// Override engine kind (postgres, mysql, mariadb)
    #[arg(long, env = "MIGRATION_GUARD_ENGINE")]
    engine: Option<String>,

    /// Override engine version (e.g., 12 or 8.0.12)
    #[arg(long, env = "MIGRATION_GUARD_ENGINE_VERSION")]
    engine_version: Option<String>,

    /// Session time zone migrations run under
    #[arg(long)]
    time_zone: Option<String>,

    /// Override output format (text, json)
    #[arg(long)]
    format: Option<String>,

    /// Explain a rule (e.g., --explain MG004 or --explain validate-before-create)
    #[arg(long)]
    explain: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("migration_guard=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(exceeds_threshold) => {
            if exceeds_threshold {
                std::process::exit(1);
            }
        }
        Err(err) => {
            eprintln!("Error: {:#}", err);
            std::process::exit(2);
        }
    }
}

/// Load, analyze and report.
///
/// Returns `Ok(true)` if the report reaches the `fail_on` status,
/// `Ok(false)` otherwise, or `Err` on tool errors.
fn run(args: Args) -> Result<bool> {
    if let Some(rule_id) = args.explain {
        explain_rule(&rule_id)?;
        return Ok(false);
    }

    let mut config = load_config(&args.config)?;
    apply_overrides(&mut config, &args);
    config.validate().context("Invalid configuration")?;

    if args.plans.is_empty() {
        anyhow::bail!("No plan files given");
    }

    let engine = config.engine.build()?;
    if matches!(engine.kind(), EngineKind::Other(_)) {
        warn!(
            engine = %engine,
            "no documented thresholds for this engine; version-dependent rules report CONDITIONALLY_SAFE"
        );
    }

    let batch = FilePlanLoader::new()
        .load(&args.plans)
        .context("Failed to load migration plan")?;
    info!(units = batch.units().len(), engine = %engine, "analyzing plan");

    let report = analyze(&batch, &engine);

    let use_stdout = config.output.dir.is_none();
    let output_dir = config.output.dir.clone().unwrap_or_default();
    for format in &config.output.formats {
        let reporter: Box<dyn Reporter> = match format.to_lowercase().as_str() {
            "text" => Box::new(TextReporter::new(use_stdout)),
            "json" => Box::new(JsonReporter::new(use_stdout)),
            other => {
                warn!(format = other, "unknown output format, skipping");
                continue;
            }
        };

        reporter
            .emit(&report, &output_dir)
            .context(format!("Failed to write {} report", format))?;
    }

    info!(
        worst = %report.worst_severity(),
        violations = report.violations().len(),
        "analysis finished"
    );

    Ok(match config.fail_on()? {
        Some(threshold) => report.exceeds(threshold),
        None => false,
    })
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(engine) = &args.engine {
        config.engine.kind = engine.clone();
    }
    if let Some(version) = &args.engine_version {
        config.engine.version = version.clone();
    }
    if let Some(tz) = &args.time_zone {
        config.engine.time_zone = Some(tz.clone());
    }
    if let Some(format) = &args.format {
        config.output.formats = vec![format.clone()];
    }
}

/// Load configuration from file.
///
/// If `config_path` is `Some`, the user explicitly passed `--config` and the file
/// must exist (error if not found). If `None`, the default config path is used;
/// a missing default config file is not an error (falls back to defaults with a warning).
fn load_config(config_path: &Option<PathBuf>) -> Result<Config> {
    match config_path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Config::from_file(path).context("Failed to load configuration")
        }
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                Config::from_file(&default_path).context("Failed to load configuration")
            } else {
                warn!(
                    path = %default_path.display(),
                    "config file not found, using defaults"
                );
                Ok(Config::default())
            }
        }
    }
}

fn explain_rule(rule_id: &str) -> Result<()> {
    if let Ok(rule) = rule_id.to_uppercase().parse::<RuleId>() {
        println!("Rule: {}", rule.id());
        println!("Description: {}", rule.description());
        println!();
        println!("{}", rule.explain());
        return Ok(());
    }

    if let Ok(rule) = rule_id.to_lowercase().parse::<SequencingRule>() {
        println!("Sequencing rule: {}", rule);
        println!("Description: {}", rule.description());
        println!();
        println!("{}", rule.explain());
        return Ok(());
    }

    let known: Vec<String> = RuleId::iter()
        .map(|r| r.to_string())
        .chain(SequencingRule::all().map(|r| r.to_string()))
        .collect();
    anyhow::bail!("Unknown rule: {}. Known rules: {}", rule_id, known.join(", "))
}
