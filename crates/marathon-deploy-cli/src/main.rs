//! marathon-deploy - post-build Marathon deployment step
//!
//! The `marathon-deploy` command runs after a CI build and pushes the
//! workspace's Marathon app descriptor to the cluster.
//!
//! ## Commands
//!
//! - `deploy`: Run the post-build step for a finished build
//! - `validate`: Validate a single configuration field value
//! - `check`: Validate every URL of a job configuration file

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::future::join_all;
use marathon_deploy_client::{MarathonClientConfig, MarathonPipeline};
use marathon_deploy_core::{
    parse_variable, BuildContext, BuildOutcome, EndpointValidator, EnvironmentOverride, FormField,
    MarathonFieldValidator, MarathonLabel, MarathonRecorder, PostBuildPublisher, RunResult,
    TriggerConfig, ValidationVerdict, ValidatorConfig,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "marathon-deploy")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Deploy CI builds to Marathon", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the post-build deployment step
    Deploy(DeployArgs),

    /// Validate one configuration field value
    Validate {
        /// Field name (url, uri, app_id, docker, label_name, label_value)
        field: FormField,

        /// Value to validate (omit to validate a missing value)
        value: Option<String>,

        /// Probe timeout in milliseconds
        #[arg(long, default_value = "5000")]
        timeout_ms: u64,
    },

    /// Validate the Marathon URL and every URI of a job file
    Check {
        /// Job configuration file (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Probe timeout in milliseconds
        #[arg(long, default_value = "5000")]
        timeout_ms: u64,
    },
}

#[derive(clap::Args, Debug, Default)]
struct DeployArgs {
    /// Build result reported by the host (SUCCESS, UNSTABLE, FAILURE, ...)
    #[arg(long, env = "BUILD_RESULT")]
    result: Option<String>,

    /// Job configuration file (JSON); flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Marathon URL
    #[arg(long, env = "MARATHON_URL")]
    url: Option<String>,

    /// Application id override
    #[arg(long)]
    app_id: Option<String>,

    /// Docker image override
    #[arg(long)]
    docker: Option<String>,

    /// URI to fetch into the sandbox (repeatable)
    #[arg(long = "uri")]
    uris: Vec<String>,

    /// Label as NAME=VALUE (repeatable)
    #[arg(long = "label")]
    labels: Vec<String>,

    /// Build variable as KEY=VALUE (repeatable)
    #[arg(long = "var")]
    vars: Vec<String>,

    /// Deploy even when the build did not succeed
    #[arg(long)]
    run_on_failure: bool,

    /// Build workspace containing the descriptor template
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Descriptor template, relative to the workspace
    #[arg(long, env = "MARATHON_DESCRIPTOR")]
    descriptor: Option<String>,

    /// DC/OS authentication token
    #[arg(long, env = "MARATHON_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    marathon_deploy_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Deploy(args) => cmd_deploy(&args).await,
        Commands::Validate {
            field,
            value,
            timeout_ms,
        } => cmd_validate(field, value.as_deref(), timeout_ms).await,
        Commands::Check { config, timeout_ms } => cmd_check(&config, timeout_ms).await,
    }
}

/// Assemble the trigger configuration from the job file and flags.
fn trigger_config(args: &DeployArgs) -> Result<TriggerConfig> {
    let mut builder = match &args.config {
        Some(path) => TriggerConfig::from_file(path)
            .with_context(|| format!("Failed to load job config {}", path.display()))?
            .to_builder(),
        None => TriggerConfig::builder(args.url.clone().unwrap_or_default()),
    };

    if let Some(url) = &args.url {
        builder = builder.target_url(url);
    }
    if let Some(app_id) = &args.app_id {
        builder = builder.app_id(app_id);
    }
    if let Some(docker) = &args.docker {
        builder = builder.docker_image(docker);
    }
    for uri in &args.uris {
        builder = builder.uri(uri);
    }
    for label in &args.labels {
        let label: MarathonLabel = label.parse()?;
        builder = builder.label(label.name, label.value);
    }
    if args.run_on_failure {
        builder = builder.run_on_failure(true);
    }

    builder.build().context("Invalid deployment configuration")
}

/// Build context from the host-provided result, variables and workspace.
fn build_context(args: &DeployArgs, base_env: EnvironmentOverride) -> Result<BuildContext> {
    let outcome = args
        .result
        .as_deref()
        .map(|r| r.parse::<BuildOutcome>())
        .transpose()?
        .unwrap_or_default();

    let mut build_variables = BTreeMap::new();
    for var in &args.vars {
        let (key, value) = parse_variable(var)?;
        build_variables.insert(key, value);
    }

    Ok(BuildContext {
        outcome,
        base_env,
        build_variables,
        workspace: args.workspace.clone(),
    })
}

fn client_config(args: &DeployArgs) -> MarathonClientConfig {
    let mut config = MarathonClientConfig::from_env();
    if let Some(descriptor) = &args.descriptor {
        config = config.with_descriptor_file(descriptor);
    }
    if let Some(token) = &args.token {
        config = config.with_token(token);
    }
    config
}

async fn run_deploy(args: &DeployArgs) -> Result<RunResult> {
    let config = trigger_config(args)?;
    let build = build_context(args, EnvironmentOverride::from_process())?;
    let pipeline = Arc::new(MarathonPipeline::new(client_config(args)));
    let recorder = MarathonRecorder::new(config, pipeline);

    info!(
        publisher = recorder.display_name(),
        outcome = %build.outcome,
        "Running post-build step"
    );
    Ok(recorder.trigger(&build).await)
}

async fn cmd_deploy(args: &DeployArgs) -> Result<()> {
    let result = run_deploy(args).await?;

    println!("Run ID: {}", result.run_id);
    println!("Build: {}", result.final_status);
    let deployment = match (result.attempted, result.deployed) {
        (false, _) => "skipped".to_string(),
        (true, true) => "✓ submitted".to_string(),
        (true, false) => format!(
            "✗ failed (ignored): {}",
            result.deployment_error.as_deref().unwrap_or("unknown error")
        ),
    };
    println!("Deployment: {}", deployment);

    if result.step_succeeded() {
        Ok(())
    } else {
        anyhow::bail!("Build result is {}", result.final_status)
    }
}

fn validator(timeout_ms: u64) -> EndpointValidator {
    EndpointValidator::new(
        ValidatorConfig::default().with_probe_timeout(Duration::from_millis(timeout_ms)),
    )
}

async fn cmd_validate(field: FormField, value: Option<&str>, timeout_ms: u64) -> Result<()> {
    let fields = MarathonFieldValidator::new(validator(timeout_ms));
    let verdict = fields.validate_field(field, value).await;
    println!("{}: {}", field, verdict);

    if verdict.is_acceptable() {
        Ok(())
    } else {
        anyhow::bail!("Field '{}' is invalid", field)
    }
}

/// Validate the URL fields of the publisher's job config concurrently.
async fn check_config(publisher: &MarathonRecorder) -> Vec<(FormField, String, ValidationVerdict)> {
    let config = publisher.config();
    let mut targets = vec![(FormField::Url, config.target_url().to_string())];
    targets.extend(
        config
            .uris()
            .iter()
            .map(|uri| (FormField::Uri, uri.as_str().to_string())),
    );

    let verdicts = join_all(
        targets
            .iter()
            .map(|(field, value)| publisher.validate_field(*field, Some(value.as_str()))),
    )
    .await;

    targets
        .into_iter()
        .zip(verdicts)
        .map(|((field, value), verdict)| (field, value, verdict))
        .collect()
}

async fn cmd_check(path: &Path, timeout_ms: u64) -> Result<()> {
    let config = TriggerConfig::from_file(path)
        .with_context(|| format!("Failed to load job config {}", path.display()))?;

    let publisher = MarathonRecorder::new(config, Arc::new(MarathonPipeline::from_env()))
        .with_validator(validator(timeout_ms));
    let results = check_config(&publisher).await;

    let mut errors = 0;
    for (field, value, verdict) in &results {
        let status = match verdict {
            ValidationVerdict::Ok => "✓",
            ValidationVerdict::Warning(_) => "!",
            ValidationVerdict::Error(_) => {
                errors += 1;
                "✗"
            }
        };
        println!("  {} {} {} ({})", status, field, value, verdict);
    }

    if errors == 0 {
        Ok(())
    } else {
        anyhow::bail!("{} invalid field(s)", errors)
    }
}
