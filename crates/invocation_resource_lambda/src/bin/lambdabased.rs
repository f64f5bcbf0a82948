use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use invocation_resource_core::lifecycle::LifecycleHandler;
use invocation_resource_core::reconcile::{destroy, plan, reconcile, ReconcileReport};
use invocation_resource_core::state::StateDocument;
use invocation_resource_lambda::adapters::invoke::AwsLambdaInvoker;
use invocation_resource_lambda::config::{build_lambda_client, Manifest, ProviderOverrides};

#[derive(Parser)]
#[command(
    name = "lambdabased",
    about = "Manage resources whose lifecycle is a Lambda invocation",
    long_about = "Applies a manifest of Lambda-backed resources: each resource invokes its\n\
                  function on create or change, and optionally a finalizer on removal."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Manifest declaring the provider and resources
    #[arg(
        long,
        global = true,
        env = "LAMBDABASED_MANIFEST",
        default_value = "lambdabased.json"
    )]
    manifest: PathBuf,
    /// State file holding the last-applied records
    #[arg(
        long,
        global = true,
        env = "LAMBDABASED_STATE",
        default_value = "lambdabased.state.json"
    )]
    state: PathBuf,
    /// Shared config profile (overrides the manifest)
    #[arg(long, global = true, env = "AWS_PROFILE")]
    profile: Option<String>,
    /// Region (overrides the manifest)
    #[arg(long, global = true, env = "AWS_REGION")]
    region: Option<String>,
    /// Role to assume before invoking (overrides the manifest)
    #[arg(long, global = true, env = "LAMBDABASED_ASSUME_ROLE_ARN")]
    assume_role_arn: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what apply would do without invoking anything
    Plan,
    /// Create, update and delete resources to match the manifest
    Apply,
    /// Delete every tracked resource, running finalizers
    Destroy,
}

async fn run(cli: Cli) -> Result<ReconcileReport, String> {
    let manifest = Manifest::load(&cli.manifest)
        .map_err(|error| error.to_string())?;
    let mut state = StateDocument::load(&cli.state)
        .map_err(|error| error.to_string())?;

    if matches!(cli.command, Commands::Plan) {
        return Ok(plan(&manifest.resources, &state));
    }

    let provider = manifest.provider.clone().with_overrides(ProviderOverrides {
        profile: cli.profile,
        region: cli.region,
        assume_role_arn: cli.assume_role_arn,
    });
    let invoker = AwsLambdaInvoker::new(build_lambda_client(&provider).await);
    let handler = LifecycleHandler::new(&invoker);

    let report = match cli.command {
        Commands::Destroy => destroy(&mut state, &handler),
        _ => reconcile(&manifest.resources, &mut state, &handler),
    };

    state.save(&cli.state).map_err(|error| error.to_string())?;
    Ok(report)
}

#[tokio::main]
async fn main() -> ExitCode {
    let report = match run(Cli::parse()).await {
        Ok(value) => value,
        Err(message) => {
            eprintln!("error: {message}");
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&report) {
        Ok(body) => println!("{body}"),
        Err(error) => {
            eprintln!("error: failed to serialize report: {error}");
            return ExitCode::FAILURE;
        }
    }

    if report.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "lambdabased",
            "apply",
            "--manifest",
            "stack.json",
            "--state",
            "stack.state.json",
            "--region",
            "us-east-1",
        ])
        .expect("arguments should parse");

        assert!(matches!(cli.command, Commands::Apply));
        assert_eq!(cli.manifest, PathBuf::from("stack.json"));
        assert_eq!(cli.state, PathBuf::from("stack.state.json"));
        assert_eq!(cli.region.as_deref(), Some("us-east-1"));
    }

    #[test]
    fn rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["lambdabased", "refresh"]).is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn plan_runs_without_aws_access() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manifest_path = dir.path().join("lambdabased.json");
        std::fs::write(
            &manifest_path,
            r#"{"resources": {"seed": {"function_name": "f1", "input": "{\"param\":\"v1\"}"}}}"#,
        )
        .expect("write manifest");

        let cli = Cli::try_parse_from([
            "lambdabased".to_string(),
            "plan".to_string(),
            "--manifest".to_string(),
            manifest_path.display().to_string(),
            "--state".to_string(),
            dir.path().join("state.json").display().to_string(),
        ])
        .expect("arguments should parse");

        let report = run(cli).await.expect("plan should succeed");
        let seed = report.outcome("seed").expect("seed outcome");
        assert_eq!(
            seed.action,
            invocation_resource_core::reconcile::PlannedAction::Create
        );
        assert!(!dir.path().join("state.json").exists());
    }
}
