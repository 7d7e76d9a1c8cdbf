use std::path::PathBuf;
use std::process::exit;

use clap::{Parser, ValueEnum};
use serde_json::json;
use tokio::runtime::Handle;

use lambda_deploy::aws::AwsFunctionApi;
use lambda_deploy::credentials::{resolve_client_config, CredentialOptions};
use lambda_deploy::deploy::{run_deployment, ConsoleLog};
use lambda_deploy::error::DeployError;
use lambda_deploy::options::{
    parse_part_size, CodeDelivery, ConfigDelta, DeployPlan, PackageMetadata, StagingOptions,
    DEFAULT_REGION,
};
use lambda_deploy::target::resolve_target;

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "lambda-deploy",
    about = "Deploys a prebuilt function package to AWS Lambda",
    long_about = "Pushes a prebuilt package to AWS Lambda, reconciles the requested\n\
                  configuration, optionally publishes an immutable version, and points\n\
                  aliases at the result. Aborts on the first failing stage; nothing is\n\
                  retried or rolled back."
)]
struct Cli {
    /// Function name to deploy to
    #[arg(long)]
    function: Option<String>,
    /// Function ARN; takes precedence over --function, and a region embedded
    /// in it overrides --region
    #[arg(long)]
    arn: Option<String>,
    /// Path to the prebuilt package artifact
    #[arg(long)]
    package: PathBuf,

    /// Shared credentials profile name
    #[arg(long)]
    profile: Option<String>,
    /// IAM role to assume via instance-metadata credentials
    #[arg(long)]
    role_arn: Option<String>,
    #[arg(long, env = "AWS_ACCESS_KEY_ID")]
    access_key_id: Option<String>,
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    secret_access_key: Option<String>,
    /// JSON credentials file (accessKeyId / secretAccessKey / sessionToken)
    #[arg(long)]
    credentials_file: Option<PathBuf>,
    #[arg(long, default_value = DEFAULT_REGION)]
    region: String,

    /// Function timeout in seconds
    #[arg(long)]
    timeout: Option<i32>,
    /// Function memory in MB
    #[arg(long)]
    memory: Option<i32>,
    /// Handler identifier
    #[arg(long)]
    handler: Option<String>,
    /// Comma-separated subnet ids; applied only together with
    /// --security-group-ids
    #[arg(long, value_delimiter = ',')]
    subnet_ids: Option<Vec<String>>,
    /// Comma-separated security group ids; applied only together with
    /// --subnet-ids
    #[arg(long, value_delimiter = ',')]
    security_group_ids: Option<Vec<String>>,

    /// Publish an immutable version after the update
    #[arg(long)]
    enable_versioning: bool,
    /// Alias to point at the deployed version; repeatable
    #[arg(long = "alias")]
    aliases: Vec<String>,
    /// Also apply an alias derived from --package-version (dots become
    /// hyphens)
    #[arg(long)]
    enable_package_version_alias: bool,

    /// How the artifact reaches the platform
    #[arg(value_enum, long, default_value_t = DeployModeArg::Inline)]
    deploy_mode: DeployModeArg,
    /// Object-store bucket for staged deployments
    #[arg(long)]
    bucket: Option<String>,
    /// Object key prefix for staged deployments
    #[arg(long, default_value = "")]
    key_prefix: String,
    /// Staged-upload part size, e.g. 5mb or 512kb
    #[arg(long, default_value = "5mb")]
    part_size: String,

    /// Package name included in the deployment description
    #[arg(long)]
    package_name: Option<String>,
    /// Package semantic version included in the deployment description
    #[arg(long)]
    package_version: Option<String>,
    /// Artifact identifier included in the deployment description
    #[arg(long)]
    archive_name: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum DeployModeArg {
    /// Send the package bytes directly in the code-update call
    Inline,
    /// Upload the package to the object store first, then reference it
    Staged,
}

fn build_plan(cli: Cli) -> Result<(DeployPlan, CredentialOptions), DeployError> {
    let target = resolve_target(cli.function.as_deref(), cli.arn.as_deref(), &cli.region)?;

    let delivery = match cli.deploy_mode {
        DeployModeArg::Inline => CodeDelivery::Inline,
        DeployModeArg::Staged => {
            let bucket = cli.bucket.ok_or(DeployError::MissingBucket)?;
            CodeDelivery::Staged(StagingOptions {
                bucket,
                key_prefix: cli.key_prefix,
                part_size: parse_part_size(&cli.part_size)?,
            })
        }
    };

    let delta = ConfigDelta::from_requested(
        cli.timeout,
        cli.memory,
        cli.handler,
        cli.subnet_ids,
        cli.security_group_ids,
    );

    let plan = DeployPlan {
        target,
        package_path: cli.package,
        delivery,
        delta,
        enable_versioning: cli.enable_versioning,
        aliases: cli.aliases,
        enable_package_version_alias: cli.enable_package_version_alias,
        metadata: PackageMetadata {
            package_name: cli.package_name,
            package_version: cli.package_version,
            archive_name: cli.archive_name,
        },
    };
    let credentials = CredentialOptions {
        profile: cli.profile,
        role_arn: cli.role_arn,
        access_key_id: cli.access_key_id,
        secret_access_key: cli.secret_access_key,
        credentials_file: cli.credentials_file,
    };

    Ok((plan, credentials))
}

async fn run(cli: Cli) -> Result<(), DeployError> {
    let (plan, credentials) = build_plan(cli)?;
    log_deploy_event(
        "run_started",
        json!({
            "target": plan.target.identifier,
            "region": plan.target.region,
            "package": plan.package_path.display().to_string(),
        }),
    );

    let sdk_config = resolve_client_config(&credentials, &plan.target.region).await;
    let api = AwsFunctionApi::new(&sdk_config, Handle::current());

    let report = tokio::task::spawn_blocking(move || run_deployment(&api, &plan, &ConsoleLog))
        .await
        .map_err(|error| DeployError::Pipeline(format!("deployment task failed: {error}")))??;

    log_deploy_event("run_completed", json!({ "version": report.version }));
    Ok(())
}

fn log_deploy_event(event: &str, details: serde_json::Value) {
    eprintln!(
        "{}",
        json!({
            "component": "lambda_deploy",
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli).await {
        log_deploy_event("run_failed", json!({ "error": error.to_string() }));
        eprintln!("{error}");
        exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staged_mode_requires_a_bucket() {
        let cli = Cli::parse_from([
            "lambda-deploy",
            "--function",
            "some-function",
            "--package",
            "dist/pkg.zip",
            "--deploy-mode",
            "staged",
        ]);
        let error = build_plan(cli).expect_err("staged mode without bucket should fail");
        assert!(matches!(error, DeployError::MissingBucket));
    }

    #[test]
    fn staged_mode_carries_bucket_prefix_and_part_size() {
        let cli = Cli::parse_from([
            "lambda-deploy",
            "--function",
            "some-function",
            "--package",
            "dist/pkg.zip",
            "--deploy-mode",
            "staged",
            "--bucket",
            "artifacts",
            "--key-prefix",
            "releases/",
            "--part-size",
            "8mb",
        ]);
        let (plan, _) = build_plan(cli).expect("plan should build");
        let CodeDelivery::Staged(staging) = plan.delivery else {
            panic!("expected staged delivery");
        };
        assert_eq!(staging.bucket, "artifacts");
        assert_eq!(staging.key_prefix, "releases/");
        assert_eq!(staging.part_size, 8 * 1024 * 1024);
    }

    #[test]
    fn repeated_alias_flags_become_a_list() {
        let cli = Cli::parse_from([
            "lambda-deploy",
            "--function",
            "some-function",
            "--package",
            "dist/pkg.zip",
            "--alias",
            "beta",
            "--alias",
            "stable",
        ]);
        let (plan, _) = build_plan(cli).expect("plan should build");
        assert_eq!(plan.aliases, vec!["beta", "stable"]);
        assert!(matches!(plan.delivery, CodeDelivery::Inline));
    }

    #[test]
    fn missing_identifiers_fail_before_any_client_is_built() {
        let cli = Cli::parse_from(["lambda-deploy", "--package", "dist/pkg.zip"]);
        let error = build_plan(cli).expect_err("missing target should fail");
        assert!(matches!(error, DeployError::MissingTarget));
    }
}
