//! The deployment pipeline.
//!
//! A linear state machine with two optional branches and no backward
//! transitions: existence probe → read artifact → [staged upload] → update
//! code → update configuration → [publish version] → [apply aliases] →
//! [apply package-version alias]. Any stage failure terminates the run; no
//! stage is retried, skipped, or compensated.

use std::fs;
use std::thread;

use chrono::Utc;

use crate::api::{AliasSpec, ApiError, CodeSource, FunctionApi};
use crate::description::{deployment_description, package_version_alias};
use crate::error::{AliasAction, DeployError};
use crate::options::{CodeDelivery, ConfigDelta, DeployPlan, LATEST_VERSION};

/// Progress lines shown to the operator. A seam rather than direct printing
/// so tests can assert the exact line sequence a run produces.
pub trait DeployLog: Sync {
    fn writeln(&self, line: &str);
}

pub struct ConsoleLog;

impl DeployLog for ConsoleLog {
    fn writeln(&self, line: &str) {
        println!("{line}");
    }
}

/// What a completed run resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentReport {
    /// `$LATEST`, or the platform-assigned number when versioning was on.
    pub version: String,
}

pub fn run_deployment(
    api: &impl FunctionApi,
    plan: &DeployPlan,
    log: &impl DeployLog,
) -> Result<DeploymentReport, DeployError> {
    let target = plan.target.identifier.as_str();

    api.get_function_config(target).map_err(|error| match error {
        ApiError::NotFound => DeployError::FunctionNotFound {
            target: target.to_string(),
        },
        ApiError::Api(message) => DeployError::FunctionLookup { message },
    })?;

    let description = deployment_description(&plan.metadata, Utc::now());

    log.writeln("Uploading...");
    let bytes = fs::read(&plan.package_path).map_err(|source| DeployError::ArtifactRead {
        path: plan.package_path.clone(),
        source,
    })?;
    publish_code(api, plan, bytes)?;
    log.writeln("Package deployed.");

    apply_configuration(api, target, &plan.delta, log)?;

    let version = publish_version(api, plan, &description, log)?;

    apply_aliases(api, plan, &version, &description, log)?;
    apply_package_version_alias(api, plan, &version, &description, log)?;

    Ok(DeploymentReport { version })
}

/// Delivers the artifact bytes, staging them through the object store first
/// when the plan asks for it. The code-update call only runs once the staged
/// upload has fully resolved.
fn publish_code(api: &impl FunctionApi, plan: &DeployPlan, bytes: Vec<u8>) -> Result<(), DeployError> {
    let target = plan.target.identifier.as_str();

    let source = match &plan.delivery {
        CodeDelivery::Inline => CodeSource::Inline(bytes),
        CodeDelivery::Staged(staging) => {
            let key = staging.object_key(&plan.package_path);
            api.staged_upload(&staging.bucket, &key, &bytes, staging.part_size)
                .map_err(|error| DeployError::StagedUpload {
                    bucket: staging.bucket.clone(),
                    key: key.clone(),
                    message: error.to_string(),
                })?;
            CodeSource::Stored {
                bucket: staging.bucket.clone(),
                key,
            }
        }
    };

    api.update_function_code(target, source)
        .map_err(|error| DeployError::CodeUpload {
            message: error.to_string(),
        })
}

fn apply_configuration(
    api: &impl FunctionApi,
    target: &str,
    delta: &ConfigDelta,
    log: &impl DeployLog,
) -> Result<(), DeployError> {
    if delta.is_empty() {
        log.writeln("No config updates to make.");
        return Ok(());
    }

    api.update_function_configuration(target, delta)
        .map_err(|error| DeployError::ConfigUpdate {
            message: error.to_string(),
        })?;
    log.writeln("Config updated.");
    Ok(())
}

fn publish_version(
    api: &impl FunctionApi,
    plan: &DeployPlan,
    description: &str,
    log: &impl DeployLog,
) -> Result<String, DeployError> {
    if !plan.enable_versioning {
        return Ok(LATEST_VERSION.to_string());
    }

    let target = plan.target.identifier.as_str();
    let version =
        api.publish_version(target, description)
            .map_err(|error| DeployError::PublishVersion {
                target: target.to_string(),
                message: error.to_string(),
            })?;
    log.writeln(&format!("Version {version} published."));
    Ok(version)
}

/// Fans the caller-supplied alias names out concurrently and joins on all of
/// them before the pipeline advances. The first failure fails the step, but
/// in-flight siblings run to completion; their outcomes are simply not
/// surfaced.
fn apply_aliases(
    api: &impl FunctionApi,
    plan: &DeployPlan,
    version: &str,
    description: &str,
    log: &impl DeployLog,
) -> Result<(), DeployError> {
    if plan.aliases.is_empty() {
        return Ok(());
    }

    let target = plan.target.identifier.as_str();
    thread::scope(|scope| {
        let workers: Vec<_> = plan
            .aliases
            .iter()
            .map(|name| {
                scope.spawn(move || create_or_update_alias(api, target, name, version, description, log))
            })
            .collect();

        let mut outcome = Ok(());
        for worker in workers {
            let result = worker.join().unwrap_or_else(|_| {
                Err(DeployError::Pipeline("alias worker panicked".to_string()))
            });
            if let (Err(error), Ok(())) = (result, &outcome) {
                outcome = Err(error);
            }
        }
        outcome
    })
}

/// The derived package-version alias runs as its own step after the caller
/// list has completed, never concurrently with it.
fn apply_package_version_alias(
    api: &impl FunctionApi,
    plan: &DeployPlan,
    version: &str,
    description: &str,
    log: &impl DeployLog,
) -> Result<(), DeployError> {
    if !plan.enable_package_version_alias {
        return Ok(());
    }
    let Some(package_version) = &plan.metadata.package_version else {
        return Ok(());
    };

    let name = package_version_alias(package_version);
    create_or_update_alias(
        api,
        plan.target.identifier.as_str(),
        &name,
        version,
        description,
        log,
    )
}

/// Idempotent create-or-update: the alias's existence is probed, never
/// assumed. A not-found probe routes to the create branch; any other probe
/// failure aborts. Both branches overwrite the alias with the same fields
/// and report the same line.
fn create_or_update_alias(
    api: &impl FunctionApi,
    target: &str,
    name: &str,
    version: &str,
    description: &str,
    log: &impl DeployLog,
) -> Result<(), DeployError> {
    let action = match api.get_alias(target, name) {
        Ok(_) => AliasAction::Update,
        Err(ApiError::NotFound) => AliasAction::Create,
        Err(ApiError::Api(message)) => {
            return Err(DeployError::AliasProbe {
                target: target.to_string(),
                message,
            });
        }
    };

    let alias = AliasSpec {
        name: name.to_string(),
        version: version.to_string(),
        description: description.to_string(),
    };
    let written = match action {
        AliasAction::Create => api.create_alias(target, &alias),
        AliasAction::Update => api.update_alias(target, &alias),
    };
    written.map_err(|error| DeployError::AliasWrite {
        action,
        name: name.to_string(),
        target: target.to_string(),
        message: error.to_string(),
    })?;

    log.writeln(&format!(
        "Alias {name} updated pointing to version {version}."
    ));
    Ok(())
}
