//! Per-run configuration structures and their defaults.
//!
//! Each component consumes one explicit structure instead of a shared option
//! bag: the credential options live in [`crate::credentials`], everything
//! else that drives a run is assembled here into a [`DeployPlan`].

use std::path::{Path, PathBuf};

use crate::error::DeployError;
use crate::target::ResolvedTarget;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_PART_SIZE: usize = 5 * 1024 * 1024;

/// Sentinel for the mutable, unversioned state of a function.
pub const LATEST_VERSION: &str = "$LATEST";

/// Optional package identity fed into the deployment description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageMetadata {
    pub package_name: Option<String>,
    pub package_version: Option<String>,
    pub archive_name: Option<String>,
}

/// VPC settings are only ever applied as a pair; a delta never carries half
/// of one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VpcSettings {
    pub subnet_ids: Vec<String>,
    pub security_group_ids: Vec<String>,
}

/// The configuration fields explicitly requested for this run. An empty
/// delta is a loggable no-op, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDelta {
    pub timeout: Option<i32>,
    pub memory: Option<i32>,
    pub handler: Option<String>,
    pub vpc: Option<VpcSettings>,
}

impl ConfigDelta {
    pub fn from_requested(
        timeout: Option<i32>,
        memory: Option<i32>,
        handler: Option<String>,
        subnet_ids: Option<Vec<String>>,
        security_group_ids: Option<Vec<String>>,
    ) -> Self {
        let vpc = match (subnet_ids, security_group_ids) {
            (Some(subnet_ids), Some(security_group_ids)) => Some(VpcSettings {
                subnet_ids,
                security_group_ids,
            }),
            _ => None,
        };
        ConfigDelta {
            timeout,
            memory,
            handler,
            vpc,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.timeout.is_none()
            && self.memory.is_none()
            && self.handler.is_none()
            && self.vpc.is_none()
    }
}

/// Where the staged artifact lands before the code-update call references it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingOptions {
    pub bucket: String,
    pub key_prefix: String,
    pub part_size: usize,
}

impl StagingOptions {
    /// Object key for an artifact: the configured prefix followed by the
    /// artifact's base filename.
    pub fn object_key(&self, package_path: &Path) -> String {
        let file_name = package_path
            .file_name()
            .unwrap_or(package_path.as_os_str())
            .to_string_lossy();
        format!("{}{}", self.key_prefix, file_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeDelivery {
    Inline,
    Staged(StagingOptions),
}

/// Everything the orchestrator needs for one run, resolved up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployPlan {
    pub target: ResolvedTarget,
    pub package_path: PathBuf,
    pub delivery: CodeDelivery,
    pub delta: ConfigDelta,
    pub enable_versioning: bool,
    pub aliases: Vec<String>,
    pub enable_package_version_alias: bool,
    pub metadata: PackageMetadata,
}

/// Parses a human part-size such as `5mb`, `512kb`, or a plain byte count.
pub fn parse_part_size(raw: &str) -> Result<usize, DeployError> {
    let trimmed = raw.trim();
    let digits_len = trimmed
        .bytes()
        .take_while(|byte| byte.is_ascii_digit())
        .count();
    let (digits, unit) = trimmed.split_at(digits_len);
    let value: usize = digits
        .parse()
        .map_err(|_| invalid_part_size(raw))?;
    let multiplier = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 1,
        "kb" => 1024,
        "mb" => 1024 * 1024,
        "gb" => 1024 * 1024 * 1024,
        _ => return Err(invalid_part_size(raw)),
    };
    value
        .checked_mul(multiplier)
        .filter(|bytes| *bytes > 0)
        .ok_or_else(|| invalid_part_size(raw))
}

fn invalid_part_size(raw: &str) -> DeployError {
    DeployError::InvalidOption(format!(
        "Invalid part size '{raw}', expected a byte count with an optional b/kb/mb/gb suffix."
    ))
}
