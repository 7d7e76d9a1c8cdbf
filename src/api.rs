//! Collaborator seam over the function-as-a-service platform.
//!
//! The pipeline only ever talks to this trait; the AWS implementation lives
//! in [`crate::aws`] and tests drive the pipeline with scripted fakes. The
//! trait is `Sync` because the alias stage fans calls out across threads.

use thiserror::Error;

use crate::options::ConfigDelta;

/// The one error distinction the pipeline cares about: a 404 on a lookup is
/// recoverable for alias probes, everything else is terminal.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Api(String),
}

/// Minimal view of the remote function's current configuration, used as an
/// existence probe before any mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionConfig {
    pub function_arn: Option<String>,
    pub handler: Option<String>,
}

/// How the code-update call receives the artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeSource {
    Inline(Vec<u8>),
    Stored { bucket: String, key: String },
}

/// Fields written by both the create and update alias branches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasSpec {
    pub name: String,
    pub version: String,
    pub description: String,
}

pub trait FunctionApi: Sync {
    fn get_function_config(&self, target: &str) -> Result<FunctionConfig, ApiError>;

    fn update_function_code(&self, target: &str, source: CodeSource) -> Result<(), ApiError>;

    fn update_function_configuration(
        &self,
        target: &str,
        delta: &ConfigDelta,
    ) -> Result<(), ApiError>;

    /// Returns the platform-assigned immutable version number.
    fn publish_version(&self, target: &str, description: &str) -> Result<String, ApiError>;

    fn get_alias(&self, target: &str, name: &str) -> Result<AliasSpec, ApiError>;

    fn create_alias(&self, target: &str, alias: &AliasSpec) -> Result<(), ApiError>;

    fn update_alias(&self, target: &str, alias: &AliasSpec) -> Result<(), ApiError>;

    /// Uploads artifact bytes to the object store in parts no larger than
    /// `part_size`, fully resolving before the caller references the object.
    fn staged_upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: &[u8],
        part_size: usize,
    ) -> Result<(), ApiError>;
}
