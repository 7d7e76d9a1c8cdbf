//! Deployment failure taxonomy.
//!
//! Every stage of the pipeline maps its failure into exactly one of these
//! variants; the only error any stage recovers from is the alias probe's
//! not-found case, which routes to the create branch instead of surfacing
//! here.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which write branch an alias operation took after its probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasAction {
    Create,
    Update,
}

impl fmt::Display for AliasAction {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AliasAction::Create => formatter.write_str("Creating"),
            AliasAction::Update => formatter.write_str("Updating"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("You must specify either an arn or a function name.")]
    MissingTarget,

    #[error("A staged deployment requires a bucket.")]
    MissingBucket,

    #[error("{0}")]
    InvalidOption(String),

    #[error("Unable to find function {target}, verify the function name and region are correct.")]
    FunctionNotFound { target: String },

    #[error(
        "Function lookup failed: {message}. Check your credentials, region and permissions are correct."
    )]
    FunctionLookup { message: String },

    #[error(
        "Could not read package file ({}), verify the package location is correct and that the package has already been built.",
        .path.display()
    )]
    ArtifactRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Staged upload to s3://{bucket}/{key} failed: {message}")]
    StagedUpload {
        bucket: String,
        key: String,
        message: String,
    },

    #[error(
        "Package upload failed: {message}. Check you have lambda:UpdateFunctionCode permissions and that your package is not too big to upload."
    )]
    CodeUpload { message: String },

    #[error("Could not update config, check that values and permissions are valid: {message}")]
    ConfigUpdate { message: String },

    #[error("Publishing version for function {target} failed with message {message}")]
    PublishVersion { target: String, message: String },

    #[error("Listing aliases for {target} failed with message {message}")]
    AliasProbe { target: String, message: String },

    #[error("{action} alias {name} for {target} failed with message {message}")]
    AliasWrite {
        action: AliasAction,
        name: String,
        target: String,
        message: String,
    },

    #[error("Uncaught deployment error: {0}")]
    Pipeline(String),
}
