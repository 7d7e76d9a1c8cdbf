//! Deployment orchestration for prebuilt AWS Lambda packages.
//!
//! This crate owns the deploy pipeline (code upload, configuration
//! reconciliation, version publishing, alias management) and keeps the AWS
//! SDK behind a single collaborator trait so the pipeline can be exercised
//! against scripted fakes. The binary in `src/main.rs` wires the pipeline to
//! the real SDK clients.

pub mod api;
pub mod arn;
pub mod aws;
pub mod credentials;
pub mod deploy;
pub mod description;
pub mod error;
pub mod options;
pub mod target;
