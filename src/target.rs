//! Resolves the single deploy target and its effective region.

use crate::arn;
use crate::error::DeployError;

/// The identifier passed to every subsequent platform call, plus the region
/// all clients are configured with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub identifier: String,
    pub region: String,
}

/// An ARN takes precedence over a plain function name, and a region embedded
/// in the ARN overrides the explicit or default region. Supplying neither
/// identifier fails before any network call is made.
pub fn resolve_target(
    function_name: Option<&str>,
    function_arn: Option<&str>,
    region: &str,
) -> Result<ResolvedTarget, DeployError> {
    let Some(identifier) = function_arn.or(function_name) else {
        return Err(DeployError::MissingTarget);
    };

    let mut region = region.to_string();
    if let Some(raw_arn) = function_arn {
        if let Some(info) = arn::parse(raw_arn) {
            if let Some(arn_region) = info.region {
                region = arn_region;
            }
        }
    }

    Ok(ResolvedTarget {
        identifier: identifier.to_string(),
        region,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::DEFAULT_REGION;

    #[test]
    fn fails_when_no_identifier_is_supplied() {
        let error = resolve_target(None, None, DEFAULT_REGION)
            .expect_err("missing identifiers should fail");
        assert!(matches!(error, DeployError::MissingTarget));
    }

    #[test]
    fn function_name_with_default_region() {
        let target = resolve_target(Some("some-function"), None, DEFAULT_REGION)
            .expect("function name should resolve");
        assert_eq!(target.identifier, "some-function");
        assert_eq!(target.region, "us-east-1");
    }

    #[test]
    fn arn_takes_precedence_over_function_name() {
        let target = resolve_target(
            Some("ignored"),
            Some("arn:aws:lambda:us-west-2:123456789012:function:Thumbnail"),
            DEFAULT_REGION,
        )
        .expect("arn should resolve");
        assert_eq!(
            target.identifier,
            "arn:aws:lambda:us-west-2:123456789012:function:Thumbnail"
        );
    }

    #[test]
    fn arn_region_overrides_explicit_region() {
        let target = resolve_target(
            None,
            Some("arn:aws:lambda:us-west-2:123456789012:function:Thumbnail"),
            "eu-central-1",
        )
        .expect("arn should resolve");
        assert_eq!(target.region, "us-west-2");
    }

    #[test]
    fn arn_without_region_keeps_explicit_region() {
        let target = resolve_target(None, Some("123456789012:Thumbnail"), "eu-central-1")
            .expect("partial arn should resolve");
        assert_eq!(target.identifier, "123456789012:Thumbnail");
        assert_eq!(target.region, "eu-central-1");
    }

    #[test]
    fn unparseable_arn_is_kept_as_literal_identifier() {
        let target = resolve_target(None, Some(":#!!"), DEFAULT_REGION)
            .expect("unparseable arn is still a target");
        assert_eq!(target.identifier, ":#!!");
        assert_eq!(target.region, "us-east-1");
    }
}
