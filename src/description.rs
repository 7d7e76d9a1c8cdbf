//! Human-readable audit string attached to published versions and aliases.

use chrono::{DateTime, Utc};

use crate::options::PackageMetadata;

/// `Deployed [package {name} ][version {version} ]on {timestamp}[ from
/// artifact {archive}]`.
pub fn deployment_description(metadata: &PackageMetadata, at: DateTime<Utc>) -> String {
    let mut description = String::from("Deployed ");

    if let Some(package_name) = &metadata.package_name {
        description.push_str(&format!("package {package_name} "));
    }
    if let Some(package_version) = &metadata.package_version {
        description.push_str(&format!("version {package_version} "));
    }

    description.push_str(&format!("on {}", at.format("%Y-%m-%d %H:%M:%S UTC")));

    if let Some(archive_name) = &metadata.archive_name {
        description.push_str(&format!(" from artifact {archive_name}"));
    }

    description
}

/// Alias name derived from a semantic package version: dots are not valid in
/// alias names, so they become hyphens.
pub fn package_version_alias(package_version: &str) -> String {
    package_version.replace('.', "-")
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn fixed_timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 14, 9, 30, 0)
            .single()
            .expect("fixed timestamp should be valid")
    }

    #[test]
    fn bare_description_carries_only_timestamp() {
        let description = deployment_description(&PackageMetadata::default(), fixed_timestamp());
        assert_eq!(description, "Deployed on 2026-02-14 09:30:00 UTC");
    }

    #[test]
    fn full_description_includes_all_parts() {
        let metadata = PackageMetadata {
            package_name: Some("my-service".to_string()),
            package_version: Some("1.2.3".to_string()),
            archive_name: Some("my-service_1-2-3.zip".to_string()),
        };
        let description = deployment_description(&metadata, fixed_timestamp());
        assert_eq!(
            description,
            "Deployed package my-service version 1.2.3 on 2026-02-14 09:30:00 UTC \
             from artifact my-service_1-2-3.zip"
        );
    }

    #[test]
    fn package_version_alias_replaces_dots() {
        assert_eq!(package_version_alias("1.2.3"), "1-2-3");
        assert_eq!(package_version_alias("2026"), "2026");
    }
}
