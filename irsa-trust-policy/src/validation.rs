//! Input validation shared by the builder and the service layer.
//!
//! A subtly wrong trust policy either grants too much or never matches, and IAM
//! reports neither at creation time. Everything here rejects rather than repairs.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{IrsaError, IrsaResult};

// Constant patterns; a failure here is a programming error, not input.
static REGION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2}(-[a-z]+)+-[0-9]+$").expect("valid region regex"));
static IAM_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9+=,.@_-]+$").expect("valid IAM name regex"));

/// Region prefixes outside the `aws` partition. ARNs and issuer hosts built
/// here use `arn:aws:` and `amazonaws.com`, which never match in these.
const OTHER_PARTITION_PREFIXES: [&str; 3] = ["us-gov-", "cn-", "us-iso"];

/// Account ids are exactly 12 ASCII digits.
pub fn validate_account_id(account_id: &str) -> IrsaResult<()> {
    if account_id.len() == 12 && account_id.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(IrsaError::InvalidAccountId(account_id.to_string()))
    }
}

pub fn validate_region(region: &str) -> IrsaResult<()> {
    if region.is_empty() {
        return Err(IrsaError::invalid_input("region", "must not be empty"));
    }
    if !REGION_PATTERN.is_match(region) {
        return Err(IrsaError::invalid_input(
            "region",
            format!("'{region}' is not an AWS region identifier"),
        ));
    }
    if OTHER_PARTITION_PREFIXES
        .iter()
        .any(|prefix| region.starts_with(prefix))
    {
        return Err(IrsaError::invalid_input(
            "region",
            format!("'{region}' is outside the aws partition"),
        ));
    }
    Ok(())
}

/// The segment after `/id/` in the issuer URL.
pub fn validate_provider_id(provider_id: &str) -> IrsaResult<()> {
    if provider_id.is_empty() {
        return Err(IrsaError::invalid_input("oidc provider id", "must not be empty"));
    }
    if !provider_id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(IrsaError::invalid_input(
            "oidc provider id",
            format!("'{provider_id}' must be alphanumeric"),
        ));
    }
    Ok(())
}

/// Namespace and name become `:`-separated fields of the subject claim, so a
/// `:` inside either one would let the binding match a different identity.
pub fn validate_subject_part(field: &'static str, value: &str) -> IrsaResult<()> {
    if value.is_empty() {
        return Err(IrsaError::invalid_input(field, "must not be empty"));
    }
    if value.contains(':') || value.chars().any(char::is_whitespace) {
        return Err(IrsaError::invalid_input(
            field,
            format!("'{value}' must not contain ':' or whitespace"),
        ));
    }
    Ok(())
}

/// IAM entity names: restricted alphabet, bounded length.
pub fn validate_iam_name(field: &'static str, value: &str, max_len: usize) -> IrsaResult<()> {
    if value.is_empty() {
        return Err(IrsaError::invalid_input(field, "must not be empty"));
    }
    if value.len() > max_len {
        return Err(IrsaError::invalid_input(
            field,
            format!("must be at most {max_len} characters"),
        ));
    }
    if !IAM_NAME_PATTERN.is_match(value) {
        return Err(IrsaError::invalid_input(
            field,
            format!("'{value}' contains characters IAM does not allow"),
        ));
    }
    Ok(())
}

/// Extract 12-digit account ID from ARN (field 5 in colon-delimited format)
pub fn extract_account_from_arn(arn: &str) -> Option<String> {
    let parts: Vec<&str> = arn.split(':').collect();
    if parts.len() >= 6 && validate_account_id(parts[4]).is_ok() {
        return Some(parts[4].to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_valid() {
        assert!(validate_account_id("123456789012").is_ok());
    }

    #[test]
    fn test_account_id_invalid() {
        for bad in ["abc", "", "12345678901", "1234567890123", "12345678901a", " 23456789012"] {
            assert!(
                matches!(validate_account_id(bad), Err(IrsaError::InvalidAccountId(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_region_valid() {
        for region in ["us-east-1", "ap-southeast-2", "eu-central-2", "ca-west-1"] {
            assert!(validate_region(region).is_ok(), "{region} should be accepted");
        }
    }

    #[test]
    fn test_region_invalid() {
        for region in ["", "us-east", "US-EAST-1", "us_east_1", "us-east-1/"] {
            assert!(
                matches!(validate_region(region), Err(IrsaError::InvalidInput { field: "region", .. })),
                "{region:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_region_outside_aws_partition_rejected() {
        for region in ["us-gov-west-1", "us-gov-east-1", "cn-north-1", "cn-northwest-1", "us-isob-east-1", "us-iso-east-1"] {
            let err = validate_region(region).unwrap_err();
            assert!(
                matches!(err, IrsaError::InvalidInput { field: "region", ref reason } if reason.contains("partition")),
                "{region} should be rejected as another partition, got {err}"
            );
        }
    }

    #[test]
    fn test_provider_id() {
        assert!(validate_provider_id("990D1EA5775D99A9C61E4BFC50C78A8B").is_ok());
        assert!(validate_provider_id("").is_err());
        assert!(validate_provider_id("ABC/DEF").is_err());
        assert!(validate_provider_id("ABC:sub").is_err());
    }

    #[test]
    fn test_subject_part_rejects_separator() {
        assert!(validate_subject_part("namespace", "kube-system").is_ok());
        assert!(validate_subject_part("namespace", "").is_err());
        assert!(validate_subject_part("namespace", "kube-system:other").is_err());
        assert!(validate_subject_part("service account name", "a b").is_err());
    }

    #[test]
    fn test_iam_name() {
        assert!(validate_iam_name("role name", "RoleForAlbController", 64).is_ok());
        assert!(validate_iam_name("role name", "role/with/slash", 64).is_err());
        assert!(validate_iam_name("role name", &"a".repeat(65), 64).is_err());
        assert!(validate_iam_name("role name", "", 64).is_err());
    }

    #[test]
    fn test_extract_account_from_arn_valid() {
        assert_eq!(
            extract_account_from_arn("arn:aws:iam::123456789012:role/MyRole"),
            Some("123456789012".to_string())
        );
    }

    #[test]
    fn test_extract_account_from_arn_invalid() {
        assert_eq!(extract_account_from_arn("not-an-arn"), None);
        assert_eq!(extract_account_from_arn("arn:aws:iam"), None);
        assert_eq!(extract_account_from_arn("arn:aws:iam::::"), None);
        assert_eq!(extract_account_from_arn("arn:aws:iam::12345678901:role/MyRole"), None);
    }
}
