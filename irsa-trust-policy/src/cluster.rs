//! Cluster identity: turning an EKS cluster's reported OIDC issuer URL into an
//! [`IdentityProviderRef`].

use log::debug;
use url::Url;

use crate::error::{IrsaError, IrsaResult};
use crate::types::IdentityProviderRef;
use crate::validation::{validate_provider_id, validate_region};

impl IdentityProviderRef {
    /// Parse `https://oidc.eks.<region>.amazonaws.com/id/<provider id>`.
    ///
    /// A bare host without scheme (as it appears inside provider ARNs) is
    /// accepted too. Anything else, including other partitions, is rejected.
    pub fn from_issuer_url(issuer_url: &str) -> IrsaResult<Self> {
        let invalid = || IrsaError::InvalidIssuerUrl(issuer_url.to_string());

        let with_scheme = if issuer_url.contains("://") {
            issuer_url.to_string()
        } else {
            format!("https://{issuer_url}")
        };
        let url = Url::parse(&with_scheme).map_err(|_| invalid())?;
        if url.scheme() != "https" || url.query().is_some() || url.fragment().is_some() {
            return Err(invalid());
        }

        let region = url
            .host_str()
            .and_then(|h| h.strip_prefix("oidc.eks."))
            .and_then(|h| h.strip_suffix(".amazonaws.com"))
            .ok_or_else(invalid)?;

        let mut segments = url.path_segments().ok_or_else(invalid)?;
        let provider_id = match (segments.next(), segments.next(), segments.next()) {
            (Some("id"), Some(id), None) => id,
            _ => return Err(invalid()),
        };

        validate_region(region).map_err(|_| invalid())?;
        validate_provider_id(provider_id).map_err(|_| invalid())?;
        debug!("Issuer {issuer_url} resolved to region {region}, provider {provider_id}");

        Ok(Self::new(region.to_string(), provider_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_issuer_url() {
        let idp = IdentityProviderRef::from_issuer_url(
            "https://oidc.eks.us-east-1.amazonaws.com/id/990D1EA5775D99A9C61E4BFC50C78A8B",
        )
        .unwrap();
        assert_eq!(idp.region(), "us-east-1");
        assert_eq!(idp.provider_id(), "990D1EA5775D99A9C61E4BFC50C78A8B");
        assert_eq!(
            idp.issuer_host(),
            "oidc.eks.us-east-1.amazonaws.com/id/990D1EA5775D99A9C61E4BFC50C78A8B"
        );
    }

    #[test]
    fn test_parse_bare_issuer_host() {
        let idp =
            IdentityProviderRef::from_issuer_url("oidc.eks.ap-southeast-2.amazonaws.com/id/ABCDEF")
                .unwrap();
        assert_eq!(idp.region(), "ap-southeast-2");
        assert_eq!(idp.provider_id(), "ABCDEF");
    }

    #[test]
    fn test_reject_foreign_issuers() {
        for bad in [
            "",
            "http://oidc.eks.us-east-1.amazonaws.com/id/ABC",
            "https://accounts.google.com",
            "https://oidc.eks.us-east-1.amazonaws.com/ABC",
            "https://oidc.eks.us-east-1.amazonaws.com/id/ABC/extra",
            "https://oidc.eks.us-east-1.amazonaws.com/id/",
            "https://oidc.eks.cn-north-1.amazonaws.com.cn/id/ABC",
            "https://oidc.eks.us-gov-west-1.amazonaws.com/id/ABC",
            "https://oidc.eks.cn-north-1.amazonaws.com/id/ABC",
            "https://oidc.eks.us-east-1.amazonaws.com/id/ABC?x=1",
        ] {
            assert!(
                matches!(
                    IdentityProviderRef::from_issuer_url(bad),
                    Err(IrsaError::InvalidIssuerUrl(_))
                ),
                "{bad:?} should be rejected"
            );
        }
    }
}
