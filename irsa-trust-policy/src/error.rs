//! Error types for trust policy construction and role provisioning.

use crate::aws::AwsError;
use thiserror::Error;

/// Errors produced while building a trust policy or applying a binding.
///
/// Validation variants are caller errors, raised before any document exists.
#[derive(Error, Debug)]
pub enum IrsaError {
    /// A required parameter is empty or malformed.
    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    /// The AWS account id is not a 12-digit number.
    #[error("Invalid AWS account id '{0}': expected exactly 12 digits")]
    InvalidAccountId(String),

    /// The cluster issuer URL is not an EKS OIDC issuer.
    #[error("Invalid OIDC issuer URL '{0}'")]
    InvalidIssuerUrl(String),

    /// The permissions policy could not be read or is not JSON.
    #[error("Permissions policy error: {0}")]
    PermissionsPolicy(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Aws(#[from] AwsError),

    /// The credentials in use belong to another account than the trust policy names.
    #[error("Account mismatch: trust policy targets {planned} but credentials belong to {caller}")]
    AccountMismatch { planned: String, caller: String },
}

impl IrsaError {
    pub fn invalid_input(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    pub fn permissions_policy(message: impl Into<String>) -> Self {
        Self::PermissionsPolicy(message.into())
    }

    /// True for errors caused by the caller's input rather than the environment.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput { .. }
                | Self::InvalidAccountId(_)
                | Self::InvalidIssuerUrl(_)
                | Self::PermissionsPolicy(_)
        )
    }
}

pub type IrsaResult<T> = Result<T, IrsaError>;
