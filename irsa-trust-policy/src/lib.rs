//! This crate provides the core logic for IAM Roles for Service Accounts (IRSA):
//! - OIDC trust policy synthesis for one Kubernetes service account
//! - Cluster issuer URL resolution
//! - Permissions policy loading and guarded IAM role provisioning
//!

pub mod aws;
mod cluster;
pub mod commands;
mod error;
mod permissions;
mod synthesis;
mod types;
mod validation;

// Re-exports for a small, focused public API
pub use aws::iam_client::{AwsIamClient, ExistingRole, RoleProvisioner};
pub use aws::AwsError;
pub use commands::{apply_plan, plan_binding, ApplyResult, BindingPlan, BindingRequest, IrsaService};
pub use error::{IrsaError, IrsaResult};
pub use permissions::PermissionsPolicy;
pub use synthesis::{build_service_trust_policy, build_trust_policy, TrustPolicyParams};
pub use types::{
    ConditionBlock, IdentityProviderRef, Principal, ServiceAccountRef, Statement, TrustCondition,
    TrustPolicyDocument, POLICY_VERSION,
};
pub use validation::extract_account_from_arn;
