//! Data model for IRSA trust policies.
//!
//! Field names follow the IAM policy language (`Version`, `Statement`,
//! `Principal`, ...) so a [`TrustPolicyDocument`] serializes straight to the
//! JSON accepted by `CreateRole`'s `AssumeRolePolicyDocument`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::IrsaResult;

/// Policy language version marker. IAM rejects documents without it.
pub const POLICY_VERSION: &str = "2012-10-17";

/// Audience presented by EKS-projected service account tokens.
pub const STS_AUDIENCE: &str = "sts.amazonaws.com";

pub const ASSUME_ROLE_WITH_WEB_IDENTITY: &str = "sts:AssumeRoleWithWebIdentity";
pub const ASSUME_ROLE: &str = "sts:AssumeRole";

/// OIDC identity provider of an EKS cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityProviderRef {
    region: String,
    provider_id: String,
}

impl IdentityProviderRef {
    /// Construction is crate-internal so every instance has passed validation.
    pub(crate) fn new(region: String, provider_id: String) -> Self {
        Self {
            region,
            provider_id,
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    /// `oidc.eks.<region>.amazonaws.com/id/<provider id>`
    pub fn issuer_host(&self) -> String {
        format!(
            "oidc.eks.{}.amazonaws.com/id/{}",
            self.region, self.provider_id
        )
    }

    /// ARN of the IAM OIDC provider registered for this issuer in `account_id`.
    pub fn provider_arn(&self, account_id: &str) -> String {
        format!(
            "arn:aws:iam::{}:oidc-provider/{}",
            account_id,
            self.issuer_host()
        )
    }
}

/// Kubernetes service account identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAccountRef {
    pub namespace: String,
    pub name: String,
}

impl ServiceAccountRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Subject claim carried by the service account's projected token.
    pub fn subject(&self) -> String {
        format!("system:serviceaccount:{}:{}", self.namespace, self.name)
    }
}

/// Condition key to expected value. Sorted keys keep serialization stable.
pub type TrustCondition = BTreeMap<String, String>;

/// Condition block of a trust statement.
///
/// Unknown operators are rejected: IAM ANDs every operator in the block, so an
/// extra `StringLike` changes what the document matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionBlock {
    #[serde(rename = "StringEquals")]
    pub string_equals: TrustCondition,
}

/// Who may assume the role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Principal {
    /// An IAM OIDC provider ARN.
    Federated(String),
    /// An AWS service, e.g. `eks.amazonaws.com`.
    Service(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Statement {
    #[serde(rename = "Sid", default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(rename = "Effect")]
    pub effect: String,
    #[serde(rename = "Principal")]
    pub principal: Principal,
    #[serde(rename = "Action")]
    pub action: String,
    #[serde(rename = "Condition", default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ConditionBlock>,
}

/// Assume-role trust policy attached to an IAM role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrustPolicyDocument {
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "Statement")]
    pub statement: Vec<Statement>,
}

impl TrustPolicyDocument {
    /// `StringEquals` map of the first statement, if any.
    pub fn condition(&self) -> Option<&TrustCondition> {
        self.statement
            .first()
            .and_then(|s| s.condition.as_ref())
            .map(|c| &c.string_equals)
    }

    /// Federated principal ARN of the first statement, if any.
    pub fn federated_principal(&self) -> Option<&str> {
        match self.statement.first().map(|s| &s.principal) {
            Some(Principal::Federated(arn)) => Some(arn),
            _ => None,
        }
    }

    /// Issuer host embedded in the federated principal ARN.
    pub fn issuer_host(&self) -> Option<&str> {
        self.federated_principal()
            .and_then(|arn| arn.split_once(":oidc-provider/"))
            .map(|(_, host)| host)
    }

    pub fn to_json(&self) -> IrsaResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> IrsaResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> IrsaResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
