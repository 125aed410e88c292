//! Trust policy construction (deterministic, no I/O)

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{IrsaError, IrsaResult};
use crate::types::{
    ConditionBlock, IdentityProviderRef, Principal, ServiceAccountRef, Statement,
    TrustPolicyDocument, ASSUME_ROLE, ASSUME_ROLE_WITH_WEB_IDENTITY, POLICY_VERSION, STS_AUDIENCE,
};
use crate::validation::{
    validate_account_id, validate_provider_id, validate_region, validate_subject_part,
};

/// Everything needed to bind one service account to one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustPolicyParams {
    pub account_id: String,
    pub region: String,
    pub oidc_provider_id: String,
    pub service_account: ServiceAccountRef,
}

impl TrustPolicyParams {
    /// Validate the identity-provider half of the parameters.
    pub fn identity_provider(&self) -> IrsaResult<IdentityProviderRef> {
        validate_region(&self.region)?;
        validate_provider_id(&self.oidc_provider_id)?;
        Ok(IdentityProviderRef::new(
            self.region.clone(),
            self.oidc_provider_id.clone(),
        ))
    }
}

/// Build the IRSA trust policy for `params`.
///
/// The `aud` and `sub` condition keys and the federated principal ARN are all
/// derived from one [`IdentityProviderRef`], so they cannot disagree on the
/// issuer host.
pub fn build_trust_policy(params: &TrustPolicyParams) -> IrsaResult<TrustPolicyDocument> {
    validate_account_id(&params.account_id)?;
    validate_subject_part("namespace", &params.service_account.namespace)?;
    validate_subject_part("service account name", &params.service_account.name)?;
    let idp = params.identity_provider()?;

    let issuer_host = idp.issuer_host();
    let provider_arn = idp.provider_arn(&params.account_id);
    let subject = params.service_account.subject();
    debug!("Building trust policy for {subject} via {provider_arn}");

    let mut condition = BTreeMap::new();
    condition.insert(format!("{issuer_host}:aud"), STS_AUDIENCE.to_string());
    condition.insert(format!("{issuer_host}:sub"), subject);

    Ok(TrustPolicyDocument {
        version: POLICY_VERSION.to_string(),
        statement: vec![Statement {
            sid: None,
            effect: "Allow".to_string(),
            principal: Principal::Federated(provider_arn),
            action: ASSUME_ROLE_WITH_WEB_IDENTITY.to_string(),
            condition: Some(ConditionBlock {
                string_equals: condition,
            }),
        }],
    })
}

/// Trust policy letting an AWS service assume the role, e.g. the EKS control
/// plane (`eks.amazonaws.com`) or Fargate pod execution
/// (`eks-fargate-pods.amazonaws.com`).
pub fn build_service_trust_policy(service: &str) -> IrsaResult<TrustPolicyDocument> {
    let prefix = service.strip_suffix(".amazonaws.com").unwrap_or_default();
    if prefix.is_empty()
        || !prefix
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err(IrsaError::invalid_input(
            "service principal",
            format!("'{service}' is not an AWS service principal"),
        ));
    }

    Ok(TrustPolicyDocument {
        version: POLICY_VERSION.to_string(),
        statement: vec![Statement {
            sid: None,
            effect: "Allow".to_string(),
            principal: Principal::Service(service.to_string()),
            action: ASSUME_ROLE.to_string(),
            condition: None,
        }],
    })
}
