//! Caller identity lookup.

use aws_sdk_sts::Client as StsClient;

use crate::aws::{AwsError, AwsResult};
use crate::validation::extract_account_from_arn;

/// Account id owning the credentials in use.
pub async fn caller_account_id(client: &StsClient) -> AwsResult<String> {
    let identity = client
        .get_caller_identity()
        .send()
        .await
        .map_err(|e| AwsError::StsError(format!("Failed to get caller identity: {e:?}")))?;

    identity
        .account()
        .map(str::to_string)
        .or_else(|| identity.arn().and_then(extract_account_from_arn))
        .ok_or_else(|| AwsError::StsError("Caller identity has no account id".to_string()))
}
