//! Permissions policy source.
//!
//! The permissions document attached to the role is opaque: it is checked for
//! JSON syntax and then handed to IAM exactly as it was read.

use std::path::Path;
use tokio::fs;

use crate::error::{IrsaError, IrsaResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionsPolicy {
    raw: String,
}

impl PermissionsPolicy {
    pub fn from_json_str(json: impl Into<String>) -> IrsaResult<Self> {
        let raw = json.into();
        serde_json::from_str::<serde_json::Value>(&raw)
            .map_err(|e| IrsaError::permissions_policy(format!("not valid JSON: {e}")))?;
        Ok(Self { raw })
    }

    pub async fn from_file(path: impl AsRef<Path>) -> IrsaResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).await.map_err(|e| {
            IrsaError::permissions_policy(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_json_str(raw).map_err(|e| match e {
            IrsaError::PermissionsPolicy(msg) => {
                IrsaError::permissions_policy(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    /// The document exactly as supplied.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}
