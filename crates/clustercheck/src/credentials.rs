//! Prometheus credentials: taken from the environment or looked up in
//! Bitwarden through the `bw` CLI.

use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::error::CheckError;

/// Bitwarden item holding the Prometheus basic auth login.
pub const DEFAULT_BITWARDEN_ITEM: &str = "Prometheus Agent RemoteWrite";

/// Basic auth credentials for the metrics backend.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Where credentials come from.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn resolve(&self) -> Result<Credentials, CheckError>;
}

/// Credentials fixed at startup (`PROM_USER` / `PROM_PASS`).
#[derive(Debug, Clone)]
pub struct StaticCredentials(pub Credentials);

#[async_trait]
impl CredentialSource for StaticCredentials {
    async fn resolve(&self) -> Result<Credentials, CheckError> {
        Ok(self.0.clone())
    }
}

/// Bitwarden CLI item JSON, login fields only.
#[derive(Debug, Deserialize)]
struct BitwardenItem {
    login: BitwardenLogin,
}

#[derive(Debug, Deserialize)]
struct BitwardenLogin {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

/// Looks up a login item with `bw get item`.
#[derive(Debug, Clone)]
pub struct BitwardenCredentials {
    item: String,
    session: Option<String>,
}

impl BitwardenCredentials {
    /// `session` is forwarded as `BW_SESSION` when set.
    pub fn new(item: impl Into<String>, session: Option<String>) -> Self {
        Self {
            item: item.into(),
            session,
        }
    }
}

#[async_trait]
impl CredentialSource for BitwardenCredentials {
    async fn resolve(&self) -> Result<Credentials, CheckError> {
        debug!(item = %self.item, "Fetching credentials from Bitwarden");

        let mut cmd = Command::new("bw");
        cmd.args(["get", "item", &self.item]);
        if let Some(session) = &self.session {
            cmd.env("BW_SESSION", session);
        }

        let output = cmd.output().await.map_err(|e| {
            CheckError::Credentials(format!("Failed to get Bitwarden credentials: {e}"))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CheckError::Credentials(format!(
                "Failed to get Bitwarden credentials: {}",
                stderr.trim()
            )));
        }

        parse_bitwarden_item(&output.stdout)
    }
}

/// Extract the login from `bw get item` output.
fn parse_bitwarden_item(json: &[u8]) -> Result<Credentials, CheckError> {
    let item: BitwardenItem = serde_json::from_slice(json).map_err(|e| {
        CheckError::Credentials(format!("Failed to parse Bitwarden JSON: {e}"))
    })?;

    Ok(Credentials {
        username: item.login.username.unwrap_or_default(),
        password: item.login.password.unwrap_or_default(),
    })
}
