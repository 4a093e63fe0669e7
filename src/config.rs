use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

pub const DEFAULT_API_VERSION: &str = "64.0";
pub const DEFAULT_DATA_SPACE: &str = "default";
const ENV_SECRET_PREFIX: &str = "env:";

/// Source and destination orgs for a run, loaded once from a JSON file.
#[derive(Debug, Clone, Deserialize)]
pub struct MigrationConfig {
    pub source: OrgConfig,
    pub destination: OrgConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrgConfig {
    /// Host name such as `acme.my.salesforce.com`, or a full base URL.
    pub instance: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_data_space")]
    pub data_space: String,
    pub auth: AuthConfig,
}

impl OrgConfig {
    pub fn base_url(&self) -> String {
        let instance = self.instance.trim().trim_end_matches('/');
        if instance.starts_with("https://") || instance.starts_with("http://") {
            instance.to_string()
        } else {
            format!("https://{instance}")
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "grant", rename_all = "snake_case")]
pub enum AuthConfig {
    /// SOAP partner login.
    Password { username: String, password: Secret },
    /// OAuth 2 client-credentials flow against an external client app.
    ClientCredentials {
        client_id: String,
        client_secret: Secret,
    },
}

/// A credential value. Written either literally or as `env:VAR_NAME`.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    fn resolve(&mut self, field: &str) -> Result<()> {
        if let Some(name) = self.0.strip_prefix(ENV_SECRET_PREFIX) {
            let name = name.trim();
            let value = std::env::var(name)
                .with_context(|| format!("{field} refers to unset environment variable {name}"))?;
            self.0 = value;
        }
        Ok(())
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_data_space() -> String {
    DEFAULT_DATA_SPACE.to_string()
}

pub fn load_config(path: &Path) -> Result<MigrationConfig> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut config: MigrationConfig = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    config.source.validate("source")?;
    config.destination.validate("destination")?;

    Ok(config)
}

impl OrgConfig {
    fn validate(&mut self, role: &str) -> Result<()> {
        if self.instance.trim().is_empty() {
            bail!("{role}.instance must not be empty");
        }
        if self.api_version.trim().is_empty() {
            bail!("{role}.api_version must not be empty");
        }

        match &mut self.auth {
            AuthConfig::Password { username, password } => {
                if username.trim().is_empty() {
                    bail!("{role}.auth.username must not be empty");
                }
                password.resolve(&format!("{role}.auth.password"))?;
            }
            AuthConfig::ClientCredentials {
                client_id,
                client_secret,
            } => {
                if client_id.trim().is_empty() {
                    bail!("{role}.auth.client_id must not be empty");
                }
                client_secret.resolve(&format!("{role}.auth.client_secret"))?;
            }
        }

        Ok(())
    }
}
