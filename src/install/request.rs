//! Installation request and its validator.

use std::ops::Deref;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

use super::InstallerError;
use super::detection::is_port_in_use;
use crate::config::WizardConfig;

/// Installation parameters as submitted by the wizard.
///
/// Every field may be omitted or `null` on the wire; empty and zero values
/// are replaced with the configured defaults during validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstallationRequest {
    #[serde(deserialize_with = "null_as_default")]
    pub work_dir: PathBuf,
    #[serde(deserialize_with = "null_as_default")]
    pub listen_port: u16,
    #[serde(deserialize_with = "null_as_default")]
    pub admin_port: u16,
    #[serde(rename = "upstreamDNS", deserialize_with = "null_as_default")]
    pub upstream_dns: String,
    #[serde(deserialize_with = "null_as_default")]
    pub enable_cache: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub enable_ad_block: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub enable_shunt: bool,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A request with defaults applied and sanity checks passed. Immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest(InstallationRequest);

impl Deref for ValidatedRequest {
    type Target = InstallationRequest;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl ValidatedRequest {
    pub fn config_path(&self) -> PathBuf {
        self.work_dir.join(super::template::CONFIG_FILE_NAME)
    }
}

impl InstallationRequest {
    /// Fill empty/zero fields from `cfg` and reject input that cannot be
    /// templated. Does not touch the network.
    pub fn with_defaults(mut self, cfg: &WizardConfig) -> Result<ValidatedRequest, InstallerError> {
        if self.work_dir.as_os_str().is_empty() {
            self.work_dir = cfg.default_work_dir.clone();
        }
        if self.listen_port == 0 {
            self.listen_port = cfg.default_listen_port;
        }
        if self.admin_port == 0 {
            self.admin_port = cfg.default_admin_port;
        }
        self.upstream_dns = self.upstream_dns.trim().to_string();
        if self.upstream_dns.is_empty() {
            self.upstream_dns = cfg.default_upstream.clone();
        }

        if !self.work_dir.is_absolute() {
            return Err(InstallerError::InvalidRequest(format!(
                "work directory must be an absolute path: {}",
                self.work_dir.display()
            )));
        }
        if self
            .work_dir
            .to_string_lossy()
            .chars()
            .any(char::is_control)
        {
            return Err(InstallerError::InvalidRequest(format!(
                "work directory contains control characters: {:?}",
                self.work_dir
            )));
        }
        if self.upstream_dns.chars().any(char::is_whitespace) {
            return Err(InstallerError::InvalidRequest(format!(
                "upstream DNS address contains whitespace: {:?}",
                self.upstream_dns
            )));
        }
        if self.listen_port == self.admin_port {
            return Err(InstallerError::InvalidRequest(format!(
                "listen port and admin port must differ (both {})",
                self.listen_port
            )));
        }

        Ok(ValidatedRequest(self))
    }

    /// Apply defaults, then bind-probe both ports (listen port first).
    pub fn validate(self, cfg: &WizardConfig) -> Result<ValidatedRequest, InstallerError> {
        let req = self.with_defaults(cfg)?;

        for port in [req.listen_port, req.admin_port] {
            if is_port_in_use(port) {
                log::warn!("Rejecting installation request: port {} is in use", port);
                return Err(InstallerError::PortInUse(port));
            }
        }

        Ok(req)
    }
}
