use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// System-wide wizard configuration, consulted when no `--config` is given.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/mosdns-lite/installer.toml";

/// Installation wizard configuration (mirrors the built-in defaults).
///
/// Every field is optional in the TOML file; missing keys keep the defaults
/// below, so an empty file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardConfig {
    /// Port the wizard's own HTTP server listens on
    pub wizard_port: u16,
    pub default_work_dir: PathBuf,
    pub default_listen_port: u16,
    pub default_admin_port: u16,
    pub default_upstream: String,
    /// Where `copy_binary` places the running executable
    pub binary_path: PathBuf,
    /// systemd unit name without the `.service` suffix
    pub service_name: String,
    pub unit_dir: PathBuf,
    /// Pause between `systemctl` invocations
    pub settle_delay_ms: u64,
    /// Time left for the final response to flush before the wizard shuts down
    pub exit_grace_secs: u64,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            wizard_port: 9098,
            default_work_dir: PathBuf::from("/cus/mosdns"),
            default_listen_port: 53,
            default_admin_port: 9099,
            default_upstream: "223.5.5.5".into(),
            binary_path: PathBuf::from("/usr/local/bin/mosdns-lite"),
            service_name: "mosdns".into(),
            unit_dir: PathBuf::from("/etc/systemd/system"),
            settle_delay_ms: 500,
            exit_grace_secs: 3,
        }
    }
}

impl WizardConfig {
    /// Load from an explicit path, else the system path if present, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let system = PathBuf::from(SYSTEM_CONFIG_PATH);
                if !system.exists() {
                    log::debug!("No wizard config at {}, using defaults", system.display());
                    return Ok(Self::default());
                }
                system
            }
        };

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg: Self = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        log::info!("Using wizard config from: {}", path.display());
        Ok(cfg)
    }

    /// Path of the generated unit file, also the "installed" marker.
    pub fn unit_path(&self) -> PathBuf {
        self.unit_dir.join(format!("{}.service", self.service_name))
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn exit_grace(&self) -> Duration {
        Duration::from_secs(self.exit_grace_secs)
    }
}
