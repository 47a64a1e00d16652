//! Linux host integration: systemd units, privileges, atomic file writes.
//!
//! # Module Structure
//!
//! - `privileges` - Privilege checking
//! - `file_ops` - Atomic file operations
//! - `unit` - Systemd unit file generation and installation
//! - `service_control` - `systemctl` invocations (daemon-reload, enable, start)

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use super::InstallerError;

// Submodules
pub(crate) mod file_ops;
pub(crate) mod privileges;
pub(crate) mod service_control;
pub(crate) mod unit;

pub(crate) use unit::SystemdConfig;

/// Side effects on the host that are not plain file writes.
///
/// `SystemdHost` talks to the real system; tests substitute a recording fake.
pub trait ServiceHost: Send + Sync {
    /// Effective uid is root
    fn is_root(&self) -> bool;

    /// Path of the running executable
    fn current_exe(&self) -> std::io::Result<PathBuf>;

    /// Run `systemctl <args>`; error if it cannot be spawned or exits non-zero
    fn systemctl(&self, args: &[&str]) -> Result<(), InstallerError>;

    /// First non-loopback IPv4 address of any interface
    fn primary_ipv4(&self) -> Option<Ipv4Addr>;
}

/// Production host backed by systemd.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemdHost;

impl ServiceHost for SystemdHost {
    fn is_root(&self) -> bool {
        privileges::effective_uid_is_root()
    }

    fn current_exe(&self) -> std::io::Result<PathBuf> {
        std::env::current_exe()
    }

    fn systemctl(&self, args: &[&str]) -> Result<(), InstallerError> {
        service_control::run_systemctl(args)
    }

    fn primary_ipv4(&self) -> Option<Ipv4Addr> {
        let interfaces = match local_ip_address::list_afinet_netifas() {
            Ok(interfaces) => interfaces,
            Err(e) => {
                log::warn!("Could not list network interfaces: {}", e);
                return None;
            }
        };

        interfaces.into_iter().find_map(|(name, ip)| match ip {
            IpAddr::V4(v4) if !v4.is_loopback() => {
                log::debug!("Using address {} of interface {}", v4, name);
                Some(v4)
            }
            _ => None,
        })
    }
}
