//! Environment probe
//!
//! Read-only inspection of the host before installation:
//! - installed marker: the generated systemd unit file exists
//! - privilege: effective uid is root
//! - port conflicts: bind-probe on the default listen and admin ports
//!
//! Nothing here returns an error; every failed sub-check degrades to the
//! conservative answer (not installed, not root, port in use).

use std::net::{Ipv4Addr, SocketAddrV4, TcpListener};
use std::path::PathBuf;

use serde::Serialize;

use super::linux::ServiceHost;
use crate::config::WizardConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortConflicts {
    pub listen_port: bool,
    pub admin_port: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentStatus {
    pub installed: bool,
    pub work_dir: PathBuf,
    pub binary_path: PathBuf,
    pub port_conflicts: PortConflicts,
    pub has_root_permission: bool,
}

/// Probe the host. Computed fresh on every call.
pub fn check_environment(cfg: &WizardConfig, host: &dyn ServiceHost) -> EnvironmentStatus {
    EnvironmentStatus {
        installed: cfg.unit_path().exists(),
        work_dir: cfg.default_work_dir.clone(),
        binary_path: cfg.binary_path.clone(),
        port_conflicts: PortConflicts {
            listen_port: is_port_in_use(cfg.default_listen_port),
            admin_port: is_port_in_use(cfg.default_admin_port),
        },
        has_root_permission: host.is_root(),
    }
}

/// Bind-probe: try to listen on `0.0.0.0:port` and release immediately.
///
/// Any bind failure counts as "in use", including EACCES for privileged
/// ports when not running as root.
pub fn is_port_in_use(port: u16) -> bool {
    match TcpListener::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port)) {
        Ok(listener) => {
            drop(listener);
            log::debug!("Port {} is available", port);
            false
        }
        Err(e) => {
            log::debug!("Port {} is already in use or unavailable: {}", port, e);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::linux::testing::FakeHost;

    fn free_port() -> u16 {
        let listener = TcpListener::bind("0.0.0.0:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[test]
    fn bound_port_is_reported_in_use() {
        let listener = TcpListener::bind("0.0.0.0:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(is_port_in_use(port));

        drop(listener);
        assert!(!is_port_in_use(port));
    }

    #[test]
    fn status_reflects_marker_privilege_and_ports() {
        let dir = tempfile::TempDir::new().unwrap();
        let busy = TcpListener::bind("0.0.0.0:0").unwrap();

        let cfg = WizardConfig {
            unit_dir: dir.path().to_path_buf(),
            default_listen_port: busy.local_addr().unwrap().port(),
            default_admin_port: free_port(),
            ..WizardConfig::default()
        };

        let status = check_environment(&cfg, &FakeHost::root());
        assert!(!status.installed);
        assert!(status.has_root_permission);
        assert!(status.port_conflicts.listen_port);
        assert!(!status.port_conflicts.admin_port);
        assert_eq!(status.binary_path, PathBuf::from("/usr/local/bin/mosdns-lite"));

        std::fs::write(cfg.unit_path(), "[Unit]\n").unwrap();
        let status = check_environment(&cfg, &FakeHost::unprivileged());
        assert!(status.installed);
        assert!(!status.has_root_permission);
    }

    #[test]
    fn status_serializes_wire_names() {
        let status = EnvironmentStatus {
            installed: false,
            work_dir: PathBuf::from("/cus/mosdns"),
            binary_path: PathBuf::from("/usr/local/bin/mosdns-lite"),
            port_conflicts: PortConflicts {
                listen_port: true,
                admin_port: false,
            },
            has_root_permission: true,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["workDir"], "/cus/mosdns");
        assert_eq!(json["binaryPath"], "/usr/local/bin/mosdns-lite");
        assert_eq!(json["portConflicts"]["listenPort"], true);
        assert_eq!(json["portConflicts"]["adminPort"], false);
        assert_eq!(json["hasRootPermission"], true);
    }
}
