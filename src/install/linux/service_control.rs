//! Systemd service control operations.

use std::process::Command;
use std::thread;
use std::time::Duration;

use super::{InstallerError, ServiceHost};

/// Run `systemctl` with `args`, failing on spawn error or non-zero exit.
pub(super) fn run_systemctl(args: &[&str]) -> Result<(), InstallerError> {
    let output = Command::new("systemctl").args(args).output().map_err(|e| {
        InstallerError::System(format!(
            "Failed to execute systemctl {}: {}",
            args.join(" "),
            e
        ))
    })?;

    if !output.status.success() {
        return Err(InstallerError::System(format!(
            "systemctl {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(())
}

/// Reload units, enable and start `service_name`, pausing `settle` between
/// invocations. Only the final start is checked; reload and enable failures
/// are logged and ignored.
pub(crate) fn activate_systemd_service(
    host: &dyn ServiceHost,
    service_name: &str,
    settle: Duration,
) -> Result<(), InstallerError> {
    if let Err(e) = host.systemctl(&["daemon-reload"]) {
        log::warn!("Ignoring daemon-reload failure: {}", e);
    }
    thread::sleep(settle);

    if let Err(e) = host.systemctl(&["enable", service_name]) {
        log::warn!("Ignoring enable failure for {}: {}", service_name, e);
    }
    thread::sleep(settle);

    host.systemctl(&["start", service_name])
}
