//! Privilege checking for systemd installation.

use super::{InstallerError, ServiceHost};

/// Installation writes to /etc/systemd/system and /usr/local/bin, so only
/// root is accepted; there is no user-unit fallback.
pub(crate) fn check_privileges(host: &dyn ServiceHost) -> Result<(), InstallerError> {
    if !host.is_root() {
        return Err(InstallerError::PermissionDenied);
    }
    Ok(())
}

#[inline]
pub(super) fn effective_uid_is_root() -> bool {
    nix::unistd::geteuid().is_root()
}
