//! Installer error type shared by the probe, validator and orchestrator.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstallerError {
    #[error("root privilege required, re-run the wizard with sudo")]
    PermissionDenied,

    #[error("port {0} is already in use")]
    PortInUse(u16),

    #[error("an installation is already running")]
    AlreadyRunning,

    #[error("installation already completed, the wizard is shutting down")]
    Completed,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    System(String),
}

impl InstallerError {
    /// True for errors the caller caused (bad input or a busy host), as
    /// opposed to failures while mutating the system.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::PortInUse(_) | Self::AlreadyRunning | Self::Completed | Self::InvalidRequest(_)
        )
    }
}
