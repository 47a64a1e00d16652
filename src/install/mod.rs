//! mosdns-lite installation library
//!
//! Probes the host, validates wizard requests, and runs the seven-step
//! installation that turns the running binary into a systemd service.

mod assets;
mod binary_staging;
pub mod core;
mod detection;
mod error;
pub mod linux;
mod orchestration;
mod request;
pub mod template;

pub use detection::{EnvironmentStatus, PortConflicts, check_environment, is_port_in_use};
pub use error::InstallerError;
pub use linux::{ServiceHost, SystemdHost};
pub use orchestration::{Orchestrator, run_steps};
pub use request::{InstallationRequest, ValidatedRequest};
