//! Core installer structures: progress snapshots and the per-run context.

mod context;
mod progress;

pub use context::InstallContext;
pub use progress::{InstallStep, InstallationProgress, StepName, StepStatus};
