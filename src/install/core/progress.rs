//! Installation progress tracking: the step names, their status, and the
//! snapshot streamed to the wizard after every transition.

use serde::{Deserialize, Serialize};

/// The seven installation steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    CheckPermission,
    CreateDir,
    GenerateConfig,
    CopyRules,
    CopyBinary,
    InstallSystemd,
    StartService,
}

impl StepName {
    pub const ALL: [StepName; 7] = [
        StepName::CheckPermission,
        StepName::CreateDir,
        StepName::GenerateConfig,
        StepName::CopyRules,
        StepName::CopyBinary,
        StepName::InstallSystemd,
        StepName::StartService,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StepName::CheckPermission => "check_permission",
            StepName::CreateDir => "create_dir",
            StepName::GenerateConfig => "generate_config",
            StepName::CopyRules => "copy_rules",
            StepName::CopyBinary => "copy_binary",
            StepName::InstallSystemd => "install_systemd",
            StepName::StartService => "start_service",
        }
    }

    /// Message shown while the step is running
    pub fn running_message(self) -> &'static str {
        match self {
            StepName::CheckPermission => "Checking permissions...",
            StepName::CreateDir => "Creating directories...",
            StepName::GenerateConfig => "Generating configuration...",
            StepName::CopyRules => "Copying rule files...",
            StepName::CopyBinary => "Copying binary...",
            StepName::InstallSystemd => "Registering systemd service...",
            StepName::StartService => "Starting service...",
        }
    }
}

impl std::fmt::Display for StepName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Running,
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallStep {
    pub name: StepName,
    pub status: StepStatus,
    pub message: String,
}

/// Snapshot of one orchestration run.
///
/// `success` stays true until a step fails; only the terminal snapshot
/// carries `webui_url` (on success) and a summary `message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallationProgress {
    pub success: bool,
    pub steps: Vec<InstallStep>,
    pub webui_url: String,
    pub message: String,
}

impl Default for InstallationProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl InstallationProgress {
    pub fn new() -> Self {
        Self {
            success: true,
            steps: Vec::with_capacity(StepName::ALL.len()),
            webui_url: String::new(),
            message: String::new(),
        }
    }

    /// Append a running entry for `name`.
    pub fn begin(&mut self, name: StepName) {
        self.steps.push(InstallStep {
            name,
            status: StepStatus::Running,
            message: name.running_message().to_string(),
        });
    }

    /// Resolve the most recently appended step in place.
    pub fn finish(&mut self, status: StepStatus, message: String) {
        if let Some(step) = self.steps.last_mut() {
            step.status = status;
            step.message = message;
        }
        if status == StepStatus::Failed {
            self.success = false;
        }
    }

    pub fn failed_step(&self) -> Option<&InstallStep> {
        self.steps.iter().find(|s| s.status == StepStatus::Failed)
    }
}
