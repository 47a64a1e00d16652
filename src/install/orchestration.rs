//! Installation orchestration
//!
//! Runs the fixed seven-step sequence. Each step is appended as `running`
//! and streamed, then resolved in place to `success` or `failed`. The first
//! failure ends the run; nothing already applied is rolled back.
//!
//! Only one run may be in flight. A second `apply` is rejected with
//! [`InstallerError::AlreadyRunning`], and after a successful run the wizard
//! refuses further runs and shuts down through [`Lifecycle`].

use std::net::Ipv4Addr;
use std::sync::Arc;

use log::{error, info, warn};
use tokio::sync::{Mutex, mpsc};

use super::InstallerError;
use super::assets;
use super::binary_staging::install_current_binary;
use super::core::{InstallContext, InstallationProgress, StepName, StepStatus};
use super::linux::file_ops::write_file_atomic;
use super::linux::service_control::activate_systemd_service;
use super::linux::{ServiceHost, SystemdConfig, privileges, unit};
use super::request::ValidatedRequest;
use super::template::generate_engine_config;
use crate::config::WizardConfig;
use crate::lifecycle::Lifecycle;

const SERVICE_DESCRIPTION: &str = "MosDNS-Lite DNS Server";

/// A step action returns the success message shown to the operator.
type StepAction = fn(&InstallContext) -> Result<String, InstallerError>;

struct Step {
    name: StepName,
    action: StepAction,
}

const STEPS: [Step; 7] = [
    Step { name: StepName::CheckPermission, action: check_permission },
    Step { name: StepName::CreateDir, action: create_dir },
    Step { name: StepName::GenerateConfig, action: generate_config },
    Step { name: StepName::CopyRules, action: copy_rules },
    Step { name: StepName::CopyBinary, action: copy_binary },
    Step { name: StepName::InstallSystemd, action: install_systemd },
    Step { name: StepName::StartService, action: start_service },
];

fn check_permission(ctx: &InstallContext) -> Result<String, InstallerError> {
    privileges::check_privileges(ctx.host.as_ref())?;
    Ok("Root permission check passed".to_string())
}

fn create_dir(ctx: &InstallContext) -> Result<String, InstallerError> {
    assets::create_work_dirs(ctx.work_dir())?;
    Ok(format!("Directory created: {}", ctx.work_dir().display()))
}

fn generate_config(ctx: &InstallContext) -> Result<String, InstallerError> {
    let content = generate_engine_config(&ctx.request)?;
    let path = ctx.config_path();
    write_file_atomic(&path, content.as_bytes(), 0o644)?;
    Ok(format!("Configuration written to {}", path.display()))
}

fn copy_rules(ctx: &InstallContext) -> Result<String, InstallerError> {
    let written = assets::extract_bundled_rules(ctx.work_dir());
    Ok(format!("{} rule files copied", written))
}

fn copy_binary(ctx: &InstallContext) -> Result<String, InstallerError> {
    let target = &ctx.settings.binary_path;
    install_current_binary(ctx.host.as_ref(), target)?;
    Ok(format!("Binary copied to {}", target.display()))
}

fn install_systemd(ctx: &InstallContext) -> Result<String, InstallerError> {
    let config_path = ctx.config_path();
    let config = SystemdConfig {
        service_name: &ctx.settings.service_name,
        description: SERVICE_DESCRIPTION,
        binary_path: &ctx.settings.binary_path,
        work_dir: ctx.work_dir(),
        config_path: &config_path,
    };
    unit::create_systemd_unit_with_dir(&config, &ctx.settings.unit_dir)?;
    Ok(format!("systemd service {} registered", ctx.settings.service_name))
}

fn start_service(ctx: &InstallContext) -> Result<String, InstallerError> {
    activate_systemd_service(
        ctx.host.as_ref(),
        &ctx.settings.service_name,
        ctx.settings.settle_delay(),
    )?;
    Ok(format!("Service {} started", ctx.settings.service_name))
}

/// Run every step in order, streaming snapshots through the context.
///
/// Blocking: call from a blocking thread. Returns the terminal snapshot,
/// which has also been sent.
pub fn run_steps(ctx: &InstallContext) -> InstallationProgress {
    let mut progress = InstallationProgress::new();

    for step in &STEPS {
        progress.begin(step.name);
        ctx.send_progress_best_effort(&progress);
        info!("[{}] {}", step.name, step.name.running_message());

        match (step.action)(ctx) {
            Ok(message) => {
                info!("[{}] {}", step.name, message);
                progress.finish(StepStatus::Success, message);
            }
            Err(e) => {
                error!("[{}] {}", step.name, e);
                progress.finish(StepStatus::Failed, e.to_string());
                progress.message = format!("Installation failed at {}: {}", step.name, e);
                ctx.send_progress_best_effort(&progress);
                return progress;
            }
        }
    }

    let address = ctx.host.primary_ipv4().unwrap_or(Ipv4Addr::LOCALHOST);
    progress.webui_url = format!("http://{}:{}/log", address, ctx.request.admin_port);
    progress.message = "Installation complete!".to_string();
    ctx.send_progress_best_effort(&progress);

    info!("Installation complete, web UI at {}", progress.webui_url);
    progress
}

/// Single-flight front for [`run_steps`].
pub struct Orchestrator {
    settings: Arc<WizardConfig>,
    host: Arc<dyn ServiceHost>,
    lifecycle: Lifecycle,
    running: Arc<Mutex<()>>,
}

impl Orchestrator {
    pub fn new(settings: Arc<WizardConfig>, host: Arc<dyn ServiceHost>, lifecycle: Lifecycle) -> Self {
        Self {
            settings,
            host,
            lifecycle,
            running: Arc::new(Mutex::new(())),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.try_lock().is_err()
    }

    /// Start an installation run in the background.
    ///
    /// Snapshots arrive on the returned receiver, which closes after the
    /// terminal snapshot. Dropping the receiver does not stop the run.
    pub fn apply(
        &self,
        request: ValidatedRequest,
    ) -> Result<mpsc::UnboundedReceiver<InstallationProgress>, InstallerError> {
        let guard = self
            .running
            .clone()
            .try_lock_owned()
            .map_err(|_| InstallerError::AlreadyRunning)?;
        // Checked under the guard: a finished run marks completion before
        // releasing it.
        if self.lifecycle.is_completed() {
            return Err(InstallerError::Completed);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let mut ctx = InstallContext::new(request, self.settings.clone(), self.host.clone());
        ctx.set_progress_channel(tx);

        let lifecycle = self.lifecycle.clone();
        let grace = self.settings.exit_grace();

        info!(
            "Starting installation into {} (listen {}, admin {}, upstream {}, cache {}, ad-block {}, shunt {})",
            ctx.work_dir().display(),
            ctx.request.listen_port,
            ctx.request.admin_port,
            ctx.request.upstream_dns,
            ctx.request.enable_cache,
            ctx.request.enable_ad_block,
            ctx.request.enable_shunt,
        );

        tokio::spawn(async move {
            let _guard = guard;
            match tokio::task::spawn_blocking(move || run_steps(&ctx)).await {
                Ok(progress) if progress.success => lifecycle.complete_after(grace),
                Ok(progress) => {
                    let step = progress.failed_step().map(|s| s.name.as_str()).unwrap_or("unknown");
                    warn!("Installation stopped at {}: {}", step, progress.message);
                }
                Err(e) => error!("Installation task failed: {}", e),
            }
        });

        Ok(rx)
    }
}
