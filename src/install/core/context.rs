//! Per-run installation context: the validated request, where things go, the
//! host to act on, and the channel snapshots are streamed through.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::warn;
use tokio::sync::mpsc;

use super::progress::InstallationProgress;
use crate::config::WizardConfig;
use crate::install::linux::ServiceHost;
use crate::install::request::ValidatedRequest;

/// Installation context
pub struct InstallContext {
    pub request: ValidatedRequest,
    pub settings: Arc<WizardConfig>,
    pub host: Arc<dyn ServiceHost>,
    progress_tx: Option<mpsc::UnboundedSender<InstallationProgress>>,
    progress_disabled: AtomicBool,
}

impl InstallContext {
    pub fn new(
        request: ValidatedRequest,
        settings: Arc<WizardConfig>,
        host: Arc<dyn ServiceHost>,
    ) -> Self {
        Self {
            request,
            settings,
            host,
            progress_tx: None,
            progress_disabled: AtomicBool::new(false),
        }
    }

    /// Set progress channel
    pub fn set_progress_channel(&mut self, tx: mpsc::UnboundedSender<InstallationProgress>) {
        self.progress_tx = Some(tx);
    }

    pub fn work_dir(&self) -> &Path {
        &self.request.work_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.request.config_path()
    }

    /// Send a snapshot to the client.
    ///
    /// A vanished client must not stop the installation: the first failed
    /// send logs a warning and further snapshots are dropped silently.
    pub fn send_progress_best_effort(&self, progress: &InstallationProgress) {
        if self.progress_disabled.load(Ordering::Relaxed) {
            return;
        }
        let Some(tx) = &self.progress_tx else {
            return;
        };

        if tx.send(progress.clone()).is_err() {
            warn!("Progress receiver gone, continuing installation without client updates");
            self.progress_disabled.store(true, Ordering::Relaxed);
        }
    }
}
