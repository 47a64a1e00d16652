//! Wizard HTTP front-end: three install endpoints plus the bundled UI.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use axum_embed::ServeEmbed;
use log::info;
use rust_embed::RustEmbed;
use tokio::net::TcpListener;

use crate::config::WizardConfig;
use crate::install::{Orchestrator, ServiceHost};
use crate::lifecycle::Lifecycle;

pub mod routes;

#[derive(RustEmbed, Clone)]
#[folder = "assets/install/page/"]
struct WizardPage;

#[derive(RustEmbed, Clone)]
#[folder = "assets/install/static/"]
struct WizardAssets;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<WizardConfig>,
    pub host: Arc<dyn ServiceHost>,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(settings: Arc<WizardConfig>, host: Arc<dyn ServiceHost>, lifecycle: Lifecycle) -> Self {
        let orchestrator = Arc::new(Orchestrator::new(settings.clone(), host.clone(), lifecycle));
        Self {
            settings,
            host,
            orchestrator,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/api/v1/install/status", get(routes::install_status))
        .route("/api/v1/install/submit", post(routes::install_submit))
        .route("/api/v1/install/apply", post(routes::install_apply))
        .nest_service("/assets", ServeEmbed::<WizardAssets>::new())
        .layer(middleware::from_fn(routes::log_request))
        .with_state(state)
}

fn print_banner(port: u16) {
    println!();
    println!("╔════════════════════════════════════════════════════════╗");
    println!("║     MosDNS-Lite installation wizard                    ║");
    println!("╠════════════════════════════════════════════════════════╣");
    println!("║  Open: http://<server-ip>:{:<5}                        ║", port);
    println!("║                                                        ║");
    println!("║  Press Ctrl+C to exit the wizard                       ║");
    println!("╚════════════════════════════════════════════════════════╝");
    println!();
}

/// Serve the wizard until installation completes or Ctrl+C.
pub async fn run_wizard(
    settings: Arc<WizardConfig>,
    host: Arc<dyn ServiceHost>,
    lifecycle: Lifecycle,
) -> Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, settings.wizard_port));
    let app = create_router(AppState::new(settings.clone(), host, lifecycle.clone()));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind wizard to {addr}"))?;

    print_banner(settings.wizard_port);
    info!("Installation wizard listening on {}", addr);

    let shutdown = {
        let lifecycle = lifecycle.clone();
        async move {
            tokio::select! {
                _ = lifecycle.wait() => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Ctrl+C received, stopping wizard");
                    lifecycle.shutdown_now();
                }
            }
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Failed to run wizard server")?;

    info!("Installation wizard stopped");
    Ok(())
}
