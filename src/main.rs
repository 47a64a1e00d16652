mod cli;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use log::{error, info};

use mosdns_lite::config::WizardConfig;
use mosdns_lite::install::SystemdHost;
use mosdns_lite::lifecycle::Lifecycle;
use mosdns_lite::{engine, server};

fn main() {
    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "[{} {} {}:{}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = cli::Args::parse_from(cli::normalize_args(std::env::args_os()));

    let result = match args.sub {
        cli::Cmd::InstallWizard { port, config, .. } => run_wizard(port, config),
        cli::Cmd::Start {
            as_service,
            dir,
            config,
        } => engine::run(&dir, &config, as_service),
        cli::Cmd::Version => {
            println!("mosdns-lite {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    };

    if let Err(e) = result {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn run_wizard(port: Option<u16>, config: Option<PathBuf>) -> Result<()> {
    let mut settings = WizardConfig::load(config.as_deref())?;
    if let Some(port) = port {
        settings.wizard_port = port;
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("FATAL: Failed to create Tokio runtime: {e}");
            eprintln!("The wizard cannot start without an async runtime.");
            std::process::exit(1);
        }
    };

    rt.block_on(server::run_wizard(
        Arc::new(settings),
        Arc::new(SystemdHost),
        Lifecycle::new(),
    ))?;
    info!("mosdns-lite wizard exiting");
    Ok(())
}
