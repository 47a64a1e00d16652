//! Hand-off to the DNS forwarding engine.
//!
//! `mosdns-lite start` is what the generated systemd unit runs. The engine is
//! a separate executable; this process is replaced by it.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use log::info;

/// Overrides the engine executable looked up on `PATH`.
pub const ENGINE_ENV: &str = "MOSDNS_ENGINE";

const ENGINE_BINARY: &str = "mosdns";

/// Find the engine executable: `$MOSDNS_ENGINE` first, then `mosdns` on `PATH`.
pub fn resolve_engine(env_override: Option<OsString>) -> Result<PathBuf> {
    if let Some(path) = env_override.filter(|p| !p.is_empty()) {
        let path = PathBuf::from(path);
        if !path.is_file() {
            return Err(anyhow!(
                "{} points to {}, which is not a file",
                ENGINE_ENV,
                path.display()
            ));
        }
        return Ok(path);
    }

    which::which(ENGINE_BINARY)
        .with_context(|| format!("Could not find `{}` on PATH (set {})", ENGINE_BINARY, ENGINE_ENV))
}

pub fn engine_args(work_dir: &Path, config: &Path) -> Vec<OsString> {
    vec![
        OsString::from("start"),
        OsString::from("-d"),
        work_dir.as_os_str().to_owned(),
        OsString::from("-c"),
        config.as_os_str().to_owned(),
    ]
}

/// Replace the current process with the engine. Only returns on failure.
pub fn run(work_dir: &Path, config: &Path, as_service: bool) -> Result<()> {
    let engine = resolve_engine(std::env::var_os(ENGINE_ENV))?;
    info!(
        "Starting engine {} (work dir {}, config {}, service mode: {})",
        engine.display(),
        work_dir.display(),
        config.display(),
        as_service
    );

    let err = exec::Command::new(&engine)
        .args(engine_args(work_dir, config).as_slice())
        .exec();
    Err(anyhow!("Failed to exec {}: {}", engine.display(), err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(resolve_engine(Some(missing.into_os_string())).is_err());

        let engine = dir.path().join("mosdns");
        std::fs::write(&engine, b"#!/bin/sh\n").unwrap();
        assert_eq!(resolve_engine(Some(engine.clone().into_os_string())).unwrap(), engine);
    }

    #[test]
    fn args_match_unit_layout() {
        let args = engine_args(Path::new("/cus/mosdns"), Path::new("/cus/mosdns/config_custom.yaml"));
        let args: Vec<_> = args.iter().map(|a| a.to_str().unwrap()).collect();
        assert_eq!(
            args,
            ["start", "-d", "/cus/mosdns", "-c", "/cus/mosdns/config_custom.yaml"]
        );
    }
}
