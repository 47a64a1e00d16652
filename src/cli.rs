use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about = "mosdns-lite DNS forwarder and installation wizard")]
pub struct Args {
    #[command(subcommand)]
    pub sub: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Serve the web installation wizard
    InstallWizard {
        /// Wizard HTTP port (default 9098)
        #[arg(long, short = 'p')]
        port: Option<u16>,

        /// Wizard configuration file (TOML)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Legacy flag, accepted and ignored
        #[arg(long = "start", short = 's', hide = true)]
        start: bool,
    },
    /// Run the DNS engine (the command line used by the systemd unit)
    Start {
        /// Started by the service manager
        #[arg(long)]
        as_service: bool,

        /// Working directory
        #[arg(long, short = 'd')]
        dir: PathBuf,

        /// Engine configuration file
        #[arg(long, short = 'c')]
        config: PathBuf,
    },
    /// Print the build version
    Version,
}

/// Rewrite a leading legacy `-s`/`--start` flag into the `install-wizard`
/// subcommand. Only the first argument is considered.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut args: Vec<OsString> = args.into_iter().collect();
    if let Some(first) = args.get_mut(1)
        && (first.as_os_str() == "-s" || first.as_os_str() == "--start")
    {
        *first = OsString::from("install-wizard");
    }
    args
}
