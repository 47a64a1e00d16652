//! Bootstrap engine configuration.
//!
//! Produces the minimal `config_custom.yaml` the service starts with: a UDP
//! listener on the listen port, a TCP listener on the admin port, a forward
//! plugin pointing at the chosen upstream, a fixed-size response cache, and a
//! sequence running cache before forward.

use serde::Serialize;

use super::InstallerError;
use super::request::ValidatedRequest;

pub const CONFIG_FILE_NAME: &str = "config_custom.yaml";

pub const CACHE_SIZE: u32 = 8000;
pub const CACHE_TTL_SECS: u32 = 86400;

/// Resolver used to look up DoH/DoT upstream hostnames.
const BOOTSTRAP_DNS: &str = "223.5.5.5";

const TAG_SEQUENCE: &str = "sequence";
const TAG_CACHE: &str = "cache";
const TAG_UPSTREAM: &str = "upstream_cn";

#[derive(Serialize)]
struct EngineConfig<'a> {
    log: LogConfig,
    plugins: Vec<Plugin<'a>>,
}

#[derive(Serialize)]
struct LogConfig {
    level: &'static str,
}

#[derive(Serialize)]
struct Plugin<'a> {
    tag: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    args: PluginArgs<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum PluginArgs<'a> {
    Server { entry: &'a str, listen: String },
    Forward { upstreams: Vec<Upstream<'a>> },
    Cache { size: u32, ttl: u32 },
    Sequence { exec: Vec<&'a str> },
}

#[derive(Serialize)]
struct Upstream<'a> {
    addr: &'a str,
    bootstrap: &'a str,
}

/// Render the bootstrap configuration for a validated request.
pub fn generate_engine_config(req: &ValidatedRequest) -> Result<String, InstallerError> {
    let config = EngineConfig {
        log: LogConfig { level: "info" },
        plugins: vec![
            Plugin {
                tag: "udp_server",
                kind: "udp_server",
                args: PluginArgs::Server {
                    entry: TAG_SEQUENCE,
                    listen: format!("0.0.0.0:{}", req.listen_port),
                },
            },
            Plugin {
                tag: "tcp_server",
                kind: "tcp_server",
                args: PluginArgs::Server {
                    entry: TAG_SEQUENCE,
                    listen: format!("0.0.0.0:{}", req.admin_port),
                },
            },
            Plugin {
                tag: TAG_UPSTREAM,
                kind: "forward",
                args: PluginArgs::Forward {
                    upstreams: vec![Upstream {
                        addr: &req.upstream_dns,
                        bootstrap: BOOTSTRAP_DNS,
                    }],
                },
            },
            Plugin {
                tag: TAG_CACHE,
                kind: "cache",
                args: PluginArgs::Cache {
                    size: CACHE_SIZE,
                    ttl: CACHE_TTL_SECS,
                },
            },
            Plugin {
                tag: TAG_SEQUENCE,
                kind: "sequence",
                args: PluginArgs::Sequence {
                    exec: vec![TAG_CACHE, TAG_UPSTREAM],
                },
            },
        ],
    };

    serde_yaml::to_string(&config)
        .map_err(|e| InstallerError::System(format!("Failed to render configuration: {}", e)))
}
