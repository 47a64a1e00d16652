//! Systemd unit file generation and installation.

use std::fs;
use std::path::Path;

use super::InstallerError;
use super::file_ops::write_file_atomic;

/// Seconds systemd waits before restarting the service
const RESTART_SEC: u32 = 120;
/// At most `START_LIMIT_BURST` starts within `START_LIMIT_INTERVAL_SEC`
const START_LIMIT_INTERVAL_SEC: u32 = 5;
const START_LIMIT_BURST: u32 = 10;

/// Systemd service configuration
#[derive(Clone, Debug)]
pub(crate) struct SystemdConfig<'a> {
    pub service_name: &'a str,
    pub description: &'a str,
    pub binary_path: &'a Path,
    pub work_dir: &'a Path,
    pub config_path: &'a Path,
}

/// Render one `ExecStart=` argument.
///
/// `%` and `$` are doubled so systemd does not expand them. Arguments with
/// whitespace, quotes or backslashes are wrapped in double quotes with `"`
/// and `\` escaped.
fn exec_arg(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let needs_quotes = raw
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '\\' | ';'));

    let mut out = String::with_capacity(raw.len() + 2);
    if needs_quotes {
        out.push('"');
    }
    for c in raw.chars() {
        match c {
            '%' => out.push_str("%%"),
            '$' => out.push_str("$$"),
            '"' if needs_quotes => out.push_str("\\\""),
            '\\' if needs_quotes => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
    if needs_quotes {
        out.push('"');
    }
    out
}

/// Generate systemd unit file content
///
/// The unit runs `<binary> start --as-service -d <work_dir> -c <config>` and
/// restarts unconditionally.
pub(crate) fn generate_unit_content(config: &SystemdConfig) -> String {
    let binary = config.binary_path.display();
    let mut content = String::with_capacity(512);

    // [Unit] section
    content.push_str("[Unit]\n");
    content.push_str(&format!("Description={}\n", config.description));
    content.push_str(&format!("ConditionFileIsExecutable={}\n", binary));
    content.push_str("After=network.target\n");
    content.push_str(&format!("StartLimitIntervalSec={}\n", START_LIMIT_INTERVAL_SEC));
    content.push_str(&format!("StartLimitBurst={}\n", START_LIMIT_BURST));
    content.push('\n');

    // [Service] section
    content.push_str("[Service]\n");
    content.push_str(&format!(
        "ExecStart={} start --as-service -d {} -c {}\n",
        exec_arg(config.binary_path),
        exec_arg(config.work_dir),
        exec_arg(config.config_path)
    ));
    content.push_str("Restart=always\n");
    content.push_str(&format!("RestartSec={}\n", RESTART_SEC));
    content.push_str(&format!(
        "EnvironmentFile=-/etc/sysconfig/{}\n",
        config.service_name
    ));
    content.push('\n');

    // [Install] section
    content.push_str("[Install]\n");
    content.push_str("WantedBy=multi-user.target\n");

    content
}

/// Write the unit file into `unit_dir`, creating the directory if needed.
pub(crate) fn create_systemd_unit_with_dir(
    config: &SystemdConfig,
    unit_dir: &Path,
) -> Result<(), InstallerError> {
    let unit_content = generate_unit_content(config);
    let unit_path = unit_dir.join(format!("{}.service", config.service_name));

    fs::create_dir_all(unit_dir).map_err(|e| {
        InstallerError::System(format!("Failed to create systemd directory: {}", e))
    })?;

    write_file_atomic(&unit_path, unit_content.as_bytes(), 0o644)?;

    log::info!("Installed systemd unit at {}", unit_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample() -> (PathBuf, PathBuf, PathBuf) {
        (
            PathBuf::from("/usr/local/bin/mosdns-lite"),
            PathBuf::from("/cus/mosdns"),
            PathBuf::from("/cus/mosdns/config_custom.yaml"),
        )
    }

    #[test]
    fn unit_references_binary_and_config() {
        let (binary, work_dir, config_path) = sample();
        let content = generate_unit_content(&SystemdConfig {
            service_name: "mosdns",
            description: "MosDNS-Lite DNS Server",
            binary_path: &binary,
            work_dir: &work_dir,
            config_path: &config_path,
        });

        assert!(content.contains(
            "ExecStart=/usr/local/bin/mosdns-lite start --as-service -d /cus/mosdns -c /cus/mosdns/config_custom.yaml\n"
        ));
        assert!(content.contains("ConditionFileIsExecutable=/usr/local/bin/mosdns-lite\n"));
        assert!(content.contains("Description=MosDNS-Lite DNS Server\n"));
        assert!(content.contains("EnvironmentFile=-/etc/sysconfig/mosdns\n"));
        assert!(content.ends_with("WantedBy=multi-user.target\n"));
    }

    #[test]
    fn unit_restarts_unconditionally_with_limits() {
        let (binary, work_dir, config_path) = sample();
        let content = generate_unit_content(&SystemdConfig {
            service_name: "mosdns",
            description: "d",
            binary_path: &binary,
            work_dir: &work_dir,
            config_path: &config_path,
        });

        assert!(content.contains("Restart=always\n"));
        assert!(content.contains("RestartSec=120\n"));
        assert!(content.contains("StartLimitIntervalSec=5\n"));
        assert!(content.contains("StartLimitBurst=10\n"));
    }

    #[test]
    fn unit_is_written_into_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let unit_dir = dir.path().join("systemd").join("system");
        let (binary, work_dir, config_path) = sample();
        let config = SystemdConfig {
            service_name: "mosdns",
            description: "d",
            binary_path: &binary,
            work_dir: &work_dir,
            config_path: &config_path,
        };

        create_systemd_unit_with_dir(&config, &unit_dir).unwrap();
        let written = fs::read_to_string(unit_dir.join("mosdns.service")).unwrap();
        assert_eq!(written, generate_unit_content(&config));
    }

    /// Split an `ExecStart=` value the way systemd does for double-quoted
    /// words with backslash escapes.
    fn split_exec(line: &str) -> Vec<String> {
        let mut words = Vec::new();
        let mut chars = line.chars().peekable();
        while let Some(&c) = chars.peek() {
            if c == ' ' {
                chars.next();
                continue;
            }
            let mut word = String::new();
            if c == '"' {
                chars.next();
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => word.extend(chars.next()),
                        '"' => break,
                        c => word.push(c),
                    }
                }
            } else {
                while let Some(&c) = chars.peek() {
                    if c == ' ' {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
            }
            words.push(word);
        }
        words
    }

    fn exec_start(content: &str) -> &str {
        content
            .lines()
            .find_map(|l| l.strip_prefix("ExecStart="))
            .unwrap()
    }

    #[test]
    fn paths_with_spaces_stay_single_arguments() {
        let binary = PathBuf::from("/usr/local/bin/mosdns-lite");
        let work_dir = PathBuf::from("/opt/my dns");
        let config_path = work_dir.join("config_custom.yaml");
        let content = generate_unit_content(&SystemdConfig {
            service_name: "mosdns",
            description: "d",
            binary_path: &binary,
            work_dir: &work_dir,
            config_path: &config_path,
        });

        let line = exec_start(&content);
        assert_eq!(
            line,
            r#"/usr/local/bin/mosdns-lite start --as-service -d "/opt/my dns" -c "/opt/my dns/config_custom.yaml""#
        );
        assert_eq!(
            split_exec(line),
            [
                "/usr/local/bin/mosdns-lite",
                "start",
                "--as-service",
                "-d",
                "/opt/my dns",
                "-c",
                "/opt/my dns/config_custom.yaml",
            ]
        );
    }

    #[test]
    fn specifiers_and_quotes_are_escaped() {
        assert_eq!(exec_arg(Path::new("/srv/100%")), "/srv/100%%");
        assert_eq!(exec_arg(Path::new("/srv/$HOME")), "/srv/$$HOME");
        assert_eq!(exec_arg(Path::new(r#"/srv/a "b""#)), r#""/srv/a \"b\"""#);
        assert_eq!(exec_arg(Path::new(r"/srv/a\b")), r#""/srv/a\\b""#);
        assert_eq!(split_exec(&exec_arg(Path::new(r#"/srv/a "b""#))), [r#"/srv/a "b""#]);
    }
}
