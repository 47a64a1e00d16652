//! Installation of the running executable to its system path.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use super::InstallerError;
use super::linux::ServiceHost;
use super::linux::file_ops::copy_file_atomic;

/// Copy the currently running binary to `target` with mode 0755.
///
/// Returns the number of bytes copied.
pub(crate) fn install_current_binary(
    host: &dyn ServiceHost,
    target: &Path,
) -> Result<u64, InstallerError> {
    let exe_path = host.current_exe().map_err(|e| {
        InstallerError::System(format!("Failed to resolve current executable: {}", e))
    })?;

    if exe_path == target {
        log::info!("Already running from {}, nothing to copy", target.display());
        fs::set_permissions(target, fs::Permissions::from_mode(0o755)).map_err(|e| {
            InstallerError::System(format!(
                "Failed to set permissions on {}: {}",
                target.display(),
                e
            ))
        })?;
        return fs::metadata(target)
            .map(|m| m.len())
            .map_err(|e| InstallerError::System(format!("Failed to read metadata: {}", e)));
    }

    if let Some(parent) = target.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            InstallerError::System(format!(
                "Failed to create {} directory: {}",
                parent.display(),
                e
            ))
        })?;
    }

    let copied = copy_file_atomic(&exe_path, target, 0o755)?;
    log::info!(
        "Copied {} ({} bytes) to {}",
        exe_path.display(),
        copied,
        target.display()
    );
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::linux::testing::FakeHost;

    #[test]
    fn copies_running_binary_executable() {
        let dir = tempfile::TempDir::new().unwrap();
        let exe = dir.path().join("wizard");
        fs::write(&exe, b"\x7fELF fake binary").unwrap();
        let target = dir.path().join("usr").join("local").join("bin").join("mosdns-lite");

        let host = FakeHost::root().with_exe(exe.clone());
        let copied = install_current_binary(&host, &target).unwrap();

        assert_eq!(copied, 16);
        assert_eq!(fs::read(&target).unwrap(), fs::read(&exe).unwrap());
        let mode = fs::metadata(&target).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o755);
    }

    #[test]
    fn unresolvable_executable_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = install_current_binary(&FakeHost::root(), &dir.path().join("bin")).unwrap_err();
        assert!(err.to_string().contains("Failed to resolve current executable"));
    }

    #[test]
    fn running_from_target_only_fixes_mode() {
        let dir = tempfile::TempDir::new().unwrap();
        let exe = dir.path().join("mosdns-lite");
        fs::write(&exe, b"abc").unwrap();
        fs::set_permissions(&exe, fs::Permissions::from_mode(0o644)).unwrap();

        let host = FakeHost::root().with_exe(exe.clone());
        assert_eq!(install_current_binary(&host, &exe).unwrap(), 3);
        let mode = fs::metadata(&exe).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o755);
    }
}
