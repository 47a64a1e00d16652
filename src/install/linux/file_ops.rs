//! Atomic file operations.
//!
//! Content goes to a sibling temp file which is synced, chmod'ed and then
//! renamed over the target, so a failed write never leaves a truncated file
//! at the final path. Renaming also avoids ETXTBSY when replacing a binary
//! that is currently executing.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use super::InstallerError;

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("file"));
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}

/// Write `content` to `path` atomically with permission bits `mode`.
pub(crate) fn write_file_atomic(path: &Path, content: &[u8], mode: u32) -> Result<(), InstallerError> {
    let temp_path = temp_path_for(path);

    let result = (|| -> io::Result<()> {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(content)?;
        file.set_permissions(fs::Permissions::from_mode(mode))?;
        file.sync_all()?;
        fs::rename(&temp_path, path)
    })();

    result.map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        InstallerError::System(format!("Failed to write {}: {}", path.display(), e))
    })
}

/// Copy `src` to `dst` atomically, byte for byte, with permission bits `mode`.
///
/// Returns the number of bytes copied. A short copy is reported as an error.
pub(crate) fn copy_file_atomic(src: &Path, dst: &Path, mode: u32) -> Result<u64, InstallerError> {
    let temp_path = temp_path_for(dst);

    let result = (|| -> io::Result<u64> {
        let expected = fs::metadata(src)?.len();
        let mut reader = fs::File::open(src)?;
        let mut writer = fs::File::create(&temp_path)?;

        let copied = io::copy(&mut reader, &mut writer)?;
        if copied != expected {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("short copy: {} of {} bytes", copied, expected),
            ));
        }

        writer.set_permissions(fs::Permissions::from_mode(mode))?;
        writer.sync_all()?;
        fs::rename(&temp_path, dst)?;
        Ok(copied)
    })();

    result.map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        InstallerError::System(format!(
            "Failed to copy {} to {}: {}",
            src.display(),
            dst.display(),
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode_of(path: &Path) -> u32 {
        fs::metadata(path).unwrap().permissions().mode() & 0o777
    }

    #[test]
    fn write_sets_content_and_mode() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("unit.service");

        write_file_atomic(&path, b"[Unit]\n", 0o644).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"[Unit]\n");
        assert_eq!(mode_of(&path), 0o644);

        write_file_atomic(&path, b"[Service]\n", 0o644).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"[Service]\n");
    }

    #[test]
    fn write_into_missing_directory_fails_without_leftovers() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("missing").join("config.yaml");

        assert!(write_file_atomic(&path, b"x", 0o644).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn copy_is_byte_identical_and_executable() {
        let dir = tempfile::TempDir::new().unwrap();
        let src = dir.path().join("src-bin");
        let dst = dir.path().join("dst-bin");
        let payload: Vec<u8> = (0..=255u8).cycle().take(64 * 1024 + 7).collect();
        fs::write(&src, &payload).unwrap();

        let copied = copy_file_atomic(&src, &dst, 0o755).unwrap();
        assert_eq!(copied, payload.len() as u64);
        assert_eq!(fs::read(&dst).unwrap(), payload);
        assert_eq!(mode_of(&dst), 0o755);

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn copy_of_missing_source_reports_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let dst = dir.path().join("dst-bin");

        let err = copy_file_atomic(&dir.path().join("nope"), &dst, 0o755).unwrap_err();
        assert!(err.to_string().contains("Failed to copy"));
        assert!(!dst.exists());
    }
}
