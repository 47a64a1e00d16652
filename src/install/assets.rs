//! Work directory layout and bundled rule/list templates.

use std::fs::DirBuilder;
use std::os::unix::fs::DirBuilderExt;
use std::path::Path;

use rust_embed::RustEmbed;

use super::InstallerError;
use super::linux::file_ops::write_file_atomic;

/// Subdirectories created under the work directory
pub const WORK_SUBDIRS: [&str; 3] = ["rules", "lists", "backup"];

/// Bundled files copied into `<work_dir>/rules`
pub const RULE_FILES: [&str; 2] = ["adguard.yaml", "shunt.yaml"];

/// Bundled files copied into `<work_dir>/lists`
pub const LIST_FILES: [&str; 3] = ["whitelist.txt", "blacklist.txt", "chn_domain.txt"];

#[derive(RustEmbed)]
#[folder = "assets/install/templates/"]
struct Templates;

/// Create the work directory (0755) and its fixed subdirectories.
///
/// Only the top-level directory is checked; a subdirectory that cannot be
/// created is logged and left for the engine to complain about.
pub(crate) fn create_work_dirs(work_dir: &Path) -> Result<(), InstallerError> {
    let mut builder = DirBuilder::new();
    builder.recursive(true).mode(0o755);

    builder.create(work_dir).map_err(|e| {
        InstallerError::System(format!(
            "Failed to create directory {}: {}",
            work_dir.display(),
            e
        ))
    })?;

    for sub in WORK_SUBDIRS {
        let path = work_dir.join(sub);
        if let Err(e) = builder.create(&path) {
            log::warn!("Failed to create {}: {}", path.display(), e);
        }
    }

    Ok(())
}

/// Copy the bundled rule and list files into the work directory.
///
/// Missing resources and write errors are skipped. Returns how many files
/// were written.
pub(crate) fn extract_bundled_rules(work_dir: &Path) -> usize {
    let groups: [(&str, &[&str]); 2] = [("rules", &RULE_FILES), ("lists", &LIST_FILES)];
    let mut written = 0;

    for (dir, files) in groups {
        for name in files {
            let resource = format!("{}/{}", dir, name);
            let Some(file) = Templates::get(&resource) else {
                log::debug!("Bundled resource {} not found, skipping", resource);
                continue;
            };

            let target = work_dir.join(dir).join(name);
            match write_file_atomic(&target, &file.data, 0o644) {
                Ok(()) => written += 1,
                Err(e) => log::warn!("Skipping {}: {}", resource, e),
            }
        }
    }

    written
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_work_dir_and_subdirs() {
        let dir = tempfile::TempDir::new().unwrap();
        let work_dir = dir.path().join("cus").join("mosdns");

        create_work_dirs(&work_dir).unwrap();
        for sub in WORK_SUBDIRS {
            assert!(work_dir.join(sub).is_dir(), "{sub} missing");
        }
        // Re-running over an existing tree is fine.
        create_work_dirs(&work_dir).unwrap();
    }

    #[test]
    fn existing_file_blocks_work_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let work_dir = dir.path().join("occupied");
        std::fs::write(&work_dir, "not a directory").unwrap();

        let err = create_work_dirs(&work_dir).unwrap_err();
        assert!(err.to_string().contains("Failed to create directory"));
    }

    #[test]
    fn bundled_files_are_extracted() {
        let dir = tempfile::TempDir::new().unwrap();
        create_work_dirs(dir.path()).unwrap();

        let written = extract_bundled_rules(dir.path());
        assert_eq!(written, RULE_FILES.len() + LIST_FILES.len());
        for name in RULE_FILES {
            assert!(dir.path().join("rules").join(name).is_file());
        }
        for name in LIST_FILES {
            assert!(dir.path().join("lists").join(name).is_file());
        }
    }

    #[test]
    fn extraction_without_subdirs_is_swallowed() {
        let dir = tempfile::TempDir::new().unwrap();
        assert_eq!(extract_bundled_rules(dir.path()), 0);
    }
}
