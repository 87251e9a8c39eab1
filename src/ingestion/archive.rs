//! Archive extraction with protection against entries escaping the destination.

use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use zip::ZipArchive;

/// Extensions accepted at upload time.
pub const ACCEPTED_EXTENSIONS: &[&str] = &[".zip", ".tar", ".gz"];

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported archive format: {0}")]
    UnsupportedFormat(String),

    #[error("corrupt archive: {0}")]
    CorruptArchive(String),

    #[error("I/O failure during extraction: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
}

impl ArchiveFormat {
    /// Pick a format from the archive's file name.
    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default();
        match ext.as_str() {
            ".zip" => Ok(ArchiveFormat::Zip),
            _ => Err(ExtractError::UnsupportedFormat(if ext.is_empty() {
                "(none)".to_string()
            } else {
                ext
            })),
        }
    }
}

/// Whether an uploaded file name carries an accepted archive extension.
pub fn is_valid_archive(file_name: &str) -> bool {
    let lowered = file_name.to_lowercase();
    ACCEPTED_EXTENSIONS.iter().any(|ext| lowered.ends_with(ext))
}

/// Extract `archive` into `dest`, creating `dest` if needed. Returns `dest`.
pub fn extract(archive: &Path, dest: &Path) -> Result<PathBuf, ExtractError> {
    match ArchiveFormat::from_path(archive)? {
        ArchiveFormat::Zip => extract_zip(archive, dest)?,
    }
    Ok(dest.to_path_buf())
}

fn extract_zip(archive: &Path, dest: &Path) -> Result<(), ExtractError> {
    let file = File::open(archive)?;
    let mut zip = ZipArchive::new(file).map_err(|e| ExtractError::CorruptArchive(e.to_string()))?;
    fs::create_dir_all(dest)?;

    log::debug!("Extracting {} entries from {}", zip.len(), archive.display());

    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| ExtractError::CorruptArchive(e.to_string()))?;
        let out_path = safe_join(dest, entry.name())?;

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out_file = File::create(&out_path)?;
        io::copy(&mut entry, &mut out_file)?;
    }

    Ok(())
}

/// Directory to analyse inside an extraction destination.
///
/// Archives that wrap everything in one top-level folder resolve to that
/// folder, so the project keeps its own name and root-level manifests.
pub fn project_root(dest: &Path) -> io::Result<PathBuf> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dest)? {
        let entry = entry?;
        if entry.file_name() == "__MACOSX" {
            continue;
        }
        entries.push(entry);
    }
    match entries.as_slice() {
        [only] if only.file_type()?.is_dir() => Ok(only.path()),
        _ => Ok(dest.to_path_buf()),
    }
}

/// Resolve an archive entry name below `dest`.
///
/// Absolute names and `..` components are rejected.
pub fn safe_join(dest: &Path, entry_name: &str) -> Result<PathBuf, ExtractError> {
    let mut out = dest.to_path_buf();
    for component in Path::new(entry_name).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ExtractError::CorruptArchive(format!(
                    "entry escapes extraction directory: {}",
                    entry_name
                )));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::FileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        for (name, content) in entries {
            writer.start_file(*name, FileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_extract_zip() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("project.zip");
        write_zip(&archive, &[("package.json", "{}"), ("src/index.js", "1")]);

        let dest = temp_dir.path().join("out");
        let root = extract(&archive, &dest).unwrap();

        assert_eq!(root, dest);
        assert!(dest.join("package.json").is_file());
        assert_eq!(fs::read_to_string(dest.join("src/index.js")).unwrap(), "1");
    }

    #[test]
    fn test_project_root_unwraps_single_folder() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("wrapped.zip");
        write_zip(
            &archive,
            &[("my-app/go.mod", "module x"), ("__MACOSX/my-app/._go.mod", "")],
        );
        let dest = extract(&archive, &temp_dir.path().join("out")).unwrap();

        assert_eq!(project_root(&dest).unwrap(), dest.join("my-app"));

        fs::write(dest.join("README.md"), "").unwrap();
        assert_eq!(project_root(&dest).unwrap(), dest);
    }

    #[test]
    fn test_rejects_unsupported_format() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("project.tar");
        fs::write(&archive, "").unwrap();

        let err = extract(&archive, &temp_dir.path().join("out")).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(ref ext) if ext == ".tar"));
    }

    #[test]
    fn test_rejects_corrupt_zip() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("broken.zip");
        fs::write(&archive, "definitely not a zip").unwrap();

        let err = extract(&archive, &temp_dir.path().join("out")).unwrap_err();
        assert!(matches!(err, ExtractError::CorruptArchive(_)));
    }

    #[test]
    fn test_safe_join() {
        let dest = Path::new("/tmp/job");
        assert_eq!(safe_join(dest, "a/./b.txt").unwrap(), PathBuf::from("/tmp/job/a/b.txt"));
        assert!(safe_join(dest, "../escape.txt").is_err());
        assert!(safe_join(dest, "/etc/passwd").is_err());
    }

    #[test]
    fn test_is_valid_archive() {
        assert!(is_valid_archive("code.ZIP"));
        assert!(is_valid_archive("code.tar.gz"));
        assert!(!is_valid_archive("code.rar"));
    }
}
