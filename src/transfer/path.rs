//! Path resolution for file hand-off.

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::{Result, ShellExecError};

/// Expand a leading `~` or `~/` to the current user's home directory.
///
/// Other forms (`~user/...`) are returned unchanged.
pub fn expand_tilde(raw: &str) -> PathBuf {
    if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

/// Collapse `.` and `..` without touching the filesystem.
///
/// `..` at the root stays at the root.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolve a requested path, confining it to `base` when one is set.
///
/// Without a base directory the expanded path is returned as-is (relative
/// paths stay relative to the process working directory). With one,
/// relative paths are joined onto it and the result must stay inside it,
/// both lexically and after following symlinks.
pub async fn resolve(raw: &str, base: Option<&Path>) -> Result<PathBuf> {
    let expanded = expand_tilde(raw.trim());
    let Some(base) = base else {
        return Ok(expanded);
    };

    let joined = if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    };

    let lexical = normalize_lexically(&joined);
    if !lexical.starts_with(normalize_lexically(base)) {
        return Err(ShellExecError::OutsideBaseDirectory(joined));
    }

    let canonical_base = tokio::fs::canonicalize(base)
        .await
        .map_err(|e| classify_io(e, base))?;
    let canonical = tokio::fs::canonicalize(&lexical)
        .await
        .map_err(|e| classify_io(e, &lexical))?;

    if !canonical.starts_with(&canonical_base) {
        return Err(ShellExecError::OutsideBaseDirectory(joined));
    }

    Ok(canonical)
}

/// Map an I/O error on `path` to the file hand-off error kinds.
pub fn classify_io(err: io::Error, path: &Path) -> ShellExecError {
    match err.kind() {
        io::ErrorKind::NotFound => ShellExecError::FileNotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => ShellExecError::PermissionDenied(path.to_path_buf()),
        _ => ShellExecError::Io(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_tilde_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~"), home);
            assert_eq!(expand_tilde("~/notes.txt"), home.join("notes.txt"));
        }
    }

    #[test]
    fn test_expand_tilde_untouched() {
        assert_eq!(expand_tilde("/etc/hosts"), PathBuf::from("/etc/hosts"));
        assert_eq!(expand_tilde("~other/file"), PathBuf::from("~other/file"));
        assert_eq!(expand_tilde("a/~/b"), PathBuf::from("a/~/b"));
    }

    #[test]
    fn test_normalize_lexically() {
        assert_eq!(
            normalize_lexically(Path::new("/srv/files/./a/../b.txt")),
            PathBuf::from("/srv/files/b.txt")
        );
        assert_eq!(normalize_lexically(Path::new("/../etc")), PathBuf::from("/etc"));
        assert_eq!(normalize_lexically(Path::new("../x")), PathBuf::from("../x"));
    }

    #[tokio::test]
    async fn test_resolve_without_base_passes_through() {
        let path = resolve("relative/file.txt", None).await.unwrap();
        assert_eq!(path, PathBuf::from("relative/file.txt"));
    }

    #[tokio::test]
    async fn test_resolve_rejects_traversal() {
        let base = tempfile::tempdir().unwrap();
        let err = resolve("../../etc/passwd", Some(base.path())).await.unwrap_err();
        assert!(matches!(err, ShellExecError::OutsideBaseDirectory(_)));
    }

    #[tokio::test]
    async fn test_resolve_missing_inside_base() {
        let base = tempfile::tempdir().unwrap();
        let err = resolve("missing.txt", Some(base.path())).await.unwrap_err();
        assert!(matches!(err, ShellExecError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_resolve_relative_inside_base() {
        let base = tempfile::tempdir().unwrap();
        std::fs::write(base.path().join("report.txt"), b"data").unwrap();

        let path = resolve("report.txt", Some(base.path())).await.unwrap();
        assert!(path.ends_with("report.txt"));
        assert!(path.is_absolute());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_resolve_rejects_symlink_escape() {
        let base = tempfile::tempdir().unwrap();
        let outside = tempfile::NamedTempFile::new().unwrap();
        std::os::unix::fs::symlink(outside.path(), base.path().join("link")).unwrap();

        let err = resolve("link", Some(base.path())).await.unwrap_err();
        assert!(matches!(err, ShellExecError::OutsideBaseDirectory(_)));
    }

    #[test]
    fn test_classify_io() {
        let p = Path::new("/x");
        let err = classify_io(io::Error::from(io::ErrorKind::NotFound), p);
        assert!(matches!(err, ShellExecError::FileNotFound(_)));
        let err = classify_io(io::Error::from(io::ErrorKind::PermissionDenied), p);
        assert!(matches!(err, ShellExecError::PermissionDenied(_)));
        let err = classify_io(io::Error::from(io::ErrorKind::Interrupted), p);
        assert!(matches!(err, ShellExecError::Io(_)));
    }
}
