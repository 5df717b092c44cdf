//! Centralised histree path resolution.
//!
//! When `HISTREE_HOME` is set, it replaces **all** platform-native user
//! directories (config and data).
//!
//! Priority for the user-level base directory:
//!   1. `HISTREE_HOME` env var (if set and non-empty)
//!   2. `dirs::config_dir().map(|d| d.join("histree"))` (platform default)
//!
//! The database location is resolved by [`crate::config::Config::db_path`],
//! which layers the `--db` flag and the config file on top of
//! [`default_db_path`].

use std::path::{Component, Path, PathBuf};

use anyhow::Context as _;

/// Return the `HISTREE_HOME` path when set and non-empty, otherwise fall
/// through to the platform-native `dirs_fallback`.
fn resolve_user_path(dirs_fallback: Option<PathBuf>) -> Option<PathBuf> {
    if let Ok(home) = std::env::var("HISTREE_HOME")
        && !home.is_empty()
    {
        return Some(PathBuf::from(home));
    }
    dirs_fallback
}

/// Returns the histree user-level config directory (holds `config.toml`).
pub fn user_dir() -> Option<PathBuf> {
    resolve_user_path(dirs::config_dir().map(|d| d.join("histree")))
}

/// Returns the base directory for data files (the history database).
///
/// When `HISTREE_HOME` is set, identical to `user_dir()`.
pub fn user_data_dir() -> Option<PathBuf> {
    resolve_user_path(dirs::data_local_dir().map(|d| d.join("histree")))
}

/// Database path used when neither `--db` nor the config file names one.
pub fn default_db_path() -> Option<PathBuf> {
    user_data_dir().map(|d| d.join("histree.db"))
}

/// Lexically clean `path`: drop `.` segments, resolve `..` against the
/// preceding segment, collapse repeated separators and strip a trailing
/// separator. The filesystem is never consulted, so symlinks are kept as-is.
pub fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `..` at the root stays at the root.
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Make `path` absolute against `base` (when relative) and clean it.
pub fn absolutize_from(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        clean(path)
    } else {
        clean(&base.join(path))
    }
}

/// Make `path` absolute against the current working directory and clean it.
///
/// # Errors
/// Returns an error if the path is relative and the working directory cannot
/// be determined.
pub fn absolutize(path: &Path) -> anyhow::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(clean(path));
    }
    let cwd = std::env::current_dir().context("determine current directory")?;
    Ok(absolutize_from(path, &cwd))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serial_test::serial;

    use super::*;

    fn set_histree_home(val: &str) {
        // SAFETY: test-only env mutation; #[serial] prevents races.
        unsafe { std::env::set_var("HISTREE_HOME", val) };
    }

    fn clear_histree_home() {
        unsafe { std::env::remove_var("HISTREE_HOME") };
    }

    #[test]
    #[serial]
    fn user_dir_uses_histree_home_when_set() {
        set_histree_home("/custom/histree/home");
        let result = user_dir();
        clear_histree_home();
        assert_eq!(result, Some(PathBuf::from("/custom/histree/home")));
    }

    #[test]
    #[serial]
    fn user_dir_ignores_empty_histree_home() {
        set_histree_home("");
        let result = user_dir();
        clear_histree_home();
        if let Some(p) = result {
            assert_ne!(p, PathBuf::from(""));
        }
    }

    #[test]
    #[serial]
    fn default_db_path_lives_under_histree_home() {
        set_histree_home("/unified/home");
        let db = default_db_path();
        let config = user_dir();
        clear_histree_home();
        assert_eq!(db, Some(PathBuf::from("/unified/home/histree.db")));
        assert_eq!(config, Some(PathBuf::from("/unified/home")));
    }

    #[test]
    #[serial]
    fn user_data_dir_fallback_matches_dirs_crate() {
        clear_histree_home();
        assert_eq!(
            user_data_dir(),
            dirs::data_local_dir().map(|d| d.join("histree"))
        );
    }

    #[test]
    fn clean_collapses_dot_segments_and_separators() {
        assert_eq!(
            clean(Path::new("/home//user/./projects/../work/")),
            PathBuf::from("/home/user/work")
        );
    }

    #[test]
    fn clean_keeps_parent_dir_at_root() {
        assert_eq!(clean(Path::new("/../tmp")), PathBuf::from("/tmp"));
        assert_eq!(clean(Path::new("/")), PathBuf::from("/"));
    }

    #[test]
    fn clean_relative_path_keeps_leading_parents() {
        assert_eq!(clean(Path::new("../a/./b/..")), PathBuf::from("../a"));
        assert_eq!(clean(Path::new("./")), PathBuf::from("."));
    }

    #[test]
    fn absolutize_from_joins_relative_paths() {
        assert_eq!(
            absolutize_from(Path::new("../renamed"), Path::new("/home/user/old")),
            PathBuf::from("/home/user/renamed")
        );
        assert_eq!(
            absolutize_from(Path::new("/srv/app/"), Path::new("/ignored")),
            PathBuf::from("/srv/app")
        );
    }

    #[test]
    fn absolutize_returns_absolute_path() {
        let p = absolutize(Path::new("some/dir")).unwrap();
        assert!(p.is_absolute());
        assert!(p.ends_with("some/dir"));
    }
}
