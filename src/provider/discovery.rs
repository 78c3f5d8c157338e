//! Locating provider CLIs and their stored credentials.

use std::path::{Path, PathBuf};

use serde_json::Value;

/// Install locations checked after `PATH`, relative to the home directory
const HOME_BIN_DIRS: &[&str] = &[".local/bin", ".npm-global/bin", ".bun/bin"];

/// System-wide install locations checked last
const SYSTEM_BIN_DIRS: &[&str] = &["/usr/local/bin", "/opt/homebrew/bin"];

/// Resolve a CLI executable.
///
/// `override_path` (from `[provider.<id>] binary`) wins when set. A value
/// containing a path separator must point at an executable file; a bare name
/// replaces `binary` in the normal search.
pub fn find_executable(binary: &str, override_path: Option<&str>) -> Option<PathBuf> {
    let name = match override_path {
        Some(path) if path.contains(std::path::MAIN_SEPARATOR) || path.contains('/') => {
            let path = expand_home(path);
            return is_executable(&path).then_some(path);
        }
        Some(name) => name,
        None => binary,
    };

    search_dirs()
        .into_iter()
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

fn search_dirs() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).collect())
        .unwrap_or_default();

    if let Some(home) = dirs::home_dir() {
        dirs.extend(HOME_BIN_DIRS.iter().map(|rel| home.join(rel)));
    }
    dirs.extend(SYSTEM_BIN_DIRS.iter().map(PathBuf::from));
    dirs
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// A file under the home directory, if it exists
pub(crate) fn home_file(rel: &str) -> Option<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(rel))
        .filter(|path| path.is_file())
}

/// A JSON file under the home directory, if it exists and parses
pub(crate) fn home_json(rel: &str) -> Option<Value> {
    let path = home_file(rel)?;
    let content = std::fs::read_to_string(&path).ok()?;
    serde_json::from_str(&content).ok()
}

/// Name of the first variable in `vars` that is set and non-empty
pub(crate) fn first_env(vars: &[&'static str]) -> Option<&'static str> {
    vars.iter()
        .copied()
        .find(|var| std::env::var(var).is_ok_and(|v| !v.trim().is_empty()))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn write_script(dir: &Path, name: &str, mode: u32) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    #[test]
    fn explicit_path_must_be_executable() {
        let dir = TempDir::new().unwrap();
        let exe = write_script(dir.path(), "claude", 0o755);
        let plain = write_script(dir.path(), "notes", 0o644);

        assert_eq!(
            find_executable("claude", exe.to_str()),
            Some(exe.clone())
        );
        assert_eq!(find_executable("claude", plain.to_str()), None);
        assert_eq!(
            find_executable("claude", dir.path().join("missing").to_str()),
            None
        );
    }

    #[test]
    fn bare_name_is_searched_on_path() {
        // `sh` is on PATH on every unix test host
        let found = find_executable("sh", None).expect("sh on PATH");
        assert!(found.ends_with("sh"));
        assert!(find_executable("definitely-not-a-real-cli-7f3a", None).is_none());
    }
}
