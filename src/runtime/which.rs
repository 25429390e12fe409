//! Executable lookup on PATH.

use std::env;
use std::path::{Path, PathBuf};

/// Resolve `command[0]` on PATH and return the full argv prefix, or `None`
/// when the program cannot be found. A missing or empty PATH finds nothing.
pub fn which(command: &[String]) -> Option<Vec<String>> {
    let (name, args) = command.split_first()?;
    let path = find_executable(name, &path_extensions())?;
    let mut argv = Vec::with_capacity(command.len());
    argv.push(path.to_string_lossy().into_owned());
    argv.extend(args.iter().cloned());
    Some(argv)
}

fn path_extensions() -> Vec<String> {
    if cfg!(windows) {
        env::var("PATHEXT")
            .unwrap_or_default()
            .split(';')
            .map(str::to_string)
            .collect()
    } else {
        vec![String::new()]
    }
}

fn find_executable(name: &str, extensions: &[String]) -> Option<PathBuf> {
    let direct = Path::new(name);
    if direct.is_absolute() {
        return extensions
            .iter()
            .map(|ext| PathBuf::from(format!("{name}{ext}")))
            .find(|p| is_executable(p));
    }

    let paths = env::var_os("PATH")?;
    for dir in env::split_paths(&paths) {
        if dir.as_os_str().is_empty() {
            continue;
        }
        for ext in extensions {
            let candidate = dir.join(format!("{name}{ext}"));
            if is_executable(&candidate) {
                return Some(candidate);
            }
        }
    }
    None
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    #[test]
    fn missing_program_is_none() {
        assert!(which(&["definitely-not-a-real-program-xyz".to_string()]).is_none());
        assert!(which(&[]).is_none());
    }

    #[test]
    fn absolute_path_keeps_trailing_args() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("fakejs");
        fs::write(&exe, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&exe, fs::Permissions::from_mode(0o755)).unwrap();

        let cmd = vec![exe.to_string_lossy().into_owned(), "--flag".to_string()];
        assert_eq!(which(&cmd), Some(cmd.clone()));
    }

    #[test]
    fn non_executable_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain");
        fs::write(&file, "").unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o644)).unwrap();
        assert!(which(&[file.to_string_lossy().into_owned()]).is_none());
    }
}
