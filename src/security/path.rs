use std::path::{Component, Path, PathBuf};

/// Filesystem prefixes a model-proposed action may not touch.
static SENSITIVE_PREFIXES: &[&str] =
    &["/etc", "/usr", "/var", "/boot", "/root", "/dev", "/proc", "/sys"];

/// Validate a path proposed for a tool action.
///
/// Rejects traversal (any literal `..`, checked textually before
/// normalization, so `a/../b` is refused even though it would normalize
/// inside bounds), expands `~` and `$HOME`, normalizes without touching the
/// filesystem, refuses sensitive system prefixes and, when `base_dir` is
/// given, confines the result under it. Returns the normalized path on
/// success and the rejection reason on failure.
pub fn check_path(path: &str, base_dir: Option<&Path>) -> Result<PathBuf, String> {
    let path = path.trim();
    if path.is_empty() {
        return Err("Empty path".to_string());
    }

    // Textual check first: normalization must never launder a traversal.
    // Any literal `..` is refused, even inside a filename.
    if path.contains("..") {
        return Err("Path traversal detected (..)".to_string());
    }

    let expanded = expand_home(path)?;
    let normalized = normalize_path(&expanded);

    for prefix in SENSITIVE_PREFIXES {
        let prefix = Path::new(prefix);
        if normalized.starts_with(prefix) {
            return Err(format!("Access to sensitive area: {}", prefix.display()));
        }
    }

    if let Some(base) = base_dir {
        let base = normalize_path(base);
        let candidate = if normalized.is_absolute() {
            normalized
        } else {
            normalize_path(&base.join(&normalized))
        };
        if !candidate.starts_with(&base) {
            return Err("Path leaves the allowed directory".to_string());
        }
        return Ok(candidate);
    }

    Ok(normalized)
}

/// Expand a leading `~` or `$HOME` to the user's home directory.
fn expand_home(path: &str) -> Result<PathBuf, String> {
    let needs_home =
        path == "~" || path.starts_with("~/") || path == "$HOME" || path.starts_with("$HOME/");
    if !needs_home {
        return Ok(PathBuf::from(path));
    }

    let home = dirs::home_dir().ok_or_else(|| "Cannot determine home directory".to_string())?;
    let rest = path
        .trim_start_matches("$HOME")
        .trim_start_matches('~')
        .trim_start_matches('/');
    if rest.is_empty() {
        Ok(home)
    } else {
        Ok(home.join(rest))
    }
}

/// Normalize a path by resolving `.` and `..` components without touching the
/// filesystem. Unlike `canonicalize()`, this works even if the path doesn't
/// exist.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(last) = components.last() {
                    match last {
                        Component::RootDir | Component::Prefix(_) => {}
                        Component::ParentDir => {
                            components.push(component);
                        }
                        _ => {
                            components.pop();
                        }
                    }
                } else {
                    components.push(component);
                }
            }
            _ => {
                components.push(component);
            }
        }
    }

    let mut result = PathBuf::new();
    for c in &components {
        result.push(c.as_os_str());
    }
    if result.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        result
    }
}
