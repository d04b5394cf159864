use std::path::{Path, PathBuf};

/// Resolves a URL path the way a POSIX shell resolves an absolute path:
/// empty and `.` segments vanish, `..` pops a segment (never above root),
/// and any trailing slash is dropped.
///
/// The result always starts with `/`.
pub fn resolve_url_path(path: &str) -> String {
    let mut stack: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            _ => stack.push(segment),
        }
    }

    let mut resolved = String::from("/");
    resolved.push_str(&stack.join("/"));
    resolved
}

/// Collapses every run of slashes into a single slash.
pub fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut previous_slash = false;

    for c in path.chars() {
        if c == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        out.push(c);
    }

    out
}

pub fn ensure_leading_slash(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Last non-empty segment of a URL path (`""` for root).
pub fn last_segment(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or("")
}

/// Extension of the last segment, dot included (`".html"`).
///
/// Dotfiles without a further dot (`.env`) have no extension, while a name
/// ending in a dot (`name.`) has the extension `"."`.
pub fn extension(path: &str) -> &str {
    let segment = last_segment(path);
    match segment.rfind('.') {
        Some(0) | None => "",
        Some(idx) => &segment[idx..],
    }
}

/// Joins a decoded URL path onto `root` without touching the filesystem.
///
/// Returns `None` when `..` segments would climb above `root`. The result is
/// either `root` itself or a path strictly inside it.
pub fn join_contained(root: &Path, url_path: &str) -> Option<PathBuf> {
    let mut parts: Vec<&str> = Vec::new();

    for segment in url_path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            _ => parts.push(segment),
        }
    }

    let mut joined = root.to_path_buf();
    joined.extend(parts);
    Some(joined)
}

/// URL path of `path` relative to `root`, with a leading slash.
pub fn url_relative_to(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(format!("/{}", segments.join("/")))
}
