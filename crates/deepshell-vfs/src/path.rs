//! Path resolution.
//!
//! Pure string functions: nothing here touches the tree, so a resolved path
//! may or may not exist.

/// Fixed home directory that `~` expands to.
pub const HOME_DIR: &str = "/home/guest";

/// Resolve a user-supplied path against the current working directory.
///
/// Empty input resolves to `cwd`. `~` and a leading `~/` expand to
/// [`HOME_DIR`]; `~name` is an ordinary relative name. `.` segments are
/// dropped and `..` pops the previous segment, stopping at root. The result
/// is always canonical: one leading `/`, no empty segments, no trailing `/`.
pub fn resolve_path(input: &str, cwd: &str) -> String {
    if input.is_empty() {
        return cwd.to_string();
    }

    let expanded;
    let input = if input == "~" {
        HOME_DIR
    } else if let Some(rest) = input.strip_prefix("~/") {
        expanded = format!("{HOME_DIR}/{rest}");
        expanded.as_str()
    } else {
        input
    };

    let raw = if input.starts_with('/') {
        input.to_string()
    } else {
        format!("{cwd}/{input}")
    };

    let mut parts: Vec<&str> = Vec::new();
    for component in raw.split('/') {
        match component {
            "" | "." => {},
            ".." => {
                parts.pop();
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", parts.join("/"))
    }
}

/// Split a canonical path into its parent directory and final name.
///
/// Returns `None` for root, which has no parent.
pub fn parent_and_name(path: &str) -> Option<(&str, &str)> {
    if path == "/" {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some(("/", &path[1..])),
        Some(i) => Some((&path[..i], &path[i + 1..])),
        None => None,
    }
}

/// Join a canonical directory path and a child name.
pub fn join(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// Iterate over the segments of a canonical path (none for root).
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Render `path` with the home directory abbreviated to `~`, as a prompt does.
pub fn display_path(path: &str) -> String {
    if path == HOME_DIR {
        "~".to_string()
    } else if let Some(rest) = path.strip_prefix(HOME_DIR)
        && rest.starts_with('/')
    {
        format!("~{rest}")
    } else {
        path.to_string()
    }
}
