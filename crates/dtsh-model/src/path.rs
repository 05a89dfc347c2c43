//! Shell-like path expressions over the devicetree.
//!
//! Pure string functions: no tree access. Paths are `/`-separated, node
//! names never contain `/`, and a trailing `*` is kept as part of the last
//! segment so that glob expansion can happen later.

use dtsh_types::error::{DtshError, Result};

/// Resolve `raw` against the current working branch `cwd` (an absolute path).
///
/// The result is absolute and canonical: `.` segments are dropped, `..` pops
/// one segment but never goes above the root, doubled and trailing separators
/// are removed. A trailing `*` is preserved.
pub fn realpath(raw: &str, cwd: &str) -> Result<String> {
    if raw.is_empty() {
        return Err(DtshError::InvalidPath("empty path".to_string()));
    }
    let absolute = if raw.starts_with('/') {
        raw.to_string()
    } else {
        join(cwd, raw)
    };
    Ok(normalize(&absolute))
}

fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {},
            ".." => {
                // The root is its own parent.
                segments.pop();
            },
            name => segments.push(name),
        }
    }
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Last non-empty segment; `/` for the root.
pub fn basename(path: &str) -> Result<&str> {
    if path.is_empty() {
        return Err(DtshError::InvalidPath("empty path".to_string()));
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok("/");
    }
    Ok(match trimmed.rfind('/') {
        Some(i) => &trimmed[i + 1..],
        None => trimmed,
    })
}

/// All segments but the last.
///
/// `dirname("/usr/bin") == "/usr"`, `dirname("/usr") == "/"`, and a path
/// without any separator yields `"."`.
pub fn dirname(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return if path.is_empty() { "." } else { "/" };
    }
    match trimmed.rfind('/') {
        None => ".",
        Some(i) => {
            let head = trimmed[..i].trim_end_matches('/');
            if head.is_empty() { "/" } else { head }
        },
    }
}

/// Join `dir` and `name` with exactly one separator.
pub fn join(dir: &str, name: &str) -> String {
    let head = dir.trim_end_matches('/');
    let tail = name.trim_start_matches('/');
    let rooted = dir.starts_with('/');
    match (head.is_empty(), tail.is_empty()) {
        (true, true) if rooted || name.starts_with('/') => "/".to_string(),
        (true, true) => String::new(),
        (true, false) if rooted => format!("/{tail}"),
        (true, false) => tail.to_string(),
        (false, true) => head.to_string(),
        (false, false) => format!("{head}/{tail}"),
    }
}

/// Whether the expression ends with a wildcard.
pub fn is_wildcard(path: &str) -> bool {
    path.ends_with('*')
}
