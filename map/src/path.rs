//! Slash-separated path helpers for document and resource locations.
//!
//! Paths are plain strings using `/` on every platform. A path starting
//! with `/` is absolute; a directory path ends with `/`.

use crate::error::InvalidOperation;

/// Joins `path` onto `base_dir` and normalizes `.` and `..`. The result is
/// always absolute. An absolute `path` ignores `base_dir`.
pub fn resolve(base_dir: &str, path: &str) -> String {
    let base = if path.starts_with('/') { "" } else { base_dir };
    let mut parts: Vec<&str> = Vec::new();
    for part in base.split('/').chain(path.split('/')) {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            p => parts.push(p),
        }
    }
    let mut out = format!("/{}", parts.join("/"));
    if path.ends_with('/') && !parts.is_empty() {
        out.push('/');
    }
    out
}

/// Splits into segments that keep their trailing slash:
/// `"/root/dir/file"` becomes `["/", "root/", "dir/", "file"]`.
pub fn split(path: &str) -> Vec<&str> {
    let mut out: Vec<&str> = path.split_inclusive('/').collect();
    if path.is_empty() {
        out.clear();
    }
    out
}

/// Path of `path` relative to the directory `base_dir`. Common leading
/// segments are compared case-insensitively.
pub fn relative(base_dir: &str, path: &str) -> Result<String, InvalidOperation> {
    for p in [base_dir, path] {
        if !p.starts_with('/') {
            return Err(InvalidOperation::RelativePath(p.to_string()));
        }
    }
    let base = split(base_dir);
    let target = split(path);
    let common = base
        .iter()
        .zip(&target)
        .take_while(|(a, b)| a.eq_ignore_ascii_case(b))
        .count();

    let mut out = "../".repeat(base.len() - common);
    out.extend(target[common..].iter().copied());
    Ok(out)
}

/// First directory of an absolute path, lowercased. Empty for relative paths.
pub fn mount(path: &str) -> String {
    match path.strip_prefix('/') {
        Some(rest) => rest.split('/').next().unwrap_or_default().to_lowercase(),
        None => String::new(),
    }
}

/// Everything up to and including the last `/`.
pub fn dir(path: &str) -> &str {
    path.rfind('/').map_or("", |i| &path[..=i])
}

/// Everything after the last `/`.
pub fn filename(path: &str) -> &str {
    path.rfind('/').map_or(path, |i| &path[i + 1..])
}

/// Absolute location of a resource `src` attribute seen from `base_dir`.
///
/// Absolute sources are returned unchanged. Relative ones need a base
/// directory; without one the location is unknown and empty.
pub fn resource_path(src: &str, base_dir: &str) -> String {
    if src.is_empty() || src.starts_with('/') {
        src.to_string()
    } else if !base_dir.is_empty() {
        resolve(base_dir, src)
    } else {
        String::new()
    }
}

/// `src` value that keeps pointing at the absolute `path` from a document
/// located in `doc_dir`: relative when both share a mount, absolute otherwise.
pub fn rebase(path: &str, doc_dir: &str) -> String {
    if !doc_dir.is_empty() && mount(path) == mount(doc_dir) {
        relative(doc_dir, path).unwrap_or_else(|_| path.to_string())
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_normalizes() {
        assert_eq!(resolve("/maps/ctf/", "../textures/rock.png"), "/maps/textures/rock.png");
        assert_eq!(resolve("/maps/", "./a/./b/"), "/maps/a/b/");
        assert_eq!(resolve("/maps/", "/abs/file"), "/abs/file");
        assert_eq!(resolve("/", "../../x"), "/x");
        assert_eq!(resolve("", ""), "/");
    }

    #[test]
    fn relative_paths() {
        assert_eq!(relative("/a/b/", "/a/c/file.png").unwrap(), "../c/file.png");
        assert_eq!(relative("/A/b/", "/a/B/file.png").unwrap(), "file.png");
        assert_eq!(relative("/x/", "/y/z").unwrap(), "../y/z");
        assert!(matches!(relative("a/", "/b"), Err(InvalidOperation::RelativePath(_))));
    }

    #[test]
    fn mounts_and_dirs() {
        assert_eq!(mount("/Mount/dir/file"), "mount");
        assert_eq!(mount("/single"), "single");
        assert_eq!(mount("mount/dir/file"), "");
        assert_eq!(dir("/root/dir/file"), "/root/dir/");
        assert_eq!(dir("dir/file"), "dir/");
        assert_eq!(dir(""), "");
        assert_eq!(filename("/root/dir/file.png"), "file.png");
        assert_eq!(split("/root/dir/file"), ["/", "root/", "dir/", "file"]);
        assert_eq!(split("/root/dir/"), ["/", "root/", "dir/"]);
    }

    #[test]
    fn resource_locations() {
        assert_eq!(resource_path("../gfx/a.png", "/maps/m/"), "/maps/gfx/a.png");
        assert_eq!(resource_path("/abs/a.png", ""), "/abs/a.png");
        assert_eq!(resource_path("a.png", ""), "");
        assert_eq!(rebase("/maps/gfx/a.png", "/maps/new/"), "../gfx/a.png");
        assert_eq!(rebase("/other/a.png", "/maps/new/"), "/other/a.png");
    }
}
