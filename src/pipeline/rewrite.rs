//! Path rewriting: turn absolute image-directory references inside the
//! generated Markdown into POSIX relative paths from the Markdown file.
//!
//! ## Why textual substitution?
//!
//! The engine's image syntax is treated as opaque text carrying a path
//! substring. Parsing the Markdown structurally would couple this stage to
//! one engine's link flavour; a literal replacement of the directory string
//! (raw and canonicalized forms) rewrites every reference no matter how the
//! engine chose to spell the link.
//!
//! If the relative path cannot be computed at all (paths on different
//! filesystem roots), the text is returned unmodified with a warning — a
//! Markdown file with absolute paths still renders locally, a failed
//! conversion helps nobody.

use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Replace every occurrence of `image_dir` (raw and symlink-resolved forms)
/// in `text` with its path relative to `md_path`'s parent directory.
pub fn rewrite_image_paths(text: &str, image_dir: &Path, md_path: &Path) -> String {
    let md_parent = md_path.parent().unwrap_or(Path::new("."));

    let Some(rel) = relative_to(image_dir, md_parent) else {
        warn!(
            "Cannot express '{}' relative to '{}'; leaving Markdown paths unmodified",
            image_dir.display(),
            md_parent.display()
        );
        return text.to_string();
    };

    let rel_str = posix_prefixed(&rel);
    debug!("Rewriting '{}' → '{}'", image_dir.display(), rel_str);

    let mut out = text.replace(&image_dir.to_string_lossy().into_owned(), &rel_str);

    // The engine may have recorded the fully resolved (symlink-free) form.
    if let Ok(resolved) = fs::canonicalize(image_dir) {
        let resolved_str = resolved.to_string_lossy().into_owned();
        if resolved != image_dir {
            out = out.replace(&resolved_str, &rel_str);
        }
    }

    out
}

/// POSIX-join the components and prefix with `./` unless the path already
/// starts with `.` or `/`.
fn posix_prefixed(path: &Path) -> String {
    let joined: Vec<String> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    let s = joined.join("/");

    if s.starts_with('.') || s.starts_with('/') {
        s
    } else {
        format!("./{s}")
    }
}

/// Compute `target` relative to `base`, component-wise.
///
/// Both paths must be absolute or both relative; a mix, or absolute paths
/// sharing no root component, yields `None`.
fn relative_to(target: &Path, base: &Path) -> Option<PathBuf> {
    if target.is_absolute() != base.is_absolute() {
        return None;
    }

    let t: Vec<Component<'_>> = target.components().collect();
    let b: Vec<Component<'_>> = base.components().collect();

    let common = t
        .iter()
        .zip(b.iter())
        .take_while(|(a, b)| a == b)
        .count();

    // Two absolute paths that agree on nothing live on different roots
    // (drive letters, UNC prefixes) and cannot be relativized.
    if common == 0 && target.is_absolute() {
        return None;
    }

    let mut rel = PathBuf::new();
    for _ in common..b.len() {
        rel.push("..");
    }
    for c in &t[common..] {
        rel.push(c.as_os_str());
    }

    if rel.as_os_str().is_empty() {
        rel.push(".");
    }
    Some(rel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sibling_directory_gets_dot_prefix() {
        let text = "![](/docs/Paper/materials/fig1.png)\n![](/docs/Paper/materials/fig2.png)\n";
        let out = rewrite_image_paths(
            text,
            Path::new("/docs/Paper/materials"),
            Path::new("/docs/Paper/output.md"),
        );
        assert_eq!(out, "![](./materials/fig1.png)\n![](./materials/fig2.png)\n");
    }

    #[test]
    fn all_occurrences_are_replaced() {
        let abs = "/docs/Paper/materials";
        let text = format!("a {abs}/x.png b {abs}/y.png c {abs}/z.png");
        let out = rewrite_image_paths(&text, Path::new(abs), Path::new("/docs/Paper/out.md"));
        assert_eq!(out.matches(abs).count(), 0);
        assert_eq!(out.matches("./materials/").count(), 3);
    }

    #[test]
    fn parent_traversal_uses_dotdot() {
        let out = rewrite_image_paths(
            "![](/data/assets/fig.png)",
            Path::new("/data/assets"),
            Path::new("/data/papers/notes/out.md"),
        );
        assert_eq!(out, "![](../../assets/fig.png)");
    }

    #[test]
    fn unrelated_text_is_untouched(){
        let out = rewrite_image_paths(
            "nothing to see here",
            Path::new("/docs/Paper/materials"),
            Path::new("/docs/Paper/out.md"),
        );
        assert_eq!(out, "nothing to see here");
    }

    #[test]
    fn mixed_roots_leave_text_unmodified() {
        let text = "![](materials/fig.png)";
        let out = rewrite_image_paths(text, Path::new("materials"), Path::new("/abs/out.md"));
        assert_eq!(out, text);
    }

    #[test]
    fn relative_to_same_directory_is_dot() {
        let rel = relative_to(Path::new("/a/b"), Path::new("/a/b")).unwrap();
        assert_eq!(rel, Path::new("."));
    }

    #[test]
    fn relative_inputs_work_too() {
        let rel = relative_to(Path::new("out/materials"), Path::new("out")).unwrap();
        assert_eq!(rel, Path::new("materials"));
    }

    #[test]
    fn posix_prefix_rules() {
        assert_eq!(posix_prefixed(Path::new("materials")), "./materials");
        assert_eq!(posix_prefixed(Path::new("../assets")), "../assets");
        assert_eq!(posix_prefixed(Path::new(".")), ".");
    }
}
