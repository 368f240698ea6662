//! Canonical path normalization.
//!
//! Every [`crate::Vfs`] method takes paths already passed through
//! [`normalize`]; the repository root is the empty string.

/// Normalize `raw` into its canonical form: no leading `/`, no leading `./`,
/// no trailing `/`. Idempotent.
pub fn normalize(raw: &str) -> String {
    let stripped = raw.trim_start_matches('/');

    let stripped = if stripped == "." || stripped == "./" {
        ""
    } else if let Some(rest) = stripped.strip_prefix("./") {
        rest
    } else {
        stripped
    };

    stripped.trim_end_matches('/').to_string()
}

/// Split a canonical path into its `/`-separated segments. The root (`""`)
/// has zero segments.
pub fn segments(canonical: &str) -> Vec<&str> {
    if canonical.is_empty() {
        Vec::new()
    } else {
        canonical.split('/').collect()
    }
}

/// The canonical path of the containing directory, or `""` for a top-level
/// entry or the root itself.
pub fn parent_of(canonical: &str) -> String {
    match canonical.rsplit_once('/') {
        Some((parent, _)) => parent.to_string(),
        None => String::new(),
    }
}

/// The final path segment (basename). For the root this is `""`.
pub fn basename(canonical: &str) -> &str {
    match canonical.rsplit_once('/') {
        Some((_, name)) => name,
        None => canonical,
    }
}

/// Join a parent directory and a single path segment into a canonical path.
pub fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}
