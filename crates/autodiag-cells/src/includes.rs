//! `!include` resolution for directive bodies.
//!
//! An include line is replaced by the referenced fragment, indented to match
//! the directive line. Paths are relative to the directory of the including
//! file; nested includes are relative to the fragment that names them.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ResolutionError;

/// Maximum nesting of included fragments.
pub(crate) const MAX_INCLUDE_DEPTH: usize = 10;

static INCLUDE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([ \t]*)!include[ \t]+(.+?)[ \t]*$").expect("include pattern is valid")
});

/// Indent content with the given whitespace prefix, preserving empty lines.
fn indent_content(content: &str, indent: &str) -> String {
    if indent.is_empty() {
        return content.to_owned();
    }
    content
        .split('\n')
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{indent}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Expand `!include` lines in `source`.
///
/// Angle-bracket includes (`!include <lib>`) belong to the diagram language and
/// are kept as-is.
pub(crate) fn resolve_includes(
    source: &str,
    base_dir: &Path,
    depth: usize,
) -> Result<String, ResolutionError> {
    if depth > MAX_INCLUDE_DEPTH {
        return Err(ResolutionError::DepthExceeded(MAX_INCLUDE_DEPTH));
    }

    let mut out = String::with_capacity(source.len());
    for (i, line) in source.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let Some(caps) = INCLUDE_PATTERN.captures(line) else {
            out.push_str(line);
            continue;
        };
        let indent = caps.get(1).map_or("", |m| m.as_str());
        let include = caps.get(2).map_or("", |m| m.as_str()).trim_matches('"');
        if include.starts_with('<') && include.ends_with('>') {
            out.push_str(line);
            continue;
        }

        let path = base_dir.join(include);
        let fragment =
            std::fs::read_to_string(&path).map_err(|source| ResolutionError::NotFound {
                include: include.to_owned(),
                path: path.clone(),
                source,
            })?;
        let fragment_dir = path.parent().unwrap_or(base_dir);
        let fragment = fragment.replace("\r\n", "\n");
        let resolved =
            resolve_includes(fragment.trim_end_matches('\n'), fragment_dir, depth + 1)?;
        tracing::debug!(include, path = %path.display(), "Resolved include");
        out.push_str(&indent_content(&resolved, indent));
    }
    Ok(out)
}
