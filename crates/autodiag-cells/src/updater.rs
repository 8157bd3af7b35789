//! Directive canonicalization and include resolution.

use std::path::Path;

use crate::cell::CellSequence;
use crate::error::ResolutionError;
use crate::includes::resolve_includes;

/// Marker that opens a diagram directive unless configured otherwise.
pub const DEFAULT_MARKER: &str = "DIAG";

/// A meta cell whose references could not be resolved.
#[derive(Debug)]
pub struct ResolutionFailure {
    /// Position of the offending cell.
    pub position: usize,
    pub error: ResolutionError,
}

/// Outcome of updating a cell sequence.
#[derive(Debug, Default)]
pub struct UpdateReport {
    /// Number of meta cells that received a render source.
    pub resolved: usize,
    /// Meta cells left as parsed because resolution failed.
    pub failures: Vec<ResolutionFailure>,
}

impl UpdateReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Rewrites meta cells into canonical form.
///
/// For every meta cell the updater:
/// 1. Normalizes line endings to `\n`, drops whitespace before the marker and
///    trailing whitespace on every line
/// 2. Expands `!include` lines of the body relative to the processed file
/// 3. Stores the canonical text as cell content and the expanded body as the
///    cell's render source
///
/// A cell whose includes cannot be resolved keeps its parsed content and gets
/// no render source. Plain cells are never touched.
#[derive(Debug, Clone, Copy)]
pub struct Updater<'a> {
    marker: &'a str,
}

impl<'a> Updater<'a> {
    #[must_use]
    pub fn new(marker: &'a str) -> Self {
        Self { marker }
    }

    /// Update all meta cells of `cells` in place.
    ///
    /// `file` is the absolute path of the processed file; includes resolve
    /// against its parent directory.
    pub fn update(&self, cells: &mut CellSequence, file: &Path) -> UpdateReport {
        let base_dir = file.parent().unwrap_or_else(|| Path::new("."));
        let mut report = UpdateReport::default();

        for cell in cells.iter_mut().filter(|cell| cell.is_meta()) {
            let canonical = canonicalize(cell.content());
            let body = canonical
                .strip_prefix(self.marker)
                .unwrap_or(&canonical)
                .trim();

            match resolve_includes(body, base_dir, 0) {
                Ok(source) => {
                    cell.resolve(canonical.clone(), source);
                    report.resolved += 1;
                }
                Err(error) => {
                    tracing::warn!(
                        file = %file.display(),
                        position = cell.position(),
                        %error,
                        "Failed to resolve directive"
                    );
                    report.failures.push(ResolutionFailure {
                        position: cell.position(),
                        error,
                    });
                }
            }
        }

        report
    }
}

/// Canonical form of directive text. Idempotent.
fn canonicalize(content: &str) -> String {
    content
        .replace("\r\n", "\n")
        .trim_start()
        .split('\n')
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Cell, CellKind};
    use crate::parser::Parser;
    use crate::serializer::serialize;
    use crate::syntax::CommentSyntax;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> CellSequence {
        Parser::new(&CommentSyntax::c_like(), DEFAULT_MARKER)
            .parse(text)
            .unwrap()
    }

    #[test]
    fn test_canonicalize() {
        assert_eq!(canonicalize("  DIAG a->b  "), "DIAG a->b");
        assert_eq!(canonicalize("DIAG\r\na->b \r\n"), "DIAG\na->b\n");
        assert_eq!(canonicalize("\n DIAG\n  a->b\t\n"), "DIAG\n  a->b\n");
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        let once = canonicalize(" \tDIAG  \n  a -> b  \r\n\n");
        assert_eq!(canonicalize(&once), once);
    }

    #[test]
    fn test_update_sets_content_and_render_source() {
        let dir = tempfile::tempdir().unwrap();
        let mut cells = parse("x /* DIAG a->b  */ y");

        let report = Updater::new(DEFAULT_MARKER).update(&mut cells, &dir.path().join("f.c"));

        assert!(report.is_clean());
        assert_eq!(report.resolved, 1);
        let meta = cells.get(1).unwrap();
        assert_eq!(meta.content(), "DIAG a->b");
        assert_eq!(meta.render_source(), Some("a->b"));
    }

    #[test]
    fn test_update_leaves_plain_cells_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut cells = parse("  trailing   \r\n/*DIAG a*/\t ");
        let before: Vec<Cell> = cells
            .iter()
            .filter(|c| c.kind() == CellKind::Plain)
            .cloned()
            .collect();

        Updater::new(DEFAULT_MARKER).update(&mut cells, &dir.path().join("f.c"));

        let after: Vec<Cell> = cells
            .iter()
            .filter(|c| c.kind() == CellKind::Plain)
            .cloned()
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_update_resolves_includes_relative_to_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/fsm.dot"), "idle -> busy").unwrap();
        let mut cells = parse("/*DIAG\n!include fsm.dot\n*/");

        let report =
            Updater::new(DEFAULT_MARKER).update(&mut cells, &dir.path().join("src/top.v"));

        assert!(report.is_clean());
        let meta = cells.get(0).unwrap();
        // The include line stays in the directive; only the render source expands it.
        assert_eq!(meta.content(), "DIAG\n!include fsm.dot\n");
        assert_eq!(meta.render_source(), Some("idle -> busy"));
    }

    #[test]
    fn test_missing_include_keeps_cell_and_reports_position() {
        let dir = tempfile::tempdir().unwrap();
        let mut cells = parse("/*DIAG a->b */ mid /* DIAG\n!include nope.dot */");

        let report = Updater::new(DEFAULT_MARKER).update(&mut cells, &dir.path().join("f.c"));

        assert_eq!(report.resolved, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].position, 2);
        let failed = cells.get(2).unwrap();
        assert_eq!(failed.content(), " DIAG\n!include nope.dot ");
        assert_eq!(failed.render_source(), None);
        // The healthy cell is still updated.
        assert_eq!(cells.get(0).unwrap().content(), "DIAG a->b");
    }

    #[test]
    fn test_updated_output_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f.c");
        let syntax = CommentSyntax::c_like();
        let updater = Updater::new(DEFAULT_MARKER);

        let mut first = parse("a\n  //DIAG x -> y  \n  //  y -> z\nb /* DIAG q */");
        updater.update(&mut first, &file);
        let once = serialize(&first, &syntax);

        let mut second = parse(&once);
        updater.update(&mut second, &file);
        let twice = serialize(&second, &syntax);

        assert_eq!(once, "a\n  /*DIAG x -> y\n  y -> z*/\nb /*DIAG q*/");
        assert_eq!(once, twice);
    }

    /// Parse, update and serialize `text` twice under `syntax`.
    fn normalize_twice(text: &str, syntax: &CommentSyntax) -> (String, String) {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f");
        let parser = Parser::new(syntax, DEFAULT_MARKER);
        let updater = Updater::new(DEFAULT_MARKER);

        let mut first = parser.parse(text).unwrap();
        updater.update(&mut first, &file);
        let once = serialize(&first, syntax);

        let mut second = parser.parse(&once).unwrap();
        updater.update(&mut second, &file);
        let twice = serialize(&second, syntax);

        let cells = |seq: &CellSequence| seq.iter().cloned().collect::<Vec<Cell>>();
        assert_eq!(cells(&first), cells(&second));
        (once, twice)
    }

    #[test]
    fn test_output_is_stable_when_content_ends_like_terminator() {
        let lua = CommentSyntax {
            block_open: "--[[".to_owned(),
            block_close: "]]".to_owned(),
            line_prefix: Some("--".to_owned()),
        };
        let (once, twice) =
            normalize_twice("--[[DIAG a -> b [color=red] ]]\n--DIAG a [c=1]\n", &lua);
        assert_eq!(once, "--[[DIAG a -> b [color=red] ]]\n--[[DIAG a [c=1] ]]\n");
        assert_eq!(once, twice);

        let python = CommentSyntax {
            block_open: "\"\"\"".to_owned(),
            block_close: "\"\"\"".to_owned(),
            line_prefix: Some("#".to_owned()),
        };
        let (once, twice) = normalize_twice("\"\"\"DIAG a -> \"b\" \"\"\"\n", &python);
        assert_eq!(once, "\"\"\"DIAG a -> \"b\" \"\"\"\n");
        assert_eq!(once, twice);
    }
}
