//! Directive scanner.
//!
//! Splits source text into plain and meta cells. Scanning is driven by an
//! explicit state so that ordinary comments are skipped whole and a file that
//! was already normalized yields the same cell boundaries as its original.
//!
//! Two directive forms are recognized:
//!
//! - Block form: `/*DIAG a->b*/` (the canonical form written back)
//! - Line form: a run of `//DIAG ...` / `// ...` lines, for hosts with line comments

use crate::cell::{CellKind, CellSequence};
use crate::error::{ParseError, ParseErrorKind};
use crate::syntax::CommentSyntax;

/// Scanner state between directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Plain,
    LineComment,
    BlockComment,
}

/// Accumulates cells while scanning.
#[derive(Default)]
struct SequenceBuilder {
    parts: Vec<(CellKind, String)>,
}

impl SequenceBuilder {
    fn push_plain(&mut self, text: &str) {
        if !text.is_empty() {
            self.parts.push((CellKind::Plain, text.to_owned()));
        }
    }

    fn push_meta(&mut self, content: String) {
        self.parts.push((CellKind::Meta, content));
    }

    fn finish(self) -> CellSequence {
        CellSequence::from_parts(self.parts)
    }
}

/// Directive parser for one host syntax and marker.
#[derive(Debug, Clone, Copy)]
pub struct Parser<'a> {
    syntax: &'a CommentSyntax,
    marker: &'a str,
}

impl<'a> Parser<'a> {
    #[must_use]
    pub fn new(syntax: &'a CommentSyntax, marker: &'a str) -> Self {
        Self { syntax, marker }
    }

    /// Split `text` into cells.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] for an unterminated block directive, or for a line
    /// directive whose body contains the block terminator.
    pub fn parse(&self, text: &str) -> Result<CellSequence, ParseError> {
        let open = self.syntax.block_open.as_str();
        let close = self.syntax.block_close.as_str();
        let line_prefix = self.syntax.line_prefix.as_deref();

        let mut builder = SequenceBuilder::default();
        let mut state = State::Plain;
        let mut plain_start = 0;
        let mut i = 0;

        while i < text.len() {
            let rest = &text[i..];
            match state {
                State::Plain => {
                    if rest.starts_with(open) {
                        let body_start = i + open.len();
                        if self.starts_with_marker(&text[body_start..]) {
                            let body_len = text[body_start..].find(close).ok_or_else(|| {
                                ParseError::at(
                                    ParseErrorKind::Unterminated {
                                        close: close.to_owned(),
                                    },
                                    text,
                                    i,
                                )
                            })?;
                            builder.push_plain(&text[plain_start..i]);
                            builder.push_meta(text[body_start..body_start + body_len].to_owned());
                            i = body_start + body_len + close.len();
                            plain_start = i;
                        } else {
                            state = State::BlockComment;
                            i = body_start;
                        }
                        continue;
                    }
                    if let Some(prefix) = line_prefix
                        && rest.starts_with(prefix)
                    {
                        if at_line_start(text, i) && self.starts_with_marker(&rest[prefix.len()..])
                        {
                            let (content, end) = self.scan_line_directive(text, i, prefix)?;
                            builder.push_plain(&text[plain_start..i]);
                            builder.push_meta(content);
                            i = end;
                            plain_start = end;
                        } else {
                            state = State::LineComment;
                            i += prefix.len();
                        }
                        continue;
                    }
                }
                State::LineComment => {
                    if rest.starts_with('\n') {
                        state = State::Plain;
                    }
                }
                State::BlockComment => {
                    if rest.starts_with(close) {
                        state = State::Plain;
                        i += close.len();
                        continue;
                    }
                }
            }
            i += rest.chars().next().map_or(1, char::len_utf8);
        }

        builder.push_plain(&text[plain_start..]);
        Ok(builder.finish())
    }

    /// Whether `s` begins (after horizontal whitespace) with the marker as a whole word.
    fn starts_with_marker(&self, s: &str) -> bool {
        s.trim_start_matches([' ', '\t'])
            .strip_prefix(self.marker)
            .is_some_and(|after| after.chars().next().is_none_or(char::is_whitespace))
    }

    /// Consume a run of line comments starting with a directive line at `start`.
    ///
    /// Returns the joined directive text and the byte offset just past the run
    /// (before the newline of its last line).
    fn scan_line_directive(
        &self,
        text: &str,
        start: usize,
        prefix: &str,
    ) -> Result<(String, usize), ParseError> {
        let (first_end, mut next) = line_bounds(text, start);
        let mut lines = vec![&text[start + prefix.len()..first_end]];
        let mut end = first_end;

        while let Some(line_start) = next {
            let (line_end, following) = line_bounds(text, line_start);
            let line = &text[line_start..line_end];
            let Some(body) = line.trim_start_matches([' ', '\t']).strip_prefix(prefix) else {
                break;
            };
            if self.starts_with_marker(body) {
                break;
            }
            lines.push(body);
            end = line_end;
            next = following;
        }

        let content = lines.join("\n");
        if content.contains(self.syntax.block_close.as_str()) {
            return Err(ParseError::at(
                ParseErrorKind::EmbeddedTerminator {
                    close: self.syntax.block_close.clone(),
                },
                text,
                start,
            ));
        }
        Ok((content, end))
    }
}

/// Whether only spaces and tabs precede `offset` on its line.
fn at_line_start(text: &str, offset: usize) -> bool {
    let before = &text[..offset];
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    before[line_start..].chars().all(|c| c == ' ' || c == '\t')
}

/// End of the line containing `offset` (excluding `\r\n` / `\n`) and the start
/// of the following line, if any.
fn line_bounds(text: &str, offset: usize) -> (usize, Option<usize>) {
    match text[offset..].find('\n') {
        Some(rel) => {
            let newline = offset + rel;
            let end = if text[..newline].ends_with('\r') {
                newline - 1
            } else {
                newline
            };
            (end.max(offset), Some(newline + 1))
        }
        None => (text.len(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;
    use pretty_assertions::assert_eq;

    fn parse_c(text: &str) -> Result<CellSequence, ParseError> {
        Parser::new(&CommentSyntax::c_like(), "DIAG").parse(text)
    }

    fn parts(cells: &CellSequence) -> Vec<(CellKind, &str)> {
        cells.iter().map(|c| (c.kind(), c.content())).collect()
    }

    #[test]
    fn test_block_directive_between_plain_text() {
        let cells = parse_c("before /*DIAG a->b*/ after").unwrap();
        assert_eq!(
            parts(&cells),
            vec![
                (CellKind::Plain, "before "),
                (CellKind::Meta, "DIAG a->b"),
                (CellKind::Plain, " after"),
            ]
        );
        let positions: Vec<_> = cells.iter().map(Cell::position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_text_without_directives_is_one_plain_cell() {
        let cells = parse_c("int main() { return 0; }\n").unwrap();
        assert_eq!(
            parts(&cells),
            vec![(CellKind::Plain, "int main() { return 0; }\n")]
        );
    }

    #[test]
    fn test_empty_text_has_no_cells() {
        assert!(parse_c("").unwrap().is_empty());
    }

    #[test]
    fn test_ordinary_comments_stay_plain() {
        let text = "/* not a diagram */ x /** DIAGRAM */\n// plain DIAG note\n";
        let cells = parse_c(text).unwrap();
        assert_eq!(parts(&cells), vec![(CellKind::Plain, text)]);
    }

    #[test]
    fn test_directive_delimiters_inside_ordinary_comment_are_ignored() {
        let text = "/* see /*DIAG in docs */ x\n// the /*DIAG form\ny";
        let cells = parse_c(text).unwrap();
        assert_eq!(parts(&cells), vec![(CellKind::Plain, text)]);
    }

    #[test]
    fn test_unterminated_ordinary_comment_is_plain() {
        let text = "a /* dangling";
        let cells = parse_c(text).unwrap();
        assert_eq!(parts(&cells), vec![(CellKind::Plain, text)]);
    }

    #[test]
    fn test_unterminated_directive_is_error() {
        let err = parse_c("ok\n  /*DIAG a->b").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::Unterminated {
                close: "*/".to_owned()
            }
        );
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 3);
        assert_eq!(err.offset, 5);
    }

    #[test]
    fn test_marker_after_whitespace() {
        let cells = parse_c("/* DIAG\na->b\n*/").unwrap();
        assert_eq!(parts(&cells), vec![(CellKind::Meta, " DIAG\na->b\n")]);
    }

    #[test]
    fn test_adjacent_directives() {
        let cells = parse_c("/*DIAG a*//*DIAG b*/").unwrap();
        assert_eq!(
            parts(&cells),
            vec![(CellKind::Meta, "DIAG a"), (CellKind::Meta, "DIAG b")]
        );
    }

    #[test]
    fn test_line_directive_run() {
        let text = "x;\n  //DIAG a->b\n  // b->c\nint y;\n";
        let cells = parse_c(text).unwrap();
        assert_eq!(
            parts(&cells),
            vec![
                (CellKind::Plain, "x;\n  "),
                (CellKind::Meta, "DIAG a->b\n b->c"),
                (CellKind::Plain, "\nint y;\n"),
            ]
        );
    }

    #[test]
    fn test_line_directive_stops_at_next_directive() {
        let text = "//DIAG a\n//DIAG b";
        let cells = parse_c(text).unwrap();
        assert_eq!(
            parts(&cells),
            vec![
                (CellKind::Meta, "DIAG a"),
                (CellKind::Plain, "\n"),
                (CellKind::Meta, "DIAG b"),
            ]
        );
    }

    #[test]
    fn test_line_directive_crlf() {
        let text = "//DIAG a\r\n// b\r\nz";
        let cells = parse_c(text).unwrap();
        assert_eq!(
            parts(&cells),
            vec![(CellKind::Meta, "DIAG a\n b"), (CellKind::Plain, "\r\nz")]
        );
    }

    #[test]
    fn test_trailing_line_comment_is_not_directive() {
        let text = "x = 1; //DIAG a->b\n";
        let cells = parse_c(text).unwrap();
        assert_eq!(parts(&cells), vec![(CellKind::Plain, text)]);
    }

    #[test]
    fn test_line_directive_with_terminator_is_error() {
        let err = parse_c("//DIAG a */ b").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::EmbeddedTerminator {
                close: "*/".to_owned()
            }
        );
    }

    #[test]
    fn test_markup_syntax() {
        let syntax = CommentSyntax::markup();
        let cells = Parser::new(&syntax, "DIAG")
            .parse("# Title\n<!--DIAG a->b-->\n// not a comment here\n")
            .unwrap();
        assert_eq!(
            parts(&cells),
            vec![
                (CellKind::Plain, "# Title\n"),
                (CellKind::Meta, "DIAG a->b"),
                (CellKind::Plain, "\n// not a comment here\n"),
            ]
        );
    }

    #[test]
    fn test_custom_marker() {
        let syntax = CommentSyntax::c_like();
        let cells = Parser::new(&syntax, "@dot").parse("/*@dot a->b*/").unwrap();
        assert_eq!(parts(&cells), vec![(CellKind::Meta, "@dot a->b")]);
    }

    #[test]
    fn test_multibyte_text_around_directive() {
        let cells = parse_c("ключ /*DIAG а->б*/ ✓").unwrap();
        assert_eq!(
            parts(&cells),
            vec![
                (CellKind::Plain, "ключ "),
                (CellKind::Meta, "DIAG а->б"),
                (CellKind::Plain, " ✓"),
            ]
        );
    }

    #[test]
    fn test_parse_is_deterministic() {
        let text = "a /*DIAG x*/ b\n//DIAG y\nc";
        assert_eq!(parse_c(text).unwrap(), parse_c(text).unwrap());
    }
}
