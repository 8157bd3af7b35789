//! Cell sequence serialization.

use crate::cell::{CellKind, CellSequence};
use crate::syntax::CommentSyntax;

/// Reassemble cells into text.
///
/// Plain cells are emitted verbatim. Meta cells are wrapped in the block
/// comment delimiters of `syntax`, whatever form they were parsed from.
#[must_use]
pub fn serialize(cells: &CellSequence, syntax: &CommentSyntax) -> String {
    let capacity = cells
        .iter()
        .map(|cell| match cell.kind() {
            CellKind::Plain => cell.content().len(),
            CellKind::Meta => {
                cell.content().len() + syntax.block_open.len() + syntax.block_close.len()
            }
        })
        .sum();

    let mut out = String::with_capacity(capacity);
    for cell in cells {
        match cell.kind() {
            CellKind::Plain => out.push_str(cell.content()),
            CellKind::Meta => out.push_str(&syntax.wrap(cell.content())),
        }
    }
    out
}
