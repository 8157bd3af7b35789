//! Cell and cell sequence types.

/// Kind of a cell. Fixed when the cell is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    /// Ordinary host text, emitted verbatim.
    Plain,
    /// Diagram directive, emitted as a block comment.
    Meta,
}

/// A contiguous span of source text tagged with its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    kind: CellKind,
    position: usize,
    content: String,
    /// Directive body with includes expanded, set by the updater.
    render_source: Option<String>,
}

impl Cell {
    /// Create a plain cell.
    #[must_use]
    pub fn plain(position: usize, content: impl Into<String>) -> Self {
        Self {
            kind: CellKind::Plain,
            position,
            content: content.into(),
            render_source: None,
        }
    }

    /// Create a meta cell holding directive text without its comment delimiters.
    #[must_use]
    pub fn meta(position: usize, content: impl Into<String>) -> Self {
        Self {
            kind: CellKind::Meta,
            position,
            content: content.into(),
            render_source: None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> CellKind {
        self.kind
    }

    #[must_use]
    pub fn is_meta(&self) -> bool {
        self.kind == CellKind::Meta
    }

    /// Zero-based index of this cell within its sequence.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Diagram source ready for rendering.
    ///
    /// `None` for plain cells, for meta cells that have not been updated, and
    /// for meta cells whose includes could not be resolved.
    #[must_use]
    pub fn render_source(&self) -> Option<&str> {
        self.render_source.as_deref()
    }

    /// Replace the directive text and attach its render source.
    pub(crate) fn resolve(&mut self, content: String, render_source: String) {
        debug_assert!(self.is_meta(), "only meta cells are updated");
        self.content = content;
        self.render_source = Some(render_source);
    }
}

/// Ordered cells of one file, in textual order.
///
/// Positions are dense: the cell at index `i` has position `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellSequence {
    cells: Vec<Cell>,
}

impl CellSequence {
    /// Build a sequence from cell contents, assigning positions in order.
    #[must_use]
    pub fn from_parts(parts: impl IntoIterator<Item = (CellKind, String)>) -> Self {
        let cells = parts
            .into_iter()
            .enumerate()
            .map(|(position, (kind, content))| match kind {
                CellKind::Plain => Cell::plain(position, content),
                CellKind::Meta => Cell::meta(position, content),
            })
            .collect();
        Self { cells }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cell> {
        self.cells.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, Cell> {
        self.cells.iter_mut()
    }

    #[must_use]
    pub fn get(&self, position: usize) -> Option<&Cell> {
        self.cells.get(position)
    }

    /// Meta cells paired with their diagram index (ordinal among meta cells).
    pub fn diagrams(&self) -> impl Iterator<Item = (usize, &Cell)> {
        self.cells.iter().filter(|cell| cell.is_meta()).enumerate()
    }

    /// Number of meta cells.
    #[must_use]
    pub fn diagram_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_meta()).count()
    }
}

impl<'a> IntoIterator for &'a CellSequence {
    type Item = &'a Cell;
    type IntoIter = std::slice::Iter<'a, Cell>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
