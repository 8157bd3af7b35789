//! Rendering backend trait and errors.

/// Diagram rendering backend.
///
/// Implementations must be pure with respect to their input: the same source
/// yields the same image, and one failure does not affect later calls.
pub trait Renderer: Send + Sync {
    /// Short backend name for logs (e.g. "kroki").
    fn name(&self) -> &str;

    /// Render Graphviz source to SVG bytes.
    fn render(&self, source: &str) -> Result<Vec<u8>, RenderErrorKind>;
}

/// Rendering failure attributed to a cell.
#[derive(Debug, thiserror::Error)]
#[error("diagram {diagram} (cell {position}): {kind}")]
pub struct RenderError {
    /// Position of the cell within its sequence.
    pub position: usize,
    /// Ordinal of the cell among meta cells.
    pub diagram: usize,
    pub kind: RenderErrorKind,
}

/// Kind of rendering failure.
#[derive(Debug, thiserror::Error)]
pub enum RenderErrorKind {
    /// The backend rejected the diagram description.
    #[error("diagram rejected: {0}")]
    Rejected(String),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("backend returned invalid SVG: {0}")]
    InvalidSvg(String),
}
