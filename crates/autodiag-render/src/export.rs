//! Per-cell rendering and export naming.

use std::path::{Path, PathBuf};

use autodiag_cells::CellSequence;

use crate::graphviz::prepare_source;
use crate::renderer::{RenderError, Renderer};

/// Rendered image of one meta cell.
#[derive(Debug)]
pub struct RenderedDiagram {
    /// Position of the cell within its sequence.
    pub position: usize,
    /// Ordinal of the cell among meta cells; names the exported file.
    pub diagram: usize,
    pub svg: Vec<u8>,
}

/// Render every meta cell that has a render source, in ascending position order.
///
/// Meta cells without a render source (unresolved includes, or a sequence
/// that was never updated) are skipped. A failing cell yields an `Err` in its
/// slot and rendering continues with the next cell.
pub fn render_cells(
    renderer: &dyn Renderer,
    cells: &CellSequence,
) -> Vec<Result<RenderedDiagram, RenderError>> {
    cells
        .diagrams()
        .filter_map(|(diagram, cell)| {
            let source = cell.render_source()?;
            let position = cell.position();
            let result = renderer
                .render(&prepare_source(source))
                .map(|svg| RenderedDiagram {
                    position,
                    diagram,
                    svg,
                })
                .map_err(|kind| RenderError {
                    position,
                    diagram,
                    kind,
                });
            if let Err(error) = &result {
                tracing::warn!(backend = renderer.name(), %error, "Diagram rendering failed");
            }
            Some(result)
        })
        .collect()
}

/// Path of the exported image for a diagram: `<file name><diagram>.svg`, next to `file`.
#[must_use]
pub fn export_path(file: &Path, diagram: usize) -> PathBuf {
    let mut name = file.file_name().unwrap_or_default().to_os_string();
    name.push(format!("{diagram}.svg"));
    file.with_file_name(name)
}
