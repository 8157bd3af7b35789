//! One read-modify-write cycle over a single file.
//!
//! A cycle owns its cell sequence from read to write. The write lease for the
//! file, and for each image it exports, is held for the whole cycle, so a
//! second cycle for the same path waits and the watcher ignores events caused
//! by the cycle's own writes.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use autodiag_cells::{
    CellSequence, DEFAULT_MARKER, ParseError, Parser, ResolutionFailure, SyntaxRegistry,
    Updater, serialize,
};
use autodiag_render::{RenderError, RenderedDiagram, Renderer, export_path, render_cells};
use autodiag_watch::WriteLeases;

/// Error that aborts a cycle. The file is left as it was.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("rendering task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Failure attributed to one meta cell. Never aborts the cycle.
#[derive(Debug, thiserror::Error)]
pub enum CellFailure {
    #[error("cell {}: {}", .0.position, .0.error)]
    Resolution(ResolutionFailure),
    #[error("{0}")]
    Render(RenderError),
    #[error("diagram {diagram} (cell {position}): failed to write {}: {source}", path.display())]
    Export {
        position: usize,
        diagram: usize,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CellFailure {
    /// Position of the failing cell.
    #[must_use]
    pub fn position(&self) -> usize {
        match self {
            Self::Resolution(failure) => failure.position,
            Self::Render(error) => error.position,
            Self::Export { position, .. } => *position,
        }
    }
}

/// Outcome of a completed cycle.
#[derive(Debug)]
pub struct CycleReport {
    pub path: PathBuf,
    /// Number of cells in the file.
    pub cells: usize,
    /// Number of meta cells in the file.
    pub diagrams: usize,
    /// Image files written, in diagram order.
    pub exported: Vec<PathBuf>,
    pub failures: Vec<CellFailure>,
    /// Whether the normalized text differs from what was read.
    pub changed: bool,
}

impl CycleReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs read → parse → update → render → serialize → write over one file.
pub struct Cycle {
    syntaxes: SyntaxRegistry,
    marker: String,
    renderer: Option<Arc<dyn Renderer>>,
    settle: Duration,
    check: bool,
    leases: Arc<WriteLeases>,
}

impl Default for Cycle {
    fn default() -> Self {
        Self::new(SyntaxRegistry::new(), DEFAULT_MARKER)
    }
}

impl Cycle {
    #[must_use]
    pub fn new(syntaxes: SyntaxRegistry, marker: impl Into<String>) -> Self {
        Self {
            syntaxes,
            marker: marker.into(),
            renderer: None,
            settle: Duration::ZERO,
            check: false,
            leases: Arc::new(WriteLeases::new()),
        }
    }

    /// Export an SVG image per diagram using `renderer`.
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Pause before and after writing the file back.
    #[must_use]
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Run the pipeline without writing anything; only report whether the
    /// file would change.
    #[must_use]
    pub fn check_only(mut self, check: bool) -> Self {
        self.check = check;
        self
    }

    /// Write leases held by running cycles; a watcher shares them to skip
    /// events caused by the cycles' own writes.
    #[must_use]
    pub fn leases(&self) -> &Arc<WriteLeases> {
        &self.leases
    }

    /// Run one cycle over `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, a directive is malformed,
    /// or the file cannot be written back. Resolution, rendering and image
    /// write failures are reported per cell in [`CycleReport::failures`].
    pub async fn run(&self, path: &Path) -> Result<CycleReport, CycleError> {
        let path = std::path::absolute(path).map_err(|source| CycleError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let _lease = self.leases.acquire(&path).await;

        let original = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| CycleError::Read {
                path: path.clone(),
                source,
            })?;

        let syntax = self.syntaxes.for_path(&path);
        let mut cells = Parser::new(syntax, &self.marker)
            .parse(&original)
            .map_err(|source| CycleError::Parse {
                path: path.clone(),
                source,
            })?;

        let update = Updater::new(&self.marker).update(&mut cells, &path);
        let mut failures: Vec<CellFailure> = update
            .failures
            .into_iter()
            .map(CellFailure::Resolution)
            .collect();

        let mut exported = Vec::new();
        // Image paths are longer than their source, so leases are always taken
        // in increasing path length and two cycles cannot wait on each other.
        let mut image_leases = Vec::new();
        if let Some(renderer) = &self.renderer {
            let (rendered, render_failures) =
                render_all(Arc::clone(renderer), &mut cells).await?;
            failures.extend(render_failures);
            if !self.check {
                for diagram in rendered {
                    let image = export_path(&path, diagram.diagram);
                    image_leases.push(self.leases.acquire(&image).await);
                    match write_image(image, &diagram).await {
                        Ok(image) => exported.push(image),
                        Err(failure) => failures.push(failure),
                    }
                }
            }
        }

        let output = serialize(&cells, syntax);
        let changed = output != original;

        if !self.check {
            tokio::time::sleep(self.settle).await;
            tokio::fs::write(&path, &output)
                .await
                .map_err(|source| CycleError::Write {
                    path: path.clone(),
                    source,
                })?;
            tokio::time::sleep(self.settle).await;
        }
        drop(image_leases);

        tracing::info!(
            path = %path.display(),
            cells = cells.len(),
            diagrams = cells.diagram_count(),
            exported = exported.len(),
            failures = failures.len(),
            changed,
            "Cycle finished"
        );

        Ok(CycleReport {
            path,
            cells: cells.len(),
            diagrams: cells.diagram_count(),
            exported,
            failures,
            changed,
        })
    }
}

/// Render all diagrams on the blocking pool, splitting successes from failures.
async fn render_all(
    renderer: Arc<dyn Renderer>,
    cells: &mut CellSequence,
) -> Result<(Vec<RenderedDiagram>, Vec<CellFailure>), CycleError> {
    let owned = std::mem::take(cells);
    let (owned, results) = tokio::task::spawn_blocking(move || {
        let results = render_cells(renderer.as_ref(), &owned);
        (owned, results)
    })
    .await?;
    *cells = owned;

    let mut rendered = Vec::new();
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(diagram) => rendered.push(diagram),
            Err(error) => failures.push(CellFailure::Render(error)),
        }
    }
    Ok((rendered, failures))
}

async fn write_image(image: PathBuf, diagram: &RenderedDiagram) -> Result<PathBuf, CellFailure> {
    match tokio::fs::write(&image, &diagram.svg).await {
        Ok(()) => {
            tracing::debug!(path = %image.display(), diagram = diagram.diagram, "Wrote image");
            Ok(image)
        }
        Err(source) => {
            tracing::warn!(path = %image.display(), error = %source, "Failed to write image");
            Err(CellFailure::Export {
                position: diagram.position,
                diagram: diagram.diagram,
                path: image,
                source,
            })
        }
    }
}
