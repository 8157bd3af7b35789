//! Diagram rendering for autodiag.
//!
//! Rendering backends are opaque: they take Graphviz source and return image
//! bytes. A backend is created once per process and shared by every cycle.
//!
//! - [`Renderer`]: backend trait
//! - [`KrokiRenderer`]: HTTP rendering via a Kroki server
//! - [`DotRenderer`]: local rendering via the Graphviz `dot` program
//! - [`render_cells`]: renders every resolved meta cell of a sequence
//! - [`export_path`]: sibling image path for a diagram

mod consts;
mod dot;
mod export;
mod graphviz;
mod kroki;
mod renderer;

pub use consts::{DEFAULT_DOT_PROGRAM, DEFAULT_KROKI_URL, DEFAULT_TIMEOUT};
pub use dot::DotRenderer;
pub use export::{RenderedDiagram, export_path, render_cells};
pub use graphviz::prepare_source;
pub use kroki::KrokiRenderer;
pub use renderer::{RenderError, RenderErrorKind, Renderer};
