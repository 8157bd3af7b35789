//! Wiring from `autodiag.toml` settings to engine components.

use std::sync::Arc;

use autodiag_cells::{CommentSyntax, SyntaxRegistry};
use autodiag_config::{Backend, Config, RenderConfig};
use autodiag_render::{DotRenderer, KrokiRenderer, Renderer};

/// Create the rendering backend selected by `[render] backend`.
///
/// The backend is created once per process and shared by every cycle.
#[must_use]
pub fn renderer_from_config(render: &RenderConfig) -> Arc<dyn Renderer> {
    match render.backend {
        Backend::Kroki => {
            tracing::debug!(url = %render.kroki_url, "Using Kroki backend");
            Arc::new(KrokiRenderer::new(&render.kroki_url, render.timeout()))
        }
        Backend::Dot => {
            tracing::debug!(program = %render.dot_program.display(), "Using dot backend");
            Arc::new(DotRenderer::new(&render.dot_program))
        }
    }
}

/// Build the comment syntax registry: built-ins plus `[syntax.<ext>]` overrides.
#[must_use]
pub fn syntax_from_config(config: &Config) -> SyntaxRegistry {
    config
        .syntax
        .iter()
        .fold(SyntaxRegistry::new(), |registry, (extension, syntax)| {
            registry.with_extension(
                extension,
                CommentSyntax {
                    block_open: syntax.block_open.clone(),
                    block_close: syntax.block_close.clone(),
                    line_prefix: syntax.line_prefix.clone(),
                },
            )
        })
}
