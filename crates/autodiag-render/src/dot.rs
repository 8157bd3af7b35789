//! Local Graphviz rendering backend.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::consts::DEFAULT_DOT_PROGRAM;
use crate::renderer::{RenderErrorKind, Renderer};

/// Renders diagrams by running `dot -Tsvg` with the source on stdin.
#[derive(Debug, Clone)]
pub struct DotRenderer {
    program: PathBuf,
}

impl DotRenderer {
    /// Create a renderer for the given Graphviz program (e.g. `dot` on `PATH`).
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for DotRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_DOT_PROGRAM)
    }
}

impl Renderer for DotRenderer {
    fn name(&self) -> &str {
        "dot"
    }

    fn render(&self, source: &str) -> Result<Vec<u8>, RenderErrorKind> {
        let mut child = Command::new(&self.program)
            .arg("-Tsvg")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                RenderErrorKind::Io(format!("failed to run {}: {e}", self.program.display()))
            })?;

        // Stdin is dropped at the end of this block so the program sees EOF.
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(source.as_bytes())
                .map_err(|e| RenderErrorKind::Io(e.to_string()))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| RenderErrorKind::Io(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RenderErrorKind::Rejected(stderr.trim().to_owned()));
        }

        std::str::from_utf8(&output.stdout)
            .map_err(|e| RenderErrorKind::InvalidSvg(e.to_string()))?;
        Ok(output.stdout)
    }
}
