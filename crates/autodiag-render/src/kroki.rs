//! Kroki rendering backend.
//!
//! Sends Graphviz source to `{server}/graphviz/svg` as `text/plain` over a
//! pooled HTTP agent.

use std::time::Duration;

use ureq::Agent;

use crate::consts::{DEFAULT_KROKI_URL, DEFAULT_TIMEOUT};
use crate::renderer::{RenderErrorKind, Renderer};

/// Kroki endpoint for Graphviz diagrams.
const GRAPHVIZ_ENDPOINT: &str = "graphviz";

/// Create HTTP agent with the specified timeout.
///
/// HTTP error statuses are returned as responses so their bodies can be
/// reported.
fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// Renders diagrams through a Kroki server.
pub struct KrokiRenderer {
    server_url: String,
    agent: Agent,
}

impl KrokiRenderer {
    /// Create a renderer for the given Kroki server URL (e.g. `"https://kroki.io"`).
    #[must_use]
    pub fn new(server_url: impl Into<String>, timeout: Duration) -> Self {
        let server_url = server_url.into().trim_end_matches('/').to_owned();
        Self {
            server_url,
            agent: create_agent(timeout),
        }
    }

    fn endpoint_url(&self) -> String {
        format!("{}/{GRAPHVIZ_ENDPOINT}/svg", self.server_url)
    }
}

impl Default for KrokiRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_KROKI_URL, DEFAULT_TIMEOUT)
    }
}

impl Renderer for KrokiRenderer {
    fn name(&self) -> &str {
        "kroki"
    }

    fn render(&self, source: &str) -> Result<Vec<u8>, RenderErrorKind> {
        let url = self.endpoint_url();
        let response = self
            .agent
            .post(&url)
            .header("Content-Type", "text/plain")
            .send(source.as_bytes())
            .map_err(|e| RenderErrorKind::Http(e.to_string()))?;

        let status = response.status().as_u16();
        let mut body = response.into_body();

        if status >= 400 {
            let error_body = body
                .read_to_string()
                .unwrap_or_else(|_| String::from("(unable to read error body)"));
            // Kroki answers 400 when the diagram itself is invalid
            return Err(if status == 400 {
                RenderErrorKind::Rejected(error_body.trim().to_owned())
            } else {
                RenderErrorKind::Http(format!("HTTP {status}: {error_body}"))
            });
        }

        let data = body
            .read_to_vec()
            .map_err(|e| RenderErrorKind::Io(e.to_string()))?;
        std::str::from_utf8(&data).map_err(|e| RenderErrorKind::InvalidSvg(e.to_string()))?;
        Ok(data)
    }
}
