//! Graphviz source preparation.

/// Keywords that open a complete Graphviz graph.
const GRAPH_KEYWORDS: &[&str] = &["graph", "digraph", "strict"];

/// Turn a directive body into a complete Graphviz graph.
///
/// Bodies that already start with a graph keyword are returned unchanged.
/// Anything else (e.g. a bare edge list like `a->b`) is wrapped in an
/// anonymous `digraph`.
#[must_use]
pub fn prepare_source(body: &str) -> String {
    let first_word = body
        .trim_start()
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .next()
        .unwrap_or_default();

    if GRAPH_KEYWORDS
        .iter()
        .any(|keyword| first_word.eq_ignore_ascii_case(keyword))
    {
        body.to_owned()
    } else {
        format!("digraph {{\n{body}\n}}")
    }
}
