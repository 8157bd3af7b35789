//! Host comment syntax.
//!
//! Meta cells are written back inside the block-comment delimiters of the
//! host file. The delimiters are chosen from the file extension, with
//! C-like comments as the fallback.

use std::collections::HashMap;
use std::path::Path;

/// Extensions that use markup comments (`<!-- -->`).
const MARKUP_EXTENSIONS: &[&str] = &["md", "markdown", "html", "htm", "xml", "svg", "vue"];

/// Comment delimiters of a host language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentSyntax {
    /// Block comment opener (e.g. `/*`).
    pub block_open: String,
    /// Block comment terminator (e.g. `*/`).
    pub block_close: String,
    /// Line comment prefix (e.g. `//`), if the host has one.
    pub line_prefix: Option<String>,
}

impl CommentSyntax {
    /// `/* ... */` block comments with `//` line comments.
    #[must_use]
    pub fn c_like() -> Self {
        Self {
            block_open: "/*".to_owned(),
            block_close: "*/".to_owned(),
            line_prefix: Some("//".to_owned()),
        }
    }

    /// `<!-- ... -->` block comments, no line comments.
    #[must_use]
    pub fn markup() -> Self {
        Self {
            block_open: "<!--".to_owned(),
            block_close: "-->".to_owned(),
            line_prefix: None,
        }
    }

    /// Wrap directive text as a block comment.
    ///
    /// When the text ends with part of the terminator (`a]` before `]]`), a
    /// space is inserted so the first terminator found on re-reading is the
    /// one written here.
    #[must_use]
    pub fn wrap(&self, content: &str) -> String {
        let mut out = String::with_capacity(
            self.block_open.len() + content.len() + self.block_close.len() + 1,
        );
        out.push_str(&self.block_open);
        out.push_str(content);
        if !self.closes_at_end(content) {
            out.push(' ');
        }
        out.push_str(&self.block_close);
        out
    }

    /// Whether appending the terminator to `content` ends the comment exactly there.
    fn closes_at_end(&self, content: &str) -> bool {
        let joined = format!("{content}{}", self.block_close);
        joined.find(self.block_close.as_str()) == Some(content.len())
    }
}

impl Default for CommentSyntax {
    fn default() -> Self {
        Self::c_like()
    }
}

/// Maps file extensions to comment syntax.
#[derive(Debug, Clone)]
pub struct SyntaxRegistry {
    by_extension: HashMap<String, CommentSyntax>,
    fallback: CommentSyntax,
}

impl SyntaxRegistry {
    /// Registry with the built-in markup extensions and a C-like fallback.
    #[must_use]
    pub fn new() -> Self {
        let by_extension = MARKUP_EXTENSIONS
            .iter()
            .map(|ext| ((*ext).to_owned(), CommentSyntax::markup()))
            .collect();
        Self {
            by_extension,
            fallback: CommentSyntax::c_like(),
        }
    }

    /// Register syntax for an extension (without the leading dot), replacing any built-in.
    #[must_use]
    pub fn with_extension(mut self, extension: &str, syntax: CommentSyntax) -> Self {
        self.by_extension
            .insert(extension.trim_start_matches('.').to_ascii_lowercase(), syntax);
        self
    }

    /// Comment syntax for a file path.
    #[must_use]
    pub fn for_path(&self, path: &Path) -> &CommentSyntax {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.by_extension.get(&ext.to_ascii_lowercase()))
            .unwrap_or(&self.fallback)
    }
}

impl Default for SyntaxRegistry {
    fn default() -> Self {
        Self::new()
    }
}
