//! Cell model for source files with embedded diagram directives.
//!
//! A source file is split into an ordered sequence of cells. Plain cells carry
//! ordinary host text and are passed through untouched; meta cells carry a
//! diagram directive and are always written back as a block comment.
//!
//! # Architecture
//!
//! - [`syntax`]: Host comment delimiters, selected per file extension
//! - [`parser`]: Explicit-state scanner producing a [`CellSequence`]
//! - [`updater`]: Canonicalizes directives and resolves `!include` lines
//! - [`serializer`]: Reassembles cells into normalized text
//!
//! # Example
//!
//! ```
//! use autodiag_cells::{CommentSyntax, Parser, serialize};
//!
//! let syntax = CommentSyntax::c_like();
//! let cells = Parser::new(&syntax, "DIAG").parse("before /*DIAG a->b*/ after").unwrap();
//! assert_eq!(cells.len(), 3);
//! assert_eq!(serialize(&cells, &syntax), "before /*DIAG a->b*/ after");
//! ```

mod cell;
mod error;
mod includes;
mod parser;
mod serializer;
mod syntax;
mod updater;

pub use cell::{Cell, CellKind, CellSequence};
pub use error::{ParseError, ParseErrorKind, ResolutionError};
pub use parser::Parser;
pub use serializer::serialize;
pub use syntax::{CommentSyntax, SyntaxRegistry};
pub use updater::{DEFAULT_MARKER, ResolutionFailure, UpdateReport, Updater};
