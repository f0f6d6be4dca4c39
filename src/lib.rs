//! Coccigrep: semantic grep for C source code.
//!
//! Plain grep finds text; coccigrep finds *usage*. Given a C type and one of
//! its attributes, it asks Coccinelle's structural-matching engine where that
//! attribute is used, dereferenced, assigned, or tested, then renders the
//! hits with context.
//!
//! # Architecture
//!
//! The pipeline is a straight line: [`Query`] builds an SmPL program,
//! [`Engine`] runs `spatch` over the target files with that program staged
//! in a temp file, [`MatchSet`] parses the engine's
//! `file:line:column:line_end:column_end` stream, and [`render`] formats
//! each match with its context window. [`Search`] ties the stages together.
//!
//! The engine and the syntax highlighter are both treated as replaceable
//! boundaries: the engine is a child process, and highlighting is an
//! [`Emphasize`] capability that degrades to plain text when no C syntax
//! definition is available.
//!
//! # Example
//!
//! ```no_run
//! use coccigrep::{Engine, Operation, Query, Search};
//! use std::path::PathBuf;
//!
//! let query = Query::new(Operation::Set, "Packet", "flags")?;
//! let search = Search::new(query, Engine::default());
//! let matches = search.run(&[PathBuf::from("src/decode.c")])?;
//!
//! for m in &matches {
//!     println!("{}:{}", m.file.display(), m.line);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod engine;
pub mod matches;
pub mod query;
pub mod render;
pub mod session;

// Re-exports
pub use config::{Config, ConfigError};
pub use engine::{Engine, EngineError, DEFAULT_BINARY};
pub use matches::{MatchSet, SourceMatch};
pub use query::{Operation, Query, QueryError};
pub use render::{
    render, Emphasize, NoEmphasis, OutputFormat, RenderError, RenderMode, RenderOptions,
    SyntaxEmphasis,
};
pub use session::Search;
