use crate::engine::{Engine, EngineError};
use crate::matches::MatchSet;
use crate::query::Query;
use crate::render::{self, Emphasize, RenderError, RenderOptions};
use std::path::PathBuf;

/// One structural search from query to rendered output.
///
/// Owns nothing shared: each search stages its own query program and holds
/// its own match set, so independent searches never interfere.
#[derive(Debug, Clone)]
pub struct Search {
    query: Query,
    engine: Engine,
}

impl Search {
    pub fn new(query: Query, engine: Engine) -> Self {
        Self { query, engine }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Build the query program, run the engine over `files`, and parse its
    /// output into a deduplicated match set.
    pub fn run(&self, files: &[PathBuf]) -> Result<MatchSet, EngineError> {
        let program = self.query.program();
        let raw = self.engine.run(&program, files)?;
        Ok(MatchSet::from_stream(&raw))
    }

    /// Render every match in `matches`, concatenated in order.
    ///
    /// Fails on the first unrenderable match; there is no partial output.
    pub fn display(
        &self,
        matches: &MatchSet,
        options: &RenderOptions,
        emphasis: &dyn Emphasize,
    ) -> Result<String, RenderError> {
        let label = self.query.operation().label();
        let mut out = String::new();
        for m in matches {
            out.push_str(&render::render(m, label, options, emphasis)?);
        }
        Ok(out)
    }
}
