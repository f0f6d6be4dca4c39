use serde::Serialize;
use std::path::PathBuf;

/// One engine-reported occurrence: a column span on a source line.
///
/// Lines are 1-indexed, columns 0-indexed, exactly as the engine emits them.
/// Records are built by the stream parser and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceMatch {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
    pub line_end: usize,
    pub column_end: usize,
}

impl SourceMatch {
    /// Parse one `file:line:column:line_end:column_end` stream line.
    ///
    /// Anything else - blank lines, engine chatter, short or non-numeric
    /// fields - yields `None` and is dropped by the caller.
    fn parse(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split(':').collect();
        let &[file, line, column, line_end, column_end] = fields.as_slice() else {
            return None;
        };
        Some(Self {
            file: PathBuf::from(file),
            line: line.parse().ok()?,
            column: column.parse().ok()?,
            line_end: line_end.parse().ok()?,
            column_end: column_end.parse().ok()?,
        })
    }
}

/// Ordered matches with same-line duplicates collapsed.
///
/// The engine emits one line per column span, so a source line with several
/// hits shows up as consecutive stream lines; only the first is kept. The
/// check compares against the last accepted record only - a repeat of an
/// earlier (file, line) pair after an intervening different line is retained.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MatchSet {
    matches: Vec<SourceMatch>,
}

impl MatchSet {
    /// Parse the engine's raw stdout into a deduplicated match list.
    ///
    /// Consumes the whole buffered stream; a fresh engine run needs a fresh
    /// parse.
    pub fn from_stream(raw: &[u8]) -> Self {
        let text = String::from_utf8_lossy(raw);
        let mut matches: Vec<SourceMatch> = Vec::new();

        for line in text.lines() {
            let Some(m) = SourceMatch::parse(line) else {
                continue;
            };
            if let Some(prev) = matches.last() {
                if prev.file == m.file && prev.line == m.line {
                    continue;
                }
            }
            matches.push(m);
        }

        Self { matches }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SourceMatch> {
        self.matches.iter()
    }

    pub fn as_slice(&self) -> &[SourceMatch] {
        &self.matches
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

impl<'a> IntoIterator for &'a MatchSet {
    type Item = &'a SourceMatch;
    type IntoIter = std::slice::Iter<'a, SourceMatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
