//! Match presentation: context windows, output modes, optional highlighting.

pub mod highlight;

pub use highlight::{detect, Emphasize, NoEmphasis, SyntaxEmphasis};

use crate::matches::SourceMatch;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

/// How match context is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// `file:line (label *token): ` prefix per context line.
    Plain,
    /// Header line plus raw context, passed through the emphasis capability.
    Color,
    /// `file|line| (label *token): ` prefix, for editor quickfix lists.
    Editor,
}

impl RenderMode {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "plain" => Some(RenderMode::Plain),
            "color" => Some(RenderMode::Color),
            "editor" => Some(RenderMode::Editor),
            _ => None,
        }
    }
}

/// Target medium for color-mode output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Terminal,
    Html,
    Raw,
}

impl OutputFormat {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "terminal" => Some(OutputFormat::Terminal),
            "html" => Some(OutputFormat::Html),
            "raw" => Some(OutputFormat::Raw),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub mode: RenderMode,
    pub format: OutputFormat,
    /// Context lines before the match line.
    pub before: usize,
    /// Context lines after the match line.
    pub after: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            mode: RenderMode::Plain,
            format: OutputFormat::Terminal,
            before: 0,
            after: 0,
        }
    }
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("cannot read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path}:{line} is past the end of the file ({lines} lines)")]
    LineOutOfRange {
        path: PathBuf,
        line: usize,
        lines: usize,
    },

    #[error("{path}:{line}: column span {start}..{end} is out of range")]
    SpanOutOfRange {
        path: PathBuf,
        line: usize,
        start: usize,
        end: usize,
    },
}

/// Format one match with its context window.
///
/// Reads the source file on every call; the file may have changed since the
/// engine ran, so a stale line or column span surfaces as an error rather
/// than formatting the wrong text. The context window is clamped to the
/// file's bounds.
pub fn render(
    m: &SourceMatch,
    label: &str,
    options: &RenderOptions,
    emphasis: &dyn Emphasize,
) -> Result<String, RenderError> {
    let text = fs::read_to_string(&m.file).map_err(|source| RenderError::FileRead {
        path: m.file.clone(),
        source,
    })?;
    let lines: Vec<&str> = text.lines().collect();

    if m.line == 0 || m.line > lines.len() {
        return Err(RenderError::LineOutOfRange {
            path: m.file.clone(),
            line: m.line,
            lines: lines.len(),
        });
    }
    let index = m.line - 1;

    let token =
        lines[index]
            .get(m.column..m.column_end)
            .ok_or_else(|| RenderError::SpanOutOfRange {
                path: m.file.clone(),
                line: m.line,
                start: m.column,
                end: m.column_end,
            })?;

    let first = index.saturating_sub(options.before);
    let last = (index + options.after).min(lines.len() - 1);
    let file = m.file.display();

    let mut out = String::new();
    match options.mode {
        RenderMode::Color => {
            out.push_str(&format!(
                "{file}: l.{} -{}, l.{} +{}, {label} *{token}\n",
                m.line, options.before, m.line, options.after
            ));
            for line in &lines[first..=last] {
                out.push_str(line);
                out.push('\n');
            }
            return Ok(emphasis.emphasize(&out, token, options.format));
        }
        RenderMode::Plain => {
            for line in &lines[first..=last] {
                out.push_str(&format!("{file}:{} ({label} *{token}): {line}\n", m.line));
            }
        }
        RenderMode::Editor => {
            for line in &lines[first..=last] {
                out.push_str(&format!("{file}|{}| ({label} *{token}): {line}\n", m.line));
            }
        }
    }

    Ok(out)
}
