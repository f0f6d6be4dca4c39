use crate::render::OutputFormat;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Style, Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;
use syntect::util::as_24_bit_terminal_escaped;

/// Emphasis capability for rendered context blocks.
///
/// One method: colorize `text` as C source with the matched `token` made
/// prominent, in the requested output format. Implementations are picked
/// once at startup with [`detect`]; call sites never branch on availability.
pub trait Emphasize {
    fn emphasize(&self, text: &str, token: &str, format: OutputFormat) -> String;
}

/// Passthrough used when no C syntax definition is available: the rendered
/// block comes back unchanged in every format.
#[derive(Debug, Default)]
pub struct NoEmphasis;

impl Emphasize for NoEmphasis {
    fn emphasize(&self, text: &str, _token: &str, _format: OutputFormat) -> String {
        text.to_string()
    }
}

/// syntect-backed emphasis: C syntax from the bundled definitions, 24-bit
/// terminal escapes or inline-style HTML, with the matched token bolded.
pub struct SyntaxEmphasis {
    syntaxes: SyntaxSet,
    theme: Theme,
}

const THEME_NAME: &str = "base16-ocean.dark";

impl SyntaxEmphasis {
    /// Load the bundled syntax and theme sets. `None` when they lack a C
    /// definition, in which case the caller falls back to [`NoEmphasis`].
    pub fn new() -> Option<Self> {
        let syntaxes = SyntaxSet::load_defaults_newlines();
        syntaxes.find_syntax_by_extension("c")?;

        let mut themes = ThemeSet::load_defaults();
        let theme = match themes.themes.remove(THEME_NAME) {
            Some(theme) => theme,
            None => themes.themes.into_values().next()?,
        };

        Some(Self { syntaxes, theme })
    }

    fn terminal(&self, text: &str, token: &str) -> Option<String> {
        let syntax = self.syntaxes.find_syntax_by_extension("c")?;
        let mut highlighter = HighlightLines::new(syntax, &self.theme);

        let mut out = String::with_capacity(text.len());
        for line in text.lines() {
            let ranges: Vec<(Style, &str)> = highlighter.highlight_line(line, &self.syntaxes).ok()?;
            out.push_str(&as_24_bit_terminal_escaped(&ranges, false));
            out.push('\n');
        }
        // leave the terminal in a sane state after the last colored line
        out.push_str("\x1b[0m");

        Some(embolden(&out, token, "\x1b[1m", "\x1b[22m", ansi_escape_len))
    }

    fn html(&self, text: &str, token: &str) -> Option<String> {
        let syntax = self.syntaxes.find_syntax_by_extension("c")?;
        let html = highlighted_html_for_string(text, &self.syntaxes, syntax, &self.theme).ok()?;

        Some(embolden(&html, token, "<b>", "</b>", html_markup_len))
    }
}

impl Emphasize for SyntaxEmphasis {
    fn emphasize(&self, text: &str, token: &str, format: OutputFormat) -> String {
        let emphasized = match format {
            OutputFormat::Terminal => self.terminal(text, token),
            OutputFormat::Html => self.html(text, token),
            OutputFormat::Raw => None,
        };
        // any highlighting hiccup degrades to the plain block
        emphasized.unwrap_or_else(|| text.to_string())
    }
}

/// Pick the best available emphasis once at startup.
pub fn detect() -> Box<dyn Emphasize> {
    match SyntaxEmphasis::new() {
        Some(syntax) => Box::new(syntax),
        None => Box::new(NoEmphasis),
    }
}

fn is_ident_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

/// Length of the ANSI escape sequence starting at `bytes[at]`, or 0.
fn ansi_escape_len(bytes: &[u8], at: usize) -> usize {
    if bytes[at] != 0x1b {
        return 0;
    }
    match bytes[at..].iter().position(|&b| b == b'm') {
        Some(end) => end + 1,
        None => bytes.len() - at,
    }
}

/// Length of the HTML tag or character entity starting at `bytes[at]`, or 0.
fn html_markup_len(bytes: &[u8], at: usize) -> usize {
    let close = match bytes[at] {
        b'<' => b'>',
        b'&' => b';',
        _ => return 0,
    };
    match bytes[at..].iter().position(|&b| b == close) {
        Some(end) => end + 1,
        None => bytes.len() - at,
    }
}

/// Wrap identifier-boundary occurrences of `token` in `open`/`close`,
/// skipping markup regions so escape sequences and tag attributes are never
/// rewritten.
fn embolden(
    text: &str,
    token: &str,
    open: &str,
    close: &str,
    markup_len: fn(&[u8], usize) -> usize,
) -> String {
    if token.is_empty() {
        return text.to_string();
    }

    let bytes = text.as_bytes();
    let token_bytes = token.as_bytes();
    let mut out = String::with_capacity(text.len());
    // last plain-text byte emitted; markup regions are boundaries
    let mut last_plain: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let skip = markup_len(bytes, i);
        if skip > 0 {
            out.push_str(&text[i..i + skip]);
            i += skip;
            continue;
        }

        let bounded_start = last_plain.map_or(true, |c| !is_ident_char(c));
        let after = i + token_bytes.len();
        if bounded_start
            && bytes[i..].starts_with(token_bytes)
            && (after >= bytes.len() || markup_len(bytes, after) > 0 || !is_ident_char(bytes[after]))
        {
            out.push_str(open);
            out.push_str(token);
            out.push_str(close);
            last_plain = token_bytes.last().copied();
            i = after;
            continue;
        }

        // advance one UTF-8 scalar, not one byte
        let step = text[i..].chars().next().map_or(1, char::len_utf8);
        out.push_str(&text[i..i + step]);
        last_plain = Some(bytes[i + step - 1]);
        i += step;
    }

    out
}
