use anyhow::Result;
use clap::{Parser, ValueEnum};
use coccigrep::{
    Config, Engine, Operation, OutputFormat, Query, RenderMode, RenderOptions, Search,
    DEFAULT_BINARY,
};
use colored::Colorize;
use std::path::PathBuf;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "coccigrep")]
#[command(about = "Semantic grep for C source code", long_about = None)]
#[command(version)]
struct Cli {
    /// C type the search is anchored on
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    type_name: String,

    /// Attribute (struct field) the operation applies to
    #[arg(short, long, default_value = "", hide_default_value = true)]
    attribute: String,

    /// Usage pattern to search for: used, deref, set or test
    #[arg(short, long, default_value = "used")]
    operation: String,

    /// Context lines before each match
    #[arg(short = 'B', long, value_name = "N")]
    before: Option<usize>,

    /// Context lines after each match
    #[arg(short = 'A', long, value_name = "N")]
    after: Option<usize>,

    /// Output mode
    #[arg(short, long, value_enum)]
    mode: Option<ModeArg>,

    /// Output format used by color mode
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// Print matches as JSON instead of rendered text
    #[arg(long)]
    json: bool,

    /// Path to the spatch binary
    #[arg(long, value_name = "PATH")]
    engine: Option<PathBuf>,

    /// Print the engine command line and pass its stderr through
    #[arg(short, long)]
    verbose: bool,

    /// C files or directories to search
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Plain,
    Color,
    Editor,
}

impl From<ModeArg> for RenderMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Plain => RenderMode::Plain,
            ModeArg::Color => RenderMode::Color,
            ModeArg::Editor => RenderMode::Editor,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Terminal,
    Html,
    Raw,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Terminal => OutputFormat::Terminal,
            FormatArg::Html => OutputFormat::Html,
            FormatArg::Raw => OutputFormat::Raw,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    let operation: Operation = cli.operation.parse()?;
    let query = Query::new(operation, &cli.type_name, &cli.attribute)?;

    let binary = cli
        .engine
        .clone()
        .or_else(|| config.engine.binary.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_BINARY));
    let engine = Engine::new(binary).verbose(cli.verbose);

    let files = collect_files(&cli.files)?;
    let search = Search::new(query, engine);
    let matches = search.run(&files)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(matches.as_slice())?);
        return Ok(());
    }

    if matches.is_empty() {
        eprintln!("{}", "no matches".dimmed());
        return Ok(());
    }

    let options = RenderOptions {
        mode: resolve_mode(cli.mode, &config),
        format: resolve_format(cli.format, &config),
        before: cli.before.or(config.display.before).unwrap_or(0),
        after: cli.after.or(config.display.after).unwrap_or(0),
    };
    let emphasis = coccigrep::render::detect();

    print!("{}", search.display(&matches, &options, emphasis.as_ref())?);
    Ok(())
}

/// Expand directory operands into the .c/.h files beneath them.
fn collect_files(operands: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for operand in operands {
        if operand.is_dir() {
            for entry in WalkDir::new(operand) {
                let entry = entry?;
                let extension = entry.path().extension().and_then(|s| s.to_str());
                if entry.file_type().is_file() && matches!(extension, Some("c" | "h")) {
                    files.push(entry.path().to_path_buf());
                }
            }
        } else {
            files.push(operand.clone());
        }
    }

    files.sort();

    if files.is_empty() {
        anyhow::bail!("no C files to search under the given paths");
    }

    Ok(files)
}

/// CLI flag wins, then the config file, then the built-in default.
fn resolve_mode(flag: Option<ModeArg>, config: &Config) -> RenderMode {
    if let Some(mode) = flag {
        return mode.into();
    }
    if let Some(name) = config.display.mode.as_deref() {
        match RenderMode::parse(name) {
            Some(mode) => return mode,
            None => eprintln!(
                "{}",
                format!("Warning: unknown mode '{name}' in config, using plain").yellow()
            ),
        }
    }
    RenderMode::Plain
}

fn resolve_format(flag: Option<FormatArg>, config: &Config) -> OutputFormat {
    if let Some(format) = flag {
        return format.into();
    }
    if let Some(name) = config.display.format.as_deref() {
        match OutputFormat::parse(name) {
            Some(format) => return format,
            None => eprintln!(
                "{}",
                format!("Warning: unknown format '{name}' in config, using terminal").yellow()
            ),
        }
    }
    OutputFormat::Terminal
}
