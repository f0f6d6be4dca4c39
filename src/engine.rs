use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;

/// Binary name used when no engine path is configured.
pub const DEFAULT_BINARY: &str = "spatch";

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("engine binary '{binary}' not found (install coccinelle or set [engine] binary)")]
    NotFound { binary: String },

    #[error("engine exited abnormally: {status}")]
    Failed { status: ExitStatus },

    #[error("failed to stage query program: {0}")]
    Io(#[from] std::io::Error),
}

/// Handle on the external structural-matching engine.
///
/// Every `run` writes the query program to a scoped temp file, spawns
/// `spatch -sp_file <tmp> <files...>`, and buffers stdout. The temp file is
/// removed when the handle to it drops, on success and on every error path.
/// Runs are never cached or retried; failures surface to the caller.
#[derive(Debug, Clone)]
pub struct Engine {
    binary: PathBuf,
    verbose: bool,
}

impl Engine {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            verbose: false,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Run the engine over `files` with the given query program, returning
    /// its raw stdout. Blocks until the child terminates.
    pub fn run(&self, program: &str, files: &[PathBuf]) -> Result<Vec<u8>, EngineError> {
        let mut staged = tempfile::Builder::new()
            .prefix("coccigrep-")
            .suffix(".cocci")
            .tempfile()?;
        staged.write_all(program.as_bytes())?;
        staged.flush()?;

        let mut command = Command::new(&self.binary);
        command.arg("-sp_file").arg(staged.path()).args(files);

        if self.verbose {
            eprintln!("running: {}", render_command(&command));
            command.stderr(Stdio::inherit());
        } else {
            command.stderr(Stdio::null());
        }

        let output = command.output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EngineError::NotFound {
                    binary: self.binary.display().to_string(),
                }
            } else {
                EngineError::Io(e)
            }
        })?;

        if !output.status.success() {
            return Err(EngineError::Failed {
                status: output.status,
            });
        }

        Ok(output.stdout)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(DEFAULT_BINARY)
    }
}

fn render_command(command: &Command) -> String {
    let mut parts = vec![command.get_program().to_string_lossy().into_owned()];
    parts.extend(
        command
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned()),
    );
    parts.join(" ")
}
