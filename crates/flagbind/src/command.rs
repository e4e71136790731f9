//! Shapes shared by command entrypoints: exit codes, standard I/O, the
//! `Command` trait.

use std::fmt;
use std::io::{self, Read, Write};
use std::path::PathBuf;

/// Process exit code of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    Failure = 1,
    InvalidArgs = 2,
}

impl ExitCode {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn is_success(self) -> bool {
        self == ExitCode::Success
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.code())
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        i32::from(code.code())
    }
}

/// Working directory and standard streams of a command.
///
/// Commands write through this instead of the process streams so that they
/// can be driven from tests with in-memory buffers.
pub struct Stdio {
    pub cwd: PathBuf,
    pub stdin: Box<dyn Read>,
    pub stdout: Box<dyn Write>,
    pub stderr: Box<dyn Write>,
}

impl Stdio {
    pub fn new(
        cwd: impl Into<PathBuf>,
        stdin: impl Read + 'static,
        stdout: impl Write + 'static,
        stderr: impl Write + 'static,
    ) -> Self {
        Self {
            cwd: cwd.into(),
            stdin: Box::new(stdin),
            stdout: Box::new(stdout),
            stderr: Box::new(stderr),
        }
    }

    /// The process streams, with the working directory as of this call.
    pub fn current() -> io::Result<Self> {
        let cwd = std::env::current_dir()?;
        Ok(Self::new(cwd, io::stdin(), io::stdout(), io::stderr()))
    }
}

impl fmt::Debug for Stdio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stdio")
            .field("cwd", &self.cwd)
            .finish_non_exhaustive()
    }
}

/// A command entrypoint. `args[0]` is the program name.
pub trait Command {
    fn run(&mut self, args: &[String], stdio: &mut Stdio) -> ExitCode;
}
