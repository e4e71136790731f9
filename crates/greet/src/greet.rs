use std::collections::BTreeSet;
use std::fmt;
use std::io::Write;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use flagbind::{
    BoxError, Command, ExitCode, Flags, Parser, SetArgs, SetFlags, Stdio, TextCodec, Validate,
};
use tokio_util::sync::CancellationToken;

const USAGE: &str = "\
Usage: greet [OPTIONS] [NAME]...

Print a greeting for every name.

Options:
  -n, --name <NAME>      name to greet [env: GREET_NAME]
  -l, --loud             shout the greeting (same as --format shout)
  -r, --repeat <N>       print each greeting N times [env: GREET_REPEAT] [default: 1]
  -d, --delay <DURATION> wait before greeting, e.g. 1.5s or 1m30s
  -t, --tag <TAG>        append a tag (repeatable)
  -f, --format <FORMAT>  plain or shout [default: plain]
  -h, --help             print this help
  -v, --version          print the version

Environment variables are also read from a .env file in the working directory.
";

/// How a greeting is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Plain,
    Shout,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::Plain => "plain",
            Format::Shout => "shout",
        })
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(Format::Plain),
            "shout" => Ok(Format::Shout),
            other => Err(format!("unknown format {other:?}, expected plain or shout")),
        }
    }
}

impl TextCodec for Format {}

#[derive(Debug, Flags)]
#[flags(validate, args, set_flags)]
pub struct Greet {
    #[flag("n,name")]
    #[env("NAME")]
    name: String,
    #[flag("l,loud")]
    loud: bool,
    #[flag("r,repeat")]
    #[env("REPEAT")]
    repeat: u32,
    #[flag("d,delay")]
    delay: Duration,
    #[flag("t,tag")]
    tags: Vec<String>,
    #[flag("f,format")]
    format: Format,
    #[flag("h,help")]
    help: bool,
    #[flag("v,version")]
    version: bool,

    extra: Vec<String>,
    explicit: BTreeSet<String>,
}

impl Default for Greet {
    fn default() -> Self {
        Self {
            name: String::new(),
            loud: false,
            repeat: 1,
            delay: Duration::ZERO,
            tags: Vec::new(),
            format: Format::Plain,
            help: false,
            version: false,
            extra: Vec::new(),
            explicit: BTreeSet::new(),
        }
    }
}

impl Validate for Greet {
    fn validate(&self) -> Result<(), BoxError> {
        if self.help || self.version {
            return Ok(());
        }
        if self.name.is_empty() && self.extra.is_empty() {
            return Err("a name is required: pass -n NAME, a positional NAME, or set GREET_NAME".into());
        }
        if self.repeat == 0 {
            return Err("--repeat must be at least 1".into());
        }
        if self.loud && self.explicit.contains("f") && self.format == Format::Plain {
            return Err("--loud conflicts with --format plain".into());
        }
        Ok(())
    }
}

impl SetArgs for Greet {
    fn set_args(&mut self, args: Vec<String>) {
        self.extra = args;
    }
}

impl SetFlags for Greet {
    fn set_flags(&mut self, flags: BTreeSet<String>) {
        self.explicit = flags;
    }
}

impl Command for Greet {
    fn run(&mut self, args: &[String], stdio: &mut Stdio) -> ExitCode {
        if let Err(err) = Parser::new().env_vars(true).parse(args, self) {
            let _ = writeln!(stdio.stderr, "greet: {err}");
            let _ = writeln!(stdio.stderr, "Try 'greet --help' for more information.");
            return ExitCode::InvalidArgs;
        }
        tracing::debug!(flags = ?self.explicit, "arguments parsed");

        match self.execute(stdio) {
            Ok(code) => code,
            Err(err) => {
                let _ = writeln!(stdio.stderr, "greet: {err:#}");
                ExitCode::Failure
            }
        }
    }
}

impl Greet {
    fn execute(&self, stdio: &mut Stdio) -> Result<ExitCode> {
        if self.help {
            stdio.stdout.write_all(USAGE.as_bytes())?;
            return Ok(ExitCode::Success);
        }
        if self.version {
            writeln!(stdio.stdout, "greet {}", env!("CARGO_PKG_VERSION"))?;
            return Ok(ExitCode::Success);
        }

        if !self.delay.is_zero() && !self.wait(stdio)? {
            writeln!(stdio.stderr, "greet: interrupted")?;
            return Ok(ExitCode::Failure);
        }

        for name in self.names() {
            let line = self.greeting(name);
            for _ in 0..self.repeat {
                writeln!(stdio.stdout, "{line}").context("failed to write greeting")?;
            }
        }
        stdio.stdout.flush()?;
        Ok(ExitCode::Success)
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str())
            .filter(|name| !name.is_empty())
            .chain(self.extra.iter().map(String::as_str))
    }

    fn greeting(&self, name: &str) -> String {
        let mut line = format!("Hello, {name}!");
        if self.loud || self.format == Format::Shout {
            line = line.to_uppercase();
        }
        if !self.tags.is_empty() {
            line.push_str(&format!(" [{}]", self.tags.join(", ")));
        }
        line
    }

    /// Wait for the delay. Returns `false` if a termination signal cut it short.
    fn wait(&self, stdio: &mut Stdio) -> Result<bool> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to start runtime")?;
        runtime.block_on(self.sleep_or_cancel(stdio))
    }

    async fn sleep_or_cancel(&self, stdio: &mut Stdio) -> Result<bool> {
        let cancel = cancellation(&CancellationToken::new())?;
        writeln!(stdio.stderr, "waiting {:?} before greeting", self.delay)?;
        stdio.stderr.flush()?;

        tokio::select! {
            _ = tokio::time::sleep(self.delay) => Ok(true),
            _ = cancel.cancelled() => {
                tracing::debug!("delay cancelled");
                Ok(false)
            }
        }
    }
}

#[cfg(unix)]
fn cancellation(token: &CancellationToken) -> Result<CancellationToken> {
    use flagbind::{SignalKind, cancel_on_signal};

    cancel_on_signal(token, &[SignalKind::interrupt(), SignalKind::terminate()])
        .context("failed to listen for signals")
}

#[cfg(not(unix))]
fn cancellation(token: &CancellationToken) -> Result<CancellationToken> {
    Ok(token.clone())
}
