mod greet;

use flagbind::{Command, ExitCode, Stdio};
use tracing_subscriber::{EnvFilter, fmt};

use crate::greet::Greet;

fn main() -> std::process::ExitCode {
    // Load .env before the subscriber so RUST_LOG may come from it.
    let dotenv = dotenvy::dotenv();
    init_tracing();
    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!("ignoring .env: {err}"),
    }

    let args: Vec<String> = std::env::args().collect();
    let mut stdio = match Stdio::current() {
        Ok(stdio) => stdio,
        Err(err) => {
            eprintln!("greet: failed to read working directory: {err}");
            return ExitCode::Failure.into();
        }
    };

    Greet::default().run(&args, &mut stdio).into()
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
