//! The binding engine: environment, flags, delivery, validation.

use crate::env::{self, EnvSource, ProcessEnv};
use crate::error::Error;
use crate::flagset::{FlagSet, Report};
use crate::registry::Registry;
use crate::scan;
use crate::target::Flags;

/// Parser configuration.
///
/// The default parser reads flags only. Environment variables are opt-in:
///
/// ```
/// use flagbind::{Flags, Parser};
///
/// #[derive(Default, Flags)]
/// struct Serve {
///     #[flag("addr")]
///     #[env("ADDR")]
///     addr: String,
/// }
///
/// let mut cmd = Serve::default();
/// Parser::new()
///     .env_vars(true)
///     .parse_with_env(&["serve", "--addr", ":9000"], &mut cmd, &[("SERVE_ADDR", ":8080")])
///     .unwrap();
/// assert_eq!(cmd.addr, ":9000");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parser {
    env_vars: bool,
    env_prefix: Option<String>,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `#[env]`-annotated fields from the environment before parsing flags.
    pub fn env_vars(mut self, enabled: bool) -> Self {
        self.env_vars = enabled;
        self
    }

    /// Prefix prepended to every environment variable name.
    ///
    /// When unset or empty, the prefix is derived from the program name in
    /// `args[0]`. [`NO_PREFIX`](crate::NO_PREFIX) disables prefixing.
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Parse `args` into `target`, reading the process environment if enabled.
    ///
    /// `args[0]` is the program name. It is never parsed as a flag.
    pub fn parse<S, T>(&self, args: &[S], target: &mut T) -> Result<(), Error>
    where
        S: AsRef<str>,
        T: Flags + ?Sized,
    {
        self.parse_with_env(args, target, &ProcessEnv)
    }

    /// Like [`parse`](Self::parse), looking environment variables up in `env`.
    pub fn parse_with_env<S, T, E>(&self, args: &[S], target: &mut T, env: &E) -> Result<(), Error>
    where
        S: AsRef<str>,
        T: Flags + ?Sized,
        E: EnvSource + ?Sized,
    {
        let args: Vec<String> = args.iter().map(|arg| arg.as_ref().to_owned()).collect();
        let count = target.as_set_flags_count().is_some();

        let report = {
            let mut registry = Registry::new();
            target.register(&mut registry);
            let mut bindings = registry.into_bindings();

            if self.env_vars {
                let prefix = env::resolve_prefix(
                    self.env_prefix.as_deref(),
                    args.first().map(String::as_str),
                );
                tracing::debug!(%prefix, "reading environment variables");
                env::apply(&prefix, &mut bindings, env)?;
            }

            match args.split_first() {
                Some((_, rest)) => {
                    let mut set = FlagSet::bind(bindings, count);
                    let positionals = scan::scan(&mut set, rest)?;
                    Some(set.finish(positionals))
                }
                None => None,
            }
        };

        if let Some(report) = report {
            deliver(target, report);
        }

        if let Some(validator) = target.as_validate() {
            validator.validate().map_err(Error::Validation)?;
        }
        Ok(())
    }
}

fn deliver<T: Flags + ?Sized>(target: &mut T, report: Report) {
    tracing::debug!(
        args = report.args.len(),
        flags = ?report.flags,
        counts = ?report.counts,
        "parse results"
    );

    if let Some(sink) = target.as_set_args() {
        sink.set_args(report.args);
    }
    if let Some(sink) = target.as_set_flags() {
        sink.set_flags(report.flags);
    }
    if let Some(sink) = target.as_set_flags_count() {
        sink.set_flags_count(report.counts);
    }
}

/// Parse `args` into `target` with a default [`Parser`] (flags only).
pub fn parse<S, T>(args: &[S], target: &mut T) -> Result<(), Error>
where
    S: AsRef<str>,
    T: Flags + ?Sized,
{
    Parser::new().parse(args, target)
}
