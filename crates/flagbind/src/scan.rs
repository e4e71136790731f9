//! Two-phase argument scan.
//!
//! Flags and positional arguments may interleave: every flag-looking token is
//! parsed as a flag, everything else is kept as a positional argument in
//! order. A bare `--` ends the scan and everything after it is positional.

use crate::error::Error;
use crate::flagset::FlagSet;

pub const TERMINATOR: &str = "--";

/// Help names are never implicitly defined; undeclared, they are unknown flags.
const HELP_NAMES: [&str; 2] = ["h", "help"];

/// Whether a token is parsed as a flag.
///
/// `-` alone is positional, and so is anything starting with three dashes.
pub fn looks_like_flag(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-') && !token.starts_with("---")
}

/// Scan `args` (program name already removed) and return the positional arguments.
pub(crate) fn scan(set: &mut FlagSet<'_>, args: &[String]) -> Result<Vec<String>, Error> {
    let mut positionals = Vec::new();
    let mut rest = args.iter();

    while let Some(token) = rest.next() {
        if token == TERMINATOR {
            positionals.extend(rest.by_ref().cloned());
            break;
        }
        if looks_like_flag(token) {
            parse_one(set, token, &mut rest)?;
        } else {
            positionals.push(token.clone());
        }
    }

    tracing::trace!(count = positionals.len(), "positional arguments collected");
    Ok(positionals)
}

fn parse_one<'t>(
    set: &mut FlagSet<'_>,
    token: &str,
    rest: &mut impl Iterator<Item = &'t String>,
) -> Result<(), Error> {
    let body = token
        .strip_prefix("--")
        .or_else(|| token.strip_prefix('-'))
        .unwrap_or(token);
    if body.is_empty() || body.starts_with('=') {
        return Err(Error::BadSyntax(token.to_owned()));
    }

    let (name, inline) = match body.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (body, None),
    };

    let index = match set.lookup(name) {
        Some(index) => index,
        None if HELP_NAMES.contains(&name) => {
            tracing::debug!(flag = name, "help requested but not declared");
            return Err(Error::UndefinedFlag(name.to_owned()));
        }
        None => return Err(Error::UndefinedFlag(name.to_owned())),
    };
    tracing::trace!(alias = name, flag = set.canonical(index), "flag resolved");

    let value = match inline {
        Some(value) => value,
        None if set.is_bool(index) => "true",
        None => match rest.next() {
            Some(next) => next.as_str(),
            None => return Err(Error::MissingValue(name.to_owned())),
        },
    };

    set.set(index, value).map_err(|source| Error::InvalidValue {
        flag: name.to_owned(),
        value: value.to_owned(),
        source,
    })
}
