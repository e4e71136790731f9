//! Environment variable pre-pass.
//!
//! Runs before any flag is read, so command-line values always win.

use std::collections::HashMap;

use crate::error::Error;
use crate::registry::Binding;

/// Prefix override that disables prefixing altogether.
pub const NO_PREFIX: &str = "-";

/// Where environment values are looked up.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// The current process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for [(String, String)] {
    fn get(&self, key: &str) -> Option<String> {
        self.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }
}

impl<const N: usize> EnvSource for [(&str, &str); N] {
    fn get(&self, key: &str) -> Option<String> {
        self.iter().find(|(k, _)| *k == key).map(|(_, v)| (*v).to_owned())
    }
}

impl EnvSource for Vec<(String, String)> {
    fn get(&self, key: &str) -> Option<String> {
        EnvSource::get(self.as_slice(), key)
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl<E: EnvSource + ?Sized> EnvSource for &E {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

/// Derive a prefix from the program path: `/usr/bin/my-tool.exe` gives `MY_TOOL_`.
pub fn prefix_from_program(program: &str) -> String {
    let base = program
        .rsplit(['/', std::path::MAIN_SEPARATOR])
        .next()
        .unwrap_or(program);
    let stem = match base.rfind('.') {
        Some(dot) => &base[..dot],
        None => base,
    };
    format!("{}_", stem.replace('-', "_").to_uppercase())
}

pub(crate) fn resolve_prefix(explicit: Option<&str>, program: Option<&str>) -> String {
    match explicit {
        Some(NO_PREFIX) => String::new(),
        Some(prefix) if !prefix.is_empty() => prefix.to_owned(),
        _ => program.map(prefix_from_program).unwrap_or_default(),
    }
}

pub(crate) fn apply<E: EnvSource + ?Sized>(
    prefix: &str,
    bindings: &mut [Binding<'_>],
    env: &E,
) -> Result<(), Error> {
    for binding in bindings.iter_mut() {
        let Some(suffix) = binding.meta.env_var() else {
            continue;
        };
        let var = format!("{prefix}{suffix}");
        let Some(value) = env.get(&var) else {
            continue;
        };
        // An empty variable counts as unset.
        if value.is_empty() {
            continue;
        }

        if let Err(source) = binding.acceptor.set_from_env(&value) {
            return Err(Error::InvalidEnv {
                var,
                field: binding.meta.name().to_owned(),
                value,
                source,
            });
        }
        tracing::debug!(%var, field = binding.meta.name(), "field set from environment");
    }
    Ok(())
}
