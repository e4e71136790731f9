//! The contract between the engine and a target type.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::BoxError;
use crate::registry::Registry;

/// A type whose fields can be bound to flags and environment variables.
///
/// Usually derived with `#[derive(Flags)]`. The optional capabilities are
/// exposed through the `as_*` accessors, each independently; the derive
/// generates them from `#[flags(validate, args, set_flags, flags_count)]`.
pub trait Flags {
    /// Register every annotated field with the binding table.
    fn register<'a>(&'a mut self, registry: &mut Registry<'a>);

    fn as_validate(&self) -> Option<&dyn Validate> {
        None
    }

    fn as_set_args(&mut self) -> Option<&mut dyn SetArgs> {
        None
    }

    fn as_set_flags(&mut self) -> Option<&mut dyn SetFlags> {
        None
    }

    fn as_set_flags_count(&mut self) -> Option<&mut dyn SetFlagsCount> {
        None
    }
}

/// Post-parse validation. Its error becomes the result of the parse.
pub trait Validate {
    fn validate(&self) -> Result<(), BoxError>;
}

/// Receives the positional arguments, in command-line order.
pub trait SetArgs {
    fn set_args(&mut self, args: Vec<String>);
}

/// Receives the canonical names of the flags explicitly set on the command line.
pub trait SetFlags {
    fn set_flags(&mut self, flags: BTreeSet<String>);
}

/// Receives how many times each canonical flag was set on the command line,
/// or `None` when no flag was set at all.
pub trait SetFlagsCount {
    fn set_flags_count(&mut self, counts: Option<BTreeMap<String, usize>>);
}
