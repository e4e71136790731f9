//! Bind command-line flags and environment variables onto struct fields.
//!
//! A target struct declares its flags with `#[derive(Flags)]`:
//!
//! ```
//! use flagbind::{Flags, Validate, BoxError};
//!
//! #[derive(Debug, Default, Flags)]
//! #[flags(validate, args)]
//! struct Cmd {
//!     #[flag("h,help")]
//!     help: bool,
//!     #[flag("n,name")]
//!     #[env("NAME")]
//!     name: String,
//!     #[flag("t,tag")]
//!     tags: Vec<String>,
//!     args: Vec<String>,
//! }
//!
//! impl Validate for Cmd {
//!     fn validate(&self) -> Result<(), BoxError> {
//!         if self.name.is_empty() && !self.help {
//!             return Err("a name is required".into());
//!         }
//!         Ok(())
//!     }
//! }
//!
//! impl flagbind::SetArgs for Cmd {
//!     fn set_args(&mut self, args: Vec<String>) {
//!         self.args = args;
//!     }
//! }
//!
//! let mut cmd = Cmd::default();
//! flagbind::parse(&["cmd", "-n", "ada", "-t", "x", "rest", "--tag=y"], &mut cmd).unwrap();
//! assert_eq!(cmd.name, "ada");
//! assert_eq!(cmd.tags, ["x", "y"]);
//! assert_eq!(cmd.args, ["rest"]);
//! ```
//!
//! The first alias of a field is its canonical name: explicitly set flags and
//! occurrence counts are reported under it. Parsing never prints anything;
//! help text and error reporting belong to the caller.

extern crate self as flagbind;

mod command;
mod env;
mod error;
mod flagset;
mod parser;
mod registry;
mod scan;
#[cfg(unix)]
mod signal;
mod target;
mod value;

pub use command::{Command, ExitCode, Stdio};
pub use env::{EnvSource, NO_PREFIX, ProcessEnv, prefix_from_program};
pub use error::{BoxError, Error};
pub use parser::{Parser, parse};
pub use registry::{FieldMeta, Registry, split_aliases};
pub use scan::{TERMINATOR, looks_like_flag};
#[cfg(unix)]
pub use signal::{SignalKind, cancel_on_signal};
pub use target::{Flags, SetArgs, SetFlags, SetFlagsCount, Validate};
pub use value::{FlagValue, Kind, TextCodec, ValueError, parse_duration};

/// Derive [`Flags`] from `#[flag("..")]` and `#[env("..")]` field attributes.
pub use flagbind_macros::Flags;
