use crate::value::ValueError;
use thiserror::Error;

/// Error returned by a target's validation hook.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A recoverable parse failure.
///
/// Mistakes in the binding table itself (such as an alias declared twice) are
/// not reported here: they are programming errors and panic at bind time.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("flag provided but not defined: -{0}")]
    UndefinedFlag(String),

    #[error("bad flag syntax: {0}")]
    BadSyntax(String),

    #[error("flag needs an argument: -{0}")]
    MissingValue(String),

    #[error("invalid value {value:?} for flag -{flag}: {source}")]
    InvalidValue {
        flag: String,
        value: String,
        source: ValueError,
    },

    #[error("invalid value {value:?} for environment variable {var} (field {field}): {source}")]
    InvalidEnv {
        var: String,
        field: String,
        value: String,
        source: ValueError,
    },

    /// The target's own validation failed; its message is passed through as is.
    #[error(transparent)]
    Validation(BoxError),
}
