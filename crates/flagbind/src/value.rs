//! Type coercion table.
//!
//! Every bindable field type implements [`FlagValue`], which turns one textual
//! argument into a typed value. The strategy is a property of the type alone,
//! so it is fixed once a field is registered.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Coercion strategy of a bindable type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    String,
    Signed,
    Unsigned,
    Float,
    Duration,
    /// A user type parsed through [`TextCodec`].
    Text,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::String => "string",
            Self::Signed => "int",
            Self::Unsigned => "uint",
            Self::Float => "float",
            Self::Duration => "duration",
            Self::Text => "text",
        };
        f.write_str(name)
    }
}

/// Reason a textual value could not be coerced into a field's type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValueError(String);

impl ValueError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }

    fn syntax() -> Self {
        Self::new("invalid syntax")
    }

    fn out_of_range() -> Self {
        Self::new("value out of range")
    }
}

/// A type that can be set from a command-line or environment value.
pub trait FlagValue: Sized {
    /// Coercion strategy; boolean kinds never consume a separate argument.
    const KIND: Kind;

    /// Parse one textual value into a fresh, owned value.
    fn parse_value(raw: &str) -> Result<Self, ValueError>;

    /// Render the value as text (used for diagnostics).
    fn render(&self) -> String;
}

/// Marker for user types that both render themselves as text and parse
/// themselves from text.
///
/// Implementing it is enough to make a type bindable, either as a scalar or
/// as the element of a repeatable field:
///
/// ```
/// use std::{fmt, str::FromStr};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Level(u8);
///
/// impl fmt::Display for Level {
///     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         write!(f, "L{}", self.0)
///     }
/// }
///
/// impl FromStr for Level {
///     type Err = String;
///
///     fn from_str(s: &str) -> Result<Self, Self::Err> {
///         s.strip_prefix('L')
///             .and_then(|n| n.parse().ok())
///             .map(Level)
///             .ok_or_else(|| format!("bad level {s:?}"))
///     }
/// }
///
/// impl flagbind::TextCodec for Level {}
///
/// use flagbind::FlagValue;
/// assert_eq!(Level::parse_value("L3"), Ok(Level(3)));
/// ```
pub trait TextCodec: fmt::Display + FromStr {}

impl<T> FlagValue for T
where
    T: TextCodec,
    <T as FromStr>::Err: fmt::Display,
{
    const KIND: Kind = Kind::Text;

    fn parse_value(raw: &str) -> Result<Self, ValueError> {
        raw.parse::<T>().map_err(|e| ValueError::new(e.to_string()))
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

impl FlagValue for bool {
    const KIND: Kind = Kind::Bool;

    fn parse_value(raw: &str) -> Result<Self, ValueError> {
        match raw {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
            "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
            _ => Err(ValueError::syntax()),
        }
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

impl FlagValue for String {
    const KIND: Kind = Kind::String;

    fn parse_value(raw: &str) -> Result<Self, ValueError> {
        Ok(raw.to_owned())
    }

    fn render(&self) -> String {
        self.clone()
    }
}

/// Split an integer literal into its radix and digits (`0x`, `0o`, `0b` and
/// legacy leading-zero octal).
fn split_radix(digits: &str) -> (u32, &str) {
    let has_prefix = |p: &str| digits.get(..2).is_some_and(|head| head.eq_ignore_ascii_case(p));
    if has_prefix("0x") {
        (16, &digits[2..])
    } else if has_prefix("0o") {
        (8, &digits[2..])
    } else if has_prefix("0b") {
        (2, &digits[2..])
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    }
}

fn parse_magnitude(digits: &str) -> Result<u128, ValueError> {
    let (radix, body) = split_radix(digits);
    if body.is_empty() || body.starts_with(['+', '-']) {
        return Err(ValueError::syntax());
    }
    u128::from_str_radix(body, radix).map_err(|e| ValueError::new(e.to_string()))
}

fn parse_signed(raw: &str) -> Result<i128, ValueError> {
    let (negative, digits) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };
    let magnitude = i128::try_from(parse_magnitude(digits)?).map_err(|_| ValueError::out_of_range())?;
    Ok(if negative { -magnitude } else { magnitude })
}

fn parse_unsigned(raw: &str) -> Result<u128, ValueError> {
    if raw.starts_with('-') {
        return Err(ValueError::new("unsigned value cannot be negative"));
    }
    parse_magnitude(raw)
}

macro_rules! signed_values {
    ($($t:ty),* $(,)?) => {$(
        impl FlagValue for $t {
            const KIND: Kind = Kind::Signed;

            fn parse_value(raw: &str) -> Result<Self, ValueError> {
                <$t>::try_from(parse_signed(raw)?).map_err(|_| ValueError::out_of_range())
            }

            fn render(&self) -> String {
                self.to_string()
            }
        }
    )*};
}

macro_rules! unsigned_values {
    ($($t:ty),* $(,)?) => {$(
        impl FlagValue for $t {
            const KIND: Kind = Kind::Unsigned;

            fn parse_value(raw: &str) -> Result<Self, ValueError> {
                <$t>::try_from(parse_unsigned(raw)?).map_err(|_| ValueError::out_of_range())
            }

            fn render(&self) -> String {
                self.to_string()
            }
        }
    )*};
}

macro_rules! float_values {
    ($($t:ty),* $(,)?) => {$(
        impl FlagValue for $t {
            const KIND: Kind = Kind::Float;

            fn parse_value(raw: &str) -> Result<Self, ValueError> {
                raw.parse::<$t>().map_err(|e| ValueError::new(e.to_string()))
            }

            fn render(&self) -> String {
                self.to_string()
            }
        }
    )*};
}

signed_values!(i8, i16, i32, i64, isize);
unsigned_values!(u8, u16, u32, u64, usize);
float_values!(f32, f64);

const NANOS_PER_SEC: u128 = 1_000_000_000;

fn unit_nanos(unit: &str) -> Option<u128> {
    Some(match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        "h" => 3_600 * NANOS_PER_SEC,
        _ => return None,
    })
}

/// Parse a duration such as `300ms`, `1.5h` or `2h45m`.
pub fn parse_duration(raw: &str) -> Result<Duration, ValueError> {
    let invalid = || ValueError::new(format!("invalid duration {raw:?}"));

    if raw.starts_with('-') {
        return Err(ValueError::new(format!("negative duration {raw:?}")));
    }
    let mut rest = raw.strip_prefix('+').unwrap_or(raw);
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let digits_len = |s: &str| s.bytes().take_while(u8::is_ascii_digit).count();
    let mut total: u128 = 0;
    while !rest.is_empty() {
        let (whole, tail) = rest.split_at(digits_len(rest));
        let mut tail = tail;
        let mut fraction = "";
        if let Some(after_dot) = tail.strip_prefix('.') {
            let (frac, after) = after_dot.split_at(digits_len(after_dot));
            fraction = frac;
            tail = after;
        }
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }

        let unit_len = tail
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(tail.len());
        let (unit, after_unit) = tail.split_at(unit_len);
        if unit.is_empty() {
            return Err(ValueError::new(format!("missing unit in duration {raw:?}")));
        }
        let scale = unit_nanos(unit)
            .ok_or_else(|| ValueError::new(format!("unknown unit {unit:?} in duration {raw:?}")))?;

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        total = whole
            .checked_mul(scale)
            .and_then(|n| total.checked_add(n))
            .ok_or_else(invalid)?;

        // Digits beyond nanosecond precision of the largest unit do not matter.
        let mut numerator: u128 = 0;
        let mut denominator: u128 = 1;
        for digit in fraction.bytes().take(18) {
            numerator = numerator * 10 + u128::from(digit - b'0');
            denominator *= 10;
        }
        total = total
            .checked_add(numerator * scale / denominator)
            .ok_or_else(invalid)?;

        rest = after_unit;
    }

    let secs = u64::try_from(total / NANOS_PER_SEC).map_err(|_| invalid())?;
    // Remainder is below one second, so it always fits.
    let nanos = (total % NANOS_PER_SEC) as u32;
    Ok(Duration::new(secs, nanos))
}

impl FlagValue for Duration {
    const KIND: Kind = Kind::Duration;

    fn parse_value(raw: &str) -> Result<Self, ValueError> {
        parse_duration(raw)
    }

    fn render(&self) -> String {
        format!("{self:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Color(String);

    impl fmt::Display for Color {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl FromStr for Color {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s {
                "red" | "green" | "blue" => Ok(Color(s.to_string())),
                other => Err(format!("unknown color {other:?}")),
            }
        }
    }

    impl TextCodec for Color {}

    #[test]
    fn bool_accepts_standard_literals() {
        for raw in ["1", "t", "T", "TRUE", "true", "True"] {
            assert_eq!(bool::parse_value(raw), Ok(true), "{raw}");
        }
        for raw in ["0", "f", "F", "FALSE", "false", "False"] {
            assert_eq!(bool::parse_value(raw), Ok(false), "{raw}");
        }
        assert!(bool::parse_value("yes").is_err());
        assert!(bool::parse_value("").is_err());
    }

    #[test]
    fn signed_integers_support_prefixes_and_sign() {
        assert_eq!(i64::parse_value("42"), Ok(42));
        assert_eq!(i64::parse_value("-42"), Ok(-42));
        assert_eq!(i64::parse_value("+7"), Ok(7));
        assert_eq!(i64::parse_value("0x1F"), Ok(31));
        assert_eq!(i64::parse_value("0o17"), Ok(15));
        assert_eq!(i64::parse_value("0b101"), Ok(5));
        assert_eq!(i64::parse_value("017"), Ok(15));
        assert_eq!(i64::parse_value("0"), Ok(0));
        assert_eq!(isize::parse_value("-0x10"), Ok(-16));
    }

    #[test]
    fn signed_integers_reject_garbage_and_overflow() {
        assert!(i64::parse_value("").is_err());
        assert!(i64::parse_value("-").is_err());
        assert!(i64::parse_value("1.5").is_err());
        assert!(i64::parse_value("0x").is_err());
        assert!(i64::parse_value("--1").is_err());
        assert!(i8::parse_value("128").is_err());
        assert_eq!(i8::parse_value("-128"), Ok(-128));
    }

    #[test]
    fn unsigned_integers_reject_negative_values() {
        assert_eq!(u64::parse_value("10"), Ok(10));
        let err = u64::parse_value("-1").unwrap_err();
        assert!(err.message().contains("negative"), "{err}");
        assert!(usize::parse_value("+1").is_err());
        assert!(u8::parse_value("256").is_err());
    }

    #[test]
    fn floats_parse() {
        assert_eq!(f64::parse_value("1.25"), Ok(1.25));
        assert_eq!(f64::parse_value("-3e2"), Ok(-300.0));
        assert!(f64::parse_value("one").is_err());
    }

    #[test]
    fn durations_parse_unit_groups() {
        assert_eq!(parse_duration("3s"), Ok(Duration::from_secs(3)));
        assert_eq!(parse_duration("300ms"), Ok(Duration::from_millis(300)));
        assert_eq!(parse_duration("1.5s"), Ok(Duration::from_millis(1500)));
        assert_eq!(parse_duration("2h45m"), Ok(Duration::from_secs(2 * 3600 + 45 * 60)));
        assert_eq!(parse_duration("1m30.5s"), Ok(Duration::from_millis(90_500)));
        assert_eq!(parse_duration("10us"), Ok(Duration::from_micros(10)));
        assert_eq!(parse_duration("10µs"), Ok(Duration::from_micros(10)));
        assert_eq!(parse_duration(".5h"), Ok(Duration::from_secs(1800)));
        assert_eq!(parse_duration("+1ns"), Ok(Duration::from_nanos(1)));
        assert_eq!(parse_duration("0"), Ok(Duration::ZERO));
    }

    #[test]
    fn durations_reject_malformed_input() {
        for raw in ["", "nope", "3", "3x", "s", "-1s", "1.s.", "."] {
            assert!(parse_duration(raw).is_err(), "{raw:?} should fail");
        }
    }

    #[test]
    fn text_codec_types_use_from_str() {
        assert_eq!(Color::KIND, Kind::Text);
        assert_eq!(Color::parse_value("red"), Ok(Color("red".into())));
        let err = Color::parse_value("pink").unwrap_err();
        assert_eq!(err.message(), "unknown color \"pink\"");
        assert_eq!(Color("blue".into()).render(), "blue");
    }

    #[test]
    fn kinds_render_as_type_names() {
        assert_eq!(<bool as FlagValue>::KIND.to_string(), "bool");
        assert_eq!(<u64 as FlagValue>::KIND.to_string(), "uint");
        assert_eq!(<Duration as FlagValue>::KIND.to_string(), "duration");
    }
}
