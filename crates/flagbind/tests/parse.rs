use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use flagbind::{
    Error, Flags, Parser, SetArgs, SetFlags, SetFlagsCount, TextCodec, parse,
};

#[derive(Debug, Default, PartialEq, Flags)]
#[flags(args, set_flags)]
struct F {
    #[flag("s,string,long-string")]
    s: String,
    #[flag("i,int")]
    i: i64,
    #[flag("b")]
    b: bool,
    #[flag("h,help")]
    h: bool,
    #[flag("t")]
    t: Duration,
    n: i64,
    args: Vec<String>,
    flags: BTreeSet<String>,
}

impl SetArgs for F {
    fn set_args(&mut self, args: Vec<String>) {
        self.args = args;
    }
}

impl SetFlags for F {
    fn set_flags(&mut self, flags: BTreeSet<String>) {
        self.flags = flags;
    }
}

fn names(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|s| (*s).to_owned()).collect()
}

fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_owned()).collect()
}

fn run(args: &[&str]) -> (F, Result<(), Error>) {
    let mut argv = vec![""];
    argv.extend_from_slice(args);
    let mut f = F::default();
    let result = parse(&argv, &mut f);
    (f, result)
}

#[test]
fn parse_table() {
    struct Case {
        args: &'static [&'static str],
        want: F,
    }

    let cases = vec![
        Case {
            args: &[],
            want: F::default(),
        },
        Case {
            args: &["toto"],
            want: F {
                args: strings(&["toto"]),
                ..F::default()
            },
        },
        Case {
            args: &["-h"],
            want: F {
                h: true,
                flags: names(&["h"]),
                ..F::default()
            },
        },
        Case {
            args: &["-i", "10", "--int", "20"],
            want: F {
                i: 20,
                flags: names(&["i"]),
                ..F::default()
            },
        },
        Case {
            args: &["-s", "a", "--string", "b", "-long-string", "c"],
            want: F {
                s: "c".into(),
                flags: names(&["s"]),
                ..F::default()
            },
        },
        Case {
            args: &["-b", "--b", "-b"],
            want: F {
                b: true,
                flags: names(&["b"]),
                ..F::default()
            },
        },
        Case {
            args: &["-b", "-int", "1", "-string", "a", "arg1", "arg2"],
            want: F {
                b: true,
                i: 1,
                s: "a".into(),
                args: strings(&["arg1", "arg2"]),
                flags: names(&["b", "i", "s"]),
                ..F::default()
            },
        },
        Case {
            args: &["-t", "3s"],
            want: F {
                t: Duration::from_secs(3),
                flags: names(&["t"]),
                ..F::default()
            },
        },
        Case {
            args: &["arg1", "-i", "1", "arg2", "-b"],
            want: F {
                i: 1,
                b: true,
                args: strings(&["arg1", "arg2"]),
                flags: names(&["i", "b"]),
                ..F::default()
            },
        },
        Case {
            args: &["arg1", "--", "-i", "2"],
            want: F {
                args: strings(&["arg1", "-i", "2"]),
                ..F::default()
            },
        },
    ];

    for case in cases {
        let (f, result) = run(case.args);
        assert!(result.is_ok(), "{:?}: {:?}", case.args, result);
        assert_eq!(f, case.want, "{:?}", case.args);
    }
}

#[test]
fn parse_errors() {
    let cases: &[(&[&str], &str)] = &[
        (&["-n", "1"], "not defined: -n"),
        (&["-t", "nope"], "invalid value"),
        (&["arg1", "-z", "arg2"], "not defined: -z"),
        (&["--zz"], "-zz"),
        (&["-i"], "flag needs an argument: -i"),
        (&["-i", "-1x"], "invalid value \"-1x\" for flag -i"),
        (&["-=x"], "bad flag syntax"),
    ];

    for (args, want) in cases {
        let (_, result) = run(args);
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains(want), "{args:?}: {msg}");
    }
}

#[test]
fn struct_without_flags_keeps_defaults() {
    #[derive(Flags)]
    struct NoFlag {
        v: i64,
    }

    let mut f = NoFlag { v: 4 };
    parse(&["", "x"], &mut f).unwrap();
    assert_eq!(f.v, 4);
}

#[test]
fn struct_without_flags_still_gets_args() {
    #[derive(Default, Flags)]
    #[flags(args)]
    struct NoFlagSetArgs {
        args: Vec<String>,
    }

    impl SetArgs for NoFlagSetArgs {
        fn set_args(&mut self, args: Vec<String>) {
            self.args = args;
        }
    }

    let mut f = NoFlagSetArgs::default();
    parse(&["", "x"], &mut f).unwrap();
    assert_eq!(f.args, ["x"]);
}

#[test]
fn undeclared_help_is_an_undefined_flag() {
    #[derive(Default, Flags)]
    struct OnlyX {
        #[flag("x")]
        x: bool,
    }

    for help in ["-h", "--help"] {
        let mut f = OnlyX::default();
        let err = parse(&["", help], &mut f).unwrap_err();
        assert!(matches!(err, Error::UndefinedFlag(_)), "{err}");
        assert!(err.to_string().contains(help.trim_start_matches('-')));
    }
}

#[derive(Debug, Default, Flags)]
#[flags(set_flags, flags_count)]
struct Counted {
    #[flag("i,int")]
    ints: Vec<i64>,
    #[flag("u")]
    uints: Vec<u8>,
    #[flag("d")]
    durations: Vec<Duration>,
    #[flag("v,verbose")]
    verbose: bool,
    flags: BTreeSet<String>,
    counts: Option<BTreeMap<String, usize>>,
}

impl SetFlags for Counted {
    fn set_flags(&mut self, flags: BTreeSet<String>) {
        self.flags = flags;
    }
}

impl SetFlagsCount for Counted {
    fn set_flags_count(&mut self, counts: Option<BTreeMap<String, usize>>) {
        self.counts = counts;
    }
}

#[test]
fn repeated_flags_append_under_any_alias() {
    let mut c = Counted::default();
    parse(
        &["", "-i", "1", "--int", "0x10", "-int=-3", "-v", "--verbose", "-d", "1m30s"],
        &mut c,
    )
    .unwrap();
    assert_eq!(c.ints, [1, 16, -3]);
    assert_eq!(c.durations, [Duration::from_secs(90)]);
    assert!(c.verbose);
    assert_eq!(c.flags, names(&["i", "v", "d"]));
    assert_eq!(
        c.counts,
        Some(BTreeMap::from([
            ("i".to_string(), 3),
            ("v".to_string(), 2),
            ("d".to_string(), 1),
        ]))
    );
}

#[test]
fn counts_are_absent_when_nothing_is_set() {
    let mut c = Counted::default();
    parse(&["", "pos"], &mut c).unwrap();
    assert_eq!(c.counts, None);
    assert!(c.flags.is_empty());
}

#[test]
fn unsigned_flag_rejects_negative_value() {
    let mut c = Counted::default();
    let err = parse(&["", "-u", "-1"], &mut c).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("-u"), "{msg}");
    assert!(msg.contains("\"-1\""), "{msg}");
    assert!(c.uints.is_empty());
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
enum Color {
    #[default]
    Red,
    Blue,
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Color::Red => "red",
            Color::Blue => "blue",
        })
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "red" => Ok(Color::Red),
            "blue" => Ok(Color::Blue),
            other => Err(format!("unknown color {other:?}")),
        }
    }
}

impl TextCodec for Color {}

#[derive(Debug, Default, Flags)]
struct Paint {
    #[flag("c,color")]
    color: Color,
    #[flag("p,palette")]
    #[env("PALETTE")]
    palette: Vec<Color>,
}

#[test]
fn text_codec_fields() {
    let mut p = Paint::default();
    parse(&["", "-c", "blue", "-p", "red", "-p", "blue"], &mut p).unwrap();
    assert_eq!(p.color, Color::Blue);
    assert_eq!(p.palette, [Color::Red, Color::Blue]);

    let err = parse(&["", "--color", "green"], &mut p).unwrap_err();
    assert!(err.to_string().contains("unknown color \"green\""), "{err}");
}

#[test]
fn repeated_env_value_is_split_and_replaced() {
    let mut p = Paint {
        palette: vec![Color::Red, Color::Red, Color::Red],
        ..Paint::default()
    };
    Parser::new()
        .env_vars(true)
        .env_prefix("PAINT_")
        .parse_with_env(&["paint", "-p", "red"], &mut p, &[("PAINT_PALETTE", "blue,blue")])
        .unwrap();
    assert_eq!(p.palette, [Color::Blue, Color::Blue, Color::Red]);
}

#[test]
fn raw_identifier_field_reads_its_env_var() {
    #[derive(Default, Flags)]
    struct Raw {
        #[env("TYPE")]
        r#type: String,
    }

    let mut raw = Raw::default();
    Parser::new()
        .env_vars(true)
        .env_prefix(flagbind::NO_PREFIX)
        .parse_with_env(&["raw"], &mut raw, &[("TYPE", "tcp")])
        .unwrap();
    assert_eq!(raw.r#type, "tcp");
}
