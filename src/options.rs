//! Unix-style option parsing for command arguments
//!
//! A template such as `"r:f:"` lists the accepted flag characters; a `:`
//! after a character marks it as value-taking. Switches may be bundled
//! (`-ht`), values may be attached (`-fcyan`) or separate (`-f cyan`).

use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptionError {
    #[error("unrecognized option '-{flag}'")]
    Unknown { flag: char },

    #[error("option '-{flag}' requires a value")]
    MissingValue { flag: char },
}

/// Parsed value of a single flag
#[derive(Debug, Clone, PartialEq)]
pub enum OptValue {
    Switch,
    Value(String),
}

/// Flags collected from the front of an argument list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    map: BTreeMap<char, OptValue>,
}

impl Options {
    pub fn has(&self, flag: char) -> bool {
        self.map.contains_key(&flag)
    }

    pub fn value(&self, flag: char) -> Option<&str> {
        match self.map.get(&flag) {
            Some(OptValue::Value(v)) => Some(v),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, &OptValue)> {
        self.map.iter().map(|(c, v)| (*c, v))
    }
}

#[derive(Clone, Copy, PartialEq)]
enum FlagKind {
    Switch,
    WithValue,
}

fn flag_kind(template: &str, flag: char) -> Option<FlagKind> {
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        let takes_value = chars.peek() == Some(&':');
        if takes_value {
            chars.next();
        }
        if c == flag {
            return Some(if takes_value { FlagKind::WithValue } else { FlagKind::Switch });
        }
    }
    None
}

/// An option token is `-` followed by a letter; `-`, `--` and negative
/// numbers end option processing.
fn option_body(token: &str) -> Option<&str> {
    let body = token.strip_prefix('-')?;
    body.starts_with(|c: char| c.is_ascii_alphabetic()).then_some(body)
}

/// Consume the leading option tokens of `args` according to `template`.
///
/// Returns the parsed options and the unconsumed positional remainder.
pub fn parse_options(template: &str, args: &[String]) -> Result<(Options, Vec<String>), OptionError> {
    let mut opts = Options::default();
    let mut i = 0;
    while let Some(body) = args.get(i).and_then(|t| option_body(t)) {
        i += 1;
        let mut rest = body;
        while let Some(flag) = rest.chars().next() {
            rest = &rest[flag.len_utf8()..];
            match flag_kind(template, flag) {
                Some(FlagKind::Switch) => {
                    opts.map.insert(flag, OptValue::Switch);
                }
                Some(FlagKind::WithValue) => {
                    let value = if !rest.is_empty() {
                        std::mem::take(&mut rest).to_string()
                    } else {
                        let v = args.get(i).ok_or(OptionError::MissingValue { flag })?;
                        i += 1;
                        v.clone()
                    };
                    opts.map.insert(flag, OptValue::Value(value));
                }
                None => return Err(OptionError::Unknown { flag }),
            }
        }
    }
    Ok((opts, args[i..].to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn value_option_with_separate_argument() {
        let (opts, rest) = parse_options("f:", &strings(&["-f", "cyan", "10", "10"])).unwrap();
        assert_eq!(opts.value('f'), Some("cyan"));
        assert_eq!(rest, strings(&["10", "10"]));
    }

    #[test]
    fn bundled_switches() {
        let (opts, rest) = parse_options("ht", &strings(&["-ht", "1", "2"])).unwrap();
        assert!(opts.has('h'));
        assert!(opts.has('t'));
        assert_eq!(rest, strings(&["1", "2"]));
    }

    #[test]
    fn attached_value_and_mixed_flags() {
        let (opts, rest) = parse_options("r:f:", &strings(&["-r45", "-f", "red", "5"])).unwrap();
        assert_eq!(opts.value('r'), Some("45"));
        assert_eq!(opts.value('f'), Some("red"));
        assert_eq!(rest, strings(&["5"]));
    }

    #[test]
    fn negative_numbers_are_positional() {
        let (opts, rest) = parse_options("ht", &strings(&["-0.5", "-3", "-", "x"])).unwrap();
        assert!(opts.is_empty());
        assert_eq!(rest.len(), 4);
    }

    #[test]
    fn unknown_flag_is_fatal() {
        assert_eq!(
            parse_options("lcr", &strings(&["-x", "hello"])),
            Err(OptionError::Unknown { flag: 'x' })
        );
        assert_eq!(
            parse_options("f:", &strings(&["-f"])),
            Err(OptionError::MissingValue { flag: 'f' })
        );
    }
}
