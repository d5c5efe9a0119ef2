//! Line lexer and verb table
//!
//! A script line holds one or more statements separated by top-level `;`.
//! Statements whose first non-blank character is `#` are comments. Tokens
//! are whitespace separated; single or double quotes group a token that
//! contains blanks or semicolons.

use crate::ast::{Statement, Verb};
use thiserror::Error;

/// `(verb, shortest unambiguous prefix)`; a command word matches a verb when
/// it is at least as long as the prefix and is itself a prefix of the verb.
pub const VERB_TABLE: [(Verb, &str); 21] = [
    (Verb::Alpha, "al"),
    (Verb::Animate, "an"),
    (Verb::Attach, "at"),
    (Verb::Color, "c"),
    (Verb::Define, "de"),
    (Verb::Display, "di"),
    (Verb::Fade, "fa"),
    (Verb::Fix, "fi"),
    (Verb::Hide, "h"),
    (Verb::Kill, "k"),
    (Verb::Move, "m"),
    (Verb::Palette, "pa"),
    (Verb::Play, "pl"),
    (Verb::Priority, "pr"),
    (Verb::Resize, "r"),
    (Verb::Scale, "sc"),
    (Verb::Shift, "sh"),
    (Verb::Sleep, "sl"),
    (Verb::Spring, "sp"),
    (Verb::Unhide, "u"),
    (Verb::Wait, "w"),
];

/// Errors produced while splitting and tokenizing a line
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexError {
    #[error("unterminated string starting at column {column}")]
    UnterminatedQuote { column: usize },

    #[error("illegal command '{word}'")]
    UnknownVerb { word: String },

    #[error("ambiguous command '{word}' (could be {})", candidates.join(", "))]
    AmbiguousVerb {
        word: String,
        candidates: Vec<&'static str>,
    },
}

/// Resolve a (possibly abbreviated) command word.
pub fn lookup_verb(word: &str) -> Result<Verb, LexError> {
    let word = word.to_ascii_lowercase();
    if let Some((verb, _)) = VERB_TABLE
        .iter()
        .find(|(verb, min)| word.len() >= min.len() && verb.name().starts_with(&word))
    {
        return Ok(*verb);
    }

    let candidates: Vec<&'static str> = VERB_TABLE
        .iter()
        .map(|(verb, _)| verb.name())
        .filter(|name| !word.is_empty() && name.starts_with(&word))
        .collect();
    if candidates.is_empty() {
        Err(LexError::UnknownVerb { word })
    } else {
        Err(LexError::AmbiguousVerb { word, candidates })
    }
}

/// Split a line on `;` outside quotes. Returned slices keep their blanks.
///
/// A quote only opens at the start of a token, so `don't` is a plain word.
pub fn split_statements(line: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    let mut prev: Option<char> = None;
    for (i, c) in line.char_indices() {
        let token_start = prev.is_none_or(|p| p.is_whitespace() || p == ';');
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') if token_start => quote = Some(c),
            (None, ';') => {
                parts.push(&line[start..i]);
                start = i + 1;
            }
            (None, _) => {}
        }
        prev = Some(c);
    }
    parts.push(&line[start..]);
    parts
}

/// Whitespace tokenizer honouring quotes. Quote characters are removed.
pub fn tokenize(statement: &str) -> Result<Vec<String>, LexError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<(char, usize)> = None;

    for (i, c) in statement.char_indices() {
        match quote {
            Some((q, _)) if c == q => quote = None,
            Some(_) => current.push(c),
            None if !in_token && (c == '"' || c == '\'') => {
                quote = Some((c, i));
                in_token = true;
            }
            None if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if let Some((_, column)) = quote {
        return Err(LexError::UnterminatedQuote { column: column + 1 });
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

fn is_comment(statement: &str) -> bool {
    statement.trim_start().starts_with('#')
}

/// Lex a whole script line into statements. Blank and comment-only lines
/// yield nothing.
pub fn lex_line(line: &str, lineno: usize) -> Result<Vec<Statement>, LexError> {
    if is_comment(line) {
        return Ok(Vec::new());
    }
    let mut statements = Vec::new();
    for part in split_statements(line) {
        if is_comment(part) {
            continue;
        }
        let mut tokens = tokenize(part)?.into_iter();
        let Some(word) = tokens.next() else {
            continue;
        };
        let verb = lookup_verb(&word)?;
        statements.push(Statement {
            verb,
            args: tokens.collect(),
            line: lineno,
        });
    }
    Ok(statements)
}
