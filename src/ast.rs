//! Syntax-level types for cell scripts
//!
//! A script line is split into [`Statement`]s; each statement is a verb plus
//! the raw argument tokens handed to its handler. Patterns and colours are
//! parsed from those tokens on demand.

use crate::types::Rgba;
use std::fmt;

/// Every command the interpreter understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Alpha,
    Animate,
    Attach,
    Color,
    Define,
    Display,
    Fade,
    Fix,
    Hide,
    Kill,
    Move,
    Palette,
    Play,
    Priority,
    Resize,
    Scale,
    Shift,
    Sleep,
    Spring,
    Unhide,
    Wait,
}

impl Verb {
    pub fn name(self) -> &'static str {
        match self {
            Verb::Alpha => "alpha",
            Verb::Animate => "animate",
            Verb::Attach => "attach",
            Verb::Color => "color",
            Verb::Define => "define",
            Verb::Display => "display",
            Verb::Fade => "fade",
            Verb::Fix => "fix",
            Verb::Hide => "hide",
            Verb::Kill => "kill",
            Verb::Move => "move",
            Verb::Palette => "palette",
            Verb::Play => "play",
            Verb::Priority => "priority",
            Verb::Resize => "resize",
            Verb::Scale => "scale",
            Verb::Shift => "shift",
            Verb::Sleep => "sleep",
            Verb::Spring => "spring",
            Verb::Unhide => "unhide",
            Verb::Wait => "wait",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One `;`-separated command, ready for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub verb: Verb,
    /// Positional tokens after the verb, quotes already removed.
    pub args: Vec<String>,
    /// 1-based script line the statement came from.
    pub line: usize,
}

/// Name selector, resolved against the live scene every time it is used.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    /// `-`: the "no object" sentinel (auto-named on define)
    Nothing,
    /// `--`: the most recently referenced name
    Last,
    /// `/regex/`: every live name the expression matches
    Regex(String),
    /// Anything else: a literal name (or a number passed through verbatim)
    Literal(String),
}

impl Pattern {
    pub fn parse(token: &str) -> Self {
        match token {
            "-" => Pattern::Nothing,
            "--" => Pattern::Last,
            t if t.len() >= 2 && t.starts_with('/') && t.ends_with('/') => {
                Pattern::Regex(t[1..t.len() - 1].to_string())
            }
            t => Pattern::Literal(t.to_string()),
        }
    }
}

/// A colour as written in a script.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorSpec {
    /// Looked up in the active palette at render time
    Named(String),
    /// `#RRGGBB[AA]`, `r,g,b[,a]` or a packed 32-bit integer
    Literal(Rgba),
}

impl fmt::Display for ColorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorSpec::Named(name) => f.write_str(name),
            ColorSpec::Literal(rgba) => write!(f, "{}", rgba),
        }
    }
}

/// The nine primitive kinds a `define` can create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Bitmap,
    Box,
    Ellipse,
    Line,
    Link,
    Polygon,
    Spline,
    Text,
    Wire,
}

/// `(type name, shortest unambiguous prefix)` for `define` type words.
pub const SHAPE_PREFIXES: [(ShapeKind, &str, &str); 9] = [
    (ShapeKind::Bitmap, "bitmap", "bi"),
    (ShapeKind::Box, "box", "bo"),
    (ShapeKind::Ellipse, "ellipse", "e"),
    (ShapeKind::Line, "line", "line"),
    (ShapeKind::Link, "link", "link"),
    (ShapeKind::Polygon, "polygon", "p"),
    (ShapeKind::Spline, "spline", "s"),
    (ShapeKind::Text, "text", "t"),
    (ShapeKind::Wire, "wire", "w"),
];

impl ShapeKind {
    pub fn name(self) -> &'static str {
        SHAPE_PREFIXES
            .iter()
            .find(|(kind, _, _)| *kind == self)
            .map(|(_, name, _)| *name)
            .unwrap_or("object")
    }

    /// Resolve an abbreviated type word (`bo`, `ell`, `poly`, ...).
    pub fn from_prefix(word: &str) -> Option<Self> {
        let word = word.to_ascii_lowercase();
        SHAPE_PREFIXES
            .iter()
            .find(|(_, name, min)| word.len() >= min.len() && name.starts_with(&word))
            .map(|(kind, _, _)| *kind)
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Horizontal text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    Left,
    #[default]
    Center,
    Right,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_forms() {
        assert_eq!(Pattern::parse("-"), Pattern::Nothing);
        assert_eq!(Pattern::parse("--"), Pattern::Last);
        assert_eq!(Pattern::parse("/^v/"), Pattern::Regex("^v".into()));
        assert_eq!(Pattern::parse("b1"), Pattern::Literal("b1".into()));
        // a lone slash is just a name
        assert_eq!(Pattern::parse("/"), Pattern::Literal("/".into()));
    }

    #[test]
    fn shape_prefixes_resolve() {
        assert_eq!(ShapeKind::from_prefix("bo"), Some(ShapeKind::Box));
        assert_eq!(ShapeKind::from_prefix("ELLIPSE"), Some(ShapeKind::Ellipse));
        assert_eq!(ShapeKind::from_prefix("poly"), Some(ShapeKind::Polygon));
        assert_eq!(ShapeKind::from_prefix("link"), Some(ShapeKind::Link));
        assert_eq!(ShapeKind::from_prefix("lin"), None);
        assert_eq!(ShapeKind::from_prefix("b"), None);
        assert_eq!(ShapeKind::from_prefix("boxes"), None);
    }
}
