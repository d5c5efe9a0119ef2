//! Pattern, geometry and colour resolution against the live scene
//!
//! Geometry follows one rule everywhere: a coordinate in `[-1, 1]` is a
//! fraction of the canvas extent on its axis, anything else is pixels. A
//! position slot is either two numbers or a single `name[(+|-)dx(+|-)dy]`
//! token, in which case the offset obeys the same rule.

use crate::ast::{ColorSpec, Pattern};
use crate::errors::{LineContext, ScriptError};
use crate::palette::Palette;
use crate::scene::Cell;
use crate::types::Rgba;
use glam::{DVec2, dvec2};
use regex_lite::Regex;

/// Parse a numeric token: decimal with optional exponent, or `0x` hex.
pub fn parse_number(token: &str) -> Option<f64> {
    let t = token.trim();
    let (negative, body) = match t.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, t.strip_prefix('+').unwrap_or(t)),
    };
    if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        let v = u64::from_str_radix(hex, 16).ok()? as f64;
        return Some(if negative { -v } else { v });
    }
    let numeric_chars = |c: char| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-');
    if body.is_empty() || !body.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }
    if !body.chars().all(numeric_chars) {
        return None;
    }
    let v: f64 = t.parse().ok()?;
    v.is_finite().then_some(v)
}

/// Scale a coordinate in `[-1, 1]` by `extent`.
pub fn relative(v: f64, extent: f64) -> f64 {
    if (-1.0..=1.0).contains(&v) { v * extent } else { v }
}

/// Apply the relative rule on both axes of the canvas.
pub fn expand_numeric_position(cell: &Cell, x: f64, y: f64) -> DVec2 {
    dvec2(relative(x, cell.width()), relative(y, cell.height()))
}

/// Split `name+dx-dy` into its parts. The offsets keep their sign.
pub fn split_offset_reference(token: &str) -> Option<(&str, f64, f64)> {
    let name_len = token
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
        .map(|(i, _)| i)?;
    if name_len == 0 {
        return None;
    }
    let (name, rest) = token.split_at(name_len);
    let second = rest.strip_prefix(['+', '-'])?.find(['+', '-'])? + 1;
    let (dx, dy) = rest.split_at(second);
    let is_offset = |s: &str| {
        s.len() > 1
            && s.starts_with(['+', '-'])
            && s[1..].chars().all(|c| c.is_ascii_digit() || c == '.')
    };
    if !is_offset(dx) || !is_offset(dy) {
        return None;
    }
    Some((name, dx.parse().ok()?, dy.parse().ok()?))
}

/// How unknown names are treated by [`expand_name`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NameMode {
    /// Accept a name that does not exist yet (`define`).
    pub allow_create: bool,
    /// A regex without matches yields nothing instead of an error (`kill`).
    pub allow_nomatch: bool,
}

impl NameMode {
    pub const EXISTING: NameMode = NameMode {
        allow_create: false,
        allow_nomatch: false,
    };
    pub const CREATE: NameMode = NameMode {
        allow_create: true,
        allow_nomatch: false,
    };
    pub const NOMATCH: NameMode = NameMode {
        allow_create: false,
        allow_nomatch: true,
    };
}

/// Expand one pattern token into object names.
///
/// `-` expands to nothing. Numeric tokens pass through verbatim so that
/// callers taking "names or numbers" can sort them out.
pub fn expand_name(
    cell: &Cell,
    token: &str,
    mode: NameMode,
    ctx: &LineContext<'_>,
) -> Result<Vec<String>, ScriptError> {
    match Pattern::parse(token) {
        Pattern::Nothing => Ok(Vec::new()),
        Pattern::Last => cell
            .last_name()
            .map(|n| vec![n.to_string()])
            .ok_or_else(|| ctx.reference("no object has been referenced yet", token)),
        Pattern::Regex(expr) => {
            let re = Regex::new(&expr)
                .map_err(|e| ctx.syntax(format!("invalid regexp '{expr}': {e}"), token))?;
            let matches: Vec<String> = cell
                .names()
                .filter(|n| re.is_match(n))
                .map(str::to_string)
                .collect();
            if matches.is_empty() && !mode.allow_nomatch {
                return Err(ctx.reference(format!("non-matching regexp '{expr}'"), token));
            }
            Ok(matches)
        }
        Pattern::Literal(name) => {
            if parse_number(&name).is_some() || cell.contains(&name) || mode.allow_create {
                Ok(vec![name])
            } else {
                Err(ctx.reference(format!("invalid name '{name}'"), token))
            }
        }
    }
}

/// Expand every token and concatenate the results in order.
pub fn expand_names(
    cell: &Cell,
    tokens: &[String],
    mode: NameMode,
    ctx: &LineContext<'_>,
) -> Result<Vec<String>, ScriptError> {
    let mut found = Vec::new();
    for token in tokens {
        found.extend(expand_name(cell, token, mode, ctx)?);
    }
    Ok(found)
}

/// Resolve a single-token position: `name` or `name±dx±dy`.
pub fn expand_reference(
    cell: &Cell,
    token: &str,
    ctx: &LineContext<'_>,
) -> Result<DVec2, ScriptError> {
    if let Some((name, dx, dy)) = split_offset_reference(token) {
        let base = object_position(cell, name, token, ctx)?;
        return Ok(base + expand_numeric_position(cell, dx, dy));
    }
    object_position(cell, token, token, ctx)
}

fn object_position(
    cell: &Cell,
    name: &str,
    token: &str,
    ctx: &LineContext<'_>,
) -> Result<DVec2, ScriptError> {
    if !cell.contains(name) {
        return Err(ctx.reference(format!("object '{name}' not found"), token));
    }
    cell.position(name)
        .ok_or_else(|| ctx.reference(format!("object '{name}' has no position"), token))
}

/// Resolve a position given as one reference token or two numeric tokens.
pub fn expand_position(
    cell: &Cell,
    a: &str,
    b: Option<&str>,
    ctx: &LineContext<'_>,
) -> Result<DVec2, ScriptError> {
    match (parse_number(a), b) {
        (Some(x), Some(b)) => {
            let y = parse_number(b)
                .ok_or_else(|| ctx.syntax(format!("invalid positional parameter '{b}'"), b))?;
            Ok(expand_numeric_position(cell, x, y))
        }
        (Some(_), None) => Err(ctx.syntax("missing y coordinate", a)),
        (None, _) => expand_reference(cell, a, ctx),
    }
}

/// Turn `palette` arguments into a colour: one packed `0xRRGGBBAA` integer,
/// or three or four components.
pub fn expand_palette(args: &[String], ctx: &LineContext<'_>) -> Result<Rgba, ScriptError> {
    let numbers = args
        .iter()
        .map(|a| {
            parse_number(a)
                .ok_or_else(|| ctx.syntax(format!("invalid colour component '{a}'"), a))
        })
        .collect::<Result<Vec<f64>, _>>()?;
    match numbers[..] {
        [packed] => packed_rgba(packed).ok_or_else(|| {
            let token = args[0].as_str();
            ctx.argument(format!("invalid packed colour '{token}'"), Some(token))
        }),
        [r, g, b] => Ok(Rgba::from_components(r, g, b, 1.0)),
        [r, g, b, a] => Ok(Rgba::from_components(r, g, b, a)),
        _ => Err(ctx.argument(
            format!("palette needs 1, 3 or 4 colour values, got {}", args.len()),
            None,
        )),
    }
}

fn packed_rgba(v: f64) -> Option<Rgba> {
    (v.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&v))
        .then(|| Rgba::from_packed(v as u32))
}

/// Parse a colour token and validate names against `palette`.
pub fn parse_color(
    token: &str,
    palette: &dyn Palette,
    ctx: &LineContext<'_>,
) -> Result<ColorSpec, ScriptError> {
    if let Some(hex) = token.strip_prefix('#') {
        let valid = matches!(hex.len(), 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit());
        let packed = valid.then(|| u32::from_str_radix(hex, 16).ok()).flatten();
        return match packed {
            Some(v) if hex.len() == 6 => Ok(ColorSpec::Literal(Rgba::from_packed((v << 8) | 0xff))),
            Some(v) => Ok(ColorSpec::Literal(Rgba::from_packed(v))),
            None => Err(ctx.syntax(format!("invalid colour '{token}'"), token)),
        };
    }
    if token.contains(',') {
        let parts: Option<Vec<f64>> = token.split(',').map(parse_number).collect();
        return match parts.as_deref() {
            Some(&[r, g, b]) => Ok(ColorSpec::Literal(Rgba::from_components(r, g, b, 1.0))),
            Some(&[r, g, b, a]) => Ok(ColorSpec::Literal(Rgba::from_components(r, g, b, a))),
            _ => Err(ctx.syntax(format!("invalid colour '{token}'"), token)),
        };
    }
    if let Some(v) = parse_number(token) {
        return packed_rgba(v)
            .map(ColorSpec::Literal)
            .ok_or_else(|| ctx.syntax(format!("invalid colour '{token}'"), token));
    }
    if palette.contains(token) {
        Ok(ColorSpec::Named(token.to_string()))
    } else {
        Err(ctx.reference(format!("undefined color '{token}'"), token))
    }
}

/// Walks positional arguments against per-slot defaults.
///
/// Missing trailing slots take their default; leftovers after the last slot
/// are rejected by [`ArgCursor::finish`].
pub struct ArgCursor<'a> {
    args: &'a [String],
    pos: usize,
    ctx: &'a LineContext<'a>,
}

impl<'a> ArgCursor<'a> {
    pub fn new(args: &'a [String], ctx: &'a LineContext<'a>) -> Self {
        Self { args, pos: 0, ctx }
    }

    pub fn next_token(&mut self) -> Option<&'a str> {
        let token = self.args.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    /// Required token, or an argument error naming `what`.
    pub fn required(&mut self, what: &str) -> Result<&'a str, ScriptError> {
        self.next_token()
            .ok_or_else(|| self.ctx.argument(format!("missing {what}"), None))
    }

    pub fn number(&mut self, default: f64) -> Result<f64, ScriptError> {
        match self.next_token() {
            None => Ok(default),
            Some(t) => self.number_token(t),
        }
    }

    fn number_token(&self, token: &str) -> Result<f64, ScriptError> {
        parse_number(token).ok_or_else(|| self.ctx.syntax(format!("invalid number '{token}'"), token))
    }

    /// A pair of numbers under the relative rule, each defaulting separately.
    pub fn pair(&mut self, cell: &Cell, default: (f64, f64)) -> Result<DVec2, ScriptError> {
        let x = self.number(default.0)?;
        let y = self.number(default.1)?;
        Ok(expand_numeric_position(cell, x, y))
    }

    /// A position slot: one reference token or two numbers.
    pub fn position(&mut self, cell: &Cell, default: (f64, f64)) -> Result<DVec2, ScriptError> {
        match self.args.get(self.pos) {
            None => Ok(expand_numeric_position(cell, default.0, default.1)),
            Some(t) if parse_number(t).is_none() => {
                self.pos += 1;
                expand_reference(cell, t, self.ctx)
            }
            Some(_) => self.pair(cell, default),
        }
    }

    /// A position slot that must be present.
    pub fn required_position(&mut self, cell: &Cell, what: &str) -> Result<DVec2, ScriptError> {
        let first = self.required(what)?;
        let second = match parse_number(first) {
            Some(_) => Some(self.required(what)?),
            None => None,
        };
        expand_position(cell, first, second, self.ctx)
    }

    pub fn color(&mut self, default: &str, palette: &dyn Palette) -> Result<ColorSpec, ScriptError> {
        let token = self.next_token().unwrap_or(default);
        parse_color(token, palette, self.ctx)
    }

    pub fn string(&mut self, default: &str) -> String {
        self.next_token().unwrap_or(default).to_string()
    }

    /// Reject anything left over.
    pub fn finish(&self) -> Result<(), ScriptError> {
        match self.args.get(self.pos) {
            None => Ok(()),
            Some(extra) => Err(self
                .ctx
                .argument(format!("unexpected extra argument '{extra}'"), Some(extra.as_str()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::palette::ColorTable;
    use crate::scene::{BoxShape, CellConfig, Shape};

    fn ctx() -> LineContext<'static> {
        LineContext::new("<test>", 1, "test line")
    }

    fn scene(names: &[(&str, f64, f64)]) -> Cell {
        let mut cell = Cell::new(CellConfig::headless());
        for &(name, x, y) in names {
            let shape = Shape::from(BoxShape { size: DVec2::ONE });
            let entity = cell.new_entity(Some(name.into()), dvec2(x, y), shape);
            cell.add(entity);
        }
        cell
    }

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn numbers() {
        assert_eq!(parse_number("10"), Some(10.0));
        assert_eq!(parse_number("-.5"), Some(-0.5));
        assert_eq!(parse_number("+1e3"), Some(1000.0));
        assert_eq!(parse_number("0xff"), Some(255.0));
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("b1"), None);
        assert_eq!(parse_number("1.2.3"), None);
        assert_eq!(parse_number("e5"), None);
    }

    #[test]
    fn regex_expands_in_creation_order() {
        let cell = scene(&[("v1", 0.0, 0.0), ("w1", 0.0, 0.0), ("v2", 0.0, 0.0)]);
        let found = expand_name(&cell, "/^v/", NameMode::EXISTING, &ctx()).unwrap();
        assert_eq!(found, vec!["v1", "v2"]);

        let err = expand_name(&cell, "/^x/", NameMode::EXISTING, &ctx()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Reference);
        let none = expand_name(&cell, "/^x/", NameMode::NOMATCH, &ctx()).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn literal_names() {
        let mut cell = scene(&[("a", 0.0, 0.0)]);
        assert_eq!(expand_name(&cell, "a", NameMode::EXISTING, &ctx()).unwrap(), vec!["a"]);
        assert_eq!(expand_name(&cell, "12", NameMode::EXISTING, &ctx()).unwrap(), vec!["12"]);
        assert_eq!(expand_name(&cell, "new", NameMode::CREATE, &ctx()).unwrap(), vec!["new"]);
        assert!(expand_name(&cell, "-", NameMode::EXISTING, &ctx()).unwrap().is_empty());
        assert_eq!(
            expand_name(&cell, "nope", NameMode::EXISTING, &ctx()).unwrap_err().kind(),
            ErrorKind::Reference
        );
        assert!(expand_name(&cell, "--", NameMode::EXISTING, &ctx()).is_err());
        cell.set_last_name("a");
        assert_eq!(expand_name(&cell, "--", NameMode::EXISTING, &ctx()).unwrap(), vec!["a"]);
    }

    #[test]
    fn bad_regex_is_a_syntax_error() {
        let cell = scene(&[]);
        let err = expand_name(&cell, "/(/", NameMode::EXISTING, &ctx()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
    }

    #[test]
    fn relative_and_absolute_positions() {
        let cell = scene(&[]);
        assert_eq!(expand_numeric_position(&cell, 0.5, 0.5), dvec2(400.0, 300.0));
        assert_eq!(expand_numeric_position(&cell, 50.0, 50.0), dvec2(50.0, 50.0));
        assert_eq!(expand_numeric_position(&cell, 0.25, 245.0), dvec2(200.0, 245.0));
        assert_eq!(expand_numeric_position(&cell, -1.0, 1.0), dvec2(-800.0, 600.0));
    }

    #[test]
    fn object_references_with_offsets() {
        let cell = scene(&[("term2", 100.0, 100.0)]);
        let c = ctx();
        assert_eq!(expand_position(&cell, "term2", None, &c).unwrap(), dvec2(100.0, 100.0));
        assert_eq!(expand_position(&cell, "term2+10-20", None, &c).unwrap(), dvec2(110.0, 80.0));
        assert_eq!(expand_position(&cell, "term2+.1-.2", None, &c).unwrap(), dvec2(180.0, -20.0));
        assert_eq!(expand_position(&cell, "12", Some("34"), &c).unwrap(), dvec2(12.0, 34.0));
        assert_eq!(
            expand_position(&cell, "ghost+1+1", None, &c).unwrap_err().kind(),
            ErrorKind::Reference
        );
        assert_eq!(
            expand_position(&cell, "10", Some("x"), &c).unwrap_err().kind(),
            ErrorKind::Syntax
        );
    }

    #[test]
    fn offset_reference_shapes() {
        assert_eq!(split_offset_reference("a+1-2"), Some(("a", 1.0, -2.0)));
        assert_eq!(split_offset_reference("node_3-.5+.5"), Some(("node_3", -0.5, 0.5)));
        assert_eq!(split_offset_reference("a+1"), None);
        assert_eq!(split_offset_reference("a"), None);
        assert_eq!(split_offset_reference("+1+1"), None);
        assert_eq!(split_offset_reference("a+x+1"), None);
        assert_eq!(split_offset_reference("a\u{20ac}"), None);
        assert_eq!(split_offset_reference("b\u{2192}1+1"), None);
        assert_eq!(split_offset_reference("nod\u{e9}+1+1"), Some(("nod\u{e9}", 1.0, 1.0)));
    }

    #[test]
    fn palette_arguments() {
        let c = ctx();
        assert_eq!(
            expand_palette(&strings(&["0xff8000ff"]), &c).unwrap(),
            Rgba::new(255, 128, 0, 255)
        );
        assert_eq!(
            expand_palette(&strings(&["255", "0", "0"]), &c).unwrap(),
            Rgba::new(255, 0, 0, 255)
        );
        assert_eq!(
            expand_palette(&strings(&["1", ".5", "0", ".5"]), &c).unwrap(),
            Rgba::new(255, 128, 0, 128)
        );
        assert!(expand_palette(&strings(&["1", "2"]), &c).is_err());
    }

    #[test]
    fn colours() {
        let palette = ColorTable::default();
        let c = ctx();
        assert_eq!(
            parse_color("cyan", &palette, &c).unwrap(),
            ColorSpec::Named("cyan".into())
        );
        assert_eq!(
            parse_color("#ff0000", &palette, &c).unwrap(),
            ColorSpec::Literal(Rgba::new(255, 0, 0, 255))
        );
        assert_eq!(
            parse_color("#00ff0080", &palette, &c).unwrap(),
            ColorSpec::Literal(Rgba::new(0, 255, 0, 128))
        );
        assert_eq!(
            parse_color("0,0,255", &palette, &c).unwrap(),
            ColorSpec::Literal(Rgba::new(0, 0, 255, 255))
        );
        assert_eq!(
            parse_color("4294967295", &palette, &c).unwrap(),
            ColorSpec::Literal(Rgba::new(255, 255, 255, 255))
        );
        assert_eq!(
            parse_color("mauve", &palette, &c).unwrap_err().kind(),
            ErrorKind::Reference
        );
        assert_eq!(
            parse_color("#12345", &palette, &c).unwrap_err().kind(),
            ErrorKind::Syntax
        );
    }

    #[test]
    fn cursor_defaults_and_extras() {
        let cell = scene(&[("a", 10.0, 20.0)]);
        let c = ctx();
        let args = strings(&["20"]);
        let mut cur = ArgCursor::new(&args, &c);
        assert_eq!(cur.pair(&cell, (10.0, 10.0)).unwrap(), dvec2(20.0, 10.0));
        assert!(cur.finish().is_ok());

        let args = strings(&["a", "0.5", "0.5", "extra"]);
        let mut cur = ArgCursor::new(&args, &c);
        assert_eq!(cur.position(&cell, (0.5, 0.5)).unwrap(), dvec2(10.0, 20.0));
        assert_eq!(cur.position(&cell, (0.0, 0.0)).unwrap(), dvec2(400.0, 300.0));
        assert_eq!(cur.finish().unwrap_err().kind(), ErrorKind::Argument);
    }
}
