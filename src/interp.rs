//! Script interpreter
//!
//! [`Interpreter`] feeds each line through the lexer (or the strict grammar),
//! resolves patterns and geometry against its [`Cell`], and drives the
//! renderer on `display`, `wait` and `play`.
//!
//! Every statement yields its own `Result`. With [`ErrorPolicy::Abort`] (the
//! default) a script stops at the first failure; with
//! [`ErrorPolicy::Continue`] failures are logged and collected in the
//! [`RunSummary`].

use crate::ast::{Pattern, ShapeKind, Statement, Verb};
use crate::errors::{ErrorKind, LineContext, ScriptError};
use crate::factory::{Factory, find_asset};
use crate::lexer::{self, LexError};
use crate::log::{debug, warn};
use crate::options::parse_options;
use crate::palette::{ColorTable, Palette};
use crate::parse;
use crate::render::{NullRenderer, Renderer};
use crate::resolve::{
    ArgCursor, NameMode, expand_name, expand_names, expand_numeric_position, expand_palette,
    expand_position, parse_color, parse_number,
};
use crate::scene::defaults::SPRING_MARGIN;
use crate::scene::{Cell, CellConfig, GraphvizLayout, LayoutEngine, SceneEntity};
use crate::types::Angle;
use std::path::PathBuf;
use std::time::Duration;

/// Command summary printed by hosts on request.
pub const HELP: &str = "\
alpha (name|regexp) alpha
animate (name|regexp) (x y|name[(+|-)dx(+|-)dy])
attach (name|regexp) parent [dx dy]
color (name|regexp) color
define name bitmap file [(x y|name[(+|-)dx(+|-)dy])]
define name box [-f color] [width height [color [(x y|name[(+|-)dx(+|-)dy])]]]
define name ellipse [-f color] [rx ry [color [(x y|name[(+|-)dx(+|-)dy])]]]
define name line [-ht] [start [end [width [color]]]]
define name link src dst [width [color]]
define name polygon [-f color] [-r degree] [n [r [color [(x y|name[(+|-)dx(+|-)dy])]]]]
define name spline [-ht] [start [control [end [width [color]]]]]
define name text [-lcr] [string [size [color [(x y|name[(+|-)dx(+|-)dy])]]]]
define name wire [-ht] [start [end [width [color]]]]
display
fade (name|regexp)...
fix (name|regexp)...
hide (name|regexp)...
kill (name|regexp)...
move (name|regexp) (x y|name[(+|-)dx(+|-)dy])
palette name (r g b [a]|0xRRGGBBAA)
play file
priority (name|regexp) level
resize (name|regexp) (width height|name)
scale (name|regexp) ratio
shift (name|regexp) dx dy
sleep seconds
spring [-f command] [-r degree] (name|regexp)... [x1 y1 x2 y2]
unhide (name|regexp)...
wait

Coordinates in [-1, 1] are fractions of the canvas; `-` names nothing,
`--` names the last referenced object.
";

/// What to do when a statement fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Stop at the first failing statement.
    #[default]
    Abort,
    /// Log the failure and carry on with the next statement.
    Continue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterpreterConfig {
    pub error_policy: ErrorPolicy,
    /// Directories searched for bitmaps and sounds not found as given
    pub asset_dirs: Vec<PathBuf>,
    /// Route lines through the strict grammar instead of prefix dispatch
    pub strict: bool,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            error_policy: ErrorPolicy::default(),
            asset_dirs: vec![PathBuf::from("figure")],
            strict: false,
        }
    }
}

/// Outcome of [`Interpreter::run_script`]
#[derive(Debug, Default)]
pub struct RunSummary {
    pub lines: usize,
    /// Statements that executed successfully
    pub statements: usize,
    /// Failures skipped under [`ErrorPolicy::Continue`]
    pub errors: Vec<ScriptError>,
}

impl RunSummary {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Executes script lines against one scene
pub struct Interpreter<R: Renderer = NullRenderer> {
    cell: Cell,
    renderer: R,
    palette: Box<dyn Palette>,
    layout: Box<dyn LayoutEngine>,
    config: InterpreterConfig,
    source_name: String,
    lineno: usize,
}

impl Default for Interpreter<NullRenderer> {
    fn default() -> Self {
        Self::new(NullRenderer)
    }
}

impl<R: Renderer> Interpreter<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            cell: Cell::default(),
            renderer,
            palette: Box::new(ColorTable::default()),
            layout: Box::new(GraphvizLayout::default()),
            config: InterpreterConfig::default(),
            source_name: "<script>".to_string(),
            lineno: 0,
        }
    }

    pub fn with_cell_config(mut self, config: CellConfig) -> Self {
        self.cell = Cell::new(config);
        self
    }

    pub fn with_config(mut self, config: InterpreterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_palette(mut self, palette: impl Palette + 'static) -> Self {
        self.palette = Box::new(palette);
        self
    }

    pub fn with_layout(mut self, layout: impl LayoutEngine + 'static) -> Self {
        self.layout = Box::new(layout);
        self
    }

    /// Name shown in diagnostics, usually the script path.
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = name.into();
        self
    }

    pub fn cell(&self) -> &Cell {
        &self.cell
    }

    pub fn cell_mut(&mut self) -> &mut Cell {
        &mut self.cell
    }

    pub fn into_cell(self) -> Cell {
        self.cell
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn palette(&self) -> &dyn Palette {
        self.palette.as_ref()
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Number of lines consumed so far
    pub fn lineno(&self) -> usize {
        self.lineno
    }

    /// Run a whole script, line by line.
    pub fn run_script(&mut self, source: &str) -> Result<RunSummary, ScriptError> {
        let mut summary = RunSummary::default();
        for line in source.lines() {
            summary.lines += 1;
            for result in self.run_line(line) {
                match result {
                    Ok(()) => summary.statements += 1,
                    Err(err) => match self.config.error_policy {
                        ErrorPolicy::Abort => return Err(err),
                        ErrorPolicy::Continue => {
                            warn!(line = err.line(), error = %err, "statement failed, continuing");
                            summary.errors.push(err);
                        }
                    },
                }
            }
        }
        Ok(summary)
    }

    /// Run one script line and return one result per statement.
    ///
    /// Under [`ErrorPolicy::Abort`] the statements after a failure are not
    /// executed and the failure is the last element.
    pub fn run_line(&mut self, line: &str) -> Vec<Result<(), ScriptError>> {
        self.lineno += 1;
        let name = self.source_name.clone();
        let ctx = LineContext::new(&name, self.lineno, line);

        let statements = if self.config.strict {
            parse::parse_line(line, &ctx)
        } else {
            lexer::lex_line(line, self.lineno).map_err(|e| lex_error(&ctx, e))
        };
        let statements = match statements {
            Ok(statements) => statements,
            Err(err) => return vec![Err(err)],
        };

        let mut results = Vec::with_capacity(statements.len());
        for stmt in &statements {
            let result = self.execute(stmt, &ctx);
            let failed = result.is_err();
            results.push(result);
            if failed && self.config.error_policy == ErrorPolicy::Abort {
                break;
            }
        }
        results
    }

    /// Execute a single statement.
    pub fn execute(&mut self, stmt: &Statement, ctx: &LineContext<'_>) -> Result<(), ScriptError> {
        debug!(line = stmt.line, verb = %stmt.verb, args = ?stmt.args, "executing");
        let args = stmt.args.as_slice();
        match stmt.verb {
            Verb::Alpha => self.alpha(args, ctx)?,
            Verb::Animate => self.animate(args, ctx)?,
            Verb::Attach => self.attach(args, ctx)?,
            Verb::Color => self.color(args, ctx)?,
            Verb::Define => {
                let created = self.define(args, ctx)?;
                self.cell.set_last_name(&created);
                return Ok(());
            }
            Verb::Display => {
                no_arguments(args, ctx)?;
                self.cell.display(&mut self.renderer);
            }
            Verb::Fade => self.flag(args, ctx, |e| e.fade_out = true)?,
            Verb::Fix => self.flag(args, ctx, |e| e.fixed = true)?,
            Verb::Hide => self.flag(args, ctx, |e| e.visible = false)?,
            Verb::Unhide => self.flag(args, ctx, |e| e.visible = true)?,
            Verb::Kill => self.kill(args, ctx)?,
            Verb::Move => self.move_to(args, ctx)?,
            Verb::Palette => self.define_palette(args, ctx)?,
            Verb::Play => self.play(args, ctx)?,
            Verb::Priority => self.priority(args, ctx)?,
            Verb::Resize => self.resize(args, ctx)?,
            Verb::Scale => self.scale(args, ctx)?,
            Verb::Shift => self.shift(args, ctx)?,
            Verb::Sleep => self.sleep(args, ctx)?,
            Verb::Spring => self.spring(args, ctx)?,
            Verb::Wait => {
                no_arguments(args, ctx)?;
                self.renderer.wait();
            }
        }
        if let Some(first) = args.first() {
            if self.cell.contains(first) {
                self.cell.set_last_name(first);
            }
        }
        Ok(())
    }

    fn names(&self, token: &str, ctx: &LineContext<'_>) -> Result<Vec<String>, ScriptError> {
        expand_name(&self.cell, token, NameMode::EXISTING, ctx)
    }

    /// Apply `f` to each named entity, failing on the first missing one.
    fn each(
        &mut self,
        names: &[String],
        ctx: &LineContext<'_>,
        mut f: impl FnMut(&mut SceneEntity),
    ) -> Result<(), ScriptError> {
        for name in names {
            let entity = self.cell.lookup_mut(name).map_err(|e| ctx.scene(e))?;
            f(entity);
        }
        Ok(())
    }

    fn alpha(&mut self, args: &[String], ctx: &LineContext<'_>) -> Result<(), ScriptError> {
        let [pattern, value] = args else {
            return Err(arity(ctx, "alpha (name|regexp) alpha"));
        };
        let alpha = number(value, ctx)?.clamp(0.0, 1.0);
        let names = self.names(pattern, ctx)?;
        self.each(&names, ctx, |e| e.alpha = alpha)
    }

    fn animate(&mut self, args: &[String], ctx: &LineContext<'_>) -> Result<(), ScriptError> {
        let mut cur = ArgCursor::new(args, ctx);
        let pattern = cur.required("object name")?;
        let goal = cur.required_position(&self.cell, "goal position")?;
        cur.finish()?;
        for name in self.names(pattern, ctx)? {
            self.cell.animate(&name, goal).map_err(|e| ctx.scene(e))?;
        }
        Ok(())
    }

    fn attach(&mut self, args: &[String], ctx: &LineContext<'_>) -> Result<(), ScriptError> {
        let mut cur = ArgCursor::new(args, ctx);
        let pattern = cur.required("object name")?;
        let parent = cur.required("parent name")?;
        let offset = cur.pair(&self.cell, (0.0, 0.0))?;
        cur.finish()?;
        self.cell.id_of(parent).map_err(|e| ctx.scene(e))?;
        for name in self.names(pattern, ctx)? {
            self.cell
                .attach(&name, parent, offset)
                .map_err(|e| ctx.scene(e))?;
        }
        Ok(())
    }

    fn color(&mut self, args: &[String], ctx: &LineContext<'_>) -> Result<(), ScriptError> {
        let [pattern, color] = args else {
            return Err(arity(ctx, "color (name|regexp) color"));
        };
        let color = parse_color(color, self.palette.as_ref(), ctx)?;
        let names = self.names(pattern, ctx)?;
        self.each(&names, ctx, |e| e.color = color.clone())
    }

    /// Returns the name of the created entity.
    fn define(&mut self, args: &[String], ctx: &LineContext<'_>) -> Result<String, ScriptError> {
        let [name, kind, rest @ ..] = args else {
            return Err(arity(ctx, "define name type [options] [arguments]"));
        };
        let name = match Pattern::parse(name) {
            Pattern::Nothing => None,
            _ => {
                let found = expand_name(&self.cell, name, NameMode::CREATE, ctx)?;
                let first = found.into_iter().next().ok_or_else(|| {
                    ctx.reference(format!("'{name}' does not name an object"), name)
                })?;
                Some(first)
            }
        };
        let kind = ShapeKind::from_prefix(kind)
            .ok_or_else(|| ctx.syntax(format!("unknown object type '{kind}'"), kind))?;
        let mut factory = Factory {
            cell: &mut self.cell,
            palette: self.palette.as_ref(),
            asset_dirs: &self.config.asset_dirs,
            ctx,
        };
        let id = factory.define(kind, name, rest)?;
        Ok(self
            .cell
            .entity(id)
            .map(|e| e.name.clone())
            .unwrap_or_default())
    }

    fn flag(
        &mut self,
        args: &[String],
        ctx: &LineContext<'_>,
        f: impl FnMut(&mut SceneEntity),
    ) -> Result<(), ScriptError> {
        if args.is_empty() {
            return Err(ctx.argument("missing object name", None));
        }
        let names = expand_names(&self.cell, args, NameMode::EXISTING, ctx)?;
        self.each(&names, ctx, f)
    }

    fn kill(&mut self, args: &[String], ctx: &LineContext<'_>) -> Result<(), ScriptError> {
        if args.is_empty() {
            return Err(ctx.argument("missing object name", None));
        }
        let mut names = expand_names(&self.cell, args, NameMode::NOMATCH, ctx)?;
        let mut seen = std::collections::HashSet::new();
        names.retain(|n| seen.insert(n.clone()));
        for name in names {
            self.cell.delete(&name).map_err(|e| ctx.scene(e))?;
        }
        Ok(())
    }

    fn move_to(&mut self, args: &[String], ctx: &LineContext<'_>) -> Result<(), ScriptError> {
        let mut cur = ArgCursor::new(args, ctx);
        let pattern = cur.required("object name")?;
        let pos = cur.required_position(&self.cell, "position")?;
        cur.finish()?;
        for name in self.names(pattern, ctx)? {
            self.cell.move_to(&name, pos).map_err(|e| ctx.scene(e))?;
        }
        Ok(())
    }

    fn define_palette(&mut self, args: &[String], ctx: &LineContext<'_>) -> Result<(), ScriptError> {
        let [name, values @ ..] = args else {
            return Err(arity(ctx, "palette name (r g b [a]|0xRRGGBBAA)"));
        };
        let rgba = expand_palette(values, ctx)?;
        self.palette.define_color(name, rgba);
        Ok(())
    }

    fn play(&mut self, args: &[String], ctx: &LineContext<'_>) -> Result<(), ScriptError> {
        let [file] = args else {
            return Err(arity(ctx, "play file"));
        };
        let path = find_asset(file, &self.config.asset_dirs)
            .ok_or_else(|| ctx.resource(format!("play: '{file}' not found"), file))?;
        self.renderer.play(&path);
        Ok(())
    }

    fn priority(&mut self, args: &[String], ctx: &LineContext<'_>) -> Result<(), ScriptError> {
        let [pattern, level] = args else {
            return Err(arity(ctx, "priority (name|regexp) level"));
        };
        let level = number(level, ctx)?;
        let names = self.names(pattern, ctx)?;
        self.each(&names, ctx, |e| e.priority = level)
    }

    fn resize(&mut self, args: &[String], ctx: &LineContext<'_>) -> Result<(), ScriptError> {
        let mut cur = ArgCursor::new(args, ctx);
        let pattern = cur.required("object name")?;
        let size = cur.required_position(&self.cell, "size")?;
        cur.finish()?;
        for name in self.names(pattern, ctx)? {
            self.cell.resize(&name, size).map_err(|e| ctx.scene(e))?;
        }
        Ok(())
    }

    fn scale(&mut self, args: &[String], ctx: &LineContext<'_>) -> Result<(), ScriptError> {
        let [pattern, ratio] = args else {
            return Err(arity(ctx, "scale (name|regexp) ratio"));
        };
        let ratio = number(ratio, ctx)?;
        let names = self.names(pattern, ctx)?;
        self.each(&names, ctx, |e| e.scale = ratio)
    }

    fn shift(&mut self, args: &[String], ctx: &LineContext<'_>) -> Result<(), ScriptError> {
        let [pattern, dx, dy] = args else {
            return Err(arity(ctx, "shift (name|regexp) dx dy"));
        };
        let delta = expand_numeric_position(&self.cell, number(dx, ctx)?, number(dy, ctx)?);
        for name in self.names(pattern, ctx)? {
            self.cell.shift(&name, delta).map_err(|e| ctx.scene(e))?;
        }
        Ok(())
    }

    fn sleep(&mut self, args: &[String], ctx: &LineContext<'_>) -> Result<(), ScriptError> {
        let [token] = args else {
            return Err(arity(ctx, "sleep seconds"));
        };
        let secs = number(token, ctx)?;
        let pause = Duration::try_from_secs_f64(secs).map_err(|e| {
            ctx.argument(format!("cannot sleep for {secs} seconds: {e}"), Some(token))
        })?;
        std::thread::sleep(pause);
        Ok(())
    }

    fn spring(&mut self, args: &[String], ctx: &LineContext<'_>) -> Result<(), ScriptError> {
        let (opts, rest) = parse_options("f:r:", args)
            .map_err(|e| ctx.argument(e.to_string(), args.first().map(String::as_str)))?;
        let rotation = match opts.value('r') {
            Some(r) => Angle(number(r, ctx)?),
            None => Angle::ZERO,
        };
        let mut names = expand_names(&self.cell, &rest, NameMode::EXISTING, ctx)?;

        let mut from = expand_numeric_position(&self.cell, SPRING_MARGIN, SPRING_MARGIN);
        let mut to = expand_numeric_position(&self.cell, 1.0 - SPRING_MARGIN, 1.0 - SPRING_MARGIN);
        let n = names.len();
        let is_num = |s: &String| parse_number(s).is_some();
        if n > 4 && is_num(&names[n - 3]) && is_num(&names[n - 1]) {
            let region = names.split_off(n - 4);
            from = expand_position(&self.cell, &region[0], Some(&region[1]), ctx)?;
            to = expand_position(&self.cell, &region[2], Some(&region[3]), ctx)?;
        }

        let custom;
        let engine: &dyn LayoutEngine = match opts.value('f') {
            Some(command) => {
                custom = GraphvizLayout::new(command);
                &custom
            }
            None => self.layout.as_ref(),
        };
        self.cell
            .spring(from, to, &names, rotation, engine)
            .map_err(|e| ctx.layout(e))
    }
}

fn number(token: &str, ctx: &LineContext<'_>) -> Result<f64, ScriptError> {
    parse_number(token).ok_or_else(|| ctx.syntax(format!("invalid number '{token}'"), token))
}

fn arity(ctx: &LineContext<'_>, usage: &str) -> ScriptError {
    ctx.argument(format!("wrong number of arguments, usage: {usage}"), None)
}

fn no_arguments(args: &[String], ctx: &LineContext<'_>) -> Result<(), ScriptError> {
    match args.first() {
        None => Ok(()),
        Some(extra) => Err(ctx.argument(
            format!("unexpected extra argument '{extra}'"),
            Some(extra.as_str()),
        )),
    }
}

fn lex_error(ctx: &LineContext<'_>, err: LexError) -> ScriptError {
    let message = err.to_string();
    match err {
        LexError::UnterminatedQuote { column } => {
            ctx.error_at(ErrorKind::Syntax, message, column.saturating_sub(1), 1)
        }
        LexError::UnknownVerb { word } | LexError::AmbiguousVerb { word, .. } => {
            let token = ctx
                .text
                .split_whitespace()
                .find(|t| t.eq_ignore_ascii_case(&word))
                .unwrap_or(&word)
                .to_string();
            ctx.syntax(message, &token)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingRenderer;
    use crate::scene::{CircularLayout, Shape};
    use glam::dvec2;

    fn interp() -> Interpreter<RecordingRenderer> {
        Interpreter::new(RecordingRenderer::new())
            .with_cell_config(CellConfig::headless())
            .with_layout(CircularLayout)
    }

    fn run(src: &str) -> Interpreter<RecordingRenderer> {
        let mut it = interp();
        it.run_script(src).unwrap();
        it
    }

    fn fail(src: &str) -> ScriptError {
        interp().run_script(src).unwrap_err()
    }

    #[test]
    fn define_and_move() {
        let it = run("define b1 box 20 20 red 0.5 0.5\nmove b1 10 10");
        assert_eq!(it.cell().position("b1"), Some(dvec2(10.0, 10.0)));
        assert_eq!(it.cell().last_name(), Some("b1"));
    }

    #[test]
    fn abbreviated_verbs_and_compound_lines() {
        let it = run("def a bo; def b ell 5 5 ; m -- 0.25 0.75");
        assert_eq!(it.cell().position("b"), Some(dvec2(200.0, 450.0)));
        assert_eq!(it.cell().position("a"), Some(dvec2(400.0, 300.0)));
    }

    #[test]
    fn auto_named_define_becomes_last_name() {
        let it = run("define - box\ncolor -- cyan");
        let name = it.cell().names().next().unwrap().to_string();
        assert!(name.starts_with("_box"));
        assert_eq!(it.cell().last_name(), Some(name.as_str()));
    }

    #[test]
    fn errors_carry_line_and_kind() {
        let err = fail("define a box\n\nmove ghost 1 1");
        assert_eq!(err.kind(), ErrorKind::Reference);
        assert_eq!(err.line(), 3);
        assert_eq!(err.text(), "move ghost 1 1");

        assert_eq!(fail("zap a").kind(), ErrorKind::Syntax);
        assert_eq!(fail("s a").kind(), ErrorKind::Syntax);
        assert_eq!(fail("define a blob").kind(), ErrorKind::Syntax);
        assert_eq!(fail("define a box\ncolor a").kind(), ErrorKind::Argument);
        assert_eq!(fail("define a box -q").kind(), ErrorKind::Argument);
        assert_eq!(fail("define a box\ncolor a nocolor").kind(), ErrorKind::Reference);
        assert_eq!(fail("play missing.wav").kind(), ErrorKind::Resource);
        assert_eq!(fail("define a box\nmove a 10").kind(), ErrorKind::Argument);
        assert_eq!(fail("define a box\nmove a 10 x").kind(), ErrorKind::Syntax);
        assert_eq!(fail("display now").kind(), ErrorKind::Argument);
        assert_eq!(fail("define a box\nmove a a\u{20ac}").kind(), ErrorKind::Reference);
    }

    #[test]
    fn sleep_rejects_unrepresentable_durations() {
        for secs in ["-1", "1e300"] {
            let err = fail(&format!("sleep {secs}"));
            assert_eq!(err.kind(), ErrorKind::Argument, "{secs}");
            assert!(err.message().starts_with("cannot sleep"), "{secs}");
        }
        assert!(interp().run_script("sleep 0").is_ok());
    }

    #[test]
    fn abort_stops_the_rest_of_the_line() {
        let mut it = interp();
        let results = it.run_line("define a box; move nope 1 1; define b box");
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(!it.cell().contains("b"));
    }

    #[test]
    fn continue_policy_collects_failures() {
        let mut it = interp().with_config(InterpreterConfig {
            error_policy: ErrorPolicy::Continue,
            ..InterpreterConfig::default()
        });
        let summary = it
            .run_script("define a box\nmove nope 1 1\ndefine b box; hide zzz; hide b")
            .unwrap();
        assert_eq!(summary.lines, 3);
        assert_eq!(summary.statements, 3);
        assert_eq!(summary.errors.len(), 2);
        assert_eq!(summary.errors[0].line(), 2);
        assert!(!it.cell().get("b").unwrap().visible);
    }

    #[test]
    fn attach_and_move_parent() {
        let it = run("define p box 10 10 white 100 100\ndefine c box\nattach c p 5 5\nmove p 200 200");
        assert_eq!(it.cell().position("c"), Some(dvec2(205.0, 205.0)));
        let err = fail("define p box\ndefine c box\nattach c p\nmove c 1 1");
        assert_eq!(err.kind(), ErrorKind::Argument);
        assert!(err.message().contains("cannot move attached object"));
    }

    #[test]
    fn regex_patterns_touch_every_match() {
        let it = run("define v1 box\ndefine v2 box\ndefine w1 box\nhide /^v/\nalpha /1$/ 0.5");
        let cell = it.cell();
        assert!(!cell.get("v1").unwrap().visible);
        assert!(!cell.get("v2").unwrap().visible);
        assert!(cell.get("w1").unwrap().visible);
        assert_eq!(cell.get("w1").unwrap().alpha, 0.5);
        assert_eq!(cell.get("v2").unwrap().alpha, 1.0);
    }

    #[test]
    fn kill_tolerates_empty_regex() {
        let it = run("define a box\nkill /^zz/\nkill /a/ a");
        assert!(it.cell().is_empty());
    }

    #[test]
    fn animate_then_display_settles_at_goal() {
        let it = run("define a box 10 10 white 0 0\nanimate a 300 400\ndisplay");
        let pos = it.cell().position("a").unwrap();
        assert!((pos - dvec2(300.0, 400.0)).abs().max_element() < 500.0 / 30.0);
        assert!(!it.cell().get("a").unwrap().is_animating());
        assert!(it.renderer().frames.len() <= 31);
    }

    #[test]
    fn fade_then_display_removes() {
        let it = run("define a box\nfade a\ndisplay");
        assert!(!it.cell().contains("a"));
        assert_eq!(it.renderer().frames.len(), 31);
    }

    #[test]
    fn palette_defines_new_colour_names() {
        let it = run("palette brand 0xff8000ff\ndefine a box 10 10 brand");
        assert!(it.palette().contains("brand"));
    }

    #[test]
    fn shift_resize_priority_scale() {
        let it = run(
            "define a box 10 10 white 100 100\nshift a 10 -10\nresize a 30 40\npriority a 5\nscale a 2",
        );
        let a = it.cell().get("a").unwrap();
        assert_eq!(a.pos, dvec2(110.0, 90.0));
        assert_eq!(a.shape, Shape::from(crate::scene::BoxShape { size: dvec2(30.0, 40.0) }));
        assert_eq!(a.priority, 5.0);
        assert_eq!(a.scale, 2.0);
    }

    #[test]
    fn spring_with_region_and_rotation() {
        let it = run("define a box\ndefine b box\ndefine l link a b\nspring -r 90 /./ 100 100 300 100");
        // a and b end up on the horizontal segment; the link is not laid out
        let a = it.cell().position("a").unwrap();
        let b = it.cell().position("b").unwrap();
        assert_eq!(a.y, 100.0);
        assert_eq!(b.y, 100.0);
        assert_eq!(a.x.min(b.x), 100.0);
        assert_eq!(a.x.max(b.x), 300.0);
    }

    #[test]
    fn wait_and_play_reach_the_renderer() {
        let dir = std::env::temp_dir().join(format!("cellx-play-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("ding.wav"), b"RIFF").unwrap();
        let mut it = interp().with_config(InterpreterConfig {
            asset_dirs: vec![dir.clone()],
            ..InterpreterConfig::default()
        });
        it.run_script("wait\nplay ding.wav").unwrap();
        assert_eq!(it.renderer().waits, 1);
        assert_eq!(it.renderer().played, vec![dir.join("ding.wav")]);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn help_mentions_every_verb() {
        for (verb, _) in crate::lexer::VERB_TABLE {
            assert!(HELP.contains(verb.name()), "{verb} missing from HELP");
        }
    }
}
