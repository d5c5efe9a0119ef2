//! `define`: the nine shape constructors
//!
//! Every constructor follows the same steps: parse the type's options, walk
//! the positional slots against their defaults, validate colours against the
//! palette, then register the entity (replacing any same-named one).

use crate::ast::{Align, ColorSpec, ShapeKind};
use crate::errors::{LineContext, ScriptError};
use crate::options::{Options, parse_options};
use crate::palette::Palette;
use crate::resolve::{ArgCursor, parse_color, parse_number};
use crate::scene::defaults::{self, ARROWHEAD_SCALE};
use crate::scene::{
    BitmapShape, BoxShape, Cell, EllipseShape, EntityId, LineShape, LinkShape, PolygonShape,
    Shape, SplineShape, TextShape, WireShape,
};
use crate::types::Angle;
use glam::{DVec2, dvec2};
use std::path::{Path, PathBuf};

/// Option template accepted by each shape type.
pub fn option_template(kind: ShapeKind) -> &'static str {
    match kind {
        ShapeKind::Bitmap | ShapeKind::Link => "",
        ShapeKind::Box | ShapeKind::Ellipse => "f:",
        ShapeKind::Line | ShapeKind::Spline | ShapeKind::Wire => "ht",
        ShapeKind::Polygon => "r:f:",
        ShapeKind::Text => "lcr",
    }
}

/// Everything a constructor needs besides its arguments.
pub struct Factory<'a> {
    pub cell: &'a mut Cell,
    pub palette: &'a dyn Palette,
    pub asset_dirs: &'a [PathBuf],
    pub ctx: &'a LineContext<'a>,
}

impl Factory<'_> {
    /// Build and register a `kind` entity from raw `define` arguments.
    ///
    /// `name` of `None` requests an auto-generated name. Returns the id of
    /// the main entity (arrowheads are registered separately).
    pub fn define(
        &mut self,
        kind: ShapeKind,
        name: Option<String>,
        args: &[String],
    ) -> Result<EntityId, ScriptError> {
        let (opts, rest) = parse_options(option_template(kind), args)
            .map_err(|e| self.ctx.argument(e.to_string(), args.first().map(String::as_str)))?;
        let ctx = self.ctx;
        let mut cur = ArgCursor::new(&rest, ctx);
        match kind {
            ShapeKind::Bitmap => self.bitmap(name, &mut cur),
            ShapeKind::Box => self.boxed(name, &mut cur, &opts),
            ShapeKind::Ellipse => self.ellipse(name, &mut cur, &opts),
            ShapeKind::Line => self.line(name, &mut cur, &opts),
            ShapeKind::Link => self.link(name, &mut cur),
            ShapeKind::Polygon => self.polygon(name, &mut cur, &opts),
            ShapeKind::Spline => self.spline(name, &mut cur, &opts),
            ShapeKind::Text => self.text(name, &mut cur, &opts),
            ShapeKind::Wire => self.wire(name, &mut cur, &opts),
        }
    }

    fn register(
        &mut self,
        name: Option<String>,
        pos: DVec2,
        shape: Shape,
        color: ColorSpec,
        frame_color: Option<ColorSpec>,
    ) -> EntityId {
        let entity = self
            .cell
            .new_entity(name, pos, shape)
            .with_color(color)
            .with_frame_color(frame_color);
        self.cell.add(entity)
    }

    fn frame_color(&self, opts: &Options) -> Result<Option<ColorSpec>, ScriptError> {
        opts.value('f')
            .map(|c| parse_color(c, self.palette, self.ctx))
            .transpose()
    }

    /// Find `file` as given, then under each asset directory.
    fn locate_asset(&self, file: &str) -> Result<PathBuf, ScriptError> {
        find_asset(file, self.asset_dirs)
            .ok_or_else(|| self.ctx.resource(format!("'{file}' not found"), file))
    }

    fn bitmap(
        &mut self,
        name: Option<String>,
        cur: &mut ArgCursor<'_>,
    ) -> Result<EntityId, ScriptError> {
        let file = cur.required("bitmap file")?;
        let file = self.locate_asset(file)?;
        let pos = cur.position(self.cell, defaults::CENTER)?;
        let shape = Shape::from(BitmapShape { file, size: None });
        let color = ColorSpec::Named(defaults::COLOR.to_string());
        cur.finish()?;
        Ok(self.register(name, pos, shape, color, None))
    }

    fn boxed(
        &mut self,
        name: Option<String>,
        cur: &mut ArgCursor<'_>,
        opts: &Options,
    ) -> Result<EntityId, ScriptError> {
        let size = cur.pair(self.cell, defaults::BOX_SIZE)?;
        let color = cur.color(defaults::COLOR, self.palette)?;
        let pos = cur.position(self.cell, defaults::CENTER)?;
        let frame = self.frame_color(opts)?;
        cur.finish()?;
        Ok(self.register(name, pos, Shape::from(BoxShape { size }), color, frame))
    }

    fn ellipse(
        &mut self,
        name: Option<String>,
        cur: &mut ArgCursor<'_>,
        opts: &Options,
    ) -> Result<EntityId, ScriptError> {
        let radii = cur.pair(self.cell, defaults::ELLIPSE_RADII)?;
        let color = cur.color(defaults::COLOR, self.palette)?;
        let pos = cur.position(self.cell, defaults::CENTER)?;
        let frame = self.frame_color(opts)?;
        let shape = Shape::from(EllipseShape { size: radii * 2.0 });
        cur.finish()?;
        Ok(self.register(name, pos, shape, color, frame))
    }

    fn link(
        &mut self,
        name: Option<String>,
        cur: &mut ArgCursor<'_>,
    ) -> Result<EntityId, ScriptError> {
        let src = cur.required("link source")?;
        let dst = cur.required("link destination")?;
        let src = self
            .cell
            .id_of(src)
            .map_err(|_| self.ctx.reference(format!("undefined object '{src}'"), src))?;
        let dst = self
            .cell
            .id_of(dst)
            .map_err(|_| self.ctx.reference(format!("undefined object '{dst}'"), dst))?;
        let stroke = cur.number(defaults::STROKE_WIDTH)?;
        let color = cur.color(defaults::COLOR, self.palette)?;
        let shape = Shape::from(LinkShape { src, dst, stroke });
        cur.finish()?;
        Ok(self.register(name, DVec2::ZERO, shape, color, None))
    }

    fn line(
        &mut self,
        name: Option<String>,
        cur: &mut ArgCursor<'_>,
        opts: &Options,
    ) -> Result<EntityId, ScriptError> {
        let start = cur.position(self.cell, defaults::LINE_START)?;
        let end = cur.position(self.cell, defaults::LINE_END)?;
        let stroke = cur.number(defaults::STROKE_WIDTH)?;
        let color = cur.color(defaults::COLOR, self.palette)?;
        let shape = Shape::from(LineShape { end, stroke });
        cur.finish()?;
        let id = self.register(name, start, shape, color.clone(), None);
        self.arrowheads(id, opts, stroke, &color, (start, end), (end, start));
        Ok(id)
    }

    fn wire(
        &mut self,
        name: Option<String>,
        cur: &mut ArgCursor<'_>,
        opts: &Options,
    ) -> Result<EntityId, ScriptError> {
        let start = cur.position(self.cell, defaults::LINE_START)?;
        let end = cur.position(self.cell, defaults::LINE_END)?;
        let stroke = cur.number(defaults::STROKE_WIDTH)?;
        let color = cur.color(defaults::COLOR, self.palette)?;
        let shape = Shape::from(WireShape { end, stroke });
        cur.finish()?;
        let id = self.register(name, start, shape, color.clone(), None);
        // heads meet the wire at a right angle: horizontal at the end,
        // vertical at the start
        let head = (dvec2(start.x, end.y), end);
        let tail = (dvec2(end.x, start.y), start);
        self.arrowheads(id, opts, stroke, &color, head, tail);
        Ok(id)
    }

    fn spline(
        &mut self,
        name: Option<String>,
        cur: &mut ArgCursor<'_>,
        opts: &Options,
    ) -> Result<EntityId, ScriptError> {
        let start = cur.position(self.cell, defaults::LINE_START)?;
        let control = cur.position(self.cell, defaults::SPLINE_CONTROL)?;
        let end = cur.position(self.cell, defaults::LINE_END)?;
        let stroke = cur.number(defaults::STROKE_WIDTH)?;
        let color = cur.color(defaults::COLOR, self.palette)?;
        let shape = Shape::from(SplineShape {
            control,
            end,
            stroke,
        });
        cur.finish()?;
        let id = self.register(name, start, shape, color.clone(), None);
        self.arrowheads(id, opts, stroke, &color, (control, end), (control, start));
        Ok(id)
    }

    fn polygon(
        &mut self,
        name: Option<String>,
        cur: &mut ArgCursor<'_>,
        opts: &Options,
    ) -> Result<EntityId, ScriptError> {
        let sides = cur.number(defaults::POLYGON_SIDES)?;
        if sides.fract() != 0.0 || !(3.0..=f64::from(u16::MAX)).contains(&sides) {
            return Err(self
                .ctx
                .argument(format!("polygon needs at least 3 sides, got {sides}"), None));
        }
        let radius = cur.number(defaults::POLYGON_RADIUS)?;
        let color = cur.color(defaults::COLOR, self.palette)?;
        let pos = cur.position(self.cell, defaults::CENTER)?;
        let rotation = match opts.value('r') {
            Some(r) => parse_number(r)
                .ok_or_else(|| self.ctx.syntax(format!("invalid rotation '{r}'"), r))?,
            None => 0.0,
        };
        let frame = self.frame_color(opts)?;
        let shape = Shape::from(PolygonShape {
            sides: sides as u32,
            width: radius * 2.0,
            rotation: Angle(rotation),
        });
        cur.finish()?;
        Ok(self.register(name, pos, shape, color, frame))
    }

    fn text(
        &mut self,
        name: Option<String>,
        cur: &mut ArgCursor<'_>,
        opts: &Options,
    ) -> Result<EntityId, ScriptError> {
        let text = cur.string("").replace("__", " ");
        let size = cur.number(defaults::TEXT_SIZE)?;
        let color = cur.color(defaults::COLOR, self.palette)?;
        let pos = cur.position(self.cell, defaults::CENTER)?;
        let align = if opts.has('r') {
            Align::Right
        } else if opts.has('l') {
            Align::Left
        } else {
            Align::Center
        };
        let shape = Shape::from(TextShape { text, size, align });
        cur.finish()?;
        Ok(self.register(name, pos, shape, color, None))
    }

    /// Register `_head` / `_tail` triangles for the requested ends. Each
    /// segment is `(from, to)`; the head sits on `to` pointing away from
    /// `from`.
    fn arrowheads(
        &mut self,
        owner: EntityId,
        opts: &Options,
        stroke: f64,
        color: &ColorSpec,
        head: (DVec2, DVec2),
        tail: (DVec2, DVec2),
    ) {
        let Some(name) = self.cell.entity(owner).map(|e| e.name.clone()) else {
            return;
        };
        for (flag, suffix, (from, to)) in [('h', "_head", head), ('t', "_tail", tail)] {
            if !opts.has(flag) {
                continue;
            }
            let shape = Shape::from(PolygonShape {
                sides: 3,
                width: stroke * ARROWHEAD_SCALE * 2.0,
                rotation: Angle(90.0) + Angle::of_segment(from, to),
            });
            self.register(Some(format!("{name}{suffix}")), to, shape, color.clone(), None);
        }
    }
}

/// Look for `file` as given, then under each of `dirs`.
pub fn find_asset(file: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    let direct = Path::new(file);
    if direct.exists() {
        return Some(direct.to_path_buf());
    }
    dirs.iter().map(|d| d.join(file)).find(|p| p.exists())
}
