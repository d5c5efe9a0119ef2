//! Scene entities: shared core fields plus a closed per-kind payload
//!
//! Each payload type knows its own extent and how to resize itself; the
//! [`Shape`] enum dispatches to them through [`ShapeGeometry`].

use crate::ast::{Align, ColorSpec, ShapeKind};
use crate::types::Angle;
use enum_dispatch::enum_dispatch;
use glam::{DVec2, dvec2};
use std::f64::consts::{FRAC_PI_2, TAU};
use std::fmt;
use std::path::PathBuf;

use super::defaults;

/// Stable handle of an entity, allocated from a per-scene counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Behaviour shared by every shape payload
#[enum_dispatch]
pub trait ShapeGeometry {
    fn kind(&self) -> ShapeKind;

    /// Width and height as shown in scene dumps; `None` where the kind has
    /// no such extent.
    fn extent(&self) -> (Option<f64>, Option<f64>);

    /// Apply a `resize` command.
    fn resize(&mut self, size: DVec2);

    fn default_priority(&self) -> f64 {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BitmapShape {
    pub file: PathBuf,
    /// Display size; `None` keeps the image's own size
    pub size: Option<DVec2>,
}

impl ShapeGeometry for BitmapShape {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Bitmap
    }

    fn extent(&self) -> (Option<f64>, Option<f64>) {
        (self.size.map(|s| s.x), self.size.map(|s| s.y))
    }

    fn resize(&mut self, size: DVec2) {
        self.size = Some(size);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxShape {
    pub size: DVec2,
}

impl ShapeGeometry for BoxShape {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Box
    }

    fn extent(&self) -> (Option<f64>, Option<f64>) {
        (Some(self.size.x), Some(self.size.y))
    }

    fn resize(&mut self, size: DVec2) {
        self.size = size;
    }
}

/// Axis-aligned ellipse; `size` is the full width and height (twice the radii).
#[derive(Debug, Clone, PartialEq)]
pub struct EllipseShape {
    pub size: DVec2,
}

impl ShapeGeometry for EllipseShape {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Ellipse
    }

    fn extent(&self) -> (Option<f64>, Option<f64>) {
        (Some(self.size.x), Some(self.size.y))
    }

    fn resize(&mut self, size: DVec2) {
        self.size = size;
    }
}

/// Straight segment from the entity position to `end`.
#[derive(Debug, Clone, PartialEq)]
pub struct LineShape {
    pub end: DVec2,
    pub stroke: f64,
}

impl ShapeGeometry for LineShape {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Line
    }

    fn extent(&self) -> (Option<f64>, Option<f64>) {
        (Some(self.stroke), None)
    }

    fn resize(&mut self, size: DVec2) {
        self.stroke = size.x;
    }

    fn default_priority(&self) -> f64 {
        defaults::LINE_PRIORITY
    }
}

/// Right-angle connector: horizontal from the entity position, then
/// vertical to `end`.
#[derive(Debug, Clone, PartialEq)]
pub struct WireShape {
    pub end: DVec2,
    pub stroke: f64,
}

impl ShapeGeometry for WireShape {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Wire
    }

    fn extent(&self) -> (Option<f64>, Option<f64>) {
        (Some(self.stroke), None)
    }

    fn resize(&mut self, size: DVec2) {
        self.stroke = size.x;
    }

    fn default_priority(&self) -> f64 {
        defaults::LINE_PRIORITY
    }
}

/// Quadratic curve from the entity position through `control` to `end`.
#[derive(Debug, Clone, PartialEq)]
pub struct SplineShape {
    pub control: DVec2,
    pub end: DVec2,
    pub stroke: f64,
}

impl ShapeGeometry for SplineShape {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Spline
    }

    fn extent(&self) -> (Option<f64>, Option<f64>) {
        (Some(self.stroke), None)
    }

    fn resize(&mut self, size: DVec2) {
        self.stroke = size.x;
    }

    fn default_priority(&self) -> f64 {
        defaults::LINE_PRIORITY
    }
}

/// Connector between two live entities. Endpoints are looked up at render
/// time; a link has no geometry of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkShape {
    pub src: EntityId,
    pub dst: EntityId,
    pub stroke: f64,
}

impl ShapeGeometry for LinkShape {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Link
    }

    fn extent(&self) -> (Option<f64>, Option<f64>) {
        (Some(self.stroke), None)
    }

    fn resize(&mut self, size: DVec2) {
        self.stroke = size.x;
    }

    fn default_priority(&self) -> f64 {
        defaults::LINK_PRIORITY
    }
}

/// Regular polygon. `width` is the circumscribed diameter.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonShape {
    pub sides: u32,
    pub width: f64,
    pub rotation: Angle,
}

impl PolygonShape {
    /// Vertices around `center`, first one straight up before rotation.
    pub fn vertices(&self, center: DVec2) -> Vec<DVec2> {
        let r = self.width / 2.0;
        let step = TAU / f64::from(self.sides.max(1));
        let start = self.rotation.radians() - FRAC_PI_2;
        (0..self.sides)
            .map(|i| {
                let theta = start + step * f64::from(i);
                center + dvec2(theta.cos(), theta.sin()) * r
            })
            .collect()
    }
}

impl ShapeGeometry for PolygonShape {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Polygon
    }

    fn extent(&self) -> (Option<f64>, Option<f64>) {
        (Some(self.width), Some(self.width))
    }

    fn resize(&mut self, size: DVec2) {
        self.width = size.x;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextShape {
    pub text: String,
    pub size: f64,
    pub align: Align,
}

impl ShapeGeometry for TextShape {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Text
    }

    fn extent(&self) -> (Option<f64>, Option<f64>) {
        (None, Some(self.size))
    }

    fn resize(&mut self, size: DVec2) {
        self.size = size.y;
    }

    fn default_priority(&self) -> f64 {
        defaults::TEXT_PRIORITY
    }
}

/// Per-kind payload of a [`SceneEntity`]
#[enum_dispatch(ShapeGeometry)]
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Bitmap(BitmapShape),
    Box(BoxShape),
    Ellipse(EllipseShape),
    Line(LineShape),
    Link(LinkShape),
    Polygon(PolygonShape),
    Spline(SplineShape),
    Text(TextShape),
    Wire(WireShape),
}

/// Goal-directed motion in progress
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub goal: DVec2,
    /// Pixels per tick
    pub velocity: f64,
}

/// One graphical primitive in the scene graph
#[derive(Debug, Clone, PartialEq)]
pub struct SceneEntity {
    pub id: EntityId,
    pub name: String,
    pub pos: DVec2,
    pub color: ColorSpec,
    pub frame_color: Option<ColorSpec>,
    pub alpha: f64,
    pub priority: f64,
    pub scale: f64,
    pub visible: bool,
    pub fixed: bool,
    pub fade_out: bool,
    pub motion: Option<Motion>,
    pub parent: Option<EntityId>,
    /// Offset from the parent, meaningful only while attached
    pub offset: DVec2,
    pub children: Vec<EntityId>,
    pub shape: Shape,
}

impl SceneEntity {
    pub fn new(id: EntityId, name: String, pos: DVec2, shape: Shape) -> Self {
        Self {
            id,
            name,
            pos,
            color: ColorSpec::Named(defaults::COLOR.to_string()),
            frame_color: None,
            alpha: 1.0,
            priority: shape.default_priority(),
            scale: 1.0,
            visible: true,
            fixed: false,
            fade_out: false,
            motion: None,
            parent: None,
            offset: DVec2::ZERO,
            children: Vec::new(),
            shape,
        }
    }

    pub fn with_color(mut self, color: ColorSpec) -> Self {
        self.color = color;
        self
    }

    pub fn with_frame_color(mut self, frame_color: Option<ColorSpec>) -> Self {
        self.frame_color = frame_color;
        self
    }

    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = priority;
        self
    }

    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    pub fn is_link(&self) -> bool {
        matches!(self.shape, Shape::Link(_))
    }

    pub fn is_animating(&self) -> bool {
        self.motion.is_some()
    }

    /// Polygon vertices at the current position; empty for other kinds.
    pub fn vertices(&self) -> Vec<DVec2> {
        match &self.shape {
            Shape::Polygon(poly) => poly.vertices(self.pos),
            _ => Vec::new(),
        }
    }
}

/// Auto-generated name for an unnamed entity: `_{type}{id}`.
pub fn auto_name(kind: ShapeKind, id: EntityId) -> String {
    format!("_{}{}", kind.name(), id)
}
