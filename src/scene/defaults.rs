//! Default canvas settings, sizes and draw priorities (all in pixels)

use glam::{DVec2, dvec2};

pub const CANVAS_WIDTH: f64 = 800.0;
pub const CANVAS_HEIGHT: f64 = 600.0;
/// Ticks an animation is spread over, and alpha lost per tick is `1/FRAME_RATE`
pub const FRAME_RATE: f64 = 30.0;
/// Upper bound on rendered frames per second
pub const RATE_LIMIT: f64 = 30.0;

/// Default anchor for shapes: the centre of the canvas, as relative coordinates
pub const CENTER: (f64, f64) = (0.5, 0.5);
pub const BOX_SIZE: (f64, f64) = (10.0, 10.0);
pub const ELLIPSE_RADII: (f64, f64) = (10.0, 10.0);
pub const LINE_START: (f64, f64) = (0.25, 0.25);
pub const LINE_END: (f64, f64) = (0.75, 0.75);
pub const SPLINE_CONTROL: (f64, f64) = (0.5, 0.5);
pub const STROKE_WIDTH: f64 = 1.0;
pub const POLYGON_SIDES: f64 = 3.0;
pub const POLYGON_RADIUS: f64 = 10.0;
pub const TEXT_SIZE: f64 = 16.0;
pub const COLOR: &str = "white";

pub const LINK_PRIORITY: f64 = -20.0;
pub const LINE_PRIORITY: f64 = -10.0;
pub const TEXT_PRIORITY: f64 = 10.0;

/// Spring layouts fill the canvas minus a 5% margin unless told otherwise
pub const SPRING_MARGIN: f64 = 0.05;
pub const LAYOUT_TOOL: &str = "neato";

/// Arrowheads are triangles whose radius is this multiple of the stroke width
pub const ARROWHEAD_SCALE: f64 = 2.0;

pub const STATUS_NAME: &str = "_status";
pub const STATUS_TEXT_SIZE: f64 = 10.0;
pub const STATUS_OFFSET: DVec2 = dvec2(96.0, -10.0);
