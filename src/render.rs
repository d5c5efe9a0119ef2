//! Renderer boundary
//!
//! The engine hands each frame to a [`Renderer`] as a priority-ordered slice
//! of [`Drawable`]s. Concrete backends (raster, vector, print) live outside
//! this crate; [`NullRenderer`] and [`RecordingRenderer`] are provided for
//! headless runs and tests.

use crate::scene::{EntityId, SceneEntity};
use glam::DVec2;
use std::path::{Path, PathBuf};

/// Geometry of an entity resolved for one frame
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    /// Boxes, ellipses, bitmaps and text: a single anchor point
    At(DVec2),
    /// Lines, wires and links
    Segment { from: DVec2, to: DVec2 },
    Spline { from: DVec2, control: DVec2, to: DVec2 },
    Polygon(Vec<DVec2>),
}

/// An entity together with its frame placement
#[derive(Debug, Clone, Copy)]
pub struct Drawable<'a> {
    pub entity: &'a SceneEntity,
    pub placement: &'a Placement,
}

/// Sink for rendered frames and the blocking `wait`/`play` requests
pub trait Renderer {
    fn clear(&mut self) {}

    fn render_objects(&mut self, objects: &[Drawable<'_>]);

    /// Present the frame built since the last `clear`.
    fn display(&mut self) {}

    /// Block until the host delivers an "advance" signal.
    fn wait(&mut self) {}

    fn play(&mut self, _file: &Path) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render_objects(&mut self, _objects: &[Drawable<'_>]) {}
}

/// One entity as seen in a recorded frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameEntry {
    pub id: EntityId,
    pub name: String,
    pub placement: Placement,
    pub alpha: f64,
}

/// Keeps every frame it is given, for assertions in tests and demos.
#[derive(Debug, Default, Clone)]
pub struct RecordingRenderer {
    pub frames: Vec<Vec<FrameEntry>>,
    pub clears: usize,
    pub displays: usize,
    pub waits: usize,
    pub played: Vec<PathBuf>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_frame(&self) -> Option<&[FrameEntry]> {
        self.frames.last().map(Vec::as_slice)
    }

    /// Names in render order for frame `index`.
    pub fn frame_names(&self, index: usize) -> Vec<&str> {
        self.frames
            .get(index)
            .map(|frame| frame.iter().map(|e| e.name.as_str()).collect())
            .unwrap_or_default()
    }
}

impl Renderer for RecordingRenderer {
    fn clear(&mut self) {
        self.clears += 1;
    }

    fn render_objects(&mut self, objects: &[Drawable<'_>]) {
        self.frames.push(
            objects
                .iter()
                .map(|d| FrameEntry {
                    id: d.entity.id,
                    name: d.entity.name.clone(),
                    placement: d.placement.clone(),
                    alpha: d.entity.alpha,
                })
                .collect(),
        );
    }

    fn display(&mut self) {
        self.displays += 1;
    }

    fn wait(&mut self) {
        self.waits += 1;
    }

    fn play(&mut self, file: &Path) {
        self.played.push(file.to_path_buf());
    }
}
