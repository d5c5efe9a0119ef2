//! The `display` loop: goal stepping, fading, frame pacing and the status
//! overlay.

use crate::ast::{Align, ColorSpec};
use crate::log::{debug, warn};
use crate::render::{Drawable, Placement, Renderer};
use glam::{DVec2, dvec2};
use std::thread;
use std::time::{Duration, Instant};

use super::defaults;
use super::entity::{EntityId, Shape, TextShape};
use super::Cell;

/// Alpha at or below this counts as fully faded.
const FADE_EPSILON: f64 = 1e-9;

/// Keeps consecutive frames at least `1/rate_limit` seconds apart.
#[derive(Debug, Clone)]
pub struct FrameClock {
    min_interval: Option<Duration>,
    last: Option<Instant>,
}

impl FrameClock {
    pub fn new(rate_limit: Option<f64>) -> Self {
        Self {
            min_interval: rate_limit.map(|r| Duration::from_secs_f64(1.0 / r)),
            last: None,
        }
    }

    /// Sleep until the next frame slot is due.
    pub fn pace(&mut self) {
        let Some(min) = self.min_interval else {
            return;
        };
        if let Some(elapsed) = self.last.map(|t| t.elapsed()) {
            if elapsed < min {
                thread::sleep(min - elapsed);
            }
        }
        self.last = Some(Instant::now());
    }
}

impl Cell {
    /// Visible entities, stable-sorted by ascending priority. Ties keep
    /// creation order.
    pub fn render_order(&self) -> Vec<EntityId> {
        let mut visible: Vec<_> = self.entities.values().filter(|e| e.visible).collect();
        visible.sort_by(|a, b| a.priority.total_cmp(&b.priority));
        visible.into_iter().map(|e| e.id).collect()
    }

    /// Advance every entity in `order` by one tick.
    ///
    /// Returns whether anything moved or faded. Entities that finish fading
    /// are removed from the scene and from `order`.
    pub fn tick(&mut self, order: &mut Vec<EntityId>) -> bool {
        let fade_step = 1.0 / self.config.frame_rate;
        let mut changed = false;
        let mut faded = Vec::new();

        for &id in order.iter() {
            let Some(entity) = self.entities.get_mut(&id) else {
                continue;
            };
            if let Some(motion) = entity.motion {
                changed = true;
                let delta = motion.goal - entity.pos;
                if arrived(delta, motion.velocity) {
                    entity.motion = None;
                } else {
                    let next = entity.pos + delta.normalize_or_zero() * motion.velocity;
                    if arrived(motion.goal - next, motion.velocity) {
                        entity.motion = None;
                    }
                    if let Err(_e) = self.move_id(id, next) {
                        warn!(error = %_e, "dropping motion of attached object");
                        if let Some(entity) = self.entities.get_mut(&id) {
                            entity.motion = None;
                        }
                    }
                }
            }
            let Some(entity) = self.entities.get_mut(&id) else {
                continue;
            };
            if entity.fade_out {
                changed = true;
                entity.alpha -= fade_step;
                if entity.alpha <= FADE_EPSILON {
                    faded.push(id);
                }
            }
        }

        for id in faded {
            if let Some(_entity) = self.remove(id) {
                debug!(name = %_entity.name, "faded out");
            }
            order.retain(|o| *o != id);
        }
        changed
    }

    /// Resolve the frame geometry of every entity in `order`. Links with a
    /// missing endpoint are left out.
    pub fn placements(&self, order: &[EntityId]) -> Vec<(EntityId, Placement)> {
        order
            .iter()
            .filter_map(|&id| {
                let entity = self.entities.get(&id)?;
                let placement = match &entity.shape {
                    Shape::Line(line) => Placement::Segment {
                        from: entity.pos,
                        to: line.end,
                    },
                    Shape::Wire(wire) => Placement::Segment {
                        from: entity.pos,
                        to: wire.end,
                    },
                    Shape::Spline(spline) => Placement::Spline {
                        from: entity.pos,
                        control: spline.control,
                        to: spline.end,
                    },
                    Shape::Link(link) => match self.link_endpoints(link) {
                        Some((from, to)) => Placement::Segment { from, to },
                        None => {
                            warn!(name = %entity.name, "skipping link with a dangling endpoint");
                            return None;
                        }
                    },
                    Shape::Polygon(poly) => Placement::Polygon(poly.vertices(entity.pos)),
                    Shape::Bitmap(_) | Shape::Box(_) | Shape::Ellipse(_) | Shape::Text(_) => {
                        Placement::At(entity.pos)
                    }
                };
                Some((id, placement))
            })
            .collect()
    }

    fn render_frame(&mut self, order: &[EntityId], renderer: &mut dyn Renderer) {
        let placements = self.placements(order);
        let drawables: Vec<Drawable<'_>> = placements
            .iter()
            .filter_map(|(id, placement)| {
                self.entities
                    .get(id)
                    .map(|entity| Drawable { entity, placement })
            })
            .collect();
        renderer.clear();
        renderer.render_objects(&drawables);
        renderer.display();
        self.frame_count += 1;
        self.clock.pace();
    }

    /// Run the animation to quiescence, rendering one frame per tick.
    ///
    /// Returns the number of frames rendered (at least one).
    pub fn display(&mut self, renderer: &mut dyn Renderer) -> usize {
        let mut order = self.render_order();
        let mut frames = 0;
        loop {
            let changed = self.tick(&mut order);
            self.render_frame(&order, renderer);
            frames += 1;
            if !changed {
                break;
            }
        }
        debug!(frames, objects = order.len(), "display settled");
        if self.config.status_overlay {
            self.update_status();
        }
        frames
    }

    /// Text for the status overlay; empty during the first second.
    pub fn status_text(&self) -> String {
        let elapsed = self.started.elapsed().as_secs_f64();
        if elapsed <= 1.0 {
            return String::new();
        }
        let fps = self.frame_count as f64 / elapsed;
        format!("FPS: {:.2}, OBJ: {}", fps, self.len())
    }

    /// Redefine the `_status` text entity.
    pub fn update_status(&mut self) {
        let shape = Shape::from(TextShape {
            text: self.status_text(),
            size: defaults::STATUS_TEXT_SIZE,
            align: Align::Center,
        });
        let pos = dvec2(0.0, self.height()) + defaults::STATUS_OFFSET;
        let entity = self
            .new_entity(Some(defaults::STATUS_NAME.to_string()), pos, shape)
            .with_color(ColorSpec::Named(defaults::COLOR.to_string()))
            .with_priority(defaults::TEXT_PRIORITY);
        self.add(entity);
    }
}

/// Both axis deltas are within one tick's travel.
fn arrived(delta: DVec2, velocity: f64) -> bool {
    delta.x.abs() < velocity && delta.y.abs() < velocity
}
