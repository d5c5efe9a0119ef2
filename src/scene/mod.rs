//! Scene graph
//!
//! [`Cell`] owns every entity in an arena keyed by [`EntityId`] (iteration
//! order is creation order) plus a name index. It also carries the state
//! that outlives single statements: the id counter, the last referenced
//! name and the frame statistics used by the status overlay.

mod animation;
pub mod config;
pub mod defaults;
mod entity;
pub mod layout;

pub use animation::FrameClock;
pub use config::CellConfig;
pub use entity::{
    BitmapShape, BoxShape, EllipseShape, EntityId, LineShape, LinkShape, Motion, PolygonShape,
    SceneEntity, Shape, ShapeGeometry, SplineShape, TextShape, WireShape, auto_name,
};
pub use layout::{CircularLayout, GraphvizLayout, LayoutEngine, LayoutGraph};

use crate::errors::SceneError;
use crate::log::debug;
use crate::types::{Angle, BBox};
use glam::{DVec2, dvec2};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::time::Instant;

/// The retained scene graph driven by a script
#[derive(Debug)]
pub struct Cell {
    config: CellConfig,
    entities: BTreeMap<EntityId, SceneEntity>,
    names: HashMap<String, EntityId>,
    next_id: u64,
    last_name: Option<String>,
    frame_count: u64,
    started: Instant,
    clock: FrameClock,
}

impl Default for Cell {
    fn default() -> Self {
        Self::new(CellConfig::default())
    }
}

impl Cell {
    pub fn new(config: CellConfig) -> Self {
        let clock = FrameClock::new(config.rate_limit);
        Self {
            config,
            entities: BTreeMap::new(),
            names: HashMap::new(),
            next_id: 0,
            last_name: None,
            frame_count: 0,
            started: Instant::now(),
            clock,
        }
    }

    pub fn config(&self) -> &CellConfig {
        &self.config
    }

    pub fn width(&self) -> f64 {
        self.config.width
    }

    pub fn height(&self) -> f64 {
        self.config.height
    }

    pub fn size(&self) -> DVec2 {
        dvec2(self.config.width, self.config.height)
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    pub fn set_last_name(&mut self, name: &str) {
        self.last_name = Some(name.to_string());
    }

    // ------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------

    /// Allocate an id and build an entity, auto-naming it when `name` is `None`.
    pub fn new_entity(&mut self, name: Option<String>, pos: DVec2, shape: Shape) -> SceneEntity {
        self.next_id += 1;
        let id = EntityId(self.next_id);
        let name = name.unwrap_or_else(|| auto_name(shape.kind(), id));
        SceneEntity::new(id, name, pos, shape)
    }

    /// Register `entity`, silently discarding any entity with the same name.
    pub fn add(&mut self, entity: SceneEntity) -> EntityId {
        if let Some(old) = self.names.get(&entity.name).copied() {
            debug!(name = %entity.name, "overwriting object");
            self.remove(old);
        } else {
            debug!(name = %entity.name, kind = %entity.kind(), "adding object");
        }
        let id = entity.id;
        self.next_id = self.next_id.max(id.0);
        self.names.insert(entity.name.clone(), id);
        self.entities.insert(id, entity);
        id
    }

    /// Remove the named entity. Its children are orphaned where they stand.
    pub fn delete(&mut self, name: &str) -> Result<SceneEntity, SceneError> {
        let id = self.id_of(name)?;
        debug!(name, "deleting object");
        self.remove(id).ok_or_else(|| SceneError::UnknownObject {
            name: name.to_string(),
        })
    }

    pub(crate) fn remove(&mut self, id: EntityId) -> Option<SceneEntity> {
        let entity = self.entities.remove(&id)?;
        if self.names.get(&entity.name) == Some(&id) {
            self.names.remove(&entity.name);
        }
        if let Some(parent) = entity.parent.and_then(|p| self.entities.get_mut(&p)) {
            parent.children.retain(|c| *c != id);
        }
        for child in &entity.children {
            if let Some(child) = self.entities.get_mut(child) {
                child.parent = None;
                child.offset = DVec2::ZERO;
            }
        }
        Some(entity)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    pub fn id_of(&self, name: &str) -> Result<EntityId, SceneError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| SceneError::UnknownObject {
                name: name.to_string(),
            })
    }

    pub fn get(&self, name: &str) -> Option<&SceneEntity> {
        self.names.get(name).and_then(|id| self.entities.get(id))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut SceneEntity> {
        let id = self.names.get(name)?;
        self.entities.get_mut(id)
    }

    pub fn entity(&self, id: EntityId) -> Option<&SceneEntity> {
        self.entities.get(&id)
    }

    pub(crate) fn entity_mut(&mut self, id: EntityId) -> Option<&mut SceneEntity> {
        self.entities.get_mut(&id)
    }

    /// Look up a named entity for in-place mutation, failing if absent.
    pub fn lookup_mut(&mut self, name: &str) -> Result<&mut SceneEntity, SceneError> {
        let id = self.id_of(name)?;
        self.entities
            .get_mut(&id)
            .ok_or_else(|| SceneError::UnknownObject {
                name: name.to_string(),
            })
    }

    /// All entities in creation order
    pub fn entities(&self) -> impl Iterator<Item = &SceneEntity> {
        self.entities.values()
    }

    /// Live names in creation order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entities.values().map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    // ------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------

    /// Current position of an entity. For a link this is the midpoint of
    /// its endpoints, or `None` if either endpoint is gone.
    pub fn position_of(&self, id: EntityId) -> Option<DVec2> {
        let entity = self.entities.get(&id)?;
        match &entity.shape {
            Shape::Link(link) => {
                let (src, dst) = self.link_endpoints(link)?;
                Some((src + dst) / 2.0)
            }
            _ => Some(entity.pos),
        }
    }

    pub fn position(&self, name: &str) -> Option<DVec2> {
        self.names.get(name).and_then(|id| self.position_of(*id))
    }

    pub fn link_endpoints(&self, link: &LinkShape) -> Option<(DVec2, DVec2)> {
        let src = self.entities.get(&link.src)?;
        let dst = self.entities.get(&link.dst)?;
        Some((src.pos, dst.pos))
    }

    /// Move a free entity to `pos`, carrying its descendants along.
    pub fn move_to(&mut self, name: &str, pos: DVec2) -> Result<(), SceneError> {
        let id = self.id_of(name)?;
        self.move_id(id, pos)
    }

    pub(crate) fn move_id(&mut self, id: EntityId, pos: DVec2) -> Result<(), SceneError> {
        let Some(entity) = self.entities.get_mut(&id) else {
            return Ok(());
        };
        if entity.parent.is_some() {
            return Err(SceneError::AttachedMove {
                name: entity.name.clone(),
            });
        }
        entity.pos = pos;
        self.reposition_children(id);
        Ok(())
    }

    pub fn shift(&mut self, name: &str, delta: DVec2) -> Result<(), SceneError> {
        let id = self.id_of(name)?;
        let pos = self.entities.get(&id).map(|e| e.pos).unwrap_or_default();
        self.move_id(id, pos + delta)
    }

    pub fn resize(&mut self, name: &str, size: DVec2) -> Result<(), SceneError> {
        self.lookup_mut(name)?.shape.resize(size);
        Ok(())
    }

    fn reposition_children(&mut self, id: EntityId) {
        let mut pending = vec![id];
        while let Some(parent_id) = pending.pop() {
            let Some(parent) = self.entities.get(&parent_id) else {
                continue;
            };
            let origin = parent.pos;
            let children = parent.children.clone();
            for child_id in children {
                if let Some(child) = self.entities.get_mut(&child_id) {
                    child.pos = origin + child.offset;
                    pending.push(child_id);
                }
            }
        }
    }

    /// Make `child` follow `parent` at `offset`. Re-attaching moves the child
    /// to its new parent.
    pub fn attach(&mut self, child: &str, parent: &str, offset: DVec2) -> Result<(), SceneError> {
        let child_id = self.id_of(child)?;
        let parent_id = self.id_of(parent)?;

        let mut cursor = Some(parent_id);
        while let Some(id) = cursor {
            if id == child_id {
                return Err(SceneError::AttachCycle {
                    child: child.to_string(),
                    parent: parent.to_string(),
                });
            }
            cursor = self.entities.get(&id).and_then(|e| e.parent);
        }

        let old_parent = self.entities.get(&child_id).and_then(|e| e.parent);
        if let Some(old) = old_parent.and_then(|p| self.entities.get_mut(&p)) {
            old.children.retain(|c| *c != child_id);
        }
        if let Some(p) = self.entities.get_mut(&parent_id) {
            p.children.push(child_id);
        }
        if let Some(c) = self.entities.get_mut(&child_id) {
            c.parent = Some(parent_id);
            c.offset = offset;
            c.motion = None;
        }
        self.reposition_children(parent_id);
        Ok(())
    }

    /// Schedule a constant-velocity move to `goal`, arriving in about
    /// `frame_rate` ticks and never slower than one pixel per tick.
    pub fn animate(&mut self, name: &str, goal: DVec2) -> Result<(), SceneError> {
        let frame_rate = self.config.frame_rate;
        let entity = self.lookup_mut(name)?;
        if entity.parent.is_some() {
            return Err(SceneError::AttachedAnimate {
                name: name.to_string(),
            });
        }
        let velocity = (entity.pos.distance(goal) / frame_rate).max(1.0);
        entity.motion = Some(Motion { goal, velocity });
        Ok(())
    }

    /// Rotate an entity's position by `angle` around `center`.
    pub fn rotate_around(&mut self, name: &str, angle: Angle, center: DVec2) -> Result<(), SceneError> {
        let pos = self
            .position(name)
            .ok_or_else(|| SceneError::UnknownObject {
                name: name.to_string(),
            })?;
        let rotated = center + DVec2::from_angle(angle.radians()).rotate(pos - center);
        self.move_to(name, rotated)
    }

    /// Map the bounding box of the named entities onto the rectangle with
    /// corners `from` and `to`, preserving their relative layout.
    pub fn fit_within(&mut self, from: DVec2, to: DVec2, names: &[String]) -> Result<(), SceneError> {
        let mut placed = Vec::with_capacity(names.len());
        for name in names {
            let id = self.id_of(name)?;
            if let Some(pos) = self.position_of(id) {
                placed.push((id, pos));
            }
        }
        let bounds: BBox = placed.iter().map(|(_, p)| *p).collect();
        if bounds.is_empty() {
            return Err(SceneError::NothingToFit);
        }
        let span = bounds.size();
        let unit = |v: f64, min: f64, extent: f64| if extent == 0.0 { 0.5 } else { (v - min) / extent };
        for (id, pos) in placed {
            let t = dvec2(
                unit(pos.x, bounds.min.x, span.x),
                unit(pos.y, bounds.min.y, span.y),
            );
            self.move_id(id, from + (to - from) * t)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// One line per entity in creation order:
    /// `box [b1] 10 x 10 @ (400, 300) white`.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for entity in self.entities.values() {
            let (w, h) = entity.shape.extent();
            let _ = write!(
                out,
                "{} [{}] {} x {} @ {} {}",
                entity.kind(),
                entity.name,
                fmt_opt(w),
                fmt_opt(h),
                fmt_point(entity.pos),
                entity.color
            );
            match &entity.shape {
                Shape::Line(LineShape { end, .. }) | Shape::Wire(WireShape { end, .. }) => {
                    let _ = write!(out, " to {}", fmt_point(*end));
                }
                Shape::Spline(spline) => {
                    let _ = write!(
                        out,
                        " via {} to {}",
                        fmt_point(spline.control),
                        fmt_point(spline.end)
                    );
                }
                Shape::Link(link) => {
                    let end_name = |id| self.entities.get(&id).map_or("?", |e: &SceneEntity| e.name.as_str());
                    let _ = write!(out, " {} -- {}", end_name(link.src), end_name(link.dst));
                }
                Shape::Text(text) => {
                    let _ = write!(out, " {:?}", text.text);
                }
                Shape::Polygon(poly) if poly.rotation != Angle::ZERO => {
                    let _ = write!(out, " rot {}", fmt_num(poly.rotation.0));
                }
                _ => {}
            }
            if let Some(parent) = entity.parent.and_then(|p| self.entities.get(&p)) {
                let _ = write!(out, " on {}", parent.name);
            }
            if entity.alpha < 1.0 {
                let _ = write!(out, " alpha {}", fmt_num(entity.alpha));
            }
            if entity.priority != entity.shape.default_priority() {
                let _ = write!(out, " prio {}", fmt_num(entity.priority));
            }
            if !entity.visible {
                out.push_str(" hidden");
            }
            if entity.fixed {
                out.push_str(" fixed");
            }
            if entity.fade_out {
                out.push_str(" fading");
            }
            out.push('\n');
        }
        out
    }
}

/// Round to three decimals so dumps are stable across float noise.
fn fmt_num(v: f64) -> String {
    let rounded = (v * 1000.0).round() / 1000.0;
    if rounded == 0.0 {
        "0".to_string()
    } else {
        format!("{rounded}")
    }
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), fmt_num)
}

fn fmt_point(p: DVec2) -> String {
    format!("({}, {})", fmt_num(p.x), fmt_num(p.y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ColorSpec;

    fn cell() -> Cell {
        Cell::new(CellConfig::headless())
    }

    fn add_box(cell: &mut Cell, name: &str, x: f64, y: f64) -> EntityId {
        let shape = Shape::from(BoxShape {
            size: dvec2(10.0, 10.0),
        });
        let entity = cell.new_entity(Some(name.to_string()), dvec2(x, y), shape);
        cell.add(entity)
    }

    #[test]
    fn names_stay_unique_across_overwrites() {
        let mut cell = cell();
        add_box(&mut cell, "a", 0.0, 0.0);
        add_box(&mut cell, "b", 0.0, 0.0);
        let newer = add_box(&mut cell, "a", 5.0, 5.0);
        assert_eq!(cell.len(), 2);
        assert_eq!(cell.id_of("a"), Ok(newer));
        assert_eq!(cell.position("a"), Some(dvec2(5.0, 5.0)));
        // the overwritten entity sorts after "b" now
        assert_eq!(cell.names().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn delete_missing_fails() {
        let mut cell = cell();
        assert_eq!(
            cell.delete("ghost").unwrap_err(),
            SceneError::UnknownObject {
                name: "ghost".into()
            }
        );
    }

    #[test]
    fn attached_children_follow_and_refuse_direct_moves() {
        let mut cell = cell();
        add_box(&mut cell, "p", 10.0, 10.0);
        add_box(&mut cell, "c", 0.0, 0.0);
        add_box(&mut cell, "g", 0.0, 0.0);
        cell.attach("c", "p", dvec2(5.0, -5.0)).unwrap();
        cell.attach("g", "c", dvec2(1.0, 1.0)).unwrap();
        assert_eq!(cell.position("c"), Some(dvec2(15.0, 5.0)));

        cell.move_to("p", dvec2(100.0, 200.0)).unwrap();
        assert_eq!(cell.position("c"), Some(dvec2(105.0, 195.0)));
        assert_eq!(cell.position("g"), Some(dvec2(106.0, 196.0)));

        let err = cell.move_to("c", dvec2(0.0, 0.0)).unwrap_err();
        assert_eq!(err.to_string(), "cannot move attached object 'c'");
    }

    #[test]
    fn attach_rejects_cycles() {
        let mut cell = cell();
        add_box(&mut cell, "a", 0.0, 0.0);
        add_box(&mut cell, "b", 0.0, 0.0);
        cell.attach("b", "a", DVec2::ZERO).unwrap();
        assert!(matches!(
            cell.attach("a", "b", DVec2::ZERO),
            Err(SceneError::AttachCycle { .. })
        ));
        assert!(matches!(
            cell.attach("a", "a", DVec2::ZERO),
            Err(SceneError::AttachCycle { .. })
        ));
    }

    #[test]
    fn deleting_a_parent_orphans_children() {
        let mut cell = cell();
        add_box(&mut cell, "p", 10.0, 10.0);
        add_box(&mut cell, "c", 0.0, 0.0);
        cell.attach("c", "p", dvec2(1.0, 1.0)).unwrap();
        cell.delete("p").unwrap();
        assert_eq!(cell.get("c").and_then(|c| c.parent), None);
        cell.move_to("c", dvec2(3.0, 3.0)).unwrap();
        assert_eq!(cell.position("c"), Some(dvec2(3.0, 3.0)));
    }

    #[test]
    fn deleting_a_child_detaches_it() {
        let mut cell = cell();
        let p = add_box(&mut cell, "p", 10.0, 10.0);
        add_box(&mut cell, "c", 0.0, 0.0);
        cell.attach("c", "p", dvec2(1.0, 1.0)).unwrap();
        cell.delete("c").unwrap();
        assert!(cell.entity(p).unwrap().children.is_empty());
    }

    #[test]
    fn animate_velocity_has_a_floor() {
        let mut cell = cell();
        add_box(&mut cell, "a", 0.0, 0.0);
        cell.animate("a", dvec2(300.0, 400.0)).unwrap();
        assert_eq!(cell.get("a").unwrap().motion.unwrap().velocity, 500.0 / 30.0);
        cell.animate("a", dvec2(3.0, 4.0)).unwrap();
        assert_eq!(cell.get("a").unwrap().motion.unwrap().velocity, 1.0);
    }

    #[test]
    fn fit_within_maps_bounding_box() {
        let mut cell = cell();
        add_box(&mut cell, "a", 0.0, 0.0);
        add_box(&mut cell, "b", 10.0, 20.0);
        add_box(&mut cell, "c", 5.0, 5.0);
        let names: Vec<String> = ["a", "b", "c"].map(String::from).to_vec();
        cell.fit_within(dvec2(100.0, 100.0), dvec2(200.0, 300.0), &names)
            .unwrap();
        assert_eq!(cell.position("a"), Some(dvec2(100.0, 100.0)));
        assert_eq!(cell.position("b"), Some(dvec2(200.0, 300.0)));
        assert_eq!(cell.position("c"), Some(dvec2(150.0, 150.0)));
    }

    #[test]
    fn fit_within_centres_degenerate_axes() {
        let mut cell = cell();
        add_box(&mut cell, "a", 7.0, 7.0);
        cell.fit_within(DVec2::ZERO, dvec2(100.0, 50.0), &["a".to_string()])
            .unwrap();
        assert_eq!(cell.position("a"), Some(dvec2(50.0, 25.0)));
        assert_eq!(
            cell.fit_within(DVec2::ZERO, DVec2::ONE, &[]),
            Err(SceneError::NothingToFit)
        );
    }

    #[test]
    fn rotate_around_quarter_turn() {
        let mut cell = cell();
        add_box(&mut cell, "a", 110.0, 100.0);
        cell.rotate_around("a", Angle(90.0), dvec2(100.0, 100.0)).unwrap();
        let pos = cell.position("a").unwrap();
        assert!(pos.abs_diff_eq(dvec2(100.0, 110.0), 1e-9), "{pos}");
    }

    #[test]
    fn link_position_is_endpoint_midpoint() {
        let mut cell = cell();
        let a = add_box(&mut cell, "a", 0.0, 0.0);
        let b = add_box(&mut cell, "b", 10.0, 20.0);
        let link = cell.new_entity(
            Some("l".into()),
            DVec2::ZERO,
            Shape::from(LinkShape {
                src: a,
                dst: b,
                stroke: 1.0,
            }),
        );
        cell.add(link);
        assert_eq!(cell.position("l"), Some(dvec2(5.0, 10.0)));
        cell.delete("b").unwrap();
        assert_eq!(cell.position("l"), None);
    }

    #[test]
    fn dump_lists_entities_in_creation_order() {
        let mut cell = cell();
        add_box(&mut cell, "b1", 400.0, 300.0);
        let entity = cell
            .new_entity(
                None,
                dvec2(1.0, 2.0),
                Shape::from(TextShape {
                    text: "hi there".into(),
                    size: 16.0,
                    align: Default::default(),
                }),
            )
            .with_color(ColorSpec::Named("cyan".into()));
        cell.add(entity);
        assert_eq!(
            cell.dump(),
            "box [b1] 10 x 10 @ (400, 300) white\ntext [_text2] - x 16 @ (1, 2) cyan \"hi there\"\n"
        );
    }
}
