//! Force-directed placement
//!
//! `spring` exports the free entities and the links between them as an
//! undirected graph, asks a [`LayoutEngine`] for node positions, then
//! rotates and rescales the result into the requested region. The default
//! engine pipes DOT through a Graphviz tool (`neato`); [`CircularLayout`]
//! places nodes in-process.

use crate::errors::LayoutError;
use crate::log::{debug, info};
use crate::types::Angle;
use glam::{DVec2, dvec2};
use std::collections::{HashMap, HashSet};
use std::f64::consts::{FRAC_PI_2, TAU};
use std::fmt::Write as _;
use std::process::{Command, Stdio};

use super::defaults;
use super::entity::Shape;
use super::Cell;

/// Undirected graph handed to a layout engine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutGraph {
    pub nodes: Vec<String>,
    pub edges: Vec<(String, String)>,
}

impl LayoutGraph {
    /// DOT text in the shape Graphviz tools expect on stdin.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("graph export {\n");
        for node in &self.nodes {
            let _ = writeln!(out, "  \"{node}\" [width=\"2\"];");
        }
        for (src, dst) in &self.edges {
            let _ = writeln!(out, "\"{src}\" -- \"{dst}\";");
        }
        out.push_str("}\n");
        out
    }
}

/// Graph in, positions out
pub trait LayoutEngine {
    fn layout(&self, graph: &LayoutGraph) -> Result<HashMap<String, DVec2>, LayoutError>;
}

/// Runs an external Graphviz-compatible command (`neato` by default).
///
/// There is no timeout: a tool that never exits blocks the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphvizLayout {
    command: String,
}

impl Default for GraphvizLayout {
    fn default() -> Self {
        Self::new(defaults::LAYOUT_TOOL)
    }
}

impl GraphvizLayout {
    /// `command` is split on whitespace into program and arguments.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

impl LayoutEngine for GraphvizLayout {
    fn layout(&self, graph: &LayoutGraph) -> Result<HashMap<String, DVec2>, LayoutError> {
        let mut words = self.command.split_whitespace();
        let program = words.next().ok_or(LayoutError::EmptyCommand)?;
        let tool = self.command.clone();
        info!(tool = %tool, nodes = graph.nodes.len(), "running layout tool");

        let output = Command::new(program)
            .args(words)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .and_then(|mut child| {
                use std::io::Write;
                if let Some(stdin) = child.stdin.as_mut() {
                    stdin.write_all(graph.to_dot().as_bytes())?;
                }
                child.wait_with_output()
            })
            .map_err(|source| LayoutError::Spawn {
                tool: tool.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(LayoutError::Failed {
                tool,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let stdout = String::from_utf8(output.stdout).map_err(|_| LayoutError::NotUtf8)?;
        let positions = parse_dot_positions(&stdout);
        if let Some(missing) = graph.nodes.iter().find(|n| !positions.contains_key(*n)) {
            return Err(LayoutError::MissingNode {
                name: missing.clone(),
            });
        }
        Ok(positions)
    }
}

/// Extract `pos="x,y"` node attributes from laid-out DOT.
///
/// Edge statements and the `graph`/`node`/`edge` defaults are ignored;
/// backslash-newline continuations are joined first.
pub fn parse_dot_positions(dot: &str) -> HashMap<String, DVec2> {
    let joined = dot.replace("\\\r\n", "").replace("\\\n", "");
    let mut positions = HashMap::new();
    for chunk in joined.split(']') {
        let Some((head, attrs)) = chunk.rsplit_once('[') else {
            continue;
        };
        let statement = head
            .rsplit(|c| c == ';' || c == '{' || c == '\n')
            .next()
            .unwrap_or(head)
            .trim();
        if statement.contains("--") || statement.contains("->") {
            continue;
        }
        let name = statement.trim_matches('"');
        if name.is_empty() || matches!(name, "graph" | "node" | "edge") {
            continue;
        }
        if let Some(pos) = pos_attribute(attrs) {
            positions.insert(name.to_string(), pos);
        }
    }
    positions
}

fn pos_attribute(attrs: &str) -> Option<DVec2> {
    let start = attrs.find("pos=\"")? + "pos=\"".len();
    let value = &attrs[start..];
    let value = &value[..value.find('"')?];
    let mut coords = value.trim_end_matches('!').split(',');
    let x = coords.next()?.trim().parse().ok()?;
    let y = coords.next()?.trim().parse().ok()?;
    Some(dvec2(x, y))
}

/// Places nodes evenly on a unit circle, first node at the top. Needs no
/// external tool; useful for tests and headless hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct CircularLayout;

impl LayoutEngine for CircularLayout {
    fn layout(&self, graph: &LayoutGraph) -> Result<HashMap<String, DVec2>, LayoutError> {
        let step = TAU / graph.nodes.len().max(1) as f64;
        Ok(graph
            .nodes
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let theta = step * i as f64 - FRAC_PI_2;
                (name.clone(), dvec2(theta.cos(), theta.sin()))
            })
            .collect())
    }
}

impl Cell {
    /// Graph of `names` plus every link whose endpoints are both in it.
    pub fn layout_graph(&self, names: &[String]) -> LayoutGraph {
        let exported: HashSet<&str> = names.iter().map(String::as_str).collect();
        let edges = self
            .entities
            .values()
            .filter_map(|e| match &e.shape {
                Shape::Link(link) => {
                    let src = self.entities.get(&link.src)?.name.as_str();
                    let dst = self.entities.get(&link.dst)?.name.as_str();
                    (exported.contains(src) && exported.contains(dst))
                        .then(|| (src.to_string(), dst.to_string()))
                }
                _ => None,
            })
            .collect();
        LayoutGraph {
            nodes: names.to_vec(),
            edges,
        }
    }

    pub fn as_dot_string(&self, names: &[String]) -> String {
        self.layout_graph(names).to_dot()
    }

    /// Lay out the free, non-link entities among `names` and fit them into
    /// the rectangle `from`..`to`, optionally rotated around the canvas centre.
    pub fn spring(
        &mut self,
        from: DVec2,
        to: DVec2,
        names: &[String],
        rotation: Angle,
        engine: &dyn LayoutEngine,
    ) -> Result<(), LayoutError> {
        let mut seen = HashSet::new();
        let names: Vec<String> = names
            .iter()
            .filter(|n| {
                self.get(n)
                    .is_some_and(|e| e.parent.is_none() && !e.is_link())
            })
            .filter(|n| seen.insert(n.as_str()))
            .cloned()
            .collect();
        if names.is_empty() {
            debug!("spring: nothing to lay out");
            return Ok(());
        }

        let positions = engine.layout(&self.layout_graph(&names))?;
        for name in &names {
            if let Some(pos) = positions.get(name) {
                self.move_to(name, *pos)?;
            }
        }
        if rotation != Angle::ZERO {
            let center = self.size() / 2.0;
            for name in &names {
                self.rotate_around(name, rotation, center)?;
            }
        }
        self.fit_within(from, to, &names)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{BoxShape, CellConfig, LinkShape};

    fn scene() -> Cell {
        let mut cell = Cell::new(CellConfig::headless());
        let mut ids = Vec::new();
        for name in ["v1", "v2", "v3"] {
            let shape = Shape::from(BoxShape { size: DVec2::ONE });
            let entity = cell.new_entity(Some(name.into()), DVec2::ZERO, shape);
            ids.push(cell.add(entity));
        }
        let link = cell.new_entity(
            Some("e1".into()),
            DVec2::ZERO,
            Shape::from(LinkShape {
                src: ids[0],
                dst: ids[1],
                stroke: 1.0,
            }),
        );
        cell.add(link);
        cell
    }

    #[test]
    fn dot_export_matches_graphviz_input_format() {
        let cell = scene();
        let names = vec!["v1".to_string(), "v2".to_string()];
        assert_eq!(
            cell.as_dot_string(&names),
            "graph export {\n  \"v1\" [width=\"2\"];\n  \"v2\" [width=\"2\"];\n\"v1\" -- \"v2\";\n}\n"
        );
        // v3 is not exported, so no edge may mention it
        let names = vec!["v1".to_string(), "v3".to_string()];
        assert!(cell.layout_graph(&names).edges.is_empty());
    }

    #[test]
    fn parses_neato_output() {
        let out = "graph export {\n\tgraph [bb=\"0,0,243,108\"];\n\tnode [label=\"\\N\"];\n\
                   \tv1\t[height=0.5,\n\t\tpos=\"72,90\",\n\t\twidth=2];\n\
                   \t\"v 2\"\t[height=0.5, pos=\"171.5,18\", width=2];\n\
                   \tv1 -- \"v 2\"\t[pos=\"93.4,79.3 121.7,64.6 150,50\"];\n}\n";
        let positions = parse_dot_positions(out);
        assert_eq!(positions.len(), 2);
        assert_eq!(positions["v1"], dvec2(72.0, 90.0));
        assert_eq!(positions["v 2"], dvec2(171.5, 18.0));
    }

    #[test]
    fn joins_continuation_lines() {
        let out = "graph {\n\tlongname [pos=\"1\\\n2.5,3\"];\n}\n";
        assert_eq!(parse_dot_positions(out)["longname"], dvec2(12.5, 3.0));
    }

    #[test]
    fn spring_skips_links_and_children_and_fits_region() {
        let mut cell = scene();
        cell.attach("v3", "v1", dvec2(1.0, 1.0)).unwrap();
        let names: Vec<String> = ["v1", "v2", "v3", "e1", "v1"].map(String::from).to_vec();
        cell.spring(
            dvec2(40.0, 30.0),
            dvec2(760.0, 570.0),
            &names,
            Angle::ZERO,
            &CircularLayout,
        )
        .unwrap();
        // two nodes on the unit circle: top and bottom, same x
        assert_eq!(cell.position("v1"), Some(dvec2(400.0, 30.0)));
        assert_eq!(cell.position("v2"), Some(dvec2(400.0, 570.0)));
        assert_eq!(cell.position("v3"), Some(dvec2(401.0, 31.0)));
    }

    #[test]
    fn empty_command_is_rejected() {
        let graph = LayoutGraph {
            nodes: vec!["a".into()],
            edges: Vec::new(),
        };
        assert!(matches!(
            GraphvizLayout::new("  ").layout(&graph),
            Err(LayoutError::EmptyCommand)
        ));
    }

    #[test]
    fn missing_tool_is_a_spawn_error() {
        let graph = LayoutGraph::default();
        assert!(matches!(
            GraphvizLayout::new("cellx-no-such-layout-tool").layout(&graph),
            Err(LayoutError::Spawn { .. })
        ));
    }
}
