//! An animated scene engine driven by a line-oriented command language.
//!
//! Scripts `define` graphical objects (boxes, ellipses, lines, splines,
//! wires, links, polygons, text, bitmaps) in a named scene graph, then
//! move, animate, attach, fade and lay them out. `display` runs the
//! animation to rest, handing every frame to a [`Renderer`].
//!
//! ```
//! use cellx::{CellConfig, Interpreter};
//!
//! let mut interp = Interpreter::default().with_cell_config(CellConfig::headless());
//! interp.run_script("define b1 box 20 20 red 0.5 0.5\nmove b1 10 10").unwrap();
//! assert_eq!(interp.cell().dump(), "box [b1] 20 x 20 @ (10, 10) red\n");
//! ```

pub mod ast;
pub mod errors;
pub mod factory;
pub mod interp;
pub mod lexer;
pub mod log;
pub mod options;
pub mod palette;
pub mod parse;
pub mod render;
pub mod resolve;
pub mod scene;
pub mod types;

pub use ast::{Pattern, ShapeKind, Statement, Verb};
pub use errors::{ErrorKind, LayoutError, SceneError, ScriptError};
pub use interp::{ErrorPolicy, HELP, Interpreter, InterpreterConfig, RunSummary};
pub use palette::{ColorTable, Palette};
pub use render::{Drawable, NullRenderer, Placement, RecordingRenderer, Renderer};
pub use scene::{Cell, CellConfig, CircularLayout, GraphvizLayout, LayoutEngine, SceneEntity};

/// Run `source` on a fresh headless scene and return it.
///
/// Uses the default palette, the `neato` layout tool and abort-on-error.
pub fn run_script(source: &str) -> Result<Cell, ScriptError> {
    let mut interp = Interpreter::default().with_cell_config(CellConfig::headless());
    interp.run_script(source)?;
    Ok(interp.into_cell())
}
