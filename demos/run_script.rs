//! Run a script headless and print the resulting scene.
//!
//! ```text
//! RUST_LOG=cellx=debug cargo run --example run_script --features tracing -- demo.cell
//! ```

use cellx::{CellConfig, CircularLayout, Interpreter, RecordingRenderer};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: run_script <script.cell> [--circular]");
        std::process::exit(2);
    };
    let source = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {path}: {e}"));

    tracing::info!(path = %path, bytes = source.len(), "running script");
    let mut interp = Interpreter::new(RecordingRenderer::new())
        .with_cell_config(CellConfig::headless())
        .with_source_name(path.as_str());
    if args.any(|a| a == "--circular") {
        interp = interp.with_layout(CircularLayout);
    }

    match interp.run_script(&source) {
        Ok(summary) => {
            println!("{}", interp.cell().dump());
            println!(
                "{} lines, {} statements, {} frames rendered",
                summary.lines,
                summary.statements,
                interp.renderer().frames.len()
            );
        }
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            std::process::exit(1);
        }
    }
}
