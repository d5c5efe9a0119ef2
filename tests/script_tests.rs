use cellx::{CellConfig, CircularLayout, Interpreter, InterpreterConfig, RecordingRenderer};
use camino::Utf8Path;

/// Scripts carrying this marker use abbreviations and skip the strict pass.
const PREFIX_ONLY: &str = "# prefix-only";

fn interpreter(path: &Utf8Path, strict: bool) -> Interpreter<RecordingRenderer> {
    Interpreter::new(RecordingRenderer::new())
        .with_cell_config(CellConfig::headless())
        .with_layout(CircularLayout)
        .with_source_name(path.as_str())
        .with_config(InterpreterConfig {
            strict,
            ..InterpreterConfig::default()
        })
}

/// Run `source` and describe the outcome the way the fixture files do:
/// the scene dump on success, `<kind> <line>` on failure.
fn outcome(path: &Utf8Path, source: &str, strict: bool) -> String {
    let mut interp = interpreter(path, strict);
    match interp.run_script(source) {
        Ok(_) => interp.cell().dump(),
        Err(e) => format!("{} {}\n", e.kind().name(), e.line()),
    }
}

/// Format a colored inline diff using dissimilar
fn format_inline_diff(expected: &str, actual: &str) -> String {
    use dissimilar::Chunk;

    let mut output = String::from("\nLegend: [-expected only-] [+actual only+]\n\n");
    for chunk in dissimilar::diff(expected, actual) {
        match chunk {
            Chunk::Equal(text) => output.push_str(text),
            Chunk::Delete(text) => output.push_str(&format!("\x1b[31m[-{text}-]\x1b[0m")),
            Chunk::Insert(text) => output.push_str(&format!("\x1b[32m[+{text}+]\x1b[0m")),
        }
    }
    output
}

fn test_script_file(path: &Utf8Path) -> datatest_stable::Result<()> {
    let source = std::fs::read_to_string(path)?;
    let expected_path = path.with_extension("expected");
    let error_path = path.with_extension("error");

    let (expected, wants_error) = if expected_path.exists() {
        (std::fs::read_to_string(&expected_path)?, false)
    } else {
        (std::fs::read_to_string(&error_path)?, true)
    };

    let actual = outcome(path, &source, false);
    if actual != expected {
        panic!(
            "outcome mismatch for {}:\n{}",
            path,
            format_inline_diff(&expected, &actual)
        );
    }

    // both dispatchers must agree on every script the grammar accepts
    if !wants_error && !source.contains(PREFIX_ONLY) {
        let strict = outcome(path, &source, true);
        if strict != actual {
            panic!(
                "strict dispatcher diverges for {}:\n{}",
                path,
                format_inline_diff(&actual, &strict)
            );
        }
    }

    Ok(())
}

datatest_stable::harness! {
    { test = test_script_file, root = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/scripts"), pattern = r"\.cell$" },
}
