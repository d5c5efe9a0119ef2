//! Parse pest pairs into statements

use crate::ast::{Statement, Verb};
use crate::errors::{ErrorKind, LineContext, ScriptError};
use pest::Parser;
use pest::error::InputLocation;
use pest::iterators::Pair;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "cell.pest"]
pub struct CellParser;

/// Parse one script line with the strict grammar.
pub fn parse_line(line: &str, ctx: &LineContext<'_>) -> Result<Vec<Statement>, ScriptError> {
    let pairs = CellParser::parse(Rule::line, line).map_err(|e| grammar_error(ctx, e))?;

    let mut statements = Vec::new();
    for pair in pairs {
        if pair.as_rule() == Rule::line {
            for inner in pair.into_inner() {
                if let Some(stmt) = parse_statement(inner, ctx.line) {
                    statements.push(stmt);
                }
            }
        }
    }
    Ok(statements)
}

/// Parse a whole script. Line numbers come from the parser.
pub fn parse_script(source: &str, ctx: &LineContext<'_>) -> Result<Vec<Statement>, ScriptError> {
    let pairs = CellParser::parse(Rule::script, source).map_err(|e| grammar_error(ctx, e))?;

    let mut statements = Vec::new();
    for pair in pairs {
        if pair.as_rule() == Rule::script {
            for inner in pair.into_inner() {
                let (line, _) = inner.line_col();
                if let Some(stmt) = parse_statement(inner, line) {
                    statements.push(stmt);
                }
            }
        }
    }
    Ok(statements)
}

fn parse_statement(pair: Pair<Rule>, line: usize) -> Option<Statement> {
    let verb = verb_of(pair.as_rule())?;
    // the first child is always the keyword
    let args = pair.into_inner().skip(1).map(argument).collect();
    Some(Statement { verb, args, line })
}

fn argument(pair: Pair<Rule>) -> String {
    match pair.as_rule() {
        Rule::string => pair
            .into_inner()
            .next()
            .map(|text| text.as_str().to_string())
            .unwrap_or_default(),
        _ => pair.as_str().to_string(),
    }
}

fn verb_of(rule: Rule) -> Option<Verb> {
    let verb = match rule {
        Rule::alpha => Verb::Alpha,
        Rule::animate => Verb::Animate,
        Rule::attach => Verb::Attach,
        Rule::color_cmd => Verb::Color,
        Rule::define => Verb::Define,
        Rule::display => Verb::Display,
        Rule::fade => Verb::Fade,
        Rule::fix => Verb::Fix,
        Rule::hide => Verb::Hide,
        Rule::kill => Verb::Kill,
        Rule::move_cmd => Verb::Move,
        Rule::palette => Verb::Palette,
        Rule::play => Verb::Play,
        Rule::priority => Verb::Priority,
        Rule::resize => Verb::Resize,
        Rule::scale => Verb::Scale,
        Rule::shift => Verb::Shift,
        Rule::sleep => Verb::Sleep,
        Rule::spring => Verb::Spring,
        Rule::unhide => Verb::Unhide,
        Rule::wait => Verb::Wait,
        _ => return None,
    };
    Some(verb)
}

/// Human-readable rule names for "expected ..." messages.
fn describe(rule: &Rule) -> String {
    match rule {
        Rule::EOI => "end of line".into(),
        Rule::pattern => "object name or pattern".into(),
        Rule::identifier => "name".into(),
        Rule::number => "number".into(),
        Rule::reference => "object reference".into(),
        Rule::color => "colour".into(),
        Rule::string | Rule::word => "text".into(),
        Rule::opt_f | Rule::opt_r | Rule::opt_arrows | Rule::opt_align => "option".into(),
        Rule::comment | Rule::comment_line => "comment".into(),
        other => {
            let name = format!("{other:?}");
            match name.split_once('_') {
                Some(("kw" | "ty", word)) => format!("'{word}'"),
                _ => name,
            }
        }
    }
}

fn grammar_error(ctx: &LineContext<'_>, err: pest::error::Error<Rule>) -> ScriptError {
    let err = err.renamed_rules(describe);
    let (offset, len) = match err.location {
        InputLocation::Pos(pos) => (pos, 1),
        InputLocation::Span((start, end)) => (start, end.saturating_sub(start).max(1)),
    };
    ctx.error_at(ErrorKind::Syntax, err.variant.message(), offset, len)
}
