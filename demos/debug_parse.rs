use cellx::parse::{CellParser, Rule};
use pest::Parser;

fn main() {
    let input = std::env::args().nth(1).unwrap_or_else(|| {
        r#"define t text -c "hello world" 24 cyan b1+0-20; animate /^v/ 0.5 0.5"#.to_string()
    });

    println!("Parsing: {}", input);
    println!();

    match CellParser::parse(Rule::line, &input) {
        Ok(pairs) => {
            println!(
                "{}",
                pest_ascii_tree::into_ascii_tree(pairs.clone()).unwrap()
            );
        }
        Err(e) => {
            eprintln!("Parse error: {}", e);
        }
    }
}
