//! Print the tree-sitter syntax tree of a Kotlin file, with byte ranges.
//! Handy when adding node kinds to the collector.

use std::env;
use std::fs;
use std::process::ExitCode;
use tree_sitter::{Node, Parser};

fn main() -> ExitCode {
    let Some(path) = env::args().nth(1) else {
        eprintln!("usage: dump_tree <FILE.kt>");
        return ExitCode::FAILURE;
    };
    let source = match fs::read_to_string(&path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{}: {}", path, e);
            return ExitCode::FAILURE;
        }
    };

    let mut parser = Parser::new();
    if parser.set_language(&tree_sitter_kotlin::language()).is_err() {
        eprintln!("Kotlin grammar version mismatch");
        return ExitCode::FAILURE;
    }
    let Some(tree) = parser.parse(&source, None) else {
        eprintln!("{}: parse failed", path);
        return ExitCode::FAILURE;
    };

    print_tree(tree.root_node(), &source, 0);
    ExitCode::SUCCESS
}

fn print_tree(node: Node, source: &str, indent: usize) {
    let indent_str = "  ".repeat(indent);
    let field = if node.is_named() { "" } else { "'" };
    let text = if node.child_count() == 0 {
        format!(" \"{}\"", node.utf8_text(source.as_bytes()).unwrap_or(""))
    } else {
        String::new()
    };
    println!(
        "{}{}{}{} [{}..{}]",
        indent_str,
        field,
        node.kind(),
        text,
        node.start_byte(),
        node.end_byte()
    );

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        print_tree(child, source, indent + 1);
    }
}
