extern crate source_span;

use source_span::Metrics;
use std::io;

pub mod grammar;
pub mod out;
pub mod parsing;
pub mod syntax;

pub use grammar::Grammar;
pub use parsing::{Algorithm, Construction};

use syntax::Parsable;

/// Parses and compiles a grammar text.
pub fn parse_and_compile<I: Iterator<Item = io::Result<char>>, M: Metrics>(
	input: I,
	metrics: M,
) -> syntax::Result<Grammar> {
	let mut lexer = syntax::Lexer::new(input, metrics).peekable();
	let ast = syntax::Grammar::parse_only(&mut lexer)?;
	ast.as_ref().compile()
}

/// Parses and compiles a grammar given as a string.
pub fn parse_str(input: &str) -> syntax::Result<Grammar> {
	parse_and_compile(input.chars().map(Ok), source_span::DEFAULT_METRICS)
}
