pub use source_span::{Loc, Position, Span};
use std::iter::Peekable;

mod ast;
mod compile;
mod error;
pub mod lexer;

pub use ast::*;
pub use error::{Error, Result};
pub use lexer::Lexer;
use lexer::Token;

pub trait Parsable: Sized {
	fn parse<L: Iterator<Item = lexer::Result<Loc<Token>>>>(
		lexer: &mut Peekable<L>,
	) -> Result<Loc<Self>>;

	fn parse_only<L: Iterator<Item = lexer::Result<Loc<Token>>>>(
		lexer: &mut Peekable<L>,
	) -> Result<Loc<Self>> {
		let value = Self::parse(lexer)?;

		if let Some(unexpected) = lexer.next().transpose().map_err(|e| e.inner_into())? {
			let (unexpected, span) = unexpected.into_raw_parts();
			return Err(Loc::new(Error::UnexpectedToken(unexpected), span));
		}

		Ok(value)
	}
}

fn peek<L: Iterator<Item = lexer::Result<Loc<Token>>>>(
	lexer: &mut Peekable<L>,
) -> Result<Option<Loc<Token>>> {
	match lexer.peek() {
		Some(Ok(token)) => Ok(Some(token.clone())),
		Some(Err(_)) => {
			let mut dummy_span = Span::default();
			consume(lexer, &mut dummy_span)
		}
		None => Ok(None),
	}
}

fn consume<L: Iterator<Item = lexer::Result<Loc<Token>>>>(
	lexer: &mut Peekable<L>,
	span: &mut Span,
) -> Result<Option<Loc<Token>>> {
	match lexer.next() {
		Some(Ok(token)) => {
			if span.is_empty() {
				*span = token.span();
			} else {
				span.append(token.span());
			}
			Ok(Some(token))
		}
		Some(Err(e)) => Err(e.inner_into()),
		None => Ok(None),
	}
}

fn expect<L: Iterator<Item = lexer::Result<Loc<Token>>>>(
	lexer: &mut Peekable<L>,
	span: &mut Span,
) -> Result<Loc<Token>> {
	if let Some(token) = consume(lexer, span)? {
		Ok(token)
	} else {
		Err(Loc::new(Error::UnexpectedEos, span.end().into()))
	}
}

fn unexpected(token: &Loc<Token>) -> Loc<Error> {
	Loc::new(Error::UnexpectedToken(token.as_ref().clone()), token.span())
}

/// Parses `|`-separated alternatives up to the end of the line.
///
/// `separator` is the span of the arrow preceding the first alternative.
fn parse_alternatives<L: Iterator<Item = lexer::Result<Loc<Token>>>>(
	lexer: &mut Peekable<L>,
	mut separator: Span,
	span: &mut Span,
) -> Result<Vec<Loc<Alternative>>> {
	let mut alternatives = Vec::new();

	loop {
		let (alternative, alternative_span) = Alternative::parse(lexer)?.into_raw_parts();
		let alternative_span = if alternative.symbols.is_empty() {
			separator.end().into()
		} else {
			span.append(alternative_span);
			alternative_span
		};

		alternatives.push(Loc::new(alternative, alternative_span));

		match peek(lexer)? {
			Some(token) if *token.as_ref() == Token::Pipe => {
				separator = token.span();
				consume(lexer, span)?;
			}
			_ => break,
		}
	}

	Ok(alternatives)
}

impl Parsable for Grammar {
	fn parse<L: Iterator<Item = lexer::Result<Loc<Token>>>>(
		lexer: &mut Peekable<L>,
	) -> Result<Loc<Self>> {
		let mut span = Span::default();
		let mut items: Vec<Loc<Item>> = Vec::new();

		while let Some(token) = peek(lexer)? {
			match token.as_ref() {
				Token::Newline => {
					consume(lexer, &mut span)?;
				}
				Token::Pipe => {
					let lhs = items.iter().rev().find_map(|item| match item.as_ref() {
						Item::Rule(lhs, _) => Some(lhs.clone()),
						_ => None,
					});

					let lhs = match lhs {
						Some(lhs) => lhs,
						None => return Err(unexpected(&token)),
					};

					let mut item_span = token.span();
					consume(lexer, &mut span)?;
					let alternatives = parse_alternatives(lexer, token.span(), &mut item_span)?;
					span.append(item_span);
					items.push(Loc::new(Item::Rule(lhs, alternatives), item_span))
				}
				_ => {
					let item = Item::parse(lexer)?;
					span.append(item.span());
					items.push(item)
				}
			}
		}

		Ok(Loc::new(Grammar { items }, span))
	}
}

impl Parsable for Item {
	fn parse<L: Iterator<Item = lexer::Result<Loc<Token>>>>(
		lexer: &mut Peekable<L>,
	) -> Result<Loc<Self>> {
		let mut span = Span::default();
		let token = expect(lexer, &mut span)?;

		match token.as_ref() {
			Token::Directive(name) => {
				let directive = match Directive::from_name(name) {
					Some(directive) => Loc::new(directive, token.span()),
					None => {
						return Err(Loc::new(
							Error::UnknownDirective(name.clone()),
							token.span(),
						))
					}
				};

				let mut symbols = Vec::new();
				while let Some(next) = peek(lexer)? {
					match next.as_ref() {
						Token::Symbol(c) => {
							consume(lexer, &mut span)?;
							symbols.push(Loc::new(*c, next.span()))
						}
						Token::Newline => break,
						_ => return Err(unexpected(&next)),
					}
				}

				if symbols.is_empty() {
					return Err(Loc::new(
						Error::MissingSymbol(*directive.as_ref()),
						token.span(),
					));
				}

				if directive.as_ref().is_single() && symbols.len() > 1 {
					let extra = &symbols[1];
					return Err(Loc::new(
						Error::UnexpectedToken(Token::Symbol(*extra.as_ref())),
						extra.span(),
					));
				}

				Ok(Loc::new(Item::Directive(directive, symbols), span))
			}
			Token::Symbol(c) => {
				let lhs = Loc::new(*c, token.span());
				let arrow = expect(lexer, &mut span)?;
				if *arrow.as_ref() != Token::Arrow {
					return Err(unexpected(&arrow));
				}

				let alternatives = parse_alternatives(lexer, arrow.span(), &mut span)?;
				Ok(Loc::new(Item::Rule(lhs, alternatives), span))
			}
			_ => Err(unexpected(&token)),
		}
	}
}

impl Parsable for Alternative {
	/// Parses the symbols of an alternative.
	///
	/// The span of an empty alternative is the default span.
	fn parse<L: Iterator<Item = lexer::Result<Loc<Token>>>>(
		lexer: &mut Peekable<L>,
	) -> Result<Loc<Self>> {
		let mut span = Span::default();
		let mut symbols = Vec::new();

		while let Some(token) = peek(lexer)? {
			match token.as_ref() {
				Token::Symbol(c) => {
					consume(lexer, &mut span)?;
					symbols.push(Loc::new(*c, token.span()))
				}
				Token::Arrow => return Err(unexpected(&token)),
				_ => break,
			}
		}

		Ok(Loc::new(Alternative { symbols }, span))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(input: &str) -> Result<Loc<Grammar>> {
		let mut lexer = Lexer::new(input.chars().map(Ok), source_span::DEFAULT_METRICS).peekable();
		Grammar::parse_only(&mut lexer)
	}

	fn rules(grammar: &Grammar) -> Vec<(char, Vec<String>)> {
		grammar
			.items
			.iter()
			.filter_map(|item| match item.as_ref() {
				Item::Rule(lhs, alternatives) => Some((
					*lhs.as_ref(),
					alternatives
						.iter()
						.map(|a| a.as_ref().symbols.iter().map(|s| *s.as_ref()).collect())
						.collect(),
				)),
				_ => None,
			})
			.collect()
	}

	#[test]
	fn rules_and_continuations() {
		let grammar = parse("E -> E+T\n  | T\n\nT -> T*F | F |\n")
			.unwrap()
			.into_inner();
		assert_eq!(
			rules(&grammar),
			vec![
				('E', vec!["E+T".to_string()]),
				('E', vec!["T".to_string()]),
				('T', vec!["T*F".to_string(), "F".to_string(), String::new()])
			]
		)
	}

	#[test]
	fn directives() {
		let grammar = parse("%start S\n%terminals a b\nS -> ab").unwrap().into_inner();
		match grammar.items[1].as_ref() {
			Item::Directive(directive, symbols) => {
				assert_eq!(*directive.as_ref(), Directive::Terminals);
				assert_eq!(symbols.len(), 2)
			}
			_ => panic!("expected a directive"),
		}
	}

	#[test]
	fn syntax_errors() {
		match parse("S a").map(|_| ()).unwrap_err().into_inner() {
			Error::UnexpectedToken(Token::Symbol('a')) => (),
			e => panic!("unexpected error: {}", e),
		}

		match parse("S").map(|_| ()).unwrap_err().into_inner() {
			Error::UnexpectedEos => (),
			e => panic!("unexpected error: {}", e),
		}

		match parse("| a").map(|_| ()).unwrap_err().into_inner() {
			Error::UnexpectedToken(Token::Pipe) => (),
			e => panic!("unexpected error: {}", e),
		}

		match parse("%unknown a\n").map(|_| ()).unwrap_err().into_inner() {
			Error::UnknownDirective(name) => assert_eq!(name, "unknown"),
			e => panic!("unexpected error: {}", e),
		}

		match parse("%start\nS -> a").map(|_| ()).unwrap_err().into_inner() {
			Error::MissingSymbol(Directive::Start) => (),
			e => panic!("unexpected error: {}", e),
		}

		match parse("%start S T\nS -> a").map(|_| ()).unwrap_err().into_inner() {
			Error::UnexpectedToken(Token::Symbol('T')) => (),
			e => panic!("unexpected error: {}", e),
		}
	}
}
