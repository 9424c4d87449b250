use source_span::{Loc, Metrics, Span};
use std::fmt;
use std::io;
use std::iter::Peekable;

pub enum Error {
	IO(std::io::Error),
	EmptyDirective,
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		use self::Error::*;
		match self {
			IO(e) => write!(f, "I/O: {}", e),
			EmptyDirective => write!(f, "missing directive name"),
		}
	}
}

impl fmt::Debug for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		fmt::Display::fmt(self, f)
	}
}

pub type Result<T> = std::result::Result<T, Loc<Error>>;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Token {
	/// `%name` at the start of a line.
	Directive(String),

	/// `->` or `→`.
	Arrow,

	Pipe,

	/// Any other non-blank character.
	Symbol(char),

	Newline,
}

impl fmt::Display for Token {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		use self::Token::*;
		match self {
			Directive(name) => write!(f, "%{}", name),
			Arrow => write!(f, "->"),
			Pipe => write!(f, "|"),
			Symbol(c) => fmt::Display::fmt(c, f),
			Newline => write!(f, "end of line"),
		}
	}
}

fn is_space(c: char) -> bool {
	c != '\n' && c.is_whitespace()
}

/// Grammar text lexer.
///
/// Newlines are significant and produced as tokens.
/// `%%` at the start of a line begins a comment running to the end of the line.
pub struct Lexer<I: Iterator<Item = io::Result<char>>, M: Metrics> {
	input: Peekable<I>,
	metrics: M,
	span: Span,

	/// No token has been produced on the current line yet.
	line_start: bool,
}

impl<I: Iterator<Item = io::Result<char>>, M: Metrics> Lexer<I, M> {
	pub fn new(input: I, metrics: M) -> Lexer<I, M> {
		Lexer {
			input: input.peekable(),
			metrics,
			span: Span::default(),
			line_start: true,
		}
	}

	fn peek(&mut self) -> Result<Option<char>> {
		match self.input.peek() {
			Some(Ok(c)) => Ok(Some(*c)),
			Some(Err(_)) => self.consume(),
			None => Ok(None),
		}
	}

	fn consume(&mut self) -> Result<Option<char>> {
		match self.input.next() {
			Some(Ok(c)) => {
				self.span.push(c, &self.metrics);
				Ok(Some(c))
			}
			Some(Err(e)) => Err(Loc::new(Error::IO(e), self.span.end().into())),
			None => Ok(None),
		}
	}

	fn skip_line(&mut self) -> Result<()> {
		while let Some(c) = self.peek()? {
			if c == '\n' {
				break;
			}

			self.consume()?;
		}

		Ok(())
	}

	fn skip_whitespaces(&mut self) -> Result<()> {
		while let Some(c) = self.peek()? {
			if is_space(c) {
				self.consume()?;
			} else {
				break;
			}
		}

		Ok(())
	}

	/// Parses what follows a `%` at the start of a line.
	///
	/// Returns `None` if it was a comment.
	fn parse_directive(&mut self) -> Result<Option<Loc<Token>>> {
		if let Some('%') = self.peek()? {
			self.skip_line()?;
			return Ok(None);
		}

		let mut name = String::new();
		while let Some(c) = self.peek()? {
			if c.is_alphanumeric() || c == '_' || c == '-' {
				self.consume()?;
				name.push(c)
			} else {
				break;
			}
		}

		if name.is_empty() {
			Err(Loc::new(Error::EmptyDirective, self.span))
		} else {
			Ok(Some(Loc::new(Token::Directive(name), self.span)))
		}
	}

	fn parse_token(&mut self) -> Result<Option<Loc<Token>>> {
		loop {
			self.skip_whitespaces()?;
			self.span.clear();

			let c = match self.consume()? {
				Some(c) => c,
				None => return Ok(None),
			};

			let line_start = self.line_start;
			self.line_start = c == '\n';

			let token = match c {
				'\n' => Token::Newline,
				'%' if line_start => match self.parse_directive()? {
					Some(token) => return Ok(Some(token)),
					None => {
						self.line_start = true;
						continue;
					}
				},
				'|' => Token::Pipe,
				'→' => Token::Arrow,
				'-' => {
					if let Some('>') = self.peek()? {
						self.consume()?;
						Token::Arrow
					} else {
						Token::Symbol('-')
					}
				}
				c => Token::Symbol(c),
			};

			return Ok(Some(Loc::new(token, self.span)));
		}
	}
}

impl<I: Iterator<Item = io::Result<char>>, M: Metrics> Iterator for Lexer<I, M> {
	type Item = Result<Loc<Token>>;

	fn next(&mut self) -> Option<Result<Loc<Token>>> {
		self.parse_token().transpose()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn tokens(input: &str) -> Vec<Token> {
		Lexer::new(input.chars().map(Ok), source_span::DEFAULT_METRICS)
			.map(|token| token.unwrap().into_inner())
			.collect()
	}

	#[test]
	fn rule() {
		assert_eq!(
			tokens("E -> E+T | T\n"),
			vec![
				Token::Symbol('E'),
				Token::Arrow,
				Token::Symbol('E'),
				Token::Symbol('+'),
				Token::Symbol('T'),
				Token::Pipe,
				Token::Symbol('T'),
				Token::Newline
			]
		)
	}

	#[test]
	fn unicode_arrow_and_minus() {
		assert_eq!(
			tokens("A→a-b"),
			vec![
				Token::Symbol('A'),
				Token::Arrow,
				Token::Symbol('a'),
				Token::Symbol('-'),
				Token::Symbol('b')
			]
		)
	}

	#[test]
	fn directives_and_comments() {
		assert_eq!(
			tokens("%% comment -> |\n  %start S\nA -> %"),
			vec![
				Token::Newline,
				Token::Directive("start".to_string()),
				Token::Symbol('S'),
				Token::Newline,
				Token::Symbol('A'),
				Token::Arrow,
				Token::Symbol('%')
			]
		)
	}

	#[test]
	fn empty_directive() {
		let mut lexer = Lexer::new("% S".chars().map(Ok), source_span::DEFAULT_METRICS);
		match lexer.next() {
			Some(Err(e)) => match e.into_inner() {
				Error::EmptyDirective => (),
				e => panic!("unexpected error: {}", e),
			},
			_ => panic!("expected an error"),
		}
	}
}
