use super::{ast::Directive, lexer};
use crate::grammar;
use source_span::{Loc, Span};
use std::fmt;

pub enum Error {
	Lexer(lexer::Error),
	UnexpectedEos,
	UnexpectedToken(lexer::Token),
	UnknownDirective(String),
	MissingSymbol(Directive),

	/// The grammar is well formed but invalid.
	///
	/// The error is located on the offending symbol when it can be found.
	/// The optional span points to a related declaration.
	Compile(grammar::Error, Option<Span>),
}

impl Error {
	/// Additional highlights explaining the error.
	pub fn format_notes(
		&self,
		fmt: &mut source_span::fmt::Formatter,
		style: source_span::fmt::Style,
	) {
		match self {
			Error::Compile(grammar::Error::UndefinedNonTerminal(_), Some(span)) => fmt.add(
				*span,
				Some("declared as a non-terminal here".to_string()),
				style,
			),
			Error::Compile(grammar::Error::ConflictingDeclaration(_), Some(span)) => fmt.add(
				*span,
				Some("used as a non-terminal here".to_string()),
				style,
			),
			_ => (),
		}
	}
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		use self::Error::*;
		match self {
			Lexer(e) => write!(f, "{}", e),
			UnexpectedEos => write!(f, "unexpected end of stream"),
			UnexpectedToken(lexer::Token::Newline) => write!(f, "unexpected end of line"),
			UnexpectedToken(token) => write!(f, "unexpected `{}`", token),
			UnknownDirective(name) => write!(f, "unknown directive `%{}`", name),
			MissingSymbol(directive) => write!(f, "missing symbol after `{}`", directive),
			Compile(e, _) => fmt::Display::fmt(e, f),
		}
	}
}

impl fmt::Debug for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		fmt::Display::fmt(self, f)
	}
}

impl std::error::Error for Error {}

impl From<lexer::Error> for Error {
	fn from(e: lexer::Error) -> Self {
		Error::Lexer(e)
	}
}

impl From<grammar::Error> for Error {
	fn from(e: grammar::Error) -> Self {
		Error::Compile(e, None)
	}
}

pub type Result<T> = std::result::Result<T, Loc<Error>>;
