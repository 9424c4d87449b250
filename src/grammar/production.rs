use super::{Grammar, Symbol};
use source_span::Span;
use std::fmt;

/// Grammar production.
#[derive(Clone, Debug)]
pub struct Production {
	/// Left hand side, or `None` for the augmented start production.
	lhs: Option<char>,

	/// Right hand side. Empty for an epsilon production.
	rhs: Vec<Symbol>,

	/// Location of the production in the grammar source, if any.
	span: Option<Span>,
}

impl Production {
	pub(crate) fn new(lhs: Option<char>, rhs: Vec<Symbol>, span: Option<Span>) -> Self {
		Self { lhs, rhs, span }
	}

	pub fn lhs(&self) -> Option<char> {
		self.lhs
	}

	pub fn is_augmented(&self) -> bool {
		self.lhs.is_none()
	}

	pub fn rhs(&self) -> &[Symbol] {
		&self.rhs
	}

	pub fn len(&self) -> u32 {
		self.rhs.len() as u32
	}

	pub fn is_empty(&self) -> bool {
		self.rhs.is_empty()
	}

	/// Symbol at the given offset of the right hand side.
	pub fn symbol(&self, offset: u32) -> Option<Symbol> {
		self.rhs.get(offset as usize).cloned()
	}

	pub fn span(&self) -> Option<Span> {
		self.span
	}

	pub fn format<'g>(&self, grammar: &'g Grammar) -> FormattedProduction<'g, '_> {
		FormattedProduction(grammar, self)
	}
}

/// Writes the left hand side of a production.
///
/// The augmented production is named after the start symbol with a prime.
pub(crate) fn write_lhs(f: &mut fmt::Formatter, grammar: &Grammar, lhs: Option<char>) -> fmt::Result {
	match lhs {
		Some(c) => fmt::Display::fmt(&c, f),
		None => write!(f, "{}'", grammar.start()),
	}
}

pub struct FormattedProduction<'g, 'p>(&'g Grammar, &'p Production);

impl<'g, 'p> fmt::Display for FormattedProduction<'g, 'p> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write_lhs(f, self.0, self.1.lhs)?;
		write!(f, " ->")?;

		if self.1.rhs.is_empty() {
			write!(f, " {}", Symbol::Epsilon)
		} else {
			write!(f, " ")?;
			for symbol in &self.1.rhs {
				fmt::Display::fmt(symbol, f)?
			}

			Ok(())
		}
	}
}
