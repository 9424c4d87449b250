use super::{Alternative, Directive, Error, Grammar, Item, Result};
use crate::grammar;
use source_span::{Loc, Span};

impl Grammar {
	fn rules(&self) -> impl '_ + Iterator<Item = (&Loc<char>, &Loc<Alternative>)> {
		self.items.iter().flat_map(|item| match item.as_ref() {
			Item::Rule(lhs, alternatives) => {
				alternatives
					.iter()
					.map(move |alternative| (lhs, alternative))
					.collect::<Vec<_>>()
			}
			Item::Directive(_, _) => Vec::new(),
		})
	}

	fn declarations(&self, kind: Directive) -> impl '_ + Iterator<Item = &Loc<char>> {
		self.items.iter().flat_map(move |item| match item.as_ref() {
			Item::Directive(directive, symbols) if *directive.as_ref() == kind => {
				symbols.iter().collect::<Vec<_>>()
			}
			_ => Vec::new(),
		})
	}

	/// First use of the given symbol in a right hand side.
	fn first_use(&self, c: char) -> Option<Span> {
		self.rules()
			.flat_map(|(_, alternative)| alternative.as_ref().symbols.iter())
			.find(|symbol| *symbol.as_ref() == c)
			.map(|symbol| symbol.span())
	}

	/// First definition of the given non-terminal.
	fn definition(&self, c: char) -> Option<Span> {
		self.rules()
			.map(|(lhs, _)| lhs)
			.find(|lhs| *lhs.as_ref() == c)
			.map(|lhs| lhs.span())
	}

	fn declaration(&self, kind: Directive, c: char) -> Option<Span> {
		self.declarations(kind)
			.find(|symbol| *symbol.as_ref() == c)
			.map(|symbol| symbol.span())
	}

	/// Locates a grammar error on the symbol that caused it.
	fn locate(&self, e: grammar::Error) -> Loc<Error> {
		use grammar::Error::*;
		let (span, related) = match e {
			EmptyGrammar => (None, None),
			NoStartSymbol(_) => (
				self.declarations(Directive::Start).last().map(|s| s.span()),
				None,
			),
			UndefinedNonTerminal(c) => (
				self.first_use(c),
				self.declaration(Directive::NonTerminals, c),
			),
			UndeclaredSymbol(c) => (self.first_use(c), None),
			ConflictingDeclaration(c) => (
				self.declaration(Directive::Terminals, c),
				self.definition(c)
					.or_else(|| self.declaration(Directive::NonTerminals, c)),
			),
			ReservedSymbol(c) => (
				self.definition(c)
					.or_else(|| self.first_use(c))
					.or_else(|| self.declaration(Directive::NonTerminals, c))
					.or_else(|| self.declaration(Directive::Terminals, c)),
				None,
			),
		};

		Loc::new(Error::Compile(e, related), span.unwrap_or_default())
	}

	/// Compiles the grammar.
	///
	/// Each production keeps the span of its alternative.
	pub fn compile(&self) -> Result<grammar::Grammar> {
		let mut builder = grammar::Builder::new();

		for item in &self.items {
			match item.as_ref() {
				Item::Directive(directive, symbols) => {
					for symbol in symbols {
						let c = *symbol.as_ref();
						match directive.as_ref() {
							Directive::Start => builder.set_start(c),
							Directive::NonTerminals => builder.declare_non_terminal(c),
							Directive::Terminals => builder.declare_terminal(c),
							Directive::Epsilon => builder.set_epsilon(c),
						}
					}
				}
				Item::Rule(lhs, alternatives) => {
					for alternative in alternatives {
						builder.add_rule(
							*lhs.as_ref(),
							alternative
								.as_ref()
								.symbols
								.iter()
								.map(|s| *s.as_ref())
								.collect(),
							Some(alternative.span()),
						)
					}
				}
			}
		}

		builder.build().map_err(|e| self.locate(e))
	}
}
