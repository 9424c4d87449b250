use source_span::Span;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub(crate) mod production;
mod symbol;

pub use production::{FormattedProduction, Production};
pub use symbol::{Symbol, END_MARKER, EPSILON_MARKER};

/// Grammar construction error.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Error {
	/// The grammar has no production.
	EmptyGrammar,

	/// The start symbol is not the left hand side of any production.
	NoStartSymbol(char),

	/// A declared non-terminal is used but never defined.
	UndefinedNonTerminal(char),

	/// A symbol is used that is neither a non-terminal nor a declared terminal.
	UndeclaredSymbol(char),

	/// A symbol is declared both as a terminal and a non-terminal.
	ConflictingDeclaration(char),

	/// A reserved character is used as a grammar symbol.
	ReservedSymbol(char),
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		use self::Error::*;
		match self {
			EmptyGrammar => write!(f, "empty grammar"),
			NoStartSymbol(c) => write!(f, "start symbol `{}` has no production", c),
			UndefinedNonTerminal(c) => write!(f, "undefined non-terminal `{}`", c),
			UndeclaredSymbol(c) => write!(f, "undeclared symbol `{}`", c),
			ConflictingDeclaration(c) => {
				write!(f, "`{}` is declared both as a terminal and a non-terminal", c)
			}
			ReservedSymbol(c) => write!(f, "reserved symbol `{}`", c),
		}
	}
}

impl std::error::Error for Error {}

/// Context-free grammar.
///
/// Production `0` is always the augmented start production `S' -> S`.
/// A grammar is immutable once built.
#[derive(Debug)]
pub struct Grammar {
	productions: Vec<Production>,
	start: char,
	terminals: BTreeSet<char>,
	non_terminals: BTreeSet<char>,

	/// Productions indexed by their left hand side.
	by_lhs: BTreeMap<char, Vec<u32>>,
}

impl Grammar {
	pub fn builder() -> Builder {
		Builder::new()
	}

	pub fn start(&self) -> char {
		self.start
	}

	pub fn productions(&self) -> &[Production] {
		&self.productions
	}

	pub fn production(&self, index: u32) -> Option<&Production> {
		self.productions.get(index as usize)
	}

	pub fn enumerate_productions(&self) -> impl '_ + Iterator<Item = (u32, &Production)> {
		self.productions
			.iter()
			.enumerate()
			.map(|(i, p)| (i as u32, p))
	}

	/// Indexes of the productions of the given non-terminal.
	pub fn productions_of(&self, non_terminal: char) -> &[u32] {
		self.by_lhs
			.get(&non_terminal)
			.map(Vec::as_slice)
			.unwrap_or(&[])
	}

	pub fn terminals(&self) -> &BTreeSet<char> {
		&self.terminals
	}

	pub fn non_terminals(&self) -> &BTreeSet<char> {
		&self.non_terminals
	}

	/// Every symbol that can label an ACTION column: the terminals followed by the end marker.
	pub fn lookaheads(&self) -> impl '_ + Iterator<Item = Symbol> {
		self.terminals
			.iter()
			.map(|t| Symbol::Terminal(*t))
			.chain(std::iter::once(Symbol::EndMarker))
	}

	pub fn format(&self) -> FormattedGrammar {
		FormattedGrammar(self)
	}
}

pub struct FormattedGrammar<'g>(&'g Grammar);

impl<'g> fmt::Display for FormattedGrammar<'g> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		for (i, production) in self.0.enumerate_productions() {
			write!(f, "{}: {}\n", i, production.format(self.0))?
		}

		Ok(())
	}
}

struct Rule {
	lhs: char,
	rhs: Vec<char>,
	span: Option<Span>,
}

/// Grammar builder.
///
/// Every left hand side character is a non-terminal.
/// Additional non-terminals can be declared so that their use without definition is reported.
/// When terminals are declared, any other right hand side character is rejected.
pub struct Builder {
	start: Option<char>,
	non_terminals: BTreeSet<char>,
	terminals: Option<BTreeSet<char>>,
	epsilon: char,
	rules: Vec<Rule>,
}

impl Default for Builder {
	fn default() -> Self {
		Self::new()
	}
}

impl Builder {
	pub fn new() -> Self {
		Self {
			start: None,
			non_terminals: BTreeSet::new(),
			terminals: None,
			epsilon: EPSILON_MARKER,
			rules: Vec::new(),
		}
	}

	pub fn set_start(&mut self, start: char) {
		self.start = Some(start)
	}

	pub fn declare_non_terminal(&mut self, c: char) {
		self.non_terminals.insert(c);
	}

	pub fn declare_terminal(&mut self, c: char) {
		self.terminals.get_or_insert_with(BTreeSet::new).insert(c);
	}

	pub fn set_epsilon(&mut self, c: char) {
		self.epsilon = c
	}

	/// Adds a production. Epsilon markers in `rhs` are ignored.
	pub fn add_rule(&mut self, lhs: char, rhs: Vec<char>, span: Option<Span>) {
		self.rules.push(Rule { lhs, rhs, span })
	}

	pub fn start(mut self, start: char) -> Self {
		self.set_start(start);
		self
	}

	pub fn non_terminals(mut self, symbols: &str) -> Self {
		for c in symbols.chars().filter(|c| !c.is_whitespace()) {
			self.declare_non_terminal(c)
		}
		self
	}

	pub fn terminals(mut self, symbols: &str) -> Self {
		for c in symbols.chars().filter(|c| !c.is_whitespace()) {
			self.declare_terminal(c)
		}
		self
	}

	pub fn epsilon(mut self, c: char) -> Self {
		self.set_epsilon(c);
		self
	}

	/// Adds the `|`-separated alternatives of `lhs`.
	/// Whitespace is ignored.
	pub fn rule(mut self, lhs: char, alternatives: &str) -> Self {
		for alternative in alternatives.split('|') {
			let rhs = alternative.chars().filter(|c| !c.is_whitespace()).collect();
			self.add_rule(lhs, rhs, None)
		}
		self
	}

	fn is_epsilon(&self, c: char) -> bool {
		c == self.epsilon || c == 'ε'
	}

	pub fn build(self) -> Result<Grammar, Error> {
		let first = self.rules.first().ok_or(Error::EmptyGrammar)?;
		let start = self.start.unwrap_or(first.lhs);

		let defined: BTreeSet<char> = self.rules.iter().map(|rule| rule.lhs).collect();
		let mut non_terminals = self.non_terminals.clone();
		non_terminals.extend(defined.iter().cloned());

		for &c in &non_terminals {
			if c == END_MARKER || self.is_epsilon(c) {
				return Err(Error::ReservedSymbol(c));
			}
		}

		if let Some(declared) = &self.terminals {
			for &c in declared {
				if c == END_MARKER || self.is_epsilon(c) {
					return Err(Error::ReservedSymbol(c));
				}

				if non_terminals.contains(&c) {
					return Err(Error::ConflictingDeclaration(c));
				}
			}
		}

		if !defined.contains(&start) {
			return Err(Error::NoStartSymbol(start));
		}

		let mut terminals = self.terminals.clone().unwrap_or_default();
		let mut productions = Vec::with_capacity(self.rules.len() + 1);
		productions.push(Production::new(
			None,
			vec![Symbol::NonTerminal(start)],
			None,
		));

		for rule in &self.rules {
			let mut rhs = Vec::with_capacity(rule.rhs.len());

			for &c in rule.rhs.iter().filter(|c| !self.is_epsilon(**c)) {
				let symbol = if non_terminals.contains(&c) {
					if !defined.contains(&c) {
						return Err(Error::UndefinedNonTerminal(c));
					}

					Symbol::NonTerminal(c)
				} else {
					if c == END_MARKER {
						return Err(Error::ReservedSymbol(c));
					}

					match &self.terminals {
						Some(declared) if !declared.contains(&c) => {
							return Err(Error::UndeclaredSymbol(c))
						}
						_ => {
							terminals.insert(c);
						}
					}

					Symbol::Terminal(c)
				};

				rhs.push(symbol)
			}

			productions.push(Production::new(Some(rule.lhs), rhs, rule.span))
		}

		let mut by_lhs: BTreeMap<char, Vec<u32>> = BTreeMap::new();
		for (i, production) in productions.iter().enumerate() {
			if let Some(lhs) = production.lhs() {
				by_lhs.entry(lhs).or_default().push(i as u32)
			}
		}

		for c in non_terminals.difference(&defined) {
			log::warn!("non-terminal `{}` is declared but never used", c)
		}

		log::debug!(
			"built grammar with {} productions, {} terminals and {} non-terminals",
			productions.len(),
			terminals.len(),
			defined.len()
		);

		Ok(Grammar {
			productions,
			start,
			terminals,
			non_terminals: defined,
			by_lhs,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn expr() -> Grammar {
		Grammar::builder()
			.rule('E', "E+T | T")
			.rule('T', "T*F | F")
			.rule('F', "(E) | i")
			.build()
			.unwrap()
	}

	#[test]
	fn augmented_production_comes_first() {
		let grammar = expr();
		let augmented = grammar.production(0).unwrap();
		assert!(augmented.is_augmented());
		assert_eq!(augmented.rhs(), &[Symbol::NonTerminal('E')]);
		assert_eq!(grammar.productions().len(), 7);
		assert_eq!(grammar.start(), 'E');
	}

	#[test]
	fn classifies_symbols_by_definition() {
		let grammar = expr();
		let terminals: String = grammar.terminals().iter().collect();
		let non_terminals: String = grammar.non_terminals().iter().collect();
		assert_eq!(terminals, "()*+i");
		assert_eq!(non_terminals, "EFT");
		assert_eq!(grammar.productions_of('T'), &[3, 4]);
		assert!(grammar.productions_of('x').is_empty());
	}

	#[test]
	fn lowercase_non_terminals() {
		let grammar = Grammar::builder()
			.rule('s', "xs | y")
			.rule('x', "a")
			.build()
			.unwrap();
		assert_eq!(
			grammar.production(1).unwrap().rhs(),
			&[Symbol::NonTerminal('x'), Symbol::NonTerminal('s')]
		);
		assert_eq!(
			grammar.production(2).unwrap().rhs(),
			&[Symbol::Terminal('y')]
		);
	}

	#[test]
	fn epsilon_alternatives() {
		let grammar = Grammar::builder()
			.rule('A', "aA | # | ")
			.build()
			.unwrap();
		assert!(grammar.production(2).unwrap().is_empty());
		assert!(grammar.production(3).unwrap().is_empty());
		assert_eq!(
			format!("{}", grammar.production(2).unwrap().format(&grammar)),
			"A -> ε"
		);
	}

	#[test]
	fn undefined_non_terminal() {
		let result = Grammar::builder()
			.non_terminals("B")
			.rule('S', "aB")
			.build();
		assert_eq!(result.unwrap_err(), Error::UndefinedNonTerminal('B'));
	}

	#[test]
	fn unused_declarations_are_dropped() {
		let grammar = Grammar::builder()
			.non_terminals("X")
			.rule('S', "a")
			.build()
			.unwrap();
		let non_terminals: String = grammar.non_terminals().iter().collect();
		assert_eq!(non_terminals, "S");
		assert!(grammar.productions_of('X').is_empty());
	}

	#[test]
	fn undeclared_symbol() {
		let result = Grammar::builder()
			.terminals("a")
			.rule('S', "ab")
			.build();
		assert_eq!(result.unwrap_err(), Error::UndeclaredSymbol('b'));
	}

	#[test]
	fn empty_grammar() {
		assert_eq!(Builder::new().build().unwrap_err(), Error::EmptyGrammar);
	}

	#[test]
	fn start_without_production() {
		let result = Grammar::builder().start('X').rule('S', "a").build();
		assert_eq!(result.unwrap_err(), Error::NoStartSymbol('X'));
	}

	#[test]
	fn end_marker_is_reserved() {
		let result = Grammar::builder().rule('S', "a$").build();
		assert_eq!(result.unwrap_err(), Error::ReservedSymbol('$'));
	}

	#[test]
	fn conflicting_declaration() {
		let result = Grammar::builder().terminals("S").rule('S', "a").build();
		assert_eq!(result.unwrap_err(), Error::ConflictingDeclaration('S'));
	}

	#[test]
	fn formatting() {
		let grammar = expr();
		let listing = format!("{}", grammar.format());
		assert!(listing.starts_with("0: E' -> E\n1: E -> E+T\n"));
	}
}
