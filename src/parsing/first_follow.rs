use crate::grammar::{Grammar, Symbol};
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

type Sets = BTreeMap<char, BTreeSet<Symbol>>;

/// FIRST and FOLLOW sets of every non-terminal.
///
/// FIRST sets may contain `Symbol::Epsilon`.
/// FOLLOW sets contain terminals and `Symbol::EndMarker`, never epsilon.
/// Both are least fixpoints computed by whole-grammar passes, then frozen.
pub struct FirstAndFollow {
	first: Sets,
	follow: Sets,
	first_passes: usize,
	follow_passes: usize,
}

/// Adds every element of `from` (except epsilon if `skip_epsilon`) to `into`.
///
/// Returns `true` if `into` grew.
fn extend(into: &mut BTreeSet<Symbol>, from: &BTreeSet<Symbol>, skip_epsilon: bool) -> bool {
	let len = into.len();
	into.extend(
		from.iter()
			.filter(|s| !(skip_epsilon && **s == Symbol::Epsilon))
			.cloned(),
	);
	into.len() > len
}

/// FIRST set of a symbol string, given the current FIRST sets of the non-terminals.
fn first_of_string(first: &Sets, string: &[Symbol]) -> BTreeSet<Symbol> {
	let mut set = BTreeSet::new();

	for symbol in string {
		match symbol {
			Symbol::Terminal(_) | Symbol::EndMarker => {
				set.insert(*symbol);
				return set;
			}
			Symbol::NonTerminal(nt) => match first.get(nt) {
				Some(nt_first) => {
					extend(&mut set, nt_first, true);
					if !nt_first.contains(&Symbol::Epsilon) {
						return set;
					}
				}
				None => return set,
			},
			Symbol::Epsilon => (),
		}
	}

	set.insert(Symbol::Epsilon);
	set
}

fn empty_sets(grammar: &Grammar) -> Sets {
	grammar
		.non_terminals()
		.iter()
		.map(|nt| (*nt, BTreeSet::new()))
		.collect()
}

fn initial_first(grammar: &Grammar) -> Sets {
	empty_sets(grammar)
}

/// One pass over every production, adding `FIRST(α)` to `FIRST(A)` for each `A -> α`.
///
/// Returns `true` if any set grew.
fn first_pass(grammar: &Grammar, first: &mut Sets) -> bool {
	let mut changed = false;

	for production in grammar.productions() {
		if let Some(lhs) = production.lhs() {
			let rhs_first = first_of_string(first, production.rhs());
			if let Some(set) = first.get_mut(&lhs) {
				changed |= extend(set, &rhs_first, false)
			}
		}
	}

	changed
}

/// Empty FOLLOW sets, except for `$` in the FOLLOW set of the start symbol.
fn initial_follow(grammar: &Grammar) -> Sets {
	let mut follow = empty_sets(grammar);
	if let Some(set) = follow.get_mut(&grammar.start()) {
		set.insert(Symbol::EndMarker);
	}
	follow
}

/// One pass over every occurrence `A -> αBβ` of a non-terminal `B`.
///
/// Returns `true` if any set grew.
fn follow_pass(grammar: &Grammar, first: &Sets, follow: &mut Sets) -> bool {
	let mut changed = false;

	for production in grammar.productions() {
		let lhs = match production.lhs() {
			Some(lhs) => lhs,
			None => continue,
		};

		let rhs = production.rhs();
		for (i, symbol) in rhs.iter().enumerate() {
			if let Symbol::NonTerminal(b) = symbol {
				let beta_first = first_of_string(first, &rhs[(i + 1)..]);
				let mut additions: BTreeSet<Symbol> = beta_first
					.iter()
					.filter(|s| **s != Symbol::Epsilon)
					.cloned()
					.collect();

				if beta_first.contains(&Symbol::Epsilon) {
					if let Some(lhs_follow) = follow.get(&lhs) {
						additions.extend(lhs_follow.iter().cloned())
					}
				}

				if let Some(set) = follow.get_mut(b) {
					changed |= extend(set, &additions, true)
				}
			}
		}
	}

	changed
}

impl FirstAndFollow {
	pub fn new(grammar: &Grammar) -> Self {
		let (first, first_passes) = Self::compute_first(grammar);
		let (follow, follow_passes) = Self::compute_follow(grammar, &first);

		log::debug!(
			"FIRST sets converged after {} passes, FOLLOW sets after {} passes",
			first_passes,
			follow_passes
		);

		Self {
			first,
			follow,
			first_passes,
			follow_passes,
		}
	}

	fn compute_first(grammar: &Grammar) -> (Sets, usize) {
		let mut first = initial_first(grammar);

		let mut passes = 1;
		while first_pass(grammar, &mut first) {
			passes += 1
		}

		(first, passes)
	}

	fn compute_follow(grammar: &Grammar, first: &Sets) -> (Sets, usize) {
		let mut follow = initial_follow(grammar);

		let mut passes = 1;
		while follow_pass(grammar, first, &mut follow) {
			passes += 1
		}

		(follow, passes)
	}

	/// FIRST set of a non-terminal.
	pub fn first(&self, non_terminal: char) -> Option<&BTreeSet<Symbol>> {
		self.first.get(&non_terminal)
	}

	/// FOLLOW set of a non-terminal.
	pub fn follow(&self, non_terminal: char) -> Option<&BTreeSet<Symbol>> {
		self.follow.get(&non_terminal)
	}

	/// FIRST set of a single symbol.
	pub fn first_of_symbol(&self, symbol: Symbol) -> BTreeSet<Symbol> {
		first_of_string(&self.first, &[symbol])
	}

	/// FIRST set of a symbol string. The empty string has FIRST set `{ε}`.
	pub fn first_of(&self, string: &[Symbol]) -> BTreeSet<Symbol> {
		first_of_string(&self.first, string)
	}

	/// `FIRST(β a)`: the lookaheads propagated by LR(1) closure.
	///
	/// Never contains epsilon.
	pub fn first_of_then(&self, beta: &[Symbol], lookahead: Symbol) -> BTreeSet<Symbol> {
		let mut set = first_of_string(&self.first, beta);
		if set.remove(&Symbol::Epsilon) {
			set.insert(lookahead);
		}
		set
	}

	/// Checks if the non-terminal derives the empty string.
	pub fn is_nullable(&self, non_terminal: char) -> bool {
		self.first(non_terminal)
			.map(|set| set.contains(&Symbol::Epsilon))
			.unwrap_or(false)
	}

	/// Number of passes needed for the FIRST sets to converge, including the last stable pass.
	pub fn first_passes(&self) -> usize {
		self.first_passes
	}

	/// Number of passes needed for the FOLLOW sets to converge, including the last stable pass.
	pub fn follow_passes(&self) -> usize {
		self.follow_passes
	}

	pub fn format(&self) -> FormattedFirstAndFollow {
		FormattedFirstAndFollow(self)
	}
}

fn format_set(set: &BTreeSet<Symbol>) -> String {
	if set.is_empty() {
		"{ }".to_string()
	} else {
		format!("{{ {} }}", set.iter().format(", "))
	}
}

pub struct FormattedFirstAndFollow<'a>(&'a FirstAndFollow);

impl<'a> fmt::Display for FormattedFirstAndFollow<'a> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		for (nt, set) in &self.0.first {
			write!(f, "FIRST({}) = {}\n", nt, format_set(set))?
		}

		for (nt, set) in &self.0.follow {
			write!(f, "FOLLOW({}) = {}\n", nt, format_set(set))?
		}

		Ok(())
	}
}
