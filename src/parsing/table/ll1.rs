use super::write_grid;
use crate::{
	grammar::{Grammar, Symbol},
	parsing::Context,
};
use std::{
	collections::{btree_map::Entry, BTreeMap},
	fmt,
};

/// Predictive table entry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Prediction {
	/// Production to expand.
	pub production: u32,

	/// The entry comes from the FOLLOW set of the left hand side,
	/// because the right hand side derives the empty string.
	pub via_follow: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PredictiveConflictKind {
	/// Two right hand sides start with the same terminal.
	FirstFirst,

	/// A nullable right hand side may be followed by a terminal another alternative starts with.
	FirstFollow,
}

impl fmt::Display for PredictiveConflictKind {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::FirstFirst => write!(f, "FIRST/FIRST"),
			Self::FirstFollow => write!(f, "FIRST/FOLLOW"),
		}
	}
}

/// Table cell predicting more than one production.
///
/// The table keeps the `existing` prediction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PredictiveConflict {
	pub non_terminal: char,
	pub symbol: Symbol,
	pub kind: PredictiveConflictKind,
	pub existing: Prediction,
	pub attempted: Prediction,
}

impl fmt::Display for PredictiveConflict {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(
			f,
			"{} conflict on `{}` before `{}` (production {} kept over {})",
			self.kind,
			self.non_terminal,
			self.symbol,
			self.existing.production,
			self.attempted.production
		)
	}
}

/// Predictive (LL(1)) parsing table.
///
/// Rows are the non-terminals, columns the terminals and the end marker.
/// Production `A -> α` is entered under every terminal of `FIRST(α)`,
/// and under every symbol of `FOLLOW(A)` when `α` is nullable.
pub struct PredictiveTable {
	rows: BTreeMap<char, BTreeMap<Symbol, Prediction>>,
	conflicts: Vec<PredictiveConflict>,
}

fn insert_prediction(
	conflicts: &mut Vec<PredictiveConflict>,
	non_terminal: char,
	row: &mut BTreeMap<Symbol, Prediction>,
	symbol: Symbol,
	prediction: Prediction,
) {
	match row.entry(symbol) {
		Entry::Vacant(entry) => {
			entry.insert(prediction);
		}
		Entry::Occupied(entry) => {
			let existing = *entry.get();
			if existing.production != prediction.production {
				let kind = if existing.via_follow || prediction.via_follow {
					PredictiveConflictKind::FirstFollow
				} else {
					PredictiveConflictKind::FirstFirst
				};

				let conflict = PredictiveConflict {
					non_terminal,
					symbol,
					kind,
					existing,
					attempted: prediction,
				};

				log::debug!("{}", conflict);
				conflicts.push(conflict)
			}
		}
	}
}

impl PredictiveTable {
	/// Builds the table from the FIRST and FOLLOW sets.
	///
	/// Productions are entered in grammar order. The first production entered in a cell is kept.
	pub fn new(context: Context) -> Self {
		let grammar = context.grammar;
		let mut rows: BTreeMap<char, BTreeMap<Symbol, Prediction>> = grammar
			.non_terminals()
			.iter()
			.map(|nt| (*nt, BTreeMap::new()))
			.collect();
		let mut conflicts = Vec::new();

		for (p, production) in grammar.enumerate_productions() {
			let lhs = match production.lhs() {
				Some(lhs) => lhs,
				None => continue,
			};

			let row = match rows.get_mut(&lhs) {
				Some(row) => row,
				None => continue,
			};

			let first = context.sets.first_of(production.rhs());
			for &symbol in first.iter().filter(|s| s.is_lookahead()) {
				let prediction = Prediction {
					production: p,
					via_follow: false,
				};
				insert_prediction(&mut conflicts, lhs, row, symbol, prediction)
			}

			if first.contains(&Symbol::Epsilon) {
				if let Some(follow) = context.sets.follow(lhs) {
					for &symbol in follow {
						let prediction = Prediction {
							production: p,
							via_follow: true,
						};
						insert_prediction(&mut conflicts, lhs, row, symbol, prediction)
					}
				}
			}
		}

		log::debug!(
			"built LL(1) table: {} rows, {} conflicts",
			rows.len(),
			conflicts.len()
		);

		Self { rows, conflicts }
	}

	/// Number of rows (non-terminals).
	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	pub fn row(&self, non_terminal: char) -> Option<&BTreeMap<Symbol, Prediction>> {
		self.rows.get(&non_terminal)
	}

	pub fn prediction(&self, non_terminal: char, symbol: Symbol) -> Option<Prediction> {
		self.row(non_terminal)
			.and_then(|row| row.get(&symbol))
			.cloned()
	}

	/// Predicted production. `None` is an error entry.
	pub fn entry(&self, non_terminal: char, symbol: Symbol) -> Option<u32> {
		self.prediction(non_terminal, symbol)
			.map(|prediction| prediction.production)
	}

	pub fn conflicts(&self) -> &[PredictiveConflict] {
		&self.conflicts
	}

	/// Checks that the grammar is LL(1).
	pub fn is_deterministic(&self) -> bool {
		self.conflicts.is_empty()
	}

	pub fn has_conflict(&self, non_terminal: char, symbol: Symbol) -> bool {
		self.conflicts
			.iter()
			.any(|c| c.non_terminal == non_terminal && c.symbol == symbol)
	}

	pub fn format<'g>(&self, grammar: &'g Grammar) -> FormattedPredictiveTable<'g, '_> {
		FormattedPredictiveTable(grammar, self)
	}
}

/// Table rendered as aligned columns of production indexes.
///
/// Error cells are blank and conflicting cells are marked with `*`.
pub struct FormattedPredictiveTable<'g, 't>(&'g Grammar, &'t PredictiveTable);

impl<'g, 't> fmt::Display for FormattedPredictiveTable<'g, 't> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let grammar = self.0;
		let table = self.1;

		let lookaheads: Vec<Symbol> = grammar.lookaheads().collect();
		let mut lines: Vec<Vec<String>> = Vec::with_capacity(table.len() + 1);

		let mut header = vec![String::new()];
		header.extend(lookaheads.iter().map(|s| s.to_string()));
		lines.push(header);

		for (&nt, row) in &table.rows {
			let mut line = vec![nt.to_string()];

			for &symbol in &lookaheads {
				line.push(match row.get(&symbol) {
					Some(p) if table.has_conflict(nt, symbol) => format!("{}*", p.production),
					Some(p) => p.production.to_string(),
					None => String::new(),
				})
			}

			lines.push(line)
		}

		write_grid(f, &lines)
	}
}
