use super::Context;
use crate::grammar::{Grammar, Symbol};
use std::{
	collections::{btree_map::Entry, BTreeMap, BTreeSet},
	fmt,
};

pub mod automaton;
pub mod lalr1;
pub mod ll1;

pub use automaton::{Automaton, State};
pub use ll1::{FormattedPredictiveTable, Prediction, PredictiveConflict, PredictiveConflictKind, PredictiveTable};

/// ACTION table entry. Missing entries are errors.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Action {
	/// Shift and go to the given state.
	Shift(u32),

	/// Reduce with the given production.
	Reduce(u32),

	Accept,
}

impl fmt::Display for Action {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Shift(q) => write!(f, "s{}", q),
			Self::Reduce(p) => write!(f, "r{}", p),
			Self::Accept => write!(f, "acc"),
		}
	}
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ConflictKind {
	ShiftReduce,
	ReduceReduce,
}

impl fmt::Display for ConflictKind {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::ShiftReduce => write!(f, "shift/reduce"),
			Self::ReduceReduce => write!(f, "reduce/reduce"),
		}
	}
}

/// Table cell where more than one action applies.
///
/// The table keeps the `existing` action.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Conflict {
	pub state: u32,
	pub symbol: Symbol,
	pub kind: ConflictKind,
	pub existing: Action,
	pub attempted: Action,
}

impl fmt::Display for Conflict {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(
			f,
			"{} conflict in state {} on `{}` ({} kept over {})",
			self.kind, self.state, self.symbol, self.existing, self.attempted
		)
	}
}

/// How the lookaheads of reduce actions are chosen.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Policy {
	/// Reduce on every terminal and the end marker.
	LR0,

	/// Reduce on the FOLLOW set of the production left hand side.
	SLR1,

	/// Reduce on the item lookahead (LR(1) and merged LALR(1) items).
	Lookahead,
}

/// Table row.
#[derive(Default)]
pub struct Row {
	pub action: BTreeMap<Symbol, Action>,
	pub goto: BTreeMap<char, u32>,
}

/// ACTION/GOTO parsing table.
pub struct Table {
	rows: Vec<Row>,
	conflicts: Vec<Conflict>,
}

fn insert_action(
	conflicts: &mut Vec<Conflict>,
	state: u32,
	row: &mut Row,
	symbol: Symbol,
	action: Action,
) {
	match row.action.entry(symbol) {
		Entry::Vacant(entry) => {
			entry.insert(action);
		}
		Entry::Occupied(entry) => {
			let existing = *entry.get();
			if existing != action {
				let kind = match (existing, action) {
					(Action::Shift(_), _) | (_, Action::Shift(_)) => ConflictKind::ShiftReduce,
					_ => ConflictKind::ReduceReduce,
				};

				let conflict = Conflict {
					state,
					symbol,
					kind,
					existing,
					attempted: action,
				};

				log::debug!("{}", conflict);
				conflicts.push(conflict)
			}
		}
	}
}

impl Table {
	/// Derives the table of an automaton.
	///
	/// Shifts are entered first, then accept and reduce actions in item order.
	/// The first action entered in a cell is kept and any different one is recorded as a conflict.
	pub fn new(context: Context, automaton: &Automaton, policy: Policy) -> Self {
		let grammar = context.grammar;
		let mut rows = Vec::with_capacity(automaton.len());
		let mut conflicts = Vec::new();

		for (q, state) in automaton.states().iter().enumerate() {
			let q = q as u32;
			let mut row = Row::default();

			for (&symbol, &target) in &state.transitions {
				match symbol.as_non_terminal() {
					Some(nt) => {
						row.goto.insert(nt, target);
					}
					None if symbol.is_lookahead() => {
						insert_action(&mut conflicts, q, &mut row, symbol, Action::Shift(target))
					}
					None => (),
				}
			}

			for item in &state.items {
				if !item.is_complete(grammar) {
					continue;
				}

				let lhs = match grammar.production(item.production) {
					Some(production) => production.lhs(),
					None => continue,
				};

				match lhs {
					None => {
						if item.lookahead.map(|la| la == Symbol::EndMarker).unwrap_or(true) {
							insert_action(&mut conflicts, q, &mut row, Symbol::EndMarker, Action::Accept)
						}
					}
					Some(lhs) => {
						let lookaheads: BTreeSet<Symbol> = match policy {
							Policy::LR0 => grammar.lookaheads().collect(),
							Policy::SLR1 => context.sets.follow(lhs).cloned().unwrap_or_default(),
							Policy::Lookahead => item.lookahead.into_iter().collect(),
						};

						for la in lookaheads {
							insert_action(
								&mut conflicts,
								q,
								&mut row,
								la,
								Action::Reduce(item.production),
							)
						}
					}
				}
			}

			rows.push(row)
		}

		Self { rows, conflicts }
	}

	/// Number of states.
	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	pub fn row(&self, state: u32) -> Option<&Row> {
		self.rows.get(state as usize)
	}

	/// ACTION entry. `None` is an error entry.
	pub fn action(&self, state: u32, symbol: Symbol) -> Option<Action> {
		self.row(state)
			.and_then(|row| row.action.get(&symbol))
			.cloned()
	}

	pub fn goto(&self, state: u32, non_terminal: char) -> Option<u32> {
		self.row(state)
			.and_then(|row| row.goto.get(&non_terminal))
			.cloned()
	}

	pub fn conflicts(&self) -> &[Conflict] {
		&self.conflicts
	}

	/// Checks that no cell had more than one applicable action.
	pub fn is_deterministic(&self) -> bool {
		self.conflicts.is_empty()
	}

	pub fn has_conflict(&self, state: u32, symbol: Symbol) -> bool {
		self.conflicts
			.iter()
			.any(|c| c.state == state && c.symbol == symbol)
	}

	/// States accepting on the end marker.
	pub fn accepting_states(&self) -> impl '_ + Iterator<Item = u32> {
		self.rows
			.iter()
			.enumerate()
			.filter(|(_, row)| row.action.get(&Symbol::EndMarker) == Some(&Action::Accept))
			.map(|(q, _)| q as u32)
	}

	pub fn format<'g>(&self, grammar: &'g Grammar) -> FormattedTable<'g, '_> {
		FormattedTable(grammar, self)
	}
}

/// Table rendered as aligned columns.
///
/// Error cells are blank and conflicting cells are marked with `*`.
pub struct FormattedTable<'g, 't>(&'g Grammar, &'t Table);

impl<'g, 't> fmt::Display for FormattedTable<'g, 't> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let grammar = self.0;
		let table = self.1;

		let lookaheads: Vec<Symbol> = grammar.lookaheads().collect();
		let non_terminals: Vec<char> = grammar.non_terminals().iter().cloned().collect();

		let mut lines: Vec<Vec<String>> = Vec::with_capacity(table.len() + 1);

		let mut header = vec!["state".to_string()];
		header.extend(lookaheads.iter().map(|s| s.to_string()));
		header.extend(non_terminals.iter().map(|nt| nt.to_string()));
		lines.push(header);

		for (q, row) in table.rows.iter().enumerate() {
			let q = q as u32;
			let mut line = vec![q.to_string()];

			for &symbol in &lookaheads {
				line.push(match row.action.get(&symbol) {
					Some(action) if table.has_conflict(q, symbol) => format!("{}*", action),
					Some(action) => action.to_string(),
					None => String::new(),
				})
			}

			for nt in &non_terminals {
				line.push(
					row.goto
						.get(nt)
						.map(|target| target.to_string())
						.unwrap_or_default(),
				)
			}

			lines.push(line)
		}

		write_grid(f, &lines)
	}
}

/// Writes rows of cells as left-aligned columns separated by two spaces.
///
/// Every row must have the same number of cells as the first one.
pub(crate) fn write_grid(f: &mut fmt::Formatter, lines: &[Vec<String>]) -> fmt::Result {
	let columns = lines.first().map(Vec::len).unwrap_or(0);
	let widths: Vec<usize> = (0..columns)
		.map(|i| {
			lines
				.iter()
				.map(|line| line[i].chars().count())
				.max()
				.unwrap_or(0)
		})
		.collect();

	for line in lines {
		let mut text = String::new();
		for (i, cell) in line.iter().enumerate() {
			if i > 0 {
				text.push_str("  ")
			}

			text.push_str(cell);
			for _ in cell.chars().count()..widths[i] {
				text.push(' ')
			}
		}

		write!(f, "{}\n", text.trim_end())?
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::parsing::{FirstAndFollow, Mode};

	fn simple() -> Grammar {
		Grammar::builder()
			.rule('S', "A+B")
			.rule('A', "a")
			.rule('B', "b")
			.build()
			.unwrap()
	}

	fn build(grammar: &Grammar, mode: Mode, policy: Policy) -> (Automaton, Table) {
		let sets = FirstAndFollow::new(grammar);
		let context = Context::new(grammar, &sets);
		let automaton = Automaton::new(context, mode);
		let table = Table::new(context, &automaton, policy);
		(automaton, table)
	}

	#[test]
	fn accept_after_start_symbol() {
		let grammar = simple();
		let (automaton, table) = build(&grammar, Mode::LR0, Policy::SLR1);
		let accept = automaton.transition(0, Symbol::NonTerminal('S')).unwrap();
		assert_eq!(table.action(accept, Symbol::EndMarker), Some(Action::Accept));
		assert_eq!(table.accepting_states().collect::<Vec<_>>(), vec![accept]);
		assert_eq!(table.goto(0, 'S'), Some(accept));
	}

	#[test]
	fn slr_restricts_reductions_to_follow() {
		let grammar = simple();
		let (automaton, slr) = build(&grammar, Mode::LR0, Policy::SLR1);
		let (_, lr0) = build(&grammar, Mode::LR0, Policy::LR0);
		let q = automaton.transition(0, Symbol::Terminal('a')).unwrap();

		let slr_reductions: Vec<Symbol> = slr.row(q).unwrap().action.keys().cloned().collect();
		assert_eq!(slr_reductions, vec![Symbol::Terminal('+')]);
		assert_eq!(slr.action(q, Symbol::Terminal('+')), Some(Action::Reduce(2)));

		for la in grammar.lookaheads() {
			assert_eq!(lr0.action(q, la), Some(Action::Reduce(2)));
		}
	}

	#[test]
	fn shift_on_terminal_transitions() {
		let grammar = simple();
		let (automaton, table) = build(&grammar, Mode::LR1, Policy::Lookahead);
		let q = automaton.transition(0, Symbol::Terminal('a')).unwrap();
		assert_eq!(table.action(0, Symbol::Terminal('a')), Some(Action::Shift(q)));
		assert_eq!(table.action(0, Symbol::Terminal('b')), None);
		assert!(table.is_deterministic());
	}

	#[test]
	fn first_action_wins() {
		let grammar = Grammar::builder()
			.rule('S', "iEtS | iEtSeS | a")
			.rule('E', "b")
			.build()
			.unwrap();
		let (_, table) = build(&grammar, Mode::LR0, Policy::SLR1);

		assert!(!table.is_deterministic());
		for conflict in table.conflicts() {
			assert_eq!(conflict.kind, ConflictKind::ShiftReduce);
			assert_eq!(conflict.symbol, Symbol::Terminal('e'));
			assert_eq!(conflict.attempted, Action::Reduce(1));
			assert_eq!(
				table.action(conflict.state, conflict.symbol),
				Some(conflict.existing)
			);
			match conflict.existing {
				Action::Shift(_) => (),
				other => panic!("expected a shift, found {}", other),
			}
		}
	}

	#[test]
	fn formatting() {
		let grammar = simple();
		let (_, table) = build(&grammar, Mode::LR0, Policy::SLR1);
		let text = format!("{}", table.format(&grammar));
		let mut lines = text.lines();
		let header: Vec<&str> = lines.next().unwrap().split_whitespace().collect();
		assert_eq!(header, vec!["state", "+", "a", "b", "$", "A", "B", "S"]);
		assert_eq!(lines.count(), 7);
		assert!(text.contains("acc"));
	}
}
