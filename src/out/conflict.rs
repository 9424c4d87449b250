use super::{Block, NoteType, Type};
use crate::{
	grammar::{Grammar, Symbol},
	parsing::{Action, Automaton, Conflict, PredictiveConflict, PredictiveConflictKind},
};
use itertools::Itertools;
use source_span::fmt::Style;
use std::collections::BTreeSet;
use yansi::Paint;

/// Productions responsible for an action in the given state, with a label.
fn action_productions(
	grammar: &Grammar,
	automaton: &Automaton,
	conflict: &Conflict,
	action: Action,
) -> Vec<(u32, String)> {
	match action {
		Action::Shift(_) => {
			let productions: BTreeSet<u32> = automaton
				.state(conflict.state)
				.into_iter()
				.flat_map(|state| state.items.iter())
				.filter(|item| item.current_symbol(grammar) == Some(conflict.symbol))
				.map(|item| item.production)
				.collect();

			productions
				.into_iter()
				.map(|p| (p, format!("shift `{}`", conflict.symbol)))
				.collect()
		}
		Action::Reduce(p) => vec![(p, "reduce".to_string())],
		Action::Accept => vec![(0, "accept".to_string())],
	}
}

/// Explains a conflict.
///
/// The block highlights the productions involved (when they have a source span)
/// and notes the shortest symbol path to the conflicting state and its items.
pub fn conflict_block(ty: Type, grammar: &Grammar, automaton: &Automaton, conflict: &Conflict) -> Block {
	let mut block = Block::new(ty, conflict.to_string());

	for (action, kept) in &[(conflict.existing, true), (conflict.attempted, false)] {
		for (p, label) in action_productions(grammar, automaton, conflict, *action) {
			let production = match grammar.production(p) {
				Some(production) => production,
				None => continue,
			};

			match production.span() {
				Some(span) => {
					let (label, style) = if *kept {
						(format!("{} (kept)", label), Style::Note)
					} else {
						(label, Style::Warning)
					};

					block.add_highlight(span, Some(label), style)
				}
				None => block.add_note(
					NoteType::Note,
					format!(
						"{} `{}`{}",
						label,
						production.format(grammar),
						if *kept { " (kept)" } else { "" }
					),
				),
			}
		}
	}

	match automaton.path_to(conflict.state) {
		Some(path) if path.is_empty() => {
			block.add_note(NoteType::Note, "the conflict occurs in the initial state")
		}
		Some(path) => block.add_note(
			NoteType::Note,
			format!(
				"the state is reached after reading {}",
				Paint::new(path.iter().format(" ")).bold()
			),
		),
		None => (),
	}

	if let Some(state) = automaton.state(conflict.state) {
		let items = state
			.items
			.iter()
			.filter(|item| {
				item.current_symbol(grammar) == Some(conflict.symbol)
					|| (item.is_complete(grammar)
						&& item.lookahead.map(|la| la == conflict.symbol).unwrap_or(true))
			})
			.map(|item| format!("  {}", item.format(grammar)))
			.join("\n");

		block.add_note(
			NoteType::Note,
			format!("the conflicting items are:\n{}", items),
		)
	}

	let hint = match conflict.symbol {
		Symbol::EndMarker => "at the end of the input".to_string(),
		symbol => format!("before `{}`", symbol),
	};

	block.add_note(
		NoteType::Help,
		format!("the parser cannot decide what to do {}; the table keeps `{}`", hint, conflict.existing),
	);

	block
}

/// Explains an LL(1) conflict.
///
/// The block highlights the two predicted productions (when they have a source span)
/// and notes why both are predicted for the same lookahead.
pub fn predictive_conflict_block(ty: Type, grammar: &Grammar, conflict: &PredictiveConflict) -> Block {
	let mut block = Block::new(ty, conflict.to_string());

	for (prediction, kept) in &[(conflict.existing, true), (conflict.attempted, false)] {
		let production = match grammar.production(prediction.production) {
			Some(production) => production,
			None => continue,
		};

		let label = if prediction.via_follow {
			"predicted by FOLLOW"
		} else {
			"predicted by FIRST"
		};

		match production.span() {
			Some(span) => {
				let (label, style) = if *kept {
					(format!("{} (kept)", label), Style::Note)
				} else {
					(label.to_string(), Style::Warning)
				};

				block.add_highlight(span, Some(label), style)
			}
			None => block.add_note(
				NoteType::Note,
				format!(
					"{} `{}`{}",
					label,
					production.format(grammar),
					if *kept { " (kept)" } else { "" }
				),
			),
		}
	}

	let reason = match conflict.kind {
		PredictiveConflictKind::FirstFirst => format!(
			"both right hand sides can start with `{}`",
			conflict.symbol
		),
		PredictiveConflictKind::FirstFollow => format!(
			"one right hand side derives the empty string and `{}` can follow `{}`",
			conflict.symbol, conflict.non_terminal
		),
	};

	block.add_note(NoteType::Note, reason);
	block.add_note(
		NoteType::Help,
		format!(
			"left factoring or removing left recursion on `{}` may help; the table keeps production {}",
			conflict.non_terminal, conflict.existing.production
		),
	);

	block
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::parsing::{Algorithm, Construction, Context, FirstAndFollow, PredictiveTable};

	#[test]
	fn dangling_else() {
		Paint::disable();
		let grammar = Grammar::builder()
			.rule('S', "iEtS | iEtSeS | a")
			.rule('E', "b")
			.build()
			.unwrap();
		let construction = Construction::new(&grammar, Algorithm::SLR1).unwrap();
		let conflict = construction.conflicts()[0];
		let block = conflict_block(Type::Warning, &grammar, construction.automaton(), &conflict);

		assert!(block.title().starts_with("shift/reduce conflict"));
		assert!(!block.has_highlights());

		let notes: Vec<&str> = block.notes().iter().map(|n| n.content()).collect();
		assert!(notes.contains(&"shift `e` `S -> iEtSeS` (kept)"));
		assert!(notes.contains(&"reduce `S -> iEtS`"));
		assert!(notes.contains(&"the state is reached after reading i E t S"));
		assert!(notes
			.iter()
			.any(|n| n.starts_with("the conflicting items are:\n  S -> iEtS·\n  S -> iEtS·eS")));
	}

	#[test]
	fn left_recursive_prediction() {
		Paint::disable();
		let grammar = Grammar::builder()
			.rule('E', "E+T | T")
			.rule('T', "i")
			.build()
			.unwrap();
		let sets = FirstAndFollow::new(&grammar);
		let table = PredictiveTable::new(Context::new(&grammar, &sets));
		let conflict = table.conflicts()[0];
		let block = predictive_conflict_block(Type::Error, &grammar, &conflict);

		assert!(block.title().starts_with("FIRST/FIRST conflict on `E`"));
		let notes: Vec<&str> = block.notes().iter().map(|n| n.content()).collect();
		assert!(notes.contains(&"predicted by FIRST `E -> E+T` (kept)"));
		assert!(notes.contains(&"predicted by FIRST `E -> T`"));
		assert!(notes.contains(&"both right hand sides can start with `i`"));
	}
}
