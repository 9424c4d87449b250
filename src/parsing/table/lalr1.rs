use super::{Automaton, State};
use crate::{
	grammar::{Grammar, Symbol},
	parsing::{item::Core, Error, ItemSet, Mode},
};
use itertools::Itertools;
use std::{
	collections::{btree_map::Entry, BTreeMap, BTreeSet, HashMap},
	fmt,
};

/// LR(1) states merged into one LALR(1) state.
#[derive(Clone, Debug)]
pub struct MergeGroup {
	/// Common core of the members.
	pub core: Core,

	/// Merged LR(1) states, in increasing order.
	pub members: Vec<u32>,

	/// Index of the merged state.
	pub state: u32,

	/// Lookaheads of each core item, unified over the members.
	pub lookaheads: BTreeMap<(u32, u32), BTreeSet<Symbol>>,
}

impl MergeGroup {
	/// Checks that more than one LR(1) state was merged.
	pub fn is_merged(&self) -> bool {
		self.members.len() > 1
	}
}

/// Result of merging an LR(1) automaton by core.
#[derive(Clone, Debug)]
pub struct MergeReport {
	lr1_len: usize,
	groups: Vec<MergeGroup>,

	/// Merged state of each LR(1) state.
	representatives: Vec<u32>,
}

impl MergeReport {
	/// Number of LR(1) states before merging.
	pub fn lr1_len(&self) -> usize {
		self.lr1_len
	}

	/// Number of LALR(1) states after merging.
	pub fn lalr1_len(&self) -> usize {
		self.groups.len()
	}

	/// Merge groups, indexed by merged state.
	pub fn groups(&self) -> &[MergeGroup] {
		&self.groups
	}

	/// Groups with more than one member.
	pub fn merged_groups(&self) -> impl '_ + Iterator<Item = &MergeGroup> {
		self.groups.iter().filter(|g| g.is_merged())
	}

	/// Merged state of the given LR(1) state.
	pub fn representative(&self, lr1_state: u32) -> Option<u32> {
		self.representatives.get(lr1_state as usize).cloned()
	}

	pub fn format<'g>(&self, grammar: &'g Grammar) -> FormattedMergeReport<'g, '_> {
		FormattedMergeReport(grammar, self)
	}
}

pub struct FormattedMergeReport<'g, 'r>(&'g Grammar, &'r MergeReport);

impl<'g, 'r> fmt::Display for FormattedMergeReport<'g, 'r> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let grammar = self.0;
		let report = self.1;

		write!(
			f,
			"{} LR(1) states merged into {} LALR(1) states\n",
			report.lr1_len(),
			report.lalr1_len()
		)?;

		for group in report.merged_groups() {
			write!(
				f,
				"I{} <- {}\n",
				group.state,
				group.members.iter().map(|q| format!("I{}", q)).format(", ")
			)?;

			for (&(production, offset), lookaheads) in &group.lookaheads {
				let item = crate::parsing::Item::new(production, offset, None);
				write!(
					f,
					"\t{}, {}\n",
					item.format(grammar),
					lookaheads.iter().format("/")
				)?
			}
		}

		Ok(())
	}
}

/// Merges the states of an LR(1) automaton that share the same core.
///
/// Merged states are numbered by their first member, so the initial state stays `0`.
/// Fails if two members of a group disagree on the merged target of a transition.
pub fn merge(automaton: &Automaton) -> Result<(Automaton, MergeReport), Error> {
	let mut group_of_core: HashMap<Core, u32> = HashMap::new();
	let mut groups: Vec<MergeGroup> = Vec::new();
	let mut representatives = Vec::with_capacity(automaton.len());

	for (q, state) in automaton.states().iter().enumerate() {
		let core = state.items.core();
		let g = match group_of_core.get(&core) {
			Some(&g) => g,
			None => {
				let g = groups.len() as u32;
				group_of_core.insert(core.clone(), g);
				groups.push(MergeGroup {
					core,
					members: Vec::new(),
					state: g,
					lookaheads: BTreeMap::new(),
				});
				g
			}
		};

		let group = &mut groups[g as usize];
		group.members.push(q as u32);
		for item in &state.items {
			let lookaheads = group.lookaheads.entry(item.core()).or_default();
			lookaheads.extend(item.lookahead)
		}

		representatives.push(g)
	}

	let mut states: Vec<State> = groups
		.iter()
		.map(|group| {
			let items: ItemSet = group
				.members
				.iter()
				.flat_map(|&q| automaton.states()[q as usize].items.iter().cloned())
				.collect();
			State::new(items)
		})
		.collect();

	for (q, state) in automaton.states().iter().enumerate() {
		let g = representatives[q];
		let merged = &mut states[g as usize];

		for (&symbol, &target) in &state.transitions {
			let attempted = representatives
				.get(target as usize)
				.copied()
				.ok_or(Error::UnknownState {
					state: q as u32,
					symbol,
					target,
				})?;
			match merged.transitions.entry(symbol) {
				Entry::Vacant(entry) => {
					entry.insert(attempted);
				}
				Entry::Occupied(entry) => {
					let existing = *entry.get();
					if existing != attempted {
						return Err(Error::MergeInconsistency {
							state: g,
							symbol,
							existing,
							attempted,
						});
					}
				}
			}
		}
	}

	let report = MergeReport {
		lr1_len: automaton.len(),
		groups,
		representatives,
	};

	Ok((Automaton::from_states(Mode::LR1, states), report))
}
