use crate::{
	grammar::{Grammar, Symbol},
	parsing::{item::Item, Context, ItemSet, Mode},
};
use std::{
	collections::{BTreeMap, HashMap, HashSet, VecDeque},
	fmt, io,
};

/// Automaton state.
#[derive(Clone, Debug)]
pub struct State {
	/// Closed item set.
	pub items: ItemSet,

	/// Outgoing transitions.
	pub transitions: BTreeMap<Symbol, u32>,
}

impl State {
	pub fn new(items: ItemSet) -> Self {
		Self {
			items,
			transitions: BTreeMap::new(),
		}
	}
}

/// Canonical collection of LR(0) or LR(1) item sets.
///
/// State `0` is the closure of the augmented start item.
/// Other states are numbered in discovery order.
pub struct Automaton {
	mode: Mode,
	states: Vec<State>,
}

/// Returns the index of the state with the given items, adding it to the worklist if it is new.
fn state_id(
	map: &mut HashMap<ItemSet, u32>,
	states: &mut Vec<State>,
	queue: &mut VecDeque<u32>,
	items: ItemSet,
) -> u32 {
	use std::collections::hash_map::Entry;
	match map.entry(items) {
		Entry::Occupied(entry) => *entry.get(),
		Entry::Vacant(entry) => {
			let q = states.len() as u32;
			states.push(State::new(entry.key().clone()));
			log::trace!("new state {} ({} items)", q, entry.key().len());
			queue.push_back(q);
			entry.insert(q);
			q
		}
	}
}

impl Automaton {
	/// Builds the canonical collection.
	///
	/// States are explored breadth first. Each state is expanded once and
	/// its gotos are visited in symbol order.
	pub fn new(context: Context, mode: Mode) -> Self {
		let lookahead = match mode {
			Mode::LR0 => None,
			Mode::LR1 => Some(Symbol::EndMarker),
		};

		let initial: ItemSet = std::iter::once(Item::from_production(0, lookahead)).collect();

		let mut map = HashMap::new();
		let mut states = Vec::new();
		let mut queue = VecDeque::new();
		state_id(
			&mut map,
			&mut states,
			&mut queue,
			initial.closure(context, mode),
		);

		while let Some(q) = queue.pop_front() {
			let next = states[q as usize].items.shift(context, mode);

			for (symbol, items) in next {
				let r = state_id(&mut map, &mut states, &mut queue, items);
				states[q as usize].transitions.insert(symbol, r);
			}
		}

		log::debug!("built {} states ({:?} items)", states.len(), mode);

		Self { mode, states }
	}

	/// Builds an automaton from already computed states.
	pub fn from_states(mode: Mode, states: Vec<State>) -> Self {
		Self { mode, states }
	}

	pub fn mode(&self) -> Mode {
		self.mode
	}

	pub fn states(&self) -> &[State] {
		&self.states
	}

	pub fn state(&self, q: u32) -> Option<&State> {
		self.states.get(q as usize)
	}

	pub fn len(&self) -> usize {
		self.states.len()
	}

	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	pub fn transition(&self, q: u32, symbol: Symbol) -> Option<u32> {
		self.state(q)
			.and_then(|state| state.transitions.get(&symbol))
			.cloned()
	}

	pub fn transitions_for(&self, q: u32) -> impl '_ + Iterator<Item = (Symbol, u32)> {
		self.state(q)
			.into_iter()
			.flat_map(|state| state.transitions.iter().map(|(s, r)| (*s, *r)))
	}

	/// Finds the state with exactly the given items.
	pub fn find(&self, items: &ItemSet) -> Option<u32> {
		self.states
			.iter()
			.position(|state| &state.items == items)
			.map(|q| q as u32)
	}

	/// Shortest symbol string leading from the initial state to `q`.
	pub fn path_to(&self, q: u32) -> Option<Vec<Symbol>> {
		if q as usize >= self.states.len() {
			return None;
		}

		let mut visited = HashSet::new();
		let mut queue = VecDeque::new();
		visited.insert(0);
		queue.push_back((0u32, Vec::new()));

		while let Some((r, path)) = queue.pop_front() {
			if r == q {
				return Some(path);
			}

			for (symbol, next) in self.transitions_for(r) {
				if visited.insert(next) {
					let mut new_path = path.clone();
					new_path.push(symbol);
					queue.push_back((next, new_path))
				}
			}
		}

		None
	}

	/// Writes the automaton in the Graphviz DOT format.
	pub fn dot_write<W: io::Write>(&self, grammar: &Grammar, f: &mut W) -> io::Result<()> {
		write!(f, "digraph {{\n")?;

		for (q, state) in self.states.iter().enumerate() {
			let q = q as u32;

			write!(
				f,
				"\tq{} [ shape=plaintext, label=<{}> ]\n",
				q,
				state.items.dot_format(grammar)
			)?;

			for (symbol, r) in self.transitions_for(q) {
				let label = symbol.to_string().replace('\\', "\\\\").replace('"', "\\\"");
				write!(f, "\tq{} -> q{} [ label=\"{}\" ]\n", q, r, label)?;
			}
		}

		write!(f, "}}\n")
	}

	pub fn format<'g>(&self, grammar: &'g Grammar) -> FormattedAutomaton<'g, '_> {
		FormattedAutomaton(grammar, self)
	}
}

pub struct FormattedAutomaton<'g, 'a>(&'g Grammar, &'a Automaton);

impl<'g, 'a> fmt::Display for FormattedAutomaton<'g, 'a> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		for (q, state) in self.1.states.iter().enumerate() {
			write!(f, "I{}:\n{}", q, state.items.format(self.0))?;

			for (symbol, r) in &state.transitions {
				write!(f, "\t{} => I{}\n", symbol, r)?
			}
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::parsing::FirstAndFollow;

	fn expr() -> Grammar {
		Grammar::builder()
			.rule('E', "E+T | T")
			.rule('T', "T*F | F")
			.rule('F', "(E) | i")
			.build()
			.unwrap()
	}

	fn build(grammar: &Grammar, mode: Mode) -> Automaton {
		let sets = FirstAndFollow::new(grammar);
		Automaton::new(Context::new(grammar, &sets), mode)
	}

	#[test]
	fn canonical_collection_sizes() {
		let grammar = expr();
		assert_eq!(build(&grammar, Mode::LR0).len(), 12);
		assert_eq!(build(&grammar, Mode::LR1).len(), 22);
	}

	#[test]
	fn states_are_distinct_and_closed() {
		let grammar = expr();
		let sets = FirstAndFollow::new(&grammar);
		let context = Context::new(&grammar, &sets);

		for &mode in &[Mode::LR0, Mode::LR1] {
			let automaton = Automaton::new(context, mode);
			let distinct: HashSet<&ItemSet> = automaton.states().iter().map(|s| &s.items).collect();
			assert_eq!(distinct.len(), automaton.len());

			for (q, state) in automaton.states().iter().enumerate() {
				assert_eq!(state.items.closure(context, mode), state.items);
				for (symbol, r) in automaton.transitions_for(q as u32) {
					assert_eq!(
						state.items.goto(context, mode, symbol),
						automaton.state(r).unwrap().items
					);
				}
			}
		}
	}

	#[test]
	fn initial_state() {
		let grammar = expr();
		let automaton = build(&grammar, Mode::LR1);
		let initial = &automaton.state(0).unwrap().items;
		assert!(initial.contains(&Item::new(0, 0, Some(Symbol::EndMarker))));
		assert_eq!(automaton.find(initial), Some(0));
	}

	#[test]
	fn shortest_paths() {
		let grammar = expr();
		let automaton = build(&grammar, Mode::LR0);
		assert_eq!(automaton.path_to(0), Some(Vec::new()));

		let q = automaton.transition(0, Symbol::Terminal('(')).unwrap();
		let q = automaton.transition(q, Symbol::NonTerminal('E')).unwrap();
		assert_eq!(
			automaton.path_to(q),
			Some(vec![Symbol::Terminal('('), Symbol::NonTerminal('E')])
		);
		assert_eq!(automaton.path_to(100), None);
	}

	#[test]
	fn dot_output() {
		let grammar = Grammar::builder().rule('S', "a").build().unwrap();
		let automaton = build(&grammar, Mode::LR0);
		let mut out = Vec::new();
		automaton.dot_write(&grammar, &mut out).unwrap();
		let dot = String::from_utf8(out).unwrap();
		assert!(dot.starts_with("digraph {\n"));
		assert!(dot.contains("\tq0 -> q1 [ label=\"a\" ]\n"));
		assert!(dot.contains("\tq0 -> q2 [ label=\"S\" ]\n"));
		assert!(dot.contains("S' -&gt; ·S"));
	}
}
