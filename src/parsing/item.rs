use super::{Context, Mode};
use crate::grammar::{production, Grammar, Symbol};
use std::collections::{btree_map::Entry, BTreeMap, BTreeSet};
use std::fmt;

/// LR item.
///
/// LR(0) items have no lookahead. LR(1) items carry a single terminal or end marker lookahead.
/// The derived ordering (production, offset, lookahead) is total.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Item {
	/// Production index.
	pub production: u32,

	/// Offset of the dot in the production.
	pub offset: u32,

	pub lookahead: Option<Symbol>,
}

impl Item {
	pub fn new(production: u32, offset: u32, lookahead: Option<Symbol>) -> Self {
		Self {
			production,
			offset,
			lookahead,
		}
	}

	/// Item `[p -> ·α]` (with the given lookahead).
	pub fn from_production(production: u32, lookahead: Option<Symbol>) -> Self {
		Self::new(production, 0, lookahead)
	}

	pub fn shifted(&self) -> Self {
		Self {
			production: self.production,
			offset: self.offset + 1,
			lookahead: self.lookahead,
		}
	}

	/// Item without its lookahead.
	pub fn core(&self) -> (u32, u32) {
		(self.production, self.offset)
	}

	/// Symbol right after the dot, if any.
	pub fn current_symbol(&self, grammar: &Grammar) -> Option<Symbol> {
		grammar
			.production(self.production)
			.and_then(|p| p.symbol(self.offset))
	}

	/// Checks if the dot is at the end of the production.
	pub fn is_complete(&self, grammar: &Grammar) -> bool {
		grammar
			.production(self.production)
			.map(|p| self.offset >= p.len())
			.unwrap_or(false)
	}

	pub fn format<'g>(&self, grammar: &'g Grammar) -> FormattedItem<'g, '_> {
		FormattedItem(grammar, self)
	}
}

pub struct FormattedItem<'g, 'i>(&'g Grammar, &'i Item);

impl<'g, 'i> fmt::Display for FormattedItem<'g, 'i> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let p = match self.0.production(self.1.production) {
			Some(p) => p,
			None => return write!(f, "<invalid item>"),
		};

		production::write_lhs(f, self.0, p.lhs())?;
		write!(f, " -> ")?;

		for (i, symbol) in p.rhs().iter().enumerate() {
			if i as u32 == self.1.offset {
				write!(f, "·")?
			}

			fmt::Display::fmt(symbol, f)?
		}

		if self.1.offset >= p.len() {
			write!(f, "·")?
		}

		if let Some(lookahead) = self.1.lookahead {
			write!(f, ", {}", lookahead)?
		}

		Ok(())
	}
}

/// Item set core: the `(production, offset)` pairs of its items.
pub type Core = BTreeSet<(u32, u32)>;

/// Set of items.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
pub struct ItemSet {
	items: BTreeSet<Item>,
}

impl ItemSet {
	pub fn new() -> Self {
		Self {
			items: BTreeSet::new(),
		}
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	pub fn iter(&self) -> std::collections::btree_set::Iter<Item> {
		self.items.iter()
	}

	pub fn contains(&self, item: &Item) -> bool {
		self.items.contains(item)
	}

	pub fn insert(&mut self, item: Item) -> bool {
		self.items.insert(item)
	}

	pub fn extend<I: IntoIterator<Item = Item>>(&mut self, items: I) {
		self.items.extend(items)
	}

	pub fn core(&self) -> Core {
		self.items.iter().map(Item::core).collect()
	}

	/// Items directly implied by the given item:
	/// `[B -> ·γ]` for every production of `B` if the dot of `item` is before `B`.
	///
	/// In LR(1) mode, each new item is generated once per lookahead in `FIRST(β a)`.
	fn expand(context: Context, mode: Mode, item: &Item) -> Vec<Item> {
		let grammar = context.grammar;
		let production = match grammar.production(item.production) {
			Some(p) => p,
			None => return Vec::new(),
		};

		let b = match production.symbol(item.offset) {
			Some(Symbol::NonTerminal(b)) => b,
			_ => return Vec::new(),
		};

		let lookaheads: Vec<Option<Symbol>> = match (mode, item.lookahead) {
			(Mode::LR1, Some(a)) => {
				let beta = &production.rhs()[(item.offset as usize + 1)..];
				context
					.sets
					.first_of_then(beta, a)
					.into_iter()
					.map(Some)
					.collect()
			}
			_ => vec![None],
		};

		let mut items = Vec::new();
		for &p in grammar.productions_of(b) {
			for lookahead in &lookaheads {
				items.push(Item::from_production(p, *lookahead))
			}
		}

		items
	}

	/// Closes this item set.
	///
	/// Worklist fixpoint: every item added is expanded exactly once.
	pub fn closure(&self, context: Context, mode: Mode) -> ItemSet {
		let mut closed = self.clone();
		let mut stack: Vec<Item> = self.items.iter().cloned().collect();

		while let Some(item) = stack.pop() {
			for new_item in Self::expand(context, mode, &item) {
				if closed.insert(new_item) {
					stack.push(new_item)
				}
			}
		}

		closed
	}

	/// Closed set of items reached by moving the dot over `symbol`.
	///
	/// Empty if no item expects `symbol`.
	pub fn goto(&self, context: Context, mode: Mode, symbol: Symbol) -> ItemSet {
		let mut kernel = ItemSet::new();

		for item in &self.items {
			if item.current_symbol(context.grammar) == Some(symbol) {
				kernel.insert(item.shifted());
			}
		}

		if kernel.is_empty() {
			kernel
		} else {
			kernel.closure(context, mode)
		}
	}

	/// Every non-empty goto of this set, indexed by symbol.
	pub fn shift(&self, context: Context, mode: Mode) -> BTreeMap<Symbol, ItemSet> {
		let mut map: BTreeMap<Symbol, ItemSet> = BTreeMap::new();

		for item in &self.items {
			if let Some(symbol) = item.current_symbol(context.grammar) {
				match map.entry(symbol) {
					Entry::Occupied(mut entry) => {
						entry.get_mut().insert(item.shifted());
					}
					Entry::Vacant(entry) => {
						let mut set = ItemSet::new();
						set.insert(item.shifted());
						entry.insert(set);
					}
				}
			}
		}

		map.into_iter()
			.map(|(symbol, kernel)| (symbol, kernel.closure(context, mode)))
			.collect()
	}

	pub fn format<'g>(&self, grammar: &'g Grammar) -> FormattedItemSet<'g, '_> {
		FormattedItemSet(grammar, self)
	}

	pub fn dot_format<'g>(&self, grammar: &'g Grammar) -> DotFormattedItemSet<'g, '_> {
		DotFormattedItemSet(grammar, self)
	}
}

impl<'a> IntoIterator for &'a ItemSet {
	type Item = &'a Item;
	type IntoIter = std::collections::btree_set::Iter<'a, Item>;

	fn into_iter(self) -> Self::IntoIter {
		self.items.iter()
	}
}

impl std::iter::FromIterator<Item> for ItemSet {
	fn from_iter<I: IntoIterator<Item = Item>>(iter: I) -> Self {
		Self {
			items: iter.into_iter().collect(),
		}
	}
}

pub struct FormattedItemSet<'g, 's>(&'g Grammar, &'s ItemSet);

impl<'g, 's> fmt::Display for FormattedItemSet<'g, 's> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		for item in &self.1.items {
			write!(f, "\t{}\n", item.format(self.0))?
		}

		Ok(())
	}
}

/// Escapes a string for a Graphviz HTML-like label.
fn escape_html(s: &str) -> String {
	let mut escaped = String::with_capacity(s.len());
	for c in s.chars() {
		match c {
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'&' => escaped.push_str("&amp;"),
			'"' => escaped.push_str("&quot;"),
			c => escaped.push(c),
		}
	}
	escaped
}

pub struct DotFormattedItemSet<'g, 's>(&'g Grammar, &'s ItemSet);

impl<'g, 's> fmt::Display for DotFormattedItemSet<'g, 's> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "<table>")?;

		for item in &self.1.items {
			let label = format!("{}", item.format(self.0));
			write!(f, "<tr><td>{}</td></tr>", escape_html(&label))?
		}

		write!(f, "</table>")
	}
}
