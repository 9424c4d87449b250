use crate::grammar::Grammar;
use std::{fmt, str::FromStr};

mod error;
mod first_follow;
pub mod item;
pub mod table;

pub use error::Error;
pub use first_follow::{FirstAndFollow, FormattedFirstAndFollow};
pub use item::{Item, ItemSet};
pub use table::{
	lalr1::MergeReport, Action, Automaton, Conflict, ConflictKind, Policy, Prediction,
	PredictiveConflict, PredictiveConflictKind, PredictiveTable, Table,
};

/// Item kind used while building a canonical collection.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Mode {
	/// Items without lookahead.
	LR0,

	/// Items with a lookahead terminal.
	LR1,
}

/// Read-only data shared by the closure operators.
#[derive(Clone, Copy)]
pub struct Context<'a> {
	pub grammar: &'a Grammar,
	pub sets: &'a FirstAndFollow,
}

impl<'a> Context<'a> {
	pub fn new(grammar: &'a Grammar, sets: &'a FirstAndFollow) -> Self {
		Self { grammar, sets }
	}
}

/// Parsing table construction algorithm.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Algorithm {
	LR0,
	SLR1,
	LR1,
	LALR1,

	/// Predictive table, without state graph.
	LL1,
}

impl Algorithm {
	/// Item kind of the canonical collection, or `None` for LL(1).
	pub fn mode(&self) -> Option<Mode> {
		match self {
			Self::LR0 | Self::SLR1 => Some(Mode::LR0),
			Self::LR1 | Self::LALR1 => Some(Mode::LR1),
			Self::LL1 => None,
		}
	}

	pub fn policy(&self) -> Option<Policy> {
		match self {
			Self::LR0 => Some(Policy::LR0),
			Self::SLR1 => Some(Policy::SLR1),
			Self::LR1 | Self::LALR1 => Some(Policy::Lookahead),
			Self::LL1 => None,
		}
	}

	/// Checks if the algorithm builds an LR automaton.
	pub fn is_lr(&self) -> bool {
		self.mode().is_some()
	}
}

impl fmt::Display for Algorithm {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::LR0 => write!(f, "LR(0)"),
			Self::SLR1 => write!(f, "SLR(1)"),
			Self::LR1 => write!(f, "LR(1)"),
			Self::LALR1 => write!(f, "LALR(1)"),
			Self::LL1 => write!(f, "LL(1)"),
		}
	}
}

#[derive(Debug)]
pub struct UnknownAlgorithm(pub String);

impl fmt::Display for UnknownAlgorithm {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "unknown algorithm `{}`", self.0)
	}
}

impl std::error::Error for UnknownAlgorithm {}

impl FromStr for Algorithm {
	type Err = UnknownAlgorithm;

	fn from_str(s: &str) -> Result<Self, UnknownAlgorithm> {
		match s.to_lowercase().as_str() {
			"lr0" | "lr(0)" => Ok(Self::LR0),
			"slr" | "slr1" | "slr(1)" => Ok(Self::SLR1),
			"lr1" | "lr(1)" | "clr" | "clr1" => Ok(Self::LR1),
			"lalr" | "lalr1" | "lalr(1)" => Ok(Self::LALR1),
			"ll1" | "ll(1)" => Ok(Self::LL1),
			_ => Err(UnknownAlgorithm(s.to_string())),
		}
	}
}

/// Complete table construction for one grammar and algorithm.
pub struct Construction {
	algorithm: Algorithm,
	sets: FirstAndFollow,
	automaton: Automaton,
	merge: Option<MergeReport>,
	table: Table,
}

impl Construction {
	/// Computes the FIRST/FOLLOW sets, the canonical collection (merged for LALR(1)) and the table.
	///
	/// Conflicts do not make the construction fail: they are recorded in the table.
	/// LL(1) has no state graph; use `PredictiveTable` instead.
	pub fn new(grammar: &Grammar, algorithm: Algorithm) -> Result<Self, Error> {
		let (mode, policy) = match (algorithm.mode(), algorithm.policy()) {
			(Some(mode), Some(policy)) => (mode, policy),
			_ => return Err(Error::NoStateGraph(algorithm)),
		};

		let sets = FirstAndFollow::new(grammar);
		let context = Context::new(grammar, &sets);

		let collection = Automaton::new(context, mode);
		log::debug!("{} canonical collection: {} states", algorithm, collection.len());

		let (automaton, merge) = match algorithm {
			Algorithm::LALR1 => {
				let (merged, report) = table::lalr1::merge(&collection)?;
				log::debug!(
					"merged {} LR(1) states into {} LALR(1) states",
					report.lr1_len(),
					report.lalr1_len()
				);
				(merged, Some(report))
			}
			_ => (collection, None),
		};

		let table = Table::new(context, &automaton, policy);

		Ok(Self {
			algorithm,
			sets,
			automaton,
			merge,
			table,
		})
	}

	pub fn algorithm(&self) -> Algorithm {
		self.algorithm
	}

	pub fn sets(&self) -> &FirstAndFollow {
		&self.sets
	}

	pub fn automaton(&self) -> &Automaton {
		&self.automaton
	}

	/// LALR(1) merge report, if the algorithm is LALR(1).
	pub fn merge(&self) -> Option<&MergeReport> {
		self.merge.as_ref()
	}

	pub fn table(&self) -> &Table {
		&self.table
	}

	pub fn conflicts(&self) -> &[Conflict] {
		self.table.conflicts()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn algorithm_names() {
		assert_eq!("lalr1".parse::<Algorithm>().unwrap(), Algorithm::LALR1);
		assert_eq!("SLR".parse::<Algorithm>().unwrap(), Algorithm::SLR1);
		assert_eq!("clr".parse::<Algorithm>().unwrap(), Algorithm::LR1);
		assert_eq!("lr0".parse::<Algorithm>().unwrap(), Algorithm::LR0);
		assert_eq!("LL(1)".parse::<Algorithm>().unwrap(), Algorithm::LL1);
		assert!("ll2".parse::<Algorithm>().is_err());
		assert_eq!(format!("{}", Algorithm::LALR1), "LALR(1)");
		assert_eq!(format!("{}", Algorithm::LL1), "LL(1)");
	}

	#[test]
	fn modes_and_policies() {
		assert_eq!(Algorithm::SLR1.mode(), Some(Mode::LR0));
		assert_eq!(Algorithm::SLR1.policy(), Some(Policy::SLR1));
		assert_eq!(Algorithm::LALR1.mode(), Some(Mode::LR1));
		assert_eq!(Algorithm::LALR1.policy(), Some(Policy::Lookahead));
		assert_eq!(Algorithm::LL1.mode(), None);
		assert!(!Algorithm::LL1.is_lr());
	}

	#[test]
	fn predictive_construction_has_no_states() {
		let grammar = Grammar::builder().rule('S', "a").build().unwrap();
		match Construction::new(&grammar, Algorithm::LL1) {
			Err(e) => assert_eq!(e, Error::NoStateGraph(Algorithm::LL1)),
			Ok(_) => panic!("expected an error"),
		}
	}
}
