use super::Algorithm;
use crate::grammar::Symbol;
use std::fmt;

/// Fatal table construction error.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Error {
	/// Two LR(1) states with the same core have transitions on the same symbol
	/// to states with different cores.
	MergeInconsistency {
		/// Merged state.
		state: u32,
		symbol: Symbol,

		/// Merged target already recorded.
		existing: u32,

		/// Merged target of the disagreeing transition.
		attempted: u32,
	},

	/// A transition leads to a state that is not part of the automaton.
	UnknownState {
		/// Source state.
		state: u32,
		symbol: Symbol,
		target: u32,
	},

	/// The algorithm does not build a state graph.
	NoStateGraph(Algorithm),
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::MergeInconsistency {
				state,
				symbol,
				existing,
				attempted,
			} => write!(
				f,
				"inconsistent LALR(1) merge: merged state {} goes to both {} and {} on `{}`",
				state, existing, attempted, symbol
			),
			Self::UnknownState {
				state,
				symbol,
				target,
			} => write!(
				f,
				"transition from state {} on `{}` leads to unknown state {}",
				state, symbol, target
			),
			Self::NoStateGraph(algorithm) => write!(f, "{} does not build a state graph", algorithm),
		}
	}
}

impl std::error::Error for Error {}
