use std::fmt;

/// Character reserved for the end of input.
pub const END_MARKER: char = '$';

/// Default epsilon marker in grammar text.
pub const EPSILON_MARKER: char = '#';

/// Grammar symbol.
///
/// The classification of a character as terminal or non-terminal is decided once, when the grammar is built.
/// The derived ordering puts terminals first, then non-terminals, then the end marker and epsilon,
/// which is the column order used when rendering tables.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub enum Symbol {
	Terminal(char),
	NonTerminal(char),
	EndMarker,
	Epsilon,
}

impl Symbol {
	/// Checks if this symbol can appear in the ACTION part of a table
	/// (a terminal or the end marker).
	pub fn is_lookahead(&self) -> bool {
		match self {
			Self::Terminal(_) | Self::EndMarker => true,
			_ => false,
		}
	}

	pub fn as_non_terminal(&self) -> Option<char> {
		match self {
			Self::NonTerminal(c) => Some(*c),
			_ => None,
		}
	}
}

impl fmt::Display for Symbol {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Terminal(c) => fmt::Display::fmt(c, f),
			Self::NonTerminal(c) => fmt::Display::fmt(c, f),
			Self::EndMarker => fmt::Display::fmt(&END_MARKER, f),
			Self::Epsilon => write!(f, "ε"),
		}
	}
}
