use source_span::Loc;
use std::fmt;

/// Grammar file.
pub struct Grammar {
	pub items: Vec<Loc<Item>>,
}

pub enum Item {
	Directive(Loc<Directive>, Vec<Loc<char>>),

	/// Alternatives of a left hand side.
	///
	/// Continuation lines (`| ...`) are attached to the left hand side of the previous rule.
	Rule(Loc<char>, Vec<Loc<Alternative>>),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Directive {
	Start,
	NonTerminals,
	Terminals,
	Epsilon,
}

impl Directive {
	pub fn from_name(name: &str) -> Option<Self> {
		match name {
			"start" => Some(Self::Start),
			"nonterminals" | "non_terminals" => Some(Self::NonTerminals),
			"terminals" => Some(Self::Terminals),
			"epsilon" => Some(Self::Epsilon),
			_ => None,
		}
	}

	/// Checks if the directive takes exactly one symbol.
	pub fn is_single(&self) -> bool {
		match self {
			Self::Start | Self::Epsilon => true,
			_ => false,
		}
	}
}

impl fmt::Display for Directive {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Start => write!(f, "%start"),
			Self::NonTerminals => write!(f, "%nonterminals"),
			Self::Terminals => write!(f, "%terminals"),
			Self::Epsilon => write!(f, "%epsilon"),
		}
	}
}

/// Right hand side of a rule, possibly empty.
pub struct Alternative {
	pub symbols: Vec<Loc<char>>,
}
