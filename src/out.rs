use source_span::{Metrics, Span};
use std::fmt;
use yansi::Paint;

mod conflict;

pub use conflict::{conflict_block, predictive_conflict_block};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Type {
	Warning,
	Error,
}

impl fmt::Display for Type {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Warning => write!(f, "{}", Paint::yellow("warning").bold()),
			Self::Error => write!(f, "{}", Paint::red("error").bold()),
		}
	}
}

/// Diagnostic message.
///
/// A title, source highlights and a list of notes.
pub struct Block {
	ty: Type,
	title: String,
	source: Option<String>,
	highlights: source_span::fmt::Formatter,
	highlight_count: usize,
	notes: Vec<Note>,
}

impl Block {
	pub fn new<S: ToString>(ty: Type, title: S) -> Block {
		Block {
			ty,
			title: title.to_string(),
			source: None,
			highlights: source_span::fmt::Formatter::new(),
			highlight_count: 0,
			notes: Vec::new(),
		}
	}

	pub fn title(&self) -> &str {
		&self.title
	}

	pub fn source(&self) -> Option<&str> {
		self.source.as_ref().map(|s| s.as_str())
	}

	/// Sets the source name (typically the grammar file name).
	pub fn set_source<S: ToString>(&mut self, source: S) {
		self.source = Some(source.to_string())
	}

	pub fn add_highlight(
		&mut self,
		span: Span,
		label: Option<String>,
		style: source_span::fmt::Style,
	) {
		self.highlights.add(span, label, style);
		self.highlight_count += 1
	}

	/// Checks if the block has source highlights.
	pub fn has_highlights(&self) -> bool {
		self.highlight_count > 0
	}

	pub fn highlights_mut(&mut self) -> &mut source_span::fmt::Formatter {
		&mut self.highlights
	}

	pub fn notes(&self) -> &[Note] {
		&self.notes
	}

	pub fn add_note<S: ToString>(&mut self, ty: NoteType, content: S) {
		self.notes.push(Note {
			ty,
			content: content.to_string(),
		})
	}

	pub fn render<E, I: Iterator<Item = Result<char, E>>, M: Metrics>(
		&self,
		input: I,
		span: Span,
		metrics: &M,
	) -> Result<Formatted, E> {
		let highlights = if self.has_highlights() {
			let margin_len = self.highlights.margin_len(&span);
			Some((
				if margin_len >= 2 { margin_len - 2 } else { 0 },
				self.highlights.render(input, span, metrics)?,
			))
		} else {
			None
		};

		Ok(Formatted {
			block: self,
			highlights,
		})
	}
}

pub struct Formatted<'a> {
	block: &'a Block,
	highlights: Option<(usize, source_span::fmt::Formatted)>,
}

impl<'a> fmt::Display for Formatted<'a> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let margin_len = self.highlights.as_ref().map(|(len, _)| *len).unwrap_or(0);
		let mut tab = String::with_capacity(margin_len);
		for _ in 0..margin_len {
			tab.push(' ')
		}

		write!(
			f,
			"{}{} {}\n",
			self.block.ty,
			Paint::new(':').bold(),
			Paint::new(&self.block.title).bold()
		)?;

		if let Some(source) = self.block.source() {
			write!(f, "{}--> {}\n", tab, source)?
		}

		if let Some((_, highlights)) = &self.highlights {
			write!(f, "{}{}", tab, Paint::blue('|').bold())?;
			if Paint::is_enabled() {
				fmt::Display::fmt(highlights, f)?;
			} else {
				// Highlight colors are chosen at compile time by `source-span`.
				f.write_str(&strip_colors(&highlights.to_string()))?;
			}
			write!(f, "{}{}\n", tab, Paint::blue('|').bold())?;
		}

		for note in &self.block.notes {
			for (i, line) in note.content.lines().enumerate() {
				if i == 0 {
					write!(f, "{}= {}: {}\n", tab, note.ty, line)?;
				} else {
					write!(f, "{}  {}\n", tab, line)?
				}
			}
		}

		Ok(())
	}
}

/// Removes ANSI escape sequences (`ESC [ ... final byte`) from a string.
fn strip_colors(text: &str) -> String {
	let mut result = String::with_capacity(text.len());
	let mut chars = text.chars().peekable();

	while let Some(c) = chars.next() {
		if c == '\x1b' && chars.peek() == Some(&'[') {
			chars.next();
			for c in &mut chars {
				if ('\x40'..='\x7e').contains(&c) {
					break;
				}
			}
		} else {
			result.push(c)
		}
	}

	result
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NoteType {
	Note,
	Help,
}

impl fmt::Display for NoteType {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Note => write!(f, "{}", Paint::new("note").bold()),
			Self::Help => write!(f, "{}", Paint::green("help").bold()),
		}
	}
}

pub struct Note {
	ty: NoteType,
	content: String,
}

impl Note {
	pub fn ty(&self) -> NoteType {
		self.ty
	}

	pub fn content(&self) -> &str {
		&self.content
	}
}
