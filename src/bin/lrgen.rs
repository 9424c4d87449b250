#[macro_use]
extern crate clap;

use source_span::{fmt::Style, DefaultMetrics, Position, SourceBuffer};
use std::{
	fs::File,
	io::{self, BufReader, Read, Write},
	path::Path,
};
use utf8_decode::UnsafeDecoder;
use yansi::Paint;

use lrgen::{
	out,
	parsing::{self, Algorithm, Construction, Context, FirstAndFollow, PredictiveTable, UnknownAlgorithm},
	Grammar,
};

type Input = UnsafeDecoder<io::Bytes<BufReader<Box<dyn Read>>>>;

/// Grammar source, kept to render diagnostics.
struct Source {
	name: String,
	buffer: SourceBuffer<io::Error, Input, DefaultMetrics>,
	metrics: DefaultMetrics,
}

impl Source {
	fn open(filename: Option<&str>) -> io::Result<Self> {
		let (name, input): (String, Box<dyn Read>) = match filename {
			Some(filename) => (filename.to_string(), Box::new(File::open(filename)?)),
			None => ("<stdin>".to_string(), Box::new(io::stdin())),
		};

		let metrics = DefaultMetrics::with_tab_stop(4);
		let utf8_input = UnsafeDecoder::new(BufReader::new(input).bytes());
		let buffer = SourceBuffer::new(utf8_input, Position::default(), metrics);

		Ok(Self {
			name,
			buffer,
			metrics,
		})
	}

	fn print(&self, block: &mut out::Block) -> io::Result<()> {
		block.set_source(&self.name);
		let formatted = block.render(self.buffer.iter(), self.buffer.span(), &self.metrics)?;
		eprintln!("{}", formatted);
		Ok(())
	}
}

fn main() -> io::Result<()> {
	// Parse options.
	let yaml = load_yaml!("lrgen.yml");
	let matches = clap::App::from_yaml(yaml).get_matches();

	// Init logger.
	let verbosity = matches.occurrences_of("verbose") as usize;
	stderrlog::new()
		.verbosity(verbosity)
		.init()
		.map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

	if matches.is_present("no-color") {
		Paint::disable()
	}

	let source = Source::open(matches.value_of("FILE"))?;

	log::info!("parsing grammar...");
	let grammar = match lrgen::parse_and_compile(source.buffer.iter(), source.metrics) {
		Ok(grammar) => grammar,
		Err(e) => {
			let mut block = out::Block::new(out::Type::Error, e.as_ref());
			block.add_highlight(e.span(), None, Style::Error);
			e.as_ref().format_notes(block.highlights_mut(), Style::Note);
			source.print(&mut block)?;
			std::process::exit(1)
		}
	};

	let mut output = match matches.value_of("output") {
		Some(path) => Output::file(path, true)?,
		None => Output::std(),
	};

	let options = Options {
		deny_conflicts: matches.is_present("deny-conflicts"),
	};

	if let Err(e) = run_subcommand(&matches, &source, &grammar, &options, &mut output) {
		e.print(&source)?;
		std::process::exit(1)
	}

	Ok(())
}

struct Options {
	deny_conflicts: bool,
}

fn algorithm(matches: &clap::ArgMatches) -> Result<Algorithm, Error> {
	let name = matches.value_of("algorithm").unwrap_or("lalr1");
	Ok(name.parse()?)
}

fn run_subcommand(
	matches: &clap::ArgMatches,
	source: &Source,
	grammar: &Grammar,
	options: &Options,
	output: &mut Output,
) -> Result<(), Error> {
	let mut out = output.lock();

	match matches.subcommand() {
		("grammar", Some(_)) => write!(out, "{}", grammar.format())?,
		("first-follow", Some(_)) => {
			log::info!("computing FIRST and FOLLOW sets...");
			let sets = FirstAndFollow::new(grammar);
			write!(out, "{}", sets.format())?
		}
		("states", Some(m)) => {
			let construction = construct(source, grammar, algorithm(m)?, options)?;
			write!(out, "{}", construction.automaton().format(grammar))?
		}
		("table", Some(m)) => match algorithm(m)? {
			Algorithm::LL1 => {
				let sets = FirstAndFollow::new(grammar);
				let table = predict(source, grammar, &sets, options)?;
				write!(out, "{}", table.format(grammar))?
			}
			algorithm => {
				let construction = construct(source, grammar, algorithm, options)?;
				write!(out, "{}", construction.table().format(grammar))?
			}
		},
		("merge", Some(_)) => {
			let construction = construct(source, grammar, Algorithm::LALR1, options)?;
			if let Some(report) = construction.merge() {
				write!(out, "{}", report.format(grammar))?
			}
		}
		("dot", Some(m)) => {
			let construction = construct(source, grammar, algorithm(m)?, options)?;
			construction.automaton().dot_write(grammar, &mut out)?
		}
		(name, _) => return Err(Error::UnknownCommand(name.to_string())),
	}

	Ok(())
}

/// Builds the table and reports its conflicts.
fn construct(
	source: &Source,
	grammar: &Grammar,
	algorithm: Algorithm,
	options: &Options,
) -> Result<Construction, Error> {
	log::info!("building {} table...", algorithm);
	let construction = Construction::new(grammar, algorithm)?;
	log::info!(
		"{} states, {} conflicts",
		construction.automaton().len(),
		construction.conflicts().len()
	);

	let conflicts = construction.conflicts();
	if !conflicts.is_empty() {
		log::warn!("the {} table has {} conflicts", algorithm, conflicts.len());

		let ty = if options.deny_conflicts {
			out::Type::Error
		} else {
			out::Type::Warning
		};

		for conflict in conflicts {
			let mut block = out::conflict_block(ty, grammar, construction.automaton(), conflict);
			source.print(&mut block)?
		}

		if options.deny_conflicts {
			return Err(Error::Conflicts(algorithm, conflicts.len()));
		}
	}

	Ok(construction)
}

/// Builds the LL(1) table and reports its conflicts.
fn predict(
	source: &Source,
	grammar: &Grammar,
	sets: &FirstAndFollow,
	options: &Options,
) -> Result<PredictiveTable, Error> {
	log::info!("building {} table...", Algorithm::LL1);
	let table = PredictiveTable::new(Context::new(grammar, sets));

	let conflicts = table.conflicts();
	if !conflicts.is_empty() {
		log::warn!("the {} table has {} conflicts", Algorithm::LL1, conflicts.len());

		let ty = if options.deny_conflicts {
			out::Type::Error
		} else {
			out::Type::Warning
		};

		for conflict in conflicts {
			let mut block = out::predictive_conflict_block(ty, grammar, conflict);
			source.print(&mut block)?
		}

		if options.deny_conflicts {
			return Err(Error::Conflicts(Algorithm::LL1, conflicts.len()));
		}
	}

	Ok(table)
}

enum Error {
	UnknownCommand(String),
	IO(io::Error),
	Algorithm(UnknownAlgorithm),
	Construction(parsing::Error),
	Conflicts(Algorithm, usize),
}

impl Error {
	fn print(&self, source: &Source) -> io::Result<()> {
		let mut block = match self {
			Self::UnknownCommand(name) => {
				out::Block::new(out::Type::Error, format!("unknown command `{}`", name))
			}
			Self::IO(e) => out::Block::new(out::Type::Error, e),
			Self::Algorithm(e) => {
				let mut block = out::Block::new(out::Type::Error, e);
				block.add_note(
					out::NoteType::Help,
					"expected one of `lr0`, `slr1`, `lr1`, `lalr1` or `ll1`",
				);
				block
			}
			Self::Construction(e) => out::Block::new(out::Type::Error, e),
			Self::Conflicts(algorithm, count) => out::Block::new(
				out::Type::Error,
				format!("the grammar is not {}: {} conflicts", algorithm, count),
			),
		};

		source.print(&mut block)
	}
}

impl From<io::Error> for Error {
	fn from(e: io::Error) -> Self {
		Self::IO(e)
	}
}

impl From<UnknownAlgorithm> for Error {
	fn from(e: UnknownAlgorithm) -> Self {
		Self::Algorithm(e)
	}
}

impl From<parsing::Error> for Error {
	fn from(e: parsing::Error) -> Self {
		Self::Construction(e)
	}
}

pub enum Output {
	Std(std::io::Stdout),
	File(std::fs::File),
}

impl Output {
	fn std() -> Self {
		Self::Std(std::io::stdout())
	}

	fn file<P: AsRef<Path>>(path: P, create_parents: bool) -> io::Result<Self> {
		if create_parents {
			if let Some(parent) = path.as_ref().parent() {
				std::fs::create_dir_all(parent)?
			}
		}

		Ok(Self::File(File::create(path)?))
	}

	fn lock<'a>(&'a mut self) -> LockedOutput<'a> {
		match self {
			Output::Std(stdout) => LockedOutput::Std(stdout.lock()),
			Output::File(ref mut file) => LockedOutput::File(file),
		}
	}
}

pub enum LockedOutput<'a> {
	Std(std::io::StdoutLock<'a>),
	File(&'a mut std::fs::File),
}

impl<'a> io::Write for LockedOutput<'a> {
	fn write(&mut self, data: &[u8]) -> io::Result<usize> {
		match self {
			Self::Std(o) => o.write(data),
			Self::File(o) => o.write(data),
		}
	}

	fn flush(&mut self) -> io::Result<()> {
		match self {
			Self::Std(o) => o.flush(),
			Self::File(o) => o.flush(),
		}
	}
}
