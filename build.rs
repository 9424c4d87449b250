use proc_macro2::TokenStream;
use quote::quote;
use std::{
	fs::{self, File},
	io::{self, BufReader, Read, Write},
	path::{Path, PathBuf},
};

#[derive(Debug)]
pub enum Error {
	IO(io::Error),
	Toml(toml::de::Error),
	Data(PathBuf, DataError),
}

impl From<io::Error> for Error {
	fn from(e: io::Error) -> Self {
		Self::IO(e)
	}
}

impl From<toml::de::Error> for Error {
	fn from(e: toml::de::Error) -> Self {
		Self::Toml(e)
	}
}

#[derive(Debug)]
pub enum DataError {
	DocumentNotATable,
	GrammarNotString,
	CheckNotArray,
	CheckNotTable,
	CheckNoName,
	NameNotString,
	CheckNoAlgorithm,
	AlgorithmNotString,
	UnknownAlgorithm(String),
	CheckNoStates,
	CheckNoConflicts,
	NotACount(&'static str),
}

fn main() -> Result<(), Error> {
	println!("cargo:rerun-if-changed=tests");

	foreach_toml_file("tests", |path| {
		let stem = path.file_stem().unwrap().to_string_lossy();
		let mut output = path.parent().unwrap().to_path_buf();
		output.push(&*stem);
		output.set_extension("rs");

		if should_generate(&output, &path)? {
			let contents = read_file(&path)?;
			let toml: toml::Value = contents.parse()?;
			let test = Test::from_toml(&stem, toml).map_err(|e| Error::Data(path.clone(), e))?;
			let code = test.generate("tests");
			write_file(output, format!("{}", code))?
		}

		Ok(())
	})
}

fn should_generate(output: &Path, source: &Path) -> io::Result<bool> {
	if output.exists() {
		let source_metadata = fs::metadata(source)?;
		let output_metadata = fs::metadata(output)?;
		let source_modified = source_metadata.modified()?;
		let output_modified = output_metadata.modified()?;
		Ok(source_modified > output_modified)
	} else {
		Ok(true)
	}
}

fn foreach_toml_file<P: AsRef<Path>, F>(dir: P, f: F) -> Result<(), Error>
where
	F: Fn(PathBuf) -> Result<(), Error>,
{
	for entry in fs::read_dir(dir)? {
		let entry = entry?;
		let path = entry.path();
		if path.is_file() {
			if let Some(ext) = path.extension() {
				if ext == "toml" {
					f(path)?
				}
			}
		}
	}

	Ok(())
}

fn read_file<P: AsRef<Path>>(path: P) -> io::Result<String> {
	let file = fs::File::open(path)?;
	let mut buf_reader = BufReader::new(file);
	let mut contents = String::new();
	buf_reader.read_to_string(&mut contents)?;
	Ok(contents)
}

fn write_file<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> io::Result<()> {
	let mut file = File::create(path)?;
	file.write_all(contents.as_ref())
}

fn get_count(table: &toml::value::Table, key: &'static str) -> Result<Option<usize>, DataError> {
	match table.get(key) {
		Some(value) => match value.as_integer() {
			Some(n) if n >= 0 => Ok(Some(n as usize)),
			_ => Err(DataError::NotACount(key)),
		},
		None => Ok(None),
	}
}

/// Fixture description.
pub struct Test {
	/// Grammar file basename.
	grammar: String,

	checks: Vec<Check>,
}

impl Test {
	fn from_toml(stem: &str, toml: toml::Value) -> Result<Self, DataError> {
		let table = toml.as_table().ok_or(DataError::DocumentNotATable)?;
		let grammar = table
			.get("grammar")
			.map(|n| n.as_str().ok_or(DataError::GrammarNotString))
			.transpose()?
			.unwrap_or(stem);

		let mut checks = Vec::new();
		if let Some(value) = table.get("check") {
			let values = value.as_array().ok_or(DataError::CheckNotArray)?;
			for check in values {
				checks.push(Check::from_toml(check)?)
			}
		}

		Ok(Self {
			grammar: grammar.to_string(),
			checks,
		})
	}

	fn generate<P: AsRef<Path>>(&self, root: P) -> TokenStream {
		let mut grammar_path = root.as_ref().to_path_buf();
		grammar_path.push(&self.grammar);
		grammar_path.set_extension("grammar");
		let grammar_path_string = grammar_path.to_string_lossy();

		let checks = self.checks.iter().map(|c| c.generate());

		quote! {
			use std::{
				fs::File,
				io::{BufReader, Read},
			};
			use utf8_decode::UnsafeDecoder;
			use lrgen::{Algorithm, Construction};

			lazy_static::lazy_static! {
				static ref GRAMMAR: lrgen::Grammar = {
					let file = File::open(#grammar_path_string).unwrap();
					let input = BufReader::new(file);
					let metrics = source_span::DefaultMetrics::with_tab_stop(4);
					let utf8_input = UnsafeDecoder::new(input.bytes());
					match lrgen::parse_and_compile(utf8_input, metrics) {
						Ok(grammar) => grammar,
						Err(e) => panic!("invalid grammar: {}", e.as_ref())
					}
				};
			}

			#(#checks)*
		}
	}
}

/// Expected outcome of one table construction.
pub struct Check {
	/// Test name.
	name: String,

	algorithm: String,

	/// Expected number of states. Unused by LL(1) checks.
	states: usize,

	/// Expected number of conflicts.
	conflicts: usize,

	/// Expected number of LR(1) states before an LALR(1) merge.
	lr1_states: Option<usize>,
}

impl Check {
	fn from_toml(toml: &toml::Value) -> Result<Self, DataError> {
		let table = toml.as_table().ok_or(DataError::CheckNotTable)?;
		let name = table
			.get("name")
			.ok_or(DataError::CheckNoName)?
			.as_str()
			.ok_or(DataError::NameNotString)?;
		let algorithm = table
			.get("algorithm")
			.ok_or(DataError::CheckNoAlgorithm)?
			.as_str()
			.ok_or(DataError::AlgorithmNotString)?;

		match algorithm {
			"lr0" | "slr1" | "lr1" | "lalr1" | "ll1" => (),
			other => return Err(DataError::UnknownAlgorithm(other.to_string())),
		}

		let states = match get_count(table, "states")? {
			Some(states) => states,
			None if algorithm == "ll1" => 0,
			None => return Err(DataError::CheckNoStates),
		};
		let conflicts = get_count(table, "conflicts")?.ok_or(DataError::CheckNoConflicts)?;
		let lr1_states = get_count(table, "lr1-states")?;

		Ok(Self {
			name: name.to_string(),
			algorithm: algorithm.to_string(),
			states,
			conflicts,
			lr1_states,
		})
	}

	fn generate(&self) -> TokenStream {
		let id = quote::format_ident!("{}", self.name);
		let algorithm = &self.algorithm;
		let states = self.states;
		let conflicts = self.conflicts;
		let deterministic = self.conflicts == 0;

		if self.algorithm == "ll1" {
			return quote! {
				#[test]
				fn #id() {
					let sets = lrgen::parsing::FirstAndFollow::new(&GRAMMAR);
					let table = lrgen::parsing::PredictiveTable::new(lrgen::parsing::Context::new(&GRAMMAR, &sets));
					assert_eq!(table.len(), GRAMMAR.non_terminals().len());
					assert_eq!(table.conflicts().len(), #conflicts);
					assert_eq!(table.is_deterministic(), #deterministic);
				}
			};
		}

		let merge_check = self.lr1_states.map(|lr1_states| {
			quote! {
				let report = construction.merge().expect("no merge report");
				assert_eq!(report.lr1_len(), #lr1_states);
				assert_eq!(report.lalr1_len(), #states);
			}
		});

		quote! {
			#[test]
			fn #id() {
				let algorithm: Algorithm = #algorithm.parse().unwrap();
				let construction = Construction::new(&GRAMMAR, algorithm).expect("construction failed");
				assert_eq!(construction.automaton().len(), #states);
				assert_eq!(construction.table().len(), #states);
				assert_eq!(construction.conflicts().len(), #conflicts);
				assert_eq!(construction.table().is_deterministic(), #deterministic);
				#merge_check
			}
		}
	}
}
