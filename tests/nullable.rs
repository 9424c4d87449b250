use lrgen::{Algorithm, Construction};
use std::{
	fs::File,
	io::{BufReader, Read},
};
use utf8_decode::UnsafeDecoder;

lazy_static::lazy_static! {
	static ref GRAMMAR: lrgen::Grammar = {
		let file = File::open("tests/nullable.grammar").unwrap();
		let input = BufReader::new(file);
		let metrics = source_span::DefaultMetrics::with_tab_stop(4);
		let utf8_input = UnsafeDecoder::new(input.bytes());
		match lrgen::parse_and_compile(utf8_input, metrics) {
			Ok(grammar) => grammar,
			Err(e) => panic!("invalid grammar: {}", e.as_ref()),
		}
	};
}

#[test]
fn lr0() {
	let algorithm: Algorithm = "lr0".parse().unwrap();
	let construction = Construction::new(&GRAMMAR, algorithm).expect("construction failed");
	assert_eq!(construction.automaton().len(), 7);
	assert_eq!(construction.table().len(), 7);
	assert_eq!(construction.conflicts().len(), 3);
	assert_eq!(construction.table().is_deterministic(), false);
}

#[test]
fn slr1() {
	let algorithm: Algorithm = "slr1".parse().unwrap();
	let construction = Construction::new(&GRAMMAR, algorithm).expect("construction failed");
	assert_eq!(construction.automaton().len(), 7);
	assert_eq!(construction.table().len(), 7);
	assert_eq!(construction.conflicts().len(), 0);
	assert_eq!(construction.table().is_deterministic(), true);
}

#[test]
fn lr1() {
	let algorithm: Algorithm = "lr1".parse().unwrap();
	let construction = Construction::new(&GRAMMAR, algorithm).expect("construction failed");
	assert_eq!(construction.automaton().len(), 7);
	assert_eq!(construction.table().len(), 7);
	assert_eq!(construction.conflicts().len(), 0);
	assert_eq!(construction.table().is_deterministic(), true);
}

#[test]
fn lalr1() {
	let algorithm: Algorithm = "lalr1".parse().unwrap();
	let construction = Construction::new(&GRAMMAR, algorithm).expect("construction failed");
	assert_eq!(construction.automaton().len(), 7);
	assert_eq!(construction.table().len(), 7);
	assert_eq!(construction.conflicts().len(), 0);
	assert_eq!(construction.table().is_deterministic(), true);
	let report = construction.merge().expect("no merge report");
	assert_eq!(report.lr1_len(), 7);
	assert_eq!(report.lalr1_len(), 7);
}

#[test]
fn ll1() {
	let sets = lrgen::parsing::FirstAndFollow::new(&GRAMMAR);
	let table =
		lrgen::parsing::PredictiveTable::new(lrgen::parsing::Context::new(&GRAMMAR, &sets));
	assert_eq!(table.len(), GRAMMAR.non_terminals().len());
	assert_eq!(table.conflicts().len(), 0);
	assert_eq!(table.is_deterministic(), true);
}
