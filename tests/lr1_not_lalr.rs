use lrgen::{Algorithm, Construction};
use std::{
	fs::File,
	io::{BufReader, Read},
};
use utf8_decode::UnsafeDecoder;

lazy_static::lazy_static! {
	static ref GRAMMAR: lrgen::Grammar = {
		let file = File::open("tests/lr1_not_lalr.grammar").unwrap();
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
	assert_eq!(construction.automaton().len(), 13);
	assert_eq!(construction.table().len(), 13);
	assert_eq!(construction.conflicts().len(), 6);
	assert_eq!(construction.table().is_deterministic(), false);
}

#[test]
fn slr1() {
	let algorithm: Algorithm = "slr1".parse().unwrap();
	let construction = Construction::new(&GRAMMAR, algorithm).expect("construction failed");
	assert_eq!(construction.automaton().len(), 13);
	assert_eq!(construction.table().len(), 13);
	assert_eq!(construction.conflicts().len(), 2);
	assert_eq!(construction.table().is_deterministic(), false);
}

#[test]
fn lr1() {
	let algorithm: Algorithm = "lr1".parse().unwrap();
	let construction = Construction::new(&GRAMMAR, algorithm).expect("construction failed");
	assert_eq!(construction.automaton().len(), 14);
	assert_eq!(construction.table().len(), 14);
	assert_eq!(construction.conflicts().len(), 0);
	assert_eq!(construction.table().is_deterministic(), true);
}

#[test]
fn lalr1() {
	let algorithm: Algorithm = "lalr1".parse().unwrap();
	let construction = Construction::new(&GRAMMAR, algorithm).expect("construction failed");
	assert_eq!(construction.automaton().len(), 13);
	assert_eq!(construction.table().len(), 13);
	assert_eq!(construction.conflicts().len(), 2);
	assert_eq!(construction.table().is_deterministic(), false);
	let report = construction.merge().expect("no merge report");
	assert_eq!(report.lr1_len(), 14);
	assert_eq!(report.lalr1_len(), 13);
}
