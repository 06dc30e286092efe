use glint_primitives::Offset;
use glint_space::{Candidates, TokenSource, Viewport};
use regex::Regex;

/// Word tokens of a fixed document, with offsets in chars.
pub struct WordSource {
	words: Vec<(Offset, String)>,
}

impl WordSource {
	pub fn new(text: &str) -> Self {
		let pattern = Regex::new(r"\w+").expect("static pattern");
		let mut words = Vec::new();
		let mut chars = 0;
		let mut scanned = 0;
		for found in pattern.find_iter(text) {
			chars += text[scanned..found.start()].chars().count();
			scanned = found.start();
			words.push((chars, found.as_str().to_string()));
		}
		Self { words }
	}

	pub fn len(&self) -> usize {
		self.words.len()
	}
}

impl TokenSource for WordSource {
	fn find_candidates(&self, viewport: Viewport) -> Candidates {
		self.words
			.iter()
			.filter(|(offset, _)| viewport.contains(*offset))
			.map(|(offset, word)| (*offset, word.clone()))
			.collect()
	}
}
