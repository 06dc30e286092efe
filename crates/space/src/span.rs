use glint_primitives::{Identity, Offset};

/// Returns the lowercased first character of `text`, the key of its pool.
pub fn character_of(text: &str) -> Option<char> {
	let first = text.chars().next()?;
	first.to_lowercase().next()
}

/// An active assignment of an identity to a token's text range.
///
/// The current range is `[start, end)` with `end` always derived from the
/// current text. `original_text` is the text as consumed, before any overlap
/// correction shrank it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumedSpan {
	identity: Identity,
	start: Offset,
	character: char,
	text: String,
	original_text: String,
}

impl ConsumedSpan {
	/// Builds a span whose current text is the first `len` chars of `text`.
	pub(crate) fn new(identity: Identity, start: Offset, character: char, text: &str, len: usize) -> Self {
		Self {
			identity,
			start,
			character,
			text: text.chars().take(len).collect(),
			original_text: text.to_string(),
		}
	}

	pub fn identity(&self) -> Identity {
		self.identity
	}

	pub fn start(&self) -> Offset {
		self.start
	}

	/// Exclusive end of the current range.
	pub fn end(&self) -> Offset {
		self.start + self.len()
	}

	pub fn len(&self) -> usize {
		self.text.chars().count()
	}

	pub fn is_empty(&self) -> bool {
		self.text.is_empty()
	}

	/// Pool key: the lowercased first character.
	pub fn character(&self) -> char {
		self.character
	}

	pub fn text(&self) -> &str {
		&self.text
	}

	pub fn original_text(&self) -> &str {
		&self.original_text
	}

	pub fn original_len(&self) -> usize {
		self.original_text.chars().count()
	}

	/// Returns true if `offset` lies in `[start, end)`.
	pub fn contains(&self, offset: Offset) -> bool {
		offset >= self.start && offset < self.end()
	}

	/// Returns true if the current ranges of both spans intersect.
	pub fn overlaps(&self, other: &ConsumedSpan) -> bool {
		self.start < other.end() && other.start < self.end()
	}

	/// Shrinks the current text so the span ends at `end`.
	pub(crate) fn truncate_at(&mut self, end: Offset) {
		debug_assert!(end > self.start, "truncation would empty span at {}", self.start);
		let keep = end.saturating_sub(self.start);
		self.text = self.original_text.chars().take(keep.min(self.len())).collect();
	}

	/// Grows the current text back toward the original, never past `limit`.
	pub(crate) fn restretch_to(&mut self, limit: Offset) {
		let keep = self.original_len().min(limit.saturating_sub(self.start));
		if keep > self.len() {
			self.text = self.original_text.chars().take(keep).collect();
		}
	}
}
