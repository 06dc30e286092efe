//! Interval correction between consumed spans.
//!
//! Spans are keyed by start offset and must never overlap. When a new span is
//! consumed over existing ones the losing side shrinks:
//!
//! 1. **Trailing edge**: if an existing span starts strictly inside the new
//!    range, the new span is cut to end where the nearest such span starts.
//!    The older span keeps its text.
//!
//! 2. **Leading edge**: if the new span starts strictly inside an existing
//!    span, the existing span is cut to end at the new start.
//!
//! Both rules are evaluated against the spans as they were before the new
//! span arrived and applied together, so their outcome does not depend on
//! iteration order.
//!
//! Freeing reverses rule 2 for the immediate neighbor only: a span whose end
//! touches the freed span's start grows back toward its original text, but
//! not past the freed span's current end.

use std::collections::BTreeMap;

use glint_primitives::Offset;

use crate::span::ConsumedSpan;

/// Corrections computed for one incoming span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Correction {
	/// Where the incoming span must end.
	pub(super) end: Offset,
	/// Existing spans to cut at the incoming start.
	pub(super) truncate: Vec<Offset>,
}

/// Computes the corrections for a span consumed at `[start, end)`.
pub(super) fn correction(spans: &BTreeMap<Offset, ConsumedSpan>, start: Offset, end: Offset) -> Correction {
	let mut corrected_end = end;
	let mut truncate = Vec::new();

	for span in spans.values() {
		if span.start() > start && span.start() < end {
			corrected_end = corrected_end.min(span.start());
		}
		if span.start() < start && start < span.end() {
			truncate.push(span.start());
		}
	}

	Correction {
		end: corrected_end,
		truncate,
	}
}

/// Applies the leading-edge cuts of a [`Correction`] for a span starting at `start`.
pub(super) fn apply(spans: &mut BTreeMap<Offset, ConsumedSpan>, correction: &Correction, start: Offset) {
	for offset in &correction.truncate {
		if let Some(span) = spans.get_mut(offset) {
			tracing::trace!(offset, cut_at = start, "space.truncate");
			span.truncate_at(start);
		}
	}
}

/// Grows spans that were cut by `freed` back toward their original text.
pub(super) fn restretch(spans: &mut BTreeMap<Offset, ConsumedSpan>, freed: &ConsumedSpan) {
	for span in spans.values_mut().filter(|span| span.end() == freed.start()) {
		let before = span.len();
		span.restretch_to(freed.end());
		if span.len() != before {
			tracing::trace!(offset = span.start(), from = before, to = span.len(), "space.restretch");
		}
	}
}

#[cfg(test)]
mod tests {
	use glint_primitives::{Color, Identity, Shape};

	use super::*;
	use crate::span::character_of;

	fn spans(entries: &[(Offset, &str)]) -> BTreeMap<Offset, ConsumedSpan> {
		let identity = Identity::new(Color::Default, Shape::Dot);
		entries
			.iter()
			.map(|&(start, text)| {
				let span = ConsumedSpan::new(identity, start, character_of(text).unwrap(), text, text.chars().count());
				(start, span)
			})
			.collect()
	}

	#[test]
	fn disjoint_span_needs_no_correction() {
		let existing = spans(&[(0, "abc"), (10, "xyz")]);
		let c = correction(&existing, 4, 8);
		assert_eq!(c, Correction { end: 8, truncate: vec![] });
	}

	#[test]
	fn new_span_yields_trailing_edge() {
		let existing = spans(&[(16, "how the sky")]);
		let c = correction(&existing, 7, 19);
		assert_eq!(c, Correction { end: 16, truncate: vec![] });
	}

	#[test]
	fn new_span_covering_an_older_one_stops_at_its_start() {
		let existing = spans(&[(4, "ab"), (8, "cd")]);
		let c = correction(&existing, 2, 20);
		assert_eq!(c.end, 4);
	}

	#[test]
	fn older_span_yields_leading_edge() {
		let existing = spans(&[(0, "Let us remember")]);
		let c = correction(&existing, 7, 19);
		assert_eq!(c, Correction { end: 19, truncate: vec![0] });
	}

	#[test]
	fn both_edges_apply_in_one_pass() {
		let existing = spans(&[(0, "abcdef"), (8, "ghij")]);
		let c = correction(&existing, 3, 10);
		assert_eq!(c, Correction { end: 8, truncate: vec![0] });
	}

	#[test]
	fn touching_spans_do_not_conflict() {
		let existing = spans(&[(0, "abc"), (6, "def")]);
		let c = correction(&existing, 3, 6);
		assert_eq!(c, Correction { end: 6, truncate: vec![] });
	}
}
