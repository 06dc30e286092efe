use glint_primitives::{Color, Identity, Shape};

use crate::collab::{Candidates, Marker, Renderer};
use crate::reconcile::reconcile;
use crate::token_space::TokenSpace;

const ORDER: [Identity; 2] = [Identity::new(Color::Blue, Shape::Fox), Identity::new(Color::Red, Shape::Dot)];

fn space() -> TokenSpace {
	TokenSpace::with_order(ORDER.to_vec(), true)
}

struct Null;

impl Renderer for Null {
	type Handle = ();

	fn create_marker(&mut self, _: usize, _: Identity, _: &str) {}

	fn dispose_marker(&mut self, _: ()) {}
}

/// Must never hold two spans whose current ranges intersect.
///
/// * Enforced in: `overlap::correction`, `overlap::apply`, `overlap::restretch`
/// * Failure symptom: two labels claim the same text and voice selection
///   resolves to the wrong token.
#[cfg_attr(test, test)]
pub(crate) fn test_spans_never_overlap() {
	let mut space = space();
	space.consume(0, "Let us remember");
	space.consume(7, "remember how");
	space.consume(16, "how the sky");
	space.consume(3, "us");
	space.free(7);
	space.check_invariants().unwrap();
}

/// Must keep every identity of a character in exactly one of free or consumed.
///
/// * Enforced in: `IdentityPool::{consume,release,reset}`
/// * Failure symptom: an identity is handed out twice, or silently disappears
///   from the palette until the view is rebuilt.
#[cfg_attr(test, test)]
pub(crate) fn test_pool_conservation() {
	let mut space = space();
	space.consume(0, "alpha");
	space.consume(10, "apple");
	assert_eq!(space.consume(20, "avocado"), None);
	space.free(0);
	assert_eq!(space.free_count('a') + space.consumed_count('a'), ORDER.len());
	space.free_all();
	assert_eq!(space.free_count('a'), ORDER.len());
}

/// Must leave unrelated spans untouched when freeing a span.
///
/// * Enforced in: `TokenSpace::try_free`
/// * Failure symptom: freeing one label shortens or moves distant labels.
#[cfg_attr(test, test)]
pub(crate) fn test_free_is_local() {
	let mut space = space();
	space.consume(0, "alpha");
	space.consume(20, "beta");
	let before = space.get(20).cloned();
	space.free(0);
	assert_eq!(space.get(20).cloned(), before);
}

/// Must produce no marker churn when nothing changed since the last pass.
///
/// * Enforced in: `reconcile::plan`
/// * Failure symptom: labels flicker on every cursor-neutral update.
#[cfg_attr(test, test)]
pub(crate) fn test_reconcile_is_idempotent() {
	let mut space = space();
	let candidates: Candidates = [(0, "alpha"), (6, "apple"), (12, "avocado")]
		.into_iter()
		.map(|(offset, text)| (offset, text.to_string()))
		.collect();

	let first = reconcile(&mut space, &mut Null, Vec::<Marker<()>>::new(), candidates.clone(), 0);
	let second = reconcile(&mut space, &mut Null, first.markers.into_values(), candidates, 0);
	assert!(second.report.is_noop(), "{}", second.report);
}

/// Must keep screen markers and space bookkeeping in agreement after a pass.
///
/// * Enforced in: `reconcile::plan`
/// * Failure symptom: a rendered label refers to an identity the pool
///   believes is free, so the next pass hands it to a second token.
#[cfg_attr(test, test)]
pub(crate) fn test_markers_match_bookkeeping() {
	let mut space = space();
	let candidates: Candidates = [(0, "alpha"), (6, "apple"), (12, "avocado")]
		.into_iter()
		.map(|(offset, text)| (offset, text.to_string()))
		.collect();

	let result = reconcile(&mut space, &mut Null, Vec::<Marker<()>>::new(), candidates, 9);
	assert_eq!(result.markers.len(), space.len());
	for marker in result.markers.values() {
		let span = space.get(marker.offset).unwrap();
		assert_eq!(span.identity(), marker.identity);
		assert!(space.is_consumed(marker.character, marker.identity));
	}
}
