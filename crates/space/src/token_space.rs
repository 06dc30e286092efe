//! Per-view allocation state: identity pools plus the overlap ledger.
//!
//! See [`overlap`] for the interval-correction rules applied on consume and
//! free.

use std::collections::BTreeMap;
use std::sync::Arc;

use glint_primitives::{Color, DistanceComparator, Identity, Offset, SeqDirection};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rustc_hash::FxHashMap;

use crate::config::SpaceConfig;
use crate::error::{InvariantViolation, SpaceError};
use crate::pool::IdentityPool;
use crate::span::{ConsumedSpan, character_of};

mod overlap;

/// Identity pools and consumed spans for one editor view.
///
/// All mutation goes through `&mut self`; callers that share a space across
/// threads wrap it in a mutex so multi-step operations stay atomic.
#[derive(Debug, Clone)]
pub struct TokenSpace {
	order: Arc<[Identity]>,
	pools: FxHashMap<char, IdentityPool>,
	spans: BTreeMap<Offset, ConsumedSpan>,
	/// Last identity consumed at each offset, used as an allocation preference.
	preferences: FxHashMap<Offset, Identity>,
	strict: bool,
}

impl TokenSpace {
	/// Creates an empty space, fixing the identity order for every pool.
	pub fn new(config: &SpaceConfig) -> Self {
		let mut identities = config.identities();
		let mut rng = match config.seed {
			Some(seed) => SmallRng::seed_from_u64(seed),
			None => SmallRng::from_entropy(),
		};
		identities.shuffle(&mut rng);
		tracing::debug!(identities = identities.len(), seed = ?config.seed, "space.new");
		Self::with_order(identities, config.strict)
	}

	/// Creates an empty space whose pools hand out identities in exactly `order`.
	pub fn with_order(order: Vec<Identity>, strict: bool) -> Self {
		Self {
			order: Arc::from(order),
			pools: FxHashMap::default(),
			spans: BTreeMap::new(),
			preferences: FxHashMap::default(),
			strict,
		}
	}

	/// Consumes an identity for the token `text` starting at `offset`.
	///
	/// Returns `None` when the character's pool is exhausted. Integration
	/// errors (empty text, occupied offset) are reported through the
	/// integrity hook and also yield `None`.
	pub fn consume(&mut self, offset: Offset, text: &str) -> Option<Identity> {
		self.consume_with(offset, text, None)
	}

	/// Like [`Self::consume`], optionally insisting on one identity.
	pub fn consume_with(&mut self, offset: Offset, text: &str, required: Option<Identity>) -> Option<Identity> {
		match self.try_consume_with(offset, text, required) {
			Ok(identity) => Some(identity),
			Err(err) if err.is_scarcity() => None,
			Err(err) => {
				self.violation(&err);
				None
			}
		}
	}

	/// Checked form of [`Self::consume`].
	pub fn try_consume(&mut self, offset: Offset, text: &str) -> Result<Identity, SpaceError> {
		self.try_consume_with(offset, text, None)
	}

	/// Checked form of [`Self::consume_with`].
	pub fn try_consume_with(&mut self, offset: Offset, text: &str, required: Option<Identity>) -> Result<Identity, SpaceError> {
		let character = character_of(text).ok_or(SpaceError::EmptyText { offset })?;
		if self.spans.contains_key(&offset) {
			return Err(SpaceError::OffsetOccupied { offset });
		}

		let preferred = self.preferences.get(&offset).copied();
		let pool = self.pool_mut(character);
		let Some(identity) = pool.consume(required, preferred) else {
			return Err(match required {
				Some(identity) => SpaceError::IdentityUnavailable { character, identity },
				None => SpaceError::Exhausted { character, offset },
			});
		};

		let len = text.chars().count();
		let correction = overlap::correction(&self.spans, offset, offset + len);
		overlap::apply(&mut self.spans, &correction, offset);
		let span = ConsumedSpan::new(identity, offset, character, text, correction.end - offset);
		tracing::trace!(offset, %identity, %character, len = span.len(), "space.consume");

		self.spans.insert(offset, span);
		self.preferences.insert(offset, identity);
		Ok(identity)
	}

	/// Frees the span at `offset`, returning its identity to the pool.
	///
	/// Freeing an offset that holds no span is reported through the
	/// integrity hook and otherwise ignored.
	pub fn free(&mut self, offset: Offset) -> Option<ConsumedSpan> {
		match self.try_free(offset) {
			Ok(span) => Some(span),
			Err(err) => {
				self.violation(&err);
				None
			}
		}
	}

	/// Checked form of [`Self::free`].
	pub fn try_free(&mut self, offset: Offset) -> Result<ConsumedSpan, SpaceError> {
		let span = self.spans.remove(&offset).ok_or(SpaceError::NotConsumed { offset })?;
		self.try_release(span.character(), span.identity())?;
		overlap::restretch(&mut self.spans, &span);
		tracing::trace!(offset, identity = %span.identity(), "space.free");
		Ok(span)
	}

	/// Returns `identity` to the pool for `character`.
	pub fn try_release(&mut self, character: char, identity: Identity) -> Result<(), SpaceError> {
		if self.pool_mut(character).release(identity) {
			Ok(())
		} else {
			Err(SpaceError::DoubleRelease { character, identity })
		}
	}

	/// Drops every span and frees every identity.
	///
	/// Offset preferences survive so a full refresh lands on the same
	/// identities where it can.
	pub fn free_all(&mut self) {
		let spans = self.spans.len();
		self.spans.clear();
		for pool in self.pools.values_mut() {
			pool.reset();
		}
		tracing::debug!(spans, "space.free_all");
	}

	/// Closest span after (or before) `from` whose identity has `color`.
	pub fn find_by_color(&self, color: Color, direction: SeqDirection, from: Offset) -> Option<&ConsumedSpan> {
		let candidates = self
			.spans
			.values()
			.filter(|span| span.identity().color == color && direction.admits(from, span.start()));
		DistanceComparator::new(from).closest(candidates, |span| span.start())
	}

	/// The span labelled `identity` for `character`, if any.
	pub fn find_identity(&self, identity: Identity, character: char) -> Option<&ConsumedSpan> {
		self.spans
			.values()
			.find(|span| span.identity() == identity && span.character() == character)
	}

	/// The span whose current range contains `offset`.
	pub fn find_containing(&self, offset: Offset) -> Option<&ConsumedSpan> {
		self.spans.range(..=offset).next_back().map(|(_, span)| span).filter(|span| span.contains(offset))
	}

	pub fn get(&self, offset: Offset) -> Option<&ConsumedSpan> {
		self.spans.get(&offset)
	}

	/// Every consumed span, ordered by start offset.
	pub fn all_consumed(&self) -> impl Iterator<Item = &ConsumedSpan> + '_ {
		self.spans.values()
	}

	pub fn len(&self) -> usize {
		self.spans.len()
	}

	pub fn is_empty(&self) -> bool {
		self.spans.is_empty()
	}

	/// Returns true if `identity` is marked consumed for `character`.
	pub fn is_consumed(&self, character: char, identity: Identity) -> bool {
		self.pools.get(&character).is_some_and(|pool| pool.is_consumed(identity))
	}

	/// Free identities for `character`; untouched characters have all of them.
	pub fn free_count(&self, character: char) -> usize {
		self.pools.get(&character).map_or(self.order.len(), IdentityPool::free_len)
	}

	pub fn consumed_count(&self, character: char) -> usize {
		self.pools.get(&character).map_or(0, IdentityPool::consumed_len)
	}

	/// Size of the identity set each pool draws from.
	pub fn total_identities(&self) -> usize {
		self.order.len()
	}

	/// The fixed order pools hand out identities in.
	pub fn identity_order(&self) -> &[Identity] {
		&self.order
	}

	/// Last identity consumed at `offset`.
	pub fn preference(&self, offset: Offset) -> Option<Identity> {
		self.preferences.get(&offset).copied()
	}

	/// Replaces the preference map with the identities currently held.
	pub fn rebuild_preferences(&mut self) {
		self.preferences = self.spans.iter().map(|(&offset, span)| (offset, span.identity())).collect();
	}

	pub fn is_strict(&self) -> bool {
		self.strict
	}

	/// Verifies the data-model invariants, returning the first violation.
	pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
		for (&character, pool) in &self.pools {
			if let Some(identity) = pool.overlap() {
				return Err(InvariantViolation::PoolOverlap { character, identity });
			}
			let accounted = pool.free_len() + pool.consumed_len();
			if accounted != pool.total() {
				return Err(InvariantViolation::PoolLeak {
					character,
					accounted,
					total: pool.total(),
				});
			}
		}

		let mut holders: FxHashMap<(char, Identity), Offset> = FxHashMap::default();
		let mut previous: Option<&ConsumedSpan> = None;
		for span in self.spans.values() {
			if let Some(prev) = previous
				&& prev.overlaps(span)
			{
				return Err(InvariantViolation::SpanOverlap {
					first: prev.start(),
					second: span.start(),
				});
			}
			if !self.is_consumed(span.character(), span.identity()) {
				return Err(InvariantViolation::SpanNotConsumed {
					offset: span.start(),
					character: span.character(),
					identity: span.identity(),
				});
			}
			if let Some(first) = holders.insert((span.character(), span.identity()), span.start()) {
				return Err(InvariantViolation::SharedIdentity {
					character: span.character(),
					identity: span.identity(),
					first,
					second: span.start(),
				});
			}
			previous = Some(span);
		}
		Ok(())
	}

	/// Integrity hook for integration bugs: logs, then panics in strict mode.
	pub(crate) fn violation(&self, err: &SpaceError) {
		tracing::error!(error = %err, "space.integrity_violation");
		if self.strict {
			panic!("token space integrity violation: {err}");
		}
	}

	fn pool_mut(&mut self, character: char) -> &mut IdentityPool {
		let order = &self.order;
		self.pools.entry(character).or_insert_with(|| IdentityPool::new(Arc::clone(order)))
	}
}
