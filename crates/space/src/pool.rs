//! Per-character identity pools.

use std::sync::Arc;

use glint_primitives::Identity;
use rustc_hash::FxHashSet;

/// Free and consumed identities for a single character.
///
/// Every pool in a [`TokenSpace`](crate::TokenSpace) shares one ordering of
/// the identity set, fixed when the space was created. Allocation without a
/// preference always takes the first free identity in that order, so a pool
/// is deterministic once the ordering is.
#[derive(Debug, Clone)]
pub struct IdentityPool {
	order: Arc<[Identity]>,
	free: FxHashSet<Identity>,
	consumed: FxHashSet<Identity>,
}

impl IdentityPool {
	/// Creates a pool with every identity in `order` free.
	pub fn new(order: Arc<[Identity]>) -> Self {
		let free = order.iter().copied().collect();
		Self {
			order,
			free,
			consumed: FxHashSet::default(),
		}
	}

	/// Takes an identity out of the free set.
	///
	/// - `required`: only that identity is acceptable; `None` if it is not free.
	/// - otherwise `preferred` is taken when free, for visual stability.
	/// - otherwise the first free identity in the pool's ordering.
	///
	/// Returns `None` when nothing acceptable is free.
	pub fn consume(&mut self, required: Option<Identity>, preferred: Option<Identity>) -> Option<Identity> {
		let identity = match required {
			Some(required) => self.free.contains(&required).then_some(required)?,
			None => preferred
				.filter(|preferred| self.free.contains(preferred))
				.or_else(|| self.order.iter().copied().find(|identity| self.free.contains(identity)))?,
		};
		self.free.remove(&identity);
		self.consumed.insert(identity);
		Some(identity)
	}

	/// Returns a consumed identity to the free set.
	///
	/// Returns false, changing nothing, if `identity` was not consumed.
	#[must_use]
	pub fn release(&mut self, identity: Identity) -> bool {
		if !self.consumed.remove(&identity) {
			return false;
		}
		self.free.insert(identity);
		true
	}

	/// Marks every identity free again.
	pub fn reset(&mut self) {
		self.free.extend(self.consumed.drain());
	}

	pub fn is_free(&self, identity: Identity) -> bool {
		self.free.contains(&identity)
	}

	pub fn is_consumed(&self, identity: Identity) -> bool {
		self.consumed.contains(&identity)
	}

	pub fn free_len(&self) -> usize {
		self.free.len()
	}

	pub fn consumed_len(&self) -> usize {
		self.consumed.len()
	}

	/// Size of the identity set.
	pub fn total(&self) -> usize {
		self.order.len()
	}

	pub fn is_exhausted(&self) -> bool {
		self.free.is_empty()
	}

	/// Consumed identities, in the pool's ordering.
	pub fn consumed(&self) -> impl Iterator<Item = Identity> + '_ {
		self.order.iter().copied().filter(|identity| self.consumed.contains(identity))
	}

	/// Returns an identity present in both sets, if any.
	pub(crate) fn overlap(&self) -> Option<Identity> {
		self.free.intersection(&self.consumed).next().copied()
	}
}
