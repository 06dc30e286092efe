//! Distance-to-reference ordering.
//!
//! Every place that has to decide priority between offsets (allocation order,
//! steal victims, directional lookups) goes through [`DistanceComparator`] so
//! ties are always broken the same way: equal distances order by ascending
//! offset.

use std::cmp::Ordering;

use crate::Offset;

/// Absolute distance between two offsets.
#[inline]
pub fn distance(a: Offset, b: Offset) -> usize {
	a.abs_diff(b)
}

/// Orders offsets by absolute distance from a fixed reference offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistanceComparator {
	reference: Offset,
}

impl DistanceComparator {
	pub const fn new(reference: Offset) -> Self {
		Self { reference }
	}

	pub const fn reference(&self) -> Offset {
		self.reference
	}

	/// Distance of `offset` from the reference.
	#[inline]
	pub fn distance(&self, offset: Offset) -> usize {
		distance(self.reference, offset)
	}

	/// Closest first; equal distances fall back to offset order.
	pub fn compare(&self, a: Offset, b: Offset) -> Ordering {
		self.distance(a).cmp(&self.distance(b)).then(a.cmp(&b))
	}

	/// Returns true if `a` is strictly farther from the reference than `b`.
	#[inline]
	pub fn is_farther(&self, a: Offset, b: Offset) -> bool {
		self.distance(a) > self.distance(b)
	}

	/// Sorts items closest-first by the offset `key` extracts.
	pub fn sort_by_key<T>(&self, items: &mut [T], key: impl Fn(&T) -> Offset) {
		items.sort_by(|lhs, rhs| self.compare(key(lhs), key(rhs)));
	}

	/// Returns the item closest to the reference.
	pub fn closest<T>(&self, items: impl IntoIterator<Item = T>, key: impl Fn(&T) -> Offset) -> Option<T> {
		items.into_iter().min_by(|lhs, rhs| self.compare(key(lhs), key(rhs)))
	}

	/// Returns the item farthest from the reference.
	///
	/// Among equally distant items the one with the greatest offset wins.
	pub fn farthest<T>(&self, items: impl IntoIterator<Item = T>, key: impl Fn(&T) -> Offset) -> Option<T> {
		items.into_iter().max_by(|lhs, rhs| self.compare(key(lhs), key(rhs)))
	}
}
