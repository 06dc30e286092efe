//! Directional types for span lookups.

use crate::Offset;

/// Sequential direction relative to a reference offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeqDirection {
	Next,
	Prev,
}

impl SeqDirection {
	/// Returns true if `offset` lies strictly on this side of `from`.
	#[inline]
	pub fn admits(self, from: Offset, offset: Offset) -> bool {
		match self {
			Self::Next => offset > from,
			Self::Prev => offset < from,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn admits_is_strict() {
		assert!(SeqDirection::Next.admits(5, 6));
		assert!(!SeqDirection::Next.admits(5, 5));
		assert!(SeqDirection::Prev.admits(5, 4));
		assert!(!SeqDirection::Prev.admits(5, 5));
	}
}
