//! Seams to the host editor: token discovery and marker rendering.

use std::collections::BTreeMap;

use glint_primitives::{Identity, Offset};

/// Visible document range, `[start, end)` in chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
	pub start: Offset,
	pub end: Offset,
}

impl Viewport {
	pub const fn new(start: Offset, end: Offset) -> Self {
		Self { start, end }
	}

	pub fn contains(&self, offset: Offset) -> bool {
		offset >= self.start && offset < self.end
	}
}

/// Token text keyed by start offset.
pub type Candidates = BTreeMap<Offset, String>;

/// Discovers labelable tokens inside a viewport.
pub trait TokenSource: Send {
	fn find_candidates(&self, viewport: Viewport) -> Candidates;
}

/// Draws and removes markers.
///
/// Calls arrive on whichever task applies a reconcile pass; implementations
/// that must touch a UI thread forward from here.
pub trait Renderer: Send {
	type Handle: Send;

	fn create_marker(&mut self, offset: Offset, identity: Identity, text: &str) -> Self::Handle;

	fn dispose_marker(&mut self, handle: Self::Handle);
}

/// A rendered label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker<H> {
	pub offset: Offset,
	pub identity: Identity,
	/// Pool key the identity was consumed under.
	pub character: char,
	pub handle: H,
}
