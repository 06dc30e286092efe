use std::collections::BTreeMap;

use glint_primitives::{Identity, Offset};
use glint_space::Renderer;

/// In-memory stand-in for an editor's overlay layer.
#[derive(Debug, Default)]
pub struct Screen {
	labels: BTreeMap<Offset, (Identity, String)>,
}

impl Screen {
	/// Live labels, ordered by offset.
	pub fn labels(&self) -> impl Iterator<Item = (Offset, Identity, &str)> + '_ {
		self.labels.iter().map(|(&offset, (identity, text))| (offset, *identity, text.as_str()))
	}
}

impl Renderer for Screen {
	type Handle = Offset;

	fn create_marker(&mut self, offset: Offset, identity: Identity, text: &str) -> Offset {
		tracing::trace!(offset, %identity, text, "screen.create");
		self.labels.insert(offset, (identity, text.to_string()));
		offset
	}

	fn dispose_marker(&mut self, offset: Offset) {
		if self.labels.remove(&offset).is_none() {
			tracing::warn!(offset, "screen.dispose_unknown");
		}
	}
}
