//! Core value types for the label engine: offsets, identities, directions,
//! and the distance ordering used wherever priority has to be decided.

pub mod direction;
pub mod distance;
/// Color, shape, and identity value types.
pub mod identity;

pub use direction::SeqDirection;
pub use distance::{DistanceComparator, distance};
pub use identity::{Color, Identity, Shape};

/// A position in the document, measured in characters (not bytes).
///
/// Every offset and text length handled by the engine uses this coordinate
/// space, so `end = start + text.chars().count()`.
pub type Offset = usize;
