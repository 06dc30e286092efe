use std::fmt;

use serde::{Deserialize, Serialize};

/// Marker color. Declaration order is the canonical enumeration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
	Default,
	Blue,
	Green,
	Red,
	Yellow,
	Pink,
}

impl Color {
	/// Every color, in enumeration order.
	pub const ALL: [Color; 6] = [Color::Default, Color::Blue, Color::Green, Color::Red, Color::Yellow, Color::Pink];

	/// Spoken name of the color.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Default => "default",
			Self::Blue => "blue",
			Self::Green => "green",
			Self::Red => "red",
			Self::Yellow => "yellow",
			Self::Pink => "pink",
		}
	}
}

/// Marker shape. Declaration order is the canonical enumeration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
	Dot,
	Ex,
	Fox,
	Wing,
	Frame,
	Curve,
	Eye,
	Play,
	Bolt,
	Crosshairs,
}

impl Shape {
	/// Every shape, in enumeration order.
	pub const ALL: [Shape; 10] = [
		Shape::Dot,
		Shape::Ex,
		Shape::Fox,
		Shape::Wing,
		Shape::Frame,
		Shape::Curve,
		Shape::Eye,
		Shape::Play,
		Shape::Bolt,
		Shape::Crosshairs,
	];

	/// Spoken name of the shape.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Dot => "dot",
			Self::Ex => "ex",
			Self::Fox => "fox",
			Self::Wing => "wing",
			Self::Frame => "frame",
			Self::Curve => "curve",
			Self::Eye => "eye",
			Self::Play => "play",
			Self::Bolt => "bolt",
			Self::Crosshairs => "crosshairs",
		}
	}
}

impl fmt::Display for Color {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl fmt::Display for Shape {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A visually distinguishable label: one color paired with one shape.
///
/// Identities are plain values; two identities are equal exactly when both
/// their color and shape match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identity {
	pub color: Color,
	pub shape: Shape,
}

impl Identity {
	pub const fn new(color: Color, shape: Shape) -> Self {
		Self { color, shape }
	}

	/// Returns every color/shape pairing, colors outermost.
	pub fn permutations(colors: &[Color], shapes: &[Shape]) -> Vec<Identity> {
		colors
			.iter()
			.flat_map(|&color| shapes.iter().map(move |&shape| Identity::new(color, shape)))
			.collect()
	}
}

impl fmt::Display for Identity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {}", self.color, self.shape)
	}
}
