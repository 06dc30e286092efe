//! Runtime configuration for label allocation and update scheduling.

use std::path::Path;
use std::time::Duration;

use glint_primitives::{Color, Identity, Shape};
use glint_worker::CoalescerConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Top-level configuration, usually read from `glint.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlintConfig {
	pub space: SpaceConfig,
	pub scheduler: SchedulerConfig,
}

/// Identity palette and integrity behavior for each [`TokenSpace`](crate::TokenSpace).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpaceConfig {
	/// Enabled colors, in enumeration order.
	pub colors: Vec<Color>,
	/// Enabled shapes, in enumeration order.
	pub shapes: Vec<Shape>,
	/// Seed for the one-time identity shuffle. `None` seeds from entropy.
	pub seed: Option<u64>,
	/// Panic on integrity violations instead of logging and recovering.
	pub strict: bool,
}

impl Default for SpaceConfig {
	fn default() -> Self {
		Self {
			colors: Color::ALL[..5].to_vec(),
			shapes: Shape::ALL[..6].to_vec(),
			seed: None,
			strict: cfg!(debug_assertions),
		}
	}
}

impl SpaceConfig {
	/// Every enabled color/shape pairing, before shuffling.
	pub fn identities(&self) -> Vec<Identity> {
		Identity::permutations(&self.colors, &self.shapes)
	}

	fn validate(&self) -> Result<()> {
		if self.colors.is_empty() || self.shapes.is_empty() {
			return Err(ConfigError::Invalid("at least one color and one shape must be enabled".into()));
		}
		if let Some(color) = first_duplicate(&self.colors) {
			return Err(ConfigError::Invalid(format!("color '{color}' listed twice")));
		}
		if let Some(shape) = first_duplicate(&self.shapes) {
			return Err(ConfigError::Invalid(format!("shape '{shape}' listed twice")));
		}
		Ok(())
	}
}

/// Debounce settings for the update coalescer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
	/// Quiescence window in milliseconds.
	pub quiescence_ms: u64,
	/// Maximum buffered requests.
	pub capacity: usize,
}

impl Default for SchedulerConfig {
	fn default() -> Self {
		let defaults = CoalescerConfig::default();
		Self {
			quiescence_ms: defaults.quiescence.as_millis() as u64,
			capacity: defaults.capacity,
		}
	}
}

impl SchedulerConfig {
	pub fn coalescer(&self) -> CoalescerConfig {
		CoalescerConfig {
			quiescence: Duration::from_millis(self.quiescence_ms),
			capacity: self.capacity,
		}
	}

	fn validate(&self) -> Result<()> {
		if self.quiescence_ms == 0 {
			return Err(ConfigError::Invalid("scheduler.quiescence_ms must be > 0".into()));
		}
		if self.capacity == 0 {
			return Err(ConfigError::Invalid("scheduler.capacity must be > 0".into()));
		}
		Ok(())
	}
}

impl GlintConfig {
	/// Parses and validates a TOML document.
	pub fn from_toml_str(source: &str) -> Result<Self> {
		let config: Self = toml::from_str(source)?;
		config.validate()?;
		Ok(config)
	}

	/// Reads, parses, and validates a TOML file.
	pub fn load(path: &Path) -> Result<Self> {
		let source = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		let config = Self::from_toml_str(&source)?;
		tracing::debug!(path = %path.display(), identities = config.space.identities().len(), "config.loaded");
		Ok(config)
	}

	pub fn validate(&self) -> Result<()> {
		self.space.validate()?;
		self.scheduler.validate()
	}
}

fn first_duplicate<T: PartialEq + Copy>(items: &[T]) -> Option<T> {
	items.iter().enumerate().find(|&(i, item)| items[..i].contains(item)).map(|(_, item)| *item)
}

#[cfg(test)]
mod tests {
	use std::io::Write;

	use super::*;

	#[test]
	fn empty_document_yields_reference_palette() {
		let config = GlintConfig::from_toml_str("").unwrap();
		assert_eq!(config.space.identities().len(), 30);
		assert_eq!(config.scheduler.coalescer(), CoalescerConfig::default());
	}

	#[test]
	fn sections_override_defaults() {
		let config = GlintConfig::from_toml_str(
			r#"
			[space]
			colors = ["blue", "red"]
			shapes = ["fox"]
			seed = 9
			strict = true

			[scheduler]
			quiescence_ms = 40
			"#,
		)
		.unwrap();
		assert_eq!(config.space.identities(), vec![
			Identity::new(Color::Blue, Shape::Fox),
			Identity::new(Color::Red, Shape::Fox),
		]);
		assert_eq!(config.space.seed, Some(9));
		assert!(config.space.strict);
		assert_eq!(config.scheduler.coalescer().quiescence, Duration::from_millis(40));
		assert_eq!(config.scheduler.capacity, 64);
	}

	#[test]
	fn unknown_keys_are_rejected() {
		let err = GlintConfig::from_toml_str("[space]\ncolour = [\"red\"]\n").unwrap_err();
		assert!(matches!(err, ConfigError::Toml(_)), "got {err:?}");
	}

	#[test]
	fn empty_palette_is_invalid() {
		let err = GlintConfig::from_toml_str("[space]\nshapes = []\n").unwrap_err();
		assert!(matches!(err, ConfigError::Invalid(_)), "got {err:?}");
	}

	#[test]
	fn duplicate_color_is_invalid() {
		let err = GlintConfig::from_toml_str("[space]\ncolors = [\"red\", \"blue\", \"red\"]\n").unwrap_err();
		assert_eq!(err.to_string(), "invalid configuration: color 'red' listed twice");
	}

	#[test]
	fn zero_window_is_invalid() {
		let err = GlintConfig::from_toml_str("[scheduler]\nquiescence_ms = 0\n").unwrap_err();
		assert!(matches!(err, ConfigError::Invalid(_)), "got {err:?}");
	}

	#[test]
	fn load_reads_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[scheduler]\ncapacity = 8").unwrap();
		let config = GlintConfig::load(file.path()).unwrap();
		assert_eq!(config.scheduler.capacity, 8);
	}

	#[test]
	fn load_reports_missing_file() {
		let dir = tempfile::tempdir().unwrap();
		let err = GlintConfig::load(&dir.path().join("missing.toml")).unwrap_err();
		assert!(matches!(err, ConfigError::Io { .. }), "got {err:?}");
	}
}
