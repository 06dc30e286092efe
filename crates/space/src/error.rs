//! Error types for allocation bookkeeping and configuration.

use std::path::PathBuf;

use glint_primitives::{Identity, Offset};
use thiserror::Error;

/// Errors from checked [`TokenSpace`](crate::TokenSpace) operations.
///
/// `Exhausted` and `IdentityUnavailable` describe expected scarcity. Every
/// other variant is an integration bug that the unchecked wrappers route
/// through the space's integrity hook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpaceError {
	/// A token with no text cannot carry a label.
	#[error("empty token text at offset {offset}")]
	EmptyText { offset: Offset },

	/// A span already starts at this offset.
	#[error("offset {offset} is already consumed")]
	OffsetOccupied { offset: Offset },

	/// Every identity for the character is in use.
	#[error("no free identity for '{character}' (requested at offset {offset})")]
	Exhausted { character: char, offset: Offset },

	/// A specific identity was required but is not free.
	#[error("identity {identity} for '{character}' is not free")]
	IdentityUnavailable { character: char, identity: Identity },

	/// No span starts at this offset.
	#[error("offset {offset} is not consumed")]
	NotConsumed { offset: Offset },

	/// The identity was released without being consumed.
	#[error("identity {identity} for '{character}' released while free")]
	DoubleRelease { character: char, identity: Identity },
}

impl SpaceError {
	/// Returns true for expected capacity conditions rather than bugs.
	pub fn is_scarcity(&self) -> bool {
		matches!(self, Self::Exhausted { .. } | Self::IdentityUnavailable { .. })
	}
}

/// A broken data-model invariant, as reported by
/// [`TokenSpace::check_invariants`](crate::TokenSpace::check_invariants).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
	#[error("pool for '{character}' has {identity} both free and consumed")]
	PoolOverlap { character: char, identity: Identity },

	#[error("pool for '{character}' accounts for {accounted} of {total} identities")]
	PoolLeak { character: char, accounted: usize, total: usize },

	#[error("spans at {first} and {second} overlap")]
	SpanOverlap { first: Offset, second: Offset },

	#[error("span at {offset} holds {identity} which is not consumed for '{character}'")]
	SpanNotConsumed { offset: Offset, character: char, identity: Identity },

	#[error("identity {identity} for '{character}' is held by spans at {first} and {second}")]
	SharedIdentity { character: char, identity: Identity, first: Offset, second: Offset },
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// Error parsing TOML syntax or shape.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// A value parsed but is unusable.
	#[error("invalid configuration: {0}")]
	Invalid(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
