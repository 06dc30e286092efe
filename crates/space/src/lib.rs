//! Identity allocation for per-view token labels.
//!
//! A [`TokenSpace`] hands out color/shape identities per character and keeps
//! the consumed token spans from overlapping. [`reconcile`] diffs freshly
//! discovered tokens against the markers already on screen, and
//! [`LabelController`] funnels update requests for one view through an
//! [`UpdateCoalescer`](glint_worker::UpdateCoalescer).

pub mod collab;
pub mod config;
pub mod controller;
pub mod error;
#[cfg(test)]
mod invariants;
pub mod pool;
pub mod reconcile;
pub mod span;
pub mod token_space;

pub use collab::{Candidates, Marker, Renderer, TokenSource, Viewport};
pub use config::{GlintConfig, SchedulerConfig, SpaceConfig};
pub use controller::{LabelController, UpdateKind, ViewCoalescer, ViewId};
pub use error::{ConfigError, InvariantViolation, SpaceError};
pub use pool::IdentityPool;
pub use reconcile::{Allocation, MarkerSet, ReconcilePlan, ReconcileReport, Reconciled, plan, reconcile};
pub use span::{ConsumedSpan, character_of};
pub use token_space::TokenSpace;
