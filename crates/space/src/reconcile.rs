//! Minimal-churn reconciliation of rendered markers against fresh tokens.
//!
//! A pass runs in two steps. [`plan`] does all allocation math against the
//! [`TokenSpace`] and decides which markers to keep, dispose, and create; it
//! never touches the renderer. [`ReconcilePlan::apply`] then performs the
//! renderer side effects in one go. [`reconcile`] composes both.
//!
//! Allocation is closest-first around the cursor. When a character's pool is
//! exhausted, the farthest kept marker of that character is stolen if it is
//! strictly farther from the cursor than the candidate, so identities migrate
//! toward the cursor as it moves.

use std::collections::BTreeMap;
use std::fmt;

use glint_primitives::{DistanceComparator, Identity, Offset};

use crate::collab::{Candidates, Marker, Renderer};
use crate::error::SpaceError;
use crate::span::character_of;
use crate::token_space::TokenSpace;

/// Rendered markers keyed by offset.
pub type MarkerSet<H> = BTreeMap<Offset, Marker<H>>;

/// An identity granted to a candidate that has no marker yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
	pub offset: Offset,
	pub identity: Identity,
	pub character: char,
	pub text: String,
}

/// Counts describing one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
	/// Existing markers that survived unchanged.
	pub kept: usize,
	/// Markers created for new allocations.
	pub created: usize,
	/// Markers disposed: vanished, stale, duplicate, or stolen.
	pub disposed: usize,
	/// Markers disposed to hand their identity to a closer candidate.
	pub stolen: usize,
	/// Candidates left without an identity.
	pub unassigned: usize,
}

impl ReconcileReport {
	/// Returns true if the pass changed nothing on screen.
	pub fn is_noop(&self) -> bool {
		self.created == 0 && self.disposed == 0
	}
}

impl fmt::Display for ReconcileReport {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"kept {}, created {}, disposed {}, stolen {}, unassigned {}",
			self.kept, self.created, self.disposed, self.stolen, self.unassigned
		)
	}
}

/// Renderer-free outcome of [`plan`].
#[derive(Debug)]
pub struct ReconcilePlan<H> {
	keep: Vec<Marker<H>>,
	dispose: Vec<H>,
	create: Vec<Allocation>,
	report: ReconcileReport,
}

/// The marker set after a pass, with its report.
#[derive(Debug)]
pub struct Reconciled<H> {
	pub markers: MarkerSet<H>,
	pub report: ReconcileReport,
}

impl<H> ReconcilePlan<H> {
	pub fn report(&self) -> ReconcileReport {
		self.report
	}

	/// Allocations that still need a marker, closest to the cursor first.
	pub fn creations(&self) -> &[Allocation] {
		&self.create
	}

	/// Markers carried over from the previous pass.
	pub fn kept(&self) -> &[Marker<H>] {
		&self.keep
	}

	/// Disposes dropped markers, then creates the new ones.
	pub fn apply<R>(self, renderer: &mut R) -> Reconciled<H>
	where
		R: Renderer<Handle = H>,
	{
		let Self {
			keep,
			dispose,
			create,
			report,
		} = self;

		for handle in dispose {
			renderer.dispose_marker(handle);
		}

		let mut markers: MarkerSet<H> = keep.into_iter().map(|marker| (marker.offset, marker)).collect();
		for allocation in create {
			let handle = renderer.create_marker(allocation.offset, allocation.identity, &allocation.text);
			markers.insert(
				allocation.offset,
				Marker {
					offset: allocation.offset,
					identity: allocation.identity,
					character: allocation.character,
					handle,
				},
			);
		}

		Reconciled { markers, report }
	}
}

/// Plans one pass and applies it to `renderer`.
pub fn reconcile<R>(
	space: &mut TokenSpace,
	renderer: &mut R,
	existing: impl IntoIterator<Item = Marker<R::Handle>>,
	candidates: Candidates,
	cursor: Offset,
) -> Reconciled<R::Handle>
where
	R: Renderer,
{
	plan(space, existing, candidates, cursor).apply(renderer)
}

/// Computes the marker changes for `candidates` and updates `space` to match.
///
/// `existing` may hold more than one marker per offset; extras are disposed
/// and logged, since they mean an earlier pass was applied twice.
pub fn plan<H>(
	space: &mut TokenSpace,
	existing: impl IntoIterator<Item = Marker<H>>,
	mut candidates: Candidates,
	cursor: Offset,
) -> ReconcilePlan<H> {
	let mut report = ReconcileReport::default();
	let mut dispose = Vec::new();

	let mut grouped: BTreeMap<Offset, Vec<Marker<H>>> = BTreeMap::new();
	for marker in existing {
		grouped.entry(marker.offset).or_default().push(marker);
	}

	// Cleanup: drop markers whose token vanished or whose identity went stale.
	let mut survivors: Vec<(Marker<H>, String)> = Vec::new();
	for (offset, markers) in grouped {
		let Some(text) = candidates.get(&offset) else {
			report.disposed += markers.len();
			dispose.extend(markers.into_iter().map(|marker| marker.handle));
			continue;
		};
		let character = character_of(text);

		let mut valid = Vec::with_capacity(1);
		for marker in markers {
			if Some(marker.character) == character && space.is_consumed(marker.character, marker.identity) {
				valid.push(marker);
			} else {
				tracing::debug!(offset, identity = %marker.identity, "reconcile.stale_marker");
				report.disposed += 1;
				dispose.push(marker.handle);
			}
		}

		let mut valid = valid.into_iter();
		let Some(survivor) = valid.next() else {
			continue;
		};
		let extras: Vec<_> = valid.map(|marker| marker.handle).collect();
		if !extras.is_empty() {
			tracing::warn!(offset, extra = extras.len(), "reconcile.duplicate_markers");
			report.disposed += extras.len();
			dispose.extend(extras);
		}

		if let Some(text) = candidates.remove(&offset) {
			survivors.push((survivor, text));
		}
	}

	// Rebuild bookkeeping from the survivors so the space matches the screen.
	space.free_all();
	let mut keep: Vec<Marker<H>> = Vec::with_capacity(survivors.len());
	for (marker, text) in survivors {
		match space.try_consume_with(marker.offset, &text, Some(marker.identity)) {
			Ok(_) => keep.push(marker),
			Err(err) => {
				tracing::warn!(offset = marker.offset, error = %err, "reconcile.reconsume_failed");
				report.disposed += 1;
				dispose.push(marker.handle);
				candidates.insert(marker.offset, text);
			}
		}
	}
	report.kept = keep.len();

	// Allocate closest-first, stealing from the farthest kept marker on exhaustion.
	let comparator = DistanceComparator::new(cursor);
	let mut pending: Vec<(Offset, String)> = candidates.into_iter().collect();
	comparator.sort_by_key(&mut pending, |(offset, _)| *offset);

	let mut create = Vec::new();
	for (offset, text) in pending {
		let Some(character) = character_of(&text) else {
			tracing::warn!(offset, "reconcile.empty_candidate");
			report.unassigned += 1;
			continue;
		};

		let identity = match space.try_consume(offset, &text) {
			Ok(identity) => identity,
			Err(SpaceError::Exhausted { .. }) => {
				match steal(space, &comparator, &mut keep, character, offset) {
					Some(victim) => {
						report.stolen += 1;
						report.disposed += 1;
						report.unassigned += 1;
						report.kept -= 1;
						dispose.push(victim.handle);
					}
					None => {
						report.unassigned += 1;
						continue;
					}
				}
				match space.try_consume(offset, &text) {
					Ok(identity) => identity,
					Err(err) => {
						space.violation(&err);
						report.unassigned += 1;
						continue;
					}
				}
			}
			Err(err) => {
				tracing::warn!(offset, error = %err, "reconcile.candidate_skipped");
				report.unassigned += 1;
				continue;
			}
		};

		create.push(Allocation {
			offset,
			identity,
			character,
			text,
		});
	}
	report.created = create.len();

	space.rebuild_preferences();
	tracing::debug!(
		cursor,
		kept = report.kept,
		created = report.created,
		disposed = report.disposed,
		stolen = report.stolen,
		unassigned = report.unassigned,
		"reconcile.plan"
	);

	ReconcilePlan {
		keep,
		dispose,
		create,
		report,
	}
}

/// Frees the farthest kept marker for `character` if it is farther from the
/// cursor than `offset`, returning it for disposal.
fn steal<H>(
	space: &mut TokenSpace,
	comparator: &DistanceComparator,
	keep: &mut Vec<Marker<H>>,
	character: char,
	offset: Offset,
) -> Option<Marker<H>> {
	let (index, victim_offset) = comparator.farthest(
		keep.iter()
			.enumerate()
			.filter(|(_, marker)| marker.character == character)
			.map(|(index, marker)| (index, marker.offset)),
		|&(_, at)| at,
	)?;
	if !comparator.is_farther(victim_offset, offset) {
		return None;
	}

	let victim = keep.swap_remove(index);
	if let Err(err) = space.try_free(victim.offset) {
		space.violation(&err);
	}
	tracing::debug!(from = victim.offset, to = offset, identity = %victim.identity, "reconcile.steal");
	Some(victim)
}
