//! Per-view label lifecycle driven through the update coalescer.
//!
//! Every [`LabelController`] owns the [`TokenSpace`], token source, renderer,
//! and current markers of one editor view behind a single mutex, so a
//! reconcile pass never interleaves with another mutation of the same view.
//! Requests go through a shared [`UpdateCoalescer`] keyed by
//! `(UpdateKind, ViewId)`, which turns a burst of cursor or viewport events
//! into one pass with the latest parameters.

use std::fmt;
use std::mem;
use std::sync::Arc;

use glint_primitives::Offset;
use glint_worker::{ScheduleError, ScheduleOutcome, UpdateCoalescer};
use parking_lot::Mutex;

use crate::collab::{Renderer, TokenSource, Viewport};
use crate::reconcile::{MarkerSet, ReconcileReport, reconcile};
use crate::token_space::TokenSpace;

/// What a scheduled update does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateKind {
	/// Reconcile markers against the tokens currently in view.
	ApplyTokens,
	/// Dispose every marker and free every identity.
	RemoveAll,
	/// `RemoveAll` followed by `ApplyTokens`.
	FullRefresh,
}

/// Identifies one editor view within a shared coalescer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub u64);

impl fmt::Display for ViewId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "view#{}", self.0)
	}
}

/// Coalescer shared by every view of one host.
pub type ViewCoalescer = UpdateCoalescer<UpdateKind, ViewId>;

struct ViewState<S, R: Renderer> {
	space: TokenSpace,
	source: S,
	renderer: R,
	markers: MarkerSet<R::Handle>,
	last_report: Option<ReconcileReport>,
}

impl<S: TokenSource, R: Renderer> ViewState<S, R> {
	fn apply(&mut self, view: ViewId, cursor: Offset, viewport: Viewport) {
		let candidates = self.source.find_candidates(viewport);
		let existing = mem::take(&mut self.markers);
		let result = reconcile(&mut self.space, &mut self.renderer, existing.into_values(), candidates, cursor);
		tracing::debug!(%view, cursor, report = %result.report, "controller.apply");
		self.markers = result.markers;
		self.last_report = Some(result.report);
	}

	fn remove_all(&mut self, view: ViewId) {
		let markers = mem::take(&mut self.markers);
		let disposed = markers.len();
		for marker in markers.into_values() {
			self.renderer.dispose_marker(marker.handle);
		}
		self.space.free_all();
		tracing::debug!(%view, disposed, "controller.remove_all");
	}
}

/// Label state for one editor view.
pub struct LabelController<S, R: Renderer> {
	view: ViewId,
	state: Arc<Mutex<ViewState<S, R>>>,
	coalescer: Arc<ViewCoalescer>,
}

impl<S, R> LabelController<S, R>
where
	S: TokenSource + 'static,
	R: Renderer + 'static,
{
	pub fn new(view: ViewId, space: TokenSpace, source: S, renderer: R, coalescer: Arc<ViewCoalescer>) -> Self {
		Self {
			view,
			state: Arc::new(Mutex::new(ViewState {
				space,
				source,
				renderer,
				markers: MarkerSet::new(),
				last_report: None,
			})),
			coalescer,
		}
	}

	pub fn view(&self) -> ViewId {
		self.view
	}

	/// Schedules a reconcile pass for `viewport` prioritized around `cursor`.
	pub fn request_apply(&self, cursor: Offset, viewport: Viewport) -> Result<ScheduleOutcome, ScheduleError> {
		let state = Arc::clone(&self.state);
		let view = self.view;
		self.coalescer
			.schedule_update(UpdateKind::ApplyTokens, view, move || state.lock().apply(view, cursor, viewport))
	}

	/// Schedules removal of every marker in this view.
	pub fn request_remove_all(&self) -> Result<ScheduleOutcome, ScheduleError> {
		let state = Arc::clone(&self.state);
		let view = self.view;
		self.coalescer
			.schedule_update(UpdateKind::RemoveAll, view, move || state.lock().remove_all(view))
	}

	/// Schedules a rebuild from scratch: remove everything, then apply.
	pub fn request_refresh(&self, cursor: Offset, viewport: Viewport) -> Result<ScheduleOutcome, ScheduleError> {
		let state = Arc::clone(&self.state);
		let view = self.view;
		self.coalescer.schedule_update(UpdateKind::FullRefresh, view, move || {
			let mut state = state.lock();
			state.remove_all(view);
			state.apply(view, cursor, viewport);
		})
	}

	/// Returns true while the shared coalescer has buffered or running work.
	pub fn has_pending_work(&self) -> bool {
		self.coalescer.has_pending_work()
	}

	/// Waits for the shared coalescer to go idle.
	pub async fn flush(&self) {
		self.coalescer.flush().await;
	}

	/// Report of the most recent reconcile pass.
	pub fn last_report(&self) -> Option<ReconcileReport> {
		self.state.lock().last_report
	}

	/// Snapshot of the current markers.
	pub fn markers(&self) -> MarkerSet<R::Handle>
	where
		R::Handle: Clone,
	{
		self.state.lock().markers.clone()
	}

	/// Runs `f` with the view's token space locked.
	pub fn with_space<T>(&self, f: impl FnOnce(&TokenSpace) -> T) -> T {
		f(&self.state.lock().space)
	}

	/// Runs `f` with the view's renderer locked.
	pub fn with_renderer<T>(&self, f: impl FnOnce(&mut R) -> T) -> T {
		f(&mut self.state.lock().renderer)
	}
}
