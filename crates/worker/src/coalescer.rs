//! Debounced update scheduling with per-group coalescing.
//!
//! Producers call [`UpdateCoalescer::schedule_update`] with a `(kind, context)`
//! group and a unit of work. A single consumer task waits until no request has
//! arrived for the configured quiescence window, drains the buffer, and runs
//! the batch in arrival order.
//!
//! # Coalescing Rules
//!
//! 1. **Consecutive runs collapse**: a request for the same group as the
//!    buffer's tail replaces it, so a burst `A A A` executes only the last `A`.
//!
//! 2. **Interleaving is preserved**: `A B A` executes all three, in order. Only
//!    runs are collapsed, never the whole buffer into one global "last".
//!
//! 3. **Bounded buffer**: once `capacity` requests are buffered, a new request
//!    evicts the oldest buffered request of its own group, or the oldest
//!    request overall when its group has nothing buffered.
//!
//! 4. **Superseded requests never start**: if a newer request for a group
//!    arrives after the batch was drained but before the group's request ran,
//!    the drained request is skipped and the newer one runs in the next window.
//!    Work that has started always runs to completion.
//!
//! Each execution runs as its own task so a panicking unit of work is logged
//! and the remaining groups still run.

use std::collections::VecDeque;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::{TaskClass, join_error_panic_message, spawn};

/// Bounds for request kinds and contexts.
pub trait GroupKey: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static {}

impl<T> GroupKey for T where T: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static {}

/// A unit of scheduled work.
pub type Work = Box<dyn FnOnce() + Send + 'static>;

/// Coalescer tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoalescerConfig {
	/// Silence required after the last request before a batch runs.
	pub quiescence: Duration,
	/// Maximum number of buffered requests.
	pub capacity: usize,
}

impl Default for CoalescerConfig {
	fn default() -> Self {
		Self {
			quiescence: Duration::from_millis(125),
			capacity: 64,
		}
	}
}

/// Outcome from scheduling one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
	/// Request was buffered without replacing anything.
	Enqueued,
	/// Request replaced the buffered tail of the same group.
	Coalesced,
	/// Buffer was full; an older request was dropped to make room.
	EvictedOldest,
}

/// Scheduling error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
	#[error("update coalescer is shut down")]
	Closed,
}

struct Request<K, C> {
	kind: K,
	context: C,
	seq: u64,
	work: Work,
}

impl<K: PartialEq, C: PartialEq> Request<K, C> {
	fn is_same_group(&self, other: &Self) -> bool {
		self.kind == other.kind && self.context == other.context
	}
}

struct QueueState<K, C> {
	buffer: VecDeque<Request<K, C>>,
	/// Sequence number of the newest request seen per group.
	latest: FxHashMap<(K, C), u64>,
	next_seq: u64,
	closed: bool,
}

struct Shared<K, C> {
	config: CoalescerConfig,
	state: Mutex<QueueState<K, C>>,
	/// Requests buffered, drained, or executing.
	pending: AtomicUsize,
	enqueued: Notify,
	idle: Notify,
}

/// Debounced scheduler that runs at most one request per consecutive
/// `(kind, context)` run per quiescence window.
pub struct UpdateCoalescer<K: GroupKey, C: GroupKey> {
	shared: Arc<Shared<K, C>>,
	consumer: Mutex<Option<JoinHandle<()>>>,
}

impl<K: GroupKey, C: GroupKey> UpdateCoalescer<K, C> {
	/// Creates a coalescer and spawns its consumer task.
	pub fn new(config: CoalescerConfig) -> Self {
		assert!(config.capacity > 0, "coalescer capacity must be > 0");
		let shared = Arc::new(Shared {
			config,
			state: Mutex::new(QueueState {
				buffer: VecDeque::with_capacity(config.capacity),
				latest: FxHashMap::default(),
				next_seq: 0,
				closed: false,
			}),
			pending: AtomicUsize::new(0),
			enqueued: Notify::new(),
			idle: Notify::new(),
		});
		let consumer = spawn(TaskClass::Background, run_consumer(Arc::clone(&shared)));
		Self {
			shared,
			consumer: Mutex::new(Some(consumer)),
		}
	}

	/// Returns the configuration this coalescer was built with.
	pub fn config(&self) -> CoalescerConfig {
		self.shared.config
	}

	/// Buffers `work` under the `(kind, context)` group and restarts the
	/// quiescence window.
	pub fn schedule_update<F>(&self, kind: K, context: C, work: F) -> Result<ScheduleOutcome, ScheduleError>
	where
		F: FnOnce() + Send + 'static,
	{
		let outcome = {
			let mut state = self.shared.state.lock();
			if state.closed {
				return Err(ScheduleError::Closed);
			}
			let seq = state.next_seq;
			state.next_seq = state.next_seq.wrapping_add(1);
			state.latest.insert((kind.clone(), context.clone()), seq);
			let request = Request {
				kind,
				context,
				seq,
				work: Box::new(work),
			};
			enqueue(&mut state, self.shared.config.capacity, &self.shared.pending, request)
		};
		self.shared.enqueued.notify_one();
		tracing::trace!(?outcome, "coalescer.schedule");
		Ok(outcome)
	}

	/// Returns true while any request is buffered or executing.
	pub fn has_pending_work(&self) -> bool {
		self.shared.pending.load(Ordering::Acquire) > 0
	}

	/// Waits until every buffered request has executed or been discarded.
	pub async fn flush(&self) {
		loop {
			// Register before checking so a concurrent `notify_waiters` is not lost.
			let idle = self.shared.idle.notified();
			if !self.has_pending_work() {
				return;
			}
			idle.await;
		}
	}

	/// Stops accepting requests, runs what is buffered without waiting for
	/// the quiescence window, and joins the consumer task.
	pub async fn shutdown(&self) {
		self.close();
		let consumer = self.consumer.lock().take();
		if let Some(consumer) = consumer
			&& let Err(err) = consumer.await
		{
			tracing::warn!(error = %err, "coalescer.consumer_join_failed");
		}
	}

	fn close(&self) {
		self.shared.state.lock().closed = true;
		self.shared.enqueued.notify_one();
	}
}

impl<K: GroupKey, C: GroupKey> Drop for UpdateCoalescer<K, C> {
	fn drop(&mut self) {
		self.close();
	}
}

/// Buffers one request under the lock, applying the tail-collapse and
/// capacity rules.
fn enqueue<K: GroupKey, C: GroupKey>(
	state: &mut QueueState<K, C>,
	capacity: usize,
	pending: &AtomicUsize,
	request: Request<K, C>,
) -> ScheduleOutcome {
	if let Some(tail) = state.buffer.back_mut()
		&& tail.is_same_group(&request)
	{
		*tail = request;
		return ScheduleOutcome::Coalesced;
	}

	if state.buffer.len() >= capacity {
		let victim = state.buffer.iter().position(|queued| queued.is_same_group(&request)).unwrap_or(0);
		if let Some(evicted) = state.buffer.remove(victim) {
			let key = (evicted.kind, evicted.context);
			tracing::warn!(kind = ?key.0, context = ?key.1, capacity, "coalescer.evict");
			if state.latest.get(&key) == Some(&evicted.seq) {
				state.latest.remove(&key);
			}
		}
		state.buffer.push_back(request);
		return ScheduleOutcome::EvictedOldest;
	}

	state.buffer.push_back(request);
	pending.fetch_add(1, Ordering::AcqRel);
	ScheduleOutcome::Enqueued
}

/// Collapses consecutive items of the same group into the last of each run.
///
/// Order between runs is preserved: `[A1, A2, B1, A3]` becomes `[A2, B1, A3]`.
pub fn collapse_runs<T, G: PartialEq>(items: impl IntoIterator<Item = T>, group: impl Fn(&T) -> G) -> Vec<T> {
	let mut collapsed: Vec<T> = Vec::new();
	for item in items {
		match collapsed.last_mut() {
			Some(last) if group(last) == group(&item) => *last = item,
			_ => collapsed.push(item),
		}
	}
	collapsed
}

async fn run_consumer<K: GroupKey, C: GroupKey>(shared: Arc<Shared<K, C>>) {
	while wait_for_first(&shared).await {
		wait_for_quiescence(&shared).await;

		let (drained, drained_through) = {
			let mut state = shared.state.lock();
			let drained: Vec<_> = state.buffer.drain(..).collect();
			(drained, state.next_seq)
		};
		let requested = drained.len();
		let batch = collapse_runs(drained, |req| (req.kind.clone(), req.context.clone()));
		shared.pending.fetch_sub(requested - batch.len(), Ordering::AcqRel);
		tracing::debug!(requested, executions = batch.len(), "coalescer.batch");

		for request in batch {
			execute(&shared, request, drained_through).await;
			shared.pending.fetch_sub(1, Ordering::AcqRel);
		}

		if shared.pending.load(Ordering::Acquire) == 0 {
			shared.idle.notify_waiters();
		}
	}
	shared.idle.notify_waiters();
	tracing::debug!("coalescer.consumer_exit");
}

/// Waits for the buffer to become non-empty. Returns false once closed and drained.
async fn wait_for_first<K: GroupKey, C: GroupKey>(shared: &Shared<K, C>) -> bool {
	loop {
		let notified = shared.enqueued.notified();
		{
			let state = shared.state.lock();
			if !state.buffer.is_empty() {
				return true;
			}
			if state.closed {
				return false;
			}
		}
		notified.await;
	}
}

/// Waits until no request has arrived for one full quiescence window.
///
/// Returns immediately once the coalescer is closed.
async fn wait_for_quiescence<K: GroupKey, C: GroupKey>(shared: &Shared<K, C>) {
	loop {
		let closed = shared.state.lock().closed;
		if closed {
			return;
		}
		if tokio::time::timeout(shared.config.quiescence, shared.enqueued.notified()).await.is_err() {
			return;
		}
	}
}

async fn execute<K: GroupKey, C: GroupKey>(shared: &Shared<K, C>, request: Request<K, C>, drained_through: u64) {
	let Request { kind, context, seq, work } = request;

	let superseded = {
		let mut state = shared.state.lock();
		let key = (kind.clone(), context.clone());
		match state.latest.get(&key).copied() {
			Some(latest) if latest >= drained_through => true,
			Some(latest) if latest == seq => {
				state.latest.remove(&key);
				false
			}
			_ => false,
		}
	};
	if superseded {
		tracing::trace!(?kind, ?context, seq, "coalescer.superseded");
		return;
	}

	match spawn(TaskClass::Interactive, async move { work() }).await {
		Ok(()) => tracing::trace!(?kind, ?context, seq, "coalescer.execute"),
		Err(err) => match join_error_panic_message(err) {
			Some(message) => tracing::error!(?kind, ?context, seq, %message, "coalescer.work_panicked"),
			None => tracing::warn!(?kind, ?context, seq, "coalescer.work_cancelled"),
		},
	}
}
