//! Worker primitives for the label engine: classified task spawning and the
//! [`UpdateCoalescer`] that collapses bursts of update requests.

mod class;
pub mod coalescer;
mod spawn;

pub use class::TaskClass;
pub use coalescer::{CoalescerConfig, GroupKey, ScheduleError, ScheduleOutcome, UpdateCoalescer, Work, collapse_runs};
pub use spawn::spawn;

/// Extracts the panic payload message from a failed join, if it panicked.
///
/// Returns `None` when the task was cancelled rather than panicking.
pub fn join_error_panic_message(err: tokio::task::JoinError) -> Option<String> {
	if !err.is_panic() {
		return None;
	}
	let payload = err.into_panic();
	if let Some(msg) = payload.downcast_ref::<&'static str>() {
		return Some((*msg).to_string());
	}
	if let Some(msg) = payload.downcast_ref::<String>() {
		return Some(msg.clone());
	}
	Some("non-string panic payload".to_string())
}
