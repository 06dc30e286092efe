use std::future::Future;
use std::sync::LazyLock;

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;

use crate::TaskClass;

/// Runtime used when a task is spawned from a thread with no tokio context,
/// e.g. a host UI thread calling into the coalescer.
static FALLBACK: LazyLock<Runtime> = LazyLock::new(|| {
	Builder::new_multi_thread()
		.worker_threads(1)
		.thread_name("glint-worker")
		.enable_all()
		.build()
		.expect("glint-worker fallback runtime")
});

/// Spawns `fut` on the caller's runtime, or on the fallback runtime outside one.
pub fn spawn<F>(class: TaskClass, fut: F) -> JoinHandle<F::Output>
where
	F: Future + Send + 'static,
	F::Output: Send + 'static,
{
	match Handle::try_current() {
		Ok(handle) => {
			tracing::trace!(worker_class = class.as_str(), "worker.spawn");
			handle.spawn(fut)
		}
		Err(_) => {
			tracing::trace!(worker_class = class.as_str(), "worker.spawn_fallback");
			FALLBACK.spawn(fut)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn spawns_outside_a_runtime() {
		let handle = spawn(TaskClass::Background, async { 7 });
		let value = FALLBACK.block_on(handle).unwrap();
		assert_eq!(value, 7);
	}

	#[tokio::test]
	async fn prefers_the_ambient_runtime() {
		let handle = spawn(TaskClass::Interactive, async { std::thread::current().id() });
		assert_eq!(handle.await.unwrap(), std::thread::current().id());
	}
}
