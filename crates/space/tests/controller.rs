//! End-to-end label updates through the coalescer.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use glint_primitives::{Color, Identity, Offset, Shape};
use glint_space::{Candidates, LabelController, Renderer, TokenSource, TokenSpace, UpdateKind, ViewCoalescer, ViewId, Viewport};
use glint_worker::{CoalescerConfig, ScheduleOutcome};

const BLUE_FOX: Identity = Identity::new(Color::Blue, Shape::Fox);
const RED_DOT: Identity = Identity::new(Color::Red, Shape::Dot);

fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Fixed document tokens; counts lookups so tests can observe passes.
#[derive(Clone)]
struct Tokens {
	entries: Vec<(Offset, &'static str)>,
	lookups: Arc<AtomicUsize>,
	poisoned: bool,
}

impl Tokens {
	fn new(entries: &[(Offset, &'static str)]) -> Self {
		Self {
			entries: entries.to_vec(),
			lookups: Arc::default(),
			poisoned: false,
		}
	}

	fn lookups(&self) -> usize {
		self.lookups.load(Ordering::SeqCst)
	}
}

impl TokenSource for Tokens {
	fn find_candidates(&self, viewport: Viewport) -> Candidates {
		self.lookups.fetch_add(1, Ordering::SeqCst);
		assert!(!self.poisoned, "token source failure");
		self.entries
			.iter()
			.filter(|(offset, _)| viewport.contains(*offset))
			.map(|&(offset, text)| (offset, text.to_string()))
			.collect()
	}
}

#[derive(Default)]
struct Screen {
	next: u64,
	live: Vec<u64>,
	created: usize,
}

impl Renderer for Screen {
	type Handle = u64;

	fn create_marker(&mut self, _offset: Offset, _identity: Identity, _text: &str) -> u64 {
		self.next += 1;
		self.created += 1;
		self.live.push(self.next);
		self.next
	}

	fn dispose_marker(&mut self, handle: u64) {
		self.live.retain(|&live| live != handle);
	}
}

fn coalescer() -> Arc<ViewCoalescer> {
	Arc::new(ViewCoalescer::new(CoalescerConfig::default()))
}

fn controller(view: u64, tokens: Tokens, coalescer: &Arc<ViewCoalescer>) -> LabelController<Tokens, Screen> {
	let space = TokenSpace::with_order(vec![BLUE_FOX, RED_DOT], true);
	LabelController::new(ViewId(view), space, tokens, Screen::default(), Arc::clone(coalescer))
}

const WHOLE: Viewport = Viewport::new(0, 1000);

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn rapid_applies_collapse_into_one_pass_with_last_cursor() {
	init_tracing();
	let coalescer = coalescer();
	let tokens = Tokens::new(&[(10, "alpha"), (30, "apple"), (52, "avocado")]);
	let view = controller(1, tokens.clone(), &coalescer);

	assert_eq!(view.request_apply(0, WHOLE), Ok(ScheduleOutcome::Enqueued));
	for cursor in [10, 20, 30, 40] {
		assert_eq!(view.request_apply(cursor, WHOLE), Ok(ScheduleOutcome::Coalesced));
	}
	assert!(view.has_pending_work());

	view.flush().await;
	assert_eq!(tokens.lookups(), 1);
	let markers: Vec<Offset> = view.markers().keys().copied().collect();
	assert_eq!(markers, vec![30, 52], "closest to the last cursor win");
	assert!(!view.has_pending_work());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn nothing_runs_before_the_window_closes() {
	let coalescer = coalescer();
	let tokens = Tokens::new(&[(10, "alpha")]);
	let view = controller(1, tokens.clone(), &coalescer);

	let _ = view.request_apply(0, WHOLE);
	tokio::time::sleep(Duration::from_millis(100)).await;
	assert_eq!(tokens.lookups(), 0);
	assert!(view.last_report().is_none());

	tokio::time::sleep(Duration::from_millis(50)).await;
	assert_eq!(tokens.lookups(), 1);
	assert_eq!(view.last_report().map(|report| report.created), Some(1));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn viewport_limits_candidates() {
	let coalescer = coalescer();
	let view = controller(1, Tokens::new(&[(10, "alpha"), (300, "beta")]), &coalescer);

	let _ = view.request_apply(0, Viewport::new(0, 100));
	view.flush().await;
	assert_eq!(view.markers().keys().copied().collect::<Vec<_>>(), vec![10]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn remove_all_clears_screen_and_space() {
	let coalescer = coalescer();
	let view = controller(1, Tokens::new(&[(10, "alpha"), (20, "beta")]), &coalescer);

	let _ = view.request_apply(0, WHOLE);
	view.flush().await;
	assert_eq!(view.with_renderer(|screen| screen.live.len()), 2);

	let _ = view.request_remove_all();
	view.flush().await;
	assert!(view.markers().is_empty());
	assert!(view.with_renderer(|screen| screen.live.is_empty()));
	assert!(view.with_space(TokenSpace::is_empty));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn refresh_rebuilds_with_the_same_identities() {
	let coalescer = coalescer();
	let view = controller(1, Tokens::new(&[(10, "alpha"), (20, "apple")]), &coalescer);

	let _ = view.request_apply(20, WHOLE);
	view.flush().await;
	let before: Vec<_> = view.markers().values().map(|m| (m.offset, m.identity)).collect();

	let _ = view.request_refresh(0, WHOLE);
	view.flush().await;
	let after: Vec<_> = view.markers().values().map(|m| (m.offset, m.identity)).collect();

	assert_eq!(after, before);
	assert_eq!(view.with_renderer(|screen| screen.created), 4);
	assert_eq!(view.with_renderer(|screen| screen.live.len()), 2);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn views_sharing_a_coalescer_stay_independent() {
	let coalescer = coalescer();
	let left = controller(1, Tokens::new(&[(10, "alpha")]), &coalescer);
	let right = controller(2, Tokens::new(&[(10, "omega"), (20, "other")]), &coalescer);

	assert_eq!(left.request_apply(0, WHOLE), Ok(ScheduleOutcome::Enqueued));
	assert_eq!(right.request_apply(0, WHOLE), Ok(ScheduleOutcome::Enqueued));
	left.flush().await;

	assert_eq!(left.markers().len(), 1);
	assert_eq!(right.markers().len(), 2);
	assert_eq!(left.markers()[&10].identity, BLUE_FOX);
	assert_eq!(right.markers()[&10].identity, BLUE_FOX);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn failing_view_does_not_block_other_views() {
	init_tracing();
	let coalescer = coalescer();
	let mut broken = Tokens::new(&[(10, "alpha")]);
	broken.poisoned = true;
	let failing = controller(1, broken, &coalescer);
	let healthy = controller(2, Tokens::new(&[(10, "alpha")]), &coalescer);

	let _ = failing.request_apply(0, WHOLE);
	let _ = healthy.request_apply(0, WHOLE);
	healthy.flush().await;

	assert!(failing.markers().is_empty());
	assert_eq!(healthy.markers().len(), 1);
	assert!(!healthy.has_pending_work());

	// The failed view still accepts work afterwards.
	assert!(failing.request_remove_all().is_ok());
	failing.flush().await;
}

#[test]
fn update_kinds_are_distinct_groups() {
	assert_ne!(UpdateKind::ApplyTokens, UpdateKind::FullRefresh);
	assert_eq!(ViewId(3).to_string(), "view#3");
}
